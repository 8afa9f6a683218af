/*!
Commit-message and pull-request text generation.

The choice between a conventional-commit prefix and a plain sentence is a pluggable
[`MessageStrategy`]; the summary wording itself is shared.
*/

use std::path::Path;

use serde::Serialize;

use super::{BranchPlan, Category};
use crate::config::MessageStyle;
use crate::git::{ChangeKind, ChangeSet, CommitSummary, FileChange};

/// Generated commit message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitPlan {
    pub subject: String,
    pub body: Option<String>,
    /// Conventional-commit type used in the subject, if any.
    pub prefix: Option<String>,
}

impl CommitPlan {
    /// Full message as passed to `git commit -F -`.
    pub fn message(&self) -> String {
        match &self.body {
            Some(body) if !body.trim().is_empty() => {
                format!("{}\n\n{}\n", self.subject, body.trim_end())
            }
            _ => format!("{}\n", self.subject),
        }
    }

    /// Replace the generated subject with an operator-supplied one.
    pub fn with_subject(mut self, subject: &str) -> Self {
        let subject = subject.trim();
        if subject.is_empty() {
            return self;
        }
        self.prefix = subject
            .split_once(':')
            .map(|(p, _)| p.trim().to_string())
            .filter(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_alphanumeric() || "()!-_".contains(c)));
        self.subject = subject.to_string();
        self
    }
}

/// Pull request title and body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestPlan {
    pub title: String,
    pub body: String,
    /// Whether the hosting CLI was detected; false means manual creation.
    pub hosting_available: bool,
}

pub trait MessageStrategy {
    fn commit(&self, category: Category, changes: &ChangeSet) -> CommitPlan;

    fn pull_request(
        &self,
        category: Category,
        branch: &BranchPlan,
        commits: &[CommitSummary],
        hosting_available: bool,
    ) -> PullRequestPlan {
        default_pull_request(category, branch, commits, hosting_available)
    }
}

/// `<type>: <summary>` when the category has a conventional type, otherwise a sentence.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConventionalStrategy;

/// Always a capitalized descriptive sentence.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainStrategy;

impl MessageStrategy for ConventionalStrategy {
    fn commit(&self, category: Category, changes: &ChangeSet) -> CommitPlan {
        let summary = summarize(changes);
        match category.conventional_type() {
            Some(t) => CommitPlan {
                subject: format!("{t}: {summary}"),
                body: file_list_body(changes),
                prefix: Some(t.to_string()),
            },
            None => CommitPlan {
                subject: sentence(&summary),
                body: file_list_body(changes),
                prefix: None,
            },
        }
    }
}

impl MessageStrategy for PlainStrategy {
    fn commit(&self, _category: Category, changes: &ChangeSet) -> CommitPlan {
        CommitPlan {
            subject: sentence(&summarize(changes)),
            body: file_list_body(changes),
            prefix: None,
        }
    }
}

pub fn strategy_for(style: MessageStyle) -> Box<dyn MessageStrategy> {
    match style {
        MessageStyle::Conventional => Box::new(ConventionalStrategy),
        MessageStyle::Plain => Box::new(PlainStrategy),
    }
}

fn verb(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::Added | ChangeKind::Untracked | ChangeKind::Copied => "add",
        ChangeKind::Deleted => "remove",
        ChangeKind::Renamed => "rename",
        ChangeKind::Modified | ChangeKind::TypeChanged | ChangeKind::Conflicted => "update",
    }
}

fn stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| path.to_string())
}

fn join_words(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// Longest directory prefix shared by every changed path.
fn common_dir(files: &[FileChange]) -> Option<String> {
    let mut common: Option<Vec<&str>> = None;
    for f in files {
        let mut parts: Vec<&str> = f.path.split('/').collect();
        parts.pop();
        common = Some(match common {
            None => parts,
            Some(prev) => prev
                .iter()
                .zip(parts.iter())
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| *a)
                .collect(),
        });
    }
    common
        .filter(|c| !c.is_empty())
        .map(|c| c.join("/"))
}

/// Lowercase summary of what the change set does, e.g. `update auth`.
pub fn summarize(changes: &ChangeSet) -> String {
    let files = &changes.files;
    match files.as_slice() {
        [] => "update project".to_string(),
        [f] if f.kind == ChangeKind::Renamed => match &f.old_path {
            Some(old) => format!("rename {} to {}", stem(old), stem(&f.path)),
            None => format!("rename {}", stem(&f.path)),
        },
        [f] => format!("{} {}", verb(f.kind), stem(&f.path)),
        _ => {
            let first = verb(files[0].kind);
            let same_verb = files.iter().all(|f| verb(f.kind) == first);
            let mut stems: Vec<String> = Vec::new();
            for f in files {
                let s = stem(&f.path);
                if !stems.contains(&s) {
                    stems.push(s);
                }
            }
            if same_verb && stems.len() <= 3 {
                return format!("{first} {}", join_words(&stems));
            }
            let head = if same_verb { first } else { "update" };
            match common_dir(files) {
                Some(dir) => format!("{head} {} files in {dir}", files.len()),
                None => format!("{head} {} files", files.len()),
            }
        }
    }
}

/// Capitalize the first character.
pub fn sentence(summary: &str) -> String {
    let mut chars = summary.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn file_list_body(changes: &ChangeSet) -> Option<String> {
    if changes.files.len() < 2 {
        return None;
    }
    let lines: Vec<String> = changes
        .files
        .iter()
        .map(|f| match (&f.kind, &f.old_path) {
            (ChangeKind::Renamed, Some(old)) => format!("- rename {} -> {}", old, f.path),
            _ => format!("- {} {}", verb(f.kind), f.path),
        })
        .collect();
    Some(lines.join("\n"))
}

fn default_pull_request(
    category: Category,
    branch: &BranchPlan,
    commits: &[CommitSummary],
    hosting_available: bool,
) -> PullRequestPlan {
    let title = match commits {
        [] => format!("{} changes on {}", category.title(), branch.name),
        [only] => only.subject.clone(),
        many => format!(
            "{}: {} commits on {}",
            category.title(),
            many.len(),
            branch.name
        ),
    };
    let mut body = String::from("## Summary\n\n");
    if commits.is_empty() {
        body.push_str("- (no commits on this branch yet)\n");
    }
    for c in commits {
        if c.sha.is_empty() {
            body.push_str(&format!("- {}\n", c.subject));
        } else {
            body.push_str(&format!("- {} ({})\n", c.subject, c.sha));
        }
    }
    body.push_str(&format!(
        "\n## Branch\n\n`{}` into `{}`\n",
        branch.name, branch.base
    ));
    PullRequestPlan {
        title,
        body,
        hosting_available,
    }
}
