use std::path::Path;

use serde::Serialize;

use super::Category;
use crate::git::ChangeSet;
use crate::util::{slugify, truncate_slug};

const MAX_SLUG_LEN: usize = 48;
const MAX_NAMED_FILES: usize = 3;

/// Target base branch plus the feature branch to cut from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchPlan {
    pub base: String,
    pub name: String,
    pub category: Category,
}

fn stem_slug(path: &str) -> String {
    let stem = Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    slugify(&stem)
}

/// Descriptive slug built from the stems of the first few changed paths.
pub fn branch_slug(changes: &ChangeSet) -> String {
    let mut stems: Vec<String> = Vec::new();
    for f in &changes.files {
        let s = stem_slug(&f.path);
        if !s.is_empty() && !stems.contains(&s) {
            stems.push(s);
        }
    }
    if stems.is_empty() {
        return "changes".to_string();
    }
    let extra = stems.len().saturating_sub(MAX_NAMED_FILES);
    let suffix = if extra > 0 {
        format!("-and-{extra}-more")
    } else {
        String::new()
    };
    let named = stems
        .iter()
        .take(MAX_NAMED_FILES)
        .cloned()
        .collect::<Vec<_>>()
        .join("-");
    // The count suffix is kept whole; only the named stems are shortened.
    let named = truncate_slug(&named, MAX_SLUG_LEN.saturating_sub(suffix.len()));
    if named.is_empty() {
        "changes".to_string()
    } else {
        format!("{named}{suffix}")
    }
}

/// `<prefix>/<slug>` for the category and change set.
pub fn branch_name(category: Category, changes: &ChangeSet) -> String {
    format!("{}/{}", category.branch_prefix(), branch_slug(changes))
}

/// Append `-2`, `-3`, ... until `taken` reports the name free.
pub fn unique_branch_name<F>(name: &str, mut taken: F) -> String
where
    F: FnMut(&str) -> bool,
{
    if !taken(name) {
        return name.to_string();
    }
    let mut n = 2usize;
    loop {
        let candidate = format!("{name}-{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{ChangeKind, FileChange};

    fn set(paths: &[&str]) -> ChangeSet {
        ChangeSet::new(
            paths
                .iter()
                .map(|p| FileChange::new(ChangeKind::Modified, *p))
                .collect(),
        )
    }

    #[test]
    fn test_single_file_branch() {
        assert_eq!(branch_name(Category::Fix, &set(&["src/auth.ts"])), "fix/auth");
    }

    #[test]
    fn test_many_files_are_summarized() {
        let cs = set(&["a/one.rs", "b/two.rs", "c/three.rs", "d/four.rs", "e/five.rs"]);
        assert_eq!(
            branch_name(Category::Feature, &cs),
            "feature/one-two-three-and-2-more"
        );
    }

    #[test]
    fn test_duplicate_stems_and_dotfiles() {
        let cs = set(&["src/mod.rs", "src/net/mod.rs", ".gitlab-ci.yml"]);
        assert_eq!(branch_slug(&cs), "mod-gitlab-ci");
    }

    #[test]
    fn test_empty_and_long_slugs() {
        assert_eq!(branch_slug(&ChangeSet::default()), "changes");
        let long = "a_really_long_file_name_that_goes_on_and_on_forever_and_ever.rs";
        let slug = branch_slug(&set(&[long]));
        assert!(slug.len() <= MAX_SLUG_LEN, "{slug}");
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_long_stems_keep_the_more_suffix() {
        let cs = set(&[
            "src/authentication_middleware.rs",
            "src/session_token_refresher.rs",
            "src/password_reset_controller.rs",
            "src/one.rs",
            "src/two.rs",
        ]);
        let slug = branch_slug(&cs);
        assert!(slug.len() <= MAX_SLUG_LEN, "{slug}");
        assert!(slug.ends_with("-and-2-more"), "{slug}");
        assert!(slug.starts_with("authentication-middleware-"), "{slug}");
    }

    #[test]
    fn test_unique_branch_name_suffixes() {
        let existing = ["fix/auth", "fix/auth-2"];
        let name = unique_branch_name("fix/auth", |n| existing.contains(&n));
        assert_eq!(name, "fix/auth-3");
        assert_eq!(unique_branch_name("docs/readme", |_| false), "docs/readme");
    }
}
