use std::io::{self, Write};

use serde::Serialize;

use super::step::{Step, StepResult, StepStatus};
use crate::color::paint;
use crate::plan::{BranchPlan, CommitPlan, PullRequestPlan};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Outcome {
    /// Every step ran (some possibly skipped or degraded).
    Completed,
    /// No pending changes and the operator declined to continue.
    NothingToDo,
    /// A step failed; later steps never ran.
    Aborted { step: Step, error: String },
}

/// Final report of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub outcome: Outcome,
    pub dry_run: bool,
    pub steps: Vec<StepResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<BranchPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<CommitPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<PullRequestPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_request_url: Option<String>,
    /// Warnings that did not stop the run.
    pub notes: Vec<String>,
    /// What the operator should do by hand next.
    pub next_steps: Vec<String>,
    #[serde(skip)]
    exit_code: u8,
}

impl RunSummary {
    pub(crate) fn new(dry_run: bool) -> Self {
        Self {
            outcome: Outcome::Completed,
            dry_run,
            steps: Vec::new(),
            branch: None,
            commit: None,
            pull_request: None,
            pull_request_url: None,
            notes: Vec::new(),
            next_steps: Vec::new(),
            exit_code: 0,
        }
    }

    pub(crate) fn abort(&mut self, step: Step, error: String, exit_code: u8) {
        self.outcome = Outcome::Aborted { step, error };
        self.exit_code = exit_code.max(1);
    }

    pub fn exit_code(&self) -> u8 {
        match self.outcome {
            Outcome::Aborted { .. } => self.exit_code.max(1),
            _ => 0,
        }
    }

    pub fn succeeded(&self) -> bool {
        !matches!(self.outcome, Outcome::Aborted { .. })
    }

    pub fn completed_steps(&self) -> Vec<Step> {
        self.steps
            .iter()
            .filter(|r| r.status == StepStatus::Succeeded || r.status == StepStatus::Degraded)
            .map(|r| r.step)
            .collect()
    }

    pub fn failed_step(&self) -> Option<Step> {
        match &self.outcome {
            Outcome::Aborted { step, .. } => Some(*step),
            _ => None,
        }
    }

    pub fn step(&self, step: Step) -> Option<&StepResult> {
        self.steps.iter().find(|r| r.step == step)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable report.
    pub fn render(&self, use_color: bool) -> String {
        let mut out = String::new();
        let head = match &self.outcome {
            Outcome::Completed if self.dry_run => {
                paint(use_color, "\x1b[32;1m", "gitship: dry-run complete (no changes were made)")
            }
            Outcome::Completed => paint(use_color, "\x1b[32;1m", "gitship: done"),
            Outcome::NothingToDo => paint(
                use_color,
                "\x1b[36;1m",
                "gitship: nothing to do (no pending changes)",
            ),
            Outcome::Aborted { step, .. } => paint(
                use_color,
                "\x1b[31;1m",
                &format!(
                    "gitship: aborted at step {}/{} ({})",
                    step.number(),
                    Step::ALL.len(),
                    step.label()
                ),
            ),
        };
        out.push_str(&head);
        out.push('\n');

        let done: Vec<&str> = self.completed_steps().iter().map(|s| s.label()).collect();
        if !done.is_empty() {
            out.push_str(&format!("  completed: {}\n", done.join(", ")));
        }
        let skipped: Vec<String> = self
            .steps
            .iter()
            .filter(|r| r.status == StepStatus::Skipped)
            .map(|r| format!("{} ({})", r.step.label(), r.detail))
            .collect();
        if !skipped.is_empty() {
            out.push_str(&format!("  skipped: {}\n", skipped.join(", ")));
        }
        if let Outcome::Aborted { error, .. } = &self.outcome {
            out.push_str(&format!(
                "  {} {}\n",
                paint(use_color, "\x1b[31m", "error:"),
                error
            ));
        }
        if let Some(b) = &self.branch {
            out.push_str(&format!("  branch: {} (from {})\n", b.name, b.base));
        }
        if let Some(c) = &self.commit {
            out.push_str(&format!("  commit: {}\n", c.subject));
        }
        if let Some(url) = self.pull_request_url.as_deref().filter(|u| !u.is_empty()) {
            out.push_str(&format!("  pull request: {url}\n"));
        } else if let Some(pr) = &self.pull_request {
            out.push_str(&format!("  pull request title: {}\n", pr.title));
        }
        for n in &self.notes {
            out.push_str(&format!(
                "  {} {}\n",
                paint(use_color, "\x1b[33m", "note:"),
                n
            ));
        }
        if !self.next_steps.is_empty() {
            out.push_str("  next steps:\n");
            for s in &self.next_steps {
                out.push_str(&format!("    - {s}\n"));
            }
        }
        out
    }

    pub fn print(&self, use_color: bool) {
        let _ = io::stderr().write_all(self.render(use_color).as_bytes());
    }
}
