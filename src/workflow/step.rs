use serde::Serialize;

/// The fixed step sequence of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    InspectStatus,
    ResolveBase,
    SyncBase,
    CreateBranch,
    Commit,
    Push,
    PullRequest,
}

impl Step {
    pub const ALL: [Step; 7] = [
        Step::InspectStatus,
        Step::ResolveBase,
        Step::SyncBase,
        Step::CreateBranch,
        Step::Commit,
        Step::Push,
        Step::PullRequest,
    ];

    /// 1-based position in the sequence.
    pub fn number(self) -> usize {
        Step::ALL.iter().position(|s| *s == self).unwrap_or(0) + 1
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::InspectStatus => "inspect status",
            Step::ResolveBase => "resolve base branch",
            Step::SyncBase => "synchronize base branch",
            Step::CreateBranch => "create branch",
            Step::Commit => "stage and commit",
            Step::Push => "push",
            Step::PullRequest => "open pull request",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Succeeded,
    /// Not needed this run (nothing to commit, PR disabled).
    Skipped,
    /// Completed through a fallback path (hosting CLI missing).
    Degraded,
    Failed,
}

/// Outcome of one step, kept for the running log and the final summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepResult {
    pub step: Step,
    pub status: StepStatus,
    /// Exit code of the external command that decided the outcome, when there was one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Operator-facing detail: what happened, or the tool's raw error text.
    pub detail: String,
}

impl StepResult {
    pub fn new(step: Step, status: StepStatus, detail: impl Into<String>) -> Self {
        Self {
            step,
            status,
            exit_code: None,
            detail: detail.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status != StepStatus::Failed
    }
}
