/*!
The workflow orchestrator.

One [`Orchestrator`] drives one run through the fixed [`Step`] sequence: inspect the
working tree, resolve the base branch, shelve and synchronize, cut the feature branch,
commit, push and open the pull request. Each step is gated on the previous one; the
first failure stops the run and the [`RunSummary`] names it together with what the
operator can do by hand to resume. Nothing is rolled back.
*/

pub mod step;
pub mod summary;

use std::path::PathBuf;

use tracing::{debug, info, instrument, warn};

use crate::color::{color_enabled_stderr, paint};
use crate::config::Config;
use crate::diagnostics;
use crate::errors::{exit_code_for_workflow_error, WorkflowError};
use crate::git::{ChangeSet, CommitSummary, Git};
use crate::hosting::HostingCli;
use crate::plan::{
    branch_name, classify, strategy_for, unique_branch_name, BranchPlan, Category,
    MessageStrategy,
};
use crate::prompt::Confirm;
use crate::util::exec::CommandRunner;

pub use step::{Step, StepResult, StepStatus};
pub use summary::{Outcome, RunSummary};

const NO_CHANGES_QUESTION: &str = "no pending changes detected; continue anyway?";

/// Per-run overrides on top of [`Config`].
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Use this base branch instead of probing the configured candidates.
    pub base: Option<String>,
    /// Use this feature branch name instead of the generated one.
    pub branch: Option<String>,
    /// Replace the generated commit subject.
    pub message: Option<String>,
    pub no_pr: bool,
    /// Mutating commands are printed, not run (the runner is expected to be a dry-run runner).
    pub dry_run: bool,
}

/// Running step log on stderr.
#[derive(Debug, Clone, Copy)]
pub struct StepLog {
    enabled: bool,
    use_color: bool,
}

impl StepLog {
    pub fn new(enabled: bool, use_color: bool) -> Self {
        Self { enabled, use_color }
    }

    pub fn stderr() -> Self {
        Self::new(true, color_enabled_stderr())
    }

    pub fn silent() -> Self {
        Self::new(false, false)
    }

    fn record(&self, r: &StepResult) {
        match r.status {
            StepStatus::Failed => warn!(step = ?r.step, code = ?r.exit_code, "{}", r.detail),
            _ => info!(step = ?r.step, status = ?r.status, "{}", r.detail),
        }
        if !self.enabled {
            return;
        }
        let (code, word) = match r.status {
            StepStatus::Succeeded => ("\x1b[32m", "ok"),
            StepStatus::Skipped => ("\x1b[90m", "skipped"),
            StepStatus::Degraded => ("\x1b[33m", "degraded"),
            StepStatus::Failed => ("\x1b[31;1m", "failed"),
        };
        eprintln!(
            "{} [{}/{}] {}: {} ({})",
            paint(self.use_color, "\x1b[36;1m", "gitship:"),
            r.step.number(),
            Step::ALL.len(),
            r.step.label(),
            paint(self.use_color, code, word),
            r.detail
        );
    }

    fn note(&self, msg: &str) {
        warn!("{msg}");
        if self.enabled {
            crate::color::log_warn_stderr(self.use_color, &format!("gitship: {msg}"));
        }
    }
}

struct Failure {
    step: Step,
    error: WorkflowError,
}

fn at(step: Step) -> impl FnOnce(WorkflowError) -> Failure {
    move |error| Failure { step, error }
}

pub struct Orchestrator<R, C> {
    git: Git,
    hosting: HostingCli,
    config: Config,
    options: Options,
    strategy: Box<dyn MessageStrategy>,
    runner: R,
    confirm: C,
    log: StepLog,
    summary: RunSummary,
    original_branch: Option<String>,
    stashed: bool,
}

impl<R: CommandRunner, C: Confirm> Orchestrator<R, C> {
    pub fn new(
        repo: impl Into<PathBuf>,
        config: Config,
        options: Options,
        runner: R,
        confirm: C,
    ) -> Self {
        let repo = repo.into();
        let git = Git::new(repo.clone()).with_timeout(config.command_timeout);
        let hosting = HostingCli::new(config.hosting_cli.clone(), repo).draft(config.draft);
        let strategy = strategy_for(config.message_style);
        let summary = RunSummary::new(options.dry_run);
        Self {
            git,
            hosting,
            config,
            options,
            strategy,
            runner,
            confirm,
            log: StepLog::stderr(),
            summary,
            original_branch: None,
            stashed: false,
        }
    }

    pub fn with_strategy(mut self, strategy: Box<dyn MessageStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_log(mut self, log: StepLog) -> Self {
        self.log = log;
        self
    }

    /// Run every step and report. Consumes the orchestrator; build a new one per run.
    #[instrument(level = "info", skip_all, fields(repo = %self.git.repo().display(), dry_run = self.options.dry_run))]
    pub fn run(mut self) -> RunSummary {
        self.original_branch = self.git.current_branch(&mut self.runner);
        match self.drive() {
            Ok(outcome) => {
                self.summary.outcome = outcome;
            }
            Err(Failure { step, error }) => {
                let mut result = StepResult::new(step, StepStatus::Failed, error.to_string());
                if let WorkflowError::Command { code, .. } = &error {
                    result.exit_code = *code;
                }
                self.push_result(result);
                let next = self.remediation(step, &error);
                self.summary.next_steps.extend(next);
                self.summary
                    .abort(step, error.to_string(), exit_code_for_workflow_error(&error));
            }
        }
        self.summary
    }

    fn push_result(&mut self, r: StepResult) {
        self.log.record(&r);
        self.summary.steps.push(r);
    }

    fn succeed(&mut self, step: Step, detail: impl Into<String>) {
        self.push_result(StepResult::new(step, StepStatus::Succeeded, detail));
    }

    fn drive(&mut self) -> Result<Outcome, Failure> {
        // 1. inspect
        let status = self
            .git
            .status(&mut self.runner)
            .map_err(at(Step::InspectStatus))?;
        if status.has_conflicts() {
            return Err(Failure {
                step: Step::InspectStatus,
                error: WorkflowError::Unmerged {
                    files: status.conflicted_paths(),
                },
            });
        }
        let changes = status.change_set();
        if status.is_clean() {
            self.log.note("no pending changes detected");
            if !self.confirm.confirm(NO_CHANGES_QUESTION) {
                self.succeed(Step::InspectStatus, "no changes; operator declined to continue");
                return Ok(Outcome::NothingToDo);
            }
            self.succeed(
                Step::InspectStatus,
                "no changes; continuing at operator request",
            );
        } else {
            self.succeed(
                Step::InspectStatus,
                format!("{} changed file(s)", status.files.len()),
            );
        }

        // 2. resolve base
        let base = self.resolve_base()?;

        // 3. shelve, verify clean, switch, pull
        self.sync_base(&base, !status.is_clean())?;

        // 4. classify and branch
        let category = classify(&changes);
        let branch = self.create_branch(&base, category, &changes)?;

        // 5. stage and commit
        let committed = self.commit(category, &changes)?;

        // 6. push
        let remote = self.config.remote.clone();
        self.git
            .push(&mut self.runner, &remote, &branch.name)
            .map_err(at(Step::Push))?;
        self.succeed(Step::Push, format!("pushed {} to {}", branch.name, remote));

        // 7. pull request
        self.pull_request(category, &branch, committed)?;
        Ok(Outcome::Completed)
    }

    fn resolve_base(&mut self) -> Result<String, Failure> {
        let candidates = match &self.options.base {
            Some(b) => vec![b.clone()],
            None => self.config.base_branches.clone(),
        };
        for name in &candidates {
            if self
                .git
                .local_branch_exists(&mut self.runner, name)
                .map_err(at(Step::ResolveBase))?
            {
                self.succeed(Step::ResolveBase, format!("using {name}"));
                return Ok(name.clone());
            }
        }
        let remote = self.config.remote.clone();
        for name in &candidates {
            if self
                .git
                .remote_branch_exists(&mut self.runner, &remote, name)
                .map_err(at(Step::ResolveBase))?
            {
                self.succeed(
                    Step::ResolveBase,
                    format!("using {name} (tracking {remote}/{name})"),
                );
                return Ok(name.clone());
            }
        }
        Err(Failure {
            step: Step::ResolveBase,
            error: WorkflowError::MissingBaseBranch { candidates },
        })
    }

    fn sync_base(&mut self, base: &str, has_changes: bool) -> Result<(), Failure> {
        let mut detail = Vec::new();
        if has_changes {
            let message = format!("gitship: shelved before switching to {base}");
            let before = self
                .git
                .stash_head(&mut self.runner)
                .map_err(at(Step::SyncBase))?;
            self.git
                .stash_push(&mut self.runner, &message)
                .map_err(at(Step::SyncBase))?;
            // `stash push` exits 0 without an entry when it finds nothing it can save.
            let after = self
                .git
                .stash_head(&mut self.runner)
                .map_err(at(Step::SyncBase))?;
            self.stashed = self.options.dry_run || (after.is_some() && after != before);
            if self.stashed {
                detail.push("pending changes shelved".to_string());
            } else {
                debug!("git stash push created no entry");
            }
        }
        // A dry run never stashed, so the tree is still dirty here.
        if !self.options.dry_run {
            let after = self
                .git
                .status(&mut self.runner)
                .map_err(at(Step::SyncBase))?;
            if !after.is_clean() {
                return Err(Failure {
                    step: Step::SyncBase,
                    error: WorkflowError::DirtyTree {
                        files: after.paths(),
                    },
                });
            }
        }
        self.git
            .switch(&mut self.runner, base)
            .map_err(at(Step::SyncBase))?;
        let remote = self.config.remote.clone();
        self.git
            .pull(&mut self.runner, &remote, base, self.config.pull_mode)
            .map_err(at(Step::SyncBase))?;
        detail.push(format!("{base} pulled from {remote}"));
        self.succeed(Step::SyncBase, detail.join("; "));
        Ok(())
    }

    fn create_branch(
        &mut self,
        base: &str,
        category: Category,
        changes: &ChangeSet,
    ) -> Result<BranchPlan, Failure> {
        let name = match &self.options.branch {
            Some(explicit) => explicit.clone(),
            None => {
                let generated = branch_name(category, changes);
                let git = &self.git;
                let runner = &mut self.runner;
                let remote = &self.config.remote;
                let mut probe_error = None;
                let name = unique_branch_name(&generated, |candidate| {
                    let taken = match git.local_branch_exists(runner, candidate) {
                        Ok(true) => Ok(true),
                        Ok(false) => git.remote_branch_exists(runner, remote, candidate),
                        Err(e) => Err(e),
                    };
                    match taken {
                        Ok(taken) => taken,
                        Err(e) => {
                            probe_error.get_or_insert(e);
                            false
                        }
                    }
                });
                if let Some(e) = probe_error {
                    return Err(at(Step::CreateBranch)(e));
                }
                name
            }
        };
        let plan = BranchPlan {
            base: base.to_string(),
            name,
            category,
        };
        self.git
            .switch_create(&mut self.runner, &plan.name)
            .map_err(at(Step::CreateBranch))?;
        self.summary.branch = Some(plan.clone());
        let mut detail = format!("created {} from {}", plan.name, base);
        if self.stashed {
            self.git
                .stash_pop(&mut self.runner)
                .map_err(at(Step::CreateBranch))?;
            self.stashed = false;
            detail.push_str("; pending changes restored");
        }
        self.succeed(Step::CreateBranch, detail);
        Ok(plan)
    }

    /// Returns whether a commit was made (or planned, in a dry run).
    fn commit(&mut self, category: Category, changes: &ChangeSet) -> Result<bool, Failure> {
        self.git
            .add_all(&mut self.runner)
            .map_err(at(Step::Commit))?;
        let staged = self
            .git
            .staged_changes(&mut self.runner)
            .map_err(at(Step::Commit))?;
        // Nothing was staged for real in a dry run; plan from what status showed.
        let to_commit = if staged.is_empty() && self.options.dry_run {
            changes.clone()
        } else {
            staged
        };
        if to_commit.is_empty() {
            self.push_result(StepResult::new(
                Step::Commit,
                StepStatus::Skipped,
                "nothing staged",
            ));
            return Ok(false);
        }
        self.check_diagnostics();
        let mut plan = self.strategy.commit(category, &to_commit);
        if let Some(subject) = &self.options.message {
            plan = plan.with_subject(subject);
        }
        self.git
            .commit(&mut self.runner, &plan.message())
            .map_err(at(Step::Commit))?;
        self.succeed(
            Step::Commit,
            format!("{} ({} file(s))", plan.subject, to_commit.len()),
        );
        self.summary.commit = Some(plan);
        Ok(true)
    }

    fn check_diagnostics(&mut self) {
        let path = self.config.diagnostics_path(self.git.repo());
        match diagnostics::load(&path) {
            Ok(data) => {
                let stats = diagnostics::statistics(&data);
                if stats.blocking() {
                    let note = format!(
                        "editor diagnostics report {} error(s) and {} warning(s); run `gitship diagnostics` for details",
                        stats.errors, stats.warnings
                    );
                    self.log.note(&note);
                    self.summary.notes.push(note);
                }
            }
            Err(e) => {
                debug!(error = %format!("{e:#}"), "diagnostics file unreadable");
                self.summary
                    .notes
                    .push(format!("could not read {}: {e:#}", path.display()));
            }
        }
    }

    fn pull_request(
        &mut self,
        category: Category,
        branch: &BranchPlan,
        committed: bool,
    ) -> Result<(), Failure> {
        if self.options.no_pr {
            self.push_result(StepResult::new(
                Step::PullRequest,
                StepStatus::Skipped,
                "disabled",
            ));
            return Ok(());
        }
        let mut commits = self
            .git
            .log_subjects(&mut self.runner, &branch.base, &branch.name)
            .unwrap_or_else(|e| {
                debug!(error = %e, "could not list branch commits");
                Vec::new()
            });
        if commits.is_empty() {
            if let Some(c) = &self.summary.commit {
                commits.push(CommitSummary {
                    sha: String::new(),
                    subject: c.subject.clone(),
                });
            }
        }
        if commits.is_empty() && !committed {
            self.push_result(StepResult::new(
                Step::PullRequest,
                StepStatus::Skipped,
                format!("no commits between {} and {}", branch.base, branch.name),
            ));
            return Ok(());
        }

        let version = self.hosting.probe(&mut self.runner);
        let plan = self
            .strategy
            .pull_request(category, branch, &commits, version.is_some());
        self.summary.pull_request = Some(plan.clone());
        match version {
            Some(v) => {
                debug!(version = %v, "hosting cli present");
                let url = self
                    .hosting
                    .create_pr(&mut self.runner, &branch.base, &branch.name, &plan)
                    .map_err(at(Step::PullRequest))?;
                let detail = if url.is_empty() {
                    format!("opened: {}", plan.title)
                } else {
                    url.clone()
                };
                self.summary.pull_request_url = Some(url).filter(|u| !u.is_empty());
                self.succeed(Step::PullRequest, detail);
            }
            None => {
                let remote = self.config.remote.clone();
                let remote_url = self.git.remote_url(&mut self.runner, &remote);
                let steps = self.hosting.manual_instructions(
                    &branch.base,
                    &branch.name,
                    &plan,
                    remote_url.as_deref(),
                );
                self.summary.next_steps.extend(steps);
                self.push_result(StepResult::new(
                    Step::PullRequest,
                    StepStatus::Degraded,
                    format!(
                        "`{}` not found; open the pull request manually",
                        self.hosting.program()
                    ),
                ));
            }
        }
        Ok(())
    }

    /// What the operator can run by hand after `step` failed.
    fn remediation(&self, step: Step, error: &WorkflowError) -> Vec<String> {
        let mut out = Vec::new();
        let remote = &self.config.remote;
        let branch = self.summary.branch.as_ref();
        match (step, error) {
            (Step::InspectStatus, WorkflowError::Unmerged { .. }) => out.push(
                "resolve the conflicts and `git add` the files (or abort the merge or rebase), then re-run gitship"
                    .to_string(),
            ),
            (Step::InspectStatus, _) => out.push(
                "run gitship from inside a git repository (or pass --repo <dir>)".to_string(),
            ),
            (Step::ResolveBase, WorkflowError::MissingBaseBranch { candidates }) => {
                out.push(format!(
                    "create or fetch a base branch (tried: {}), or pass --base <name>",
                    candidates.join(", ")
                ));
                out.push(format!("`git fetch {remote}` refreshes remote-tracking branches"));
            }
            (Step::SyncBase, WorkflowError::DirtyTree { .. }) => out.push(
                "commit, stash or discard the listed files, then re-run gitship".to_string(),
            ),
            (Step::SyncBase, _) => out.push(format!(
                "check access to `{remote}` (network, credentials) and that the base branch can fast-forward, then re-run gitship"
            )),
            (Step::CreateBranch, _) if self.summary.branch.is_some() => {
                out.push(
                    "restoring the shelved changes conflicted; resolve the conflicts, then `git stash drop`"
                        .to_string(),
                );
            }
            (Step::CreateBranch, _) => {
                out.push("pick another name with --branch <name>".to_string());
            }
            (Step::Commit, _) => {
                if let Some(b) = branch {
                    out.push(format!(
                        "fix the reported problem (for example a failing commit hook), then commit on {} by hand",
                        b.name
                    ));
                }
            }
            (Step::Push, _) => {
                if let Some(b) = branch {
                    out.push(format!(
                        "the commit is safe locally; run `git push --set-upstream {remote} {}` once the remote is reachable",
                        b.name
                    ));
                }
            }
            (Step::PullRequest, _) => {
                if let (Some(b), Some(pr)) = (branch, self.summary.pull_request.as_ref()) {
                    out.extend(self.hosting.manual_instructions(&b.base, &b.name, pr, None));
                }
            }
            (Step::ResolveBase, _) => out.push(format!(
                "check that `{remote}` is a configured remote, then re-run gitship"
            )),
        }
        let pop_conflict = step == Step::CreateBranch && branch.is_some();
        if self.stashed && !pop_conflict {
            out.push("your pending changes are shelved; run `git stash pop` to restore them".to_string());
            if let Some(orig) = &self.original_branch {
                out.push(format!(
                    "run `git switch {orig}` first to return to the branch you started on"
                ));
            }
        }
        out
    }
}
