/*!
Thin git facade over a [`CommandRunner`].

Every call runs `git -C <repo> ...`, classifies the outcome and maps failures to
[`WorkflowError`] with git's raw stderr preserved. Probes (`rev-parse --verify`)
report absence as `Ok(false)` rather than an error.
*/

pub mod remote;
pub mod status;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tracing::instrument;

use crate::config::PullMode;
use crate::errors::WorkflowError;
use crate::util::exec::{CommandRunner, ExecOutput, ExecRequest};

pub use status::{ChangeKind, ChangeSet, FileChange, RepositoryStatus};

/// One commit on the feature branch, as listed for pull-request text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub sha: String,
    pub subject: String,
}

#[derive(Debug, Clone)]
pub struct Git {
    repo: PathBuf,
    timeout: Option<Duration>,
}

impl Git {
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self {
            repo: repo.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }

    /// Build a `git -C <repo> <args>` request. Credential prompts are disabled so auth
    /// failures surface as errors instead of blocking on a hidden terminal prompt.
    pub fn request(&self, args: &[&str]) -> ExecRequest {
        let mut req = ExecRequest::new("git")
            .arg("-C")
            .arg(self.repo.as_os_str())
            .args(args.iter().copied())
            .env("GIT_TERMINAL_PROMPT", "0");
        if let Some(t) = self.timeout {
            req = req.timeout(t);
        }
        req
    }

    fn exec<R: CommandRunner>(
        &self,
        runner: &mut R,
        req: ExecRequest,
    ) -> Result<ExecOutput, WorkflowError> {
        let command = display_command(&req);
        let out = runner
            .run(&req)
            .map_err(|e| WorkflowError::spawn(command.clone(), e))?;
        if out.success() {
            Ok(out)
        } else {
            Err(WorkflowError::Command {
                command,
                code: out.code,
                stderr: pick_error_text(&out),
            })
        }
    }

    fn probe<R: CommandRunner>(&self, runner: &mut R, req: ExecRequest) -> Result<bool, WorkflowError> {
        let command = display_command(&req);
        runner
            .run(&req)
            .map(|o| o.success())
            .map_err(|e| WorkflowError::spawn(command, e))
    }

    #[instrument(level = "debug", skip_all)]
    pub fn status<R: CommandRunner>(&self, runner: &mut R) -> Result<RepositoryStatus, WorkflowError> {
        let out = self.exec(
            runner,
            self.request(&["status", "--porcelain=v1", "-z", "-uall"]),
        )?;
        Ok(status::parse_porcelain_z(&out.stdout))
    }

    pub fn toplevel<R: CommandRunner>(&self, runner: &mut R) -> Result<PathBuf, WorkflowError> {
        let out = self.exec(runner, self.request(&["rev-parse", "--show-toplevel"]))?;
        Ok(PathBuf::from(out.stdout.trim()))
    }

    pub fn current_branch<R: CommandRunner>(&self, runner: &mut R) -> Option<String> {
        self.exec(runner, self.request(&["rev-parse", "--abbrev-ref", "HEAD"]))
            .ok()
            .map(|o| o.stdout.trim().to_string())
            .filter(|s| !s.is_empty() && s != "HEAD")
    }

    pub fn local_branch_exists<R: CommandRunner>(
        &self,
        runner: &mut R,
        name: &str,
    ) -> Result<bool, WorkflowError> {
        let refname = format!("refs/heads/{name}");
        self.probe(
            runner,
            self.request(&["rev-parse", "--verify", "--quiet", &refname]),
        )
    }

    pub fn remote_branch_exists<R: CommandRunner>(
        &self,
        runner: &mut R,
        remote: &str,
        name: &str,
    ) -> Result<bool, WorkflowError> {
        let refname = format!("refs/remotes/{remote}/{name}");
        self.probe(
            runner,
            self.request(&["rev-parse", "--verify", "--quiet", &refname]),
        )
    }

    /// Object name of the newest stash entry, if any.
    pub fn stash_head<R: CommandRunner>(&self, runner: &mut R) -> Result<Option<String>, WorkflowError> {
        let req = self.request(&["rev-parse", "--verify", "--quiet", "refs/stash"]);
        let command = display_command(&req);
        let out = runner
            .run(&req)
            .map_err(|e| WorkflowError::spawn(command, e))?;
        Ok(Some(out.stdout.trim().to_string()).filter(|s| out.success() && !s.is_empty()))
    }

    pub fn stash_push<R: CommandRunner>(&self, runner: &mut R, message: &str) -> Result<(), WorkflowError> {
        self.exec(
            runner,
            self.request(&["stash", "push", "--include-untracked", "-m", message])
                .mutating(true),
        )
        .map(|_| ())
    }

    pub fn stash_pop<R: CommandRunner>(&self, runner: &mut R) -> Result<(), WorkflowError> {
        self.exec(runner, self.request(&["stash", "pop"]).mutating(true))
            .map(|_| ())
    }

    #[instrument(level = "debug", skip(self, runner))]
    pub fn switch<R: CommandRunner>(&self, runner: &mut R, branch: &str) -> Result<(), WorkflowError> {
        self.exec(runner, self.request(&["switch", branch]).mutating(true))
            .map(|_| ())
    }

    #[instrument(level = "debug", skip(self, runner))]
    pub fn switch_create<R: CommandRunner>(&self, runner: &mut R, branch: &str) -> Result<(), WorkflowError> {
        self.exec(runner, self.request(&["switch", "-c", branch]).mutating(true))
            .map(|_| ())
    }

    #[instrument(level = "debug", skip(self, runner))]
    pub fn pull<R: CommandRunner>(
        &self,
        runner: &mut R,
        remote: &str,
        branch: &str,
        mode: PullMode,
    ) -> Result<(), WorkflowError> {
        let mut args = vec!["pull"];
        args.extend(mode.git_args());
        args.push(remote);
        args.push(branch);
        self.exec(runner, self.request(&args).mutating(true))
            .map(|_| ())
    }

    pub fn add_all<R: CommandRunner>(&self, runner: &mut R) -> Result<(), WorkflowError> {
        self.exec(runner, self.request(&["add", "--all"]).mutating(true))
            .map(|_| ())
    }

    pub fn staged_changes<R: CommandRunner>(&self, runner: &mut R) -> Result<ChangeSet, WorkflowError> {
        let out = self.exec(
            runner,
            self.request(&["diff", "--cached", "--name-status", "-z", "-M"]),
        )?;
        Ok(status::parse_name_status_z(&out.stdout))
    }

    /// Commit with the message fed on stdin (`-F -`) so multi-line bodies survive intact.
    #[instrument(level = "debug", skip_all)]
    pub fn commit<R: CommandRunner>(&self, runner: &mut R, message: &str) -> Result<(), WorkflowError> {
        self.exec(
            runner,
            self.request(&["commit", "-F", "-"])
                .stdin(message)
                .mutating(true),
        )
        .map(|_| ())
    }

    #[instrument(level = "debug", skip(self, runner))]
    pub fn push<R: CommandRunner>(
        &self,
        runner: &mut R,
        remote: &str,
        branch: &str,
    ) -> Result<(), WorkflowError> {
        self.exec(
            runner,
            self.request(&["push", "--set-upstream", remote, branch])
                .mutating(true),
        )
        .map(|_| ())
    }

    /// Non-merge commits reachable from `head` but not from `base`, newest first.
    pub fn log_subjects<R: CommandRunner>(
        &self,
        runner: &mut R,
        base: &str,
        head: &str,
    ) -> Result<Vec<CommitSummary>, WorkflowError> {
        let range = format!("{base}..{head}");
        let out = self.exec(
            runner,
            self.request(&["log", "--no-merges", "--pretty=format:%h%x09%s", &range]),
        )?;
        Ok(parse_log_subjects(&out.stdout))
    }

    pub fn remote_url<R: CommandRunner>(&self, runner: &mut R, remote: &str) -> Option<String> {
        self.exec(runner, self.request(&["remote", "get-url", remote]))
            .ok()
            .map(|o| o.stdout.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

/// Render a request for operator messages without the `-C <repo>` noise.
fn display_command(req: &ExecRequest) -> String {
    let mut words = vec![req.program()];
    let args = req.arg_strings();
    let mut iter = args.into_iter().peekable();
    if iter.peek().map(String::as_str) == Some("-C") {
        iter.next();
        iter.next();
    }
    words.extend(iter);
    crate::util::shell_join(&words)
}

fn pick_error_text(out: &ExecOutput) -> String {
    if out.stderr.trim().is_empty() {
        out.stdout.clone()
    } else {
        out.stderr.clone()
    }
}

fn parse_log_subjects(raw: &str) -> Vec<CommitSummary> {
    raw.lines()
        .filter_map(|line| {
            let line = line.trim_end();
            if line.is_empty() {
                return None;
            }
            let (sha, subject) = line.split_once('\t').unwrap_or((line, ""));
            Some(CommitSummary {
                sha: sha.trim().to_string(),
                subject: subject.trim().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_command_hides_repo_flag() {
        let git = Git::new("/tmp/some repo");
        let req = git.request(&["push", "--set-upstream", "origin", "fix/auth"]);
        assert_eq!(
            display_command(&req),
            "git push --set-upstream origin fix/auth"
        );
        assert!(req.command_line().contains("'/tmp/some repo'"));
    }

    #[test]
    fn test_parse_log_subjects() {
        let raw = "abc1234\tfix: update auth\ndef5678\tdocs: readme\n\n";
        let commits = parse_log_subjects(raw);
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].sha, "abc1234");
        assert_eq!(commits[0].subject, "fix: update auth");
    }

    #[test]
    fn test_error_text_falls_back_to_stdout() {
        let out = ExecOutput {
            code: Some(1),
            stdout: "nothing to commit, working tree clean\n".into(),
            ..ExecOutput::default()
        };
        assert!(pick_error_text(&out).contains("nothing to commit"));
    }
}
