//! Optional code-hosting CLI (`gh` by default): presence probe, PR creation and the
//! manual fallback shown when the CLI is not installed.

use std::path::PathBuf;

use tracing::{debug, instrument};

use crate::errors::WorkflowError;
use crate::git::remote::compare_url;
use crate::plan::PullRequestPlan;
use crate::util::exec::{CommandRunner, ExecRequest};
use crate::util::shell_join;

#[derive(Debug, Clone)]
pub struct HostingCli {
    program: String,
    repo: PathBuf,
    draft: bool,
}

impl HostingCli {
    pub fn new(program: impl Into<String>, repo: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            repo: repo.into(),
            draft: false,
        }
    }

    pub fn draft(mut self, draft: bool) -> Self {
        self.draft = draft;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn request(&self) -> ExecRequest {
        ExecRequest::new(&self.program)
            .cwd(self.repo.as_path())
            .env("GH_PROMPT_DISABLED", "1")
    }

    /// First line of `<cli> --version`; None when the CLI is missing or broken.
    #[instrument(level = "debug", skip_all, fields(cli = %self.program))]
    pub fn probe<R: CommandRunner>(&self, runner: &mut R) -> Option<String> {
        match runner.run(&self.request().arg("--version")) {
            Ok(out) if out.success() => Some(
                out.stdout
                    .lines()
                    .map(str::trim)
                    .find(|l| !l.is_empty())
                    .unwrap_or(self.program.as_str())
                    .to_string(),
            ),
            Ok(out) => {
                debug!(code = ?out.code, "hosting cli version probe failed");
                None
            }
            Err(e) => {
                debug!(error = %e, "hosting cli not available");
                None
            }
        }
    }

    fn pr_args(&self, base: &str, head: &str, plan: &PullRequestPlan) -> Vec<String> {
        let mut args = vec![
            "pr".to_string(),
            "create".to_string(),
            "--base".to_string(),
            base.to_string(),
            "--head".to_string(),
            head.to_string(),
            "--title".to_string(),
            plan.title.clone(),
            "--body".to_string(),
            plan.body.clone(),
        ];
        if self.draft {
            args.push("--draft".to_string());
        }
        args
    }

    /// Open the pull request; returns the URL gh prints on success.
    #[instrument(level = "debug", skip(self, runner, plan))]
    pub fn create_pr<R: CommandRunner>(
        &self,
        runner: &mut R,
        base: &str,
        head: &str,
        plan: &PullRequestPlan,
    ) -> Result<String, WorkflowError> {
        let args = self.pr_args(base, head, plan);
        let req = self.request().args(args.iter()).mutating(true);
        let command = format!("{} pr create --base {} --head {}", self.program, base, head);
        let out = runner
            .run(&req)
            .map_err(|e| WorkflowError::spawn(command.clone(), e))?;
        if !out.success() {
            return Err(WorkflowError::Command {
                command,
                code: out.code,
                stderr: if out.stderr.trim().is_empty() {
                    out.stdout
                } else {
                    out.stderr
                },
            });
        }
        Ok(out
            .stdout
            .lines()
            .map(str::trim)
            .rfind(|l| l.starts_with("http"))
            .unwrap_or("")
            .to_string())
    }

    /// Steps the operator can follow to open the PR by hand.
    pub fn manual_instructions(
        &self,
        base: &str,
        head: &str,
        plan: &PullRequestPlan,
        remote_url: Option<&str>,
    ) -> Vec<String> {
        let mut words = vec![self.program.clone()];
        words.extend(self.pr_args(base, head, plan));
        let mut out = vec![format!(
            "install the `{}` CLI, authenticate, and run: {}",
            self.program,
            shell_join(&words)
        )];
        if let Some(url) = remote_url.and_then(|r| compare_url(r, base, head)) {
            out.push(format!("or open in a browser: {url}"));
        }
        out
    }
}

/// Resolve the hosting CLI path for doctor output.
pub fn locate(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}
