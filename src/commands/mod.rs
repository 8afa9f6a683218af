use std::path::{Path, PathBuf};
use std::process::ExitCode;

use gitship::diagnostics;
use gitship::git::Git;
use gitship::prompt::{Confirm, Fixed, TerminalConfirm};
use gitship::util::exec::{CommandRunner, DryRunRunner, ExecService};
use gitship::{Config, Options, Orchestrator, StepLog};

use crate::cli::RunArgs;
use crate::doctor::run_doctor;

fn start_dir(repo: Option<&Path>) -> PathBuf {
    repo.map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Fail early with 127 when git is not installed.
fn require_git() -> Result<(), ExitCode> {
    if which::which("git").is_err() {
        let use_err = gitship::color_enabled_stderr();
        gitship::log_error_stderr(
            use_err,
            "gitship: error: git is required and was not found in PATH.",
        );
        return Err(ExitCode::from(127));
    }
    Ok(())
}

fn apply_run_overrides(cfg: &mut Config, args: &RunArgs) {
    if let Some(r) = args.remote.as_deref().filter(|r| !r.trim().is_empty()) {
        cfg.remote = r.trim().to_string();
    }
    if let Some(s) = args.style {
        cfg.message_style = s;
    }
    if let Some(m) = args.pull_mode {
        cfg.pull_mode = m;
    }
    if args.draft {
        cfg.draft = true;
    }
}

pub fn run_workflow(repo: Option<&Path>, args: RunArgs) -> ExitCode {
    let use_err = gitship::color_enabled_stderr();
    if let Err(code) = require_git() {
        return code;
    }
    let dir = start_dir(repo);
    let mut probe = ExecService::default();
    let top = match Git::new(&dir).toplevel(&mut probe) {
        Ok(t) => t,
        Err(e) => {
            gitship::log_error_stderr(
                use_err,
                &format!("gitship: error: {} is not inside a git repository: {e}", dir.display()),
            );
            return ExitCode::from(gitship::exit_code_for_workflow_error(&e));
        }
    };
    let mut cfg = match Config::load(&top) {
        Ok(c) => c,
        Err(e) => {
            gitship::log_error_stderr(use_err, &format!("gitship: error: {e:#}"));
            return ExitCode::from(1);
        }
    };
    apply_run_overrides(&mut cfg, &args);

    let options = Options {
        base: args.base.clone(),
        branch: args.branch.clone(),
        message: args.message.clone(),
        no_pr: args.no_pr,
        dry_run: args.dry_run,
    };
    let exec = ExecService::default();
    let runner: Box<dyn CommandRunner> = if args.dry_run {
        Box::new(DryRunRunner::new(exec, use_err))
    } else {
        Box::new(exec)
    };
    let mut confirm: Box<dyn Confirm> = if args.yes {
        Box::new(Fixed(true))
    } else {
        Box::new(TerminalConfirm)
    };
    // JSON mode keeps stderr to the final summary only.
    let log = if args.json {
        StepLog::silent()
    } else {
        StepLog::stderr()
    };

    let summary = Orchestrator::new(top, cfg, options, runner, confirm.as_mut())
        .with_log(log)
        .run();

    if args.json {
        match summary.to_json() {
            Ok(s) => println!("{s}"),
            Err(e) => {
                gitship::log_error_stderr(use_err, &format!("gitship: error: {e}"));
                return ExitCode::from(1);
            }
        }
    } else {
        eprintln!();
        summary.print(use_err);
    }
    ExitCode::from(summary.exit_code())
}

pub fn run_doctor_command(repo: Option<&Path>, verbose: bool) -> ExitCode {
    let dir = start_dir(repo);
    if run_doctor(&dir, verbose) {
        ExitCode::from(0)
    } else {
        ExitCode::from(127)
    }
}

/// Print the diagnostics report. Exit 1 when errors or warnings are present.
pub fn run_diagnostics(repo: Option<&Path>, json: bool, file: Option<PathBuf>) -> ExitCode {
    let use_err = gitship::color_enabled_stderr();
    let dir = start_dir(repo);
    // Outside a repository (or without git) the starting directory is the root.
    let root = which::which("git")
        .ok()
        .and_then(|_| Git::new(&dir).toplevel(&mut ExecService::default()).ok())
        .unwrap_or_else(|| dir.clone());
    let path = match file {
        Some(f) if f.is_absolute() => f,
        Some(f) => dir.join(f),
        None => match Config::load(&root) {
            Ok(cfg) => cfg.diagnostics_path(&root),
            Err(e) => {
                gitship::log_error_stderr(use_err, &format!("gitship: error: {e:#}"));
                return ExitCode::from(1);
            }
        },
    };
    let data = match diagnostics::load(&path) {
        Ok(d) => d,
        Err(e) => {
            gitship::log_warn_stderr(use_err, &format!("gitship: {e:#}"));
            return ExitCode::from(0);
        }
    };
    let Some(report) = diagnostics::render_markdown(&data, &root) else {
        if !json {
            gitship::log_info_stderr(use_err, "gitship: no errors or warnings reported");
        }
        return ExitCode::from(0);
    };
    if json {
        println!("{}", diagnostics::block_decision(&report));
    } else {
        println!("{report}");
    }
    ExitCode::from(1)
}
