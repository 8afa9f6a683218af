use std::path::Path;

use gitship::git::Git;
use gitship::hosting::{locate, HostingCli};
use gitship::util::exec::{CommandRunner, ExecRequest, ExecService};
use gitship::{diagnostics, paint, Config};

fn first_line(runner: &mut ExecService, program: &Path) -> Option<String> {
    let out = runner
        .run(&ExecRequest::new(program.as_os_str()).arg("--version"))
        .ok()?;
    if !out.success() {
        return None;
    }
    out.stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

/// Print environment, tool and configuration report to stderr.
/// Returns false when git is missing.
pub fn run_doctor(repo: &Path, verbose: bool) -> bool {
    let use_err = gitship::color_enabled_stderr();
    let val = |s: &str| paint(use_err, "\x1b[34;1m", s);
    let mut runner = ExecService::default();

    eprintln!("gitship doctor");
    eprintln!();
    eprintln!("  version: v{}", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "  host:    {} / {}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    if verbose {
        eprintln!("  build date:    {}", env!("GITSHIP_BUILD_DATE"));
        eprintln!("  build target:  {}", env!("GITSHIP_BUILD_TARGET"));
        eprintln!("  build profile: {}", env!("GITSHIP_BUILD_PROFILE"));
    }
    eprintln!();

    let git_ok = match which::which("git") {
        Ok(p) => {
            let version = first_line(&mut runner, &p).unwrap_or_else(|| "(unknown)".to_string());
            eprintln!("  git: {} ({})", val(&p.display().to_string()), version);
            true
        }
        Err(_) => {
            eprintln!("  git: {}", paint(use_err, "\x1b[31;1m", "not found"));
            false
        }
    };

    let cfg = match Config::load(repo) {
        Ok(c) => c,
        Err(e) => {
            eprintln!(
                "  config: {} ({e:#}); showing defaults",
                paint(use_err, "\x1b[31;1m", "invalid")
            );
            Config::default()
        }
    };

    match locate(&cfg.hosting_cli) {
        Some(p) => {
            let version = HostingCli::new(cfg.hosting_cli.clone(), repo)
                .probe(&mut runner)
                .unwrap_or_else(|| "(unknown)".to_string());
            eprintln!(
                "  {}: {} ({})",
                cfg.hosting_cli,
                val(&p.display().to_string()),
                version
            );
        }
        None => eprintln!(
            "  {}: {} (pull requests will need to be opened manually)",
            cfg.hosting_cli,
            paint(use_err, "\x1b[33m", "not found")
        ),
    }
    eprintln!();

    if git_ok {
        let git = Git::new(repo);
        match git.toplevel(&mut runner) {
            Ok(top) => {
                eprintln!("  repository: {}", val(&top.display().to_string()));
                let branch = git
                    .current_branch(&mut runner)
                    .unwrap_or_else(|| "(detached)".to_string());
                eprintln!("  current branch: {}", branch);
                let url = git
                    .remote_url(&mut runner, &cfg.remote)
                    .unwrap_or_else(|| "(not configured)".to_string());
                eprintln!("  remote {}: {}", cfg.remote, url);
            }
            Err(_) => eprintln!(
                "  repository: {}",
                paint(use_err, "\x1b[33m", "not inside a git repository")
            ),
        }
    }

    let source = cfg
        .source
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(defaults)".to_string());
    eprintln!("  config: {}", source);
    eprintln!("    remote:        {}", cfg.remote);
    eprintln!("    base branches: {}", cfg.base_branches.join(", "));
    eprintln!("    message style: {:?}", cfg.message_style);
    eprintln!("    pull mode:     {}", cfg.pull_mode.git_args().join(" "));
    eprintln!("    draft PRs:     {}", if cfg.draft { "yes" } else { "no" });
    if let Some(t) = cfg.command_timeout {
        eprintln!("    command timeout: {}", humantime::format_duration(t));
    }
    let diag = cfg.diagnostics_path(repo);
    match diagnostics::load(&diag) {
        Ok(data) if !data.is_empty() => {
            let stats = diagnostics::statistics(&data);
            eprintln!(
                "  diagnostics: {} error(s), {} warning(s) in {}",
                stats.errors,
                stats.warnings,
                diag.display()
            );
        }
        Ok(_) => {}
        Err(e) => eprintln!("  diagnostics: unreadable ({e:#})"),
    }
    eprintln!();
    eprintln!("doctor: completed diagnostics.");
    git_ok
}
