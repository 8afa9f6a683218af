use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct RunArgs {
    /// Base branch to cut from (default: first of main, master that exists)
    #[arg(long)]
    pub(crate) base: Option<String>,

    /// Remote to pull from and push to (default: origin)
    #[arg(long)]
    pub(crate) remote: Option<String>,

    /// Feature branch name (default: generated from the changes)
    #[arg(long)]
    pub(crate) branch: Option<String>,

    /// Commit subject (default: generated from the changes)
    #[arg(long, short = 'm')]
    pub(crate) message: Option<String>,

    /// Commit message style
    #[arg(long, value_enum)]
    pub(crate) style: Option<gitship::MessageStyle>,

    /// How to update the base branch before branching
    #[arg(long = "pull-mode", value_enum)]
    pub(crate) pull_mode: Option<gitship::PullMode>,

    /// Push only; do not open a pull request
    #[arg(long = "no-pr")]
    pub(crate) no_pr: bool,

    /// Open the pull request as a draft
    #[arg(long)]
    pub(crate) draft: bool,

    /// Answer yes to the confirmation prompt
    #[arg(long, short = 'y')]
    pub(crate) yes: bool,

    /// Print mutating git/gh commands instead of running them
    #[arg(long)]
    pub(crate) dry_run: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum Command {
    /// Branch, commit, push and open a pull request for the pending changes (default)
    Run(RunArgs),
    /// Check git and hosting CLI availability and show the effective configuration
    Doctor,
    /// Print the editor diagnostics report (vscode-diagnostics.json)
    Diagnostics {
        /// Emit a JSON decision object instead of Markdown
        #[arg(long)]
        json: bool,
        /// Diagnostics file (default: <repo>/vscode-diagnostics.json)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Parser, Debug)]
#[command(
    name = "gitship",
    version,
    about = "Move pending changes onto a fresh feature branch, commit, push and open a pull request.",
    args_conflicts_with_subcommands = true,
    after_long_help = "Examples:\n  gitship\n  gitship --dry-run\n  gitship --base develop --no-pr\n  gitship --message 'fix: handle expired tokens' --yes\n  gitship doctor\n  gitship diagnostics --json\n"
)]
pub(crate) struct Cli {
    /// Repository to operate on (default: current directory)
    #[arg(long, global = true)]
    pub(crate) repo: Option<PathBuf>,

    /// Colorize output: auto|always|never
    #[arg(long = "color", value_enum, global = true)]
    pub(crate) color: Option<gitship::ColorMode>,

    /// Print structured debug logs to stderr
    #[arg(long, short = 'v', global = true)]
    pub(crate) verbose: bool,

    #[command(flatten)]
    pub(crate) run: RunArgs,

    #[command(subcommand)]
    pub(crate) command: Option<Command>,
}

impl Cli {
    /// Subcommand to execute; bare `gitship` means `run`.
    pub(crate) fn into_command(self) -> Command {
        match self.command {
            Some(c) => c,
            None => Command::Run(self.run),
        }
    }
}
