use std::process::ExitCode;

use clap::Parser;

mod cli;
mod commands;
mod doctor;

use crate::cli::{Cli, Command};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(mode) = cli.color {
        gitship::set_color_mode(mode);
    }
    gitship::telemetry_init(cli.verbose);

    let repo = cli.repo.clone();
    let verbose = cli.verbose;
    match cli.into_command() {
        Command::Run(args) => commands::run_workflow(repo.as_deref(), args),
        Command::Doctor => commands::run_doctor_command(repo.as_deref(), verbose),
        Command::Diagnostics { json, file } => {
            commands::run_diagnostics(repo.as_deref(), json, file)
        }
    }
}
