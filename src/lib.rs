/*!
gitship: move pending working-tree changes onto a fresh feature branch, commit them with
a generated message, push, and open a pull request.

The crate is a thin orchestrator around the `git` CLI and an optional hosting CLI
(`gh`). Every external call goes through [`util::exec::CommandRunner`], so the whole
workflow can be driven by a scripted runner in tests.

Module map:
- [`workflow`]: the step sequence, step results and the run summary.
- [`git`]: command builders and parsers for the `git` CLI.
- [`plan`]: pure change classification, branch naming and message generation.
- [`hosting`]: hosting CLI probe, PR creation and manual fallback.
- [`config`]: layered configuration (defaults, YAML, environment).
- [`diagnostics`]: editor diagnostics report.
- [`prompt`], [`color`], [`errors`], [`telemetry`], [`util`]: ambient plumbing.
*/

pub mod color;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod git;
pub mod hosting;
pub mod plan;
pub mod prompt;
pub mod telemetry;
pub mod util;
pub mod workflow;

pub use color::{
    color_enabled_stderr, log_error_stderr, log_info_stderr, log_warn_stderr, paint,
    set_color_mode, ColorMode,
};
pub use config::{Config, MessageStyle, PullMode};
pub use errors::{exit_code_for_io_error, exit_code_for_workflow_error, WorkflowError};
pub use telemetry::telemetry_init;
pub use workflow::{Options, Orchestrator, Outcome, RunSummary, Step, StepLog, StepResult, StepStatus};
