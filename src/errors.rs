//! Error mapping guide:
//! - Map io::ErrorKind::NotFound to exit code 127; all others to 1.
//! - WorkflowError carries the raw tool output; Display renders the operator-facing line.
use std::fmt;
use std::io;

/// Map an io::Error to a process exit code:
/// - 127 for NotFound (command not found)
/// - 1 for all other errors
pub fn exit_code_for_io_error(e: &io::Error) -> u8 {
    if e.kind() == io::ErrorKind::NotFound {
        127
    } else {
        1
    }
}

/// Fatal conditions raised by a workflow step.
#[derive(Debug)]
pub enum WorkflowError {
    /// None of the candidate base branch names exist locally or on the remote.
    MissingBaseBranch { candidates: Vec<String> },
    /// The working tree still has changes at the point a branch switch would happen.
    DirtyTree { files: Vec<String> },
    /// A merge, rebase or earlier stash pop left paths unresolved.
    Unmerged { files: Vec<String> },
    /// An external command ran and exited unsuccessfully.
    Command {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    /// An external command could not be started at all.
    Spawn { command: String, source: io::Error },
}

impl WorkflowError {
    /// Build a Spawn error from an anyhow chain, keeping the io::Error when there is one.
    pub fn spawn(command: impl Into<String>, err: anyhow::Error) -> Self {
        let source = match err.downcast::<io::Error>() {
            Ok(ioe) => ioe,
            Err(other) => io::Error::other(format!("{other:#}")),
        };
        WorkflowError::Spawn {
            command: command.into(),
            source,
        }
    }
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowError::MissingBaseBranch { candidates } => write!(
                f,
                "no base branch found (looked for: {})",
                candidates.join(", ")
            ),
            WorkflowError::DirtyTree { files } => write!(
                f,
                "working tree is not clean; refusing to switch branches ({} file(s) blocking: {})",
                files.len(),
                files.join(", ")
            ),
            WorkflowError::Unmerged { files } => write!(
                f,
                "unresolved conflicts in {} file(s): {}",
                files.len(),
                files.join(", ")
            ),
            WorkflowError::Command {
                command,
                code,
                stderr,
            } => {
                let code = code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string());
                let detail = stderr.trim();
                if detail.is_empty() {
                    write!(f, "`{command}` failed (exit {code})")
                } else {
                    write!(f, "`{command}` failed (exit {code}): {detail}")
                }
            }
            WorkflowError::Spawn { command, source } => {
                write!(f, "failed to start `{command}`: {source}")
            }
        }
    }
}

impl std::error::Error for WorkflowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorkflowError::Spawn { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convert WorkflowError to exit code (parity with io::Error mapping).
pub fn exit_code_for_workflow_error(e: &WorkflowError) -> u8 {
    match e {
        WorkflowError::Spawn { source, .. } => exit_code_for_io_error(source),
        _ => 1,
    }
}
