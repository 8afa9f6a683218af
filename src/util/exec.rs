use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use tracing::{debug, instrument};
use wait_timeout::ChildExt;

use crate::util::shell_join;

/// Seam between the workflow and the processes it starts.
///
/// The real implementation is [`ExecService`]; tests substitute a scripted runner.
pub trait CommandRunner {
    fn run(&mut self, request: &ExecRequest) -> Result<ExecOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &mut R {
    fn run(&mut self, request: &ExecRequest) -> Result<ExecOutput> {
        (**self).run(request)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for Box<R> {
    fn run(&mut self, request: &ExecRequest) -> Result<ExecOutput> {
        (**self).run(request)
    }
}

/// Structured command execution with optional timeouts.
#[derive(Debug, Clone)]
pub struct ExecService {
    default_timeout: Duration,
}

impl ExecService {
    /// A zero timeout waits for the process without limit.
    pub fn new(default_timeout: Duration) -> Self {
        Self { default_timeout }
    }
}

impl Default for ExecService {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl CommandRunner for ExecService {
    #[instrument(level = "debug", skip_all, fields(cmd = %request.command_line()))]
    fn run(&mut self, request: &ExecRequest) -> Result<ExecOutput> {
        let mut cmd = Command::new(&request.program);
        cmd.args(&request.args);
        if let Some(ref cwd) = request.cwd {
            cmd.current_dir(cwd);
        }
        for (key, value) in &request.env {
            cmd.env(key, value);
        }

        cmd.stdin(if request.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child = cmd.spawn().with_context(|| {
            format!(
                "failed to spawn {:?} with args {:?}",
                request.program, request.args
            )
        })?;

        // Drain pipes on threads so a chatty child cannot fill the pipe buffer and stall.
        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);

        if let Some(input) = &request.stdin {
            if let Some(mut pipe) = child.stdin.take() {
                // Dropping the pipe closes the child's stdin.
                if let Err(e) = pipe.write_all(input.as_bytes()) {
                    drop(pipe);
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = join_reader(stdout_reader);
                    let _ = join_reader(stderr_reader);
                    return Err(e).context("failed to write process stdin");
                }
            }
        }

        let timeout = request.timeout.unwrap_or(self.default_timeout);
        let started = Instant::now();
        let status = if timeout.is_zero() {
            child.wait().context("failed to wait for process")?
        } else {
            match child
                .wait_timeout(timeout)
                .context("failed to wait with timeout")?
            {
                Some(status) => status,
                None => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(anyhow!(
                        "command {:?} timed out after {:?}",
                        request.program,
                        timeout
                    ));
                }
            }
        };

        let duration = started.elapsed();
        let stdout = join_reader(stdout_reader)?;
        let stderr = join_reader(stderr_reader)?;
        debug!(code = ?status.code(), elapsed_ms = duration.as_millis() as u64, "command finished");

        Ok(ExecOutput {
            code: status.code(),
            duration,
            stdout,
            stderr,
        })
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut stream: R) -> thread::JoinHandle<io::Result<String>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    })
}

fn join_reader(handle: Option<thread::JoinHandle<io::Result<String>>>) -> Result<String> {
    match handle {
        None => Ok(String::new()),
        Some(h) => h
            .join()
            .map_err(|_| anyhow!("output reader thread panicked"))?
            .context("failed to read process output"),
    }
}

#[derive(Debug, Default, Clone)]
pub struct ExecRequest {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    env: Vec<(OsString, OsString)>,
    timeout: Option<Duration>,
    stdin: Option<String>,
    mutating: bool,
}

impl ExecRequest {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Feed `input` to the child's stdin, then close it.
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Mark the request as changing repository or remote state.
    pub fn mutating(mut self, mutating: bool) -> Self {
        self.mutating = mutating;
        self
    }

    pub fn is_mutating(&self) -> bool {
        self.mutating
    }

    pub fn program(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    pub fn stdin_text(&self) -> Option<&str> {
        self.stdin.as_deref()
    }

    /// Shell-quoted rendering used in logs and error messages.
    pub fn command_line(&self) -> String {
        let mut words = vec![self.program()];
        words.extend(self.arg_strings());
        shell_join(&words)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    /// None when the process was terminated by a signal.
    pub code: Option<i32>,
    pub duration: Duration,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runner that executes read-only requests and only prints mutating ones.
pub struct DryRunRunner<R> {
    inner: R,
    use_color: bool,
}

impl<R: CommandRunner> DryRunRunner<R> {
    pub fn new(inner: R, use_color: bool) -> Self {
        Self { inner, use_color }
    }
}

impl<R: CommandRunner> CommandRunner for DryRunRunner<R> {
    fn run(&mut self, request: &ExecRequest) -> Result<ExecOutput> {
        if !request.is_mutating() {
            return self.inner.run(request);
        }
        crate::log_warn_stderr(
            self.use_color,
            &format!("gitship: dry-run: would run: {}", request.command_line()),
        );
        Ok(ExecOutput {
            code: Some(0),
            ..ExecOutput::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_quotes_arguments() {
        let req = ExecRequest::new("git").args(["commit", "-m", "fix: update auth"]);
        assert_eq!(req.command_line(), "git commit -m 'fix: update auth'");
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_service_captures_stdout_and_code() {
        let mut svc = ExecService::default();
        let out = svc
            .run(&ExecRequest::new("sh").args(["-c", "echo hello; exit 3"]))
            .expect("run sh");
        assert_eq!(out.code, Some(3));
        assert!(!out.success());
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_service_feeds_stdin() {
        let mut svc = ExecService::default();
        let out = svc
            .run(&ExecRequest::new("cat").stdin("subject\n\nbody\n"))
            .expect("run cat");
        assert!(out.success());
        assert_eq!(out.stdout, "subject\n\nbody\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_service_times_out() {
        let mut svc = ExecService::new(Duration::from_millis(100));
        let err = svc
            .run(&ExecRequest::new("sleep").arg("5"))
            .expect_err("should time out");
        assert!(err.to_string().contains("timed out"), "{err}");
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_service_reaps_child_that_ignores_stdin() {
        // The child exits without reading; a large body hits a closed pipe.
        let mut svc = ExecService::new(Duration::from_secs(10));
        let body = "x".repeat(1 << 20);
        match svc.run(&ExecRequest::new("sh").args(["-c", "exit 0"]).stdin(body)) {
            Ok(out) => assert!(out.success()),
            Err(err) => assert!(
                format!("{err:#}").contains("failed to write process stdin"),
                "{err:#}"
            ),
        }
    }

    #[test]
    fn test_spawn_failure_is_not_found() {
        let mut svc = ExecService::default();
        let err = svc
            .run(&ExecRequest::new("gitship-definitely-not-a-real-binary"))
            .expect_err("spawn should fail");
        let ioe = err.downcast_ref::<io::Error>().expect("io error in chain");
        assert_eq!(ioe.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_dry_run_skips_mutating_requests() {
        struct Failing;
        impl CommandRunner for Failing {
            fn run(&mut self, _request: &ExecRequest) -> Result<ExecOutput> {
                Err(anyhow!("inner runner must not be called"))
            }
        }
        let mut dry = DryRunRunner::new(Failing, false);
        let out = dry
            .run(&ExecRequest::new("git").args(["push"]).mutating(true))
            .expect("dry-run push");
        assert!(out.success());
        assert!(dry.run(&ExecRequest::new("git").arg("status")).is_err());
    }
}
