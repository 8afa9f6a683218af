/*!
Test support helpers shared across integration tests.

- have_git(): check git availability on PATH
- init_repo_with_default_user(dir): initialize a git repo with default user.name/email
- git(dir, args): run git in a directory and return trimmed stdout
- ScriptedRunner: CommandRunner that answers from a script and records every call
- Answer: Confirm responder that records the questions it was asked

These helpers do not print skip messages themselves so tests can keep their own
"skipping: ..." lines.
*/

use std::collections::VecDeque;
use std::io;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use gitship::prompt::Confirm;
use gitship::util::exec::{CommandRunner, ExecOutput, ExecRequest};

/// Return true if `git` is available on PATH.
#[allow(dead_code)]
pub fn have_git() -> bool {
    Command::new("git")
        .arg("--version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Run git in `dir`, panicking on failure; returns trimmed stdout.
#[allow(dead_code)]
pub fn git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("spawn git");
    assert!(
        out.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}

/// Initialize a repository on `main` with a default identity and one commit.
#[allow(dead_code)]
pub fn init_repo_with_default_user(dir: &Path) -> io::Result<()> {
    let run = |args: &[&str]| -> io::Result<()> {
        let st = Command::new("git")
            .args(args)
            .current_dir(dir)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()?;
        if st.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!("git {:?} failed", args)))
        }
    };
    run(&["init", "-q"])?;
    run(&["symbolic-ref", "HEAD", "refs/heads/main"])?;
    run(&["config", "user.name", "UT"])?;
    run(&["config", "user.email", "ut@example.com"])?;
    run(&["config", "commit.gpgsign", "false"])?;
    std::fs::write(dir.join("README.md"), "init\n")?;
    run(&["add", "-A"])?;
    run(&["commit", "-q", "-m", "init"])?;
    Ok(())
}

#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum Reply {
    Ok(String),
    Fail(i32, String),
    /// The program could not be started (io NotFound).
    Missing,
}

struct Rule {
    words: Vec<String>,
    replies: VecDeque<Reply>,
}

/// One recorded invocation, with git's `-C <repo>` stripped.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Call {
    pub words: Vec<String>,
    pub mutating: bool,
    pub stdin: Option<String>,
}

#[allow(dead_code)]
impl Call {
    pub fn line(&self) -> String {
        self.words.join(" ")
    }

    pub fn starts_with(&self, prefix: &[&str]) -> bool {
        self.words.len() >= prefix.len() && self.words.iter().zip(prefix).all(|(a, b)| a == b)
    }
}

/// Scripted command runner.
///
/// Rules match on a word prefix (`["git", "status"]`); the longest matching prefix
/// wins, later rules win ties. A rule with several replies hands them out in order
/// and then keeps repeating the last one. Unmatched calls succeed with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Vec<Rule>,
    pub calls: Vec<Call>,
}

#[allow(dead_code)]
impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, words: &[&str], replies: Vec<Reply>) -> Self {
        self.rules.push(Rule {
            words: words.iter().map(|s| s.to_string()).collect(),
            replies: replies.into(),
        });
        self
    }

    pub fn ok(self, words: &[&str], stdout: &str) -> Self {
        self.on(words, vec![Reply::Ok(stdout.to_string())])
    }

    pub fn fail(self, words: &[&str], code: i32, stderr: &str) -> Self {
        self.on(words, vec![Reply::Fail(code, stderr.to_string())])
    }

    pub fn calls_matching(&self, prefix: &[&str]) -> Vec<&Call> {
        self.calls.iter().filter(|c| c.starts_with(prefix)).collect()
    }

    pub fn mutating_calls(&self) -> Vec<&Call> {
        self.calls.iter().filter(|c| c.mutating).collect()
    }

    fn reply_for(&mut self, words: &[String]) -> Reply {
        let mut best: Option<usize> = None;
        for (i, rule) in self.rules.iter().enumerate() {
            let matches = words.len() >= rule.words.len()
                && words.iter().zip(&rule.words).all(|(a, b)| a == b);
            if !matches {
                continue;
            }
            match best {
                Some(b) if self.rules[b].words.len() > rule.words.len() => {}
                _ => best = Some(i),
            }
        }
        let Some(i) = best else {
            return Reply::Ok(String::new());
        };
        let replies = &mut self.rules[i].replies;
        if replies.len() > 1 {
            replies.pop_front().unwrap_or(Reply::Ok(String::new()))
        } else {
            replies.front().cloned().unwrap_or(Reply::Ok(String::new()))
        }
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&mut self, request: &ExecRequest) -> anyhow::Result<ExecOutput> {
        let mut words = vec![request.program()];
        let mut args = request.arg_strings().into_iter().peekable();
        if args.peek().map(String::as_str) == Some("-C") {
            args.next();
            args.next();
        }
        words.extend(args);
        self.calls.push(Call {
            words: words.clone(),
            mutating: request.is_mutating(),
            stdin: request.stdin_text().map(str::to_string),
        });
        match self.reply_for(&words) {
            Reply::Ok(stdout) => Ok(ExecOutput {
                code: Some(0),
                duration: Duration::ZERO,
                stdout,
                stderr: String::new(),
            }),
            Reply::Fail(code, stderr) => Ok(ExecOutput {
                code: Some(code),
                duration: Duration::ZERO,
                stdout: String::new(),
                stderr,
            }),
            Reply::Missing => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: not found", words[0]),
            )
            .into()),
        }
    }
}

/// Confirm responder with a fixed answer that records every question.
#[allow(dead_code)]
pub struct Answer {
    pub value: bool,
    pub asked: Vec<String>,
}

#[allow(dead_code)]
impl Answer {
    pub fn yes() -> Self {
        Self {
            value: true,
            asked: Vec::new(),
        }
    }

    pub fn no() -> Self {
        Self {
            value: false,
            asked: Vec::new(),
        }
    }
}

impl Confirm for Answer {
    fn confirm(&mut self, question: &str) -> bool {
        self.asked.push(question.to_string());
        self.value
    }
}
