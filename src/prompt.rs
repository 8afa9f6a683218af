//! Operator confirmation: the workflow asks yes/no questions through [`Confirm`].
use std::io::{BufRead, Write};

use crate::{color_enabled_stderr, paint};

/// Synchronous yes/no question to the operator.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> bool;
}

impl<C: Confirm + ?Sized> Confirm for &mut C {
    fn confirm(&mut self, question: &str) -> bool {
        (**self).confirm(question)
    }
}

/// Answers every question with a fixed value (`--yes`, CI).
#[derive(Debug, Clone, Copy)]
pub struct Fixed(pub bool);

impl Confirm for Fixed {
    fn confirm(&mut self, _question: &str) -> bool {
        self.0
    }
}

/// Interactive `[y/N]` prompt on stderr. Non-interactive stdin declines.
#[derive(Debug, Default)]
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&mut self, question: &str) -> bool {
        let use_err = color_enabled_stderr();
        if !atty::is(atty::Stream::Stdin) {
            eprintln!(
                "{}",
                paint(
                    use_err,
                    "\x1b[33m",
                    "gitship: stdin is not interactive; treating the question as declined. Re-run with --yes to continue."
                )
            );
            return false;
        }
        let prompt = format!("gitship: {} [y/N] ", question);
        eprint!("{}", paint(use_err, "\x1b[33m", &prompt));
        let _ = std::io::stderr().flush();
        let stdin = std::io::stdin();
        read_answer(&mut stdin.lock())
    }
}

/// Parse one line of input; only `y`/`yes` (any case) accept.
pub fn read_answer<R: BufRead>(input: &mut R) -> bool {
    let mut line = String::new();
    if input.read_line(&mut line).is_err() {
        return false;
    }
    let ans = line.trim().to_ascii_lowercase();
    ans == "y" || ans == "yes"
}
