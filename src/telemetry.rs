//! Structured logging setup.
//!
//! gitship keeps its operator output on plain stderr lines; `tracing` events are only
//! rendered when `GITSHIP_LOG` is set or `--verbose` is passed.

use std::env;

use once_cell::sync::OnceCell;
use tracing_subscriber::prelude::*;

static INIT: OnceCell<()> = OnceCell::new();

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Filter directive to install, if logging is enabled at all.
fn filter_directive(verbose: bool) -> Option<String> {
    let explicit = non_empty_env("GITSHIP_LOG");
    if explicit.is_none() && !verbose {
        return None;
    }
    let explicit = explicit.filter(|v| v != "1" && !v.eq_ignore_ascii_case("true"));
    Some(
        explicit
            .or_else(|| non_empty_env("RUST_LOG"))
            .unwrap_or_else(|| {
                if verbose {
                    "gitship=debug".to_string()
                } else {
                    "gitship=info".to_string()
                }
            }),
    )
}

/// Install the fmt subscriber once per process. Returns true when it was installed.
pub fn telemetry_init(verbose: bool) -> bool {
    if INIT.get().is_some() {
        return false;
    }
    let Some(filter) = filter_directive(verbose) else {
        return false;
    };
    let env_filter = tracing_subscriber::EnvFilter::new(filter);
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);
    let registry = tracing_subscriber::registry().with(env_filter).with(fmt_layer);
    if registry.try_init().is_err() {
        eprintln!("gitship: logging init skipped (global subscriber already set)");
        return false;
    }
    let _ = INIT.set(());
    true
}
