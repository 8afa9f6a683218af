/*!
Editor diagnostics gate.

Reads a `vscode-diagnostics.json` export (a list of `{file, diagnostics[]}` entries with
LSP severities 0..3) and renders a Markdown report when errors or warnings are present.
The workflow only attaches a warning note; `gitship diagnostics` prints the report.
*/

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_FILE_NAME: &str = "vscode-diagnostics.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
    Unknown,
}

impl Severity {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Severity::Error,
            1 => Severity::Warning,
            2 => Severity::Information,
            3 => Severity::Hint,
            _ => Severity::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
            Severity::Information => "Information",
            Severity::Hint => "Hint",
            Severity::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub character: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Diagnostic {
    #[serde(default)]
    pub severity: u8,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub source: Option<String>,
    /// Language servers emit strings, numbers or `{value, target}` objects here.
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    #[serde(default)]
    pub start: Position,
    #[serde(default)]
    pub end: Position,
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        Severity::from_code(self.severity)
    }

    fn code_text(&self) -> Option<String> {
        match self.code.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(map) => map.get("value").map(|v| match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileDiagnostics {
    pub file: String,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticStats {
    pub total_files: usize,
    pub total_diagnostics: usize,
    pub errors: usize,
    pub warnings: usize,
    pub information: usize,
    pub hints: usize,
}

impl DiagnosticStats {
    pub fn blocking(&self) -> bool {
        self.errors > 0 || self.warnings > 0
    }
}

/// Load the diagnostics export. A missing or blank file yields an empty list.
pub fn load(path: &Path) -> Result<Vec<FileDiagnostics>> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", path.display()))
        }
    };
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&text).with_context(|| format!("invalid diagnostics file {}", path.display()))
}

fn count(diags: &[Diagnostic], sev: Severity) -> usize {
    diags.iter().filter(|d| d.severity() == sev).count()
}

pub fn statistics(data: &[FileDiagnostics]) -> DiagnosticStats {
    let mut stats = DiagnosticStats {
        total_files: data.len(),
        ..DiagnosticStats::default()
    };
    for f in data {
        stats.total_diagnostics += f.diagnostics.len();
        stats.errors += count(&f.diagnostics, Severity::Error);
        stats.warnings += count(&f.diagnostics, Severity::Warning);
        stats.information += count(&f.diagnostics, Severity::Information);
        stats.hints += count(&f.diagnostics, Severity::Hint);
    }
    stats
}

fn relativize(file: &str, root: &Path) -> String {
    let normalized = file.replace('\\', "/");
    let root = root.display().to_string().replace('\\', "/");
    let root = root.trim_end_matches('/');
    match normalized.strip_prefix(root) {
        Some(rest) if !root.is_empty() && rest.starts_with('/') => rest[1..].to_string(),
        _ => normalized,
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Markdown report; None when there are no errors or warnings.
pub fn render_markdown(data: &[FileDiagnostics], root: &Path) -> Option<String> {
    let stats = statistics(data);
    if !stats.blocking() {
        return None;
    }
    let mut lines: Vec<String> = vec![
        "### Diagnostics summary".to_string(),
        String::new(),
        format!("- Error: {}", stats.errors),
        format!("- Warning: {}", stats.warnings),
        String::new(),
    ];
    for f in data.iter().filter(|f| !f.diagnostics.is_empty()) {
        let name = Path::new(&f.file.replace('\\', "/"))
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| f.file.clone());
        let parts: Vec<String> = [
            (Severity::Error, "error"),
            (Severity::Warning, "warning"),
            (Severity::Information, "information"),
            (Severity::Hint, "hint"),
        ]
        .iter()
        .filter_map(|(sev, word)| {
            let n = count(&f.diagnostics, *sev);
            (n > 0).then(|| plural(n, word))
        })
        .collect();
        lines.push(format!("### {} ({})", name, parts.join(", ")));
        lines.push(String::new());
        let rel = relativize(&f.file, root);
        for d in &f.diagnostics {
            lines.push(format!(
                "**Line {}:{}-{}** - {}",
                d.start.line,
                d.start.character,
                d.end.character,
                d.severity().label()
            ));
            let msg = if d.message.is_empty() { "(none)" } else { d.message.as_str() };
            lines.push(format!("- **Message**: {msg}"));
            if let Some(src) = d.source.as_deref().filter(|s| !s.is_empty()) {
                lines.push(format!("- **Source**: {src}"));
            }
            if let Some(code) = d.code_text() {
                lines.push(format!("- **Code**: {code}"));
            }
            lines.push(format!("- **Path**: `{rel}`"));
            lines.push(String::new());
        }
    }
    Some(lines.join("\n"))
}

/// Hook-style decision object for automation (`--json`).
pub fn block_decision(reason: &str) -> serde_json::Value {
    serde_json::json!({ "decision": "block", "reason": reason })
}
