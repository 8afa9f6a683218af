/*!
Layered configuration.

Precedence (lowest to highest):
1) built-in defaults
2) YAML file: `<repo>/.gitship.yml`, else `$XDG_CONFIG_HOME/gitship/config.yml`,
   else `~/.config/gitship/config.yml`
3) environment: GITSHIP_REMOTE, GITSHIP_BASE_BRANCHES (comma list), GITSHIP_MESSAGE_STYLE,
   GITSHIP_HOSTING_CLI, GITSHIP_PULL_MODE, GITSHIP_DRAFT
4) CLI flags (applied by the caller)
*/

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const REPO_CONFIG_FILE: &str = ".gitship.yml";

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStyle {
    /// `<type>: <summary>` when the change set maps onto a known category
    #[default]
    Conventional,
    /// Always a plain descriptive sentence
    Plain,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PullMode {
    #[default]
    FfOnly,
    Merge,
    Rebase,
}

impl PullMode {
    pub fn git_args(self) -> &'static [&'static str] {
        match self {
            PullMode::FfOnly => &["--ff-only"],
            PullMode::Merge => &["--no-rebase", "--no-edit"],
            PullMode::Rebase => &["--rebase"],
        }
    }
}

/// File schema; every field optional so partial files layer over defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    remote: Option<String>,
    base_branches: Option<Vec<String>>,
    message_style: Option<MessageStyle>,
    pull_mode: Option<PullMode>,
    hosting_cli: Option<String>,
    draft: Option<bool>,
    command_timeout: Option<String>,
    diagnostics_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub remote: String,
    pub base_branches: Vec<String>,
    pub message_style: MessageStyle,
    pub pull_mode: PullMode,
    pub hosting_cli: String,
    pub draft: bool,
    #[serde(serialize_with = "humantime_opt::serialize")]
    pub command_timeout: Option<Duration>,
    pub diagnostics_file: Option<PathBuf>,
    /// File the values were loaded from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            base_branches: vec!["main".to_string(), "master".to_string()],
            message_style: MessageStyle::Conventional,
            pull_mode: PullMode::FfOnly,
            hosting_cli: "gh".to_string(),
            draft: false,
            command_timeout: None,
            diagnostics_file: None,
            source: None,
        }
    }
}

mod humantime_opt {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(v: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(d) => s.serialize_str(&humantime::format_duration(*d).to_string()),
            None => s.serialize_none(),
        }
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Candidate config file paths in lookup order.
pub fn candidate_config_paths(repo: &Path) -> Vec<PathBuf> {
    config_paths_from(repo, env::var("XDG_CONFIG_HOME").ok(), home::home_dir())
}

fn config_paths_from(repo: &Path, xdg: Option<String>, home: Option<PathBuf>) -> Vec<PathBuf> {
    let mut out = vec![repo.join(REPO_CONFIG_FILE)];
    if let Some(xdg) = non_empty(xdg) {
        out.push(PathBuf::from(xdg).join("gitship").join("config.yml"));
    }
    if let Some(home) = home {
        let p = home.join(".config").join("gitship").join("config.yml");
        if !out.contains(&p) {
            out.push(p);
        }
    }
    out
}

impl Config {
    /// Load defaults, the first config file found and environment overrides.
    pub fn load(repo: &Path) -> Result<Self> {
        Config::load_from(&candidate_config_paths(repo), |k| env::var(k).ok())
    }

    fn load_from<F>(paths: &[PathBuf], lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = match paths.iter().find(|p| p.is_file()) {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        cfg.apply_env(lookup)?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut cfg = Config::from_yaml_str(&text)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        cfg.source = Some(path.to_path_buf());
        Ok(cfg)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let mut cfg = Config::default();
        if text.trim().is_empty() {
            return Ok(cfg);
        }
        let file: FileConfig = serde_yaml::from_str(text)?;
        if let Some(r) = non_empty(file.remote) {
            cfg.remote = r;
        }
        if let Some(list) = file.base_branches {
            let list: Vec<String> = list
                .into_iter()
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty())
                .collect();
            if !list.is_empty() {
                cfg.base_branches = list;
            }
        }
        if let Some(s) = file.message_style {
            cfg.message_style = s;
        }
        if let Some(m) = file.pull_mode {
            cfg.pull_mode = m;
        }
        if let Some(h) = non_empty(file.hosting_cli) {
            cfg.hosting_cli = h;
        }
        if let Some(d) = file.draft {
            cfg.draft = d;
        }
        if let Some(t) = non_empty(file.command_timeout) {
            cfg.command_timeout = Some(
                humantime::parse_duration(&t)
                    .with_context(|| format!("invalid command_timeout '{t}'"))?,
            );
        }
        cfg.diagnostics_file = file.diagnostics_file;
        Ok(cfg)
    }

    /// Apply GITSHIP_* overrides. `lookup` is injectable so tests do not touch the process env.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(r) = non_empty(lookup("GITSHIP_REMOTE")) {
            self.remote = r;
        }
        if let Some(b) = non_empty(lookup("GITSHIP_BASE_BRANCHES")) {
            let list = parse_list(&b);
            if !list.is_empty() {
                self.base_branches = list;
            }
        }
        if let Some(s) = non_empty(lookup("GITSHIP_MESSAGE_STYLE")) {
            self.message_style = MessageStyle::from_str(&s, true)
                .map_err(|e| anyhow::anyhow!("GITSHIP_MESSAGE_STYLE: {e}"))?;
        }
        if let Some(m) = non_empty(lookup("GITSHIP_PULL_MODE")) {
            self.pull_mode = PullMode::from_str(&m, true)
                .map_err(|e| anyhow::anyhow!("GITSHIP_PULL_MODE: {e}"))?;
        }
        if let Some(h) = non_empty(lookup("GITSHIP_HOSTING_CLI")) {
            self.hosting_cli = h;
        }
        if let Some(d) = non_empty(lookup("GITSHIP_DRAFT")) {
            if let Some(v) = parse_bool(&d) {
                self.draft = v;
            }
        }
        Ok(())
    }

    /// Diagnostics file to consult before committing.
    pub fn diagnostics_path(&self, repo: &Path) -> PathBuf {
        match &self.diagnostics_file {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => repo.join(p),
            None => repo.join(crate::diagnostics::DEFAULT_FILE_NAME),
        }
    }
}
