//! Change classification: a pure mapping from a change set to a category tag.

use std::path::Path;

use serde::Serialize;

use crate::git::{ChangeKind, ChangeSet, FileChange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Feature,
    Fix,
    Docs,
    Test,
    Ci,
    Build,
    Refactor,
    Style,
    Chore,
    /// Changes that do not map cleanly onto one category.
    Mixed,
}

impl Category {
    pub fn branch_prefix(self) -> &'static str {
        match self {
            Category::Feature => "feature",
            Category::Fix => "fix",
            Category::Docs => "docs",
            Category::Test => "test",
            Category::Ci => "ci",
            Category::Build => "build",
            Category::Refactor => "refactor",
            Category::Style => "style",
            Category::Chore | Category::Mixed => "chore",
        }
    }

    /// Conventional-commit type; None when the change set is mixed.
    pub fn conventional_type(self) -> Option<&'static str> {
        match self {
            Category::Feature => Some("feat"),
            Category::Fix => Some("fix"),
            Category::Docs => Some("docs"),
            Category::Test => Some("test"),
            Category::Ci => Some("ci"),
            Category::Build => Some("build"),
            Category::Refactor => Some("refactor"),
            Category::Style => Some("style"),
            Category::Chore => Some("chore"),
            Category::Mixed => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Category::Feature => "Feature",
            Category::Fix => "Fix",
            Category::Docs => "Docs",
            Category::Test => "Tests",
            Category::Ci => "CI",
            Category::Build => "Build",
            Category::Refactor => "Refactor",
            Category::Style => "Style",
            Category::Chore => "Chore",
            Category::Mixed => "Changes",
        }
    }
}

const FIX_KEYWORDS: &[&str] = &["fix", "fixes", "bug", "bugfix", "hotfix", "patch", "issue"];

const DOC_EXTENSIONS: &[&str] = &["md", "markdown", "rst", "txt", "adoc"];

const BUILD_FILES: &[&str] = &[
    "cargo.toml",
    "cargo.lock",
    "package.json",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "makefile",
    "dockerfile",
    "build.rs",
    "pom.xml",
    "go.mod",
    "go.sum",
    "pyproject.toml",
    "poetry.lock",
    "uv.lock",
    "setup.py",
    "setup.cfg",
    "gemfile",
    "gemfile.lock",
    "cmakelists.txt",
];

const STYLE_FILES: &[&str] = &[
    ".editorconfig",
    "rustfmt.toml",
    ".rustfmt.toml",
    ".clang-format",
];

const STYLE_PREFIXES: &[&str] = &[".prettierrc", ".eslintrc", ".stylelintrc"];

const CI_FILES: &[&str] = &[
    ".gitlab-ci.yml",
    "jenkinsfile",
    "azure-pipelines.yml",
    ".travis.yml",
];

struct PathInfo {
    lower: String,
    name: String,
    stem: String,
    ext: String,
    dirs: Vec<String>,
}

impl PathInfo {
    fn new(path: &str) -> Self {
        let lower = path.replace('\\', "/").to_ascii_lowercase();
        let p = Path::new(&lower);
        let name = p
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = p
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = p
            .extension()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut dirs: Vec<String> = lower.split('/').map(str::to_string).collect();
        dirs.pop();
        Self {
            lower,
            name,
            stem,
            ext,
            dirs,
        }
    }

    fn in_dir(&self, names: &[&str]) -> bool {
        self.dirs.iter().any(|d| names.contains(&d.as_str()))
    }

    fn is_build(&self) -> bool {
        BUILD_FILES.contains(&self.name.as_str())
            || self.ext == "gradle"
            || (self.name.starts_with("requirements") && self.ext == "txt")
    }

    fn is_doc(&self) -> bool {
        if self.is_build() {
            return false;
        }
        DOC_EXTENSIONS.contains(&self.ext.as_str())
            || self.in_dir(&["docs", "doc"])
            || self.name.starts_with("license")
            || self.name.starts_with("changelog")
    }

    fn is_test(&self) -> bool {
        self.in_dir(&["tests", "test", "__tests__", "spec"])
            || self.stem.ends_with("_test")
            || self.stem.ends_with("_spec")
            || self.name.contains(".test.")
            || self.name.contains(".spec.")
            || (self.name.starts_with("test_") && self.ext == "py")
    }

    fn is_ci(&self) -> bool {
        self.lower.starts_with(".github/workflows/")
            || self.lower.starts_with(".circleci/")
            || CI_FILES.contains(&self.name.as_str())
    }

    fn is_style(&self) -> bool {
        STYLE_FILES.contains(&self.name.as_str())
            || STYLE_PREFIXES.iter().any(|p| self.name.starts_with(p))
    }

    fn is_source(&self) -> bool {
        !(self.is_doc() || self.is_test() || self.is_ci() || self.is_build() || self.is_style())
    }

    fn has_fix_keyword(&self) -> bool {
        self.lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|tok| FIX_KEYWORDS.contains(&tok))
    }
}

fn all(files: &[FileChange], pred: impl Fn(&PathInfo) -> bool) -> bool {
    files.iter().all(|f| pred(&PathInfo::new(&f.path)))
}

/// Infer the category of a change set. Rules are checked in order; the first match wins.
pub fn classify(changes: &ChangeSet) -> Category {
    let files = &changes.files;
    if files.is_empty() {
        return Category::Chore;
    }
    if all(files, PathInfo::is_doc) {
        return Category::Docs;
    }
    if all(files, PathInfo::is_test) {
        return Category::Test;
    }
    if all(files, PathInfo::is_ci) {
        return Category::Ci;
    }
    if all(files, PathInfo::is_build) {
        return Category::Build;
    }
    if all(files, PathInfo::is_style) {
        return Category::Style;
    }
    if files.iter().any(|f| PathInfo::new(&f.path).has_fix_keyword()) {
        return Category::Fix;
    }
    if files
        .iter()
        .any(|f| f.kind.is_new() && PathInfo::new(&f.path).is_source())
    {
        return Category::Feature;
    }
    if files
        .iter()
        .all(|f| matches!(f.kind, ChangeKind::Renamed | ChangeKind::Deleted))
    {
        return Category::Refactor;
    }
    if files
        .iter()
        .all(|f| matches!(f.kind, ChangeKind::Modified | ChangeKind::TypeChanged))
    {
        return Category::Fix;
    }
    Category::Mixed
}
