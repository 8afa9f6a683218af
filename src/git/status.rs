/*!
Working-tree inspection results.

- RepositoryStatus: parsed `git status --porcelain=v1 -z -uall`.
- ChangeSet: the structured change summary fed to classification and message generation.
- parse_name_status_z: parse `git diff --cached --name-status -z -M` (staged change set).
*/

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
    TypeChanged,
    Untracked,
    Conflicted,
}

impl ChangeKind {
    /// True for changes that introduce a path which did not exist before.
    pub fn is_new(self) -> bool {
        matches!(
            self,
            ChangeKind::Added | ChangeKind::Untracked | ChangeKind::Copied
        )
    }

    /// Single-letter code shown in summaries.
    pub fn code(self) -> char {
        match self {
            ChangeKind::Added => 'A',
            ChangeKind::Modified => 'M',
            ChangeKind::Deleted => 'D',
            ChangeKind::Renamed => 'R',
            ChangeKind::Copied => 'C',
            ChangeKind::TypeChanged => 'T',
            ChangeKind::Untracked => '?',
            ChangeKind::Conflicted => 'U',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    pub kind: ChangeKind,
    pub path: String,
    /// Set for renames and copies.
    pub old_path: Option<String>,
    pub staged: bool,
    pub unstaged: bool,
}

impl FileChange {
    pub fn new(kind: ChangeKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            old_path: None,
            staged: false,
            unstaged: true,
        }
    }
}

/// Result of inspecting working-tree state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepositoryStatus {
    pub files: Vec<FileChange>,
}

impl RepositoryStatus {
    pub fn is_clean(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> Vec<String> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    pub fn has_conflicts(&self) -> bool {
        self.files.iter().any(|f| f.kind == ChangeKind::Conflicted)
    }

    pub fn conflicted_paths(&self) -> Vec<String> {
        self.files
            .iter()
            .filter(|f| f.kind == ChangeKind::Conflicted)
            .map(|f| f.path.clone())
            .collect()
    }

    pub fn change_set(&self) -> ChangeSet {
        ChangeSet {
            files: self.files.clone(),
            is_staged: false,
        }
    }
}

/// A set of file changes, either pending in the working tree or staged in the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    pub files: Vec<FileChange>,
    pub is_staged: bool,
}

impl ChangeSet {
    pub fn new(files: Vec<FileChange>) -> Self {
        Self {
            files,
            is_staged: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }
}

fn kind_from_code(c: char) -> ChangeKind {
    match c {
        'A' => ChangeKind::Added,
        'D' => ChangeKind::Deleted,
        'R' => ChangeKind::Renamed,
        'C' => ChangeKind::Copied,
        'T' => ChangeKind::TypeChanged,
        'U' => ChangeKind::Conflicted,
        _ => ChangeKind::Modified,
    }
}

fn is_conflict(x: char, y: char) -> bool {
    matches!(
        (x, y),
        ('D', 'D') | ('A', 'U') | ('U', 'D') | ('U', 'A') | ('D', 'U') | ('A', 'A') | ('U', 'U')
    )
}

/// Parse NUL-separated porcelain v1 output. Renames and copies carry the original path
/// in the following NUL field.
pub fn parse_porcelain_z(raw: &str) -> RepositoryStatus {
    let mut files = Vec::new();
    let mut fields = raw.split('\0').filter(|f| !f.is_empty());
    while let Some(entry) = fields.next() {
        let mut chars = entry.chars();
        let (x, y) = match (chars.next(), chars.next()) {
            (Some(x), Some(y)) => (x, y),
            _ => continue,
        };
        let path = entry.get(3..).unwrap_or("").to_string();
        if path.is_empty() {
            continue;
        }
        if x == '!' {
            continue;
        }
        let kind = if x == '?' {
            ChangeKind::Untracked
        } else if is_conflict(x, y) {
            ChangeKind::Conflicted
        } else if x != ' ' {
            kind_from_code(x)
        } else {
            kind_from_code(y)
        };
        let old_path = if matches!(x, 'R' | 'C') || matches!(y, 'R' | 'C') {
            fields.next().map(str::to_string)
        } else {
            None
        };
        files.push(FileChange {
            kind,
            path,
            old_path,
            staged: x != ' ' && x != '?',
            unstaged: y != ' ',
        });
    }
    RepositoryStatus { files }
}

/// Parse `git diff --name-status -z` output into a staged change set.
pub fn parse_name_status_z(raw: &str) -> ChangeSet {
    let mut files = Vec::new();
    let mut fields = raw.split('\0').filter(|f| !f.is_empty());
    while let Some(status) = fields.next() {
        let code = match status.chars().next() {
            Some(c) => c,
            None => continue,
        };
        let kind = kind_from_code(code);
        let (path, old_path) = if matches!(code, 'R' | 'C') {
            let old = fields.next().map(str::to_string);
            match fields.next() {
                Some(new) => (new.to_string(), old),
                None => continue,
            }
        } else {
            match fields.next() {
                Some(p) => (p.to_string(), None),
                None => continue,
            }
        };
        files.push(FileChange {
            kind,
            path,
            old_path,
            staged: true,
            unstaged: false,
        });
    }
    ChangeSet {
        files,
        is_staged: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_porcelain_kinds_and_flags() {
        let raw = " M src/auth.ts\0A  src/login.ts\0?? notes.md\0MM lib.rs\0";
        let st = parse_porcelain_z(raw);
        assert_eq!(st.files.len(), 4);
        assert_eq!(st.files[0].kind, ChangeKind::Modified);
        assert!(!st.files[0].staged && st.files[0].unstaged);
        assert_eq!(st.files[1].kind, ChangeKind::Added);
        assert!(st.files[1].staged && !st.files[1].unstaged);
        assert_eq!(st.files[2].kind, ChangeKind::Untracked);
        assert!(!st.files[2].staged);
        assert!(st.files[3].staged && st.files[3].unstaged);
        assert!(!st.has_conflicts());
    }

    #[test]
    fn test_parse_porcelain_rename_consumes_original_path() {
        let raw = "R  new/name.rs\0old/name.rs\0 D gone.txt\0";
        let st = parse_porcelain_z(raw);
        assert_eq!(st.files.len(), 2);
        assert_eq!(st.files[0].kind, ChangeKind::Renamed);
        assert_eq!(st.files[0].path, "new/name.rs");
        assert_eq!(st.files[0].old_path.as_deref(), Some("old/name.rs"));
        assert_eq!(st.files[1].kind, ChangeKind::Deleted);
        assert_eq!(st.files[1].path, "gone.txt");
    }

    #[test]
    fn test_parse_porcelain_conflicts_and_spaces() {
        let raw = "UU merge me.txt\0";
        let st = parse_porcelain_z(raw);
        assert_eq!(st.files[0].kind, ChangeKind::Conflicted);
        assert_eq!(st.files[0].path, "merge me.txt");
        assert!(st.has_conflicts());
        assert_eq!(st.conflicted_paths(), vec!["merge me.txt".to_string()]);
    }

    #[test]
    fn test_parse_porcelain_empty_is_clean() {
        assert!(parse_porcelain_z("").is_clean());
        assert!(parse_porcelain_z("\n").is_clean());
    }

    #[test]
    fn test_parse_name_status_with_rename_score() {
        let raw = "M\0src/auth.ts\0R087\0a.rs\0b.rs\0A\0docs/new.md\0";
        let cs = parse_name_status_z(raw);
        assert!(cs.is_staged);
        assert_eq!(cs.len(), 3);
        assert_eq!(cs.files[0].kind, ChangeKind::Modified);
        assert_eq!(cs.files[1].kind, ChangeKind::Renamed);
        assert_eq!(cs.files[1].path, "b.rs");
        assert_eq!(cs.files[1].old_path.as_deref(), Some("a.rs"));
        assert_eq!(cs.files[2].kind, ChangeKind::Added);
    }
}
