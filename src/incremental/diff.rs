//! Change detection: git-diff mode and filesystem-event mode feed the same
//! unified `ChangeSet` (spec.md §4.4).

use crate::store::Store;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ModifiedFile {
    pub path: PathBuf,
    /// 1-indexed, inclusive line ranges touched by the change.
    pub changed_line_ranges: Vec<(u32, u32)>,
}

#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub added: Vec<PathBuf>,
    pub modified: Vec<ModifiedFile>,
    pub deleted: Vec<PathBuf>,
}

impl ChangeSet {
    pub fn total_files(&self) -> usize {
        self.added.len() + self.modified.len() + self.deleted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_files() == 0
    }
}

/// Abstraction over shelling out to `git`, so tests can fake history
/// without a real repository (mirrors `DiskProbe` in the limits module).
pub trait GitProbe {
    fn current_commit(&self, root: &Path) -> Option<String>;
    /// `(path, status)` pairs from `--name-status` against `from_commit`.
    fn name_status(&self, root: &Path, from_commit: &str) -> Vec<(PathBuf, GitStatus)>;
    /// Unified-diff-derived changed line ranges for one file, `from_commit`
    /// to the working tree.
    fn changed_ranges(&self, root: &Path, from_commit: &str, path: &Path) -> Vec<(u32, u32)>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitStatus {
    Added,
    Modified,
    Deleted,
}

pub struct RealGitProbe {
    pub timeout: Duration,
}

impl Default for RealGitProbe {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(10) }
    }
}

impl GitProbe for RealGitProbe {
    fn current_commit(&self, root: &Path) -> Option<String> {
        let output = Command::new("git").arg("rev-parse").arg("HEAD").current_dir(root).output().ok()?;
        if !output.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn name_status(&self, root: &Path, from_commit: &str) -> Vec<(PathBuf, GitStatus)> {
        let output = Command::new("git")
            .args(["diff", "--name-status", from_commit])
            .current_dir(root)
            .output();
        let Ok(output) = output else { return Vec::new() };
        if !output.status.success() {
            return Vec::new();
        }
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter_map(|line| {
                let mut parts = line.splitn(2, '\t');
                let code = parts.next()?;
                let path = parts.next()?;
                let status = match code.chars().next()? {
                    'A' => GitStatus::Added,
                    'D' => GitStatus::Deleted,
                    _ => GitStatus::Modified,
                };
                Some((PathBuf::from(path), status))
            })
            .collect()
    }

    fn changed_ranges(&self, root: &Path, from_commit: &str, path: &Path) -> Vec<(u32, u32)> {
        let output = Command::new("git")
            .args(["diff", "--unified=0", from_commit, "--", &path.to_string_lossy()])
            .current_dir(root)
            .output();
        let Ok(output) = output else { return Vec::new() };
        parse_hunk_ranges(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parses `@@ -a,b +c,d @@` hunk headers into `(start, end)` ranges over
/// the new-file line numbers.
fn parse_hunk_ranges(diff_text: &str) -> Vec<(u32, u32)> {
    diff_text
        .lines()
        .filter(|line| line.starts_with("@@"))
        .filter_map(|line| {
            let new_part = line.split("+").nth(1)?;
            let spec = new_part.split_whitespace().next()?;
            let mut pieces = spec.splitn(2, ',');
            let start: u32 = pieces.next()?.parse().ok()?;
            let count: u32 = pieces.next().and_then(|c| c.parse().ok()).unwrap_or(1);
            let end = if count == 0 { start } else { start + count - 1 };
            Some((start, end))
        })
        .collect()
}

/// Git mode: compares `metadata.git_commit` to the working tree.
pub fn detect_via_git(store: &Store, root: &Path, probe: &dyn GitProbe) -> Option<ChangeSet> {
    let stored_commit = store.get_metadata("git_commit").ok().flatten()?;
    let current = probe.current_commit(root)?;
    if stored_commit == current {
        return Some(ChangeSet::default());
    }

    let mut changes = ChangeSet::default();
    for (path, status) in probe.name_status(root, &stored_commit) {
        match status {
            GitStatus::Added => changes.added.push(root.join(&path)),
            GitStatus::Deleted => changes.deleted.push(root.join(&path)),
            GitStatus::Modified => {
                let ranges = probe.changed_ranges(root, &stored_commit, &path);
                changes.modified.push(ModifiedFile {
                    path: root.join(&path),
                    changed_line_ranges: ranges,
                });
            }
        }
    }
    Some(changes)
}

/// Filesystem mode: classifies a batch of paths C6 observed by existence
/// vs. the stored `files.last_modified`. A known file whose on-disk mtime
/// still matches the stored one is untouched, not modified — this is what
/// makes a rescan of an unchanged tree a no-op.
pub fn detect_via_filesystem(store: &Store, root: &Path, candidate_paths: &[PathBuf]) -> ChangeSet {
    let mut changes = ChangeSet::default();
    for path in candidate_paths {
        let relative = crate::types::repo_relative(root, path);
        let rel_str = relative.to_string_lossy().to_string();
        let stored_mtime = store.get_file_mtime(&rel_str).ok().flatten();

        if !path.exists() {
            if stored_mtime.is_some() {
                changes.deleted.push(path.clone());
            }
            continue;
        }

        let current_mtime = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs());

        match stored_mtime {
            None => changes.added.push(path.clone()),
            Some(stored) if current_mtime != Some(stored) => {
                changes.modified.push(ModifiedFile {
                    path: path.clone(),
                    // Filesystem mode has no line-range information, so the
                    // whole file is the changed range; the chooser treats
                    // this as ineligible for `surgical`.
                    changed_line_ranges: Vec::new(),
                });
            }
            Some(_) => {}
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unified_zero_hunk_header() {
        let diff = "@@ -10,0 +12,3 @@\nsome context\n@@ -20 +23 @@\n";
        let ranges = parse_hunk_ranges(diff);
        assert_eq!(ranges, vec![(12, 14), (23, 23)]);
    }
}
