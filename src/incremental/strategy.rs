//! Strategy chooser (spec.md §4.4).

use super::ChangeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    #[default]
    Surgical,
    Incremental,
    FullReparse,
    ForceFull,
}

const SURGICAL_FILE_THRESHOLD: usize = 5;
const INCREMENTAL_RATIO_CEILING: f64 = 0.3;

/// `surgical` if few files changed and each has localized line ranges,
/// `incremental` if the changed-file ratio is below the ceiling,
/// `full_reparse` otherwise. Deletions and additions don't have line
/// ranges to localize, so they only ever qualify for `incremental` or
/// `full_reparse`. `total_tracked_files` is the project's current file
/// count, used for the changed-file ratio (spec.md §4.4).
pub fn choose(changes: &ChangeSet, total_tracked_files: usize) -> Strategy {
    if changes.is_empty() {
        return Strategy::Surgical;
    }

    let all_localized = changes.added.is_empty()
        && changes.deleted.is_empty()
        && changes
            .modified
            .iter()
            .all(|m| !m.changed_line_ranges.is_empty());

    if changes.modified.len() <= SURGICAL_FILE_THRESHOLD && all_localized {
        return Strategy::Surgical;
    }

    let ratio = changes.total_files() as f64 / total_tracked_files.max(1) as f64;
    if ratio < INCREMENTAL_RATIO_CEILING {
        Strategy::Incremental
    } else {
        Strategy::FullReparse
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incremental::ModifiedFile;
    use std::path::PathBuf;

    #[test]
    fn few_localized_changes_are_surgical() {
        let changes = ChangeSet {
            modified: vec![ModifiedFile {
                path: PathBuf::from("a.rs"),
                changed_line_ranges: vec![(10, 12)],
            }],
            ..Default::default()
        };
        assert_eq!(choose(&changes, 1000), Strategy::Surgical);
    }

    #[test]
    fn whole_file_change_falls_back_past_surgical() {
        let changes = ChangeSet {
            modified: vec![ModifiedFile {
                path: PathBuf::from("a.rs"),
                changed_line_ranges: vec![],
            }],
            ..Default::default()
        };
        assert_eq!(choose(&changes, 1000), Strategy::Incremental);
    }

    #[test]
    fn high_ratio_forces_full_reparse() {
        let changes = ChangeSet {
            modified: (0..50)
                .map(|i| ModifiedFile {
                    path: PathBuf::from(format!("f{i}.rs")),
                    changed_line_ranges: vec![],
                })
                .collect(),
            ..Default::default()
        };
        assert_eq!(choose(&changes, 100), Strategy::FullReparse);
    }
}
