//! C2 — directory walking and per-file parse dispatch.
//!
//! Produces the lazy, finite, stably-ordered sequence of per-file records
//! spec.md §4.2 requires: depth-first, sorted entries, so incremental diffs
//! are deterministic across runs. Parsing happens in parallel across a
//! rayon pool; results are collected then sorted, since tree-sitter parsers
//! are not `Sync` and each worker owns its own.

use crate::config::{IndexingConfig, LimitsConfig};
use crate::model::{File, FileRecord};
use crate::parsing::parser_for;
use crate::types::repo_relative;
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// A file that the scanner visited and what happened to it.
pub enum ScanOutcome {
    Parsed(FileRecord),
    /// Skipped because it exceeded `max_file_bytes`.
    TooLarge { path: PathBuf, size: u64 },
    /// Skipped because no parser claims its extension.
    Unsupported { path: PathBuf },
    /// tree-sitter could not parse it at all; the scan continues.
    ParseFailed { path: PathBuf, reason: String },
}

/// Walks `root`, honoring repo ignore files and `indexing.ignore_patterns`,
/// and returns paths in stable (sorted) order.
pub fn discover_files(root: &Path, indexing: &IndexingConfig) -> Vec<PathBuf> {
    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .follow_links(false)
        .require_git(false);

    let mut overrides = ignore::overrides::OverrideBuilder::new(root);
    for pattern in &indexing.ignore_patterns {
        if let Err(e) = overrides.add(&format!("!{pattern}")) {
            tracing::warn!("invalid ignore pattern '{pattern}': {e}");
        }
    }
    if let Ok(overrides) = overrides.build() {
        builder.overrides(overrides);
    }

    let extensions: std::collections::HashSet<_> = indexing.extensions.iter().map(String::as_str).collect();

    let mut paths: Vec<PathBuf> = builder
        .build()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .filter_map(|entry| {
            let path = entry.path();
            let ext = path.extension()?.to_str()?;
            if extensions.contains(ext) {
                Some(path.to_path_buf())
            } else {
                None
            }
        })
        .collect();
    paths.sort();
    paths
}

/// Scans every discovered file under `root`, in parallel, and returns
/// outcomes in the same stable order `discover_files` produced.
pub fn scan(root: &Path, indexing: &IndexingConfig, limits: &LimitsConfig) -> Vec<ScanOutcome> {
    let paths = discover_files(root, indexing);
    paths
        .par_iter()
        .map(|path| scan_one(root, path, limits))
        .collect()
}

/// Re-scans a single file outside a full `scan()` pass — used after a
/// mutation writes a file and C5 needs to refresh just that entry.
pub fn rescan_file(root: &Path, path: &Path, limits: &LimitsConfig) -> ScanOutcome {
    scan_one(root, path, limits)
}

fn scan_one(root: &Path, path: &Path, limits: &LimitsConfig) -> ScanOutcome {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) => {
            return ScanOutcome::ParseFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        }
    };
    let size = metadata.len();
    if size > limits.max_file_bytes {
        return ScanOutcome::TooLarge {
            path: path.to_path_buf(),
            size,
        };
    }

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_string();
    let Some(mut parser) = parser_for(&extension) else {
        return ScanOutcome::Unsupported { path: path.to_path_buf() };
    };

    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            return ScanOutcome::ParseFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        }
    };

    let relative = repo_relative(root, path);
    let mut record = parser.parse_file(&relative, &source);

    if record.symbols.len() > limits.max_symbols_per_file {
        tracing::warn!(
            "{}: {} symbols exceeds per-file cap {}, truncating",
            relative.display(),
            record.symbols.len(),
            limits.max_symbols_per_file
        );
        record.symbols.truncate(limits.max_symbols_per_file);
    }

    let last_modified = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0);

    record.file = Some(File {
        path: relative,
        size,
        last_modified,
        extension,
        content_hash: Some(content_hash(&source)),
    });

    ScanOutcome::Parsed(record)
}

fn content_hash(source: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexingConfig;

    #[test]
    fn discovers_only_configured_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.rs"), "fn a() {}").unwrap();
        std::fs::write(dir.path().join("b.py"), "def b(): pass").unwrap();
        std::fs::write(dir.path().join("c.md"), "# notes").unwrap();

        let files = discover_files(dir.path(), &IndexingConfig::default());
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn oversized_file_is_skipped_not_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.rs");
        std::fs::write(&path, "fn big() {}").unwrap();

        let mut limits = LimitsConfig::default();
        limits.max_file_bytes = 1;
        let outcome = scan_one(dir.path(), &path, &limits);
        assert!(matches!(outcome, ScanOutcome::TooLarge { .. }));
    }
}
