//! C9 — AST-surgical edit/delete, transaction ledger, reverse-patch undo
//! stack (spec.md §4.8).

mod risk;
mod validate;

pub use risk::{assess_risk, RiskLevel};
pub use validate::validate_syntax;

use crate::config::LimitsConfig;
use crate::model::{ReversePatch, Transaction};
use crate::scanner::{self, ScanOutcome};
use crate::store::Store;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MutationError {
    #[error("symbol '{name}' not found")]
    SymbolNotFound { name: String },

    #[error("symbol '{name}' is ambiguous: {count} matches")]
    AmbiguousSymbol { name: String, count: usize },

    #[error("syntax invalid after edit: {reason}")]
    SyntaxInvalid { reason: String },

    #[error("refused: {reason} (pass force to override)")]
    RiskRefused { reason: String },

    #[error("external verification command exited with status {status}")]
    VerifyFailed { status: i32 },

    #[error("transaction {id} not found")]
    TransactionNotFound { id: i64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("graph query failed during risk assessment: {0}")]
    Graph(String),
}

pub type MutationResult<T> = Result<T, MutationError>;

/// Per-file, per-operation progress, per spec.md §4.8's state machine.
/// Every state but `Committed` has a rollback path back to whatever state
/// preceded it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Pending,
    Validated,
    Written,
    Committed,
}

#[derive(Debug, Clone)]
pub struct EditOptions {
    pub parent_class: Option<String>,
    pub force: bool,
    pub symbol_guard: bool,
    pub keep_decorators: bool,
}

impl Default for EditOptions {
    fn default() -> Self {
        Self {
            parent_class: None,
            force: false,
            symbol_guard: true,
            keep_decorators: true,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Operation {
    Edit { file_path: PathBuf, symbol_name: String, new_code: String, options: EditOptions },
    Delete { file_path: PathBuf, symbol_name: String, options: EditOptions },
}

#[derive(Debug, Clone)]
pub struct OperationOutcome {
    pub state: OperationState,
    pub transaction_id: i64,
}

/// Replaces `symbol_name`'s exact line span in `file_path` with `new_code`,
/// validates the result, writes atomically, records a reverse-patch
/// transaction, and reindexes just that file.
pub fn edit(
    store: &Store,
    root: &Path,
    limits: &LimitsConfig,
    file_path: &Path,
    symbol_name: &str,
    new_code: &str,
    options: &EditOptions,
) -> MutationResult<OperationOutcome> {
    apply(store, root, limits, file_path, symbol_name, Some(new_code), options, "edit")
}

/// Same flow as `edit`, collapsing the symbol's span instead of replacing
/// it with new text. `keep_decorators` preserves leading attribute/
/// decorator lines immediately above the span.
pub fn delete(
    store: &Store,
    root: &Path,
    limits: &LimitsConfig,
    file_path: &Path,
    symbol_name: &str,
    options: &EditOptions,
) -> MutationResult<OperationOutcome> {
    apply(store, root, limits, file_path, symbol_name, None, options, "delete")
}

fn apply(
    store: &Store,
    root: &Path,
    limits: &LimitsConfig,
    file_path: &Path,
    symbol_name: &str,
    new_code: Option<&str>,
    options: &EditOptions,
    op_label: &str,
) -> MutationResult<OperationOutcome> {
    let relative = file_path.to_path_buf();
    let matches = store.query_symbols(&crate::store::SymbolFilter {
        file_path: Some(relative.to_string_lossy().to_string()),
        name: Some(symbol_name.to_string()),
        parent_class: options.parent_class.clone(),
        ..Default::default()
    })?;

    let target = match matches.as_slice() {
        [] => return Err(MutationError::SymbolNotFound { name: symbol_name.to_string() }),
        [one] => one.clone(),
        many => {
            return Err(MutationError::AmbiguousSymbol {
                name: symbol_name.to_string(),
                count: many.len(),
            })
        }
    };

    let absolute = root.join(&relative);
    let original = std::fs::read_to_string(&absolute)?;

    if options.symbol_guard && !options.force {
        let risk = risk::assess_risk(store, symbol_name).map_err(|e| MutationError::Graph(e.to_string()))?;
        if risk == RiskLevel::High {
            return Err(MutationError::RiskRefused {
                reason: format!("'{symbol_name}' has many callers / central in the call graph"),
            });
        }
    }

    let replacement_start = if options.keep_decorators {
        target.start_line
    } else {
        decorator_adjusted_start(&original, target.start_line)
    };

    let rewritten = replace_span(&original, replacement_start, target.end_line, new_code);

    validate::validate_syntax(&relative, &rewritten).map_err(|reason| MutationError::SyntaxInvalid { reason })?;

    write_atomic(&absolute, &rewritten)?;

    let patches_json = serde_json::to_string(&[ReversePatch {
        file_path: relative.clone(),
        original_content: Some(original),
    }])?;
    let timestamp = crate::utils::get_utc_timestamp();
    let transaction_id = store.record_transaction(op_label, &[relative.clone()], &patches_json, timestamp)?;

    if let ScanOutcome::Parsed(record) = scanner::rescan_file(root, &absolute, limits) {
        store.replace_file_record(&record)?;
    } else {
        store.delete_file(&relative.to_string_lossy())?;
    }

    Ok(OperationOutcome {
        state: OperationState::Committed,
        transaction_id,
    })
}

/// Runs a sequence of edit/delete ops as one unit: either every op
/// succeeds, or every reverse-patch recorded so far is replayed in
/// reverse order and the whole batch is rolled back. An optional external
/// verify command (its exit status) gates the final commit.
pub fn batch(
    store: &Store,
    root: &Path,
    limits: &LimitsConfig,
    ops: &[Operation],
    verify_command: Option<&str>,
) -> MutationResult<Vec<OperationOutcome>> {
    let mut completed = Vec::new();

    let result = (|| -> MutationResult<Vec<OperationOutcome>> {
        let mut outcomes = Vec::with_capacity(ops.len());
        for op in ops {
            let outcome = match op {
                Operation::Edit { file_path, symbol_name, new_code, options } => {
                    edit(store, root, limits, file_path, symbol_name, new_code, options)?
                }
                Operation::Delete { file_path, symbol_name, options } => {
                    delete(store, root, limits, file_path, symbol_name, options)?
                }
            };
            completed.push(outcome.transaction_id);
            outcomes.push(outcome);
        }

        if let Some(command) = verify_command {
            let status = run_verify_command(command)?;
            if status != 0 {
                return Err(MutationError::VerifyFailed { status });
            }
        }

        Ok(outcomes)
    })();

    match result {
        Ok(outcomes) => Ok(outcomes),
        Err(e) => {
            for transaction_id in completed.into_iter().rev() {
                let _ = undo(store, root, limits, transaction_id);
            }
            Err(e)
        }
    }
}

/// Reverts every file touched by `transaction_id` to its pre-operation
/// bytes. Idempotent: undoing an already-undone transaction is a no-op
/// once the file content already matches.
pub fn undo(store: &Store, root: &Path, limits: &LimitsConfig, transaction_id: i64) -> MutationResult<()> {
    let Some((_op, _files_json, patches_json, _ts)) = store.get_transaction(transaction_id)? else {
        return Err(MutationError::TransactionNotFound { id: transaction_id });
    };
    let patches: Vec<ReversePatch> = serde_json::from_str(&patches_json)?;

    for patch in patches {
        let absolute = root.join(&patch.file_path);
        match &patch.original_content {
            Some(original) => write_atomic(&absolute, original)?,
            None => {
                let _ = std::fs::remove_file(&absolute);
            }
        }
        match scanner::rescan_file(root, &absolute, limits) {
            ScanOutcome::Parsed(record) => {
                store.replace_file_record(&record)?;
            }
            _ => {
                store.delete_file(&patch.file_path.to_string_lossy())?;
            }
        }
    }

    Ok(())
}

fn run_verify_command(command: &str) -> MutationResult<i32> {
    let status = std::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .status()?;
    Ok(status.code().unwrap_or(-1))
}

fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let tmp_path = path.with_extension(format!(
        "{}.tmp-{}",
        path.extension().and_then(|e| e.to_str()).unwrap_or(""),
        std::process::id()
    ));
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)
}

/// Replaces the inclusive `[start_line, end_line]` 1-indexed span with
/// `new_code` (or nothing, for delete), preserving everything outside it.
fn replace_span(source: &str, start_line: u32, end_line: u32, new_code: Option<&str>) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let mut out = Vec::with_capacity(lines.len());

    for (i, line) in lines.iter().enumerate() {
        let line_no = i as u32 + 1;
        if line_no < start_line || line_no > end_line {
            out.push(line.to_string());
        } else if line_no == start_line {
            if let Some(code) = new_code {
                out.push(code.to_string());
            }
        }
    }

    let mut result = out.join("\n");
    if source.ends_with('\n') {
        result.push('\n');
    }
    result
}

/// Walks upward from `start_line` over `#[...]`/`@...` decorator lines so
/// a delete can optionally keep them.
fn decorator_adjusted_start(source: &str, start_line: u32) -> u32 {
    let lines: Vec<&str> = source.lines().collect();
    let mut line = start_line;
    while line > 1 {
        let Some(prev) = lines.get((line - 2) as usize) else { break };
        let trimmed = prev.trim_start();
        if trimmed.starts_with("#[") || trimmed.starts_with('@') {
            line -= 1;
        } else {
            break;
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_span_swaps_the_target_lines() {
        let source = "fn a() {}\nfn b() {\n    1\n}\nfn c() {}\n";
        let out = replace_span(source, 2, 4, Some("fn b() {\n    2\n}"));
        assert_eq!(out, "fn a() {}\nfn b() {\n    2\n}\nfn c() {}\n");
    }

    #[test]
    fn replace_span_with_none_deletes_the_range() {
        let source = "fn a() {}\nfn b() {}\nfn c() {}\n";
        let out = replace_span(source, 2, 2, None);
        assert_eq!(out, "fn a() {}\nfn c() {}\n");
    }
}
