//! FTS/metadata consistency check (spec.md §4.3 invariant: every `symbols`
//! row has a mirrored `symbols_fts` row, and vice versa).

use super::{Store, StoreResult};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrphanKind {
    /// A `symbols` row with no matching `symbols_fts` row.
    MissingFtsRow,
    /// A `symbols_fts` row with no matching `symbols` row.
    DanglingFtsRow,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntegrityReport {
    pub symbol_count: usize,
    pub fts_row_count: usize,
    pub orphans: Vec<(i64, OrphanKind)>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.orphans.is_empty()
    }
}

impl Store {
    pub fn check_integrity(&self) -> StoreResult<IntegrityReport> {
        let conn = self.conn.lock();

        let symbol_count: usize = conn.query_row("SELECT COUNT(*) FROM symbols", [], |r| r.get(0))?;
        let fts_row_count: usize = conn.query_row("SELECT COUNT(*) FROM symbols_fts", [], |r| r.get(0))?;

        let mut orphans = Vec::new();

        let mut stmt = conn.prepare(
            "SELECT s.id FROM symbols s LEFT JOIN symbols_fts f ON s.id = f.rowid WHERE f.rowid IS NULL",
        )?;
        let missing: Vec<i64> = stmt.query_map([], |r| r.get(0))?.collect::<Result<_, _>>()?;
        orphans.extend(missing.into_iter().map(|id| (id, OrphanKind::MissingFtsRow)));

        let mut stmt = conn.prepare(
            "SELECT f.rowid FROM symbols_fts f LEFT JOIN symbols s ON f.rowid = s.id WHERE s.id IS NULL",
        )?;
        let dangling: Vec<i64> = stmt.query_map([], |r| r.get(0))?.collect::<Result<_, _>>()?;
        orphans.extend(dangling.into_iter().map(|id| (id, OrphanKind::DanglingFtsRow)));

        Ok(IntegrityReport {
            symbol_count,
            fts_row_count,
            orphans,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{File, FileRecord, Symbol};
    use crate::types::SymbolKind;
    use std::path::PathBuf;

    #[test]
    fn clean_store_has_no_orphans() {
        let store = Store::open_in_memory().unwrap();
        let record = FileRecord {
            file: Some(File {
                path: PathBuf::from("a.rs"),
                size: 10,
                last_modified: 0,
                extension: "rs".into(),
                content_hash: None,
            }),
            symbols: vec![Symbol {
                id: None,
                name: "f".into(),
                kind: SymbolKind::Function,
                file_path: PathBuf::from("a.rs"),
                start_line: 1,
                end_line: 2,
                signature: "fn f()".into(),
                parent_class: None,
                docstring: None,
            }],
            ..Default::default()
        };
        store.replace_file_record(&record).unwrap();
        let report = store.check_integrity().unwrap();
        assert!(report.is_clean());
        assert_eq!(report.symbol_count, 1);
    }

    #[test]
    fn detects_dangling_fts_row() {
        let store = Store::open_in_memory().unwrap();
        {
            let conn = store.conn.lock();
            conn.execute("INSERT INTO symbols_fts (rowid, content) VALUES (99, 'ghost')", [])
                .unwrap();
        }
        let report = store.check_integrity().unwrap();
        assert!(!report.is_clean());
        assert!(report.orphans.iter().any(|(id, kind)| *id == 99 && *kind == OrphanKind::DanglingFtsRow));
    }
}
