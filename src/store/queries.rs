//! Read-side queries C4 must serve (spec.md §4.3).

use super::{Store, StoreResult};
use crate::model::{Call, ImportLink, MethodCall, Symbol, SymbolReference};
use crate::types::{ReferenceKind, SymbolKind};
use rusqlite::params;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct SymbolFilter {
    pub file_path: Option<String>,
    pub name: Option<String>,
    pub kind: Option<SymbolKind>,
    pub parent_class: Option<String>,
}

impl Store {
    pub fn query_symbols(&self, filter: &SymbolFilter) -> StoreResult<Vec<Symbol>> {
        let conn = self.conn.lock();
        let mut sql = String::from(
            "SELECT id, name, type, file_path, start_line, end_line, signature, parent_class, docstring FROM symbols WHERE 1=1",
        );
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(v) = &filter.file_path {
            sql.push_str(" AND file_path = ?");
            args.push(Box::new(v.clone()));
        }
        if let Some(v) = &filter.name {
            sql.push_str(" AND name = ?");
            args.push(Box::new(v.clone()));
        }
        if let Some(v) = &filter.kind {
            sql.push_str(" AND type = ?");
            args.push(Box::new(v.as_str().to_string()));
        }
        if let Some(v) = &filter.parent_class {
            sql.push_str(" AND parent_class = ?");
            args.push(Box::new(v.clone()));
        }
        sql.push_str(" ORDER BY start_line, name");

        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = args.iter().map(|b| b.as_ref()).collect();
        let rows = stmt.query_map(param_refs.as_slice(), row_to_symbol)?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    pub fn query_calls(&self, caller_file: Option<&str>) -> StoreResult<Vec<Call>> {
        let conn = self.conn.lock();
        let (sql, has_filter) = match caller_file {
            Some(_) => ("SELECT caller_file, callee, line FROM calls WHERE caller_file = ?1", true),
            None => ("SELECT caller_file, callee, line FROM calls", false),
        };
        let mut stmt = conn.prepare(sql)?;
        let mapper = |row: &rusqlite::Row| -> rusqlite::Result<Call> {
            Ok(Call {
                caller_file: PathBuf::from(row.get::<_, String>(0)?),
                callee: row.get(1)?,
                line: row.get(2)?,
            })
        };
        let rows = if has_filter {
            stmt.query_map(params![caller_file.unwrap()], mapper)?
                .collect::<Result<Vec<_>, _>>()?
        } else {
            stmt.query_map([], mapper)?.collect::<Result<Vec<_>, _>>()?
        };
        Ok(rows)
    }

    pub fn query_method_calls_filtered(
        &self,
        method: Option<&str>,
        receiver: Option<&str>,
        receiver_type: Option<&str>,
        file: Option<&str>,
    ) -> StoreResult<Vec<MethodCall>> {
        let conn = self.conn.lock();
        let mut sql = String::from(
            "SELECT caller_file, line, receiver, method, receiver_type FROM method_calls WHERE 1=1",
        );
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(v) = method {
            sql.push_str(" AND method = ?");
            args.push(Box::new(v.to_string()));
        }
        if let Some(v) = receiver {
            sql.push_str(" AND receiver = ?");
            args.push(Box::new(v.to_string()));
        }
        if let Some(v) = receiver_type {
            sql.push_str(" AND receiver_type = ?");
            args.push(Box::new(v.to_string()));
        }
        if let Some(v) = file {
            sql.push_str(" AND caller_file = ?");
            args.push(Box::new(v.to_string()));
        }
        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = args.iter().map(|b| b.as_ref()).collect();
        let rows = stmt.query_map(param_refs.as_slice(), |row| {
            Ok(MethodCall {
                caller_file: PathBuf::from(row.get::<_, String>(0)?),
                line: row.get(1)?,
                receiver: row.get(2)?,
                method: row.get(3)?,
                receiver_type: row.get(4)?,
            })
        })?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    pub fn query_symbol_references_filtered(
        &self,
        source_symbol: Option<&str>,
        target_symbol: Option<&str>,
        reference_type: Option<ReferenceKind>,
    ) -> StoreResult<Vec<SymbolReference>> {
        let conn = self.conn.lock();
        let mut sql = String::from(
            "SELECT source_file, source_line, source_symbol, reference_type, target_file, target_symbol, target_type, confidence, resolution_method
             FROM symbol_references WHERE 1=1",
        );
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(v) = source_symbol {
            sql.push_str(" AND source_symbol = ?");
            args.push(Box::new(v.to_string()));
        }
        if let Some(v) = target_symbol {
            sql.push_str(" AND target_symbol = ?");
            args.push(Box::new(v.to_string()));
        }
        if let Some(v) = reference_type {
            sql.push_str(" AND reference_type = ?");
            args.push(Box::new(v.as_str().to_string()));
        }
        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = args.iter().map(|b| b.as_ref()).collect();
        let rows = stmt.query_map(param_refs.as_slice(), |row| {
            let ref_type: String = row.get(3)?;
            Ok(SymbolReference {
                source_file: PathBuf::from(row.get::<_, String>(0)?),
                source_line: row.get(1)?,
                source_symbol: row.get(2)?,
                reference_type: ReferenceKind::parse(&ref_type).unwrap_or(ReferenceKind::MethodCall),
                target_file: row.get::<_, Option<String>>(4)?.map(PathBuf::from),
                target_symbol: row.get(5)?,
                target_type: row.get(6)?,
                confidence: row.get(7)?,
                resolution_method: row.get(8)?,
            })
        })?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    pub fn query_import_links(&self, importer_file: Option<&str>) -> StoreResult<Vec<ImportLink>> {
        let conn = self.conn.lock();
        let sql = "SELECT importer_file, imported_module, import_line, imported_symbols, definition_file, definition_symbol
                   FROM import_links WHERE (?1 IS NULL OR importer_file = ?1)";
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params![importer_file], |row| {
            let symbols_json: String = row.get(3)?;
            let imported_symbols: Vec<String> = serde_json::from_str(&symbols_json).unwrap_or_default();
            Ok(ImportLink {
                importer_file: PathBuf::from(row.get::<_, String>(0)?),
                imported_module: row.get(1)?,
                import_line: row.get(2)?,
                imported_symbols,
                definition_file: row.get::<_, Option<String>>(4)?.map(PathBuf::from),
                definition_symbol: row.get(5)?,
            })
        })?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    /// Stored `files.last_modified` for `file_path`, or `None` if the file
    /// isn't tracked yet.
    pub fn get_file_mtime(&self, file_path: &str) -> StoreResult<Option<u64>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT last_modified FROM files WHERE path = ?1",
            params![file_path],
            |row| row.get::<_, i64>(0),
        )
        .map(|v| Some(v as u64))
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other.into()),
        })
    }

    /// FTS5 `MATCH` over the symbol mirror, ordered by BM25 (most relevant
    /// first — `bm25()` is negative-is-better in SQLite, so results are
    /// sorted ascending and the raw score is negated for callers).
    pub fn fts_match(&self, query: &str, limit: usize) -> StoreResult<Vec<(i64, f64)>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT rowid, bm25(symbols_fts) FROM symbols_fts WHERE symbols_fts MATCH ?1 ORDER BY bm25(symbols_fts) LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![query, limit as i64], |row| {
            let score: f64 = row.get(1)?;
            Ok((row.get::<_, i64>(0)?, -score))
        })?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    pub fn get_embedding(&self, symbol_id: i64) -> StoreResult<Option<(Vec<f32>, String)>> {
        let conn = self.conn.lock();
        let result = conn.query_row(
            "SELECT vector, model_name FROM embeddings WHERE symbol_id = ?1",
            params![symbol_id],
            |row| {
                let bytes: Vec<u8> = row.get(0)?;
                let model: String = row.get(1)?;
                Ok((bytes, model))
            },
        );
        match result {
            Ok((bytes, model)) => Ok(Some((bytes_to_vector(&bytes), model))),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn all_embeddings(&self) -> StoreResult<Vec<(i64, Vec<f32>)>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT symbol_id, vector FROM embeddings")?;
        let rows = stmt.query_map([], |row| {
            let id: i64 = row.get(0)?;
            let bytes: Vec<u8> = row.get(1)?;
            Ok((id, bytes))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, bytes) = row?;
            out.push((id, bytes_to_vector(&bytes)));
        }
        Ok(out)
    }

    /// Returns `(operation_type, files_json, patches_json, timestamp)` for
    /// a recorded transaction, used by the mutation engine's undo path.
    pub fn get_transaction(&self, id: i64) -> StoreResult<Option<(String, String, String, u64)>> {
        let conn = self.conn.lock();
        let result = conn.query_row(
            "SELECT op, files_json, patches_json, ts FROM transactions WHERE id = ?1",
            params![id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        );
        match result {
            Ok(row) => Ok(Some(row)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Transaction ledger, newest first, for history retention/inspection.
    pub fn list_transactions(&self, limit: usize) -> StoreResult<Vec<(i64, String, u64)>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT id, op, ts FROM transactions ORDER BY id DESC LIMIT ?1")?;
        let rows = stmt.query_map(params![limit as i64], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    pub fn get_blueprint_mtime(&self, file_path: &str) -> StoreResult<Option<u64>> {
        let conn = self.conn.lock();
        match conn.query_row(
            "SELECT source_mtime FROM blueprint_cache WHERE file_path = ?1",
            params![file_path],
            |row| row.get(0),
        ) {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_blueprint_blob(&self, file_path: &str) -> StoreResult<Option<String>> {
        let conn = self.conn.lock();
        match conn.query_row(
            "SELECT blueprint FROM blueprint_cache WHERE file_path = ?1",
            params![file_path],
            |row| row.get(0),
        ) {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_symbol_by_id(&self, id: i64) -> StoreResult<Option<Symbol>> {
        let conn = self.conn.lock();
        let result = conn.query_row(
            "SELECT id, name, type, file_path, start_line, end_line, signature, parent_class, docstring FROM symbols WHERE id = ?1",
            params![id],
            row_to_symbol,
        );
        match result {
            Ok(s) => Ok(Some(s)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn row_to_symbol(row: &rusqlite::Row) -> rusqlite::Result<Symbol> {
    let kind: String = row.get(2)?;
    Ok(Symbol {
        id: row.get::<_, i64>(0).ok().and_then(|v| crate::types::SymbolId::new(v as u32)),
        name: row.get(1)?,
        kind: SymbolKind::parse(&kind).unwrap_or(SymbolKind::Function),
        file_path: PathBuf::from(row.get::<_, String>(3)?),
        start_line: row.get(4)?,
        end_line: row.get(5)?,
        signature: row.get(6)?,
        parent_class: row.get(7)?,
        docstring: row.get(8)?,
    })
}

fn bytes_to_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
