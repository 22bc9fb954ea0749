//! Insert/delete/upsert primitives C5 and C9 build on. Each public method
//! here is one logical unit = one transaction, per spec.md §4.3's
//! connection discipline.

use super::{Store, StoreResult};
use crate::model::{FileRecord, Import, Symbol};
use rusqlite::params;

impl Store {
    /// Replaces everything derived from one file in a single transaction:
    /// delete the file's prior rows, then insert the fresh record. Used by
    /// both a first scan and a reparse.
    pub fn replace_file_record(&self, record: &FileRecord) -> StoreResult<Vec<i64>> {
        let Some(file) = &record.file else {
            return Ok(Vec::new());
        };
        let path = file.path.to_string_lossy().to_string();

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        delete_file_rows(&tx, &path)?;

        tx.execute(
            "INSERT INTO files (path, size, last_modified, extension, hash) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![path, file.size, file.last_modified, file.extension, file.content_hash],
        )?;

        let mut ids = Vec::with_capacity(record.symbols.len());
        for symbol in &record.symbols {
            let id = insert_symbol(&tx, symbol)?;
            ids.push(id);
        }

        for import in &record.imports {
            insert_import(&tx, import)?;
        }

        for call in &record.calls {
            tx.execute(
                "INSERT INTO calls (caller_file, callee, line) VALUES (?1, ?2, ?3)",
                params![call.caller_file.to_string_lossy(), call.callee, call.line],
            )?;
        }

        for mc in &record.method_calls {
            tx.execute(
                "INSERT INTO method_calls (caller_file, line, receiver, method, receiver_type) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![mc.caller_file.to_string_lossy(), mc.line, mc.receiver, mc.method, mc.receiver_type],
            )?;
        }

        for ti in &record.type_infos {
            tx.execute(
                "INSERT INTO type_info (variable, file, line, type_name) VALUES (?1, ?2, ?3, ?4)",
                params![ti.variable, ti.file.to_string_lossy(), ti.line, ti.type_name],
            )?;
        }

        tx.commit()?;
        Ok(ids)
    }

    /// Cascades a file's removal across every table that references it
    /// (spec.md §4.4 "For each deleted file").
    pub fn delete_file(&self, path: &str) -> StoreResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        delete_file_rows(&tx, path)?;
        tx.execute("DELETE FROM files WHERE path = ?1", params![path])?;
        tx.commit()?;
        Ok(())
    }

    pub fn upsert_embedding(&self, symbol_id: i64, vector: &[f32], model_name: &str) -> StoreResult<()> {
        let bytes: Vec<u8> = vector.iter().flat_map(|f| f.to_le_bytes()).collect();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO embeddings (symbol_id, vector, model_name) VALUES (?1, ?2, ?3)
             ON CONFLICT(symbol_id) DO UPDATE SET vector = excluded.vector, model_name = excluded.model_name",
            params![symbol_id, bytes, model_name],
        )?;
        Ok(())
    }

    pub fn record_transaction(
        &self,
        operation_type: &str,
        files: &[std::path::PathBuf],
        patches_json: &str,
        timestamp: u64,
    ) -> StoreResult<i64> {
        let files_json = serde_json::to_string(files)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO transactions (op, files_json, patches_json, ts) VALUES (?1, ?2, ?3, ?4)",
            params![operation_type, files_json, patches_json, timestamp],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Keeps only the `keep` most recent transactions, per spec.md §3's
    /// "retention is bounded (keep-last-N)".
    pub fn prune_transactions(&self, keep: usize) -> StoreResult<usize> {
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM transactions WHERE id NOT IN (SELECT id FROM transactions ORDER BY id DESC LIMIT ?1)",
            params![keep as i64],
        )
        .map_err(Into::into)
    }

    pub fn update_import_link(
        &self,
        importer_file: &str,
        import_line: u32,
        definition_file: Option<&str>,
        definition_symbol: Option<&str>,
    ) -> StoreResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE import_links SET definition_file = ?1, definition_symbol = ?2
             WHERE importer_file = ?3 AND import_line = ?4",
            params![definition_file, definition_symbol, importer_file, import_line],
        )?;
        Ok(())
    }

    pub fn put_blueprint(&self, file_path: &str, blueprint: &str, source_mtime: u64, ts: u64) -> StoreResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO blueprint_cache (file_path, blueprint, source_mtime, ts) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(file_path) DO UPDATE SET blueprint = excluded.blueprint, source_mtime = excluded.source_mtime, ts = excluded.ts",
            params![file_path, blueprint, source_mtime, ts],
        )?;
        Ok(())
    }
}

fn insert_symbol(tx: &rusqlite::Transaction<'_>, symbol: &Symbol) -> StoreResult<i64> {
    tx.execute(
        "INSERT INTO symbols (name, type, file_path, start_line, end_line, signature, parent_class, docstring)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            symbol.name,
            symbol.kind.as_str(),
            symbol.file_path.to_string_lossy(),
            symbol.start_line,
            symbol.end_line,
            symbol.signature,
            symbol.parent_class,
            symbol.docstring,
        ],
    )?;
    let id = tx.last_insert_rowid();
    let fts_content = fts_document(symbol);
    tx.execute(
        "INSERT INTO symbols_fts (rowid, content) VALUES (?1, ?2)",
        params![id, fts_content],
    )?;
    Ok(id)
}

/// Text blob indexed for keyword retrieval: name, signature, and docstring
/// concatenated so a query can hit any of the three.
fn fts_document(symbol: &Symbol) -> String {
    let mut doc = format!("{} {}", symbol.name, symbol.signature);
    if let Some(doc_comment) = &symbol.docstring {
        doc.push(' ');
        doc.push_str(doc_comment);
    }
    doc
}

fn insert_import(tx: &rusqlite::Transaction<'_>, import: &Import) -> StoreResult<()> {
    let symbols_json = serde_json::to_string(&import.imported_symbols)?;
    tx.execute(
        "INSERT INTO imports (importer_file, imported_module, import_line, imported_symbols) VALUES (?1, ?2, ?3, ?4)",
        params![
            import.importer_file.to_string_lossy(),
            import.imported_module,
            import.import_line,
            symbols_json
        ],
    )?;
    tx.execute(
        "INSERT INTO import_links (importer_file, imported_module, import_line, imported_symbols, definition_file, definition_symbol)
         VALUES (?1, ?2, ?3, ?4, NULL, NULL)",
        params![
            import.importer_file.to_string_lossy(),
            import.imported_module,
            import.import_line,
            symbols_json
        ],
    )?;
    Ok(())
}

fn delete_file_rows(tx: &rusqlite::Transaction<'_>, path: &str) -> StoreResult<()> {
    let symbol_ids: Vec<i64> = {
        let mut stmt = tx.prepare("SELECT id FROM symbols WHERE file_path = ?1")?;
        let rows = stmt.query_map(params![path], |row| row.get(0))?;
        rows.collect::<Result<_, _>>()?
    };
    for id in &symbol_ids {
        tx.execute("DELETE FROM symbols_fts WHERE rowid = ?1", params![id])?;
        tx.execute("DELETE FROM embeddings WHERE symbol_id = ?1", params![id])?;
    }
    tx.execute("DELETE FROM symbols WHERE file_path = ?1", params![path])?;
    tx.execute("DELETE FROM imports WHERE importer_file = ?1", params![path])?;
    tx.execute("DELETE FROM import_links WHERE importer_file = ?1", params![path])?;
    tx.execute("DELETE FROM calls WHERE caller_file = ?1", params![path])?;
    tx.execute("DELETE FROM method_calls WHERE caller_file = ?1", params![path])?;
    tx.execute("DELETE FROM symbol_references WHERE source_file = ?1", params![path])?;
    tx.execute("DELETE FROM type_info WHERE file = ?1", params![path])?;
    Ok(())
}
