//! DDL for the SQLite-backed index (spec.md §4.3). One file, one schema
//! version gate in `metadata`.

pub const SCHEMA_VERSION: i64 = 1;

pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS files (
    path TEXT PRIMARY KEY,
    size INTEGER NOT NULL,
    last_modified INTEGER NOT NULL,
    extension TEXT NOT NULL,
    hash TEXT
);

CREATE TABLE IF NOT EXISTS symbols (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    type TEXT NOT NULL,
    file_path TEXT NOT NULL,
    start_line INTEGER NOT NULL,
    end_line INTEGER NOT NULL,
    signature TEXT NOT NULL,
    parent_class TEXT,
    docstring TEXT
);
CREATE INDEX IF NOT EXISTS idx_symbols_file ON symbols(file_path);
CREATE INDEX IF NOT EXISTS idx_symbols_name ON symbols(name);
CREATE INDEX IF NOT EXISTS idx_symbols_type ON symbols(type);

CREATE VIRTUAL TABLE IF NOT EXISTS symbols_fts USING fts5(
    content,
    content='',
    contentless_delete=1,
    tokenize='porter'
);

CREATE TABLE IF NOT EXISTS imports (
    importer_file TEXT NOT NULL,
    imported_module TEXT NOT NULL,
    import_line INTEGER NOT NULL,
    imported_symbols TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_imports_file ON imports(importer_file);

CREATE TABLE IF NOT EXISTS import_links (
    importer_file TEXT NOT NULL,
    imported_module TEXT NOT NULL,
    import_line INTEGER NOT NULL,
    imported_symbols TEXT NOT NULL,
    definition_file TEXT,
    definition_symbol TEXT
);
CREATE INDEX IF NOT EXISTS idx_import_links_importer ON import_links(importer_file);

CREATE TABLE IF NOT EXISTS calls (
    caller_file TEXT NOT NULL,
    callee TEXT NOT NULL,
    line INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_calls_caller ON calls(caller_file);
CREATE INDEX IF NOT EXISTS idx_calls_callee ON calls(callee);

CREATE TABLE IF NOT EXISTS method_calls (
    caller_file TEXT NOT NULL,
    line INTEGER NOT NULL,
    receiver TEXT NOT NULL,
    method TEXT NOT NULL,
    receiver_type TEXT
);
CREATE INDEX IF NOT EXISTS idx_method_calls_caller ON method_calls(caller_file);
CREATE INDEX IF NOT EXISTS idx_method_calls_method ON method_calls(method);
CREATE INDEX IF NOT EXISTS idx_method_calls_receiver_type ON method_calls(receiver_type);

CREATE TABLE IF NOT EXISTS symbol_references (
    source_file TEXT NOT NULL,
    source_line INTEGER NOT NULL,
    source_symbol TEXT NOT NULL,
    reference_type TEXT NOT NULL,
    target_file TEXT,
    target_symbol TEXT,
    target_type TEXT,
    confidence REAL NOT NULL,
    resolution_method TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_refs_source ON symbol_references(source_file);
CREATE INDEX IF NOT EXISTS idx_refs_target ON symbol_references(target_file, target_symbol);

CREATE TABLE IF NOT EXISTS type_info (
    variable TEXT NOT NULL,
    file TEXT NOT NULL,
    line INTEGER NOT NULL,
    type_name TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_type_info_file ON type_info(file);

CREATE TABLE IF NOT EXISTS embeddings (
    symbol_id INTEGER PRIMARY KEY,
    vector BLOB NOT NULL,
    model_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    op TEXT NOT NULL,
    files_json TEXT NOT NULL,
    patches_json TEXT NOT NULL,
    ts INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS blueprint_cache (
    file_path TEXT PRIMARY KEY,
    blueprint TEXT NOT NULL,
    source_mtime INTEGER NOT NULL,
    ts INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;
