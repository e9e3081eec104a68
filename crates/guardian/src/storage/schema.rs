//! `SQLite` schema definitions for guardian.
//!
//! The store is a single key/value table: each named slot holds one JSON
//! document that is rewritten in full on every save.

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// SQL statement to create the documents table.
pub const CREATE_DOCUMENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS documents (
    key TEXT PRIMARY KEY,
    body TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// Upsert statement used for every document save.
pub const UPSERT_DOCUMENT: &str = r"
INSERT INTO documents (key, body, updated_at) VALUES (?1, ?2, ?3)
ON CONFLICT(key) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at
";

/// Statements that must exist before the schema version can be read.
pub const BOOTSTRAP_STATEMENTS: &[&str] = &[CREATE_METADATA_TABLE];
