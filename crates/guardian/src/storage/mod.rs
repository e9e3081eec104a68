//! Storage layer for guardian.
//!
//! All persisted state is a handful of independent JSON documents, each kept
//! under a named slot ([`DocumentKey`]). The [`DocumentStore`] trait is the
//! only way the rest of the crate reaches storage:
//!
//! - [`SqliteStore`] keeps the documents in a local `SQLite` database.
//! - [`MemoryStore`] keeps them in memory, for tests and dry runs.
//!
//! Typed loading with fallback-on-corruption lives in [`documents`].

pub mod documents;
pub mod migrations;
pub mod schema;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Named document slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKey {
    /// Household supply inventory.
    Inventory,
    /// Family members and emergency contacts.
    Family,
    /// The escape plan document.
    PlanData,
    /// Recurring household drills.
    Drills,
}

impl DocumentKey {
    /// Every slot, in a stable order.
    pub const ALL: [Self; 4] = [Self::Inventory, Self::Family, Self::PlanData, Self::Drills];

    /// The slot name used on disk.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inventory => "inventory",
            Self::Family => "family",
            Self::PlanData => "plan_data",
            Self::Drills => "drills",
        }
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key/value persistence for whole JSON documents.
///
/// Implementations are single-writer: one in-memory model owns each key.
pub trait DocumentStore {
    /// Load the raw document stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load(&self, key: DocumentKey) -> Result<Option<String>>;

    /// Replace the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn save(&self, key: DocumentKey, document: &str) -> Result<()>;
}

impl<T: DocumentStore + ?Sized> DocumentStore for &T {
    fn load(&self, key: DocumentKey) -> Result<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: DocumentKey, document: &str) -> Result<()> {
        (**self).save(key, document)
    }
}

impl<T: DocumentStore + ?Sized> DocumentStore for Rc<T> {
    fn load(&self, key: DocumentKey) -> Result<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: DocumentKey, document: &str) -> Result<()> {
        (**self).save(key, document)
    }
}

impl<T: DocumentStore + ?Sized> DocumentStore for Box<T> {
    fn load(&self, key: DocumentKey) -> Result<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: DocumentKey, document: &str) -> Result<()> {
        (**self).save(key, document)
    }
}

/// `SQLite`-backed document store.
#[derive(Debug)]
pub struct SqliteStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl SqliteStore {
    /// Open or create a store database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory `SQLite` store.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// List the slots that currently hold a document.
    ///
    /// Rows whose key is not a known slot are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn keys(&self) -> Result<Vec<DocumentKey>> {
        let mut stmt = self.conn.prepare("SELECT key FROM documents ORDER BY key")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(names
            .iter()
            .filter_map(|name| DocumentKey::ALL.into_iter().find(|k| k.as_str() == name))
            .collect())
    }

    /// Remove the document stored under `key`.
    ///
    /// Returns `true` if a document was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn remove(&self, key: DocumentKey) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM documents WHERE key = ?1", [key.as_str()])?;
        Ok(affected > 0)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StoreStats> {
        let document_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        let total_bytes: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(body)), 0) FROM documents",
            [],
            |row| row.get(0),
        )?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StoreStats {
            document_count: usize::try_from(document_count).unwrap_or(0),
            document_bytes: u64::try_from(total_bytes).unwrap_or(0),
            db_size_bytes,
        })
    }
}

impl DocumentStore for SqliteStore {
    fn load(&self, key: DocumentKey) -> Result<Option<String>> {
        let body = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE key = ?1",
                [key.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(body)
    }

    fn save(&self, key: DocumentKey, document: &str) -> Result<()> {
        self.conn.execute(
            schema::UPSERT_DOCUMENT,
            params![key.as_str(), document, Utc::now().to_rfc3339()],
        )?;
        debug!("Saved {} ({} bytes)", key, document.len());
        Ok(())
    }
}

/// In-memory document store.
///
/// Counts saves so callers can check whether anything was persisted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RefCell<HashMap<DocumentKey, String>>,
    saves: Cell<usize>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one raw document.
    #[must_use]
    pub fn with_document(key: DocumentKey, document: impl Into<String>) -> Self {
        let store = Self::new();
        store.documents.borrow_mut().insert(key, document.into());
        store
    }

    /// Number of successful saves since creation.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }

    /// The raw document under `key`, without going through the trait.
    #[must_use]
    pub fn raw(&self, key: DocumentKey) -> Option<String> {
        self.documents.borrow().get(&key).cloned()
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self, key: DocumentKey) -> Result<Option<String>> {
        Ok(self.raw(key))
    }

    fn save(&self, key: DocumentKey, document: &str) -> Result<()> {
        self.documents
            .borrow_mut()
            .insert(key, document.to_string());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

/// Statistics about the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of slots holding a document.
    pub document_count: usize,
    /// Combined size of all stored documents in bytes.
    pub document_bytes: u64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().expect("failed to create test store")
    }

    #[test]
    fn test_document_key_names() {
        assert_eq!(DocumentKey::Inventory.as_str(), "inventory");
        assert_eq!(DocumentKey::Family.as_str(), "family");
        assert_eq!(DocumentKey::PlanData.as_str(), "plan_data");
        assert_eq!(DocumentKey::Drills.to_string(), "drills");
    }

    #[test]
    fn test_load_missing_document() {
        let store = create_test_store();
        assert!(store.load(DocumentKey::PlanData).unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let store = create_test_store();
        store.save(DocumentKey::Family, "[]").unwrap();

        assert_eq!(
            store.load(DocumentKey::Family).unwrap().as_deref(),
            Some("[]")
        );
    }

    #[test]
    fn test_save_overwrites() {
        let store = create_test_store();
        store.save(DocumentKey::Drills, "[1]").unwrap();
        store.save(DocumentKey::Drills, "[1,2]").unwrap();

        assert_eq!(
            store.load(DocumentKey::Drills).unwrap().as_deref(),
            Some("[1,2]")
        );
        assert_eq!(store.stats().unwrap().document_count, 1);
    }

    #[test]
    fn test_slots_are_independent() {
        let store = create_test_store();
        store.save(DocumentKey::Inventory, "inv").unwrap();
        store.save(DocumentKey::PlanData, "plan").unwrap();

        assert_eq!(
            store.load(DocumentKey::Inventory).unwrap().as_deref(),
            Some("inv")
        );
        assert!(store.load(DocumentKey::Family).unwrap().is_none());
        assert_eq!(
            store.keys().unwrap(),
            vec![DocumentKey::Inventory, DocumentKey::PlanData]
        );
    }

    #[test]
    fn test_remove() {
        let store = create_test_store();
        store.save(DocumentKey::Family, "[]").unwrap();

        assert!(store.remove(DocumentKey::Family).unwrap());
        assert!(!store.remove(DocumentKey::Family).unwrap());
        assert!(store.load(DocumentKey::Family).unwrap().is_none());
    }

    #[test]
    fn test_stats_empty() {
        let stats = create_test_store().stats().unwrap();
        assert_eq!(stats.document_count, 0);
        assert_eq!(stats.document_bytes, 0);
        assert_eq!(stats.db_size_bytes, 0);
    }

    #[test]
    fn test_stats_counts_bytes() {
        let store = create_test_store();
        store.save(DocumentKey::Inventory, "12345").unwrap();
        store.save(DocumentKey::Family, "123").unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.document_count, 2);
        assert_eq!(stats.document_bytes, 8);
    }

    #[test]
    fn test_open_file_based_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guardian.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.save(DocumentKey::PlanData, r#"{"markers":[]}"#).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.path(), path.as_path());
        assert_eq!(
            store.load(DocumentKey::PlanData).unwrap().as_deref(),
            Some(r#"{"markers":[]}"#)
        );
        assert!(store.stats().unwrap().db_size_bytes > 0);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("guardian.db");

        let store = SqliteStore::open(&path);
        assert!(store.is_ok());
        assert!(path.exists());
    }

    #[test]
    fn test_unicode_document() {
        let store = create_test_store();
        let doc = r#"[{"name":"饮用水 🚰"}]"#;
        store.save(DocumentKey::Inventory, doc).unwrap();

        assert_eq!(
            store.load(DocumentKey::Inventory).unwrap().as_deref(),
            Some(doc)
        );
    }

    #[test]
    fn test_memory_store_counts_saves() {
        let store = MemoryStore::new();
        assert_eq!(store.save_count(), 0);

        store.save(DocumentKey::Drills, "[]").unwrap();
        store.save(DocumentKey::Drills, "[]").unwrap();

        assert_eq!(store.save_count(), 2);
        assert_eq!(store.raw(DocumentKey::Drills).as_deref(), Some("[]"));
    }

    #[test]
    fn test_memory_store_with_document() {
        let store = MemoryStore::with_document(DocumentKey::Family, "[]");
        assert_eq!(store.load(DocumentKey::Family).unwrap().as_deref(), Some("[]"));
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn test_store_through_rc_and_ref() {
        let store = Rc::new(MemoryStore::new());
        let shared = Rc::clone(&store);

        shared.save(DocumentKey::Family, "[]").unwrap();
        let by_ref: &MemoryStore = &store;
        assert!(by_ref.load(DocumentKey::Family).unwrap().is_some());
    }
}
