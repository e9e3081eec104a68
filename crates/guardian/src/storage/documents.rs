//! Typed access to stored documents.
//!
//! Loading never fails: a missing, unreadable or malformed document is
//! replaced by a caller-supplied fallback and the problem is logged. Saving is
//! best effort: failures are logged and swallowed so that a storage hiccup
//! never takes down the view that triggered it.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::{DocumentKey, DocumentStore};

/// Where a loaded document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Parsed from the store.
    Stored,
    /// Nothing was stored; the fallback was used.
    Missing,
    /// Something was stored but could not be used; the fallback was used.
    Repaired,
}

impl LoadSource {
    /// Whether the fallback value was used.
    #[must_use]
    pub fn is_fallback(self) -> bool {
        !matches!(self, Self::Stored)
    }
}

/// Load the document under `key`, or `fallback()` if it is absent or corrupt.
pub fn load_or<S, T, F>(store: &S, key: DocumentKey, fallback: F) -> T
where
    S: DocumentStore + ?Sized,
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    load_with_source(store, key, fallback).0
}

/// Like [`load_or`], also reporting whether the fallback was used.
pub fn load_with_source<S, T, F>(store: &S, key: DocumentKey, fallback: F) -> (T, LoadSource)
where
    S: DocumentStore + ?Sized,
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    let raw = match store.load(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("No stored {key} document, using defaults");
            return (fallback(), LoadSource::Missing);
        }
        Err(e) => {
            warn!("Failed to read {key} document, using defaults: {e}");
            return (fallback(), LoadSource::Repaired);
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => (value, LoadSource::Stored),
        Err(e) => {
            warn!("Stored {key} document is corrupt, using defaults: {e}");
            (fallback(), LoadSource::Repaired)
        }
    }
}

/// Serialize `value` and store it under `key`.
///
/// Returns `true` if the document was written.
pub fn save<S, T>(store: &S, key: DocumentKey, value: &T) -> bool
where
    S: DocumentStore + ?Sized,
    T: Serialize + ?Sized,
{
    let body = match serde_json::to_string(value) {
        Ok(body) => body,
        Err(e) => {
            warn!("Failed to serialize {key} document: {e}");
            return false;
        }
    };

    match store.save(key, &body) {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to save {key} document: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::storage::MemoryStore;

    #[derive(Debug)]
    struct BrokenStore;

    impl DocumentStore for BrokenStore {
        fn load(&self, _key: DocumentKey) -> Result<Option<String>> {
            Err(Error::internal("disk on fire"))
        }

        fn save(&self, _key: DocumentKey, _document: &str) -> Result<()> {
            Err(Error::internal("disk on fire"))
        }
    }

    #[test]
    fn test_missing_uses_fallback() {
        let store = MemoryStore::new();
        let (value, source): (Vec<u32>, _) =
            load_with_source(&store, DocumentKey::Drills, || vec![7]);

        assert_eq!(value, vec![7]);
        assert_eq!(source, LoadSource::Missing);
        assert!(source.is_fallback());
    }

    #[test]
    fn test_stored_value_is_parsed() {
        let store = MemoryStore::with_document(DocumentKey::Drills, "[1,2,3]");
        let (value, source): (Vec<u32>, _) =
            load_with_source(&store, DocumentKey::Drills, Vec::new);

        assert_eq!(value, vec![1, 2, 3]);
        assert_eq!(source, LoadSource::Stored);
    }

    #[test]
    fn test_corrupt_document_is_repaired() {
        crate::logging::init_test_logging();
        let store = MemoryStore::with_document(DocumentKey::Drills, "{not json");
        let (value, source): (Vec<u32>, _) =
            load_with_source(&store, DocumentKey::Drills, || vec![9]);

        assert_eq!(value, vec![9]);
        assert_eq!(source, LoadSource::Repaired);
    }

    #[test]
    fn test_wrong_shape_is_repaired() {
        let store = MemoryStore::with_document(DocumentKey::Drills, r#"{"a":1}"#);
        let value: Vec<u32> = load_or(&store, DocumentKey::Drills, Vec::new);
        assert!(value.is_empty());
    }

    #[test]
    fn test_unreadable_store_is_repaired() {
        let (value, source): (Vec<u32>, _) =
            load_with_source(&BrokenStore, DocumentKey::Family, || vec![1]);
        assert_eq!(value, vec![1]);
        assert_eq!(source, LoadSource::Repaired);
    }

    #[test]
    fn test_save_writes_json() {
        let store = MemoryStore::new();
        assert!(save(&store, DocumentKey::Family, &vec!["a", "b"]));
        assert_eq!(
            store.raw(DocumentKey::Family).as_deref(),
            Some(r#"["a","b"]"#)
        );
    }

    #[test]
    fn test_save_failure_is_swallowed() {
        assert!(!save(&BrokenStore, DocumentKey::Family, &vec![1]));
    }
}
