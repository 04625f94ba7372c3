//! Filesystem-backed parameter store.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use errpage_core::{is_word_char, ParameterRecord};

use crate::StoreError;

/// File extension of parameter documents.
pub const DOCUMENT_EXTENSION: &str = "json";

/// Read-only source of parameter records keyed by canonical name.
pub trait ParameterStore: Send + Sync {
    /// Load the record for `key`.
    ///
    /// `key` is expected to be a canonical lookup key; implementations must
    /// reject anything else rather than interpret it as a path.
    fn load(&self, key: &str) -> Result<ParameterRecord, StoreError>;
}

/// Parameter store reading one `<key>.json` document per example from a directory.
#[derive(Debug)]
pub struct FsParameterStore {
    root: PathBuf,
    loads: AtomicU64,
}

impl FsParameterStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            loads: AtomicU64::new(0),
        }
    }

    /// The directory documents are read from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document for `key`.
    pub fn document_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.{}", key, DOCUMENT_EXTENSION))
    }

    /// Number of filesystem load attempts so far.
    pub fn load_count(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }

    /// List the keys of all documents in the store, sorted.
    ///
    /// Files whose stem is not a valid lookup key are skipped.
    pub fn list(&self) -> io::Result<Vec<String>> {
        let mut keys: Vec<String> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension().and_then(|ext| ext.to_str()) == Some(DOCUMENT_EXTENSION)
            })
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .filter(|stem| is_valid_key(stem))
            .collect();
        keys.sort();
        Ok(keys)
    }
}

impl ParameterStore for FsParameterStore {
    fn load(&self, key: &str) -> Result<ParameterRecord, StoreError> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        if !is_valid_key(key) {
            return Err(StoreError::InvalidKey(key.to_string()));
        }

        self.loads.fetch_add(1, Ordering::Relaxed);
        let path = self.document_path(key);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::Missing(path));
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        ParameterRecord::from_slice(&bytes).map_err(|source| StoreError::Malformed { path, source })
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(is_word_char) && key.to_lowercase() == key
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with(docs: &[(&str, &str)]) -> (TempDir, FsParameterStore) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in docs {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let store = FsParameterStore::new(dir.path());
        (dir, store)
    }

    // === Load Tests ===

    #[test]
    fn test_load_existing_document() {
        let (_dir, store) = store_with(&[("default.json", r#"{"title":"X"}"#)]);
        let record = store.load("default").unwrap();
        assert_eq!(record.get_str("title"), Some("X"));
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn test_load_missing_document() {
        let (_dir, store) = store_with(&[]);
        let err = store.load("nope").unwrap_err();
        assert!(matches!(err, StoreError::Missing(_)));
        assert_eq!(err.kind(), "missing");
    }

    #[test]
    fn test_load_malformed_document() {
        let (_dir, store) = store_with(&[("broken.json", "{oops")]);
        let err = store.load("broken").unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[test]
    fn test_load_non_object_document() {
        let (_dir, store) = store_with(&[("list.json", "[1, 2, 3]")]);
        assert!(matches!(store.load("list"), Err(StoreError::Malformed { .. })));
    }

    #[test]
    fn test_load_directory_is_io_error() {
        let (dir, store) = store_with(&[]);
        fs::create_dir(dir.path().join("folder.json")).unwrap();
        let err = store.load("folder").unwrap_err();
        assert!(matches!(err, StoreError::Io { .. } | StoreError::Missing(_)));
    }

    // === Key Validation Tests ===

    #[test]
    fn test_load_empty_key_skips_io() {
        let (_dir, store) = store_with(&[(".json", r#"{"title":"hidden"}"#)]);
        assert!(matches!(store.load(""), Err(StoreError::EmptyKey)));
        assert_eq!(store.load_count(), 0);
    }

    #[test]
    fn test_load_rejects_path_like_keys() {
        let (_dir, store) = store_with(&[]);
        for key in ["../secret", "a/b", "a\\b", "x.json", "Upper"] {
            assert!(
                matches!(store.load(key), Err(StoreError::InvalidKey(_))),
                "key {key:?} should be rejected"
            );
        }
        assert_eq!(store.load_count(), 0);
    }

    // === Listing Tests ===

    #[test]
    fn test_list_keys_sorted() {
        let (_dir, store) = store_with(&[
            ("zeta.json", "{}"),
            ("alpha.json", "{}"),
            ("notes.txt", "ignored"),
            ("Bad-Name.json", "{}"),
        ]);
        assert_eq!(store.list().unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_document_path() {
        let store = FsParameterStore::new("/srv/examples");
        assert_eq!(
            store.document_path("default"),
            PathBuf::from("/srv/examples/default.json")
        );
    }
}
