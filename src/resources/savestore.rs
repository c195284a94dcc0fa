//! Key → string persistence.
//!
//! A [`SaveStore`] is a flat preference-style store: string keys, string
//! values. Structured state is encoded as JSON text with [`save_json`] and
//! decoded with [`load_json`].
//!
//! Two stores are provided:
//! - [`MemorySaveStore`] – in-memory map, useful for tests and ephemeral runs
//! - [`FileSaveStore`] – one JSON object file on disk, written on `flush`

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{debug, info};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::KitResult;

/// Flat string persistence.
pub trait SaveStore {
    fn set_string(&mut self, key: &str, value: String);
    fn get_string(&self, key: &str) -> Option<String>;
    fn has_key(&self, key: &str) -> bool {
        self.get_string(key).is_some()
    }
    /// Remove `key`; returns `true` if it existed.
    fn delete_key(&mut self, key: &str) -> bool;
    /// Persist pending writes.
    fn flush(&mut self) -> KitResult<()>;
}

/// Save store shared between modules on the tick thread.
pub type SharedSaveStore = Rc<RefCell<dyn SaveStore>>;

/// Wrap a store for sharing.
pub fn shared(store: impl SaveStore + 'static) -> SharedSaveStore {
    Rc::new(RefCell::new(store))
}

/// Encode `value` as JSON and store it under `key`.
pub fn save_json<T: Serialize + ?Sized>(
    store: &mut dyn SaveStore,
    key: &str,
    value: &T,
) -> KitResult<()> {
    let text = serde_json::to_string(value)?;
    store.set_string(key, text);
    Ok(())
}

/// Decode the JSON stored under `key`. `Ok(None)` if the key is absent.
pub fn load_json<T: DeserializeOwned>(store: &dyn SaveStore, key: &str) -> KitResult<Option<T>> {
    match store.get_string(key) {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemorySaveStore {
    values: BTreeMap<String, String>,
}

impl MemorySaveStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl SaveStore for MemorySaveStore {
    fn set_string(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn delete_key(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    fn flush(&mut self) -> KitResult<()> {
        Ok(())
    }
}

/// File-backed store: a single JSON object of string values.
#[derive(Debug, Clone)]
pub struct FileSaveStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
    dirty: bool,
}

impl FileSaveStore {
    /// Open `path`, reading existing values if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> KitResult<Self> {
        let path = path.into();
        let values = if path.exists() {
            let text = fs::read_to_string(&path)?;
            let values: BTreeMap<String, String> = serde_json::from_str(&text)?;
            debug!("FileSaveStore: read {} key(s) from {:?}", values.len(), path);
            values
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            values,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if there are writes not yet flushed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl SaveStore for FileSaveStore {
    fn set_string(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
        self.dirty = true;
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn delete_key(&mut self, key: &str) -> bool {
        let removed = self.values.remove(key).is_some();
        self.dirty |= removed;
        removed
    }

    fn flush(&mut self) -> KitResult<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, text)?;
        self.dirty = false;
        info!("Saved {} key(s) to {:?}", self.values.len(), self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KitError;

    #[test]
    fn memory_store_roundtrips_strings() {
        let mut store = MemorySaveStore::new();
        assert!(!store.has_key("a"));
        store.set_string("a", "1".to_string());
        assert_eq!(store.get_string("a").as_deref(), Some("1"));
        assert!(store.delete_key("a"));
        assert!(!store.delete_key("a"));
        assert!(store.is_empty());
    }

    #[test]
    fn json_helpers_encode_structured_values() {
        let mut store = MemorySaveStore::new();
        save_json(&mut store, "ids", &vec!["a", "b"]).unwrap();
        assert_eq!(store.get_string("ids").as_deref(), Some(r#"["a","b"]"#));
        let ids: Option<Vec<String>> = load_json(&store, "ids").unwrap();
        assert_eq!(ids, Some(vec!["a".to_string(), "b".to_string()]));
        let missing: Option<Vec<String>> = load_json(&store, "nope").unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn corrupt_json_is_an_error() {
        let mut store = MemorySaveStore::new();
        store.set_string("ids", "not json".to_string());
        let result: KitResult<Option<Vec<String>>> = load_json(&store, "ids");
        assert!(matches!(result, Err(KitError::Json(_))));
    }

    #[test]
    fn file_store_persists_on_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("save.json");

        let mut store = FileSaveStore::open(&path).unwrap();
        store.set_string("level", "3".to_string());
        assert!(store.is_dirty());
        assert!(!path.exists());
        store.flush().unwrap();
        assert!(!store.is_dirty());

        let reopened = FileSaveStore::open(&path).unwrap();
        assert_eq!(reopened.get_string("level").as_deref(), Some("3"));
    }

    #[test]
    fn file_store_rejects_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");
        fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(FileSaveStore::open(&path), Err(KitError::Json(_))));
    }
}
