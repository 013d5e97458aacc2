//! Local key-value store.
//!
//! The desk keeps its state (rate table, selected user, audit log) as JSON
//! values under a handful of string keys. `FileStore` persists them in a
//! single `store.json`; `MemoryStore` keeps them in memory.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;

pub const RATES_KEY: &str = "rates";
pub const CURRENT_USER_KEY: &str = "current_user";
pub const AUDIT_LOG_KEY: &str = "audit_log";

const STORE_FILE: &str = "store.json";

/// Minimal persistence contract
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&mut self, key: &str, value: Value) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Read and deserialize a typed value
pub fn load_json<T, S>(store: &S, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Serialize and write a typed value
pub fn save_json<T, S>(store: &mut S, key: &str, value: &T) -> Result<()>
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    store.set(key, serde_json::to_value(value)?)
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// JSON-file-backed store
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, Value>,
}

impl FileStore {
    /// Create or load a store in `dir`
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(STORE_FILE);

        let entries = if path.exists() {
            let parsed = serde_json::from_reader(BufReader::new(File::open(&path)?));
            match parsed {
                Ok(entries) => entries,
                Err(e) => {
                    // Keep the bad document around; the next write would replace it
                    let aside = path.with_extension("json.corrupt");
                    fs::rename(&path, &aside)?;
                    warn!(
                        "Unreadable store {} moved to {}: {}",
                        path.display(),
                        aside.display(),
                        e
                    );
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        debug!("Opened store {} ({} keys)", path.display(), entries.len());
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write through a temporary file so a crash never leaves half a document
    fn flush(&self) -> Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut writer, &self.entries)?;
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("missing").unwrap(), None);

        store.set("answer", json!(42)).unwrap();
        assert_eq!(store.get("answer").unwrap(), Some(json!(42)));

        store.remove("answer").unwrap();
        assert_eq!(store.get("answer").unwrap(), None);
    }

    #[test]
    fn test_typed_helpers() {
        let mut store = MemoryStore::new();
        save_json(&mut store, CURRENT_USER_KEY, &3u32).unwrap();
        let id: Option<u32> = load_json(&store, CURRENT_USER_KEY).unwrap();
        assert_eq!(id, Some(3));

        store.set(CURRENT_USER_KEY, json!("three")).unwrap();
        assert!(load_json::<u32, _>(&store, CURRENT_USER_KEY).is_err());
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();

        let mut store = FileStore::open(dir.path()).unwrap();
        store.set(RATES_KEY, json!({"deadheadRate": "1.25"})).unwrap();
        store.set("scratch", json!(true)).unwrap();
        store.remove("scratch").unwrap();

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(
            reopened.get(RATES_KEY).unwrap(),
            Some(json!({"deadheadRate": "1.25"}))
        );
        assert_eq!(reopened.get("scratch").unwrap(), None);
        assert!(!dir.path().join("store.json.tmp").exists());
    }

    #[test]
    fn test_file_store_ignores_corrupt_document() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(STORE_FILE), "{not json").unwrap();

        let mut store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.get(RATES_KEY).unwrap(), None);

        let aside = dir.path().join("store.json.corrupt");
        assert_eq!(fs::read_to_string(&aside).unwrap(), "{not json");

        store.set(RATES_KEY, json!({})).unwrap();
        assert_eq!(fs::read_to_string(&aside).unwrap(), "{not json");
        assert!(dir.path().join(STORE_FILE).exists());
    }

    #[test]
    fn test_file_store_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");

        let mut store = FileStore::open(&nested).unwrap();
        store.set("k", json!("v")).unwrap();
        assert!(nested.join(STORE_FILE).exists());
        assert_eq!(store.path(), nested.join(STORE_FILE).as_path());
    }
}
