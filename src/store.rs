//! Key-value persistence for preference values
//!
//! Preferences never hold a reference to their store. Reads take a
//! `&dyn PreferenceStore`, writes go into a [`StoreEditor`] that the caller
//! commits once, so a group save is observed as a single transaction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::StoreError;

/// One persisted scalar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Read access to a namespace plus transactional writes
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<&StoreValue>;

    /// Every key currently present
    fn keys(&self) -> Vec<String>;

    /// Apply all pending edits at once
    fn commit(&mut self, editor: StoreEditor) -> Result<(), StoreError>;

    fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(StoreValue::Bool(value)) => *value,
            _ => default,
        }
    }

    fn get_int(&self, key: &str, default: i32) -> i32 {
        match self.get(key) {
            Some(StoreValue::Int(value)) => i32::try_from(*value).unwrap_or(default),
            _ => default,
        }
    }

    /// Integers written by a JSON round trip are accepted as floats
    fn get_float(&self, key: &str, default: f32) -> f32 {
        match self.get(key) {
            Some(StoreValue::Float(value)) => *value as f32,
            Some(StoreValue::Int(value)) => *value as f32,
            _ => default,
        }
    }

    fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key) {
            Some(StoreValue::Text(value)) => Some(value.clone()),
            _ => None,
        }
    }
}

/// Pending writes. `None` removes the key on commit.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StoreEditor {
    edits: BTreeMap<String, Option<StoreValue>>,
}

impl StoreEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_bool(&mut self, key: impl Into<String>, value: bool) {
        self.edits.insert(key.into(), Some(StoreValue::Bool(value)));
    }

    pub fn put_int(&mut self, key: impl Into<String>, value: i32) {
        self.edits.insert(key.into(), Some(StoreValue::Int(i64::from(value))));
    }

    pub fn put_float(&mut self, key: impl Into<String>, value: f32) {
        self.edits.insert(key.into(), Some(StoreValue::Float(f64::from(value))));
    }

    /// Writing `None` clears the entry
    pub fn put_string(&mut self, key: impl Into<String>, value: Option<&str>) {
        self.edits
            .insert(key.into(), value.map(|v| StoreValue::Text(v.to_string())));
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    fn apply_to(self, values: &mut BTreeMap<String, StoreValue>) {
        for (key, value) in self.edits {
            match value {
                Some(value) => {
                    values.insert(key, value);
                }
                None => {
                    values.remove(&key);
                }
            }
        }
    }
}

/// Store held entirely in memory
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryStore {
    values: BTreeMap<String, StoreValue>,
}

impl MemoryStore {
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

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<&StoreValue> {
        self.values.get(key)
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    fn commit(&mut self, editor: StoreEditor) -> Result<(), StoreError> {
        editor.apply_to(&mut self.values);
        Ok(())
    }
}

/// One JSON file per namespace: `<dir>/<namespace>.json`
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: MemoryStore,
}

impl JsonFileStore {
    /// Default directory for store files
    pub fn default_dir() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(crate::constants::config::APP_DIR);
        path
    }

    pub fn path_for(dir: &Path, namespace: &str) -> PathBuf {
        dir.join(format!(
            "{namespace}.{}",
            crate::constants::config::STORE_EXTENSION
        ))
    }

    /// Open the store for a namespace. A missing file is an empty store.
    pub fn open(dir: &Path, namespace: &str) -> Result<Self, StoreError> {
        let path = Self::path_for(dir, namespace);
        if !path.exists() {
            debug!(path = %path.display(), "Store file not found, starting empty");
            return Ok(Self {
                path,
                values: MemoryStore::new(),
            });
        }

        let contents = fs::read_to_string(&path).map_err(|source| StoreError::Read {
            path: path.clone(),
            source,
        })?;
        let values: MemoryStore =
            serde_json::from_str(&contents).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?;

        info!(path = %path.display(), entries = values.len(), "Loaded preference store");
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(&self.values).map_err(StoreError::Serialize)?;

        // Write beside the target and rename so readers never see a partial file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| StoreError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), "Saved preference store");
        Ok(())
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<&StoreValue> {
        self.values.get(key)
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys()
    }

    fn commit(&mut self, editor: StoreEditor) -> Result<(), StoreError> {
        if editor.is_empty() {
            return Ok(());
        }
        let mut next = self.values.clone();
        next.commit(editor)?;
        let previous = std::mem::replace(&mut self.values, next);
        if let Err(err) = self.write() {
            self.values = previous;
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_commit_applies_all_writes() {
        let mut store = MemoryStore::new();
        let mut editor = StoreEditor::new();
        editor.put_bool("flag", true);
        editor.put_int("count", 3);
        editor.put_float("ratio", 0.5);
        editor.put_string("name", Some("alice"));

        assert!(store.is_empty());
        store.commit(editor).unwrap();

        assert_eq!(store.len(), 4);
        assert!(store.get_bool("flag", false));
        assert_eq!(store.get_int("count", 0), 3);
        assert_eq!(store.get_float("ratio", 0.0), 0.5);
        assert_eq!(store.get_string("name").as_deref(), Some("alice"));
    }

    #[test]
    fn test_put_string_none_removes_key() {
        let mut store = MemoryStore::new();
        let mut editor = StoreEditor::new();
        editor.put_string("name", Some("alice"));
        store.commit(editor).unwrap();

        let mut editor = StoreEditor::new();
        editor.put_string("name", None);
        store.commit(editor).unwrap();

        assert!(!store.contains_key("name"));
    }

    #[test]
    fn test_typed_getters_fall_back_on_mismatch() {
        let mut store = MemoryStore::new();
        let mut editor = StoreEditor::new();
        editor.put_string("text", Some("hello"));
        editor.put_int("number", 7);
        store.commit(editor).unwrap();

        assert_eq!(store.get_int("text", 42), 42);
        assert!(!store.get_bool("number", false));
        assert_eq!(store.get_string("number"), None);
        // ints read back as floats
        assert_eq!(store.get_float("number", 0.0), 7.0);
    }

    #[test]
    fn test_json_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();

        let mut store = JsonFileStore::open(dir.path(), "prefs").unwrap();
        assert!(store.keys().is_empty());

        let mut editor = StoreEditor::new();
        editor.put_bool("enabled", true);
        editor.put_int("mode", 2);
        editor.put_float("volume", 0.25);
        editor.put_string("mode_display", Some("Two"));
        store.commit(editor).unwrap();
        assert!(store.path().exists());

        let reopened = JsonFileStore::open(dir.path(), "prefs").unwrap();
        assert!(reopened.get_bool("enabled", false));
        assert_eq!(reopened.get_int("mode", 0), 2);
        assert_eq!(reopened.get_float("volume", 0.0), 0.25);
        assert_eq!(reopened.get_string("mode_display").as_deref(), Some("Two"));
    }

    #[test]
    fn test_json_file_store_namespaces_are_separate_files() {
        let dir = tempfile::tempdir().unwrap();

        let mut first = JsonFileStore::open(dir.path(), "first").unwrap();
        let mut editor = StoreEditor::new();
        editor.put_bool("shared_key", true);
        first.commit(editor).unwrap();

        let second = JsonFileStore::open(dir.path(), "second").unwrap();
        assert!(!second.contains_key("shared_key"));
    }

    #[test]
    fn test_json_file_store_rejects_non_object() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(JsonFileStore::path_for(dir.path(), "broken"), "[1, 2, 3]").unwrap();

        let result = JsonFileStore::open(dir.path(), "broken");
        assert!(matches!(result, Err(StoreError::Parse { .. })));
    }
}
