//! Preference Store - durable key/value settings
//!
//! A flat JSON object on disk, merged over a defaults mapping at load time so
//! new keys pick up sane values without migrating old files. Every write
//! rewrites the whole record.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::error::StoreError;

pub type PreferenceRecord = Map<String, Value>;

pub struct PreferenceStore {
    path: PathBuf,
    defaults: PreferenceRecord,
    data: PreferenceRecord,
}

impl PreferenceStore {
    /// Load `path`, merged over `defaults`. Never fails: a missing file is a
    /// first run, anything else is logged and treated the same way.
    pub fn open(path: impl Into<PathBuf>, defaults: PreferenceRecord) -> Self {
        let path = path.into();
        let data = match load(&path) {
            Ok(Some(stored)) => merge(&defaults, stored),
            Ok(None) => {
                debug!(path = %path.display(), "no preference file yet, using defaults");
                defaults.clone()
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to load preferences, using defaults");
                defaults.clone()
            }
        };

        Self {
            path,
            defaults,
            data,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored value, else the default, else `None`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.data
            .get(key)
            .or_else(|| self.defaults.get(key))
            .cloned()
    }

    /// Like [`get`](Self::get) but deserialized. A value of the wrong shape
    /// reads as `None`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key)
            .and_then(|value| serde_json::from_value(value).ok())
    }

    /// Merge `value` into the record and rewrite the file.
    ///
    /// The in-memory record keeps the new value even when the disk write
    /// fails; the return value reports whether it reached disk.
    pub fn set(&mut self, key: &str, value: Value) -> bool {
        self.data.insert(key.to_string(), value);
        self.persist_logged()
    }

    pub fn get_all(&self) -> PreferenceRecord {
        self.data.clone()
    }

    /// Replace the record with a fresh copy of the defaults and persist it.
    pub fn reset(&mut self) -> bool {
        self.data = self.defaults.clone();
        self.persist_logged()
    }

    fn persist_logged(&self) -> bool {
        match persist(&self.path, &self.data) {
            Ok(()) => true,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "failed to save preferences");
                false
            }
        }
    }
}

fn load(path: &Path) -> Result<Option<PreferenceRecord>, StoreError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let value: Value = serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    match value {
        Value::Object(map) => Ok(Some(map)),
        _ => Err(StoreError::NotAnObject(path.to_path_buf())),
    }
}

fn merge(defaults: &PreferenceRecord, stored: PreferenceRecord) -> PreferenceRecord {
    let mut merged = defaults.clone();
    merged.extend(stored);
    merged
}

// write a sibling temp file then rename so a crash never truncates the record
fn persist(path: &Path, data: &PreferenceRecord) -> Result<(), StoreError> {
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
    }

    let json = serde_json::to_string_pretty(data)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(write_err)?;
    std::fs::rename(&tmp, path).map_err(write_err)?;
    Ok(())
}
