//! Per-machine key/value store (local.json)
//!
//! Values are arbitrary JSON stored under prefixed keys. Every change is
//! written through to disk immediately.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{BudgetError, BudgetResult};
use crate::storage::collection::{read_lock_error, write_lock_error};
use crate::storage::file_io::{read_json, write_json_atomic};

/// Prefix of every key this application owns
pub const KEY_PREFIX: &str = "budget_app_";

/// Format version written by [`LocalStore::export_app_data`]
pub const EXPORT_VERSION: &str = "1.0";

/// Number of in-store backups kept
pub const MAX_LOCAL_BACKUPS: usize = 5;

const BACKUPS_LIST_KEY: &str = "backups_list";

/// Everything the store holds, as written by an export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppDataExport {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub data: BTreeMap<String, Value>,
}

/// Entry of the in-store backup list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalBackupInfo {
    pub key: String,
    pub date: DateTime<Utc>,
    pub size: usize,
}

pub struct LocalStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, Value>>,
}

impl LocalStore {
    /// Open the store, starting empty if the file does not exist
    pub fn open(path: PathBuf) -> BudgetResult<Self> {
        let entries: BTreeMap<String, Value> = match read_json(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "local store unreadable, starting empty");
                BTreeMap::new()
            }
        };
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> BudgetResult<()> {
        let value = serde_json::to_value(value)?;
        self.write_through(|entries| {
            entries.insert(prefixed(key), value);
        })
    }

    /// Read a value; a value of the wrong shape reads as missing
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> BudgetResult<Option<T>> {
        let entries = self.entries.read().map_err(read_lock_error)?;
        let Some(value) = entries.get(&prefixed(key)) else {
            return Ok(None);
        };
        match serde_json::from_value(value.clone()) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                warn!(key, error = %e, "ignoring malformed local value");
                Ok(None)
            }
        }
    }

    /// Read a value or fall back to a default
    pub fn load_or<T: DeserializeOwned>(&self, key: &str, default: T) -> BudgetResult<T> {
        Ok(self.load(key)?.unwrap_or(default))
    }

    /// Remove a key. Returns whether it existed.
    pub fn remove(&self, key: &str) -> BudgetResult<bool> {
        let key = prefixed(key);
        if !self.entries.read().map_err(read_lock_error)?.contains_key(&key) {
            return Ok(false);
        }
        self.write_through(|entries| {
            entries.remove(&key);
        })?;
        Ok(true)
    }

    pub fn has(&self, key: &str) -> BudgetResult<bool> {
        let entries = self.entries.read().map_err(read_lock_error)?;
        Ok(entries.contains_key(&prefixed(key)))
    }

    /// Remove every key this application owns
    pub fn clear(&self) -> BudgetResult<()> {
        self.write_through(|entries| entries.retain(|k, _| !k.starts_with(KEY_PREFIX)))
    }

    /// Keys without the prefix, sorted
    pub fn keys(&self) -> BudgetResult<Vec<String>> {
        let entries = self.entries.read().map_err(read_lock_error)?;
        Ok(entries
            .keys()
            .filter_map(|k| k.strip_prefix(KEY_PREFIX))
            .map(str::to_string)
            .collect())
    }

    /// Approximate size in bytes: key lengths plus serialized value lengths
    pub fn size(&self) -> BudgetResult<usize> {
        let entries = self.entries.read().map_err(read_lock_error)?;
        Ok(entries
            .iter()
            .filter(|(k, _)| k.starts_with(KEY_PREFIX))
            .map(|(k, v)| k.len() + v.to_string().len())
            .sum())
    }

    pub fn export_app_data(&self) -> BudgetResult<AppDataExport> {
        let entries = self.entries.read().map_err(read_lock_error)?;
        let data = entries
            .iter()
            .filter_map(|(k, v)| k.strip_prefix(KEY_PREFIX).map(|k| (k.to_string(), v.clone())))
            .collect();
        Ok(AppDataExport {
            version: EXPORT_VERSION.to_string(),
            export_date: Utc::now(),
            data,
        })
    }

    /// Replace all data with an export; returns the data that was replaced
    pub fn import_app_data(&self, export: &AppDataExport) -> BudgetResult<AppDataExport> {
        if export.version != EXPORT_VERSION {
            return Err(BudgetError::Import(format!(
                "Unsupported local data version '{}'",
                export.version
            )));
        }

        let backup = self.export_app_data()?;
        self.write_through(|entries| {
            entries.retain(|k, _| !k.starts_with(KEY_PREFIX));
            for (key, value) in &export.data {
                entries.insert(prefixed(key), value.clone());
            }
        })?;

        info!(keys = export.data.len(), "imported local data");
        Ok(backup)
    }

    /// Store a copy of all data under a `backup_<millis>` key
    ///
    /// Only the newest [`MAX_LOCAL_BACKUPS`] are kept.
    pub fn create_backup(&self) -> BudgetResult<String> {
        let now = Utc::now();
        let export = self.export_app_data()?;
        let key = format!("backup_{}", now.timestamp_millis());
        self.save(&key, &export)?;

        let mut backups: Vec<LocalBackupInfo> = self.load_or(BACKUPS_LIST_KEY, Vec::new())?;
        backups.push(LocalBackupInfo {
            key: key.clone(),
            date: now,
            size: self.size()?,
        });
        while backups.len() > MAX_LOCAL_BACKUPS {
            let old = backups.remove(0);
            self.remove(&old.key)?;
        }
        self.save(BACKUPS_LIST_KEY, &backups)?;
        Ok(key)
    }

    pub fn backups(&self) -> BudgetResult<Vec<LocalBackupInfo>> {
        self.load_or(BACKUPS_LIST_KEY, Vec::new())
    }

    pub fn restore_backup(&self, key: &str) -> BudgetResult<AppDataExport> {
        let export: AppDataExport = self
            .load(key)?
            .ok_or_else(|| BudgetError::NotFound {
                entity_type: "Local backup",
                identifier: key.to_string(),
            })?;
        self.import_app_data(&export)
    }

    /// Apply `change` to a copy, write the copy, then make it current.
    /// A failed write leaves memory as it was.
    fn write_through<F>(&self, change: F) -> BudgetResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, Value>),
    {
        let mut entries = self.entries.write().map_err(write_lock_error)?;
        let mut next = entries.clone();
        change(&mut next);
        write_json_atomic(&self.path, &next)?;
        *entries = next;
        Ok(())
    }
}

fn prefixed(key: &str) -> String {
    format!("{}{}", KEY_PREFIX, key)
}
