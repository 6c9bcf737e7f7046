//! Rolling backups of the shared data directory
//!
//! Every backup is one dated JSON archive holding all six collection files.
//! The first backup taken on the first day of a month counts as a monthly
//! backup and is kept under the longer monthly retention.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::paths::BudgetPaths;
use crate::config::settings::BackupRetention;
use crate::error::{BudgetError, BudgetResult};

/// Current archive layout version
pub const BACKUP_SCHEMA_VERSION: u32 = 1;

/// Metadata about a backup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupInfo {
    pub filename: String,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
    /// Kept under the monthly retention
    pub is_monthly: bool,
}

/// Backup archive format
#[derive(Debug, Serialize, Deserialize)]
pub struct BackupArchive {
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub users: serde_json::Value,
    #[serde(default)]
    pub budgets: serde_json::Value,
    #[serde(default)]
    pub transactions: serde_json::Value,
    #[serde(default)]
    pub categories: serde_json::Value,
    #[serde(default)]
    pub goals: serde_json::Value,
    #[serde(default)]
    pub limits: serde_json::Value,
}

/// Manages backup creation and retention
pub struct BackupManager {
    backup_dir: PathBuf,
    paths: BudgetPaths,
    retention: BackupRetention,
}

impl BackupManager {
    pub fn new(paths: BudgetPaths, retention: BackupRetention) -> Self {
        let backup_dir = paths.backup_dir();
        Self {
            backup_dir,
            paths,
            retention,
        }
    }

    /// Write a backup of every collection; returns the archive path
    pub fn create_backup(&self) -> BudgetResult<PathBuf> {
        fs::create_dir_all(&self.backup_dir)
            .map_err(|e| BudgetError::Io(format!("Failed to create backup directory: {}", e)))?;

        let now = Utc::now();
        let filename = format!(
            "backup-{}-{:03}.json",
            now.format("%Y%m%d-%H%M%S"),
            now.timestamp_subsec_millis()
        );
        let backup_path = self.backup_dir.join(&filename);

        let archive = self.create_archive(now)?;
        let json = serde_json::to_string_pretty(&archive)
            .map_err(|e| BudgetError::Json(format!("Failed to serialize backup: {}", e)))?;
        fs::write(&backup_path, json)
            .map_err(|e| BudgetError::Io(format!("Failed to write backup file: {}", e)))?;

        info!(path = %backup_path.display(), "backup created");
        Ok(backup_path)
    }

    fn create_archive(&self, timestamp: DateTime<Utc>) -> BudgetResult<BackupArchive> {
        Ok(BackupArchive {
            schema_version: BACKUP_SCHEMA_VERSION,
            created_at: timestamp,
            users: read_json_value(&self.paths.users_file())?,
            budgets: read_json_value(&self.paths.budgets_file())?,
            transactions: read_json_value(&self.paths.transactions_file())?,
            categories: read_json_value(&self.paths.categories_file())?,
            goals: read_json_value(&self.paths.goals_file())?,
            limits: read_json_value(&self.paths.limits_file())?,
        })
    }

    /// All backups, newest first
    pub fn list_backups(&self) -> BudgetResult<Vec<BackupInfo>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        for entry in fs::read_dir(&self.backup_dir)
            .map_err(|e| BudgetError::Io(format!("Failed to read backup directory: {}", e)))?
        {
            let entry =
                entry.map_err(|e| BudgetError::Io(format!("Failed to read directory entry: {}", e)))?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                if let Some(info) = parse_backup_info(&path) {
                    backups.push(info);
                }
            }
        }

        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        mark_monthly(&mut backups);
        Ok(backups)
    }

    /// Delete backups beyond the retention counts
    pub fn enforce_retention(&self) -> BudgetResult<Vec<PathBuf>> {
        let (monthly, daily): (Vec<_>, Vec<_>) =
            self.list_backups()?.into_iter().partition(|b| b.is_monthly);

        let expired = daily
            .into_iter()
            .skip(self.retention.daily_count as usize)
            .chain(monthly.into_iter().skip(self.retention.monthly_count as usize));

        let mut deleted = Vec::new();
        for backup in expired {
            if let Err(e) = fs::remove_file(&backup.path) {
                warn!(path = %backup.path.display(), error = %e, "failed to delete old backup");
                continue;
            }
            deleted.push(backup.path);
        }
        if !deleted.is_empty() {
            info!(count = deleted.len(), "old backups removed");
        }
        Ok(deleted)
    }

    pub fn create_backup_with_retention(&self) -> BudgetResult<(PathBuf, Vec<PathBuf>)> {
        let backup_path = self.create_backup()?;
        let deleted = self.enforce_retention()?;
        Ok((backup_path, deleted))
    }

    pub fn backup_dir(&self) -> &PathBuf {
        &self.backup_dir
    }

    /// Find a backup by file name or unique name prefix
    pub fn get_backup(&self, name: &str) -> BudgetResult<Option<BackupInfo>> {
        let mut matches: Vec<BackupInfo> = self
            .list_backups()?
            .into_iter()
            .filter(|b| b.filename == name || b.filename.starts_with(name))
            .collect();
        if let Some(exact) = matches.iter().position(|b| b.filename == name) {
            return Ok(Some(matches.swap_remove(exact)));
        }
        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            _ => Err(BudgetError::Validation(format!(
                "'{}' matches {} backups; type more of the name",
                name,
                matches.len()
            ))),
        }
    }

    pub fn get_latest_backup(&self) -> BudgetResult<Option<BackupInfo>> {
        Ok(self.list_backups()?.into_iter().next())
    }
}

/// The oldest backup dated on the 1st of each month is a monthly one
fn mark_monthly(backups: &mut [BackupInfo]) {
    let mut seen: Vec<(i32, u32)> = Vec::new();
    for backup in backups.iter_mut().rev() {
        let key = (backup.created_at.year(), backup.created_at.month());
        backup.is_monthly = backup.created_at.day() == 1 && !seen.contains(&key);
        if backup.is_monthly {
            seen.push(key);
        }
    }
}

fn parse_backup_info(path: &Path) -> Option<BackupInfo> {
    let filename = path.file_name()?.to_string_lossy().to_string();
    let date_part = filename.strip_prefix("backup-")?.strip_suffix(".json")?;
    let created_at = parse_backup_timestamp(date_part)?;
    let size_bytes = fs::metadata(path).ok()?.len();

    Some(BackupInfo {
        filename,
        path: path.to_path_buf(),
        created_at,
        size_bytes,
        is_monthly: false,
    })
}

/// A collection file as a generic value; missing files become `null`
fn read_json_value(path: &Path) -> BudgetResult<serde_json::Value> {
    if !path.exists() {
        return Ok(serde_json::Value::Null);
    }
    let contents = fs::read_to_string(path)
        .map_err(|e| BudgetError::Io(format!("Failed to read file for backup: {}", e)))?;
    serde_json::from_str(&contents)
        .map_err(|e| BudgetError::Json(format!("Failed to parse {} for backup: {}", path.display(), e)))
}

/// `YYYYMMDD-HHMMSS` with an optional `-mmm` millisecond suffix
fn parse_backup_timestamp(date_str: &str) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = date_str.split('-').collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }
    let (date_part, time_part) = (parts[0], parts[1]);
    let millis: u32 = parts.get(2).and_then(|m| m.parse().ok()).unwrap_or(0);

    if date_part.len() != 8 || time_part.len() != 6 {
        return None;
    }

    let date = NaiveDate::from_ymd_opt(
        date_part[0..4].parse().ok()?,
        date_part[4..6].parse().ok()?,
        date_part[6..8].parse().ok()?,
    )?;
    let time = chrono::NaiveTime::from_hms_milli_opt(
        time_part[0..2].parse().ok()?,
        time_part[2..4].parse().ok()?,
        time_part[4..6].parse().ok()?,
        millis,
    )?;

    Some(DateTime::from_naive_utc_and_offset(
        chrono::NaiveDateTime::new(date, time),
        Utc,
    ))
}
