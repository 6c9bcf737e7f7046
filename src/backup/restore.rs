//! Restoring the data directory from a backup archive

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::info;

use crate::config::paths::BudgetPaths;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{Budget, Category, Goal, Limit, Transaction, User};
use crate::storage::write_json_atomic;

use super::manager::{BackupArchive, BACKUP_SCHEMA_VERSION};

/// Collection file shape; only used to check that a section parses
#[derive(Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct Section<T> {
    #[serde(default = "Vec::new")]
    documents: Vec<T>,
}

pub struct RestoreManager {
    paths: BudgetPaths,
}

impl RestoreManager {
    pub fn new(paths: BudgetPaths) -> Self {
        Self { paths }
    }

    /// Replace the data files with the contents of a backup
    ///
    /// The archive is validated in full before any file is written. Open
    /// stores must call `load_all` afterwards.
    pub fn restore_from_file(&self, backup_path: &Path) -> BudgetResult<RestoreResult> {
        let archive = read_archive(backup_path)?;
        self.restore_from_archive(&archive)
    }

    pub fn restore_from_archive(&self, archive: &BackupArchive) -> BudgetResult<RestoreResult> {
        let validation = validate_archive(archive)?;
        self.paths.ensure_directories()?;

        let mut result = RestoreResult {
            schema_version: archive.schema_version,
            backup_date: archive.created_at,
            restored: Vec::new(),
        };
        for (name, value, path) in self.sections(archive) {
            if value.is_null() {
                continue;
            }
            write_json_atomic(&path, value)?;
            result.restored.push(name);
        }

        info!(
            restored = result.restored.len(),
            documents = validation.documents,
            "backup restored"
        );
        Ok(result)
    }

    /// Check a backup file without restoring it
    pub fn validate_backup(&self, backup_path: &Path) -> BudgetResult<ValidationResult> {
        validate_archive(&read_archive(backup_path)?)
    }

    fn sections<'b>(&self, archive: &'b BackupArchive) -> [(&'static str, &'b serde_json::Value, PathBuf); 6] {
        [
            ("users", &archive.users, self.paths.users_file()),
            ("budgets", &archive.budgets, self.paths.budgets_file()),
            ("transactions", &archive.transactions, self.paths.transactions_file()),
            ("categories", &archive.categories, self.paths.categories_file()),
            ("goals", &archive.goals, self.paths.goals_file()),
            ("limits", &archive.limits, self.paths.limits_file()),
        ]
    }
}

fn read_archive(backup_path: &Path) -> BudgetResult<BackupArchive> {
    let contents = fs::read_to_string(backup_path)
        .map_err(|e| BudgetError::Io(format!("Failed to read backup file: {}", e)))?;
    serde_json::from_str(&contents)
        .map_err(|e| BudgetError::Json(format!("Failed to parse backup file: {}", e)))
}

/// Number of documents in a section, or `None` when the section is absent
fn count_section<T: DeserializeOwned>(name: &str, value: &serde_json::Value) -> BudgetResult<Option<usize>> {
    if value.is_null() {
        return Ok(None);
    }
    let section: Section<T> = serde_json::from_value(value.clone())
        .map_err(|e| BudgetError::Validation(format!("Backup section '{}' is invalid: {}", name, e)))?;
    Ok(Some(section.documents.len()))
}

fn validate_archive(archive: &BackupArchive) -> BudgetResult<ValidationResult> {
    if archive.schema_version > BACKUP_SCHEMA_VERSION {
        return Err(BudgetError::Validation(format!(
            "Backup schema version {} is newer than this program supports",
            archive.schema_version
        )));
    }

    let counts = [
        ("users", count_section::<User>("users", &archive.users)?),
        ("budgets", count_section::<Budget>("budgets", &archive.budgets)?),
        (
            "transactions",
            count_section::<Transaction>("transactions", &archive.transactions)?,
        ),
        ("categories", count_section::<Category>("categories", &archive.categories)?),
        ("goals", count_section::<Goal>("goals", &archive.goals)?),
        ("limits", count_section::<Limit>("limits", &archive.limits)?),
    ];

    let mut present = Vec::new();
    let mut missing = Vec::new();
    let mut documents = 0;
    for (name, count) in counts {
        match count {
            Some(n) => {
                documents += n;
                present.push(name);
            }
            None => missing.push(name),
        }
    }

    Ok(ValidationResult {
        schema_version: archive.schema_version,
        backup_date: archive.created_at,
        documents,
        present,
        missing,
    })
}

#[derive(Debug)]
pub struct RestoreResult {
    pub schema_version: u32,
    pub backup_date: DateTime<Utc>,
    /// Collections written back, in restore order
    pub restored: Vec<&'static str>,
}

impl RestoreResult {
    pub fn all_restored(&self) -> bool {
        self.restored.len() == 6
    }

    pub fn summary(&self) -> String {
        format!("Restored: {}", self.restored.join(", "))
    }
}

#[derive(Debug)]
pub struct ValidationResult {
    pub schema_version: u32,
    pub backup_date: DateTime<Utc>,
    /// Documents across all present collections
    pub documents: usize,
    pub present: Vec<&'static str>,
    pub missing: Vec<&'static str>,
}

impl ValidationResult {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.is_complete() {
            format!(
                "Complete backup (v{}), {} documents",
                self.schema_version, self.documents
            )
        } else {
            format!(
                "Partial backup (v{}): has {}, missing {}",
                self.schema_version,
                self.present.join(", "),
                self.missing.join(", ")
            )
        }
    }
}
