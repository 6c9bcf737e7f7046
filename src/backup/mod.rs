//! Rolling backups of the shared data directory
//!
//! [`BackupManager`] writes dated archives of all six collections and prunes
//! them according to [`BackupRetention`](crate::config::settings::BackupRetention).
//! [`RestoreManager`] validates an archive and writes it back atomically.
//!
//! By default the last 30 daily backups and 12 monthly backups are kept.

mod manager;
mod restore;

pub use manager::{BackupArchive, BackupInfo, BackupManager, BACKUP_SCHEMA_VERSION};
pub use restore::{RestoreManager, RestoreResult, ValidationResult};
