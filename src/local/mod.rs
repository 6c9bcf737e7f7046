//! Machine-local data that is not shared with the family
//!
//! Preferences, cached exchange rates and unfinished form drafts live in
//! `local.json` next to the session file.

mod cache;
mod store;

pub use cache::{DEFAULT_CACHE_TTL_MINUTES, DRAFT_MAX_AGE_HOURS};
pub use store::{AppDataExport, LocalBackupInfo, LocalStore, EXPORT_VERSION, KEY_PREFIX, MAX_LOCAL_BACKUPS};
