//! User settings
//!
//! Per-machine preferences: theme, display currency, notification and live
//! sync switches, exchange-rate source and backup retention.

use serde::{Deserialize, Serialize};

use super::paths::BudgetPaths;
use crate::error::BudgetError;
use crate::models::Currency;
use crate::storage::file_io::write_json_atomic;

/// Default exchange-rate endpoint (base PLN)
pub const DEFAULT_RATES_ENDPOINT: &str = "https://api.exchangerate-api.com/v4/latest/PLN";

/// Color theme of the TUI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(BudgetError::Validation(format!(
                "Unknown theme '{}'. Use light or dark.",
                other
            ))),
        }
    }
}

/// Backup retention settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRetention {
    /// Number of daily backups to keep
    pub daily_count: u32,
    /// Number of monthly backups to keep
    pub monthly_count: u32,
}

impl Default for BackupRetention {
    fn default() -> Self {
        Self {
            daily_count: 30,
            monthly_count: 12,
        }
    }
}

/// User settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    pub theme: Theme,

    /// Currency amounts are shown in; budgets keep their own currency
    #[serde(default)]
    pub display_currency: Currency,

    /// Show toasts for joined members, new transactions and limit alerts
    #[serde(default = "default_true")]
    pub notifications: bool,

    /// Pick up changes written by other family members while running
    #[serde(default = "default_true")]
    pub auto_sync: bool,

    /// Exchange-rate endpoint returning `{ "rates": { ... } }` with base PLN
    #[serde(default = "default_rates_endpoint")]
    pub rates_endpoint: String,

    /// Minutes before cached exchange rates are refreshed
    #[serde(default = "default_rates_refresh_minutes")]
    pub rates_refresh_minutes: u32,

    /// Backup retention policy
    #[serde(default)]
    pub backup_retention: BackupRetention,

    /// Date format preference (strftime format)
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_rates_endpoint() -> String {
    DEFAULT_RATES_ENDPOINT.to_string()
}

fn default_rates_refresh_minutes() -> u32 {
    60
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            theme: Theme::default(),
            display_currency: Currency::default(),
            notifications: true,
            auto_sync: true,
            rates_endpoint: default_rates_endpoint(),
            rates_refresh_minutes: default_rates_refresh_minutes(),
            backup_retention: BackupRetention::default(),
            date_format: default_date_format(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or defaults if the file doesn't exist
    pub fn load_or_create(paths: &BudgetPaths) -> Result<Self, BudgetError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| BudgetError::Io(format!("Failed to read settings file: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| BudgetError::Config(format!("Failed to parse settings file: {}", e)))
    }

    pub fn save(&self, paths: &BudgetPaths) -> Result<(), BudgetError> {
        paths.ensure_directories()?;
        write_json_atomic(paths.settings_file(), self)
    }

    /// Refresh interval for exchange rates
    pub fn rates_refresh_interval(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.rates_refresh_minutes.max(1)))
    }
}
