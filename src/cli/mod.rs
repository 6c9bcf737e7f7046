//! CLI command handlers
//!
//! Each submodule pairs a clap subcommand enum (or args struct) with a
//! handler that runs it against a [`CliContext`].

pub mod auth;
pub mod backup;
pub mod budget;
pub mod category;
pub mod context;
pub mod export;
pub mod goal;
pub mod history;
pub mod limit;
pub mod local;
pub mod rates;
pub mod settings;
pub mod transaction;
pub mod watch;

pub use auth::{
    handle_login, handle_logout, handle_profile, handle_register, handle_whoami, LoginArgs,
    ProfileArgs, RegisterArgs,
};
pub use backup::{handle_backup_command, BackupCommands};
pub use budget::{handle_budget_command, BudgetCommands};
pub use category::{handle_category_command, CategoryCommands};
pub use context::CliContext;
pub use export::{handle_export, ExportArgs, ExportFormat};
pub use goal::{handle_goal_command, GoalCommands};
pub use history::{handle_history, HistoryArgs};
pub use limit::{handle_limit_command, LimitCommands};
pub use local::{handle_local_command, LocalCommands};
pub use rates::{handle_rates_command, RatesCommands};
pub use settings::{handle_settings_command, SettingsCommands};
pub use transaction::{handle_transaction_command, TransactionCommands};
pub use watch::{handle_watch, WatchArgs};
