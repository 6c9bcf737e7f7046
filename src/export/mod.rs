//! Exports of a single budget
//!
//! - CSV: transactions, for spreadsheets
//! - JSON: the budget and all of its documents
//! - YAML: the same document, human readable
//!
//! Category and goal exports live with their services.

pub mod csv;
pub mod json;
pub mod yaml;

pub use csv::{export_transactions_csv, TRANSACTION_HEADERS};
pub use json::{export_full_json, read_export_json, BudgetExport, ExportMetadata, EXPORT_SCHEMA_VERSION};
pub use yaml::{export_full_yaml, read_export_yaml};
