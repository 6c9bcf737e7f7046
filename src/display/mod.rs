//! Terminal formatting for the CLI
//!
//! One module per document type builds `tabled` tables and detail blocks;
//! [`format`] holds the small text helpers the TUI shares.

pub mod budget;
pub mod category;
pub mod format;
pub mod goal;
pub mod limit;
pub mod transaction;

pub use budget::{format_budget_details, format_budget_list, format_invite, format_member_table};
pub use category::{format_category_list, format_category_usage};
pub use goal::{deadline_label, format_goal_list, format_goal_stats};
pub use limit::{format_limit_alert, format_limit_list, status_marker};
pub use transaction::{
    format_category_stats, format_stats, format_transaction_details, format_transaction_list, signed_amount,
};

use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Rounded table over `rows`
pub(crate) fn render_table<T: Tabled>(rows: Vec<T>) -> String {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}
