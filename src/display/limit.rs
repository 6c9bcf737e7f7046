//! Spending limit formatting

use tabled::Tabled;

use crate::currency::format_money;
use crate::display::format::{percent, progress_bar};
use crate::display::render_table;
use crate::models::{Currency, LimitStatus, LimitUsage};

#[derive(Tabled)]
struct LimitRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Period")]
    period: String,
    #[tabled(rename = "Spent")]
    spent: String,
    #[tabled(rename = "Limit")]
    amount: String,
    #[tabled(rename = "Used")]
    used: String,
    #[tabled(rename = "Status")]
    status: String,
}

pub fn status_marker(status: LimitStatus) -> &'static str {
    match status {
        LimitStatus::Ok => "ok",
        LimitStatus::Warning => "! close",
        LimitStatus::Exceeded => "!! over",
    }
}

pub fn format_limit_list(usage: &[LimitUsage], currency: Currency) -> String {
    if usage.is_empty() {
        return "No spending limits set.".to_string();
    }
    render_table(
        usage
            .iter()
            .map(|u| LimitRow {
                id: u.limit.id.to_string(),
                category: u.limit.category.clone(),
                period: u.limit.period.to_string(),
                spent: format_money(u.spent, currency),
                amount: format_money(u.limit.amount, currency),
                used: format!("{} {}", progress_bar(u.percent, 10), percent(u.percent)),
                status: status_marker(u.status).to_string(),
            })
            .collect(),
    )
}

/// One-line alert for a limit at or above the warning threshold
pub fn format_limit_alert(usage: &LimitUsage, currency: Currency) -> String {
    match usage.status {
        LimitStatus::Exceeded => format!(
            "Limit exceeded for {}: spent {} of {} ({})",
            usage.limit.category,
            format_money(usage.spent, currency),
            format_money(usage.limit.amount, currency),
            usage.limit.period
        ),
        _ => format!(
            "{} is at {} of its {} limit ({} left)",
            usage.limit.category,
            percent(usage.percent),
            usage.limit.period,
            format_money(usage.remaining, currency)
        ),
    }
}
