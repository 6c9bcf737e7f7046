//! Savings goal formatting

use chrono::NaiveDate;
use tabled::Tabled;

use crate::currency::format_money;
use crate::display::format::{percent, progress_bar};
use crate::display::render_table;
use crate::models::{Currency, Goal};
use crate::services::GoalStats;

#[derive(Tabled)]
struct GoalRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Goal")]
    name: String,
    #[tabled(rename = "Saved")]
    saved: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Progress")]
    progress: String,
    #[tabled(rename = "Deadline")]
    deadline: String,
}

/// Deadline text: "done", "overdue" or days left
pub fn deadline_label(goal: &Goal, today: NaiveDate) -> String {
    if goal.completed {
        return "done".to_string();
    }
    if goal.is_overdue(today) {
        return format!("{} (overdue)", goal.deadline.format("%Y-%m-%d"));
    }
    let days = goal.days_left(today);
    match days {
        0 => format!("{} (today)", goal.deadline.format("%Y-%m-%d")),
        1 => format!("{} (1 day)", goal.deadline.format("%Y-%m-%d")),
        _ => format!("{} ({} days)", goal.deadline.format("%Y-%m-%d"), days),
    }
}

pub fn format_goal_list(goals: &[Goal], currency: Currency, today: NaiveDate) -> String {
    if goals.is_empty() {
        return "No goals yet. Add one with 'famb goal add'.".to_string();
    }
    render_table(
        goals
            .iter()
            .map(|g| GoalRow {
                id: g.id.to_string(),
                name: g.name.clone(),
                saved: format_money(g.current_amount, currency),
                target: format_money(g.target_amount, currency),
                progress: format!(
                    "{} {}",
                    progress_bar(g.progress_percent(), 12),
                    percent(g.progress_percent())
                ),
                deadline: deadline_label(g, today),
            })
            .collect(),
    )
}

pub fn format_goal_stats(stats: &GoalStats, currency: Currency) -> String {
    format!(
        "Goals:     {} ({} active, {} completed, {} overdue)\n\
         Saved:     {} of {}\n\
         Progress:  {} {}\n",
        stats.total,
        stats.active,
        stats.completed,
        stats.overdue,
        format_money(stats.saved_total, currency),
        format_money(stats.target_total, currency),
        progress_bar(stats.percent, 20),
        percent(stats.percent)
    )
}
