//! Budget, member and invite formatting

use tabled::Tabled;

use crate::currency::format_money;
use crate::display::format::{count_label, initials};
use crate::display::render_table;
use crate::models::{Budget, BudgetId, MAX_MEMBERS};
use crate::services::InviteInfo;

#[derive(Tabled)]
struct BudgetRow {
    #[tabled(rename = "")]
    current: &'static str,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Members")]
    members: String,
    #[tabled(rename = "Currency")]
    currency: String,
    #[tabled(rename = "Balance")]
    balance: String,
    #[tabled(rename = "Invite code")]
    invite_code: String,
}

#[derive(Tabled)]
struct MemberRow {
    #[tabled(rename = "")]
    initials: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Income")]
    income: String,
    #[tabled(rename = "Expenses")]
    expenses: String,
    #[tabled(rename = "Balance")]
    balance: String,
}

/// Budgets the user belongs to; `current` is marked with `*`
pub fn format_budget_list(budgets: &[Budget], current: Option<BudgetId>) -> String {
    if budgets.is_empty() {
        return "No budgets yet.\n\nRun 'famb budget create <name>' or 'famb budget join <code>'.".to_string();
    }

    let rows = budgets
        .iter()
        .map(|b| BudgetRow {
            current: if Some(b.id) == current { "*" } else { "" },
            name: b.name.clone(),
            members: format!("{}/{}", b.members.len(), MAX_MEMBERS),
            currency: b.currency.to_string(),
            balance: format_money(b.total_balance, b.currency),
            invite_code: b.invite_code.clone(),
        })
        .collect();
    render_table(rows)
}

pub fn format_member_table(budget: &Budget) -> String {
    let rows = budget
        .members
        .iter()
        .map(|m| MemberRow {
            initials: initials(&m.name),
            name: m.name.clone(),
            role: m.role.to_string(),
            income: format_money(m.income, budget.currency),
            expenses: format_money(m.expenses, budget.currency),
            balance: format_money(m.balance, budget.currency),
        })
        .collect();
    render_table(rows)
}

pub fn format_budget_details(budget: &Budget) -> String {
    let mut output = String::new();
    output.push_str(&format!("Budget:      {}\n", budget.name));
    if !budget.description.is_empty() {
        output.push_str(&format!("Description: {}\n", budget.description));
    }
    output.push_str(&format!("Currency:    {} ({})\n", budget.currency, budget.currency.name()));
    output.push_str(&format!("Invite code: {}\n", budget.invite_code));
    output.push_str(&format!(
        "Total:       {}\n",
        format_money(budget.total_balance, budget.currency)
    ));
    output.push('\n');
    output.push_str(&format_member_table(budget));
    if !budget.is_full() {
        output.push_str(&format!(
            "\n{} left. Share the invite code to add family members.",
            count_label(budget.open_slots(), "open slot", "open slots")
        ));
    }
    output
}

pub fn format_invite(info: &InviteInfo) -> String {
    if !info.can_invite() {
        return format!(
            "Budget '{}' is full ({} of {} members).",
            info.budget_name, info.members, MAX_MEMBERS
        );
    }
    format!(
        "Invite code for '{}': {}\n{} left. Others join with 'famb budget join {}'.",
        info.budget_name,
        info.invite_code,
        count_label(info.open_slots, "slot", "slots"),
        info.invite_code
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Currency, User};

    #[test]
    fn test_details_show_members_and_slots() {
        let anna = User::new("anna@example.com", "Anna Nowak", "h");
        let budget = Budget::new("Home", &anna, Currency::Pln);

        let text = format_budget_details(&budget);
        assert!(text.contains("Anna Nowak"));
        assert!(text.contains("AN"));
        assert!(text.contains("owner"));
        assert!(text.contains(&budget.invite_code));
        assert!(text.contains("3 open slots left"));
    }

    #[test]
    fn test_list_marks_current_budget() {
        let anna = User::new("anna@example.com", "Anna", "h");
        let budget = Budget::new("Home", &anna, Currency::Usd);
        let text = format_budget_list(std::slice::from_ref(&budget), Some(budget.id));
        assert!(text.contains("*"));
        assert!(text.contains("1/4"));
        assert!(text.contains("$0.00"));

        assert!(format_budget_list(&[], None).contains("No budgets yet"));
    }
}
