//! Category formatting

use tabled::Tabled;

use crate::currency::format_money;
use crate::display::render_table;
use crate::models::{Category, Currency};
use crate::services::CategoryUsage;

#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "")]
    icon: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Color")]
    color: String,
}

#[derive(Tabled)]
struct UsageRow {
    #[tabled(rename = "")]
    icon: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Used")]
    count: usize,
    #[tabled(rename = "Total")]
    total: String,
}

pub fn format_category_list(categories: &[Category]) -> String {
    if categories.is_empty() {
        return "No categories found.".to_string();
    }
    render_table(
        categories
            .iter()
            .map(|c| CategoryRow {
                icon: c.icon.clone(),
                name: c.name.clone(),
                kind: c.kind.to_string(),
                color: c.color.clone(),
            })
            .collect(),
    )
}

/// Categories with how often and how much they were used
pub fn format_category_usage(usage: &[CategoryUsage], currency: Currency) -> String {
    if usage.is_empty() {
        return "No categories found.".to_string();
    }
    render_table(
        usage
            .iter()
            .map(|u| UsageRow {
                icon: u.category.icon.clone(),
                name: u.category.name.clone(),
                kind: u.category.kind.to_string(),
                count: u.count,
                total: format_money(u.total, currency),
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BudgetId, Money, TransactionKind};

    #[test]
    fn test_usage_table() {
        let category = Category::new(BudgetId::new(), "Groceries", TransactionKind::Expense);
        let text = format_category_usage(
            &[CategoryUsage {
                category,
                count: 4,
                total: Money::from_minor(8_050),
            }],
            Currency::Eur,
        );
        assert!(text.contains("Groceries"));
        assert!(text.contains("expense"));
        assert!(text.contains("80,50 €"));
    }
}
