//! Transaction and statistics formatting

use tabled::Tabled;

use crate::currency::format_money;
use crate::display::format::{percent, progress_bar, truncate};
use crate::display::render_table;
use crate::models::{Currency, Money, Transaction, TransactionKind};
use crate::services::{BudgetStats, CategoryStats, MemberStats};

#[derive(Tabled)]
struct TransactionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Member")]
    member: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Amount")]
    amount: String,
}

#[derive(Tabled)]
struct MemberStatsRow {
    #[tabled(rename = "Member")]
    name: String,
    #[tabled(rename = "Income")]
    income: String,
    #[tabled(rename = "Expenses")]
    expense: String,
    #[tabled(rename = "Balance")]
    balance: String,
    #[tabled(rename = "Count")]
    count: usize,
}

#[derive(Tabled)]
struct CategoryStatsRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Share")]
    share: String,
    #[tabled(rename = "")]
    bar: String,
}

/// Amount with the sign the transaction applies to the balance
pub fn signed_amount(txn: &Transaction, currency: Currency) -> String {
    match txn.kind {
        TransactionKind::Income => format!("+{}", format_money(txn.amount, currency)),
        TransactionKind::Expense => format!("-{}", format_money(txn.amount, currency)),
    }
}

pub fn format_transaction_list(transactions: &[Transaction], currency: Currency) -> String {
    if transactions.is_empty() {
        return "No transactions found.".to_string();
    }

    let rows = transactions
        .iter()
        .map(|t| TransactionRow {
            id: t.id.to_string(),
            date: t.date.format("%Y-%m-%d").to_string(),
            member: t.user_name.clone(),
            category: t.category.clone(),
            description: truncate(&t.description, 30),
            amount: signed_amount(t, currency),
        })
        .collect();
    render_table(rows)
}

pub fn format_transaction_details(txn: &Transaction, currency: Currency) -> String {
    let mut output = String::new();
    output.push_str(&format!("Transaction: {}\n", txn.id));
    output.push_str(&format!("Date:        {}\n", txn.date.format("%Y-%m-%d")));
    output.push_str(&format!("Type:        {}\n", txn.kind));
    output.push_str(&format!("Amount:      {}\n", signed_amount(txn, currency)));
    output.push_str(&format!("Category:    {}\n", txn.category));
    output.push_str(&format!("Member:      {}\n", txn.user_name));
    if !txn.description.is_empty() {
        output.push_str(&format!("Description: {}\n", txn.description));
    }
    output.push_str(&format!(
        "Recorded:    {}\n",
        txn.created_at.format("%Y-%m-%d %H:%M")
    ));
    output
}

/// Period totals, then members, then expense categories
pub fn format_stats(
    stats: &BudgetStats,
    members: &[MemberStats],
    categories: &[CategoryStats],
    currency: Currency,
) -> String {
    let mut output = String::new();
    match &stats.range {
        Some(range) => output.push_str(&format!("{} ({})\n", stats.period.label(), range)),
        None => output.push_str(&format!("{}\n", stats.period.label())),
    }
    output.push_str(&format!("Income:   {}\n", format_money(stats.income, currency)));
    output.push_str(&format!("Expenses: {}\n", format_money(stats.expense, currency)));
    output.push_str(&format!("Balance:  {}\n", format_money(stats.balance, currency)));
    output.push_str(&format!("Transactions: {}\n", stats.count));

    if !members.is_empty() {
        output.push('\n');
        output.push_str(&render_table(
            members
                .iter()
                .map(|m| MemberStatsRow {
                    name: m.name.clone(),
                    income: format_money(m.income, currency),
                    expense: format_money(m.expense, currency),
                    balance: format_money(m.balance, currency),
                    count: m.count,
                })
                .collect(),
        ));
    }

    if !categories.is_empty() {
        output.push_str("\n\n");
        output.push_str(&format_category_stats(categories, currency));
    }
    output
}

pub fn format_category_stats(categories: &[CategoryStats], currency: Currency) -> String {
    let total: Money = categories.iter().map(|c| c.total).sum();
    let mut rows: Vec<CategoryStatsRow> = categories
        .iter()
        .map(|c| CategoryStatsRow {
            category: c.category.clone(),
            total: format_money(c.total, currency),
            share: percent(c.percent),
            bar: progress_bar(c.percent, 20),
        })
        .collect();
    rows.push(CategoryStatsRow {
        category: "Total".to_string(),
        total: format_money(total, currency),
        share: String::new(),
        bar: String::new(),
    });
    render_table(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BudgetId, StatsPeriod, UserId};
    use chrono::NaiveDate;

    fn txn(kind: TransactionKind, minor: i64) -> Transaction {
        let user = UserId::new();
        Transaction::new(
            BudgetId::new(),
            user,
            "Anna",
            kind,
            Money::from_minor(minor),
            "Groceries",
            NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
            user,
        )
        .with_description("Weekly shopping")
    }

    #[test]
    fn test_list_shows_signed_amounts() {
        let text = format_transaction_list(
            &[txn(TransactionKind::Expense, 12_345), txn(TransactionKind::Income, 500)],
            Currency::Usd,
        );
        assert!(text.contains("-$123.45"));
        assert!(text.contains("+$5.00"));
        assert!(text.contains("Weekly shopping"));
        assert!(text.contains("2025-03-05"));
    }

    #[test]
    fn test_stats_block() {
        let stats = BudgetStats {
            period: StatsPeriod::All,
            range: None,
            income: Money::from_minor(100_000),
            expense: Money::from_minor(25_000),
            balance: Money::from_minor(75_000),
            count: 3,
        };
        let categories = vec![CategoryStats {
            category: "Groceries".into(),
            total: Money::from_minor(25_000),
            count: 2,
            percent: 100.0,
        }];
        let text = format_stats(&stats, &[], &categories, Currency::Pln);
        assert!(text.contains("Income:   1 000,00 zł"));
        assert!(text.contains("Balance:  750,00 zł"));
        assert!(text.contains("Groceries"));
        assert!(text.contains("100%"));
    }
}
