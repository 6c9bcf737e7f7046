//! CSV export of a budget's transactions
//!
//! Columns follow the spreadsheet layout families already use:
//! `Date, Type, Amount, Category, Description, User`.

use std::io::Write;

use crate::error::{BudgetError, BudgetResult};
use crate::models::BudgetId;
use crate::storage::Storage;

pub const TRANSACTION_HEADERS: [&str; 6] = ["Date", "Type", "Amount", "Category", "Description", "User"];

/// Export every transaction of a budget, newest booking date first
///
/// Returns the number of rows written.
pub fn export_transactions_csv<W: Write>(
    storage: &Storage,
    budget_id: BudgetId,
    writer: W,
) -> BudgetResult<usize> {
    let budget = storage.budgets.require(budget_id)?;
    let transactions = storage.transactions.by_date(budget_id)?;

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(TRANSACTION_HEADERS).map_err(export_error)?;

    for txn in &transactions {
        // current member name when the member is still in the budget
        let user = budget
            .member(txn.user_id)
            .map(|m| m.name.as_str())
            .unwrap_or(&txn.user_name);
        csv.write_record([
            txn.date.format("%Y-%m-%d").to_string(),
            txn.kind.to_string(),
            txn.amount.to_string(),
            txn.category.clone(),
            txn.description.clone(),
            user.to_string(),
        ])
        .map_err(export_error)?;
    }

    csv.flush()
        .map_err(|e| BudgetError::Export(format!("Failed to write CSV: {}", e)))?;
    Ok(transactions.len())
}

fn export_error(e: csv::Error) -> BudgetError {
    BudgetError::Export(format!("Failed to write CSV: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::BudgetPaths;
    use crate::models::{Currency, Money, TransactionKind, User};
    use crate::services::{BudgetService, NewTransaction, TransactionService};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn test_export_transactions_csv() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::new(BudgetPaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();
        storage.load_all().unwrap();

        let anna = User::new("anna@example.com", "Anna", "hash");
        storage.users.upsert(anna.clone()).unwrap();
        let budget = BudgetService::new(&storage)
            .create_budget(&anna, "Home", Currency::Pln)
            .unwrap();

        let service = TransactionService::new(&storage);
        for (kind, minor, category, description, day) in [
            (TransactionKind::Income, 500_000, "Salary", "March", 1),
            (TransactionKind::Expense, 12_345, "Groceries", "Milk, bread", 5),
        ] {
            service
                .add_transaction(
                    budget.id,
                    &anna,
                    NewTransaction {
                        member: anna.id,
                        kind,
                        amount: Money::from_minor(minor),
                        category: category.into(),
                        description: description.into(),
                        date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
                    },
                )
                .unwrap();
        }

        let mut output = Vec::new();
        let rows = export_transactions_csv(&storage, budget.id, &mut output).unwrap();
        assert_eq!(rows, 2);

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Date,Type,Amount,Category,Description,User");
        assert_eq!(lines[1], "2025-03-05,expense,123.45,Groceries,\"Milk, bread\",Anna");
        assert_eq!(lines[2], "2025-03-01,income,5000.00,Salary,March,Anna");
    }
}
