//! JSON export of one budget with everything that hangs off it

use std::collections::HashSet;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BudgetError, BudgetResult};
use crate::models::{Budget, BudgetId, Category, Goal, Limit, Transaction};
use crate::storage::Storage;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// A budget and all of its documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetExport {
    pub schema_version: String,
    pub exported_at: DateTime<Utc>,
    pub app_version: String,
    pub budget: Budget,
    pub categories: Vec<Category>,
    pub transactions: Vec<Transaction>,
    pub goals: Vec<Goal>,
    pub limits: Vec<Limit>,
    pub metadata: ExportMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub member_count: usize,
    pub transaction_count: usize,
    pub category_count: usize,
    pub goal_count: usize,
    pub limit_count: usize,

    /// Earliest booking date
    pub earliest_transaction: Option<String>,
    /// Latest booking date
    pub latest_transaction: Option<String>,
}

impl BudgetExport {
    pub fn from_storage(storage: &Storage, budget_id: BudgetId) -> BudgetResult<Self> {
        let budget = storage.budgets.require(budget_id)?;
        let categories = storage.categories.for_budget(budget_id)?;
        let transactions = storage.transactions.by_date(budget_id)?;
        let goals = storage.goals.for_budget(budget_id)?;
        let limits = storage.limits.for_budget(budget_id)?;

        let metadata = ExportMetadata {
            member_count: budget.members.len(),
            transaction_count: transactions.len(),
            category_count: categories.len(),
            goal_count: goals.len(),
            limit_count: limits.len(),
            earliest_transaction: transactions.iter().map(|t| t.date).min().map(|d| d.to_string()),
            latest_transaction: transactions.iter().map(|t| t.date).max().map(|d| d.to_string()),
        };

        Ok(Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            budget,
            categories,
            transactions,
            goals,
            limits,
            metadata,
        })
    }

    /// Check the export is internally consistent
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                EXPORT_SCHEMA_VERSION, self.schema_version
            ));
        }

        let budget_id = self.budget.id;
        let categories: HashSet<String> = self.categories.iter().map(|c| c.name.to_lowercase()).collect();

        for txn in &self.transactions {
            if txn.budget_id != budget_id {
                return Err(format!("Transaction {} belongs to another budget", txn.id));
            }
            if !categories.contains(&txn.category.to_lowercase()) {
                return Err(format!(
                    "Transaction {} references unknown category '{}'",
                    txn.id, txn.category
                ));
            }
        }
        for limit in &self.limits {
            if !categories.contains(&limit.category.to_lowercase()) {
                return Err(format!("Limit references unknown category '{}'", limit.category));
            }
        }
        if self.goals.iter().any(|g| g.budget_id != budget_id) {
            return Err("A goal belongs to another budget".into());
        }

        if !self.budget.totals_consistent() {
            return Err(format!(
                "Budget total {} does not match member balances",
                self.budget.total_balance
            ));
        }
        Ok(())
    }
}

pub fn export_full_json<W: Write>(storage: &Storage, budget_id: BudgetId, writer: W) -> BudgetResult<()> {
    let export = BudgetExport::from_storage(storage, budget_id)?;
    serde_json::to_writer_pretty(writer, &export)
        .map_err(|e| BudgetError::Export(format!("Failed to write JSON: {}", e)))
}

/// Read an export back and check it
pub fn read_export_json(json: &str) -> BudgetResult<BudgetExport> {
    let export: BudgetExport =
        serde_json::from_str(json).map_err(|e| BudgetError::Import(e.to_string()))?;
    export.validate().map_err(BudgetError::Import)?;
    Ok(export)
}
