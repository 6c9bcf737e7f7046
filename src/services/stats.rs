//! Statistics over a budget's transactions

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::BudgetResult;
use crate::models::{BudgetId, DateRange, Money, StatsPeriod, Transaction, TransactionKind, UserId};
use crate::storage::{Storage, TransactionQuery};

pub struct StatsService<'a> {
    storage: &'a Storage,
}

/// Income and expense totals for a period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetStats {
    pub period: StatsPeriod,
    pub range: Option<DateRange>,
    pub income: Money,
    pub expense: Money,
    pub balance: Money,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberStats {
    pub user_id: UserId,
    pub name: String,
    pub income: Money,
    pub expense: Money,
    pub balance: Money,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub category: String,
    pub total: Money,
    pub count: usize,
    /// Share of all amounts of this kind in the period
    pub percent: f64,
}

impl<'a> StatsService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn budget_stats(
        &self,
        budget_id: BudgetId,
        period: StatsPeriod,
        today: NaiveDate,
    ) -> BudgetResult<BudgetStats> {
        let range = period.range(today);
        let transactions = self.in_period(budget_id, range)?;
        let (income, expense) = totals(&transactions);
        Ok(BudgetStats {
            period,
            range,
            income,
            expense,
            balance: income - expense,
            count: transactions.len(),
        })
    }

    /// Totals per current member, in member order
    pub fn by_member(
        &self,
        budget_id: BudgetId,
        period: StatsPeriod,
        today: NaiveDate,
    ) -> BudgetResult<Vec<MemberStats>> {
        let budget = self.storage.budgets.require(budget_id)?;
        let transactions = self.in_period(budget_id, period.range(today))?;

        Ok(budget
            .members
            .iter()
            .map(|member| {
                let own: Vec<Transaction> = transactions
                    .iter()
                    .filter(|t| t.user_id == member.user_id)
                    .cloned()
                    .collect();
                let (income, expense) = totals(&own);
                MemberStats {
                    user_id: member.user_id,
                    name: member.name.clone(),
                    income,
                    expense,
                    balance: income - expense,
                    count: own.len(),
                }
            })
            .collect())
    }

    /// Totals per category for one kind, largest first
    pub fn by_category(
        &self,
        budget_id: BudgetId,
        kind: TransactionKind,
        period: StatsPeriod,
        today: NaiveDate,
    ) -> BudgetResult<Vec<CategoryStats>> {
        let transactions = self.in_period(budget_id, period.range(today))?;

        let mut grouped: HashMap<String, CategoryStats> = HashMap::new();
        let mut grand_total = Money::zero();
        for txn in transactions.iter().filter(|t| t.kind == kind) {
            grand_total += txn.amount;
            let entry = grouped
                .entry(txn.category.to_lowercase())
                .or_insert_with(|| CategoryStats {
                    category: txn.category.clone(),
                    total: Money::zero(),
                    count: 0,
                    percent: 0.0,
                });
            entry.total += txn.amount;
            entry.count += 1;
        }

        let mut stats: Vec<CategoryStats> = grouped
            .into_values()
            .map(|mut s| {
                s.percent = s.total.percent_of(grand_total);
                s
            })
            .collect();
        stats.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
        Ok(stats)
    }

    fn in_period(&self, budget_id: BudgetId, range: Option<DateRange>) -> BudgetResult<Vec<Transaction>> {
        let mut query = TransactionQuery::for_budget(budget_id);
        if let Some(range) = range {
            query = query.range(range);
        }
        self.storage.transactions.query(&query)
    }
}

fn totals(transactions: &[Transaction]) -> (Money, Money) {
    transactions.iter().fold((Money::zero(), Money::zero()), |(inc, exp), t| match t.kind {
        TransactionKind::Income => (inc + t.amount, exp),
        TransactionKind::Expense => (inc, exp + t.amount),
    })
}
