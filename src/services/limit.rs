//! Limit service
//!
//! A limit caps spending in one category for a period. Usage is always
//! computed from the expense transactions inside the period window that
//! contains `today`.

use chrono::NaiveDate;
use tracing::info;

use crate::audit::{AuditEntry, EntityType};
use crate::error::{BudgetError, BudgetResult};
use crate::models::{
    BudgetId, Limit, LimitId, LimitPeriod, LimitStatus, LimitUsage, Money, TransactionKind, User,
};
use crate::storage::{Storage, TransactionQuery};
use crate::validation::validate_amount;

use super::require_member;

/// Service for spending limits
pub struct LimitService<'a> {
    storage: &'a Storage,
}

impl<'a> LimitService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a limit for a category, or replace the one it already has
    pub fn set(
        &self,
        budget_id: BudgetId,
        user: &User,
        category: &str,
        amount: Money,
        period: LimitPeriod,
    ) -> BudgetResult<Limit> {
        self.storage.refresh_if_changed()?;
        require_member(self.storage, budget_id, user)?;
        validate_amount(amount)?;

        let category = self
            .storage
            .categories
            .find_by_name(budget_id, category)?
            .ok_or_else(|| BudgetError::category_not_found(category))?;
        if category.kind != TransactionKind::Expense {
            return Err(BudgetError::Validation(format!(
                "Limits apply to expense categories; '{}' is an income category",
                category.name
            )));
        }

        let existing = self
            .storage
            .limits
            .find_by_category(budget_id, &category.name)?;

        let mut batch = self.storage.batch();
        let limit = match existing {
            Some(before) => {
                let mut limit = before.clone();
                limit.amount = amount;
                limit.period = period;
                limit.updated_at = chrono::Utc::now();
                batch.audit(
                    AuditEntry::update(EntityType::Limit, limit.id.to_string(), Some(limit.category.clone()), &before, &limit)
                        .by(&user.display_name),
                );
                limit
            }
            None => {
                let mut limit = Limit::new(budget_id, &category.name, amount, period);
                limit.created_by = Some(user.id);
                batch.audit(
                    AuditEntry::create(EntityType::Limit, limit.id.to_string(), Some(limit.category.clone()), &limit)
                        .by(&user.display_name),
                );
                limit
            }
        };
        batch.set_limit(limit.clone());
        batch.commit()?;

        info!(budget = %budget_id, category = %limit.category, "limit set");
        Ok(limit)
    }

    /// Change the amount and/or period of an existing limit
    pub fn update(
        &self,
        id: LimitId,
        user: &User,
        amount: Option<Money>,
        period: Option<LimitPeriod>,
    ) -> BudgetResult<Limit> {
        self.storage.refresh_if_changed()?;
        let before = self.storage.limits.require(id)?;
        require_member(self.storage, before.budget_id, user)?;

        let mut limit = before.clone();
        if let Some(amount) = amount {
            validate_amount(amount)?;
            limit.amount = amount;
        }
        if let Some(period) = period {
            limit.period = period;
        }
        limit.updated_at = chrono::Utc::now();

        let mut batch = self.storage.batch();
        batch.set_limit(limit.clone()).audit(
            AuditEntry::update(EntityType::Limit, id.to_string(), Some(limit.category.clone()), &before, &limit)
                .by(&user.display_name),
        );
        batch.commit()?;
        Ok(limit)
    }

    pub fn delete(&self, id: LimitId, user: &User) -> BudgetResult<Limit> {
        self.storage.refresh_if_changed()?;
        let limit = self.storage.limits.require(id)?;
        require_member(self.storage, limit.budget_id, user)?;

        let mut batch = self.storage.batch();
        batch.delete_limit(id).audit(
            AuditEntry::delete(EntityType::Limit, id.to_string(), Some(limit.category.clone()), &limit)
                .by(&user.display_name),
        );
        batch.commit()?;
        Ok(limit)
    }

    /// Resolve a limit by id prefix or category name
    pub fn find(&self, budget_id: BudgetId, input: &str) -> BudgetResult<Limit> {
        if let Some(limit) = self
            .storage
            .limits
            .find_by_category(budget_id, input)?
        {
            return Ok(limit);
        }
        self.storage
            .limits
            .find_by_prefix(input, |l| l.budget_id == budget_id)?
            .ok_or_else(|| BudgetError::limit_not_found(input))
    }

    /// Every limit of a budget with its current usage, worst first
    pub fn list_with_usage(&self, budget_id: BudgetId, today: NaiveDate) -> BudgetResult<Vec<LimitUsage>> {
        let mut usages = self
            .storage
            .limits
            .for_budget(budget_id)?
            .iter()
            .map(|limit| self.usage(limit, today))
            .collect::<BudgetResult<Vec<_>>>()?;
        usages.sort_by(|a, b| {
            b.percent
                .partial_cmp(&a.percent)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.limit.category.cmp(&b.limit.category))
        });
        Ok(usages)
    }

    /// Usage of the category's limit, if it has one
    pub fn check_category(
        &self,
        budget_id: BudgetId,
        category: &str,
        today: NaiveDate,
    ) -> BudgetResult<Option<LimitUsage>> {
        match self.storage.limits.find_by_category(budget_id, category)? {
            Some(limit) => Ok(Some(self.usage(&limit, today)?)),
            None => Ok(None),
        }
    }

    /// Limits at or above the warning threshold
    pub fn alerts(&self, budget_id: BudgetId, today: NaiveDate) -> BudgetResult<Vec<LimitUsage>> {
        Ok(self
            .list_with_usage(budget_id, today)?
            .into_iter()
            .filter(|u| u.status != LimitStatus::Ok)
            .collect())
    }

    fn usage(&self, limit: &Limit, today: NaiveDate) -> BudgetResult<LimitUsage> {
        let window = limit.period.range(today);
        let spent: Money = self
            .storage
            .transactions
            .query(
                &TransactionQuery::for_budget(limit.budget_id)
                    .category(limit.category.as_str())
                    .kind(TransactionKind::Expense)
                    .range(window),
            )?
            .iter()
            .map(|t| t.amount)
            .sum();
        Ok(limit.usage(spent, window))
    }
}
