//! Category service
//!
//! Categories are referenced by name from transactions and limits, so a
//! rename rewrites those references in the same batch.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::audit::{AuditEntry, EntityType};
use crate::display::format::category_color;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{
    category::DEFAULT_ICON, BudgetId, Category, CategoryId, DefaultCategory, Money,
    TransactionKind, User,
};
use crate::storage::{Storage, TransactionQuery};
use crate::validation::{sanitize_input, validate_category_name};

use super::require_member;

/// Version written into category exports
pub const CATEGORY_EXPORT_VERSION: &str = "1.0";

/// Service for category management
pub struct CategoryService<'a> {
    storage: &'a Storage,
}

/// Fields of a category that can be edited
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub kind: Option<TransactionKind>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategorySort {
    #[default]
    Name,
    /// Most used first
    Usage,
}

impl std::str::FromStr for CategorySort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "usage" | "used" => Ok(Self::Usage),
            other => Err(format!("Unknown sort '{}'. Use name or usage.", other)),
        }
    }
}

/// How much a category is used
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryUsage {
    pub category: Category,
    pub count: usize,
    pub total: Money,
}

/// Portable form of a budget's categories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryExport {
    pub version: String,
    pub categories: Vec<ExportedCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedCategory {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    /// Names that already existed
    pub skipped: Vec<String>,
}

impl<'a> CategoryService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn add(
        &self,
        budget_id: BudgetId,
        user: &User,
        name: &str,
        kind: TransactionKind,
        icon: Option<&str>,
        color: Option<&str>,
    ) -> BudgetResult<Category> {
        require_member(self.storage, budget_id, user)?;
        let name = sanitize_input(name);
        validate_category_name(&name)?;
        self.ensure_unique(budget_id, &name, None)?;

        let color = match color {
            Some(c) => validate_color(c)?,
            None => category_color(&name),
        };
        let icon = icon
            .map(str::trim)
            .filter(|i| !i.is_empty())
            .unwrap_or(DEFAULT_ICON);
        let category = Category::new(budget_id, name, kind)
            .with_style(icon, color)
            .created_by(user.id);

        let mut batch = self.storage.batch();
        batch.set_category(category.clone()).audit(
            AuditEntry::create(EntityType::Category, category.id.to_string(), Some(category.name.clone()), &category)
                .by(&user.display_name),
        );
        batch.commit()?;

        info!(budget = %budget_id, category = %category.name, "category added");
        Ok(category)
    }

    /// Edit a category; a rename carries over to its transactions and limit
    pub fn update(&self, id: CategoryId, user: &User, update: CategoryUpdate) -> BudgetResult<Category> {
        self.storage.refresh_if_changed()?;
        let before = self.storage.categories.require(id)?;
        require_member(self.storage, before.budget_id, user)?;

        let mut category = before.clone();
        if let Some(name) = update.name {
            let name = sanitize_input(&name);
            validate_category_name(&name)?;
            self.ensure_unique(before.budget_id, &name, Some(id))?;
            category.name = name;
        }
        if let Some(kind) = update.kind {
            if kind != before.kind && self.usage_count(&before)? > 0 {
                return Err(BudgetError::Validation(format!(
                    "'{}' has transactions; its type cannot change",
                    before.name
                )));
            }
            category.kind = kind;
        }
        if let Some(icon) = update.icon {
            category.icon = icon.trim().to_string();
        }
        if let Some(color) = update.color {
            category.color = validate_color(&color)?;
        }
        category.updated_at = chrono::Utc::now();

        let mut batch = self.storage.batch();
        batch.set_category(category.clone());

        if category.name != before.name {
            let query = TransactionQuery::for_budget(before.budget_id).category(before.name.as_str());
            for mut txn in self.storage.transactions.query(&query)? {
                txn.category = category.name.clone();
                batch.set_transaction(txn);
            }
            if let Some(mut limit) = self
                .storage
                .limits
                .find_by_category(before.budget_id, &before.name)?
            {
                limit.category = category.name.clone();
                batch.set_limit(limit);
            }
        }

        batch.audit(
            AuditEntry::update(EntityType::Category, id.to_string(), Some(category.name.clone()), &before, &category)
                .by(&user.display_name),
        );
        batch.commit()?;
        Ok(category)
    }

    /// Delete a category
    ///
    /// Refuses while transactions use it unless `force` is set. Forced
    /// deletes keep the transactions (they still show the old name) and drop
    /// the category's limit.
    pub fn delete(&self, id: CategoryId, user: &User, force: bool) -> BudgetResult<Category> {
        self.storage.refresh_if_changed()?;
        let category = self.storage.categories.require(id)?;
        require_member(self.storage, category.budget_id, user)?;

        let used = self.usage_count(&category)?;
        if used > 0 && !force {
            return Err(BudgetError::Validation(format!(
                "'{}' is used by {} transaction(s); use --force to delete it anyway",
                category.name, used
            )));
        }

        let mut batch = self.storage.batch();
        batch.delete_category(id);
        if let Some(limit) = self
            .storage
            .limits
            .find_by_category(category.budget_id, &category.name)?
        {
            batch.delete_limit(limit.id);
        }
        batch.audit(
            AuditEntry::delete(EntityType::Category, id.to_string(), Some(category.name.clone()), &category)
                .by(&user.display_name),
        );
        batch.commit()?;

        info!(category = %category.name, forced = force, "category deleted");
        Ok(category)
    }

    /// Categories of a budget by name, optionally only one kind
    pub fn list(&self, budget_id: BudgetId, kind: Option<TransactionKind>) -> BudgetResult<Vec<Category>> {
        Ok(self
            .storage
            .categories
            .for_budget(budget_id)?
            .into_iter()
            .filter(|c| kind.map_or(true, |k| c.kind == k))
            .collect())
    }

    /// Resolve a category by name or id prefix
    pub fn find(&self, budget_id: BudgetId, input: &str) -> BudgetResult<Category> {
        if let Some(category) = self.storage.categories.find_by_name(budget_id, input)? {
            return Ok(category);
        }
        self.storage
            .categories
            .find_by_prefix(input, |c| c.budget_id == budget_id)?
            .ok_or_else(|| BudgetError::category_not_found(input))
    }

    /// Case-insensitive substring search over names
    pub fn search(&self, budget_id: BudgetId, query: &str) -> BudgetResult<Vec<Category>> {
        let query = query.trim().to_lowercase();
        Ok(self
            .storage
            .categories
            .for_budget(budget_id)?
            .into_iter()
            .filter(|c| c.name.to_lowercase().contains(&query))
            .collect())
    }

    pub fn sorted(&self, budget_id: BudgetId, sort: CategorySort) -> BudgetResult<Vec<Category>> {
        match sort {
            CategorySort::Name => self.list(budget_id, None),
            CategorySort::Usage => Ok(self
                .usage_stats(budget_id)?
                .into_iter()
                .map(|u| u.category)
                .collect()),
        }
    }

    /// Transaction count and total per category, most used first
    pub fn usage_stats(&self, budget_id: BudgetId) -> BudgetResult<Vec<CategoryUsage>> {
        let mut by_name: HashMap<String, (usize, Money)> = HashMap::new();
        for txn in self
            .storage
            .transactions
            .query(&TransactionQuery::for_budget(budget_id))?
        {
            let entry = by_name
                .entry(txn.category.to_lowercase())
                .or_insert((0, Money::zero()));
            entry.0 += 1;
            entry.1 += txn.amount;
        }

        let mut usage: Vec<CategoryUsage> = self
            .storage
            .categories
            .for_budget(budget_id)?
            .into_iter()
            .map(|category| {
                let (count, total) = by_name
                    .get(&category.name.to_lowercase())
                    .copied()
                    .unwrap_or((0, Money::zero()));
                CategoryUsage {
                    category,
                    count,
                    total,
                }
            })
            .collect();
        usage.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then(b.total.cmp(&a.total))
                .then_with(|| a.category.name.to_lowercase().cmp(&b.category.name.to_lowercase()))
        });
        Ok(usage)
    }

    pub fn export_json(&self, budget_id: BudgetId) -> BudgetResult<String> {
        let export = CategoryExport {
            version: CATEGORY_EXPORT_VERSION.to_string(),
            categories: self
                .storage
                .categories
                .for_budget(budget_id)?
                .into_iter()
                .map(|c| ExportedCategory {
                    name: c.name,
                    kind: c.kind,
                    icon: Some(c.icon),
                    color: Some(c.color),
                })
                .collect(),
        };
        serde_json::to_string_pretty(&export)
            .map_err(|e| BudgetError::Export(format!("Failed to serialize categories: {}", e)))
    }

    /// Import categories; names that already exist are skipped
    pub fn import_json(&self, budget_id: BudgetId, user: &User, json: &str) -> BudgetResult<ImportSummary> {
        require_member(self.storage, budget_id, user)?;
        let export: CategoryExport = serde_json::from_str(json)
            .map_err(|e| BudgetError::Import(format!("Invalid category file: {}", e)))?;

        let mut summary = ImportSummary::default();
        let mut seen: Vec<String> = Vec::new();
        let mut batch = self.storage.batch();

        for item in export.categories {
            let name = sanitize_input(&item.name);
            validate_category_name(&name)
                .map_err(|e| BudgetError::Import(format!("'{}': {}", item.name, e)))?;
            let lower = name.to_lowercase();
            if seen.contains(&lower) || self.storage.categories.find_by_name(budget_id, &name)?.is_some() {
                summary.skipped.push(name);
                continue;
            }
            seen.push(lower);

            let color = match item.color.as_deref() {
                Some(c) => validate_color(c).map_err(|e| BudgetError::Import(e.to_string()))?,
                None => category_color(&name),
            };
            let icon = item.icon.unwrap_or_else(|| DEFAULT_ICON.to_string());
            let category = Category::new(budget_id, name, item.kind)
                .with_style(icon, color)
                .created_by(user.id);
            batch.set_category(category.clone()).audit(
                AuditEntry::create(EntityType::Category, category.id.to_string(), Some(category.name.clone()), &category)
                    .by(&user.display_name)
                    .with_summary("imported"),
            );
            summary.added += 1;
        }

        batch.commit()?;
        info!(added = summary.added, skipped = summary.skipped.len(), "categories imported");
        Ok(summary)
    }

    /// Add whichever default categories the budget is missing
    pub fn create_defaults(&self, budget_id: BudgetId) -> BudgetResult<Vec<Category>> {
        let mut created = Vec::new();
        let mut batch = self.storage.batch();
        for default in DefaultCategory::all() {
            if self
                .storage
                .categories
                .find_by_name(budget_id, default.name)?
                .is_none()
            {
                let category = default.to_category(budget_id);
                batch.set_category(category.clone());
                created.push(category);
            }
        }
        batch.commit()?;
        Ok(created)
    }

    fn usage_count(&self, category: &Category) -> BudgetResult<usize> {
        self.storage
            .transactions
            .count_for_category(category.budget_id, &category.name)
    }

    fn ensure_unique(&self, budget_id: BudgetId, name: &str, except: Option<CategoryId>) -> BudgetResult<()> {
        match self.storage.categories.find_by_name(budget_id, name)? {
            Some(existing) if Some(existing.id) != except => Err(BudgetError::Duplicate {
                entity_type: "Category",
                identifier: existing.name,
            }),
            _ => Ok(()),
        }
    }
}

/// Accept `#RRGGBB` (the `#` is optional), stored upper-case
fn validate_color(color: &str) -> BudgetResult<String> {
    let hex = color.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(BudgetError::Validation(format!(
            "Invalid color '{}'. Use #RRGGBB.",
            color.trim()
        )));
    }
    Ok(format!("#{}", hex.to_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BudgetPaths;
    use crate::models::{Currency, LimitPeriod};
    use crate::services::{LimitService, NewTransaction, TransactionService};
    use tempfile::TempDir;

    fn setup() -> (TempDir, Storage, User, BudgetId) {
        let temp_dir = TempDir::new().unwrap();
        let paths = BudgetPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        let anna = User::new("anna@example.com", "Anna", "hash");
        storage.users.upsert(anna.clone()).unwrap();
        let budget = crate::services::BudgetService::new(&storage)
            .create_budget(&anna, "Home", Currency::Pln)
            .unwrap();
        (temp_dir, storage, anna, budget.id)
    }

    fn spend(storage: &Storage, budget_id: BudgetId, user: &User, minor: i64, category: &str) {
        TransactionService::new(storage)
            .add_transaction(
                budget_id,
                user,
                NewTransaction {
                    member: user.id,
                    kind: TransactionKind::Expense,
                    amount: Money::from_minor(minor),
                    category: category.into(),
                    description: String::new(),
                    date: crate::services::today(),
                },
            )
            .unwrap();
    }

    #[test]
    fn test_add_generates_color_and_rejects_duplicates() {
        let (_dir, storage, anna, budget_id) = setup();
        let service = CategoryService::new(&storage);

        let pets = service
            .add(budget_id, &anna, "Pets", TransactionKind::Expense, None, None)
            .unwrap();
        assert_eq!(pets.color, category_color("Pets"));
        assert_eq!(pets.icon, DEFAULT_ICON);

        let err = service
            .add(budget_id, &anna, "pets", TransactionKind::Expense, None, None)
            .unwrap_err();
        assert!(matches!(err, BudgetError::Duplicate { .. }));

        let err = service
            .add(budget_id, &anna, "Toys", TransactionKind::Expense, None, Some("red"))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_delete_refuses_used_category_unless_forced() {
        let (_dir, storage, anna, budget_id) = setup();
        let service = CategoryService::new(&storage);
        spend(&storage, budget_id, &anna, 1_000, "Health");
        LimitService::new(&storage)
            .set(budget_id, &anna, "Health", Money::from_minor(5_000), LimitPeriod::Monthly)
            .unwrap();
        let health = service.find(budget_id, "health").unwrap();

        assert!(service.delete(health.id, &anna, false).unwrap_err().is_validation());
        service.delete(health.id, &anna, true).unwrap();

        assert!(storage.categories.find_by_name(budget_id, "Health").unwrap().is_none());
        assert!(storage.limits.find_by_category(budget_id, "Health").unwrap().is_none());
        assert_eq!(storage.transactions.count_for_category(budget_id, "Health").unwrap(), 1);
    }

    #[test]
    fn test_rename_carries_over_references() {
        let (_dir, storage, anna, budget_id) = setup();
        let service = CategoryService::new(&storage);
        spend(&storage, budget_id, &anna, 1_000, "Transport");
        LimitService::new(&storage)
            .set(budget_id, &anna, "Transport", Money::from_minor(5_000), LimitPeriod::Monthly)
            .unwrap();
        let transport = service.find(budget_id, "Transport").unwrap();

        service
            .update(
                transport.id,
                &anna,
                CategoryUpdate {
                    name: Some("Car".into()),
                    ..CategoryUpdate::default()
                },
            )
            .unwrap();

        assert_eq!(storage.transactions.count_for_category(budget_id, "Car").unwrap(), 1);
        assert!(storage.limits.find_by_category(budget_id, "Car").unwrap().is_some());

        let err = service
            .update(
                transport.id,
                &anna,
                CategoryUpdate {
                    kind: Some(TransactionKind::Income),
                    ..CategoryUpdate::default()
                },
            )
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_usage_stats_and_sort() {
        let (_dir, storage, anna, budget_id) = setup();
        let service = CategoryService::new(&storage);
        spend(&storage, budget_id, &anna, 1_000, "Transport");
        spend(&storage, budget_id, &anna, 2_000, "Transport");
        spend(&storage, budget_id, &anna, 9_000, "Health");

        let usage = service.usage_stats(budget_id).unwrap();
        assert_eq!(usage[0].category.name, "Transport");
        assert_eq!(usage[0].count, 2);
        assert_eq!(usage[0].total, Money::from_minor(3_000));
        assert_eq!(usage[1].category.name, "Health");
        assert_eq!(usage.len(), DefaultCategory::all().len());

        let by_name = service.sorted(budget_id, CategorySort::Name).unwrap();
        assert_eq!(by_name[0].name, "Entertainment");

        let found = service.search(budget_id, "SAL").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Salary");
    }

    #[test]
    fn test_export_import_between_budgets() {
        let (_dir, storage, anna, budget_id) = setup();
        let service = CategoryService::new(&storage);
        service
            .add(budget_id, &anna, "Pets", TransactionKind::Expense, Some("🐶"), Some("#00ff00"))
            .unwrap();
        let json = service.export_json(budget_id).unwrap();

        let other = crate::services::BudgetService::new(&storage)
            .create_budget(&anna, "Cottage", Currency::Pln)
            .unwrap();
        let summary = service.import_json(other.id, &anna, &json).unwrap();
        assert_eq!(summary.added, 1);
        assert_eq!(summary.skipped.len(), DefaultCategory::all().len());

        let pets = service.find(other.id, "Pets").unwrap();
        assert_eq!(pets.color, "#00FF00");
        assert_eq!(pets.icon, "🐶");

        assert!(matches!(
            service.import_json(other.id, &anna, "not json").unwrap_err(),
            BudgetError::Import(_)
        ));
    }

    #[test]
    fn test_create_defaults_fills_gaps() {
        let (_dir, storage, anna, budget_id) = setup();
        let service = CategoryService::new(&storage);
        let groceries = service.find(budget_id, "Groceries").unwrap();
        service.delete(groceries.id, &anna, false).unwrap();

        let created = service.create_defaults(budget_id).unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].name, "Groceries");
        assert!(service.create_defaults(budget_id).unwrap().is_empty());
    }
}
