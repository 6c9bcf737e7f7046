//! Category repository (categories.json)

use crate::error::BudgetError;
use crate::models::{BudgetId, Category};

use super::collection::Collection;

pub type CategoryRepository = Collection<Category>;

impl Collection<Category> {
    /// Categories of a budget ordered by name
    pub fn for_budget(&self, budget_id: BudgetId) -> Result<Vec<Category>, BudgetError> {
        let mut categories = self.filter(|c| c.budget_id == budget_id)?;
        categories.sort_by_key(|c| c.name.to_lowercase());
        Ok(categories)
    }

    pub fn find_by_name(
        &self,
        budget_id: BudgetId,
        name: &str,
    ) -> Result<Option<Category>, BudgetError> {
        Ok(self
            .filter(|c| c.budget_id == budget_id && c.is_named(name))?
            .into_iter()
            .next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionKind;
    use tempfile::TempDir;

    #[test]
    fn test_for_budget_sorted_by_name() {
        let temp_dir = TempDir::new().unwrap();
        let repo = CategoryRepository::new(temp_dir.path().join("categories.json"));
        let budget = BudgetId::new();

        for name in ["transport", "Groceries", "Health"] {
            repo.upsert(Category::new(budget, name, TransactionKind::Expense))
                .unwrap();
        }
        repo.upsert(Category::new(BudgetId::new(), "Other", TransactionKind::Expense))
            .unwrap();

        let names: Vec<_> = repo
            .for_budget(budget)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Groceries", "Health", "transport"]);

        assert!(repo.find_by_name(budget, "HEALTH").unwrap().is_some());
        assert!(repo.find_by_name(budget, "Other").unwrap().is_none());
    }
}
