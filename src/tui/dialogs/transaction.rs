//! Add income / add expense dialog
//!
//! Unfinished input is kept as a draft in the local store when the dialog
//! is cancelled and picked up the next time it opens.

use chrono::NaiveDate;
use crossterm::event::KeyEvent;
use ratatui::{text::Line, Frame};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{BudgetError, BudgetResult};
use crate::local::LocalStore;
use crate::models::{Category, TransactionKind, UserId};
use crate::services::NewTransaction;
use crate::tui::app::App;
use crate::tui::widgets::{Choice, FormFields, TextInput};
use crate::validation::{parse_amount, parse_date, validate_description};

use super::{edit_form, form_message, render_form, FormAction};

const AMOUNT: usize = 0;
const CATEGORY: usize = 1;
const DESCRIPTION: usize = 2;
const DATE: usize = 3;

/// What a cancelled form leaves behind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub kind: Option<TransactionKind>,
    pub amount: String,
    pub category: String,
    pub description: String,
    pub date: String,
}

impl TransactionDraft {
    fn is_blank(&self) -> bool {
        self.amount.is_empty()
            && self.category.is_empty()
            && self.description.is_empty()
            && self.date.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct TransactionForm {
    pub fields: FormFields,
    pub error: Option<String>,
}

impl Default for TransactionForm {
    fn default() -> Self {
        Self::new(TransactionKind::Expense)
    }
}

impl TransactionForm {
    /// Local store key of the draft
    pub const DRAFT: &'static str = "transaction";

    pub fn new(kind: TransactionKind) -> Self {
        let mut choice = Choice::new("Type", &["Expense", "Income"]);
        if kind.is_income() {
            choice.select("Income");
        }
        let mut fields = FormFields::new(vec![
            TextInput::new().label("Amount").placeholder("0.00"),
            TextInput::new()
                .label("Category")
                .placeholder("start typing, e.g. Gro"),
            TextInput::new().label("Description").placeholder("optional"),
            TextInput::new().label("Date").placeholder("today"),
        ])
        .with_choice(choice);
        fields.focus_input(AMOUNT);
        Self { fields, error: None }
    }

    /// A fresh form, filled from a draft when one is stored
    pub fn open(kind: TransactionKind, store: Option<&LocalStore>) -> Self {
        let draft = store.and_then(|s| {
            s.load_draft::<TransactionDraft>(Self::DRAFT)
                .map_err(|e| warn!(error = %e, "failed to load transaction draft"))
                .ok()
                .flatten()
        });
        let mut form = Self::new(kind);
        if let Some(draft) = draft {
            // a draft only carries over into the same kind of form
            if draft.kind.map_or(true, |k| k == kind) {
                form.apply_draft(&draft);
            }
        }
        form
    }

    pub fn kind(&self) -> TransactionKind {
        if self.fields.selected() == "Income" {
            TransactionKind::Income
        } else {
            TransactionKind::Expense
        }
    }

    fn apply_draft(&mut self, draft: &TransactionDraft) {
        for (index, value) in [
            (AMOUNT, &draft.amount),
            (CATEGORY, &draft.category),
            (DESCRIPTION, &draft.description),
            (DATE, &draft.date),
        ] {
            if let Some(input) = self.fields.input_mut(index) {
                input.set(value.as_str());
            }
        }
    }

    pub fn draft(&self) -> TransactionDraft {
        TransactionDraft {
            kind: Some(self.kind()),
            amount: self.fields.value(AMOUNT).to_string(),
            category: self.fields.value(CATEGORY).to_string(),
            description: self.fields.value(DESCRIPTION).to_string(),
            date: self.fields.value(DATE).to_string(),
        }
    }

    /// Store the current input, or drop an old draft if the form is empty
    pub fn save_draft(&self, store: &LocalStore) -> BudgetResult<()> {
        let draft = self.draft();
        if draft.is_blank() {
            store.clear_draft(Self::DRAFT)?;
        } else {
            store.save_draft(Self::DRAFT, &draft)?;
        }
        Ok(())
    }

    /// Validate the fields into service input
    ///
    /// The category field accepts any unambiguous prefix of a category of
    /// the selected kind.
    pub fn build(
        &self,
        member: UserId,
        today: NaiveDate,
        categories: &[&Category],
    ) -> BudgetResult<NewTransaction> {
        let kind = self.kind();
        let amount = parse_amount(self.fields.value(AMOUNT))?;
        let category = complete_category(self.fields.value(CATEGORY), kind, categories)?;
        let description = self.fields.value(DESCRIPTION).to_string();
        validate_description(&description)?;
        let date = match self.fields.value(DATE) {
            "" => today,
            typed => parse_date(typed, today)?,
        };
        Ok(NewTransaction {
            member,
            kind,
            amount,
            category,
            description,
            date,
        })
    }
}

fn complete_category(
    typed: &str,
    kind: TransactionKind,
    categories: &[&Category],
) -> BudgetResult<String> {
    if typed.is_empty() {
        return Err(BudgetError::Validation("Pick a category".into()));
    }
    let candidates: Vec<&Category> = categories
        .iter()
        .copied()
        .filter(|c| c.kind == kind)
        .collect();
    if let Some(exact) = candidates.iter().find(|c| c.is_named(typed)) {
        return Ok(exact.name.clone());
    }
    let lower = typed.to_lowercase();
    let matches: Vec<&&Category> = candidates
        .iter()
        .filter(|c| c.name.to_lowercase().starts_with(&lower))
        .collect();
    match matches.as_slice() {
        [only] => Ok(only.name.clone()),
        [] => Err(BudgetError::Validation(format!(
            "No {} category starts with '{}'",
            kind, typed
        ))),
        several => Err(BudgetError::Validation(format!(
            "'{}' could be {}",
            typed,
            several
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

pub fn render(frame: &mut Frame, app: &App) {
    let form = &app.transaction_form;
    let title = if form.kind().is_income() {
        "Add income"
    } else {
        "Add expense"
    };
    let names: Vec<&str> = app
        .categories(Some(form.kind()))
        .into_iter()
        .map(|c| c.name.as_str())
        .collect();
    let note = Line::from(format!("Categories: {}", names.join(", ")));
    render_form(
        frame,
        app.palette,
        title,
        &form.fields,
        Some(note),
        form.error.as_deref(),
    );
}

pub fn handle_key(app: &mut App, key: KeyEvent) {
    match edit_form(&mut app.transaction_form.fields, key) {
        FormAction::None => {}
        FormAction::Cancel => {
            if let Some(store) = app.local_store() {
                if let Err(e) = app.transaction_form.save_draft(store) {
                    warn!(error = %e, "failed to save transaction draft");
                }
            }
            app.close_dialog();
        }
        FormAction::Submit => {
            if let Err(e) = app.submit_transaction() {
                app.transaction_form.error = Some(form_message(&e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BudgetId, DefaultCategory};
    use tempfile::TempDir;

    fn defaults() -> Vec<Category> {
        let budget_id = BudgetId::new();
        DefaultCategory::all()
            .iter()
            .map(|d| d.to_category(budget_id))
            .collect()
    }

    fn fill(form: &mut TransactionForm, index: usize, value: &str) {
        form.fields.input_mut(index).unwrap().set(value);
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
    }

    #[test]
    fn test_build_completes_category_prefix() {
        let categories = defaults();
        let refs: Vec<&Category> = categories.iter().collect();
        let mut form = TransactionForm::new(TransactionKind::Expense);
        fill(&mut form, AMOUNT, "12,50");
        fill(&mut form, CATEGORY, "gro");

        let input = form.build(UserId::new(), today(), &refs).unwrap();
        assert_eq!(input.category, "Groceries");
        assert_eq!(input.amount.minor(), 1250);
        assert_eq!(input.date, today());
    }

    #[test]
    fn test_build_rejects_category_of_other_kind() {
        let categories = defaults();
        let refs: Vec<&Category> = categories.iter().collect();
        let mut form = TransactionForm::new(TransactionKind::Income);
        fill(&mut form, AMOUNT, "100");
        fill(&mut form, CATEGORY, "Groceries");

        let err = form.build(UserId::new(), today(), &refs).unwrap_err();
        assert!(err.to_string().contains("No income category"));
    }

    #[test]
    fn test_build_requires_amount() {
        let categories = defaults();
        let refs: Vec<&Category> = categories.iter().collect();
        let mut form = TransactionForm::new(TransactionKind::Expense);
        fill(&mut form, CATEGORY, "Groceries");
        assert!(form.build(UserId::new(), today(), &refs).is_err());
    }

    #[test]
    fn test_draft_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::open(dir.path().join("local.json")).unwrap();

        let mut form = TransactionForm::new(TransactionKind::Expense);
        fill(&mut form, AMOUNT, "7");
        fill(&mut form, DESCRIPTION, "bus ticket");
        form.save_draft(&store).unwrap();

        let reopened = TransactionForm::open(TransactionKind::Expense, Some(&store));
        assert_eq!(reopened.fields.value(AMOUNT), "7");
        assert_eq!(reopened.fields.value(DESCRIPTION), "bus ticket");

        let other_kind = TransactionForm::open(TransactionKind::Income, Some(&store));
        assert_eq!(other_kind.fields.value(AMOUNT), "");
    }

    #[test]
    fn test_blank_form_clears_draft() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::open(dir.path().join("local.json")).unwrap();

        let mut form = TransactionForm::new(TransactionKind::Expense);
        fill(&mut form, AMOUNT, "7");
        form.save_draft(&store).unwrap();
        TransactionForm::new(TransactionKind::Expense)
            .save_draft(&store)
            .unwrap();

        assert!(store
            .load_draft::<TransactionDraft>(TransactionForm::DRAFT)
            .unwrap()
            .is_none());
    }
}
