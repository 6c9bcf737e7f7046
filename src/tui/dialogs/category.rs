//! New category dialog

use crossterm::event::KeyEvent;
use ratatui::Frame;

use crate::error::BudgetResult;
use crate::models::TransactionKind;
use crate::tui::app::App;
use crate::tui::widgets::{Choice, FormFields, TextInput};
use crate::validation::validate_category_name;

use super::{edit_form, form_message, render_form, FormAction};

#[derive(Debug, Clone)]
pub struct CategoryForm {
    pub fields: FormFields,
    pub error: Option<String>,
}

impl Default for CategoryForm {
    fn default() -> Self {
        let mut fields = FormFields::new(vec![
            TextInput::new().label("Name"),
            TextInput::new().label("Icon").placeholder("optional, e.g. 🍕"),
        ])
        .with_choice(Choice::new("Type", &["Expense", "Income"]));
        fields.focus_input(0);
        Self { fields, error: None }
    }
}

impl CategoryForm {
    pub fn build(&self) -> BudgetResult<(String, TransactionKind, Option<String>)> {
        let name = self.fields.value(0).to_string();
        validate_category_name(&name)?;
        let kind = if self.fields.selected() == "Income" {
            TransactionKind::Income
        } else {
            TransactionKind::Expense
        };
        let icon = Some(self.fields.value(1))
            .filter(|i| !i.is_empty())
            .map(str::to_string);
        Ok((name, kind, icon))
    }
}

pub fn render(frame: &mut Frame, app: &App) {
    let form = &app.category_form;
    render_form(
        frame,
        app.palette,
        "New category",
        &form.fields,
        None,
        form.error.as_deref(),
    );
}

pub fn handle_key(app: &mut App, key: KeyEvent) {
    match edit_form(&mut app.category_form.fields, key) {
        FormAction::None => {}
        FormAction::Cancel => app.close_dialog(),
        FormAction::Submit => {
            if let Err(e) = app.submit_category() {
                app.category_form.error = Some(form_message(&e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_income_category() {
        let mut form = CategoryForm::default();
        form.fields.choice.as_mut().unwrap().select("Income");
        form.fields.input_mut(0).unwrap().set("  Bonus ");

        let (name, kind, icon) = form.build().unwrap();
        assert_eq!(name, "Bonus");
        assert_eq!(kind, TransactionKind::Income);
        assert_eq!(icon, None);
    }

    #[test]
    fn test_empty_name_rejected() {
        let form = CategoryForm::default();
        assert!(form.build().is_err());
    }
}
