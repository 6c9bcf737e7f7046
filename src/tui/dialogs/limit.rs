//! Set limit dialog

use crossterm::event::KeyEvent;
use ratatui::{text::Line, Frame};

use crate::error::{BudgetError, BudgetResult};
use crate::models::{LimitPeriod, Money, TransactionKind};
use crate::tui::app::App;
use crate::tui::widgets::{Choice, FormFields, TextInput};
use crate::validation::validate_limit;

use super::{edit_form, form_message, render_form, FormAction};

#[derive(Debug, Clone)]
pub struct LimitForm {
    pub fields: FormFields,
    pub error: Option<String>,
}

impl Default for LimitForm {
    fn default() -> Self {
        let periods: Vec<String> = LimitPeriod::ALL.iter().map(|p| p.to_string()).collect();
        let periods: Vec<&str> = periods.iter().map(String::as_str).collect();
        let mut choice = Choice::new("Period", &periods);
        choice.select(&LimitPeriod::default().to_string());

        let mut fields = FormFields::new(vec![
            TextInput::new().label("Category"),
            TextInput::new().label("Amount").placeholder("0.00"),
        ])
        .with_choice(choice);
        fields.focus_input(0);
        Self { fields, error: None }
    }
}

impl LimitForm {
    pub fn build(&self) -> BudgetResult<(String, Money, LimitPeriod)> {
        let category = self.fields.value(0).to_string();
        if category.is_empty() {
            return Err(BudgetError::Validation("Pick a category".into()));
        }
        let amount = Money::parse(self.fields.value(1))
            .map_err(|_| BudgetError::Validation("Amount must be a number".into()))?;
        let period = validate_limit(amount, self.fields.selected())?;
        Ok((category, amount, period))
    }
}

pub fn render(frame: &mut Frame, app: &App) {
    let form = &app.limit_form;
    let names: Vec<&str> = app
        .categories(Some(TransactionKind::Expense))
        .into_iter()
        .map(|c| c.name.as_str())
        .collect();
    render_form(
        frame,
        app.palette,
        "Set limit",
        &form.fields,
        Some(Line::from(format!("Expense categories: {}", names.join(", ")))),
        form.error.as_deref(),
    );
}

pub fn handle_key(app: &mut App, key: KeyEvent) {
    match edit_form(&mut app.limit_form.fields, key) {
        FormAction::None => {}
        FormAction::Cancel => app.close_dialog(),
        FormAction::Submit => {
            if let Err(e) = app.submit_limit() {
                app.limit_form.error = Some(form_message(&e));
            }
        }
    }
}
