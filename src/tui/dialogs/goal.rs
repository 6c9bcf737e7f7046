//! New goal and transfer-to-goal dialogs

use chrono::NaiveDate;
use crossterm::event::KeyEvent;
use ratatui::{text::Line, Frame};

use crate::error::{BudgetError, BudgetResult};
use crate::models::{Goal, GoalId, Money};
use crate::services::NewGoal;
use crate::tui::app::App;
use crate::tui::widgets::{FormFields, TextInput};
use crate::validation::{parse_amount, parse_date, validate_goal, GoalInput, ValidationError};

use super::{edit_form, form_message, render_form, FormAction};

const NAME: usize = 0;
const TARGET: usize = 1;
const DEADLINE: usize = 2;
const DESCRIPTION: usize = 3;

#[derive(Debug, Clone)]
pub struct GoalForm {
    pub fields: FormFields,
    pub error: Option<String>,
}

impl Default for GoalForm {
    fn default() -> Self {
        Self {
            fields: FormFields::new(vec![
                TextInput::new().label("Name").placeholder("e.g. Summer trip"),
                TextInput::new().label("Target").placeholder("0.00"),
                TextInput::new().label("Deadline").placeholder("YYYY-MM-DD"),
                TextInput::new().label("Description").placeholder("optional"),
            ]),
            error: None,
        }
    }
}

impl GoalForm {
    /// Collect every problem with the form into one message
    pub fn build(&self, today: NaiveDate) -> BudgetResult<NewGoal> {
        let mut problems = Vec::new();

        let parsed_target = Money::parse(self.fields.value(TARGET));
        if parsed_target.is_err() {
            problems.push("Target amount must be a number".to_string());
        }
        let target = parsed_target.clone().unwrap_or_else(|_| Money::zero());
        let deadline = match self.fields.value(DEADLINE) {
            "" => {
                problems.push("Deadline is required".to_string());
                None
            }
            typed => parse_date(typed, today)
                .map_err(|e| problems.push(e.to_string()))
                .ok(),
        };

        let input = GoalInput {
            name: self.fields.value(NAME),
            target_amount: target,
            deadline,
            description: self.fields.value(DESCRIPTION),
        };
        match validate_goal(&input, today) {
            Ok(()) => {}
            Err(ValidationError::Many(found)) => problems.extend(
                found
                    .into_iter()
                    // an unparsable target already has its own message
                    .filter(|p| parsed_target.is_ok() || !p.starts_with("Target amount")),
            ),
            Err(other) => problems.push(other.to_string()),
        }

        match deadline {
            Some(deadline) if problems.is_empty() => Ok(NewGoal {
                name: input.name.to_string(),
                target_amount: target,
                deadline,
                description: input.description.to_string(),
                color: None,
            }),
            _ => Err(BudgetError::Validation(problems.join("; "))),
        }
    }
}

/// Amount to move from your balance into one goal
#[derive(Debug, Clone, Default)]
pub struct TransferForm {
    pub goal_id: Option<GoalId>,
    pub goal_name: String,
    pub remaining: Money,
    pub fields: FormFields,
    pub error: Option<String>,
}

impl TransferForm {
    pub fn for_goal(goal: &Goal) -> Self {
        Self {
            goal_id: Some(goal.id),
            goal_name: goal.name.clone(),
            remaining: goal.remaining(),
            fields: FormFields::new(vec![TextInput::new().label("Amount").placeholder("0.00")]),
            error: None,
        }
    }

    pub fn build(&self) -> BudgetResult<(GoalId, Money)> {
        let goal_id = self
            .goal_id
            .ok_or_else(|| BudgetError::Validation("No goal selected".into()))?;
        Ok((goal_id, parse_amount(self.fields.value(0))?))
    }
}

pub fn render(frame: &mut Frame, app: &App) {
    let form = &app.goal_form;
    render_form(
        frame,
        app.palette,
        "New goal",
        &form.fields,
        None,
        form.error.as_deref(),
    );
}

pub fn render_transfer(frame: &mut Frame, app: &App) {
    let form = &app.transfer_form;
    let note = Line::from(format!(
        "{}: {} to go. The amount is booked as a Savings expense.",
        form.goal_name,
        app.money(form.remaining)
    ));
    render_form(
        frame,
        app.palette,
        "Transfer to goal",
        &form.fields,
        Some(note),
        form.error.as_deref(),
    );
}

pub fn handle_key(app: &mut App, key: KeyEvent) {
    match edit_form(&mut app.goal_form.fields, key) {
        FormAction::None => {}
        FormAction::Cancel => app.close_dialog(),
        FormAction::Submit => {
            if let Err(e) = app.submit_goal() {
                app.goal_form.error = Some(form_message(&e));
            }
        }
    }
}

pub fn handle_transfer_key(app: &mut App, key: KeyEvent) {
    match edit_form(&mut app.transfer_form.fields, key) {
        FormAction::None => {}
        FormAction::Cancel => app.close_dialog(),
        FormAction::Submit => {
            if let Err(e) = app.submit_transfer() {
                app.transfer_form.error = Some(form_message(&e));
            }
        }
    }
}
