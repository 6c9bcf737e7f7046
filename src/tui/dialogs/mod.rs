//! Modal dialogs
//!
//! Every form dialog shares the key handling in [`edit_form`] and the frame
//! drawn by [`render_form`]; the per-dialog modules only describe fields and
//! turn them into service input.

pub mod category;
pub mod confirm;
pub mod goal;
pub mod help;
pub mod limit;
pub mod transaction;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::error::BudgetError;

use super::app::{ActiveDialog, App};
use super::layout::centered_rect_fixed;
use super::theme::Palette;
use super::widgets::{FormFields, InputWidget};

/// Outcome of a key press inside a form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    None,
    Submit,
    Cancel,
}

/// Apply a key to a form's fields
pub fn edit_form(fields: &mut FormFields, key: KeyEvent) -> FormAction {
    match key.code {
        KeyCode::Esc => return FormAction::Cancel,
        KeyCode::Enter => return FormAction::Submit,
        KeyCode::Tab | KeyCode::Down => fields.next(),
        KeyCode::BackTab | KeyCode::Up => fields.prev(),
        KeyCode::Left | KeyCode::Right if fields.choice_focused() => {
            if let Some(choice) = fields.choice.as_mut() {
                choice.cycle(key.code == KeyCode::Right);
            }
        }
        KeyCode::Char(' ') if fields.choice_focused() => {
            if let Some(choice) = fields.choice.as_mut() {
                choice.cycle(true);
            }
        }
        code => {
            if let Some(input) = fields.focused_mut() {
                match code {
                    KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                        input.insert(c)
                    }
                    KeyCode::Char('u') => input.clear(),
                    KeyCode::Backspace => input.backspace(),
                    KeyCode::Delete => input.delete(),
                    KeyCode::Left => input.move_left(),
                    KeyCode::Right => input.move_right(),
                    KeyCode::Home => input.move_start(),
                    KeyCode::End => input.move_end(),
                    _ => {}
                }
            }
        }
    }
    FormAction::None
}

/// Message shown under a form for a failed submit
pub fn form_message(err: &BudgetError) -> String {
    match err {
        BudgetError::Validation(msg) => msg.clone(),
        other => other.to_string(),
    }
}

/// Draw a boxed form: the fields, an optional note and an error line
pub fn render_form(
    frame: &mut Frame,
    palette: Palette,
    title: &str,
    fields: &FormFields,
    note: Option<Line<'_>>,
    error: Option<&str>,
) {
    let extra = u16::from(note.is_some()) + 2;
    let height = fields.len() as u16 + extra + 4;
    let area = centered_rect_fixed(60, height, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(Span::styled(format!(" {} ", title), palette.title()))
        .borders(Borders::ALL)
        .border_style(palette.border(true));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut constraints = Vec::new();
    if note.is_some() {
        constraints.push(Constraint::Length(2));
    }
    constraints.extend(std::iter::repeat(Constraint::Length(1)).take(fields.len()));
    constraints.push(Constraint::Min(1));
    constraints.push(Constraint::Length(1));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    let mut row = 0;
    if let Some(note) = note {
        frame.render_widget(Paragraph::new(note).style(palette.muted()), rows[0]);
        row = 1;
    }

    let label_width = fields.label_width();
    if let Some(choice) = &fields.choice {
        let focused = fields.choice_focused();
        frame.render_widget(choice_line(choice, focused, palette, label_width), rows[row]);
        row += 1;
    }
    for (i, input) in fields.inputs.iter().enumerate() {
        frame.render_widget(
            InputWidget::new(input, fields.is_focused(i), palette).label_width(label_width),
            rows[row],
        );
        row += 1;
    }

    if let Some(error) = error {
        frame.render_widget(
            Paragraph::new(error)
                .style(Style::default().fg(palette.negative))
                .wrap(Wrap { trim: true }),
            rows[row],
        );
    }
    frame.render_widget(
        Paragraph::new("Enter save · Esc cancel · Tab next field").style(palette.muted()),
        rows[rows.len() - 1],
    );
}

fn choice_line(
    choice: &super::widgets::Choice,
    focused: bool,
    palette: Palette,
    label_width: u16,
) -> Paragraph<'static> {
    let label_style = if focused { palette.title() } else { palette.muted() };
    let label = format!("{}: ", choice.label);
    let pad = (label_width as usize).saturating_sub(label.chars().count());
    let mut spans = vec![Span::styled(label, label_style), Span::raw(" ".repeat(pad))];
    for (i, option) in choice.options.iter().enumerate() {
        let style = if i == choice.index {
            palette.selected()
        } else {
            palette.muted()
        };
        spans.push(Span::styled(format!(" {} ", option), style));
    }
    if focused {
        spans.push(Span::styled("  ←/→", palette.muted()));
    }
    Paragraph::new(Line::from(spans))
}

/// Draw whichever dialog is open
pub fn render(frame: &mut Frame, app: &App) {
    match &app.dialog {
        ActiveDialog::None => {}
        ActiveDialog::Transaction => transaction::render(frame, app),
        ActiveDialog::Category => category::render(frame, app),
        ActiveDialog::Limit => limit::render(frame, app),
        ActiveDialog::Goal => goal::render(frame, app),
        ActiveDialog::Transfer => goal::render_transfer(frame, app),
        ActiveDialog::Confirm(target) => confirm::render(frame, app, target),
        ActiveDialog::Help => help::render(frame, app),
    }
}

/// Route a key to the open dialog
pub fn handle_key(app: &mut App, key: KeyEvent) {
    match app.dialog.clone() {
        ActiveDialog::None => {}
        ActiveDialog::Transaction => transaction::handle_key(app, key),
        ActiveDialog::Category => category::handle_key(app, key),
        ActiveDialog::Limit => limit::handle_key(app, key),
        ActiveDialog::Goal => goal::handle_key(app, key),
        ActiveDialog::Transfer => goal::handle_transfer_key(app, key),
        ActiveDialog::Confirm(target) => confirm::handle_key(app, key, target),
        ActiveDialog::Help => help::handle_key(app, key),
    }
}

/// Centered area holding `rows` lines inside a border
pub fn boxed(width: u16, rows: u16, screen: Rect) -> Rect {
    centered_rect_fixed(width, rows + 2, screen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::widgets::{Choice, TextInput};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn fields() -> FormFields {
        FormFields::new(vec![
            TextInput::new().label("Amount"),
            TextInput::new().label("Note"),
        ])
        .with_choice(Choice::new("Type", &["Expense", "Income"]))
    }

    #[test]
    fn test_typing_goes_to_focused_input() {
        let mut f = fields();
        assert_eq!(edit_form(&mut f, key(KeyCode::Tab)), FormAction::None);
        edit_form(&mut f, key(KeyCode::Char('4')));
        edit_form(&mut f, key(KeyCode::Char('2')));
        edit_form(&mut f, key(KeyCode::Backspace));
        assert_eq!(f.value(0), "4");
        assert_eq!(f.value(1), "");
    }

    #[test]
    fn test_arrows_cycle_choice_row() {
        let mut f = fields();
        edit_form(&mut f, key(KeyCode::Right));
        assert_eq!(f.selected(), "Income");
        edit_form(&mut f, key(KeyCode::Left));
        assert_eq!(f.selected(), "Expense");
    }

    #[test]
    fn test_enter_and_esc() {
        let mut f = fields();
        assert_eq!(edit_form(&mut f, key(KeyCode::Enter)), FormAction::Submit);
        assert_eq!(edit_form(&mut f, key(KeyCode::Esc)), FormAction::Cancel);
    }

    #[test]
    fn test_validation_message_is_unwrapped() {
        let err = BudgetError::Validation("Amount must be a number".into());
        assert_eq!(form_message(&err), "Amount must be a number");
    }
}
