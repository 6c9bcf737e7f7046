//! Routes events to the app
//!
//! Keys go to the open dialog first; otherwise global shortcuts are tried
//! before the ones of the current page.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::error::BudgetResult;
use crate::models::TransactionKind;

use super::app::{ActiveDialog, App, Page};
use super::dialogs;
use super::event::Event;

pub fn handle_event(app: &mut App, event: Event) {
    match event {
        Event::Key(key) => handle_key(app, key),
        Event::Store(event) => app.handle_store_event(&event),
        Event::Tick => app.on_tick(),
        Event::Resize(_, _) => {}
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.quit();
        return;
    }
    if app.has_dialog() {
        dialogs::handle_key(app, key);
        return;
    }
    if handle_global_key(app, key) {
        return;
    }
    if let Err(e) = handle_page_key(app, key) {
        app.report_error("settings", &e);
    }
}

/// Returns true when the key was a global shortcut
fn handle_global_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('?') => app.dialog = ActiveDialog::Help,
        KeyCode::Char(c @ '1'..='9') => match Page::from_digit(c) {
            Some(page) => app.switch_page(page),
            None => return false,
        },
        KeyCode::Char('j') | KeyCode::Down => app.move_down(),
        KeyCode::Char('k') | KeyCode::Up => app.move_up(),
        KeyCode::Char('i') => app.open_transaction_dialog(TransactionKind::Income),
        KeyCode::Char('e') => app.open_transaction_dialog(TransactionKind::Expense),
        KeyCode::Char('R') => app.refresh_now(),
        _ => return false,
    }
    true
}

fn handle_page_key(app: &mut App, key: KeyEvent) -> BudgetResult<()> {
    match (app.page, key.code) {
        (Page::Categories, KeyCode::Char('a')) => app.open_category_dialog(),
        (Page::Limits, KeyCode::Char('a')) => app.open_limit_dialog(),
        (Page::Goals, KeyCode::Char('a')) => app.open_goal_dialog(),
        (Page::Goals, KeyCode::Char('t')) => app.open_transfer_dialog(),
        (
            Page::Categories | Page::Limits | Page::Goals | Page::Transactions,
            KeyCode::Char('d') | KeyCode::Delete,
        ) => app.request_delete(),
        (Page::Settings, KeyCode::Char('t')) => app.toggle_theme()?,
        (Page::Settings, KeyCode::Char('c')) => app.cycle_display_currency()?,
        (Page::Settings, KeyCode::Char('n')) => app.toggle_notifications()?,
        (Page::Settings, KeyCode::Char('s')) => app.toggle_auto_sync()?,
        (Page::Settings, KeyCode::Char('r')) => app.refresh_rates(true),
        _ => {}
    }
    Ok(())
}
