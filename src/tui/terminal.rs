//! Terminal setup, teardown and the main loop

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::panic;
use tracing::{info, warn};

use crate::cli::CliContext;
use crate::config::Settings;
use crate::storage::Storage;
use crate::sync::{subscribe_all, unsubscribe_all};

use super::app::App;
use super::event::{Event, EventHandler};
use super::handler::handle_event;
use super::views;

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Raw mode plus alternate screen; a panic restores the terminal first
pub fn init_terminal() -> Result<Tui> {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

pub fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

/// Run the TUI for the signed-in user's active budget
pub fn run_tui(storage: &Storage, settings: Settings) -> Result<()> {
    // resolve the user before touching the terminal so errors print normally
    let ctx = CliContext::new(storage, settings.clone())?;
    let user = ctx.user()?;
    let budget = ctx.active_budget(&user)?;
    info!(budget_id = %budget.id, user = %user.email, "starting tui");

    let events = EventHandler::default();
    let mut app = App::new(storage, settings, user, budget.id);

    let sender = events.sender();
    let subscriptions = subscribe_all(storage, budget.id, move |event| {
        // the receiver is gone once the loop has ended
        let _ = sender.send(Event::Store(event.clone()));
    })?;

    let mut terminal = init_terminal()?;
    let result = run_loop(&mut terminal, &mut app, &events);
    restore_terminal()?;

    if let Err(e) = unsubscribe_all(storage, subscriptions) {
        warn!(error = %e, "failed to drop subscriptions");
    }
    info!("tui closed");
    result
}

fn run_loop(terminal: &mut Tui, app: &mut App, events: &EventHandler) -> Result<()> {
    loop {
        terminal.draw(|frame| views::render(frame, app))?;

        handle_event(app, events.next()?);
        for event in events.drain() {
            handle_event(app, event);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
