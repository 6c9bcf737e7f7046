//! Shortcut overview for the current page

use crossterm::event::KeyEvent;
use ratatui::{
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::tui::app::App;
use crate::tui::keybindings::{bindings_for, key_label, KeyContext};
use crate::tui::theme::Palette;

use super::boxed;

pub fn render(frame: &mut Frame, app: &App) {
    let palette = app.palette;
    let lines = help_lines(app, palette);
    let area = boxed(52, lines.len() as u16, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(Span::styled(" Help ", palette.title()))
        .borders(Borders::ALL)
        .border_style(palette.border(true));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn help_lines(app: &App, palette: Palette) -> Vec<Line<'static>> {
    let sections = [
        ("Everywhere", KeyContext::Global),
        (app.page.title(), KeyContext::Page(app.page)),
        ("In dialogs", KeyContext::Dialog),
    ];
    let mut lines = Vec::new();
    for (title, context) in sections {
        let bindings: Vec<_> = bindings_for(context).collect();
        if bindings.is_empty() {
            continue;
        }
        if !lines.is_empty() {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            title,
            palette.title().add_modifier(Modifier::UNDERLINED),
        )));
        for binding in bindings {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<10}", key_label(&binding.key)), palette.title()),
                Span::styled(binding.description, palette.text()),
            ]));
        }
    }
    lines
}

/// Any key closes help
pub fn handle_key(app: &mut App, _key: KeyEvent) {
    app.close_dialog();
}
