//! Yes/no confirmation before a delete

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::tui::app::{App, DeleteTarget};

use super::boxed;

pub fn render(frame: &mut Frame, app: &App, target: &DeleteTarget) {
    let palette = app.palette;
    let area = boxed(56, 5, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(Span::styled(
            " Confirm ",
            Style::default().fg(palette.warning),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.warning));

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(target.prompt(), palette.text())),
        Line::from(""),
        Line::from(vec![
            Span::styled("[y]", Style::default().fg(palette.positive)),
            Span::raw(" Yes  "),
            Span::styled("[n]", Style::default().fg(palette.negative)),
            Span::raw(" No"),
        ]),
    ];

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

pub fn handle_key(app: &mut App, key: KeyEvent, target: DeleteTarget) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
            if let Err(e) = app.confirm_delete(target) {
                app.report_error("delete", &e);
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.close_dialog(),
        _ => {}
    }
}
