//! Budget name and page switcher

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::tui::app::{App, Page};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(3)])
        .split(area);

    render_header(frame, app, chunks[0]);
    render_pages(frame, app, chunks[1]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let palette = app.palette;
    let name = app
        .budget()
        .map(|b| b.name.clone())
        .unwrap_or_else(|| "Loading...".to_string());
    let block = Block::default()
        .title(Span::styled(" famb ", palette.title()))
        .borders(Borders::ALL)
        .border_style(palette.border(false));

    let lines = vec![
        Line::from(Span::styled(name, palette.text().add_modifier(Modifier::BOLD))),
        Line::from(Span::styled(app.user.display_name.clone(), palette.muted())),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_pages(frame: &mut Frame, app: &App, area: Rect) {
    let palette = app.palette;
    let items: Vec<ListItem> = Page::ALL
        .iter()
        .enumerate()
        .map(|(i, page)| {
            let style = if *page == app.page {
                palette.selected().fg(palette.accent)
            } else {
                palette.text()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!(" {} ", i + 1), palette.muted()),
                Span::styled(format!("{} {}", page.icon(), page.title()), style),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.border(false))
        .title_bottom(Span::styled(" ? help ", Style::default().fg(palette.muted)));
    frame.render_widget(List::new(items).block(block), area);
}
