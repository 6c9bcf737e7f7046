//! Pages, sidebar and status bar

pub mod categories;
pub mod goals;
pub mod home;
pub mod limits;
pub mod settings;
pub mod sidebar;
pub mod status_bar;
pub mod transactions;

use ratatui::{
    layout::{Constraint, Rect},
    text::Span,
    widgets::{Block, Borders, Paragraph, Row, Table},
    Frame,
};

use super::app::{App, Page};
use super::dialogs;
use super::layout::AppLayout;
use super::theme::Palette;
use super::widgets::{toast_areas, ToastWidget};

/// Draw the whole screen
pub fn render(frame: &mut Frame, app: &App) {
    let layout = AppLayout::new(frame.area());

    sidebar::render(frame, app, layout.sidebar);
    match app.page {
        Page::Home => home::render(frame, app, layout.main),
        Page::Categories => categories::render(frame, app, layout.main),
        Page::Limits => limits::render(frame, app, layout.main),
        Page::Goals => goals::render(frame, app, layout.main),
        Page::Transactions => transactions::render(frame, app, layout.main),
        Page::Settings => settings::render(frame, app, layout.main),
    }
    status_bar::render(frame, app, layout.status_bar);

    if app.has_dialog() {
        dialogs::render(frame, app);
    }

    let toasts = app.toasts.visible();
    for (toast, area) in toasts.iter().zip(toast_areas(frame.area(), toasts.len())) {
        frame.render_widget(ToastWidget::new(toast), area);
    }
}

/// Bordered block with a styled title
pub fn page_block(title: &str, palette: Palette) -> Block<'static> {
    Block::default()
        .title(Span::styled(format!(" {} ", title), palette.title()))
        .borders(Borders::ALL)
        .border_style(palette.border(false))
}

/// Key hints for the bottom border of a page
pub fn hint(text: &'static str, palette: Palette) -> Span<'static> {
    Span::styled(text, palette.muted())
}

/// Draw a table with one selected row, scrolled to keep it visible
pub fn render_table<'a, const N: usize>(
    frame: &mut Frame,
    area: Rect,
    block: Block<'a>,
    header: [&'a str; N],
    widths: [Constraint; N],
    rows: Vec<Row<'a>>,
    selected: usize,
    palette: Palette,
) {
    let (start, end) = visible_window(selected, rows.len(), area);
    let rows: Vec<Row> = rows
        .into_iter()
        .enumerate()
        .skip(start)
        .take(end - start)
        .map(|(i, row)| {
            if i == selected {
                row.style(palette.selected())
            } else {
                row
            }
        })
        .collect();
    let table = Table::new(rows, widths)
        .header(Row::new(header).style(palette.muted()))
        .block(block);
    frame.render_widget(table, area);
}

/// Placeholder text for a page with nothing to list
pub fn render_empty(frame: &mut Frame, area: Rect, block: Block<'_>, text: &str, palette: Palette) {
    frame.render_widget(Paragraph::new(text).style(palette.muted()).block(block), area);
}

/// Range of table rows to draw so `selected` stays on screen
///
/// `area` is the bordered table including its header row.
pub fn visible_window(selected: usize, len: usize, area: Rect) -> (usize, usize) {
    let rows = area.height.saturating_sub(3) as usize;
    if rows == 0 || len <= rows {
        return (0, len);
    }
    let start = selected.saturating_sub(rows - 1);
    (start, (start + rows).min(len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_window_follows_selection() {
        let area = Rect::new(0, 0, 40, 13);
        assert_eq!(visible_window(0, 5, area), (0, 5));
        assert_eq!(visible_window(0, 50, area), (0, 10));
        assert_eq!(visible_window(25, 50, area), (16, 26));
        assert_eq!(visible_window(49, 50, area), (40, 50));
    }
}
