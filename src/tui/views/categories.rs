//! Categories page

use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::Span,
    widgets::{Cell, Row},
    Frame,
};

use crate::tui::app::App;
use crate::tui::theme::hex_color;

use super::{hint, page_block, render_empty, render_table};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let palette = app.palette;
    let block = page_block("Categories", palette).title_bottom(hint(" a add  d delete ", palette));
    let categories = app.categories(None);
    if categories.is_empty() {
        render_empty(frame, area, block, "No categories. Press a to add one.", palette);
        return;
    }

    let rows = categories
        .iter()
        .map(|c| {
            let swatch = hex_color(&c.color).unwrap_or(palette.accent);
            Row::new(vec![
                Cell::from(Span::styled("██", Style::default().fg(swatch))),
                Cell::from(format!("{} {}", c.icon, c.name)),
                Cell::from(Span::styled(c.kind.to_string(), palette.amount(!c.kind.is_income()))),
            ])
        })
        .collect();

    render_table(
        frame,
        area,
        block,
        ["", "Name", "Type"],
        [Constraint::Length(3), Constraint::Min(20), Constraint::Length(10)],
        rows,
        app.selected,
        palette,
    );
}
