//! Goals page

use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::Span,
    widgets::{Cell, Row},
    Frame,
};

use crate::display::deadline_label;
use crate::display::format::{percent, progress_bar};
use crate::tui::app::App;
use crate::tui::theme::hex_color;

use super::{hint, page_block, render_empty, render_table};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let palette = app.palette;
    let block = page_block("Goals", palette)
        .title_bottom(hint(" a add  t transfer  d delete ", palette));
    let goals = app.goals();
    if goals.is_empty() {
        render_empty(frame, area, block, "No goals yet. Press a to add one.", palette);
        return;
    }

    let today = app.today();
    let rows = goals
        .iter()
        .map(|g| {
            let bar_color = if g.completed {
                palette.positive
            } else {
                hex_color(&g.color).unwrap_or(palette.accent)
            };
            let deadline_style = if g.is_overdue(today) {
                Style::default().fg(palette.negative)
            } else {
                palette.muted()
            };
            Row::new(vec![
                Cell::from(g.name.clone()),
                Cell::from(format!(
                    "{} / {}",
                    app.money(g.current_amount),
                    app.money(g.target_amount)
                )),
                Cell::from(Span::styled(
                    format!(
                        "{} {}",
                        progress_bar(g.progress_percent(), 12),
                        percent(g.progress_percent())
                    ),
                    Style::default().fg(bar_color),
                )),
                Cell::from(Span::styled(deadline_label(g, today), deadline_style)),
            ])
        })
        .collect();

    render_table(
        frame,
        area,
        block,
        ["Goal", "Saved", "Progress", "Deadline"],
        [
            Constraint::Min(16),
            Constraint::Length(28),
            Constraint::Length(18),
            Constraint::Length(22),
        ],
        rows,
        app.selected,
        palette,
    );
}
