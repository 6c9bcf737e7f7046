//! Limits page: each limit with what was spent in its current window

use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::Span,
    widgets::{Cell, Row},
    Frame,
};

use crate::display::format::{percent, progress_bar};
use crate::display::status_marker;
use crate::models::LimitStatus;
use crate::tui::app::App;

use super::{hint, page_block, render_empty, render_table};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let palette = app.palette;
    let block = page_block("Limits", palette).title_bottom(hint(" a set  d remove ", palette));
    let usage = app.limits();
    if usage.is_empty() {
        render_empty(
            frame,
            area,
            block,
            "No spending limits. Press a to set one for an expense category.",
            palette,
        );
        return;
    }

    let rows = usage
        .iter()
        .map(|u| {
            let color = match u.status {
                LimitStatus::Ok => palette.positive,
                LimitStatus::Warning => palette.warning,
                LimitStatus::Exceeded => palette.negative,
            };
            Row::new(vec![
                Cell::from(u.limit.category.clone()),
                Cell::from(u.limit.period.to_string()),
                Cell::from(format!("{} / {}", app.money(u.spent), app.money(u.limit.amount))),
                Cell::from(Span::styled(
                    format!("{} {}", progress_bar(u.percent, 10), percent(u.percent)),
                    Style::default().fg(color),
                )),
                Cell::from(Span::styled(status_marker(u.status), Style::default().fg(color))),
            ])
        })
        .collect();

    render_table(
        frame,
        area,
        block,
        ["Category", "Period", "Spent", "Used", "Status"],
        [
            Constraint::Min(14),
            Constraint::Length(8),
            Constraint::Length(28),
            Constraint::Length(17),
            Constraint::Length(8),
        ],
        rows,
        app.selected,
        palette,
    );
}
