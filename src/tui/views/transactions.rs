//! Transactions page: the live list, newest first

use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::Span,
    widgets::{Cell, Row},
    Frame,
};

use crate::display::format::truncate;
use crate::tui::app::App;

use super::{hint, page_block, render_empty, render_table};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let palette = app.palette;
    let block = page_block("Transactions", palette)
        .title_bottom(hint(" i income  e expense  d delete ", palette));
    let transactions = app.transactions();
    if transactions.is_empty() {
        render_empty(frame, area, block, "No transactions yet.", palette);
        return;
    }

    let rows = transactions
        .iter()
        .map(|t| {
            let sign = if t.is_income() { "+" } else { "-" };
            let mut who = t.user_name.clone();
            if app.live.is_pending(t.id) {
                who.push_str(" …");
            }
            Row::new(vec![
                Cell::from(t.date.format("%Y-%m-%d").to_string()),
                Cell::from(Span::styled(
                    format!("{}{}", sign, app.money(t.amount)),
                    palette.amount(!t.is_income()),
                )),
                Cell::from(t.category.clone()),
                Cell::from(Span::styled(truncate(&t.description, 30), palette.muted())),
                Cell::from(Span::styled(who, Style::default().fg(palette.accent))),
            ])
        })
        .collect();

    render_table(
        frame,
        area,
        block,
        ["Date", "Amount", "Category", "Description", "Member"],
        [
            Constraint::Length(10),
            Constraint::Length(16),
            Constraint::Length(16),
            Constraint::Min(12),
            Constraint::Length(16),
        ],
        rows,
        app.selected,
        palette,
    );
}
