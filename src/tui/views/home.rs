//! Home page: the budget total, one card per member and the latest activity
//!
//! A dashed "invite" card takes the next free slot while the budget has
//! room for another member.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use crate::models::{MemberRole, MAX_MEMBERS};
use crate::sync::MemberCard;
use crate::tui::app::App;
use crate::tui::layout::{columns, PageLayout};
use crate::tui::theme::Palette;

use super::page_block;

/// Latest transactions listed under the cards
const RECENT: usize = 5;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let layout = PageLayout::new(area, 4);
    render_total(frame, app, layout.header);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(3)])
        .split(layout.content);
    render_cards(frame, app, chunks[0]);
    render_recent(frame, app, chunks[1]);
}

fn render_total(frame: &mut Frame, app: &App, area: Rect) {
    let palette = app.palette;
    let display = app.currency.currency();
    let total = app.live.total_balance();
    let members = app.budget().map(|b| b.members.len()).unwrap_or(0);

    let lines = vec![
        Line::from(vec![
            Span::styled("Family balance  ", palette.muted()),
            Span::styled(
                app.live.total_balance_text(&app.currency, display),
                palette.amount(total.is_negative()).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(
            format!("{} of {} members", members, MAX_MEMBERS),
            palette.muted(),
        )),
    ];
    let title = app.budget().map(|b| b.name.as_str()).unwrap_or("Budget");
    frame.render_widget(Paragraph::new(lines).block(page_block(title, palette)), area);
}

fn render_cards(frame: &mut Frame, app: &App, area: Rect) {
    let palette = app.palette;
    let cards = app.live.member_cards(&app.currency, app.currency.currency());
    let slots = cards.len() + usize::from(app.live.invite_slot_visible());
    let areas = columns(area, slots.max(1));

    for (card, rect) in cards.iter().zip(areas.iter()) {
        render_card(frame, card, card.user_id == app.user.id, palette, *rect);
    }
    if app.live.invite_slot_visible() {
        if let Some(rect) = areas.get(cards.len()) {
            let code = app
                .budget()
                .map(|b| b.invite_code.clone())
                .unwrap_or_default();
            render_invite(frame, &code, palette, *rect);
        }
    }
}

fn render_card(frame: &mut Frame, card: &MemberCard, is_you: bool, palette: Palette, area: Rect) {
    let mut title = format!(" {} {} ", card.initials, card.name);
    if is_you {
        title.push_str("(you) ");
    }
    let block = Block::default()
        .title(Span::styled(title, palette.title()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(palette.border(is_you));

    let role = match card.role {
        MemberRole::Owner => "owner",
        MemberRole::Member => "member",
    };
    let lines = vec![
        Line::from(Span::styled(
            card.balance_text.clone(),
            palette.amount(card.is_negative()).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("+ ", palette.amount(false)),
            Span::styled(card.income_text.clone(), palette.text()),
        ]),
        Line::from(vec![
            Span::styled("- ", palette.amount(true)),
            Span::styled(card.expenses_text.clone(), palette.text()),
        ]),
        Line::from(Span::styled(role, palette.muted())),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_invite(frame: &mut Frame, code: &str, palette: Palette, area: Rect) {
    let block = Block::default()
        .title(Span::styled(" + Invite ", palette.muted()))
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .border_style(Style::default().fg(palette.muted).add_modifier(Modifier::DIM));
    let lines = vec![
        Line::from(Span::styled("Share this code:", palette.muted())),
        Line::from(Span::styled(code.to_string(), palette.title())),
        Line::from(Span::styled("famb budget join <code>", palette.muted())),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_recent(frame: &mut Frame, app: &App, area: Rect) {
    let palette = app.palette;
    let transactions = app.transactions();
    let lines: Vec<Line> = if transactions.is_empty() {
        vec![Line::from(Span::styled(
            "No transactions yet. Press i or e to add one.",
            palette.muted(),
        ))]
    } else {
        transactions
            .iter()
            .take(RECENT)
            .map(|t| {
                let sign = if t.is_income() { "+" } else { "-" };
                let mut spans = vec![
                    Span::styled(format!("{}  ", t.date.format("%d.%m")), palette.muted()),
                    Span::styled(
                        format!("{}{:>14}", sign, app.money(t.amount)),
                        palette.amount(!t.is_income()),
                    ),
                    Span::styled(format!("  {:<16}", t.category), palette.text()),
                    Span::styled(t.user_name.clone(), palette.muted()),
                ];
                if app.live.is_pending(t.id) {
                    spans.push(Span::styled(" (saving)", Style::default().fg(palette.warning)));
                }
                Line::from(spans)
            })
            .collect()
    };
    frame.render_widget(
        Paragraph::new(lines).block(page_block("Recent activity", palette)),
        area,
    );
}
