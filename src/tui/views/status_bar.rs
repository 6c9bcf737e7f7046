//! Bottom line: total balance, sync state and rate source

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::currency::RateOrigin;
use crate::tui::app::App;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let palette = app.palette;
    let total = app.live.total_balance();
    let display = app.currency.currency();

    let mut spans = vec![
        Span::styled(" Total: ", palette.muted()),
        Span::styled(
            app.live.total_balance_text(&app.currency, display),
            palette.amount(total.is_negative()).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" │ "),
    ];

    let pending = app.live.pending().len();
    if pending > 0 {
        spans.push(Span::styled(
            format!("{} unconfirmed", pending),
            Style::default().fg(palette.warning),
        ));
    } else if app.settings.auto_sync {
        spans.push(Span::styled("live", palette.amount(false)));
    } else {
        spans.push(Span::styled("sync paused (R to refresh)", palette.muted()));
    }

    spans.push(Span::raw(" │ "));
    let rates = match app.currency.rates().origin {
        RateOrigin::Remote => "rates: live",
        RateOrigin::Fallback => "rates: built-in",
    };
    spans.push(Span::styled(rates, palette.muted()));
    spans.push(Span::raw(" │ "));
    spans.push(Span::styled(
        "i income  e expense  ? help  q quit",
        palette.muted(),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
