//! Settings page

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::currency::RateOrigin;
use crate::tui::app::App;
use crate::tui::theme::Palette;

use super::{hint, page_block};

fn setting<'a>(key: &'a str, label: &'a str, value: String, palette: Palette) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!(" {}  ", key), palette.title()),
        Span::styled(format!("{:<20}", label), palette.text()),
        Span::styled(value, palette.muted()),
    ])
}

fn on_off(value: bool) -> String {
    if value { "on" } else { "off" }.to_string()
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let palette = app.palette;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(4)])
        .split(area);

    let settings = &app.settings;
    let display = app.currency.currency();
    let lines = vec![
        setting("t", "Theme", settings.theme.to_string(), palette),
        setting(
            "c",
            "Display currency",
            format!("{} ({})", display.name(), display.symbol()),
            palette,
        ),
        setting("n", "Notifications", on_off(settings.notifications), palette),
        setting("s", "Auto sync", on_off(settings.auto_sync), palette),
        setting("r", "Exchange rates", rates_status(app), palette),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(page_block("Settings", palette)),
        chunks[0],
    );

    let budget_currency = app.budget_currency();
    let rates: Vec<Line> = app
        .currency
        .available()
        .into_iter()
        .map(|info| {
            let marker = if info.currency == display { "*" } else { " " };
            Line::from(vec![
                Span::styled(format!(" {} ", marker), palette.title()),
                Span::styled(format!("{:<4}", info.currency.code()), palette.text()),
                Span::styled(format!("{:>10.4}", info.rate), palette.muted()),
            ])
        })
        .collect();
    let title = format!("Rates (budget kept in {})", budget_currency.code());
    frame.render_widget(
        Paragraph::new(rates).block(
            page_block(&title, palette)
                .title_bottom(hint(" amounts are converted for display only ", palette)),
        ),
        chunks[1],
    );
}

fn rates_status(app: &App) -> String {
    let rates = app.currency.rates();
    match (rates.origin, rates.updated_at) {
        (RateOrigin::Remote, Some(at)) => format!("live, fetched {}", at.format("%Y-%m-%d %H:%M")),
        _ => "built-in table".to_string(),
    }
}
