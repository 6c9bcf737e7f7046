//! Toasts: short messages stacked in the top right corner

use std::time::{Duration, Instant};

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

/// Toasts shown at once; older ones wait their turn
pub const MAX_VISIBLE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Warning,
    Error,
}

impl ToastKind {
    pub fn color(&self) -> Color {
        match self {
            Self::Info => Color::Blue,
            Self::Success => Color::Green,
            Self::Warning => Color::Yellow,
            Self::Error => Color::Red,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Success => "Done",
            Self::Warning => "Heads up",
            Self::Error => "Error",
        }
    }

    fn lifetime(&self) -> Duration {
        match self {
            Self::Error => Duration::from_secs(6),
            Self::Warning => Duration::from_secs(5),
            _ => Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub created_at: Instant,
    pub lifetime: Duration,
}

impl Toast {
    pub fn new(message: impl Into<String>, kind: ToastKind) -> Self {
        Self {
            message: message.into(),
            kind,
            created_at: Instant::now(),
            lifetime: kind.lifetime(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, ToastKind::Info)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, ToastKind::Success)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, ToastKind::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, ToastKind::Error)
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) >= self.lifetime
    }
}

#[derive(Debug, Default)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, toast: Toast) {
        self.toasts.push(toast);
    }

    pub fn remove_expired(&mut self) {
        self.remove_expired_at(Instant::now());
    }

    /// Only shown toasts age; queued ones restart their clock when they appear
    pub fn remove_expired_at(&mut self, now: Instant) {
        let mut kept = Vec::with_capacity(self.toasts.len());
        for (i, toast) in self.toasts.drain(..).enumerate() {
            let shown = i < MAX_VISIBLE;
            if shown && toast.is_expired_at(now) {
                continue;
            }
            kept.push((toast, shown));
        }
        for (i, (toast, shown)) in kept.iter_mut().enumerate() {
            if i < MAX_VISIBLE && !*shown {
                toast.created_at = now;
            }
        }
        self.toasts = kept.into_iter().map(|(t, _)| t).collect();
    }

    pub fn visible(&self) -> &[Toast] {
        &self.toasts[..self.toasts.len().min(MAX_VISIBLE)]
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn clear(&mut self) {
        self.toasts.clear();
    }
}

pub struct ToastWidget<'a> {
    toast: &'a Toast,
}

impl<'a> ToastWidget<'a> {
    pub fn new(toast: &'a Toast) -> Self {
        Self { toast }
    }
}

impl Widget for ToastWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let color = self.toast.kind.color();
        Clear.render(area, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .title(format!(" {} ", self.toast.kind.title()))
            .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD));

        Paragraph::new(self.toast.message.as_str())
            .wrap(Wrap { trim: true })
            .block(block)
            .render(area, buf);
    }
}

/// Areas for the visible toasts, top right and stacked downwards
pub fn toast_areas(screen: Rect, count: usize) -> Vec<Rect> {
    let width = 44.min(screen.width);
    let height = 4;
    (0..count)
        .map(|i| {
            let y = screen.y + 1 + (i as u16) * height;
            Rect::new(screen.x + screen.width - width, y, width, height)
        })
        .filter(|r| r.y + r.height <= screen.y + screen.height)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_shows_at_most_three() {
        let mut queue = ToastQueue::new();
        for i in 0..5 {
            queue.push(Toast::info(format!("toast {}", i)));
        }
        assert_eq!(queue.visible().len(), MAX_VISIBLE);
        assert_eq!(queue.visible()[0].message, "toast 0");
    }

    #[test]
    fn test_expired_toasts_make_room() {
        let mut queue = ToastQueue::new();
        for i in 0..4 {
            queue.push(Toast::info(format!("toast {}", i)));
        }
        let later = Instant::now() + Duration::from_secs(4);
        queue.remove_expired_at(later);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.visible()[0].message, "toast 3");
        assert!(!queue.visible()[0].is_expired_at(later));
    }

    #[test]
    fn test_errors_stay_longer() {
        let now = Instant::now();
        let error = Toast::error("boom");
        assert!(!error.is_expired_at(now + Duration::from_secs(4)));
        assert!(Toast::success("ok").is_expired_at(now + Duration::from_secs(4)));
    }

    #[test]
    fn test_toast_areas_fit_screen() {
        let areas = toast_areas(Rect::new(0, 0, 80, 10), 3);
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0].x, 36);
    }
}
