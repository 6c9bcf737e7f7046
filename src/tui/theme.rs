//! Light and dark palettes

use ratatui::style::{Color, Modifier, Style};

use crate::config::Theme;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub border: Color,
    pub positive: Color,
    pub negative: Color,
    pub warning: Color,
    pub highlight_bg: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                background: Color::Reset,
                text: Color::Black,
                muted: Color::DarkGray,
                accent: Color::Blue,
                border: Color::Gray,
                positive: Color::Green,
                negative: Color::Red,
                warning: Color::Rgb(200, 120, 0),
                highlight_bg: Color::Rgb(220, 230, 245),
            },
            Theme::Dark => Self {
                background: Color::Reset,
                text: Color::White,
                muted: Color::DarkGray,
                accent: Color::Cyan,
                border: Color::DarkGray,
                positive: Color::LightGreen,
                negative: Color::LightRed,
                warning: Color::Yellow,
                highlight_bg: Color::Rgb(40, 50, 70),
            },
        }
    }

    pub fn text(&self) -> Style {
        Style::default().fg(self.text)
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn title(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn border(&self, focused: bool) -> Style {
        Style::default().fg(if focused { self.accent } else { self.border })
    }

    pub fn selected(&self) -> Style {
        Style::default()
            .bg(self.highlight_bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Green for money coming in, red for money going out
    pub fn amount(&self, negative: bool) -> Style {
        Style::default().fg(if negative { self.negative } else { self.positive })
    }
}

/// Parse `#RRGGBB` into a terminal color
pub fn hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_color() {
        assert_eq!(hex_color("#FF8000"), Some(Color::Rgb(255, 128, 0)));
        assert_eq!(hex_color("FF8000"), None);
        assert_eq!(hex_color("#GG0000"), None);
    }

    #[test]
    fn test_palettes_differ() {
        assert_ne!(
            Palette::for_theme(Theme::Light).text,
            Palette::for_theme(Theme::Dark).text
        );
    }
}
