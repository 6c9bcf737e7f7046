//! Small text formatting helpers shared by the CLI and the TUI

use chrono::{DateTime, Utc};

/// Palette category colors are picked from
const CATEGORY_PALETTE: [&str; 19] = [
    "#F44336", "#E91E63", "#9C27B0", "#673AB7", "#3F51B5", "#2196F3", "#03A9F4", "#00BCD4",
    "#009688", "#4CAF50", "#8BC34A", "#CDDC39", "#FFEB3B", "#FFC107", "#FF9800", "#FF5722",
    "#795548", "#9E9E9E", "#607D8B",
];

/// Up to two upper-case initials
///
/// A single word gives its first two letters, several words give the first
/// letter of the first two words.
pub fn initials(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    match words.as_slice() {
        [] => "??".to_string(),
        [word] => word.chars().take(2).collect::<String>().to_uppercase(),
        [first, second, ..] => first
            .chars()
            .take(1)
            .chain(second.chars().take(1))
            .collect::<String>()
            .to_uppercase(),
    }
}

/// Stable color for a category name
pub fn category_color(name: &str) -> String {
    let hash = name
        .chars()
        .fold(0i32, |hash, c| (c as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash)));
    let index = (hash.unsigned_abs() as usize) % CATEGORY_PALETTE.len();
    CATEGORY_PALETTE[index].to_string()
}

/// Pick the singular or plural form for a count
pub fn pluralize<'a>(count: i64, one: &'a str, many: &'a str) -> &'a str {
    if count.abs() == 1 {
        one
    } else {
        many
    }
}

/// "3 members", "1 transaction"
pub fn count_label(count: usize, one: &str, many: &str) -> String {
    format!("{} {}", count, pluralize(count as i64, one, many))
}

/// Human-readable age of a timestamp relative to `now`
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }

    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{} {} ago", minutes, pluralize(minutes, "minute", "minutes"));
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{} {} ago", hours, pluralize(hours, "hour", "hours"));
    }
    let days = hours / 24;
    if days < 7 {
        return format!("{} {} ago", days, pluralize(days, "day", "days"));
    }
    let weeks = days / 7;
    if weeks < 4 {
        return format!("{} {} ago", weeks, pluralize(weeks, "week", "weeks"));
    }
    let months = days / 30;
    if months < 12 {
        return format!("{} {} ago", months.max(1), pluralize(months.max(1), "month", "months"));
    }
    let years = days / 365;
    format!("{} {} ago", years.max(1), pluralize(years.max(1), "year", "years"))
}

/// Shorten text to `max` characters, ending with "..."
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().take(max).collect();
    }
    let mut short: String = text.chars().take(max - 3).collect();
    short.push_str("...");
    short
}

/// Upper-cased alphanumerics in groups of four joined by `-`
pub fn format_id(id: &str) -> String {
    let cleaned: Vec<char> = id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    cleaned
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("-")
}

/// Percentage with precision depending on size
pub fn percent(pct: f64) -> String {
    if pct > 0.0 && pct < 0.1 {
        format!("{:.2}%", pct)
    } else if pct < 10.0 {
        format!("{:.1}%", pct)
    } else {
        format!("{:.0}%", pct)
    }
}

/// Text progress bar, capped at full
pub fn progress_bar(pct: f64, width: usize) -> String {
    let filled = ((pct.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Hide most of the local part of an email address
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if local.chars().count() > 3 => {
            let visible: String = local.chars().take(3).collect();
            let hidden = "*".repeat(local.chars().count() - 3);
            format!("{}{}@{}", visible, hidden, domain)
        }
        _ => email.to_string(),
    }
}

pub fn file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}
