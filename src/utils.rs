//! Shared utility functions

use chrono::{Datelike, NaiveDate};
use crossterm::style::Color;

/// Parse a `#rrggbb` (or `#rgb`) color into a terminal color
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let digits = hex.strip_prefix('#')?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();

    match digits.len() {
        6 => Some(Color::Rgb {
            r: channel(&digits[0..2])?,
            g: channel(&digits[2..4])?,
            b: channel(&digits[4..6])?,
        }),
        3 => {
            let expand = |s: &str| channel(s).map(|v| v * 17);
            Some(Color::Rgb {
                r: expand(&digits[0..1])?,
                g: expand(&digits[1..2])?,
                b: expand(&digits[2..3])?,
            })
        }
        _ => None,
    }
}

/// Like `parse_hex_color`, falling back to a named color for bad input
pub fn color_or(hex: Option<&str>, fallback: Color) -> Color {
    hex.and_then(parse_hex_color).unwrap_or(fallback)
}

pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", truncated)
    }
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First day of the month after `date`'s month
pub fn next_month_start(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

/// First day of the month before `date`'s month
pub fn prev_month_start(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 1 {
        (date.year() - 1, 12)
    } else {
        (date.year(), date.month() - 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    match date.month() {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            let year = date.year();
            if (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#32CD32"), Some(Color::Rgb { r: 50, g: 205, b: 50 }));
        assert_eq!(parse_hex_color("#ffa500"), Some(Color::Rgb { r: 255, g: 165, b: 0 }));
        assert_eq!(parse_hex_color("#fff"), Some(Color::Rgb { r: 255, g: 255, b: 255 }));
        assert_eq!(parse_hex_color("32CD32"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#ééé"), None);
    }

    #[test]
    fn test_color_or() {
        assert_eq!(color_or(Some("green"), Color::Green), Color::Green);
        assert_eq!(color_or(None, Color::Blue), Color::Blue);
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("a longer title", 6), "a lon…");
    }

    #[test]
    fn test_month_boundaries() {
        assert_eq!(next_month_start(date(2024, 12, 31)), date(2025, 1, 1));
        assert_eq!(prev_month_start(date(2024, 1, 15)), date(2023, 12, 1));
        assert_eq!(first_of_month(date(2024, 3, 20)), date(2024, 3, 1));
        assert_eq!(days_in_month(date(2024, 2, 1)), 29);
        assert_eq!(days_in_month(date(2023, 2, 1)), 28);
        assert_eq!(days_in_month(date(1900, 2, 1)), 28);
        assert_eq!(days_in_month(date(2024, 4, 1)), 30);
    }
}
