// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::Date;
use time::macros::format_description;

pub const DATE_LAYOUT: &str = "YYYY-MM-DD";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    InvalidDate,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDate => write!(f, "invalid date value; use {DATE_LAYOUT}"),
        }
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Blank input means "unset".
pub fn parse_optional_date(input: &str) -> ValidationResult<Option<Date>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Date::parse(trimmed, format_description!("[year]-[month]-[day]"))
        .map(Some)
        .map_err(|_| ValidationError::InvalidDate)
}

pub fn format_date(value: Option<Date>) -> String {
    value
        .and_then(|date| date.format(format_description!("[year]-[month]-[day]")).ok())
        .unwrap_or_default()
}

/// Whole Australian dollars, grouped by thousands: `$1,234,568`.
pub fn format_currency(value: f64) -> String {
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let dollars = rounded.abs() as u64;
    format!("{sign}${}", comma_format(dollars))
}

pub fn format_optional_currency(value: Option<f64>) -> String {
    value.map_or_else(String::new, format_currency)
}

/// Keeps the calendar-date part of a service timestamp such as
/// `2025-02-11T04:12:00.000+0000`.
pub fn timestamp_date_part(raw: &str) -> &str {
    let trimmed = raw.trim();
    match trimmed.find('T') {
        Some(index) => &trimmed[..index],
        None => trimmed,
    }
}

/// Drops markup tags from rich-text cells and collapses whitespace.
pub fn strip_markup(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_tag = false;
    for ch in raw.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn comma_format(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{
        ValidationError, format_currency, format_date, format_optional_currency,
        parse_optional_date, strip_markup, timestamp_date_part,
    };
    use time::{Date, Month};

    #[test]
    fn format_currency_groups_and_rounds() {
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(999.4), "$999");
        assert_eq!(format_currency(1_234_567.6), "$1,234,568");
        assert_eq!(format_currency(-1_234.5), "-$1,235");
        assert_eq!(format_currency(1_000.0), "$1,000");
    }

    #[test]
    fn optional_currency_is_blank_when_missing() {
        assert_eq!(format_optional_currency(None), "");
        assert_eq!(format_optional_currency(Some(45_000_000.0)), "$45,000,000");
    }

    #[test]
    fn parse_optional_date_test() {
        assert_eq!(parse_optional_date("  "), Ok(None));
        assert_eq!(
            parse_optional_date("2025-01-31"),
            Ok(Some(
                Date::from_calendar_date(2025, Month::January, 31).expect("valid date")
            ))
        );
        assert_eq!(
            parse_optional_date("31/01/2025"),
            Err(ValidationError::InvalidDate)
        );
        assert_eq!(
            parse_optional_date("2025-02-30"),
            Err(ValidationError::InvalidDate)
        );
    }

    #[test]
    fn format_date_is_blank_for_none() {
        assert_eq!(format_date(None), "");
        let date = Date::from_calendar_date(2024, Month::July, 9).expect("valid date");
        assert_eq!(format_date(Some(date)), "2024-07-09");
    }

    #[test]
    fn timestamp_keeps_date_part() {
        assert_eq!(
            timestamp_date_part("2025-02-11T04:12:00.000+0000"),
            "2025-02-11"
        );
        assert_eq!(timestamp_date_part("2025-02-11"), "2025-02-11");
    }

    #[test]
    fn strip_markup_removes_tags() {
        assert_eq!(
            strip_markup("<span style=\"color:red\">High</span>"),
            "High"
        );
        assert_eq!(strip_markup("<b>Hot</b><br/>lead"), "Hot lead");
        assert_eq!(strip_markup("plain"), "plain");
    }
}
