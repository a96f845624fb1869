use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use regex::Regex;
use std::sync::OnceLock;

use crate::cell_value::CellValue;

/// Serial number of 1970-01-01 in the 1900 spreadsheet date system.
const UNIX_EPOCH_SERIAL: f64 = 25569.0;
/// Serial number of 9999-12-31.
const MAX_SERIAL: f64 = 2_958_465.0;

const GENERIC_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];
const GENERIC_DATE_FORMATS: &[&str] = &["%Y/%m/%d"];

const WEEKDAY_NAMES_PT: [&str; 7] = [
    "segunda-feira",
    "terça-feira",
    "quarta-feira",
    "quinta-feira",
    "sexta-feira",
    "sábado",
    "domingo",
];
const MONTH_NAMES_PT: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

#[derive(Debug, Clone, Copy)]
enum FieldOrder {
    DayFirst,
    YearFirst,
}

fn date_patterns() -> &'static [(Regex, FieldOrder)] {
    static PATTERNS: OnceLock<Vec<(Regex, FieldOrder)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (r"(\d{2})/(\d{2})/(\d{4})\s+(\d{2}):(\d{2})", FieldOrder::DayFirst),
            (r"(\d{2})/(\d{2})/(\d{4})", FieldOrder::DayFirst),
            (r"(\d{4})-(\d{2})-(\d{2})", FieldOrder::YearFirst),
            (r"(\d{2})-(\d{2})-(\d{4})", FieldOrder::DayFirst),
        ]
        .into_iter()
        .map(|(pattern, order)| (Regex::new(pattern).expect("invalid date regex"), order))
        .collect()
    })
}

/// Canonical day for any cell shape; `None` when the cell holds no usable date.
pub fn parse_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Empty | CellValue::Invalid(_) => None,
        CellValue::Date(date) => Some(*date),
        CellValue::Number(serial) => date_from_serial(*serial),
        CellValue::Text(text) => parse_date_text(text),
    }
}

pub fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    for (regex, order) in date_patterns() {
        let Some(caps) = regex.captures(text) else {
            continue;
        };
        let group = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
        let (year, month, day) = match order {
            FieldOrder::DayFirst => (group(3), group(2), group(1)),
            FieldOrder::YearFirst => (group(1), group(2), group(3)),
        };
        if let (Some(year), Some(month), Some(day)) = (year, month, day) {
            if let Some(date) = NaiveDate::from_ymd_opt(year as i32, month, day) {
                return Some(date);
            }
        }
    }

    parse_generic(text)
}

fn parse_generic(text: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.date_naive());
    }
    GENERIC_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            GENERIC_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        })
}

/// Day of a spreadsheet serial, any time-of-day fraction dropped.
pub fn date_from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial <= 0.0 || serial > MAX_SERIAL {
        return None;
    }
    let days = (serial - UNIX_EPOCH_SERIAL).floor() as i64;
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    epoch.checked_add_signed(Duration::days(days))
}

pub fn format_day(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(format_day).unwrap_or_else(|| "N/A".to_string())
}

/// Long pt-BR form, e.g. "quinta-feira, 8 de janeiro de 2026".
pub fn format_date_complete(date: Option<NaiveDate>) -> String {
    let Some(date) = date else {
        return "N/A".to_string();
    };
    let weekday = WEEKDAY_NAMES_PT[weekday_index(date.weekday())];
    let month = MONTH_NAMES_PT[date.month0() as usize];
    format!("{weekday}, {} de {month} de {}", date.day(), date.year())
}

fn weekday_index(weekday: Weekday) -> usize {
    weekday.num_days_from_monday() as usize
}

pub fn days_between(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Option<i64> {
    let (a, b) = (a?, b?);
    Some((b - a).num_days().abs())
}
