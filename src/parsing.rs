//! Locale-aware numeric and date parsing.
//!
//! ERP exports mix native numbers, Brazilian-formatted strings
//! (`1.234.567,89`), accounting negatives (`(1.234,56)`, `1234,56-`),
//! debit/credit suffixes (`1500D`/`1500C`) and Excel serial dates. Parsing
//! never raises: a numeric failure is `NaN` (a "no value" marker, not zero)
//! and an unparseable date echoes the stringified original.

use chrono::{Days, NaiveDate};
use serde_json::Value;

/// Excel epoch: serial 1 is 1899-12-31 with the off-by-one 1900 leap bug
/// baked in, so the usable epoch is 1899-12-30.
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Parses a Brazilian-formatted number. Returns `NaN` when the cell holds
/// no parseable value; callers must treat `NaN` as absence, not as zero.
pub fn parse_brazilian_number(value: &Value) -> f64 {
    match value {
        Value::Null => f64::NAN,
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => parse_brazilian_str(s),
        _ => f64::NAN,
    }
}

/// Zero-defaulting variant used by the bank normalizers, where an empty
/// debit/credit cell means "no movement on this side".
pub fn parse_brazilian_number_or_zero(value: &Value) -> f64 {
    let parsed = parse_brazilian_number(value);
    if parsed.is_nan() {
        0.0
    } else {
        parsed
    }
}

fn parse_brazilian_str(raw: &str) -> f64 {
    let mut s: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '\u{a0}' && *c != ' ')
        .collect();
    if s.is_empty() {
        return f64::NAN;
    }

    // D/C suffix: debit stays positive, credit negates.
    let mut credit = false;
    let upper = s.to_uppercase();
    if upper.ends_with('C') {
        credit = true;
        s.pop();
    } else if upper.ends_with('D') {
        s.pop();
    }

    // Drop currency symbols and anything else that is not part of a number.
    s.retain(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-' | '(' | ')'));
    if s.is_empty() {
        return f64::NAN;
    }

    let mut negative = false;
    if s.starts_with('(') && s.ends_with(')') {
        negative = true;
        s = s[1..s.len() - 1].to_string();
    }
    if s.ends_with('-') {
        negative = true;
        s.pop();
    }
    if let Some(rest) = s.strip_prefix('-') {
        negative = true;
        s = rest.to_string();
    }

    // The rightmost separator decides the decimal mark.
    let last_comma = s.rfind(',');
    let last_dot = s.rfind('.');
    match (last_comma, last_dot) {
        (Some(c), Some(d)) => {
            if c > d {
                s = s.replace('.', "").replace(',', ".");
            } else {
                s = s.replace(',', "");
            }
        }
        (Some(_), None) => {
            s = s.replace(',', ".");
        }
        (None, Some(_)) => {
            if s.matches('.').count() > 1 {
                s = s.replace('.', "");
            }
        }
        (None, None) => {}
    }

    match s.parse::<f64>() {
        Ok(v) if negative || credit => -v,
        Ok(v) => v,
        Err(_) => f64::NAN,
    }
}

fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    let (y, m, d) = EXCEL_EPOCH;
    let days = serial.trunc();
    if !(0.0..=200_000.0).contains(&days) {
        return None;
    }
    NaiveDate::from_ymd_opt(y, m, d)?.checked_add_days(Days::new(days as u64))
}

const DATE_FORMATS: &[&str] = &[
    "%d/%m/%Y",
    "%d/%m/%y",
    "%d-%m-%Y",
    "%Y-%m-%d",
    "%d.%m.%Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    // Numeric strings above 1000 are Excel serials.
    if let Ok(num) = s.replace(',', ".").parse::<f64>() {
        if num > 1000.0 {
            return excel_serial_to_date(num);
        }
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Calendar date behind a cell, when one exists.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Number(n) => {
            let num = n.as_f64()?;
            if num > 1000.0 {
                excel_serial_to_date(num)
            } else {
                None
            }
        }
        Value::String(s) => parse_date_str(s),
        _ => None,
    }
}

/// Formats any cell as a `DD/MM/YYYY` string. Unparseable input comes back
/// as the stringified original so nothing is silently lost.
pub fn format_date(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Number(n) => {
            let num = n.as_f64().unwrap_or(f64::NAN);
            if num > 1000.0 {
                if let Some(date) = excel_serial_to_date(num) {
                    return date.format("%d/%m/%Y").to_string();
                }
            }
            if num.fract() == 0.0 && num.is_finite() {
                format!("{}", num as i64)
            } else {
                n.to_string()
            }
        }
        Value::String(s) => match parse_date_str(s) {
            Some(date) => date.format("%d/%m/%Y").to_string(),
            None => s.trim().to_string(),
        },
        other => other.to_string(),
    }
}

/// Stringifies a cell for display fields (empty for null, unquoted strings).
pub fn cell_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
