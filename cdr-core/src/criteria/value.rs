//! Typed circumstance values and literal inference

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Date formats tried after RFC 3339 when inferring a literal's type
pub const DEFAULT_DATE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d"];

// Plain decimal or scientific notation only; `NaN` and `inf` stay text.
static NUMERIC_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("numeric literal pattern is valid")
});

/// The type tag of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueTag {
    Text,
    Number,
    Date,
}

impl ValueTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueTag::Text => "text",
            ValueTag::Number => "number",
            ValueTag::Date => "date",
        }
    }
}

impl fmt::Display for ValueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ValueTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(ValueTag::Text),
            "number" => Ok(ValueTag::Number),
            "date" => Ok(ValueTag::Date),
            _ => Err(format!("Unknown value type: {}", s)),
        }
    }
}

/// A typed circumstance or criterion value
///
/// Values of different tags never compare: `partial_cmp` returns `None` and
/// equality is false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Text(String),
    Number(f64),
    Date(DateTime<Utc>),
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    pub fn number(value: f64) -> Self {
        Value::Number(value)
    }

    pub fn date(value: DateTime<Utc>) -> Self {
        Value::Date(value)
    }

    pub fn tag(&self) -> ValueTag {
        match self {
            Value::Text(_) => ValueTag::Text,
            Value::Number(_) => ValueTag::Number,
            Value::Date(_) => ValueTag::Date,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Infer a value from the syntactic form of a literal using the default
    /// date formats.
    pub fn infer(literal: &str) -> Self {
        Self::infer_with(literal, DEFAULT_DATE_FORMATS)
    }

    /// Infer a value from a literal: a numeric literal becomes a Number, a
    /// parseable date becomes a Date, anything else is Text.
    pub fn infer_with<S: AsRef<str>>(literal: &str, date_formats: &[S]) -> Self {
        if let Some(n) = parse_number(literal) {
            return Value::Number(n);
        }
        if let Some(d) = parse_date(literal, date_formats) {
            return Value::Date(d);
        }
        Value::Text(literal.to_string())
    }

    /// Read a literal as an explicitly requested type.
    ///
    /// Returns `None` when the literal has no valid reading as `tag`.
    pub fn parse_as<S: AsRef<str>>(literal: &str, tag: ValueTag, date_formats: &[S]) -> Option<Self> {
        match tag {
            ValueTag::Text => Some(Value::Text(literal.to_string())),
            ValueTag::Number => parse_number(literal).map(Value::Number),
            ValueTag::Date => parse_date(literal, date_formats).map(Value::Date),
        }
    }
}

fn parse_number(literal: &str) -> Option<f64> {
    let trimmed = literal.trim();
    if !NUMERIC_LITERAL.is_match(trimmed) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_date<S: AsRef<str>>(literal: &str, formats: &[S]) -> Option<DateTime<Utc>> {
    let trimmed = literal.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in formats {
        let format = format.as_ref();
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return Some(Utc.from_utc_datetime(&naive));
            }
        }
    }
    None
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Date(d) => f.write_str(&d.to_rfc3339()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        let midnight = value.and_hms_opt(0, 0, 0).unwrap_or_default();
        Value::Date(Utc.from_utc_datetime(&midnight))
    }
}
