//! Rule values and coercion
//!
//! Raw values arrive as JSON from the client. Operators coerce them into typed
//! [`Scalar`]s; anything that does not coerce is treated as malformed and the
//! operator emits nothing.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;

/// A typed value bound into a predicate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Scalar {
    /// Numeric view of the scalar, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Text used when displaying the scalar
    pub fn to_display(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => s.clone(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Compare a stored JSON value against this scalar.
    ///
    /// Returns `None` when the two are not comparable (including null).
    pub fn compare_json(&self, stored: &Value) -> Option<Ordering> {
        match self {
            Self::Int(rhs) => match stored {
                Value::Number(n) if n.is_i64() => n.as_i64().map(|lhs| lhs.cmp(rhs)),
                // Above i64::MAX
                Value::Number(n) if n.is_u64() => Some(Ordering::Greater),
                _ => json_to_f64(stored)?.partial_cmp(&(*rhs as f64)),
            },
            Self::Float(_) => {
                let lhs = json_to_f64(stored)?;
                lhs.partial_cmp(&self.as_f64()?)
            }
            Self::String(s) => match stored {
                Value::String(stored) => Some(stored.as_str().cmp(s.as_str())),
                Value::Number(_) => {
                    let rhs: f64 = s.trim().parse().ok()?;
                    json_to_f64(stored)?.partial_cmp(&rhs)
                }
                Value::Bool(b) => Some(bool_text(*b).cmp(s.as_str())),
                _ => None,
            },
            Self::Bool(b) => {
                let stored = match stored {
                    Value::Bool(v) => *v,
                    Value::Number(n) => n.as_f64()? != 0.0,
                    _ => return None,
                };
                Some(stored.cmp(b))
            }
            Self::Date(d) => {
                let stored = as_datetime(stored)?.date();
                Some(stored.cmp(d))
            }
            Self::DateTime(dt) => {
                let stored = as_datetime(stored)?;
                Some(stored.cmp(dt))
            }
        }
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<NaiveDate> for Scalar {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveDateTime> for Scalar {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

fn bool_text(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

/// A value is absent when it is missing, null, an empty string or an empty list
pub fn is_absent(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

/// Coerce to text; lists and objects do not coerce
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(bool_text(*b).to_string()),
        _ => None,
    }
}

/// Coerce to a number, keeping integers integral
pub fn as_number(value: &Value) -> Option<Scalar> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Scalar::Int(i))
            } else {
                n.as_f64().map(Scalar::Float)
            }
        }
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

fn parse_number(s: &str) -> Option<Scalar> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(Scalar::Int(i));
    }
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Scalar::Float)
}

/// Coerce to an equality-comparable scalar
pub fn as_scalar(value: &Value) -> Option<Scalar> {
    match value {
        Value::Bool(b) => Some(Scalar::Bool(*b)),
        Value::Number(_) => as_number(value),
        Value::String(s) => Some(Scalar::String(s.clone())),
        _ => None,
    }
}

/// Coerce a JSON list into scalars; a single non-scalar element spoils the list
pub fn as_scalar_list(value: &Value) -> Option<Vec<Scalar>> {
    match value {
        Value::Array(items) => items.iter().map(as_scalar).collect(),
        _ => None,
    }
}

/// Boolean coercion accepting the usual form encodings
pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "on" | "yes" => Some(true),
            "0" | "false" | "off" | "no" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Parse an ISO-ish date or datetime string
pub fn parse_datetime(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_utc());
    }

    const DATETIME_FORMATS: [&str; 6] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse a date, dropping any time component
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    parse_datetime(input).map(|dt| dt.date())
}

pub fn as_datetime(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => parse_datetime(s),
        _ => None,
    }
}

pub fn as_date(value: &Value) -> Option<NaiveDate> {
    as_datetime(value).map(|dt| dt.date())
}

/// Month number from `3`, `"3"` or `"2024-03"`
pub fn as_month(value: &Value) -> Option<u32> {
    let month = match value {
        Value::Number(n) => n.as_u64().and_then(|m| u32::try_from(m).ok())?,
        Value::String(s) => {
            let s = s.trim();
            match s.split_once('-') {
                Some((year, month)) if year.len() == 4 => month.parse().ok()?,
                _ => s.parse().ok()?,
            }
        }
        _ => return None,
    };
    (1..=12).contains(&month).then_some(month)
}

/// Year from `2024` or `"2024"`
pub fn as_year(value: &Value) -> Option<i32> {
    let year = match value {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok())?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (1..=9999).contains(&year).then_some(year)
}

pub(crate) fn json_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_absent() {
        assert!(is_absent(None));
        assert!(is_absent(Some(&json!(null))));
        assert!(is_absent(Some(&json!(""))));
        assert!(is_absent(Some(&json!([]))));
        assert!(!is_absent(Some(&json!(0))));
        assert!(!is_absent(Some(&json!(false))));
        assert!(!is_absent(Some(&json!({}))));
    }

    #[test]
    fn test_as_number() {
        assert_eq!(as_number(&json!(18)), Some(Scalar::Int(18)));
        assert_eq!(as_number(&json!(2.5)), Some(Scalar::Float(2.5)));
        assert_eq!(as_number(&json!(" 42 ")), Some(Scalar::Int(42)));
        assert_eq!(as_number(&json!("1.25")), Some(Scalar::Float(1.25)));
        assert_eq!(as_number(&json!("abc")), None);
        assert_eq!(as_number(&json!("NaN")), None);
        assert_eq!(as_number(&json!([1])), None);
    }

    #[test]
    fn test_as_text() {
        assert_eq!(as_text(&json!("John")), Some("John".to_string()));
        assert_eq!(as_text(&json!(7)), Some("7".to_string()));
        assert_eq!(as_text(&json!(["John"])), None);
        assert_eq!(as_text(&json!({"a": 1})), None);
    }

    #[test]
    fn test_parse_datetime_formats() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parse_date("2024-03-15"), Some(date));
        assert_eq!(
            parse_datetime("2024-03-15 10:30:00"),
            date.and_hms_opt(10, 30, 0)
        );
        assert_eq!(
            parse_datetime("2024-03-15T10:30"),
            date.and_hms_opt(10, 30, 0)
        );
        assert_eq!(
            parse_datetime("2024-03-15T10:30:00+02:00"),
            date.and_hms_opt(8, 30, 0)
        );
        assert_eq!(parse_datetime("not a date"), None);
        assert_eq!(parse_datetime("2024-13-45"), None);
    }

    #[test]
    fn test_as_month_and_year() {
        assert_eq!(as_month(&json!(3)), Some(3));
        assert_eq!(as_month(&json!("12")), Some(12));
        assert_eq!(as_month(&json!("2024-03")), Some(3));
        assert_eq!(as_month(&json!(13)), None);
        assert_eq!(as_month(&json!(0)), None);
        assert_eq!(as_year(&json!(2024)), Some(2024));
        assert_eq!(as_year(&json!("1999")), Some(1999));
        assert_eq!(as_year(&json!("soon")), None);
    }

    #[test]
    fn test_as_bool() {
        assert_eq!(as_bool(&json!(true)), Some(true));
        assert_eq!(as_bool(&json!("yes")), Some(true));
        assert_eq!(as_bool(&json!("0")), Some(false));
        assert_eq!(as_bool(&json!("maybe")), None);
    }

    #[test]
    fn test_scalar_compare_json() {
        assert_eq!(Scalar::Int(18).compare_json(&json!(25)), Some(Ordering::Greater));
        assert_eq!(Scalar::Int(18).compare_json(&json!("18")), Some(Ordering::Equal));
        assert_eq!(
            Scalar::String("active".into()).compare_json(&json!("active")),
            Some(Ordering::Equal)
        );
        assert_eq!(Scalar::Bool(true).compare_json(&json!(1)), Some(Ordering::Equal));
        assert_eq!(Scalar::Int(1).compare_json(&json!(null)), None);

        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(
            Scalar::Date(date).compare_json(&json!("2024-01-10 23:59:00")),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        let id = 9_007_199_254_740_993i64;
        assert_eq!(Scalar::Int(id).compare_json(&json!(id - 1)), Some(Ordering::Less));
        assert_eq!(Scalar::Int(id).compare_json(&json!(id)), Some(Ordering::Equal));
        assert_eq!(Scalar::Int(i64::MAX).compare_json(&json!(u64::MAX)), Some(Ordering::Greater));
        assert_eq!(Scalar::Int(2).compare_json(&json!(2.5)), Some(Ordering::Greater));

        let predicate = crate::Predicate::compare("id", crate::CompareOp::Eq, id);
        assert!(!predicate.evaluate(&json!({"id": id - 1})));
        assert!(predicate.evaluate(&json!({"id": id})));
    }
}
