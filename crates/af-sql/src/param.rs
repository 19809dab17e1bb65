//! Bound parameters

use af_query_builder::Scalar;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Parameter for prepared statements
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlParam {
    Int(i64),
    String(String),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

impl From<&Scalar> for SqlParam {
    fn from(scalar: &Scalar) -> Self {
        match scalar {
            Scalar::Bool(b) => Self::Bool(*b),
            Scalar::Int(i) => Self::Int(*i),
            Scalar::Float(f) => Self::Float(*f),
            Scalar::String(s) => Self::String(s.clone()),
            Scalar::Date(d) => Self::Date(*d),
            Scalar::DateTime(dt) => Self::DateTime(*dt),
        }
    }
}

impl std::fmt::Display for SqlParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::String(s) => write!(f, "'{}'", escape_string(s)),
            Self::Float(v) => write!(f, "{}", v),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Date(d) => write!(f, "'{}'", d.format("%Y-%m-%d")),
            Self::DateTime(dt) => write!(f, "'{}'", dt.format("%Y-%m-%d %H:%M:%S")),
            Self::Null => f.write_str("NULL"),
        }
    }
}

/// Escape string for display as a SQL literal
fn escape_string(s: &str) -> String {
    s.replace('\'', "''")
}

/// Escape LIKE wildcards; the pattern is bound, so quotes stay as they are
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

/// Double-quote an identifier, keeping dotted qualification
pub fn quote_ident(ident: &str) -> String {
    ident
        .split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("test"), "test");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("it's"), "it's");
        assert_eq!(escape_like("c:\\"), "c:\\\\");
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("name"), "\"name\"");
        assert_eq!(quote_ident("users.name"), "\"users\".\"name\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_display_literals() {
        assert_eq!(SqlParam::String("O'Brien".into()).to_string(), "'O''Brien'");
        assert_eq!(SqlParam::Null.to_string(), "NULL");
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(SqlParam::Date(date).to_string(), "'2024-02-29'");
        assert_eq!(SqlParam::from(&Scalar::Int(7)), SqlParam::Int(7));
    }
}
