use af_core::FilterResult;
use af_query_builder::value::{as_datetime, is_absent, Scalar};
use af_query_builder::{CompareOp, Predicate};
use serde_json::{json, Map, Value};

use super::date::{end_of_day, start_of_day};
use crate::filter::{Filter, FilterBase};

/// Filters a date column between two optional bounds.
///
/// The value is an object holding the bounds under `from_key` and `to_key`.
#[derive(Debug, Clone, PartialEq)]
pub struct DateRangeFilter {
    base: FilterBase,
    from_key: String,
    to_key: String,
    format: String,
    min_date: Option<String>,
    max_date: Option<String>,
    with_time: bool,
}

impl DateRangeFilter {
    pub fn make(name: impl Into<String>) -> Self {
        Self {
            base: FilterBase::new(name),
            from_key: "from".to_string(),
            to_key: "to".to_string(),
            format: "Y-m-d".to_string(),
            min_date: None,
            max_date: None,
            with_time: false,
        }
    }

    pub fn keys(mut self, from_key: impl Into<String>, to_key: impl Into<String>) -> Self {
        self.from_key = from_key.into();
        self.to_key = to_key.into();
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn min_date(mut self, date: impl Into<String>) -> Self {
        self.min_date = Some(date.into());
        self
    }

    pub fn max_date(mut self, date: impl Into<String>) -> Self {
        self.max_date = Some(date.into());
        self
    }

    pub fn with_time(mut self, with_time: bool) -> Self {
        self.with_time = with_time;
        if with_time {
            self.format = "Y-m-d H:i:s".to_string();
        }
        self
    }

    fn bound(&self, range: &Map<String, Value>, key: &str, op: CompareOp) -> Option<Predicate> {
        let raw = range.get(key).filter(|v| !is_absent(Some(*v)))?;
        let Some(parsed) = as_datetime(raw) else {
            tracing::debug!(filter = self.base.name(), key, value = %raw, "Skipping unparsable range bound");
            return None;
        };
        let at = match (op, self.with_time) {
            (_, true) => parsed,
            (CompareOp::Lte, false) => end_of_day(parsed)?,
            _ => start_of_day(parsed),
        };
        Some(Predicate::compare(self.base.column(), op, Scalar::DateTime(at)))
    }
}

impl Filter for DateRangeFilter {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FilterBase {
        &mut self.base
    }

    fn kind(&self) -> &'static str {
        "DateRangeFilter"
    }

    fn is_active(&self) -> bool {
        match self.base.value() {
            Some(Value::Object(range)) => [&self.from_key, &self.to_key]
                .into_iter()
                .any(|key| !is_absent(range.get(key.as_str()))),
            _ => false,
        }
    }

    fn predicate(&self, value: &Value) -> FilterResult<Option<Predicate>> {
        let Value::Object(range) = value else {
            return Ok(None);
        };
        let mut bounds: Vec<Predicate> = [
            self.bound(range, &self.from_key, CompareOp::Gte),
            self.bound(range, &self.to_key, CompareOp::Lte),
        ]
        .into_iter()
        .flatten()
        .collect();

        Ok(match bounds.len() {
            0 => None,
            1 => bounds.pop(),
            _ => Some(Predicate::and(bounds)),
        })
    }

    fn format_value(&self, value: &Value) -> String {
        let Value::Object(range) = value else {
            return crate::filter::format_indicator_value(value);
        };
        let text = |key: &str| range.get(key).and_then(Value::as_str).filter(|s| !s.is_empty());
        match (text(&self.from_key), text(&self.to_key)) {
            (Some(from), Some(to)) => format!("{from} - {to}"),
            (Some(from), None) => format!("from {from}"),
            (None, Some(to)) => format!("until {to}"),
            (None, None) => String::new(),
        }
    }

    fn extra_schema(&self) -> Map<String, Value> {
        let mut extra = Map::new();
        extra.insert("from_key".to_string(), json!(self.from_key));
        extra.insert("to_key".to_string(), json!(self.to_key));
        extra.insert("format".to_string(), json!(self.format));
        extra.insert("min_date".to_string(), json!(self.min_date));
        extra.insert("max_date".to_string(), json!(self.max_date));
        extra.insert("with_time".to_string(), json!(self.with_time));
        extra
    }
}
