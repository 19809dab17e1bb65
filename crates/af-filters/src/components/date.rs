use af_core::FilterResult;
use af_query_builder::value::{as_datetime, Scalar};
use af_query_builder::{CompareOp, Predicate};
use chrono::NaiveDateTime;
use serde_json::{json, Map, Value};

use crate::filter::{Filter, FilterBase};

pub(crate) fn start_of_day(dt: NaiveDateTime) -> NaiveDateTime {
    dt.date().and_hms_opt(0, 0, 0).unwrap_or(dt)
}

pub(crate) fn end_of_day(dt: NaiveDateTime) -> Option<NaiveDateTime> {
    dt.date().and_hms_opt(23, 59, 59)
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateFilter {
    base: FilterBase,
    operator: CompareOp,
    format: String,
    min_date: Option<String>,
    max_date: Option<String>,
    with_time: bool,
    native: bool,
    display_format: Option<String>,
}

impl DateFilter {
    pub fn make(name: impl Into<String>) -> Self {
        Self {
            base: FilterBase::new(name),
            operator: CompareOp::Eq,
            format: "Y-m-d".to_string(),
            min_date: None,
            max_date: None,
            with_time: false,
            native: true,
            display_format: None,
        }
    }

    /// Set the comparison from its symbol; unknown symbols keep the current one
    pub fn operator(mut self, symbol: &str) -> Self {
        match CompareOp::from_symbol(symbol) {
            Some(op) => self.operator = op,
            None => tracing::warn!(symbol, filter = self.base.name(), "Unknown date filter operator"),
        }
        self
    }

    /// On or after the given day
    pub fn from(mut self) -> Self {
        self.operator = CompareOp::Gte;
        self
    }

    /// On or before the given day
    pub fn until(mut self) -> Self {
        self.operator = CompareOp::Lte;
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

    pub fn native(mut self, native: bool) -> Self {
        self.native = native;
        self
    }

    pub fn display_format(mut self, format: impl Into<String>) -> Self {
        self.display_format = Some(format.into());
        self
    }
}

impl Filter for DateFilter {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FilterBase {
        &mut self.base
    }

    fn kind(&self) -> &'static str {
        "DateFilter"
    }

    fn predicate(&self, value: &Value) -> FilterResult<Option<Predicate>> {
        let Some(parsed) = as_datetime(value) else {
            return Ok(None);
        };
        let column = self.base.column().to_string();
        let moment = if self.with_time { parsed } else { start_of_day(parsed) };

        let bound = match self.operator {
            CompareOp::Eq | CompareOp::NotEq => {
                return Ok(Some(Predicate::OnDate {
                    column,
                    op: self.operator,
                    date: moment.date(),
                }))
            }
            CompareOp::Lte if !self.with_time => end_of_day(moment),
            _ => Some(moment),
        };

        Ok(bound.map(|at| Predicate::compare(column, self.operator, Scalar::DateTime(at))))
    }

    fn extra_schema(&self) -> Map<String, Value> {
        let mut extra = Map::new();
        extra.insert("operator".to_string(), json!(self.operator.as_sql()));
        extra.insert("format".to_string(), json!(self.format));
        extra.insert("min_date".to_string(), json!(self.min_date));
        extra.insert("max_date".to_string(), json!(self.max_date));
        extra.insert("with_time".to_string(), json!(self.with_time));
        extra.insert("native".to_string(), json!(self.native));
        extra.insert("display_format".to_string(), json!(self.display_format));
        extra
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_matches_whole_day() {
        let filter = DateFilter::make("published_at");
        let p = filter.predicate(&json!("2024-05-01")).unwrap().unwrap();
        assert!(p.evaluate(&json!({"published_at": "2024-05-01 21:00:00"})));
        assert!(!p.evaluate(&json!({"published_at": "2024-05-02 00:00:00"})));
    }

    #[test]
    fn test_until_includes_end_of_day() {
        let filter = DateFilter::make("published_at").until();
        let p = filter.predicate(&json!("2024-05-01 08:00")).unwrap().unwrap();
        assert!(p.evaluate(&json!({"published_at": "2024-05-01 23:30:00"})));
        assert!(!p.evaluate(&json!({"published_at": "2024-05-02 00:00:01"})));
    }

    #[test]
    fn test_from_starts_at_midnight_unless_with_time() {
        let p = DateFilter::make("at").from().predicate(&json!("2024-05-01 08:00")).unwrap().unwrap();
        assert!(p.evaluate(&json!({"at": "2024-05-01 00:00:00"})));

        let p = DateFilter::make("at")
            .from()
            .with_time(true)
            .predicate(&json!("2024-05-01 08:00"))
            .unwrap()
            .unwrap();
        assert!(!p.evaluate(&json!({"at": "2024-05-01 07:59:59"})));
        assert!(p.evaluate(&json!({"at": "2024-05-01 08:00:00"})));
    }

    #[test]
    fn test_unparsable_date_is_neutral() {
        let filter = DateFilter::make("at");
        assert_eq!(filter.predicate(&json!("someday")).unwrap(), None);
        assert_eq!(filter.predicate(&json!(20240501)).unwrap(), None);
    }
}
