use af_core::FilterResult;
use af_query_builder::value::as_number;
use af_query_builder::{CompareOp, Predicate};
use serde_json::{json, Map, Value};

use crate::filter::{Filter, FilterBase};

#[derive(Debug, Clone, PartialEq)]
pub struct NumberFilter {
    base: FilterBase,
    operator: CompareOp,
    min: Option<f64>,
    max: Option<f64>,
    step: Option<f64>,
}

impl NumberFilter {
    pub fn make(name: impl Into<String>) -> Self {
        Self {
            base: FilterBase::new(name),
            operator: CompareOp::Eq,
            min: None,
            max: None,
            step: None,
        }
    }

    /// Set the comparison from its symbol; unknown symbols keep the current one
    pub fn operator(mut self, symbol: &str) -> Self {
        match CompareOp::from_symbol(symbol) {
            Some(op) => self.operator = op,
            None => tracing::warn!(symbol, filter = self.base.name(), "Unknown number filter operator"),
        }
        self
    }

    pub fn greater_than(mut self) -> Self {
        self.operator = CompareOp::Gt;
        self
    }

    pub fn greater_than_or_equal(mut self) -> Self {
        self.operator = CompareOp::Gte;
        self
    }

    pub fn less_than(mut self) -> Self {
        self.operator = CompareOp::Lt;
        self
    }

    pub fn less_than_or_equal(mut self) -> Self {
        self.operator = CompareOp::Lte;
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }
}

impl Filter for NumberFilter {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FilterBase {
        &mut self.base
    }

    fn kind(&self) -> &'static str {
        "NumberFilter"
    }

    fn predicate(&self, value: &Value) -> FilterResult<Option<Predicate>> {
        Ok(as_number(value)
            .map(|number| Predicate::compare(self.base.column(), self.operator, number)))
    }

    fn extra_schema(&self) -> Map<String, Value> {
        let mut extra = Map::new();
        extra.insert("operator".to_string(), json!(self.operator.as_sql()));
        extra.insert("min".to_string(), json!(self.min));
        extra.insert("max".to_string(), json!(self.max));
        extra.insert("step".to_string(), json!(self.step));
        extra
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison() {
        let filter = NumberFilter::make("price").operator(">=");
        let predicate = filter.predicate(&json!("9.5")).unwrap().unwrap();
        assert!(predicate.evaluate(&json!({"price": 9.5})));
        assert!(!predicate.evaluate(&json!({"price": 9})));
    }

    #[test]
    fn test_non_numeric_is_neutral() {
        let filter = NumberFilter::make("price");
        assert_eq!(filter.predicate(&json!("cheap")).unwrap(), None);
        assert_eq!(filter.predicate(&json!([1, 2])).unwrap(), None);
    }

    #[test]
    fn test_unknown_operator_keeps_equality() {
        let filter = NumberFilter::make("qty").operator("~");
        assert_eq!(filter.to_schema()["operator"], json!("="));
        let filter = NumberFilter::make("qty").less_than().min(0.0).step(0.5);
        let schema = filter.to_schema();
        assert_eq!(schema["operator"], json!("<"));
        assert_eq!(schema["min"], json!(0.0));
        assert_eq!(schema["step"], json!(0.5));
    }
}
