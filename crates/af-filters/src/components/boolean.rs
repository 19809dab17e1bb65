use af_core::FilterResult;
use af_query_builder::value::as_bool;
use af_query_builder::{CompareOp, Predicate};
use serde_json::{json, Map, Value};

use crate::filter::{Filter, FilterBase};

#[derive(Debug, Clone, PartialEq)]
pub struct BooleanFilter {
    base: FilterBase,
    true_label: Option<String>,
    false_label: Option<String>,
    nullable: bool,
}

impl BooleanFilter {
    pub fn make(name: impl Into<String>) -> Self {
        Self {
            base: FilterBase::new(name),
            true_label: None,
            false_label: None,
            nullable: false,
        }
    }

    pub fn true_label(mut self, label: impl Into<String>) -> Self {
        self.true_label = Some(label.into());
        self
    }

    pub fn false_label(mut self, label: impl Into<String>) -> Self {
        self.false_label = Some(label.into());
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn get_true_label(&self) -> &str {
        self.true_label.as_deref().unwrap_or("Yes")
    }

    pub fn get_false_label(&self) -> &str {
        self.false_label.as_deref().unwrap_or("No")
    }
}

impl Filter for BooleanFilter {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FilterBase {
        &mut self.base
    }

    fn kind(&self) -> &'static str {
        "BooleanFilter"
    }

    fn predicate(&self, value: &Value) -> FilterResult<Option<Predicate>> {
        if matches!(value, Value::String(s) if s.is_empty()) {
            return Ok(None);
        }
        Ok(as_bool(value).map(|b| Predicate::compare(self.base.column(), CompareOp::Eq, b)))
    }

    fn format_value(&self, value: &Value) -> String {
        match as_bool(value) {
            Some(true) => self.get_true_label().to_string(),
            Some(false) => self.get_false_label().to_string(),
            None => crate::filter::format_indicator_value(value),
        }
    }

    fn extra_schema(&self) -> Map<String, Value> {
        let mut extra = Map::new();
        extra.insert("true_label".to_string(), json!(self.get_true_label()));
        extra.insert("false_label".to_string(), json!(self.get_false_label()));
        extra.insert("nullable".to_string(), json!(self.nullable));
        extra
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_form_encodings() {
        let filter = BooleanFilter::make("active");
        for (value, expected) in [
            (json!(true), true),
            (json!("1"), true),
            (json!("on"), true),
            (json!("false"), false),
            (json!("off"), false),
            (json!(0), false),
        ] {
            let predicate = filter.predicate(&value).unwrap().unwrap();
            assert!(predicate.evaluate(&json!({"active": expected})));
        }
    }

    #[test]
    fn test_garbage_is_neutral() {
        let filter = BooleanFilter::make("active");
        assert_eq!(filter.predicate(&json!("maybe")).unwrap(), None);
        assert_eq!(filter.predicate(&json!("")).unwrap(), None);
    }

    #[test]
    fn test_indicator_uses_labels() {
        let filter = BooleanFilter::make("verified").true_label("Verified");
        assert_eq!(filter.format_value(&json!("1")), "Verified");
        assert_eq!(filter.format_value(&json!(false)), "No");
    }
}
