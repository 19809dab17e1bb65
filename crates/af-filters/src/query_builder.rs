//! Query builder filter
//!
//! Holds a [`ConstraintRegistry`] and accepts a nested rule tree as its value.
//! The tree is compiled with [`QueryCompiler`] into one parenthesised unit.

use af_core::{CompileLimits, FilterResult};
use af_query_builder::{ConstraintRegistry, Group, Predicate, QueryCompiler};
use serde_json::{json, Map, Value};

use crate::enums::FilterWidth;
use crate::filter::{Filter, FilterBase};

#[derive(Debug, Clone, PartialEq)]
pub struct QueryBuilderFilter {
    base: FilterBase,
    registry: ConstraintRegistry,
    constraint_picker_columns: usize,
    constraint_picker_width: FilterWidth,
    limits: CompileLimits,
}

/// Tree value that restricts nothing
pub fn empty_tree() -> Value {
    json!({"rules": [], "combinator": "and"})
}

/// Submitted trees may arrive JSON-encoded from form posts.
///
/// Malformed trees are `Ok(None)`; trees beyond `limits` are errors.
fn parse_tree(value: &Value, limits: &CompileLimits) -> FilterResult<Option<Group>> {
    let parsed = match value {
        Value::String(raw) => Group::from_json_str_within(raw, limits),
        Value::Object(_) => Group::from_value(value),
        _ => return Ok(None),
    };
    match parsed {
        Ok(group) => Ok(Some(group)),
        Err(err) if err.is_too_complex() => Err(err),
        Err(err) => {
            tracing::debug!(error = %err, "Ignoring malformed rule tree");
            Ok(None)
        }
    }
}

impl QueryBuilderFilter {
    pub fn make(name: impl Into<String>) -> Self {
        let mut base = FilterBase::new(name);
        base.set_default(empty_tree());
        Self {
            base,
            registry: ConstraintRegistry::new(),
            constraint_picker_columns: 2,
            constraint_picker_width: FilterWidth::Medium,
            limits: CompileLimits::default(),
        }
    }

    pub fn constraints(mut self, registry: ConstraintRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Add one constraint, replacing any with the same name
    pub fn constraint(mut self, constraint: impl Into<af_query_builder::Constraint>) -> Self {
        self.registry.register(constraint);
        self
    }

    pub fn constraint_picker_columns(mut self, columns: usize) -> Self {
        self.constraint_picker_columns = columns.max(1);
        self
    }

    pub fn constraint_picker_width(mut self, width: FilterWidth) -> Self {
        self.constraint_picker_width = width;
        self
    }

    pub fn limits(mut self, limits: CompileLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn registry(&self) -> &ConstraintRegistry {
        &self.registry
    }

    fn compiler(&self) -> QueryCompiler<'_> {
        QueryCompiler::new(&self.registry).with_limits(self.limits)
    }
}

impl Filter for QueryBuilderFilter {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FilterBase {
        &mut self.base
    }

    fn kind(&self) -> &'static str {
        "QueryBuilderFilter"
    }

    /// A tree too complex to parse stays active so applying it reports the rejection
    fn is_active(&self) -> bool {
        let Some(value) = self.base.value() else {
            return false;
        };
        match parse_tree(value, &self.limits) {
            Ok(Some(group)) => !group.is_empty(),
            Ok(None) => false,
            Err(_) => true,
        }
    }

    fn predicate(&self, value: &Value) -> FilterResult<Option<Predicate>> {
        match parse_tree(value, &self.limits)? {
            Some(group) => self.compiler().compile(&group),
            None => {
                tracing::debug!(filter = self.base.name(), "No usable rule tree");
                Ok(None)
            }
        }
    }

    fn format_value(&self, value: &Value) -> String {
        let count = parse_tree(value, &self.limits)
            .ok()
            .flatten()
            .map(|group| group.rule_count())
            .unwrap_or(0);
        match count {
            1 => "1 rule".to_string(),
            n => format!("{n} rules"),
        }
    }

    fn extra_schema(&self) -> Map<String, Value> {
        let mut extra = Map::new();
        extra.insert("constraints".to_string(), self.registry.to_schema());
        extra.insert("constraintPickerColumns".to_string(), json!(self.constraint_picker_columns));
        extra.insert(
            "constraintPickerWidth".to_string(),
            json!(self.constraint_picker_width.as_str()),
        );
        extra
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterBuilder;
    use af_core::FilterError;
    use af_query_builder::{BooleanConstraint, MemorySink, NumberConstraint, TextConstraint};

    fn filter() -> QueryBuilderFilter {
        QueryBuilderFilter::make("advanced")
            .constraint(TextConstraint::make("name"))
            .constraint(NumberConstraint::make("age").integer(true))
            .constraint(BooleanConstraint::make("verified"))
    }

    fn rows() -> Vec<Value> {
        vec![
            json!({"id": 1, "name": "John", "age": 40, "verified": true}),
            json!({"id": 2, "name": "Jane", "age": 22, "verified": false}),
            json!({"id": 3, "name": "Johnny", "age": 17, "verified": true}),
        ]
    }

    fn ids(sink: &MemorySink) -> Vec<i64> {
        sink.filter(&rows())
            .into_iter()
            .filter_map(|row| row["id"].as_i64())
            .collect()
    }

    #[test]
    fn test_default_tree_is_inactive() {
        let filter = filter();
        assert!(!filter.is_active());
        assert_eq!(filter.base().value(), Some(&empty_tree()));
    }

    #[test]
    fn test_applies_tree_as_one_unit() {
        let tree = json!({
            "combinator": "or",
            "rules": [
                {"constraint": "name", "operator": "equals", "value": "Jane"},
                {"rules": [
                    {"constraint": "name", "operator": "starts_with", "value": "john"},
                    {"constraint": "age", "operator": "greater_than", "value": 18}
                ]}
            ]
        });
        let filter = filter().value(tree);
        assert!(filter.is_active());

        let mut sink = MemorySink::new();
        let applied = (&filter as &dyn Filter).apply(&mut sink).unwrap();
        assert!(applied);
        assert_eq!(sink.conjuncts().len(), 1);
        assert_eq!(ids(&sink), vec![1, 2]);
    }

    #[test]
    fn test_json_encoded_tree() {
        let raw = r#"{"rules":[{"constraint":"verified","operator":"is_true"}]}"#;
        let filter = filter().value(raw);
        assert!(filter.is_active());
        assert_eq!(filter.format_value(&json!(raw)), "1 rule");

        let mut sink = MemorySink::new();
        (&filter as &dyn Filter).apply(&mut sink).unwrap();
        assert_eq!(ids(&sink), vec![1, 3]);
    }

    #[test]
    fn test_malformed_tree_is_neutral() {
        let filter = filter();
        assert_eq!(filter.predicate(&json!(["not", "a", "tree"])).unwrap(), None);
        assert_eq!(filter.predicate(&json!("{broken")).unwrap(), None);
        assert_eq!(
            filter.predicate(&json!({"rules": [{"constraint": "unknown", "operator": "equals", "value": 1}]})).unwrap(),
            None
        );
    }

    #[test]
    fn test_complexity_limit_propagates() {
        let filter = filter().limits(CompileLimits::new(32, 2));
        let tree = json!({"rules": [
            {"constraint": "name", "operator": "equals", "value": "a"},
            {"constraint": "name", "operator": "equals", "value": "b"},
            {"constraint": "name", "operator": "equals", "value": "c"}
        ]});
        let err = filter.predicate(&tree).unwrap_err();
        assert!(matches!(err, FilterError::TreeTooComplex { .. }));
    }

    fn nested_json(levels: usize) -> String {
        let mut tree = String::new();
        for _ in 0..levels {
            tree.push_str(r#"{"combinator":"or","rules":["#);
        }
        tree.push_str(r#"{"constraint":"verified","operator":"is_true"}"#);
        for _ in 0..levels {
            tree.push_str("]}");
        }
        tree
    }

    #[test]
    fn test_json_encoded_tree_too_deep_to_parse_is_rejected() {
        let raw = nested_json(70);
        let filter = filter().value(raw.as_str());

        let err = filter.predicate(&json!(raw)).unwrap_err();
        assert!(err.is_too_complex());

        assert!(filter.is_active());
        let mut sink = MemorySink::new();
        assert!((&filter as &dyn Filter).apply(&mut sink).is_err());
        assert!(sink.conjuncts().is_empty());
    }

    #[test]
    fn test_json_encoded_tree_one_level_too_deep_is_rejected() {
        let filter = filter().limits(CompileLimits::new(3, 1000));
        assert!(filter.predicate(&json!(nested_json(3))).unwrap().is_some());
        let err = filter.predicate(&json!(nested_json(4))).unwrap_err();
        assert_eq!(err.to_string(), FilterError::depth_exceeded(4, 3).to_string());
    }

    #[test]
    fn test_schema_lists_constraints() {
        let schema = filter().constraint_picker_columns(0).to_schema();
        assert_eq!(schema["type"], json!("QueryBuilderFilter"));
        assert_eq!(schema["constraintPickerColumns"], json!(1));
        assert_eq!(schema["constraintPickerWidth"], json!("md"));
        assert_eq!(schema["constraints"].as_array().map(Vec::len), Some(3));
        assert_eq!(schema["constraints"][1]["name"], json!("age"));
    }
}
