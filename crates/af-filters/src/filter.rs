//! Filter base
//!
//! Every filter owns a [`FilterBase`] (name, label, column, current and
//! default value, display metadata) and turns its value into at most one
//! predicate. A null, empty-string or empty-list value never restricts.

use af_core::FilterResult;
use af_query_builder::constraint::humanize;
use af_query_builder::value::is_absent;
use af_query_builder::{Predicate, QuerySink};
use serde_json::{json, Map, Value};

/// State shared by all filters
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterBase {
    name: String,
    label: Option<String>,
    column: Option<String>,
    value: Option<Value>,
    default: Option<Value>,
    placeholder: Option<String>,
    hidden: bool,
    extra_attributes: Map<String, Value>,
}

impl FilterBase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Label, defaulting to the humanised name
    pub fn label(&self) -> String {
        self.label.clone().unwrap_or_else(|| humanize(&self.name))
    }

    pub fn column(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }

    /// Current value, falling back to the default when unset or null
    pub fn value(&self) -> Option<&Value> {
        match &self.value {
            Some(v) if !v.is_null() => Some(v),
            _ => self.default.as_ref(),
        }
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn extra_attributes(&self) -> &Map<String, Value> {
        &self.extra_attributes
    }

    pub fn has_value(&self) -> bool {
        !is_absent(self.value())
    }

    pub fn set_value(&mut self, value: Value) {
        self.value = Some(value);
    }

    pub fn reset(&mut self) {
        self.value = self.default.clone();
    }

    pub(crate) fn set_default(&mut self, value: Value) {
        self.default = Some(value);
    }
}

/// A single filter applied to a query
pub trait Filter: std::fmt::Debug + Send + Sync {
    fn base(&self) -> &FilterBase;

    fn base_mut(&mut self) -> &mut FilterBase;

    /// Type name reported to the client
    fn kind(&self) -> &'static str;

    /// Predicate for `value`; `Ok(None)` means no restriction
    fn predicate(&self, value: &Value) -> FilterResult<Option<Predicate>>;

    fn is_active(&self) -> bool {
        self.base().has_value()
    }

    /// Type-specific schema entries
    fn extra_schema(&self) -> Map<String, Value> {
        Map::new()
    }

    /// Text shown for the active value in indicator chips
    fn format_value(&self, value: &Value) -> String {
        format_indicator_value(value)
    }

    fn name(&self) -> &str {
        self.base().name()
    }

    fn to_schema(&self) -> Value {
        let base = self.base();
        let mut schema = json!({
            "type": self.kind(),
            "name": base.name(),
            "label": base.label(),
            "column": base.column(),
            "value": base.value(),
            "default": base.default_value(),
            "placeholder": base.placeholder(),
            "active": self.is_active(),
            "hidden": base.is_hidden(),
        });
        if let Value::Object(map) = &mut schema {
            map.extend(self.extra_schema());
            if !base.extra_attributes().is_empty() {
                map.insert("extraAttributes".to_string(), Value::Object(base.extra_attributes().clone()));
            }
        }
        schema
    }
}

impl<'f> dyn Filter + 'f {
    /// Apply the current value to `sink` if the filter is active.
    ///
    /// Returns whether anything was emitted.
    pub fn apply<S: QuerySink>(&self, sink: &mut S) -> FilterResult<bool> {
        if !self.is_active() {
            return Ok(false);
        }
        let Some(value) = self.base().value() else {
            return Ok(false);
        };
        match self.predicate(value)? {
            Some(predicate) => {
                predicate.apply_to(sink);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Fluent setters available on every concrete filter
pub trait FilterBuilder: Filter + Sized {
    fn label(mut self, label: impl Into<String>) -> Self {
        self.base_mut().label = Some(label.into());
        self
    }

    fn column(mut self, column: impl Into<String>) -> Self {
        self.base_mut().column = Some(column.into());
        self
    }

    fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.base_mut().placeholder = Some(placeholder.into());
        self
    }

    fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.base_mut().default = Some(value.into());
        self
    }

    fn value(mut self, value: impl Into<Value>) -> Self {
        self.base_mut().set_value(value.into());
        self
    }

    fn hidden(mut self, hidden: bool) -> Self {
        self.base_mut().hidden = hidden;
        self
    }

    /// Merge into the existing extra attributes
    fn extra_attributes(mut self, attributes: Map<String, Value>) -> Self {
        self.base_mut().extra_attributes.extend(attributes);
        self
    }
}

impl<T: Filter + Sized> FilterBuilder for T {}

/// `[a, b]` -> `a, b`, booleans as Yes/No
pub fn format_indicator_value(value: &Value) -> String {
    match value {
        Value::Array(items) => items.iter().map(scalar_text).collect::<Vec<_>>().join(", "),
        Value::Object(map) => map
            .values()
            .filter(|v| !is_absent(Some(*v)))
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Bool(b) => (if *b { "Yes" } else { "No" }).to_string(),
        other => scalar_text(other),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_falls_back_to_default() {
        let mut base = FilterBase::new("status");
        assert_eq!(base.value(), None);
        assert!(!base.has_value());

        base.set_default(json!("active"));
        assert_eq!(base.value(), Some(&json!("active")));

        base.set_value(json!(null));
        assert_eq!(base.value(), Some(&json!("active")));

        base.set_value(json!("inactive"));
        assert_eq!(base.value(), Some(&json!("inactive")));

        base.reset();
        assert_eq!(base.value(), Some(&json!("active")));
    }

    #[test]
    fn test_empty_values_are_inactive() {
        let mut base = FilterBase::new("tags");
        for value in [json!(""), json!([]), json!(null)] {
            base.set_value(value);
            assert!(!base.has_value());
        }
        base.set_value(json!(0));
        assert!(base.has_value());
    }

    #[test]
    fn test_label_and_column_defaults() {
        let base = FilterBase::new("created_at");
        assert_eq!(base.label(), "Created at");
        assert_eq!(base.column(), "created_at");
    }

    #[test]
    fn test_format_indicator_value() {
        assert_eq!(format_indicator_value(&json!(["a", 2])), "a, 2");
        assert_eq!(format_indicator_value(&json!(true)), "Yes");
        assert_eq!(format_indicator_value(&json!(false)), "No");
        assert_eq!(format_indicator_value(&json!(12.5)), "12.5");
        assert_eq!(
            format_indicator_value(&json!({"from": "2024-01-01", "to": ""})),
            "2024-01-01"
        );
    }
}
