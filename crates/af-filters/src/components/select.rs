use af_core::FilterResult;
use af_query_builder::value::{as_scalar, as_scalar_list};
use af_query_builder::{CompareOp, OptionList, Predicate};
use serde_json::{json, Map, Value};

use crate::filter::{format_indicator_value, Filter, FilterBase};

#[derive(Debug, Clone, PartialEq)]
pub struct SelectFilter {
    base: FilterBase,
    options: OptionList,
    multiple: bool,
    searchable: bool,
    native: bool,
}

impl SelectFilter {
    pub fn make(name: impl Into<String>) -> Self {
        Self {
            base: FilterBase::new(name),
            options: OptionList::new(),
            multiple: false,
            searchable: false,
            native: true,
        }
    }

    pub fn options(mut self, options: OptionList) -> Self {
        self.options = options;
        self
    }

    pub fn multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    pub fn native(mut self, native: bool) -> Self {
        self.native = native;
        self
    }

    pub fn get_options(&self) -> &OptionList {
        &self.options
    }
}

impl Filter for SelectFilter {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FilterBase {
        &mut self.base
    }

    fn kind(&self) -> &'static str {
        "SelectFilter"
    }

    fn predicate(&self, value: &Value) -> FilterResult<Option<Predicate>> {
        let column = self.base.column();
        if value.is_array() {
            if !self.multiple {
                tracing::debug!(filter = self.base.name(), "List value on single select ignored");
                return Ok(None);
            }
            return Ok(as_scalar_list(value)
                .filter(|values| !values.is_empty())
                .map(|values| Predicate::is_in(column, values)));
        }
        Ok(as_scalar(value).map(|scalar| Predicate::compare(column, CompareOp::Eq, scalar)))
    }

    fn format_value(&self, value: &Value) -> String {
        let label = |v: &Value| self.options.label_for(v).unwrap_or_else(|| format_indicator_value(v));
        match value {
            Value::Array(items) => items.iter().map(label).collect::<Vec<_>>().join(", "),
            other => label(other),
        }
    }

    fn extra_schema(&self) -> Map<String, Value> {
        let mut extra = Map::new();
        extra.insert("options".to_string(), json!(self.options.formatted()));
        extra.insert("multiple".to_string(), json!(self.multiple));
        extra.insert("searchable".to_string(), json!(self.searchable));
        extra.insert("native".to_string(), json!(self.native));
        extra
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statuses() -> OptionList {
        OptionList::pairs([("draft", "Draft"), ("published", "Published"), ("archived", "Archived")])
    }

    #[test]
    fn test_single_value_equality() {
        let filter = SelectFilter::make("status").options(statuses());
        let p = filter.predicate(&json!("draft")).unwrap().unwrap();
        assert!(p.evaluate(&json!({"status": "draft"})));
        assert!(!p.evaluate(&json!({"status": "published"})));
    }

    #[test]
    fn test_multiple_uses_membership() {
        let filter = SelectFilter::make("status").multiple(true);
        let p = filter.predicate(&json!(["draft", "archived"])).unwrap().unwrap();
        assert!(p.evaluate(&json!({"status": "archived"})));
        assert!(!p.evaluate(&json!({"status": "published"})));
        assert_eq!(filter.predicate(&json!([])).unwrap(), None);
    }

    #[test]
    fn test_list_on_single_select_is_neutral() {
        let filter = SelectFilter::make("status");
        assert_eq!(filter.predicate(&json!(["draft"])).unwrap(), None);
    }

    #[test]
    fn test_indicator_uses_option_labels() {
        let filter = SelectFilter::make("status").options(statuses()).multiple(true);
        assert_eq!(filter.format_value(&json!(["draft", "archived"])), "Draft, Archived");
        assert_eq!(filter.format_value(&json!("unknown")), "unknown");
        let schema = filter.to_schema();
        assert_eq!(schema["options"][1], json!({"value": "published", "label": "Published"}));
    }
}
