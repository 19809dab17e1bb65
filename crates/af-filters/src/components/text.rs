use af_core::FilterResult;
use af_query_builder::value::as_text;
use af_query_builder::{CompareOp, LikePattern, Predicate};
use serde_json::{json, Map, Value};

use crate::filter::{Filter, FilterBase};

/// How a text filter matches its column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMode {
    #[default]
    Contains,
    Exact,
    StartsWith,
    EndsWith,
}

impl TextMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contains => "like",
            Self::Exact => "=",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextFilter {
    base: FilterBase,
    mode: TextMode,
    case_sensitive: bool,
}

impl TextFilter {
    pub fn make(name: impl Into<String>) -> Self {
        Self {
            base: FilterBase::new(name),
            mode: TextMode::Contains,
            case_sensitive: false,
        }
    }

    pub fn mode(mut self, mode: TextMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn exact(self) -> Self {
        self.mode(TextMode::Exact)
    }

    pub fn contains(self) -> Self {
        self.mode(TextMode::Contains)
    }

    pub fn starts_with(self) -> Self {
        self.mode(TextMode::StartsWith)
    }

    pub fn ends_with(self) -> Self {
        self.mode(TextMode::EndsWith)
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }
}

impl Filter for TextFilter {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FilterBase {
        &mut self.base
    }

    fn kind(&self) -> &'static str {
        "TextFilter"
    }

    fn predicate(&self, value: &Value) -> FilterResult<Option<Predicate>> {
        let Some(text) = as_text(value).filter(|t| !t.is_empty()) else {
            return Ok(None);
        };
        let column = self.base.column().to_string();

        let pattern = match self.mode {
            TextMode::Exact => return Ok(Some(Predicate::compare(column, CompareOp::Eq, text))),
            TextMode::Contains => LikePattern::contains(text),
            TextMode::StartsWith => LikePattern::starts_with(text),
            TextMode::EndsWith => LikePattern::ends_with(text),
        };
        Ok(Some(Predicate::Like {
            column,
            pattern,
            negated: false,
            case_sensitive: self.case_sensitive,
        }))
    }

    fn extra_schema(&self) -> Map<String, Value> {
        let mut extra = Map::new();
        extra.insert("operator".to_string(), json!(self.mode.as_str()));
        extra.insert("case_sensitive".to_string(), json!(self.case_sensitive));
        extra
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepts(filter: &TextFilter, value: Value, row: Value) -> bool {
        filter
            .predicate(&value)
            .unwrap()
            .map_or(true, |p| p.evaluate(&row))
    }

    #[test]
    fn test_contains_is_default_and_case_insensitive() {
        let filter = TextFilter::make("name");
        assert!(accepts(&filter, json!("JOHN"), json!({"name": "Johnny"})));
        assert!(!accepts(&filter, json!("jane"), json!({"name": "Johnny"})));
    }

    #[test]
    fn test_case_sensitive_modes() {
        let filter = TextFilter::make("name").starts_with().case_sensitive(true);
        assert!(accepts(&filter, json!("Jo"), json!({"name": "Johnny"})));
        assert!(!accepts(&filter, json!("jo"), json!({"name": "Johnny"})));

        let filter = TextFilter::make("name").exact();
        assert!(!accepts(&filter, json!("John"), json!({"name": "Johnny"})));
    }

    #[test]
    fn test_empty_or_structured_value_is_neutral() {
        let filter = TextFilter::make("name");
        assert_eq!(filter.predicate(&json!("")).unwrap(), None);
        assert_eq!(filter.predicate(&json!(["a"])).unwrap(), None);
    }

    #[test]
    fn test_schema() {
        let schema = TextFilter::make("name").ends_with().to_schema();
        assert_eq!(schema["type"], json!("TextFilter"));
        assert_eq!(schema["operator"], json!("ends_with"));
        assert_eq!(schema["active"], json!(false));
    }
}
