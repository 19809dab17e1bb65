//! Filter panel
//!
//! Orchestrates a set of filters: distributes submitted values, applies every
//! active filter to a query as its own conjunct, and describes itself (and its
//! active-filter indicators) for the client.

use af_core::{FilterResult, FiltersConfig};
use af_query_builder::{Predicate, QuerySink};
use serde_json::{json, Map, Value};

use crate::enums::{FilterLayout, FilterWidth};
use crate::filter::Filter;

/// One active filter as shown in the indicator bar
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Indicator {
    pub name: String,
    pub label: String,
    pub value: Value,
    pub formatted: String,
}

#[derive(Debug)]
pub struct FilterPanel {
    filters: Vec<Box<dyn Filter>>,
    layout: FilterLayout,
    width: FilterWidth,
    columns: usize,
    max_height: Option<String>,
    persist_in_session: bool,
    session_key: Option<String>,
    deferred: bool,
    show_indicators: bool,
    collapsed: bool,
    enabled: bool,
    trigger_label: String,
    trigger_icon: Option<String>,
    apply_label: String,
    reset_label: String,
}

impl Default for FilterPanel {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            layout: FilterLayout::default(),
            width: FilterWidth::default(),
            columns: 1,
            max_height: None,
            persist_in_session: false,
            session_key: None,
            deferred: true,
            show_indicators: true,
            collapsed: false,
            enabled: true,
            trigger_label: "Filters".to_string(),
            trigger_icon: None,
            apply_label: "Apply".to_string(),
            reset_label: "Reset".to_string(),
        }
    }
}

impl FilterPanel {
    pub fn make() -> Self {
        Self::default()
    }

    /// Panel honouring the package-level switch
    pub fn from_config(config: &FiltersConfig) -> Self {
        Self {
            enabled: config.enabled,
            ..Self::default()
        }
    }

    pub fn filters(mut self, filters: Vec<Box<dyn Filter>>) -> Self {
        self.filters = filters;
        self
    }

    pub fn filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn add_filter(&mut self, filter: Box<dyn Filter>) -> &mut Self {
        self.filters.push(filter);
        self
    }

    pub fn layout(mut self, layout: FilterLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn width(mut self, width: FilterWidth) -> Self {
        self.width = width;
        self
    }

    pub fn columns(mut self, columns: usize) -> Self {
        self.columns = columns.max(1);
        self
    }

    pub fn max_height(mut self, max_height: impl Into<String>) -> Self {
        self.max_height = Some(max_height.into());
        self
    }

    pub fn persist_in_session(mut self, persist: bool, key: Option<String>) -> Self {
        self.persist_in_session = persist;
        self.session_key = key;
        self
    }

    pub fn deferred(mut self, deferred: bool) -> Self {
        self.deferred = deferred;
        self
    }

    pub fn show_indicators(mut self, show: bool) -> Self {
        self.show_indicators = show;
        self
    }

    pub fn collapsed(mut self, collapsed: bool) -> Self {
        self.collapsed = collapsed;
        self
    }

    pub fn trigger_label(mut self, label: impl Into<String>) -> Self {
        self.trigger_label = label.into();
        self
    }

    pub fn trigger_icon(mut self, icon: impl Into<String>) -> Self {
        self.trigger_icon = Some(icon.into());
        self
    }

    pub fn apply_label(mut self, label: impl Into<String>) -> Self {
        self.apply_label = label.into();
        self
    }

    pub fn reset_label(mut self, label: impl Into<String>) -> Self {
        self.reset_label = label.into();
        self
    }

    pub fn get_filters(&self) -> &[Box<dyn Filter>] {
        &self.filters
    }

    pub fn get_filter(&self, name: &str) -> Option<&dyn Filter> {
        self.filters.iter().find(|f| f.name() == name).map(|f| f.as_ref())
    }

    pub fn visible_filters(&self) -> impl Iterator<Item = &dyn Filter> {
        self.filters
            .iter()
            .map(|f| f.as_ref())
            .filter(|f| !f.base().is_hidden())
    }

    pub fn active_filters(&self) -> impl Iterator<Item = &dyn Filter> {
        self.filters.iter().map(|f| f.as_ref()).filter(|f| f.is_active())
    }

    pub fn get_layout(&self) -> FilterLayout {
        self.layout
    }

    pub fn get_width(&self) -> FilterWidth {
        self.width
    }

    pub fn get_columns(&self) -> usize {
        self.columns
    }

    pub fn is_persisting_in_session(&self) -> bool {
        self.persist_in_session
    }

    /// Session key, defaulting to one derived from the filter names
    pub fn session_key(&self) -> String {
        self.session_key.clone().unwrap_or_else(|| {
            let names: Vec<&str> = self.filters.iter().map(|f| f.name()).collect();
            format!("filters.{}", names.join("-"))
        })
    }

    pub fn is_deferred(&self) -> bool {
        self.deferred
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Assign submitted values; filters without an entry keep theirs
    pub fn set_filter_values(&mut self, values: &Map<String, Value>) -> &mut Self {
        for filter in &mut self.filters {
            if let Some(value) = values.get(filter.name()) {
                filter.base_mut().set_value(value.clone());
            }
        }
        self
    }

    pub fn filter_values(&self) -> Map<String, Value> {
        self.filters
            .iter()
            .map(|f| (f.name().to_string(), f.base().value().cloned().unwrap_or(Value::Null)))
            .collect()
    }

    /// Apply every active filter to `sink`, each as one conjunct.
    ///
    /// All predicates are built before anything is emitted, so a rejected
    /// query-builder tree leaves the sink untouched.
    pub fn apply_to_query<S: QuerySink>(&self, sink: &mut S) -> FilterResult<usize> {
        if !self.enabled {
            tracing::debug!("Filtering disabled; panel applies nothing");
            return Ok(0);
        }

        let mut predicates: Vec<Predicate> = Vec::new();
        for filter in self.active_filters() {
            let Some(value) = filter.base().value() else {
                continue;
            };
            if let Some(predicate) = filter.predicate(value)? {
                predicates.push(predicate);
            }
        }

        for predicate in &predicates {
            predicate.apply_to(sink);
        }
        Ok(predicates.len())
    }

    pub fn indicators(&self) -> Vec<Indicator> {
        self.active_filters()
            .filter_map(|filter| {
                let value = filter.base().value()?.clone();
                Some(Indicator {
                    name: filter.name().to_string(),
                    label: filter.base().label(),
                    formatted: filter.format_value(&value),
                    value,
                })
            })
            .collect()
    }

    pub fn has_active_filters(&self) -> bool {
        self.active_filters().next().is_some()
    }

    /// Restore every filter to its default value
    pub fn reset(&mut self) -> &mut Self {
        for filter in &mut self.filters {
            filter.base_mut().reset();
        }
        self
    }

    pub fn to_schema(&self) -> Value {
        json!({
            "layout": self.layout.as_str(),
            "width": self.width.as_str(),
            "columns": self.columns,
            "maxHeight": self.max_height,
            "deferred": self.deferred,
            "showIndicators": self.show_indicators,
            "collapsed": self.collapsed,
            "triggerLabel": self.trigger_label,
            "triggerIcon": self.trigger_icon,
            "applyLabel": self.apply_label,
            "resetLabel": self.reset_label,
            "filters": self.filters.iter().map(|f| f.to_schema()).collect::<Vec<_>>(),
            "activeFilters": self.active_filters().map(|f| f.to_schema()).collect::<Vec<_>>(),
            "indicators": self.indicators(),
            "hasActiveFilters": self.has_active_filters(),
        })
    }

    pub fn to_json(&self) -> FilterResult<String> {
        Ok(serde_json::to_string(&self.to_schema())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{BooleanFilter, NumberFilter, SelectFilter, TextFilter};
    use crate::filter::FilterBuilder;
    use crate::query_builder::QueryBuilderFilter;
    use af_core::{CompileLimits, FilterError};
    use af_query_builder::{MemorySink, OptionList, TextConstraint};

    fn panel() -> FilterPanel {
        FilterPanel::make()
            .filter(TextFilter::make("name"))
            .filter(
                SelectFilter::make("status")
                    .options(OptionList::pairs([("open", "Open"), ("closed", "Closed")])),
            )
            .filter(NumberFilter::make("age").greater_than_or_equal())
            .filter(BooleanFilter::make("internal").hidden(true))
    }

    fn rows() -> Vec<Value> {
        vec![
            json!({"name": "Alpha", "status": "open", "age": 30, "internal": false}),
            json!({"name": "Beta", "status": "closed", "age": 45, "internal": true}),
            json!({"name": "Alphonse", "status": "open", "age": 12, "internal": false}),
        ]
    }

    fn values(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_each_active_filter_is_one_conjunct() {
        let mut panel = panel();
        panel.set_filter_values(&values(json!({"name": "alph", "age": "18", "status": ""})));

        let mut sink = MemorySink::new();
        assert_eq!(panel.apply_to_query(&mut sink).unwrap(), 2);
        assert_eq!(sink.conjuncts().len(), 2);

        let rows = rows();
        let matched = sink.filter(&rows);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0]["name"], json!("Alpha"));
    }

    #[test]
    fn test_visible_and_active_filters() {
        let mut panel = panel();
        assert_eq!(panel.visible_filters().count(), 3);
        assert!(!panel.has_active_filters());

        panel.set_filter_values(&values(json!({"internal": true, "unknown": 1})));
        assert!(panel.has_active_filters());
        assert_eq!(panel.filter_values()["internal"], json!(true));
        assert_eq!(panel.filter_values()["name"], Value::Null);
    }

    #[test]
    fn test_indicators_format_values() {
        let mut panel = panel();
        panel.set_filter_values(&values(json!({"status": "closed", "internal": "1"})));
        let indicators = panel.indicators();
        assert_eq!(indicators.len(), 2);
        assert_eq!(indicators[0].formatted, "Closed");
        assert_eq!(indicators[1].label, "Internal");
        assert_eq!(indicators[1].formatted, "Yes");
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut panel = FilterPanel::make().filter(SelectFilter::make("status").default_value("open"));
        panel.set_filter_values(&values(json!({"status": "closed"})));
        panel.reset();
        assert_eq!(panel.filter_values()["status"], json!("open"));
    }

    #[test]
    fn test_rejected_tree_leaves_sink_untouched() {
        let panel = FilterPanel::make().filter(TextFilter::make("name").value("a")).filter(
            QueryBuilderFilter::make("advanced")
                .constraint(TextConstraint::make("title"))
                .limits(CompileLimits::new(1, 10))
                .value(json!({"rules": [{"rules": [
                    {"constraint": "title", "operator": "equals", "value": "x"}
                ]}]})),
        );

        let mut sink = MemorySink::new();
        let err = panel.apply_to_query(&mut sink).unwrap_err();
        assert!(matches!(err, FilterError::TreeTooComplex { .. }));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_disabled_panel_applies_nothing() {
        let config = FiltersConfig {
            enabled: false,
            ..FiltersConfig::default()
        };
        let panel = FilterPanel::from_config(&config).filter(TextFilter::make("name").value("x"));
        let mut sink = MemorySink::new();
        assert_eq!(panel.apply_to_query(&mut sink).unwrap(), 0);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_schema() {
        let panel = panel()
            .layout(FilterLayout::SidebarCollapsible)
            .width(FilterWidth::Large)
            .columns(0)
            .trigger_label("Refine");
        let schema = panel.to_schema();
        assert_eq!(schema["layout"], json!("sidebar-collapsible"));
        assert_eq!(schema["width"], json!("lg"));
        assert_eq!(schema["columns"], json!(1));
        assert_eq!(schema["triggerLabel"], json!("Refine"));
        assert_eq!(schema["applyLabel"], json!("Apply"));
        assert_eq!(schema["filters"].as_array().map(Vec::len), Some(4));
        assert_eq!(schema["hasActiveFilters"], json!(false));
        assert!(panel.to_json().unwrap().starts_with('{'));
    }
}
