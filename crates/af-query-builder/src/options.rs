//! Option lists for select-like constraints and filters

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry as sent to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: Value,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
enum RawOption {
    Pair { value: Value, label: String },
    Record { key: Value, record: serde_json::Map<String, Value> },
}

/// Options given as value/label pairs or as records
#[derive(Debug, Clone, PartialEq)]
pub struct OptionList {
    raw: Vec<RawOption>,
    value_key: Option<String>,
    label_key: Option<String>,
    preload: bool,
}

impl Default for OptionList {
    fn default() -> Self {
        Self {
            raw: Vec::new(),
            value_key: None,
            label_key: None,
            preload: true,
        }
    }
}

impl OptionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(value, label)` pairs
    pub fn pairs<V, L, I>(pairs: I) -> Self
    where
        V: Into<Value>,
        L: Into<String>,
        I: IntoIterator<Item = (V, L)>,
    {
        Self {
            raw: pairs
                .into_iter()
                .map(|(value, label)| RawOption::Pair {
                    value: value.into(),
                    label: label.into(),
                })
                .collect(),
            ..Self::default()
        }
    }

    /// Build from records such as `{"id": 1, "name": "Admin"}`
    pub fn records(records: impl IntoIterator<Item = serde_json::Map<String, Value>>) -> Self {
        Self {
            raw: records
                .into_iter()
                .enumerate()
                .map(|(i, record)| RawOption::Record {
                    key: Value::from(i),
                    record,
                })
                .collect(),
            ..Self::default()
        }
    }

    /// Accept a JSON object (`{"active": "Active"}` or `{"a": {...}}`) or a
    /// list of records or scalars
    pub fn from_json(value: &Value) -> Self {
        let raw = match value {
            Value::Object(map) => map
                .iter()
                .map(|(key, entry)| raw_entry(Value::String(key.clone()), entry))
                .collect(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, entry)| match entry {
                    Value::Object(_) => raw_entry(Value::from(i), entry),
                    scalar => RawOption::Pair {
                        value: scalar.clone(),
                        label: label_text(scalar),
                    },
                })
                .collect(),
            _ => Vec::new(),
        };
        Self {
            raw,
            ..Self::default()
        }
    }

    /// Key read for the option value in records (default `id`)
    pub fn option_value(mut self, key: impl Into<String>) -> Self {
        self.value_key = Some(key.into());
        self
    }

    /// Key read for the option label in records (default `name`, then `label`)
    pub fn option_label(mut self, key: impl Into<String>) -> Self {
        self.label_key = Some(key.into());
        self
    }

    pub fn preload(mut self, preload: bool) -> Self {
        self.preload = preload;
        self
    }

    pub fn should_preload(&self) -> bool {
        self.preload
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Normalised `{value, label}` entries
    pub fn formatted(&self) -> Vec<SelectOption> {
        self.raw
            .iter()
            .map(|raw| match raw {
                RawOption::Pair { value, label } => SelectOption {
                    value: value.clone(),
                    label: label.clone(),
                },
                RawOption::Record { key, record } => {
                    let value = record
                        .get(self.value_key.as_deref().unwrap_or("id"))
                        .cloned()
                        .unwrap_or_else(|| key.clone());
                    let label = match &self.label_key {
                        Some(k) => record.get(k),
                        None => record.get("name").or_else(|| record.get("label")),
                    }
                    .map(label_text)
                    .unwrap_or_else(|| label_text(key));
                    SelectOption { value, label }
                }
            })
            .collect()
    }

    /// Label for a stored value, used when displaying active filters
    pub fn label_for(&self, value: &Value) -> Option<String> {
        self.formatted()
            .into_iter()
            .find(|opt| same_value(&opt.value, value))
            .map(|opt| opt.label)
    }
}

fn raw_entry(key: Value, entry: &Value) -> RawOption {
    match entry {
        Value::Object(record) => RawOption::Record {
            key,
            record: record.clone(),
        },
        other => RawOption::Pair {
            value: key,
            label: label_text(other),
        },
    }
}

fn label_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Loose equality so `"1"` finds option `1`
fn same_value(a: &Value, b: &Value) -> bool {
    a == b || label_text(a) == label_text(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pairs() {
        let options = OptionList::pairs([("active", "Active"), ("inactive", "Inactive")]);
        assert_eq!(
            serde_json::to_value(options.formatted()).unwrap(),
            json!([
                {"value": "active", "label": "Active"},
                {"value": "inactive", "label": "Inactive"}
            ])
        );
    }

    #[test]
    fn test_records_use_id_and_name() {
        let options = OptionList::from_json(&json!([
            {"id": 1, "name": "Admin"},
            {"id": 2, "label": "Editor"},
            {"title": "Nobody"}
        ]));
        let formatted = options.formatted();
        assert_eq!(formatted[0], SelectOption { value: json!(1), label: "Admin".into() });
        assert_eq!(formatted[1], SelectOption { value: json!(2), label: "Editor".into() });
        assert_eq!(formatted[2], SelectOption { value: json!(2), label: "2".into() });
    }

    #[test]
    fn test_custom_keys() {
        let options = OptionList::from_json(&json!([{"code": "NO", "title": "Norway"}]))
            .option_value("code")
            .option_label("title");
        assert_eq!(options.label_for(&json!("NO")), Some("Norway".to_string()));
    }

    #[test]
    fn test_object_map() {
        let options = OptionList::from_json(&json!({"draft": "Draft", "1": "One"}));
        assert_eq!(options.label_for(&json!("draft")), Some("Draft".to_string()));
        assert_eq!(options.label_for(&json!(1)), Some("One".to_string()));
        assert!(options.should_preload());
    }
}
