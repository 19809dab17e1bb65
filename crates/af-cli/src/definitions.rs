//! Constraint definition files
//!
//! A definition file is a JSON or YAML list of constraints:
//!
//! ```yaml
//! - name: status
//!   type: select
//!   options: { draft: Draft, published: Published }
//! - name: age
//!   type: number
//!   integer: true
//!   operators: [equals, greater_than]
//! ```

use std::path::Path;

use af_core::{FilterError, FilterResult};
use af_query_builder::{
    BooleanConstraint, Constraint, ConstraintBuilder, ConstraintRegistry, ConstraintType, DateConstraint,
    NumberConstraint, OptionList, RelationshipConstraint, SelectConstraint, TextConstraint,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub label: Option<String>,
    pub icon: Option<String>,
    pub column: Option<String>,
    pub nullable: Option<bool>,
    pub operators: Option<Vec<String>>,

    pub integer: Option<bool>,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub step: Option<f64>,

    #[serde(alias = "true_label")]
    pub true_label: Option<String>,
    #[serde(alias = "false_label")]
    pub false_label: Option<String>,

    #[serde(alias = "with_time")]
    pub with_time: Option<bool>,
    #[serde(alias = "min_date")]
    pub min_date: Option<String>,
    #[serde(alias = "max_date")]
    pub max_date: Option<String>,
    pub format: Option<String>,

    pub multiple: Option<bool>,
    pub searchable: Option<bool>,
    pub options: Option<Value>,
    pub relationship: Option<String>,
    #[serde(alias = "related_key")]
    pub related_key: Option<String>,
    #[serde(alias = "title_attribute")]
    pub title_attribute: Option<String>,
}

impl ConstraintDef {
    pub fn into_constraint(self) -> FilterResult<Constraint> {
        let kind = ConstraintType::parse(&self.kind).ok_or_else(|| {
            FilterError::definition(format!("constraint '{}' has unknown type '{}'", self.name, self.kind))
        })?;
        let options = self.options.as_ref().map(OptionList::from_json);

        let constraint = match kind {
            ConstraintType::Text => self.common(TextConstraint::make(&self.name)).build(),
            ConstraintType::Number => {
                let mut c = NumberConstraint::make(&self.name)
                    .integer(self.integer.unwrap_or(false))
                    .min(self.min)
                    .max(self.max);
                if self.step.is_some() {
                    c = c.step(self.step);
                }
                self.common(c).build()
            }
            ConstraintType::Boolean => {
                let mut c = BooleanConstraint::make(&self.name);
                if let Some(label) = &self.true_label {
                    c = c.true_label(label);
                }
                if let Some(label) = &self.false_label {
                    c = c.false_label(label);
                }
                self.common(c).build()
            }
            ConstraintType::Date => {
                let mut c = DateConstraint::make(&self.name)
                    .with_time(self.with_time.unwrap_or(false))
                    .min_date(self.min_date.clone())
                    .max_date(self.max_date.clone());
                if let Some(format) = &self.format {
                    c = c.format(format);
                }
                self.common(c).build()
            }
            ConstraintType::Select => {
                let mut c = SelectConstraint::make(&self.name)
                    .multiple(self.multiple.unwrap_or(false))
                    .searchable(self.searchable.unwrap_or(false));
                if let Some(options) = options {
                    c = c.options(options);
                }
                self.common(c).build()
            }
            ConstraintType::Relationship => {
                let mut c = RelationshipConstraint::make(&self.name)
                    .multiple(self.multiple.unwrap_or(false))
                    .searchable(self.searchable.unwrap_or(false));
                if let Some(relationship) = &self.relationship {
                    c = c.relationship(relationship);
                }
                if let Some(key) = &self.related_key {
                    c = c.related_key(key);
                }
                if let Some(attribute) = &self.title_attribute {
                    c = c.title_attribute(attribute);
                }
                if let Some(options) = options {
                    c = c.options(options);
                }
                self.common(c).build()
            }
        };
        Ok(constraint)
    }

    fn common<B: ConstraintBuilder>(&self, mut builder: B) -> B {
        if let Some(label) = &self.label {
            builder = builder.label(label);
        }
        if let Some(icon) = &self.icon {
            builder = builder.icon(icon);
        }
        if let Some(column) = &self.column {
            builder = builder.column(column);
        }
        if let Some(nullable) = self.nullable {
            builder = builder.nullable(nullable);
        }
        if let Some(names) = &self.operators {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            builder = builder.only_operators(&names);
        }
        builder
    }
}

/// Parse JSON or YAML, picked by file extension (JSON when unknown)
pub fn parse_document<T: DeserializeOwned>(path: &Path, contents: &str) -> FilterResult<T> {
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        serde_yaml::from_str(contents)
            .map_err(|e| FilterError::definition(format!("{}: {}", path.display(), e)))
    } else {
        Ok(serde_json::from_str(contents)?)
    }
}

/// Build a registry from definitions; later duplicates replace earlier ones
pub fn registry_from_defs(defs: Vec<ConstraintDef>) -> FilterResult<ConstraintRegistry> {
    let mut registry = ConstraintRegistry::new();
    for def in defs {
        registry.register(def.into_constraint()?);
    }
    Ok(registry)
}

pub fn load_registry(path: &Path) -> anyhow::Result<ConstraintRegistry> {
    let contents = std::fs::read_to_string(path)?;
    let defs: Vec<ConstraintDef> = parse_document(path, &contents)?;
    tracing::info!(path = %path.display(), count = defs.len(), "Loaded constraint definitions");
    Ok(registry_from_defs(defs)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry(yaml: &str) -> ConstraintRegistry {
        let defs: Vec<ConstraintDef> = parse_document(Path::new("defs.yaml"), yaml).unwrap();
        registry_from_defs(defs).unwrap()
    }

    #[test]
    fn test_yaml_definitions() {
        let registry = registry(
            r#"
- name: status
  type: select
  multiple: true
  options: { draft: Draft, published: Published }
- name: age
  type: number
  integer: true
  min: 0
  operators: [equals, greater_than, not_a_number_operator]
- name: published_at
  type: date
  withTime: true
  label: Published
"#,
        );
        assert_eq!(registry.len(), 3);

        let schema = registry.to_schema();
        assert_eq!(schema[0]["type"], json!("select"));
        assert_eq!(schema[0]["settings"]["multiple"], json!(true));
        assert_eq!(schema[0]["settings"]["options"][1]["label"], json!("Published"));

        let age = registry.get("age").unwrap();
        let names: Vec<&str> = age.operators().iter().map(|op| op.name()).collect();
        assert_eq!(names, vec!["equals", "greater_than"]);

        assert_eq!(registry.get("published_at").unwrap().label(), "Published");
    }

    #[test]
    fn test_json_definitions_and_relationship() {
        let defs: Vec<ConstraintDef> = parse_document(
            Path::new("defs.json"),
            r#"[{"name": "roles", "type": "relationship", "related_key": "role_id", "nullable": true}]"#,
        )
        .unwrap();
        let registry = registry_from_defs(defs).unwrap();
        let roles = registry.get("roles").unwrap();
        assert!(roles.is_nullable());
        assert_eq!(roles.to_schema()["settings"]["relatedKey"], json!("role_id"));
    }

    #[test]
    fn test_unknown_type_is_definition_error() {
        let def = ConstraintDef {
            name: "x".into(),
            kind: "colour".into(),
            ..ConstraintDef::default()
        };
        let err = def.into_constraint().unwrap_err();
        assert!(matches!(err, FilterError::Definition { .. }));
    }
}
