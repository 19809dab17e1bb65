//! Constraints
//!
//! A [`Constraint`] is a typed, filterable field with an ordered operator list.
//! The typed builders in [`crate::constraints`] produce it; the compiler and the
//! schema only ever see this erased form.

use serde::{Serialize, Serializer};
use serde_json::{json, Value};

use crate::operator::{FieldRef, Operator};
use crate::options::OptionList;
use crate::predicate::Predicate;

/// Constraint type discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintType {
    Text,
    Number,
    Boolean,
    Date,
    Select,
    Relationship,
}

impl ConstraintType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Select => "select",
            Self::Relationship => "relationship",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(Self::Text),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "date" => Some(Self::Date),
            "select" => Some(Self::Select),
            "relationship" => Some(Self::Relationship),
            _ => None,
        }
    }

    pub fn default_icon(&self) -> &'static str {
        match self {
            Self::Text => "font",
            Self::Number => "hash",
            Self::Boolean => "check-circle",
            Self::Date => "calendar",
            Self::Select => "list",
            Self::Relationship => "link",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumberSettings {
    pub integer: bool,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub step: Option<f64>,
}

impl NumberSettings {
    pub fn effective_step(&self) -> f64 {
        self.step.unwrap_or(if self.integer { 1.0 } else { 0.01 })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BooleanSettings {
    pub true_label: String,
    pub false_label: String,
}

impl Default for BooleanSettings {
    fn default() -> Self {
        Self {
            true_label: "Yes".to_string(),
            false_label: "No".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateSettings {
    pub with_time: bool,
    pub min_date: Option<String>,
    pub max_date: Option<String>,
    pub format: String,
}

impl Default for DateSettings {
    fn default() -> Self {
        Self {
            with_time: false,
            min_date: None,
            max_date: None,
            format: "Y-m-d".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectSettings {
    pub multiple: bool,
    pub searchable: bool,
    pub options: OptionList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipSettings {
    pub relationship: String,
    pub related_key: String,
    pub multiple: bool,
    pub searchable: bool,
    pub title_attribute: String,
    pub options: OptionList,
}

/// Type-specific settings used by the client widget
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintSettings {
    Text,
    Number(NumberSettings),
    Boolean(BooleanSettings),
    Date(DateSettings),
    Select(SelectSettings),
    Relationship(RelationshipSettings),
}

impl ConstraintSettings {
    pub fn constraint_type(&self) -> ConstraintType {
        match self {
            Self::Text => ConstraintType::Text,
            Self::Number(_) => ConstraintType::Number,
            Self::Boolean(_) => ConstraintType::Boolean,
            Self::Date(_) => ConstraintType::Date,
            Self::Select(_) => ConstraintType::Select,
            Self::Relationship(_) => ConstraintType::Relationship,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Text => json!({}),
            Self::Number(s) => json!({
                "integer": s.integer,
                "min": s.min,
                "max": s.max,
                "step": s.effective_step(),
            }),
            Self::Boolean(s) => json!({
                "trueLabel": s.true_label,
                "falseLabel": s.false_label,
            }),
            Self::Date(s) => json!({
                "withTime": s.with_time,
                "minDate": s.min_date,
                "maxDate": s.max_date,
                "format": s.format,
            }),
            Self::Select(s) => json!({
                "multiple": s.multiple,
                "searchable": s.searchable,
                "options": s.options.formatted(),
            }),
            Self::Relationship(s) => json!({
                "relationship": s.relationship,
                "relatedKey": s.related_key,
                "multiple": s.multiple,
                "searchable": s.searchable,
                "titleAttribute": s.title_attribute,
                "options": s.options.formatted(),
            }),
        }
    }
}

/// A filterable field and the operators it offers
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub(crate) name: String,
    pub(crate) label: String,
    pub(crate) icon: String,
    pub(crate) column: String,
    pub(crate) nullable: bool,
    pub(crate) operators: Vec<Operator>,
    pub(crate) settings: ConstraintSettings,
}

impl Constraint {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    pub fn settings(&self) -> &ConstraintSettings {
        &self.settings
    }

    pub fn constraint_type(&self) -> ConstraintType {
        self.settings.constraint_type()
    }

    /// Look an operator up by name within this constraint
    pub fn find_operator(&self, name: &str) -> Option<&Operator> {
        self.operators.iter().find(|op| op.name() == name)
    }

    /// What the operators read: the column, or the relation for relationships
    pub fn field_ref(&self) -> FieldRef {
        match &self.settings {
            ConstraintSettings::Relationship(s) => {
                FieldRef::relation(s.relationship.clone(), s.related_key.clone())
            }
            _ => FieldRef::column(self.column.clone()),
        }
    }

    /// Predicate for `operator` applied to `value`; `None` when the operator
    /// is unknown or the rule should not restrict
    pub fn predicate(&self, operator: &str, value: Option<&Value>) -> Option<Predicate> {
        self.find_operator(operator)?
            .predicate(&self.field_ref(), value)
    }

    /// Client-facing description of the constraint
    pub fn to_schema(&self) -> Value {
        json!({
            "name": self.name,
            "label": self.label,
            "icon": self.icon,
            "column": self.column,
            "type": self.constraint_type(),
            "nullable": self.nullable,
            "operators": self.operators,
            "settings": self.settings.to_json(),
        })
    }
}

impl Serialize for Constraint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_schema().serialize(serializer)
    }
}

/// `created_at` -> `Created at`
pub fn humanize(name: &str) -> String {
    let mut chars = name.chars();
    let head: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    head.replace('_', " ")
}

/// State shared by every typed constraint builder
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintBase {
    pub(crate) name: String,
    pub(crate) label: Option<String>,
    pub(crate) icon: Option<String>,
    pub(crate) column: Option<String>,
    pub(crate) nullable: bool,
    pub(crate) operators: Vec<Operator>,
}

impl ConstraintBase {
    pub(crate) fn new(name: impl Into<String>, operators: Vec<Operator>) -> Self {
        Self {
            name: name.into(),
            label: None,
            icon: None,
            column: None,
            nullable: false,
            operators,
        }
    }

    pub(crate) fn build(self, settings: ConstraintSettings) -> Constraint {
        let kind = settings.constraint_type();
        Constraint {
            label: self.label.unwrap_or_else(|| humanize(&self.name)),
            icon: self.icon.unwrap_or_else(|| kind.default_icon().to_string()),
            column: self.column.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            nullable: self.nullable,
            operators: self.operators,
            settings,
        }
    }
}

/// Fluent setters shared by the typed constraints
pub trait ConstraintBuilder: Sized + Into<Constraint> {
    fn base(&self) -> &ConstraintBase;

    fn base_mut(&mut self) -> &mut ConstraintBase;

    /// Whether an operator belongs to this constraint type
    fn accepts(operator: &Operator) -> bool;

    fn label(mut self, label: impl Into<String>) -> Self {
        self.base_mut().label = Some(label.into());
        self
    }

    fn icon(mut self, icon: impl Into<String>) -> Self {
        self.base_mut().icon = Some(icon.into());
        self
    }

    fn column(mut self, column: impl Into<String>) -> Self {
        self.base_mut().column = Some(column.into());
        self
    }

    fn nullable(mut self, nullable: bool) -> Self {
        self.base_mut().nullable = nullable;
        self
    }

    /// Replace the operator list with a subset of this type's operators.
    ///
    /// Foreign operators and repeated names are dropped. If nothing usable
    /// remains the current list is kept.
    fn operators<I, O>(mut self, operators: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<Operator>,
    {
        let mut kept: Vec<Operator> = Vec::new();
        for op in operators.into_iter().map(Into::into) {
            if !Self::accepts(&op) {
                tracing::warn!(
                    constraint = %self.base().name,
                    operator = op.name(),
                    "Ignoring operator from another constraint type"
                );
                continue;
            }
            if kept.iter().all(|k| k.name() != op.name()) {
                kept.push(op);
            }
        }

        if kept.is_empty() {
            tracing::warn!(
                constraint = %self.base().name,
                "Operator list would be empty, keeping defaults"
            );
        } else {
            self.base_mut().operators = kept;
        }
        self
    }

    /// Keep only the named operators, in the given order
    fn only_operators(mut self, names: &[&str]) -> Self {
        let current = std::mem::take(&mut self.base_mut().operators);
        let picked: Vec<Operator> = names
            .iter()
            .filter_map(|name| current.iter().find(|op| op.name() == *name).cloned())
            .collect();
        self.base_mut().operators = current;
        self.operators(picked)
    }

    fn build(self) -> Constraint {
        self.into()
    }
}
