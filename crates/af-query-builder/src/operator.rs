//! Operators
//!
//! An [`Operator`] is display metadata plus one [`OperatorKind`]. The kinds are
//! closed per constraint type, so the set of predicates a rule tree can
//! produce is known up front.

use serde::Serialize;
use serde_json::Value;

use crate::constraints::{
    BooleanOperator, DateOperator, NumberOperator, RelationshipOperator, SelectOperator,
    TextOperator,
};
use crate::predicate::Predicate;
use crate::sink::QuerySink;
use crate::value::is_absent;

/// Hint for the value control a client should render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputType {
    #[default]
    Text,
    Number,
    NumberRange,
    Date,
    DateRange,
    Select,
    Month,
    Year,
}

/// What an operator reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    /// Column, or relation name for relationship constraints
    pub column: String,
    /// Key compared inside related records
    pub related_key: Option<String>,
}

impl FieldRef {
    pub fn column(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            related_key: None,
        }
    }

    pub fn relation(relation: impl Into<String>, related_key: impl Into<String>) -> Self {
        Self {
            column: relation.into(),
            related_key: Some(related_key.into()),
        }
    }

    pub fn related_key(&self) -> &str {
        self.related_key.as_deref().unwrap_or("id")
    }
}

/// Behaviour shared by every operator kind
pub trait OperatorStrategy {
    fn name(&self) -> &'static str;

    fn default_label(&self) -> &'static str;

    fn requires_value(&self) -> bool {
        true
    }

    fn input_type(&self) -> InputType {
        InputType::Text
    }

    /// Build the predicate for `value`; `None` is the neutral outcome.
    ///
    /// Value-less operators are called with `None`.
    fn predicate(&self, field: &FieldRef, value: Option<&Value>) -> Option<Predicate>;
}

/// Closed set of operator kinds, grouped by constraint type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Text(TextOperator),
    Number(NumberOperator),
    Boolean(BooleanOperator),
    Date(DateOperator),
    Select(SelectOperator),
    Relationship(RelationshipOperator),
}

impl OperatorKind {
    fn strategy(&self) -> &dyn OperatorStrategy {
        match self {
            Self::Text(op) => op,
            Self::Number(op) => op,
            Self::Boolean(op) => op,
            Self::Date(op) => op,
            Self::Select(op) => op,
            Self::Relationship(op) => op,
        }
    }
}

impl OperatorStrategy for OperatorKind {
    fn name(&self) -> &'static str {
        self.strategy().name()
    }

    fn default_label(&self) -> &'static str {
        self.strategy().default_label()
    }

    fn requires_value(&self) -> bool {
        self.strategy().requires_value()
    }

    fn input_type(&self) -> InputType {
        self.strategy().input_type()
    }

    fn predicate(&self, field: &FieldRef, value: Option<&Value>) -> Option<Predicate> {
        self.strategy().predicate(field, value)
    }
}

/// A named comparison offered by a constraint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operator {
    name: String,
    label: String,
    requires_value: bool,
    input_type: InputType,
    #[serde(skip)]
    kind: OperatorKind,
}

impl Operator {
    pub fn new(kind: OperatorKind) -> Self {
        Self {
            name: kind.name().to_string(),
            label: kind.default_label().to_string(),
            requires_value: kind.requires_value(),
            input_type: kind.input_type(),
            kind,
        }
    }

    /// Replace the display label
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_label(&self) -> &str {
        &self.label
    }

    pub fn requires_value(&self) -> bool {
        self.requires_value
    }

    pub fn input_type(&self) -> InputType {
        self.input_type
    }

    pub fn kind(&self) -> OperatorKind {
        self.kind
    }

    /// Predicate for `value`, or `None` when the rule should not restrict.
    ///
    /// A value-requiring operator given an absent value is neutral; a
    /// value-less operator never sees the value.
    pub fn predicate(&self, field: &FieldRef, value: Option<&Value>) -> Option<Predicate> {
        if !self.requires_value {
            return self.kind.predicate(field, None);
        }
        if is_absent(value) {
            return None;
        }
        self.kind.predicate(field, value)
    }

    /// Emit into a sink; returns whether anything was emitted
    pub fn apply<S: QuerySink>(&self, sink: &mut S, field: &FieldRef, value: Option<&Value>) -> bool {
        match self.predicate(field, value) {
            Some(predicate) => {
                predicate.apply_to(sink);
                true
            }
            None => false,
        }
    }
}

impl From<OperatorKind> for Operator {
    fn from(kind: OperatorKind) -> Self {
        Self::new(kind)
    }
}

macro_rules! operator_from {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for OperatorKind {
                fn from(op: $ty) -> Self {
                    Self::$variant(op)
                }
            }

            impl From<$ty> for Operator {
                fn from(op: $ty) -> Self {
                    Self::new(OperatorKind::$variant(op))
                }
            }
        )*
    };
}

operator_from! {
    TextOperator => Text,
    NumberOperator => Number,
    BooleanOperator => Boolean,
    DateOperator => Date,
    SelectOperator => Select,
    RelationshipOperator => Relationship,
}
