//! Relationship constraint
//!
//! Existence and count conditions on a named relation, optionally narrowed to
//! explicit related ids.

use serde_json::Value;

use crate::constraint::{
    Constraint, ConstraintBase, ConstraintBuilder, ConstraintSettings, RelationshipSettings,
};
use crate::operator::{FieldRef, InputType, Operator, OperatorKind, OperatorStrategy};
use crate::options::OptionList;
use crate::predicate::{CompareOp, CountBound, Predicate, Presence};
use crate::value::{as_number, as_scalar, as_scalar_list, Scalar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationshipOperator {
    /// Has a related record, or one of the given ids
    Has,
    /// Has no related record among the given ids
    DoesNotHave,
    /// At least `count` related records
    HasMin,
    /// At most `count` related records
    HasMax,
    /// No related records
    HasNone,
    /// Any related record
    HasAny,
}

impl RelationshipOperator {
    pub const ALL: [RelationshipOperator; 6] = [
        Self::Has,
        Self::DoesNotHave,
        Self::HasMin,
        Self::HasMax,
        Self::HasNone,
        Self::HasAny,
    ];
}

/// `{"count": n}` (default 1) or a bare number
fn count_of(value: &Value) -> Option<i64> {
    let raw = match value {
        Value::Object(map) => match map.get("count") {
            None | Some(Value::Null) => return Some(1),
            Some(count) => count,
        },
        other => other,
    };
    let count = match as_number(raw)? {
        Scalar::Int(i) => i,
        Scalar::Float(f) if f.fract() == 0.0 => f as i64,
        _ => return None,
    };
    (count >= 0).then_some(count)
}

/// Related-key condition for explicit ids
fn key_condition(field: &FieldRef, value: &Value) -> Option<Predicate> {
    let key = field.related_key();
    match value {
        Value::Array(_) => {
            let ids = as_scalar_list(value)?;
            (!ids.is_empty()).then(|| Predicate::is_in(key, ids))
        }
        scalar => Some(Predicate::compare(key, CompareOp::Eq, as_scalar(scalar)?)),
    }
}

impl OperatorStrategy for RelationshipOperator {
    fn name(&self) -> &'static str {
        match self {
            Self::Has => "has",
            Self::DoesNotHave => "does_not_have",
            Self::HasMin => "has_min",
            Self::HasMax => "has_max",
            Self::HasNone => "has_none",
            Self::HasAny => "has_any",
        }
    }

    fn default_label(&self) -> &'static str {
        match self {
            Self::Has => "Has",
            Self::DoesNotHave => "Does not have",
            Self::HasMin => "Has at least",
            Self::HasMax => "Has at most",
            Self::HasNone => "Has none",
            Self::HasAny => "Has any",
        }
    }

    fn requires_value(&self) -> bool {
        !matches!(self, Self::HasNone | Self::HasAny)
    }

    fn input_type(&self) -> InputType {
        match self {
            Self::Has | Self::DoesNotHave => InputType::Select,
            Self::HasMin | Self::HasMax => InputType::Number,
            Self::HasNone | Self::HasAny => InputType::Text,
        }
    }

    fn predicate(&self, field: &FieldRef, value: Option<&Value>) -> Option<Predicate> {
        let relation = field.column.as_str();
        match self {
            Self::HasAny => Some(Predicate::relation(relation, Presence::Exists, None)),
            Self::HasNone => Some(Predicate::relation(relation, Presence::Missing, None)),
            Self::Has => {
                let condition = key_condition(field, value?)?;
                Some(Predicate::relation(relation, Presence::Exists, Some(condition)))
            }
            Self::DoesNotHave => {
                let condition = key_condition(field, value?)?;
                Some(Predicate::relation(relation, Presence::Missing, Some(condition)))
            }
            Self::HasMin => {
                let bound = CountBound::at_least(count_of(value?)?);
                Some(Predicate::relation(relation, Presence::Count(bound), None))
            }
            Self::HasMax => {
                let bound = CountBound::at_most(count_of(value?)?);
                Some(Predicate::relation(relation, Presence::Count(bound), None))
            }
        }
    }
}

/// Constraint over an association's cardinality or members
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipConstraint {
    base: ConstraintBase,
    relationship: Option<String>,
    related_key: String,
    multiple: bool,
    searchable: bool,
    title_attribute: String,
    options: OptionList,
}

impl RelationshipConstraint {
    pub fn make(name: impl Into<String>) -> Self {
        Self {
            base: ConstraintBase::new(name, RelationshipOperator::ALL.map(Operator::from).to_vec()),
            relationship: None,
            related_key: "id".to_string(),
            multiple: false,
            searchable: false,
            title_attribute: "name".to_string(),
            options: OptionList::default(),
        }
    }

    /// Relation name; defaults to the constraint name
    pub fn relationship(mut self, relationship: impl Into<String>) -> Self {
        self.relationship = Some(relationship.into());
        self
    }

    /// Key on related records matched by `has` and `does_not_have`
    pub fn related_key(mut self, key: impl Into<String>) -> Self {
        self.related_key = key.into();
        self
    }

    pub fn title_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.title_attribute = attribute.into();
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

    pub fn options(mut self, options: OptionList) -> Self {
        self.options = options;
        self
    }
}

impl ConstraintBuilder for RelationshipConstraint {
    fn base(&self) -> &ConstraintBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ConstraintBase {
        &mut self.base
    }

    fn accepts(operator: &Operator) -> bool {
        matches!(operator.kind(), OperatorKind::Relationship(_))
    }
}

impl From<RelationshipConstraint> for Constraint {
    fn from(c: RelationshipConstraint) -> Self {
        let settings = RelationshipSettings {
            relationship: c.relationship.unwrap_or_else(|| c.base.name.clone()),
            related_key: c.related_key,
            multiple: c.multiple,
            searchable: c.searchable,
            title_attribute: c.title_attribute,
            options: c.options,
        };
        c.base.build(ConstraintSettings::Relationship(settings))
    }
}
