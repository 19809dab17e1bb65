//! Text constraint
//!
//! Substring and exact matches on a string column. Pattern operators match
//! case-insensitively.

use serde_json::Value;

use crate::constraint::{Constraint, ConstraintBase, ConstraintBuilder, ConstraintSettings};
use crate::operator::{FieldRef, Operator, OperatorKind, OperatorStrategy};
use crate::predicate::{CompareOp, LikePattern, Predicate};
use crate::value::as_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextOperator {
    /// Contains the value (%value%)
    Contains,
    /// Does not contain the value
    NotContains,
    /// Starts with the value (value%)
    StartsWith,
    /// Ends with the value (%value)
    EndsWith,
    /// Equals (=)
    Equals,
    /// Not equals (!=)
    NotEquals,
    /// Is null
    IsBlank,
    /// Is not null
    IsNotBlank,
}

impl TextOperator {
    pub const ALL: [TextOperator; 8] = [
        Self::Contains,
        Self::NotContains,
        Self::StartsWith,
        Self::EndsWith,
        Self::Equals,
        Self::NotEquals,
        Self::IsBlank,
        Self::IsNotBlank,
    ];
}

impl OperatorStrategy for TextOperator {
    fn name(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::IsBlank => "is_blank",
            Self::IsNotBlank => "is_not_blank",
        }
    }

    fn default_label(&self) -> &'static str {
        match self {
            Self::Contains => "Contains",
            Self::NotContains => "Does not contain",
            Self::StartsWith => "Starts with",
            Self::EndsWith => "Ends with",
            Self::Equals => "Equals",
            Self::NotEquals => "Does not equal",
            Self::IsBlank => "Is blank",
            Self::IsNotBlank => "Is not blank",
        }
    }

    fn requires_value(&self) -> bool {
        !matches!(self, Self::IsBlank | Self::IsNotBlank)
    }

    fn predicate(&self, field: &FieldRef, value: Option<&Value>) -> Option<Predicate> {
        let column = field.column.as_str();

        // Blank means null or empty string
        match self {
            Self::IsBlank => {
                return Some(Predicate::or(vec![
                    Predicate::is_null(column),
                    Predicate::compare(column, CompareOp::Eq, ""),
                ]))
            }
            Self::IsNotBlank => {
                return Some(Predicate::and(vec![
                    Predicate::is_not_null(column),
                    Predicate::compare(column, CompareOp::NotEq, ""),
                ]))
            }
            _ => {}
        }

        let text = as_text(value?)?;
        Some(match self {
            Self::Contains => Predicate::like(column, LikePattern::contains(text)),
            Self::NotContains => Predicate::not_like(column, LikePattern::contains(text)),
            Self::StartsWith => Predicate::like(column, LikePattern::starts_with(text)),
            Self::EndsWith => Predicate::like(column, LikePattern::ends_with(text)),
            Self::Equals => Predicate::compare(column, CompareOp::Eq, text),
            Self::NotEquals => Predicate::compare(column, CompareOp::NotEq, text),
            Self::IsBlank | Self::IsNotBlank => return None,
        })
    }
}

/// Constraint over a text column
#[derive(Debug, Clone, PartialEq)]
pub struct TextConstraint {
    base: ConstraintBase,
}

impl TextConstraint {
    pub fn make(name: impl Into<String>) -> Self {
        Self {
            base: ConstraintBase::new(name, TextOperator::ALL.map(Operator::from).to_vec()),
        }
    }
}

impl ConstraintBuilder for TextConstraint {
    fn base(&self) -> &ConstraintBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ConstraintBase {
        &mut self.base
    }

    fn accepts(operator: &Operator) -> bool {
        matches!(operator.kind(), OperatorKind::Text(_))
    }
}

impl From<TextConstraint> for Constraint {
    fn from(c: TextConstraint) -> Self {
        c.base.build(ConstraintSettings::Text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row_matches(constraint: &Constraint, op: &str, value: Value, row: Value) -> bool {
        constraint
            .predicate(op, Some(&value))
            .map_or(true, |p| p.evaluate(&row))
    }

    #[test]
    fn test_defaults() {
        let constraint: Constraint = TextConstraint::make("first_name").into();
        assert_eq!(constraint.label(), "First name");
        assert_eq!(constraint.icon(), "font");
        assert_eq!(constraint.column(), "first_name");
        assert_eq!(constraint.operators().len(), 8);
        assert_eq!(constraint.to_schema()["settings"], json!({}));
    }

    #[test]
    fn test_like_operators_are_case_insensitive() {
        let c: Constraint = TextConstraint::make("name").into();
        let row = json!({"name": "Johnny"});
        assert!(row_matches(&c, "contains", json!("JOHN"), row.clone()));
        assert!(row_matches(&c, "starts_with", json!("jo"), row.clone()));
        assert!(row_matches(&c, "ends_with", json!("NNY"), row.clone()));
        assert!(!row_matches(&c, "not_contains", json!("ohn"), row.clone()));
        assert!(row_matches(&c, "equals", json!("Johnny"), row.clone()));
        assert!(!row_matches(&c, "not_equals", json!("Johnny"), row));
    }

    #[test]
    fn test_blank_covers_null_and_empty() {
        let c: Constraint = TextConstraint::make("note").into();
        let blank = c.predicate("is_blank", None).unwrap();
        assert!(blank.evaluate(&json!({"note": null})));
        assert!(blank.evaluate(&json!({"note": ""})));
        assert!(blank.evaluate(&json!({})));
        assert!(!blank.evaluate(&json!({"note": "x"})));

        let not_blank = c.predicate("is_not_blank", Some(&json!("ignored"))).unwrap();
        assert!(not_blank.evaluate(&json!({"note": "x"})));
        assert!(!not_blank.evaluate(&json!({"note": ""})));
        assert!(!not_blank.evaluate(&json!({"note": null})));
    }

    #[test]
    fn test_list_value_is_malformed() {
        let c: Constraint = TextConstraint::make("name").into();
        assert_eq!(c.predicate("contains", Some(&json!(["a"]))), None);
        assert_eq!(c.predicate("contains", Some(&json!({"a": 1}))), None);
    }

    #[test]
    fn test_operator_subset_and_column() {
        let c: Constraint = TextConstraint::make("email")
            .column("users.email")
            .label("E-mail")
            .only_operators(&["equals", "contains", "equals"])
            .into();
        let names: Vec<&str> = c.operators().iter().map(|o| o.name()).collect();
        assert_eq!(names, vec!["equals", "contains"]);
        assert_eq!(c.label(), "E-mail");
        assert_eq!(c.field_ref(), FieldRef::column("users.email"));
    }
}
