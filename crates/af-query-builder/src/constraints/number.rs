//! Number constraint

use serde_json::Value;

use crate::constraint::{
    Constraint, ConstraintBase, ConstraintBuilder, ConstraintSettings, NumberSettings,
};
use crate::operator::{FieldRef, InputType, Operator, OperatorKind, OperatorStrategy};
use crate::predicate::{CompareOp, Predicate};
use crate::value::as_number;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberOperator {
    /// Equals (=)
    Equals,
    /// Not equals (!=)
    NotEquals,
    /// Greater than (>)
    GreaterThan,
    /// Greater than or equal (>=)
    GreaterThanOrEqual,
    /// Less than (<)
    LessThan,
    /// Less than or equal (<=)
    LessThanOrEqual,
    /// Between two values, inclusive
    Between,
    /// Is null
    IsBlank,
    /// Is not null
    IsNotBlank,
}

impl NumberOperator {
    pub const ALL: [NumberOperator; 9] = [
        Self::Equals,
        Self::NotEquals,
        Self::GreaterThan,
        Self::GreaterThanOrEqual,
        Self::LessThan,
        Self::LessThanOrEqual,
        Self::Between,
        Self::IsBlank,
        Self::IsNotBlank,
    ];

    fn compare_op(&self) -> Option<CompareOp> {
        match self {
            Self::Equals => Some(CompareOp::Eq),
            Self::NotEquals => Some(CompareOp::NotEq),
            Self::GreaterThan => Some(CompareOp::Gt),
            Self::GreaterThanOrEqual => Some(CompareOp::Gte),
            Self::LessThan => Some(CompareOp::Lt),
            Self::LessThanOrEqual => Some(CompareOp::Lte),
            _ => None,
        }
    }
}

impl OperatorStrategy for NumberOperator {
    fn name(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::GreaterThan => "greater_than",
            Self::GreaterThanOrEqual => "greater_than_or_equal",
            Self::LessThan => "less_than",
            Self::LessThanOrEqual => "less_than_or_equal",
            Self::Between => "between",
            Self::IsBlank => "is_blank",
            Self::IsNotBlank => "is_not_blank",
        }
    }

    fn default_label(&self) -> &'static str {
        match self {
            Self::Equals => "Equals",
            Self::NotEquals => "Does not equal",
            Self::GreaterThan => "Greater than",
            Self::GreaterThanOrEqual => "Greater than or equal to",
            Self::LessThan => "Less than",
            Self::LessThanOrEqual => "Less than or equal to",
            Self::Between => "Between",
            Self::IsBlank => "Is blank",
            Self::IsNotBlank => "Is not blank",
        }
    }

    fn requires_value(&self) -> bool {
        !matches!(self, Self::IsBlank | Self::IsNotBlank)
    }

    fn input_type(&self) -> InputType {
        match self {
            Self::Between => InputType::NumberRange,
            Self::IsBlank | Self::IsNotBlank => InputType::Text,
            _ => InputType::Number,
        }
    }

    fn predicate(&self, field: &FieldRef, value: Option<&Value>) -> Option<Predicate> {
        let column = field.column.as_str();
        match self {
            Self::IsBlank => Some(Predicate::is_null(column)),
            Self::IsNotBlank => Some(Predicate::is_not_null(column)),
            // Exactly [low, high]; bounds are used as given
            Self::Between => match value? {
                Value::Array(bounds) if bounds.len() == 2 => {
                    let low = as_number(&bounds[0])?;
                    let high = as_number(&bounds[1])?;
                    Some(Predicate::between(column, low, high))
                }
                _ => None,
            },
            _ => {
                let op = self.compare_op()?;
                Some(Predicate::compare(column, op, as_number(value?)?))
            }
        }
    }
}

/// Constraint over a numeric column
#[derive(Debug, Clone, PartialEq)]
pub struct NumberConstraint {
    base: ConstraintBase,
    settings: NumberSettings,
}

impl NumberConstraint {
    pub fn make(name: impl Into<String>) -> Self {
        Self {
            base: ConstraintBase::new(name, NumberOperator::ALL.map(Operator::from).to_vec()),
            settings: NumberSettings::default(),
        }
    }

    pub fn integer(mut self, integer: bool) -> Self {
        self.settings.integer = integer;
        self
    }

    pub fn min(mut self, min: Option<i64>) -> Self {
        self.settings.min = min;
        self
    }

    pub fn max(mut self, max: Option<i64>) -> Self {
        self.settings.max = max;
        self
    }

    pub fn step(mut self, step: Option<f64>) -> Self {
        self.settings.step = step;
        self
    }
}

impl ConstraintBuilder for NumberConstraint {
    fn base(&self) -> &ConstraintBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ConstraintBase {
        &mut self.base
    }

    fn accepts(operator: &Operator) -> bool {
        matches!(operator.kind(), OperatorKind::Number(_))
    }
}

impl From<NumberConstraint> for Constraint {
    fn from(c: NumberConstraint) -> Self {
        c.base.build(ConstraintSettings::Number(c.settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn age() -> Constraint {
        NumberConstraint::make("age").into()
    }

    #[test]
    fn test_between_accepts_inclusive_range() {
        let p = age().predicate("between", Some(&json!([10, 20]))).unwrap();
        assert!(p.evaluate(&json!({"age": 10})));
        assert!(p.evaluate(&json!({"age": 15})));
        assert!(p.evaluate(&json!({"age": 20})));
        assert!(!p.evaluate(&json!({"age": 9})));
        assert!(!p.evaluate(&json!({"age": 21})));
    }

    #[test]
    fn test_between_wrong_arity_is_neutral() {
        let c = age();
        assert_eq!(c.predicate("between", Some(&json!([20]))), None);
        assert_eq!(c.predicate("between", Some(&json!([1, 2, 3]))), None);
        assert_eq!(c.predicate("between", Some(&json!(15))), None);
        assert_eq!(c.predicate("between", Some(&json!(["a", 3]))), None);
    }

    #[test]
    fn test_reversed_bounds_are_not_swapped() {
        let p = age().predicate("between", Some(&json!([20, 10]))).unwrap();
        assert!(!p.evaluate(&json!({"age": 15})));
    }

    #[test]
    fn test_comparisons_coerce_strings() {
        let c = age();
        let p = c.predicate("greater_than", Some(&json!("18"))).unwrap();
        assert!(p.evaluate(&json!({"age": 30})));
        assert!(!p.evaluate(&json!({"age": 18})));
        assert_eq!(c.predicate("greater_than", Some(&json!("old"))), None);
    }

    #[test]
    fn test_settings_schema() {
        let c: Constraint = NumberConstraint::make("qty").integer(true).min(Some(0)).into();
        assert_eq!(
            c.to_schema()["settings"],
            json!({"integer": true, "min": 0, "max": null, "step": 1.0})
        );
        assert_eq!(c.icon(), "hash");
    }

    #[test]
    fn test_foreign_operators_are_rejected() {
        let c: Constraint = NumberConstraint::make("qty")
            .operators([Operator::from(crate::constraints::TextOperator::Contains)])
            .into();
        assert_eq!(c.operators().len(), NumberOperator::ALL.len());
    }
}
