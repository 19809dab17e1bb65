//! Boolean constraint with configurable true/false labels

use serde_json::Value;

use crate::constraint::{
    BooleanSettings, Constraint, ConstraintBase, ConstraintBuilder, ConstraintSettings,
};
use crate::operator::{FieldRef, Operator, OperatorKind, OperatorStrategy};
use crate::predicate::{CompareOp, Predicate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanOperator {
    /// Is true
    IsTrue,
    /// Is false
    IsFalse,
}

impl BooleanOperator {
    pub const ALL: [BooleanOperator; 2] = [Self::IsTrue, Self::IsFalse];
}

impl OperatorStrategy for BooleanOperator {
    fn name(&self) -> &'static str {
        match self {
            Self::IsTrue => "is_true",
            Self::IsFalse => "is_false",
        }
    }

    fn default_label(&self) -> &'static str {
        match self {
            Self::IsTrue => "Is true",
            Self::IsFalse => "Is false",
        }
    }

    fn requires_value(&self) -> bool {
        false
    }

    fn predicate(&self, field: &FieldRef, _value: Option<&Value>) -> Option<Predicate> {
        let expected = matches!(self, Self::IsTrue);
        Some(Predicate::compare(field.column.as_str(), CompareOp::Eq, expected))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BooleanConstraint {
    base: ConstraintBase,
    settings: BooleanSettings,
}

impl BooleanConstraint {
    pub fn make(name: impl Into<String>) -> Self {
        Self {
            base: ConstraintBase::new(name, BooleanOperator::ALL.map(Operator::from).to_vec()),
            settings: BooleanSettings::default(),
        }
    }

    pub fn labels(self, true_label: impl Into<String>, false_label: impl Into<String>) -> Self {
        self.true_label(true_label).false_label(false_label)
    }

    pub fn true_label(mut self, label: impl Into<String>) -> Self {
        self.settings.true_label = label.into();
        self
    }

    pub fn false_label(mut self, label: impl Into<String>) -> Self {
        self.settings.false_label = label.into();
        self
    }
}

impl ConstraintBuilder for BooleanConstraint {
    fn base(&self) -> &ConstraintBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ConstraintBase {
        &mut self.base
    }

    fn accepts(operator: &Operator) -> bool {
        matches!(operator.kind(), OperatorKind::Boolean(_))
    }
}

impl From<BooleanConstraint> for Constraint {
    fn from(c: BooleanConstraint) -> Self {
        c.base.build(ConstraintSettings::Boolean(c.settings))
    }
}
