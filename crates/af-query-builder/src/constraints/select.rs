//! Select constraint over a fixed option list

use serde_json::Value;

use crate::constraint::{
    Constraint, ConstraintBase, ConstraintBuilder, ConstraintSettings, SelectSettings,
};
use crate::operator::{FieldRef, InputType, Operator, OperatorKind, OperatorStrategy};
use crate::options::OptionList;
use crate::predicate::{CompareOp, Predicate};
use crate::value::{as_scalar, as_scalar_list};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectOperator {
    /// Equals, or any of several values (IN)
    Is,
    /// Not equal, or none of several values (NOT IN)
    IsNot,
    /// Is null
    IsBlank,
    /// Is not null
    IsNotBlank,
}

impl SelectOperator {
    pub const ALL: [SelectOperator; 4] = [Self::Is, Self::IsNot, Self::IsBlank, Self::IsNotBlank];
}

impl OperatorStrategy for SelectOperator {
    fn name(&self) -> &'static str {
        match self {
            Self::Is => "is",
            Self::IsNot => "is_not",
            Self::IsBlank => "is_blank",
            Self::IsNotBlank => "is_not_blank",
        }
    }

    fn default_label(&self) -> &'static str {
        match self {
            Self::Is => "Is",
            Self::IsNot => "Is not",
            Self::IsBlank => "Is blank",
            Self::IsNotBlank => "Is not blank",
        }
    }

    fn requires_value(&self) -> bool {
        matches!(self, Self::Is | Self::IsNot)
    }

    fn input_type(&self) -> InputType {
        match self {
            Self::Is | Self::IsNot => InputType::Select,
            _ => InputType::Text,
        }
    }

    fn predicate(&self, field: &FieldRef, value: Option<&Value>) -> Option<Predicate> {
        let column = field.column.as_str();
        let negated = match self {
            Self::IsBlank => return Some(Predicate::is_null(column)),
            Self::IsNotBlank => return Some(Predicate::is_not_null(column)),
            Self::Is => false,
            Self::IsNot => true,
        };

        match value? {
            list @ Value::Array(_) => {
                let values = as_scalar_list(list)?;
                if values.is_empty() {
                    return None;
                }
                Some(if negated {
                    Predicate::not_in(column, values)
                } else {
                    Predicate::is_in(column, values)
                })
            }
            scalar => {
                let op = if negated { CompareOp::NotEq } else { CompareOp::Eq };
                Some(Predicate::compare(column, op, as_scalar(scalar)?))
            }
        }
    }
}

/// Constraint over a column with a fixed set of values
#[derive(Debug, Clone, PartialEq)]
pub struct SelectConstraint {
    base: ConstraintBase,
    settings: SelectSettings,
}

impl SelectConstraint {
    pub fn make(name: impl Into<String>) -> Self {
        Self {
            base: ConstraintBase::new(name, SelectOperator::ALL.map(Operator::from).to_vec()),
            settings: SelectSettings::default(),
        }
    }

    pub fn options(mut self, options: OptionList) -> Self {
        self.settings.options = options;
        self
    }

    pub fn multiple(mut self, multiple: bool) -> Self {
        self.settings.multiple = multiple;
        self
    }

    pub fn searchable(mut self, searchable: bool) -> Self {
        self.settings.searchable = searchable;
        self
    }
}

impl ConstraintBuilder for SelectConstraint {
    fn base(&self) -> &ConstraintBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ConstraintBase {
        &mut self.base
    }

    fn accepts(operator: &Operator) -> bool {
        matches!(operator.kind(), OperatorKind::Select(_))
    }
}

impl From<SelectConstraint> for Constraint {
    fn from(c: SelectConstraint) -> Self {
        c.base.build(ConstraintSettings::Select(c.settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status() -> Constraint {
        SelectConstraint::make("status")
            .options(OptionList::pairs([("active", "Active"), ("inactive", "Inactive")]))
            .multiple(true)
            .into()
    }

    #[test]
    fn test_scalar_and_list_values() {
        let c = status();
        let active = json!({"status": "active"});
        let inactive = json!({"status": "inactive"});

        let is = c.predicate("is", Some(&json!("active"))).unwrap();
        assert!(is.evaluate(&active));
        assert!(!is.evaluate(&inactive));

        let is_in = c.predicate("is", Some(&json!(["active", "pending"]))).unwrap();
        assert!(matches!(is_in, Predicate::In { negated: false, .. }));
        assert!(is_in.evaluate(&active));

        let not_in = c.predicate("is_not", Some(&json!(["active"]))).unwrap();
        assert!(!not_in.evaluate(&active));
        assert!(not_in.evaluate(&inactive));
    }

    #[test]
    fn test_nested_list_is_malformed() {
        let c = status();
        assert_eq!(c.predicate("is", Some(&json!([["a"]]))), None);
        assert_eq!(c.predicate("is", Some(&json!([]))), None);
    }

    #[test]
    fn test_schema_includes_options() {
        let schema = status().to_schema();
        assert_eq!(schema["type"], json!("select"));
        assert_eq!(schema["icon"], json!("list"));
        assert_eq!(schema["settings"]["multiple"], json!(true));
        assert_eq!(
            schema["settings"]["options"][1],
            json!({"value": "inactive", "label": "Inactive"})
        );
        assert_eq!(schema["operators"][0]["inputType"], json!("select"));
    }
}
