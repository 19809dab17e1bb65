//! Date constraint
//!
//! Day-level comparisons, inclusive ranges and month/year matches on a date
//! or timestamp column.

use serde_json::Value;

use crate::constraint::{
    Constraint, ConstraintBase, ConstraintBuilder, ConstraintSettings, DateSettings,
};
use crate::operator::{FieldRef, InputType, Operator, OperatorKind, OperatorStrategy};
use crate::predicate::{CompareOp, Predicate};
use crate::value::{as_date, as_month, as_year};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateOperator {
    /// On the day
    Is,
    /// Not on the day
    IsNot,
    /// After the day (>)
    IsAfter,
    /// On or after the day (>=)
    IsOnOrAfter,
    /// Before the day (<)
    IsBefore,
    /// On or before the day (<=)
    IsOnOrBefore,
    /// Between two days, both inclusive
    IsBetween,
    /// In the given month of any year
    IsMonth,
    /// In the given year
    IsYear,
    /// Is null
    IsBlank,
    /// Is not null
    IsNotBlank,
}

impl DateOperator {
    pub const ALL: [DateOperator; 11] = [
        Self::Is,
        Self::IsNot,
        Self::IsAfter,
        Self::IsOnOrAfter,
        Self::IsBefore,
        Self::IsOnOrBefore,
        Self::IsBetween,
        Self::IsMonth,
        Self::IsYear,
        Self::IsBlank,
        Self::IsNotBlank,
    ];

    fn compare_op(&self) -> Option<CompareOp> {
        match self {
            Self::Is => Some(CompareOp::Eq),
            Self::IsNot => Some(CompareOp::NotEq),
            Self::IsAfter => Some(CompareOp::Gt),
            Self::IsOnOrAfter => Some(CompareOp::Gte),
            Self::IsBefore => Some(CompareOp::Lt),
            Self::IsOnOrBefore => Some(CompareOp::Lte),
            _ => None,
        }
    }
}

impl OperatorStrategy for DateOperator {
    fn name(&self) -> &'static str {
        match self {
            Self::Is => "is",
            Self::IsNot => "is_not",
            Self::IsAfter => "is_after",
            Self::IsOnOrAfter => "is_on_or_after",
            Self::IsBefore => "is_before",
            Self::IsOnOrBefore => "is_on_or_before",
            Self::IsBetween => "is_between",
            Self::IsMonth => "is_month",
            Self::IsYear => "is_year",
            Self::IsBlank => "is_blank",
            Self::IsNotBlank => "is_not_blank",
        }
    }

    fn default_label(&self) -> &'static str {
        match self {
            Self::Is => "Is",
            Self::IsNot => "Is not",
            Self::IsAfter => "Is after",
            Self::IsOnOrAfter => "Is on or after",
            Self::IsBefore => "Is before",
            Self::IsOnOrBefore => "Is on or before",
            Self::IsBetween => "Is between",
            Self::IsMonth => "Is in month",
            Self::IsYear => "Is in year",
            Self::IsBlank => "Is blank",
            Self::IsNotBlank => "Is not blank",
        }
    }

    fn requires_value(&self) -> bool {
        !matches!(self, Self::IsBlank | Self::IsNotBlank)
    }

    fn input_type(&self) -> InputType {
        match self {
            Self::IsBetween => InputType::DateRange,
            Self::IsMonth => InputType::Month,
            Self::IsYear => InputType::Year,
            Self::IsBlank | Self::IsNotBlank => InputType::Text,
            _ => InputType::Date,
        }
    }

    fn predicate(&self, field: &FieldRef, value: Option<&Value>) -> Option<Predicate> {
        let column = field.column.clone();
        match self {
            Self::IsBlank => Some(Predicate::is_null(column)),
            Self::IsNotBlank => Some(Predicate::is_not_null(column)),
            // Whole days: start of the first through the last second of the second
            Self::IsBetween => match value? {
                Value::Array(bounds) if bounds.len() == 2 => {
                    let from = as_date(&bounds[0])?.and_hms_opt(0, 0, 0)?;
                    let to = as_date(&bounds[1])?.and_hms_opt(23, 59, 59)?;
                    Some(Predicate::between(column, from, to))
                }
                _ => None,
            },
            Self::IsMonth => Some(Predicate::Month {
                column,
                op: CompareOp::Eq,
                month: as_month(value?)?,
            }),
            Self::IsYear => Some(Predicate::Year {
                column,
                op: CompareOp::Eq,
                year: as_year(value?)?,
            }),
            _ => Some(Predicate::OnDate {
                column,
                op: self.compare_op()?,
                date: as_date(value?)?,
            }),
        }
    }
}

/// Constraint over a date or datetime column
#[derive(Debug, Clone, PartialEq)]
pub struct DateConstraint {
    base: ConstraintBase,
    settings: DateSettings,
}

impl DateConstraint {
    pub fn make(name: impl Into<String>) -> Self {
        Self {
            base: ConstraintBase::new(name, DateOperator::ALL.map(Operator::from).to_vec()),
            settings: DateSettings::default(),
        }
    }

    /// Offer time selection; switches the display format accordingly
    pub fn with_time(mut self, with_time: bool) -> Self {
        self.settings.with_time = with_time;
        self.settings.format = if with_time { "Y-m-d H:i:s" } else { "Y-m-d" }.to_string();
        self
    }

    pub fn min_date(mut self, date: Option<String>) -> Self {
        self.settings.min_date = date;
        self
    }

    pub fn max_date(mut self, date: Option<String>) -> Self {
        self.settings.max_date = date;
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.settings.format = format.into();
        self
    }
}

impl ConstraintBuilder for DateConstraint {
    fn base(&self) -> &ConstraintBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ConstraintBase {
        &mut self.base
    }

    fn accepts(operator: &Operator) -> bool {
        matches!(operator.kind(), OperatorKind::Date(_))
    }
}

impl From<DateConstraint> for Constraint {
    fn from(c: DateConstraint) -> Self {
        c.base.build(ConstraintSettings::Date(c.settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn created() -> Constraint {
        DateConstraint::make("created_at").into()
    }

    #[test]
    fn test_day_comparisons_ignore_time() {
        let c = created();
        let row = json!({"created_at": "2024-03-15 18:45:00"});
        assert!(c.predicate("is", Some(&json!("2024-03-15"))).unwrap().evaluate(&row));
        assert!(c.predicate("is_on_or_after", Some(&json!("2024-03-15"))).unwrap().evaluate(&row));
        assert!(!c.predicate("is_after", Some(&json!("2024-03-15"))).unwrap().evaluate(&row));
        assert!(c.predicate("is_before", Some(&json!("2024-03-16T00:00"))).unwrap().evaluate(&row));
    }

    #[test]
    fn test_between_spans_whole_days() {
        let p = created()
            .predicate("is_between", Some(&json!(["2024-03-01", "2024-03-15"])))
            .unwrap();
        assert!(p.evaluate(&json!({"created_at": "2024-03-01 00:00:00"})));
        assert!(p.evaluate(&json!({"created_at": "2024-03-15 23:59:59"})));
        assert!(!p.evaluate(&json!({"created_at": "2024-03-16 00:00:00"})));
    }

    #[test]
    fn test_malformed_values_are_neutral() {
        let c = created();
        assert_eq!(c.predicate("is", Some(&json!("yesterday-ish"))), None);
        assert_eq!(c.predicate("is_between", Some(&json!(["2024-03-01"]))), None);
        assert_eq!(c.predicate("is_between", Some(&json!(["2024-03-01", "nope"]))), None);
        assert_eq!(c.predicate("is_month", Some(&json!(13))), None);
    }

    #[test]
    fn test_month_and_year() {
        let c = created();
        let row = json!({"created_at": "2023-07-04"});
        assert!(c.predicate("is_month", Some(&json!("7"))).unwrap().evaluate(&row));
        assert!(c.predicate("is_year", Some(&json!(2023))).unwrap().evaluate(&row));
        assert!(!c.predicate("is_year", Some(&json!(2024))).unwrap().evaluate(&row));
    }

    #[test]
    fn test_with_time_format() {
        let c: Constraint = DateConstraint::make("starts_at").with_time(true).into();
        assert_eq!(c.to_schema()["settings"]["format"], json!("Y-m-d H:i:s"));
        assert_eq!(c.to_schema()["settings"]["withTime"], json!(true));
        assert_eq!(c.icon(), "calendar");
    }
}
