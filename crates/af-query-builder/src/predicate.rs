//! Compiled predicates
//!
//! The closed set of conditions the engine can produce. Operators build these,
//! the compiler nests them, and [`Predicate::apply_to`] replays them into any
//! [`QuerySink`].

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;

use crate::sink::QuerySink;
use crate::value::Scalar;

/// How a group combines its direct children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    #[default]
    And,
    Or,
}

impl Combinator {
    /// Parse leniently: only `"or"` selects OR, anything else is AND
    pub fn from_str_lenient(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("or") {
            Self::Or
        } else {
            Self::And
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }

    /// SQL keyword joining sibling conditions
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl<'de> Deserialize<'de> for Combinator {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match raw {
            Some(serde_json::Value::String(s)) => Self::from_str_lenient(&s),
            _ => Self::And,
        })
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }

    /// Parse the symbolic form (`=`, `!=`, `<>`, `>`, `>=`, `<`, `<=`)
    pub fn from_symbol(s: &str) -> Option<Self> {
        match s.trim() {
            "=" | "==" => Some(Self::Eq),
            "!=" | "<>" => Some(Self::NotEq),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Gte),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Lte),
            _ => None,
        }
    }

    /// Whether `lhs <op> rhs` holds, given `lhs.cmp(rhs)`
    pub fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::NotEq => ordering != Ordering::Equal,
            Self::Gt => ordering == Ordering::Greater,
            Self::Gte => ordering != Ordering::Less,
            Self::Lt => ordering == Ordering::Less,
            Self::Lte => ordering != Ordering::Greater,
        }
    }
}

/// Where the needle of a LIKE must appear
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeKind {
    Contains,
    StartsWith,
    EndsWith,
}

/// A LIKE pattern kept in structured form; sinks decide on escaping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikePattern {
    pub kind: LikeKind,
    pub needle: String,
}

impl LikePattern {
    pub fn contains(needle: impl Into<String>) -> Self {
        Self {
            kind: LikeKind::Contains,
            needle: needle.into(),
        }
    }

    pub fn starts_with(needle: impl Into<String>) -> Self {
        Self {
            kind: LikeKind::StartsWith,
            needle: needle.into(),
        }
    }

    pub fn ends_with(needle: impl Into<String>) -> Self {
        Self {
            kind: LikeKind::EndsWith,
            needle: needle.into(),
        }
    }

    /// Render with wildcards, after the caller's escaping
    pub fn to_like(&self, escape: impl Fn(&str) -> String) -> String {
        let needle = escape(&self.needle);
        match self.kind {
            LikeKind::Contains => format!("%{}%", needle),
            LikeKind::StartsWith => format!("{}%", needle),
            LikeKind::EndsWith => format!("%{}", needle),
        }
    }

    /// Match against a candidate string
    pub fn matches(&self, candidate: &str, case_sensitive: bool) -> bool {
        let (candidate, needle) = if case_sensitive {
            (candidate.to_string(), self.needle.clone())
        } else {
            (candidate.to_lowercase(), self.needle.to_lowercase())
        };
        match self.kind {
            LikeKind::Contains => candidate.contains(&needle),
            LikeKind::StartsWith => candidate.starts_with(&needle),
            LikeKind::EndsWith => candidate.ends_with(&needle),
        }
    }
}

/// Bound on the number of related records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountBound {
    pub op: CompareOp,
    pub count: i64,
}

impl CountBound {
    pub fn at_least(count: i64) -> Self {
        Self {
            op: CompareOp::Gte,
            count,
        }
    }

    pub fn at_most(count: i64) -> Self {
        Self {
            op: CompareOp::Lte,
            count,
        }
    }

    pub fn holds(&self, actual: i64) -> bool {
        self.op.holds(actual.cmp(&self.count))
    }
}

/// What a relationship predicate asserts about related records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// At least one related record
    Exists,
    /// No related record
    Missing,
    /// Related record count satisfies the bound
    Count(CountBound),
}

/// A compiled condition
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        column: String,
        op: CompareOp,
        value: Scalar,
    },
    Like {
        column: String,
        pattern: LikePattern,
        negated: bool,
        case_sensitive: bool,
    },
    In {
        column: String,
        values: Vec<Scalar>,
        negated: bool,
    },
    Null {
        column: String,
        negated: bool,
    },
    Between {
        column: String,
        low: Scalar,
        high: Scalar,
    },
    OnDate {
        column: String,
        op: CompareOp,
        date: NaiveDate,
    },
    Month {
        column: String,
        op: CompareOp,
        month: u32,
    },
    Year {
        column: String,
        op: CompareOp,
        year: i32,
    },
    Relation {
        relation: String,
        presence: Presence,
        constraint: Option<Box<Predicate>>,
    },
    Group {
        combinator: Combinator,
        children: Vec<Predicate>,
    },
}

impl Predicate {
    pub fn compare(column: impl Into<String>, op: CompareOp, value: impl Into<Scalar>) -> Self {
        Self::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn like(column: impl Into<String>, pattern: LikePattern) -> Self {
        Self::Like {
            column: column.into(),
            pattern,
            negated: false,
            case_sensitive: false,
        }
    }

    pub fn not_like(column: impl Into<String>, pattern: LikePattern) -> Self {
        Self::Like {
            column: column.into(),
            pattern,
            negated: true,
            case_sensitive: false,
        }
    }

    pub fn is_in(column: impl Into<String>, values: Vec<Scalar>) -> Self {
        Self::In {
            column: column.into(),
            values,
            negated: false,
        }
    }

    pub fn not_in(column: impl Into<String>, values: Vec<Scalar>) -> Self {
        Self::In {
            column: column.into(),
            values,
            negated: true,
        }
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self::Null {
            column: column.into(),
            negated: false,
        }
    }

    pub fn is_not_null(column: impl Into<String>) -> Self {
        Self::Null {
            column: column.into(),
            negated: true,
        }
    }

    pub fn between(column: impl Into<String>, low: impl Into<Scalar>, high: impl Into<Scalar>) -> Self {
        Self::Between {
            column: column.into(),
            low: low.into(),
            high: high.into(),
        }
    }

    pub fn relation(relation: impl Into<String>, presence: Presence, constraint: Option<Predicate>) -> Self {
        Self::Relation {
            relation: relation.into(),
            presence,
            constraint: constraint.map(Box::new),
        }
    }

    pub fn group(combinator: Combinator, children: Vec<Predicate>) -> Self {
        Self::Group {
            combinator,
            children,
        }
    }

    pub fn and(children: Vec<Predicate>) -> Self {
        Self::group(Combinator::And, children)
    }

    pub fn or(children: Vec<Predicate>) -> Self {
        Self::group(Combinator::Or, children)
    }

    /// Replay this predicate into a sink as one conjunct of its current scope
    pub fn apply_to<S: QuerySink>(&self, sink: &mut S) {
        match self {
            Self::Compare { column, op, value } => sink.where_column(column, *op, value),
            Self::Like {
                column,
                pattern,
                negated,
                case_sensitive,
            } => sink.where_like(column, pattern, *negated, *case_sensitive),
            Self::In {
                column,
                values,
                negated: false,
            } => sink.where_in(column, values),
            Self::In {
                column,
                values,
                negated: true,
            } => sink.where_not_in(column, values),
            Self::Null {
                column,
                negated: false,
            } => sink.where_null(column),
            Self::Null {
                column,
                negated: true,
            } => sink.where_not_null(column),
            Self::Between { column, low, high } => sink.where_between(column, low, high),
            Self::OnDate { column, op, date } => sink.where_date(column, *op, *date),
            Self::Month { column, op, month } => sink.where_month(column, *op, *month),
            Self::Year { column, op, year } => sink.where_year(column, *op, *year),
            Self::Relation {
                relation,
                presence,
                constraint,
            } => {
                let constrain = |inner: &mut S| {
                    if let Some(constraint) = constraint {
                        constraint.apply_to(inner);
                    }
                };
                match presence {
                    Presence::Exists => sink.where_has(relation, None, constrain),
                    Presence::Count(bound) => sink.where_has(relation, Some(*bound), constrain),
                    Presence::Missing => sink.where_doesnt_have(relation, constrain),
                }
            }
            Self::Group {
                combinator,
                children,
            } => sink.where_group(*combinator, |inner| {
                for child in children {
                    child.apply_to(inner);
                }
            }),
        }
    }

    /// Number of leaf conditions, nested relation constraints included
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Group { children, .. } => children.iter().map(Predicate::leaf_count).sum(),
            Self::Relation { constraint, .. } => {
                1 + constraint.as_ref().map_or(0, |c| c.leaf_count())
            }
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combinator_lenient_parsing() {
        assert_eq!(Combinator::from_str_lenient("or"), Combinator::Or);
        assert_eq!(Combinator::from_str_lenient("OR"), Combinator::Or);
        assert_eq!(Combinator::from_str_lenient("and"), Combinator::And);
        assert_eq!(Combinator::from_str_lenient("xor"), Combinator::And);
    }

    #[test]
    fn test_combinator_deserialize() {
        let or: Combinator = serde_json::from_str(r#""or""#).unwrap();
        assert_eq!(or, Combinator::Or);
        let junk: Combinator = serde_json::from_str("42").unwrap();
        assert_eq!(junk, Combinator::And);
        let null: Combinator = serde_json::from_str("null").unwrap();
        assert_eq!(null, Combinator::And);
    }

    #[test]
    fn test_compare_op_holds() {
        assert!(CompareOp::Gte.holds(Ordering::Equal));
        assert!(CompareOp::Gte.holds(Ordering::Greater));
        assert!(!CompareOp::Gt.holds(Ordering::Equal));
        assert!(CompareOp::NotEq.holds(Ordering::Less));
        assert_eq!(CompareOp::from_symbol("<>"), Some(CompareOp::NotEq));
        assert_eq!(CompareOp::from_symbol("~"), None);
    }

    #[test]
    fn test_like_pattern() {
        let pattern = LikePattern::contains("john");
        assert!(pattern.matches("Johnny", false));
        assert!(!pattern.matches("Johnny", true));
        assert_eq!(pattern.to_like(|s| s.to_string()), "%john%");
        assert_eq!(LikePattern::starts_with("a_").to_like(|s| s.replace('_', "\\_")), "a\\_%");
        assert!(LikePattern::ends_with("son").matches("Jackson", true));
    }

    #[test]
    fn test_count_bound() {
        assert!(CountBound::at_least(2).holds(2));
        assert!(!CountBound::at_least(2).holds(1));
        assert!(CountBound::at_most(1).holds(0));
    }

    #[test]
    fn test_leaf_count() {
        let predicate = Predicate::and(vec![
            Predicate::compare("age", CompareOp::Gt, 18i64),
            Predicate::or(vec![Predicate::is_null("a"), Predicate::is_null("b")]),
        ]);
        assert_eq!(predicate.leaf_count(), 3);
    }
}
