//! In-memory query sink
//!
//! Records sink calls back into a [`Predicate`] tree and evaluates it against
//! JSON rows. Comparisons against null or missing fields are false, as in SQL.
//! Relationships are arrays of objects stored under the relation name.

use chrono::Datelike;
use serde_json::Value;

use crate::predicate::{Combinator, CompareOp, CountBound, LikePattern, Predicate, Presence};
use crate::sink::QuerySink;
use crate::value::{as_datetime, as_text, Scalar};

#[derive(Debug, Clone)]
struct Scope {
    combinator: Combinator,
    entries: Vec<Predicate>,
}

impl Scope {
    fn new(combinator: Combinator) -> Self {
        Self {
            combinator,
            entries: Vec::new(),
        }
    }

    /// Collapse a scope into one predicate; an empty scope yields nothing
    fn finish(mut self) -> Option<Predicate> {
        match self.entries.len() {
            0 => None,
            1 if self.combinator == Combinator::And => self.entries.pop(),
            _ => Some(Predicate::group(self.combinator, self.entries)),
        }
    }
}

/// Sink that keeps predicates in memory for evaluation
#[derive(Debug, Clone)]
pub struct MemorySink {
    stack: Vec<Scope>,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            stack: vec![Scope::new(Combinator::And)],
        }
    }

    /// Top-level conjuncts recorded so far
    pub fn conjuncts(&self) -> &[Predicate] {
        self.stack
            .first()
            .map(|scope| scope.entries.as_slice())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.conjuncts().is_empty()
    }

    /// Everything recorded, as one predicate; `None` means no restriction
    pub fn into_predicate(mut self) -> Option<Predicate> {
        self.stack.truncate(1);
        self.stack.pop().and_then(Scope::finish)
    }

    pub fn matches(&self, row: &Value) -> bool {
        self.conjuncts().iter().all(|p| p.evaluate(row))
    }

    pub fn filter<'a>(&self, rows: &'a [Value]) -> Vec<&'a Value> {
        rows.iter().filter(|row| self.matches(row)).collect()
    }

    fn push(&mut self, predicate: Predicate) {
        if let Some(scope) = self.stack.last_mut() {
            scope.entries.push(predicate);
        }
    }

    fn scoped<F>(&mut self, combinator: Combinator, build: F) -> Option<Predicate>
    where
        F: FnOnce(&mut Self),
    {
        self.stack.push(Scope::new(combinator));
        build(self);
        self.stack.pop().and_then(Scope::finish)
    }
}

impl QuerySink for MemorySink {
    fn where_group<F>(&mut self, combinator: Combinator, build: F)
    where
        F: FnOnce(&mut Self),
    {
        self.stack.push(Scope::new(combinator));
        build(self);
        // Groups stay explicit so nesting survives a round trip
        if let Some(scope) = self.stack.pop().filter(|s| !s.entries.is_empty()) {
            self.push(Predicate::group(scope.combinator, scope.entries));
        }
    }

    fn where_column(&mut self, column: &str, op: CompareOp, value: &Scalar) {
        self.push(Predicate::compare(column, op, value.clone()));
    }

    fn where_like(&mut self, column: &str, pattern: &LikePattern, negated: bool, case_sensitive: bool) {
        self.push(Predicate::Like {
            column: column.to_string(),
            pattern: pattern.clone(),
            negated,
            case_sensitive,
        });
    }

    fn where_in(&mut self, column: &str, values: &[Scalar]) {
        self.push(Predicate::is_in(column, values.to_vec()));
    }

    fn where_not_in(&mut self, column: &str, values: &[Scalar]) {
        self.push(Predicate::not_in(column, values.to_vec()));
    }

    fn where_null(&mut self, column: &str) {
        self.push(Predicate::is_null(column));
    }

    fn where_not_null(&mut self, column: &str) {
        self.push(Predicate::is_not_null(column));
    }

    fn where_between(&mut self, column: &str, low: &Scalar, high: &Scalar) {
        self.push(Predicate::between(column, low.clone(), high.clone()));
    }

    fn where_date(&mut self, column: &str, op: CompareOp, date: chrono::NaiveDate) {
        self.push(Predicate::OnDate {
            column: column.to_string(),
            op,
            date,
        });
    }

    fn where_month(&mut self, column: &str, op: CompareOp, month: u32) {
        self.push(Predicate::Month {
            column: column.to_string(),
            op,
            month,
        });
    }

    fn where_year(&mut self, column: &str, op: CompareOp, year: i32) {
        self.push(Predicate::Year {
            column: column.to_string(),
            op,
            year,
        });
    }

    fn where_has<F>(&mut self, relation: &str, bound: Option<CountBound>, constrain: F)
    where
        F: FnOnce(&mut Self),
    {
        let constraint = self.scoped(Combinator::And, constrain);
        let presence = bound.map_or(Presence::Exists, Presence::Count);
        self.push(Predicate::relation(relation, presence, constraint));
    }

    fn where_doesnt_have<F>(&mut self, relation: &str, constrain: F)
    where
        F: FnOnce(&mut Self),
    {
        let constraint = self.scoped(Combinator::And, constrain);
        self.push(Predicate::relation(relation, Presence::Missing, constraint));
    }
}

/// Resolve a dot-separated path inside a JSON row
pub fn lookup<'a>(row: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(row, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn present<'a>(row: &'a Value, column: &str) -> Option<&'a Value> {
    lookup(row, column).filter(|v| !v.is_null())
}

impl Predicate {
    /// Evaluate against a JSON row
    pub fn evaluate(&self, row: &Value) -> bool {
        match self {
            Self::Compare { column, op, value } => present(row, column)
                .and_then(|stored| value.compare_json(stored))
                .is_some_and(|ordering| op.holds(ordering)),
            Self::Like {
                column,
                pattern,
                negated,
                case_sensitive,
            } => present(row, column)
                .and_then(as_text)
                .is_some_and(|text| pattern.matches(&text, *case_sensitive) != *negated),
            Self::In {
                column,
                values,
                negated,
            } => present(row, column).is_some_and(|stored| {
                let found = values
                    .iter()
                    .any(|v| v.compare_json(stored) == Some(std::cmp::Ordering::Equal));
                found != *negated
            }),
            Self::Null { column, negated } => present(row, column).is_none() != *negated,
            Self::Between { column, low, high } => present(row, column).is_some_and(|stored| {
                let above = low
                    .compare_json(stored)
                    .is_some_and(|o| CompareOp::Gte.holds(o));
                let below = high
                    .compare_json(stored)
                    .is_some_and(|o| CompareOp::Lte.holds(o));
                above && below
            }),
            Self::OnDate { column, op, date } => present(row, column)
                .and_then(as_datetime)
                .is_some_and(|dt| op.holds(dt.date().cmp(date))),
            Self::Month { column, op, month } => present(row, column)
                .and_then(as_datetime)
                .is_some_and(|dt| op.holds(dt.month().cmp(month))),
            Self::Year { column, op, year } => present(row, column)
                .and_then(as_datetime)
                .is_some_and(|dt| op.holds(dt.year().cmp(year))),
            Self::Relation {
                relation,
                presence,
                constraint,
            } => {
                let related: &[Value] = match present(row, relation) {
                    Some(Value::Array(items)) => items,
                    Some(single @ Value::Object(_)) => std::slice::from_ref(single),
                    _ => &[],
                };
                let count = related
                    .iter()
                    .filter(|item| constraint.as_ref().map_or(true, |c| c.evaluate(item)))
                    .count() as i64;
                match presence {
                    Presence::Exists => count > 0,
                    Presence::Missing => count == 0,
                    Presence::Count(bound) => bound.holds(count),
                }
            }
            Self::Group {
                combinator,
                children,
            } => {
                if children.is_empty() {
                    return true;
                }
                match combinator {
                    Combinator::And => children.iter().all(|c| c.evaluate(row)),
                    Combinator::Or => children.iter().any(|c| c.evaluate(row)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_records_top_level_conjuncts() {
        let mut sink = MemorySink::new();
        sink.where_column("age", CompareOp::Gt, &Scalar::Int(18));
        sink.where_not_null("email");

        assert_eq!(sink.conjuncts().len(), 2);
        assert!(sink.matches(&json!({"age": 30, "email": "a@b.c"})));
        assert!(!sink.matches(&json!({"age": 30, "email": null})));
        assert!(!sink.matches(&json!({"age": 10, "email": "a@b.c"})));
    }

    #[test]
    fn test_empty_group_records_nothing() {
        let mut sink = MemorySink::new();
        sink.where_group(Combinator::Or, |_| {});
        sink.where_group(Combinator::And, |inner| inner.where_group(Combinator::Or, |_| {}));

        assert!(sink.is_empty());
        assert_eq!(sink.into_predicate(), None);
    }

    #[test]
    fn test_group_keeps_precedence() {
        let mut sink = MemorySink::new();
        sink.where_column("a", CompareOp::Eq, &Scalar::Int(1));
        sink.where_group(Combinator::Or, |inner| {
            inner.where_column("b", CompareOp::Eq, &Scalar::Int(1));
            inner.where_column("c", CompareOp::Eq, &Scalar::Int(1));
        });

        assert!(sink.matches(&json!({"a": 1, "b": 0, "c": 1})));
        assert!(!sink.matches(&json!({"a": 0, "b": 1, "c": 1})));
        assert!(!sink.matches(&json!({"a": 1, "b": 0, "c": 0})));
    }

    #[test]
    fn test_null_semantics() {
        let row = json!({"name": null});
        assert!(!Predicate::compare("name", CompareOp::NotEq, "x").evaluate(&row));
        assert!(!Predicate::not_like("name", LikePattern::contains("x")).evaluate(&row));
        assert!(!Predicate::not_in("name", vec!["x".into()]).evaluate(&row));
        assert!(Predicate::is_null("name").evaluate(&row));
        assert!(Predicate::is_null("missing").evaluate(&row));
    }

    #[test]
    fn test_nested_paths() {
        let row = json!({"address": {"city": "Oslo"}, "tags": ["a", "b"]});
        assert_eq!(lookup(&row, "address.city"), Some(&json!("Oslo")));
        assert_eq!(lookup(&row, "tags.1"), Some(&json!("b")));
        assert_eq!(lookup(&row, "address.zip"), None);
    }

    #[test]
    fn test_between_inclusive() {
        let predicate = Predicate::between("age", 10i64, 20i64);
        assert!(predicate.evaluate(&json!({"age": 10})));
        assert!(predicate.evaluate(&json!({"age": 20})));
        assert!(!predicate.evaluate(&json!({"age": 21})));
    }

    #[test]
    fn test_date_parts() {
        let row = json!({"created_at": "2024-03-15 10:30:00"});
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

        let mut sink = MemorySink::new();
        sink.where_date("created_at", CompareOp::Eq, date);
        sink.where_month("created_at", CompareOp::Eq, 3);
        sink.where_year("created_at", CompareOp::Gte, 2024);
        assert!(sink.matches(&row));

        let mut sink = MemorySink::new();
        sink.where_year("created_at", CompareOp::Lt, 2024);
        assert!(!sink.matches(&row));
    }

    #[test]
    fn test_relations() {
        let row = json!({"tags": [{"id": 1}, {"id": 2}]});
        let empty = json!({"tags": []});
        let missing = json!({});

        let mut has = MemorySink::new();
        has.where_has("tags", None, |inner| inner.where_in("id", &[Scalar::Int(2)]));
        assert!(has.matches(&row));
        assert!(!has.matches(&empty));

        let mut none = MemorySink::new();
        none.where_doesnt_have("tags", |_| {});
        assert!(!none.matches(&row));
        assert!(none.matches(&empty));
        assert!(none.matches(&missing));

        let mut at_least = MemorySink::new();
        at_least.where_has("tags", Some(CountBound::at_least(3)), |_| {});
        assert!(!at_least.matches(&row));
    }
}
