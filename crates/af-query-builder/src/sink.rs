//! Query sink contract
//!
//! A sink is whatever data-layer target compiled predicates are emitted into.
//! Every call adds one conjunct to the sink's current scope. `where_group`
//! opens a nested scope whose entries are joined by the given combinator and
//! emitted as a single parenthesised unit; a scope that received nothing
//! contributes nothing.

use chrono::NaiveDate;

use crate::predicate::{Combinator, CompareOp, CountBound, LikePattern};
use crate::value::Scalar;

pub trait QuerySink: Sized {
    /// Open a nested scope combined by `combinator`
    fn where_group<F>(&mut self, combinator: Combinator, build: F)
    where
        F: FnOnce(&mut Self);

    /// `column <op> value`
    fn where_column(&mut self, column: &str, op: CompareOp, value: &Scalar);

    /// `column [NOT] LIKE pattern`
    fn where_like(&mut self, column: &str, pattern: &LikePattern, negated: bool, case_sensitive: bool);

    fn where_in(&mut self, column: &str, values: &[Scalar]);

    fn where_not_in(&mut self, column: &str, values: &[Scalar]);

    fn where_null(&mut self, column: &str);

    fn where_not_null(&mut self, column: &str);

    /// Inclusive on both ends
    fn where_between(&mut self, column: &str, low: &Scalar, high: &Scalar);

    /// Compare the date part of a datetime column
    fn where_date(&mut self, column: &str, op: CompareOp, date: NaiveDate);

    fn where_month(&mut self, column: &str, op: CompareOp, month: u32);

    fn where_year(&mut self, column: &str, op: CompareOp, year: i32);

    /// Related records exist (or their count satisfies `bound`), each
    /// matching whatever `constrain` adds to the related scope
    fn where_has<F>(&mut self, relation: &str, bound: Option<CountBound>, constrain: F)
    where
        F: FnOnce(&mut Self);

    /// No related record matches whatever `constrain` adds
    fn where_doesnt_have<F>(&mut self, relation: &str, constrain: F)
    where
        F: FnOnce(&mut Self);
}
