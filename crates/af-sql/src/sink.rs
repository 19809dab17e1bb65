//! PostgreSQL query sink
//!
//! Renders sink calls into a WHERE fragment. Values are never inlined: each
//! one becomes a `$n` placeholder backed by an entry in the parameter list.
//! Columns are qualified by the alias of the table in scope, so conditions
//! inside relationship subqueries refer to the related table.

use af_query_builder::{Combinator, CompareOp, CountBound, LikePattern, QuerySink, Scalar};
use chrono::NaiveDate;

use crate::fragment::SqlFragment;
use crate::param::{escape_like, quote_ident, SqlParam};
use crate::relation::RelationMap;

#[derive(Debug, Clone)]
struct Scope {
    combinator: Combinator,
    parts: Vec<String>,
}

impl Scope {
    fn new(combinator: Combinator) -> Self {
        Self {
            combinator,
            parts: Vec::new(),
        }
    }
}

/// Table in scope for column qualification
#[derive(Debug, Clone)]
struct Frame {
    table: String,
    alias: String,
}

#[derive(Debug, Clone)]
pub struct SqlSink {
    relations: RelationMap,
    frames: Vec<Frame>,
    scopes: Vec<Scope>,
    params: Vec<SqlParam>,
    aliases_used: usize,
}

impl SqlSink {
    /// Sink for conditions on `table`, which is also its alias
    pub fn new(table: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            relations: RelationMap::new(),
            frames: vec![Frame {
                alias: table.clone(),
                table,
            }],
            scopes: vec![Scope::new(Combinator::And)],
            params: Vec::new(),
            aliases_used: 0,
        }
    }

    /// Qualify columns with `alias` instead of the table name
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        if let Some(base) = self.frames.first_mut() {
            base.alias = alias.into();
        }
        self
    }

    pub fn relations(mut self, relations: RelationMap) -> Self {
        self.relations = relations;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.iter().all(|scope| scope.parts.is_empty())
    }

    /// Top-level conjuncts joined by AND
    pub fn into_fragment(mut self) -> SqlFragment {
        let parts = self.scopes.drain(..).next().map(|s| s.parts).unwrap_or_default();
        SqlFragment::new(parts.join(" AND "), self.params)
    }

    fn frame(&self) -> (String, String) {
        self.frames
            .last()
            .map(|f| (f.table.clone(), f.alias.clone()))
            .unwrap_or_default()
    }

    fn column(&self, column: &str) -> String {
        if column.contains('.') {
            return quote_ident(column);
        }
        let (_, alias) = self.frame();
        format!("{}.{}", quote_ident(&alias), quote_ident(column))
    }

    fn bind(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }

    fn push(&mut self, condition: String) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.parts.push(condition);
        }
    }

    /// Run `build` in a fresh scope; `None` when it added nothing
    fn scoped<F>(&mut self, combinator: Combinator, build: F) -> Option<String>
    where
        F: FnOnce(&mut Self),
    {
        self.scopes.push(Scope::new(combinator));
        build(self);
        let scope = self.scopes.pop()?;
        match scope.parts.len() {
            0 => None,
            1 => scope.parts.into_iter().next(),
            _ => Some(format!(
                "({})",
                scope.parts.join(&format!(" {} ", scope.combinator.keyword()))
            )),
        }
    }

    /// `FROM ... WHERE ...` body of a correlated relationship subquery
    fn relation_subquery<F>(&mut self, relation: &str, constrain: F) -> String
    where
        F: FnOnce(&mut Self),
    {
        let (parent_table, parent_alias) = self.frame();
        let definition = self.relations.resolve(relation, &parent_table);
        self.aliases_used += 1;
        let alias = format!("r{}", self.aliases_used);

        self.frames.push(Frame {
            table: definition.table().to_string(),
            alias: alias.clone(),
        });
        let inner = self.scoped(Combinator::And, constrain);
        self.frames.pop();

        let (from, correlation) = definition.subquery_source(&alias, &parent_alias);
        match inner {
            Some(condition) => format!("FROM {} WHERE {} AND {}", from, correlation, condition),
            None => format!("FROM {} WHERE {}", from, correlation),
        }
    }

    fn in_list(&mut self, column: &str, values: &[Scalar], negated: bool) {
        if values.is_empty() {
            self.push(if negated { "TRUE" } else { "FALSE" }.to_string());
            return;
        }
        let placeholders: Vec<String> = values.iter().map(|v| self.bind(v.into())).collect();
        let keyword = if negated { "NOT IN" } else { "IN" };
        let condition = format!("{} {} ({})", self.column(column), keyword, placeholders.join(", "));
        self.push(condition);
    }
}

impl QuerySink for SqlSink {
    fn where_group<F>(&mut self, combinator: Combinator, build: F)
    where
        F: FnOnce(&mut Self),
    {
        if let Some(condition) = self.scoped(combinator, build) {
            self.push(condition);
        }
    }

    fn where_column(&mut self, column: &str, op: CompareOp, value: &Scalar) {
        let placeholder = self.bind(value.into());
        let condition = format!("{} {} {}", self.column(column), op.as_sql(), placeholder);
        self.push(condition);
    }

    fn where_like(&mut self, column: &str, pattern: &LikePattern, negated: bool, case_sensitive: bool) {
        let placeholder = self.bind(SqlParam::String(pattern.to_like(escape_like)));
        let keyword = match (negated, case_sensitive) {
            (false, false) => "ILIKE",
            (true, false) => "NOT ILIKE",
            (false, true) => "LIKE",
            (true, true) => "NOT LIKE",
        };
        let condition = format!("{} {} {}", self.column(column), keyword, placeholder);
        self.push(condition);
    }

    fn where_in(&mut self, column: &str, values: &[Scalar]) {
        self.in_list(column, values, false);
    }

    fn where_not_in(&mut self, column: &str, values: &[Scalar]) {
        self.in_list(column, values, true);
    }

    fn where_null(&mut self, column: &str) {
        let condition = format!("{} IS NULL", self.column(column));
        self.push(condition);
    }

    fn where_not_null(&mut self, column: &str) {
        let condition = format!("{} IS NOT NULL", self.column(column));
        self.push(condition);
    }

    fn where_between(&mut self, column: &str, low: &Scalar, high: &Scalar) {
        let low = self.bind(low.into());
        let high = self.bind(high.into());
        let condition = format!("{} BETWEEN {} AND {}", self.column(column), low, high);
        self.push(condition);
    }

    fn where_date(&mut self, column: &str, op: CompareOp, date: NaiveDate) {
        let placeholder = self.bind(SqlParam::Date(date));
        let condition = format!("{}::date {} {}", self.column(column), op.as_sql(), placeholder);
        self.push(condition);
    }

    fn where_month(&mut self, column: &str, op: CompareOp, month: u32) {
        let placeholder = self.bind(SqlParam::Int(i64::from(month)));
        let condition = format!("EXTRACT(MONTH FROM {}) {} {}", self.column(column), op.as_sql(), placeholder);
        self.push(condition);
    }

    fn where_year(&mut self, column: &str, op: CompareOp, year: i32) {
        let placeholder = self.bind(SqlParam::Int(i64::from(year)));
        let condition = format!("EXTRACT(YEAR FROM {}) {} {}", self.column(column), op.as_sql(), placeholder);
        self.push(condition);
    }

    fn where_has<F>(&mut self, relation: &str, bound: Option<CountBound>, constrain: F)
    where
        F: FnOnce(&mut Self),
    {
        let body = self.relation_subquery(relation, constrain);
        let condition = match bound {
            None => format!("EXISTS (SELECT 1 {})", body),
            Some(bound) => {
                let placeholder = self.bind(SqlParam::Int(bound.count));
                format!("(SELECT COUNT(*) {}) {} {}", body, bound.op.as_sql(), placeholder)
            }
        };
        self.push(condition);
    }

    fn where_doesnt_have<F>(&mut self, relation: &str, constrain: F)
    where
        F: FnOnce(&mut Self),
    {
        let body = self.relation_subquery(relation, constrain);
        self.push(format!("NOT EXISTS (SELECT 1 {})", body));
    }
}
