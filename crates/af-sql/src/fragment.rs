//! Rendered WHERE fragments

use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::{Query, QueryAs};

use crate::param::SqlParam;

/// A boolean SQL expression with `$n` placeholders and its parameters
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl SqlFragment {
    pub fn new(sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// No restriction
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// `WHERE <sql>`, or an empty string when unrestricted
    pub fn where_clause(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.sql)
        }
    }

    /// Number of the next free placeholder
    pub fn next_placeholder(&self) -> usize {
        self.params.len() + 1
    }

    /// Bind every parameter, in placeholder order
    pub fn bind<'q>(&'q self, query: Query<'q, Postgres, PgArguments>) -> Query<'q, Postgres, PgArguments> {
        self.params.iter().fold(query, |query, param| match param {
            SqlParam::Int(v) => query.bind(*v),
            SqlParam::String(v) => query.bind(v.as_str()),
            SqlParam::Float(v) => query.bind(*v),
            SqlParam::Bool(v) => query.bind(*v),
            SqlParam::Date(v) => query.bind(*v),
            SqlParam::DateTime(v) => query.bind(*v),
            SqlParam::Null => query.bind(None::<String>),
        })
    }

    /// [`SqlFragment::bind`] for typed queries
    pub fn bind_as<'q, O>(
        &'q self,
        query: QueryAs<'q, Postgres, O, PgArguments>,
    ) -> QueryAs<'q, Postgres, O, PgArguments> {
        self.params.iter().fold(query, |query, param| match param {
            SqlParam::Int(v) => query.bind(*v),
            SqlParam::String(v) => query.bind(v.as_str()),
            SqlParam::Float(v) => query.bind(*v),
            SqlParam::Bool(v) => query.bind(*v),
            SqlParam::Date(v) => query.bind(*v),
            SqlParam::DateTime(v) => query.bind(*v),
            SqlParam::Null => query.bind(None::<String>),
        })
    }

    /// SQL with parameters inlined as literals, for logs and the CLI
    ///
    /// Each `$n` token in the fragment is substituted once, so literal text
    /// coming from a parameter is never rewritten.
    pub fn to_debug_sql(&self) -> String {
        let mut sql = String::with_capacity(self.sql.len());
        let mut rest = self.sql.as_str();
        while let Some(pos) = rest.find('$') {
            sql.push_str(&rest[..pos]);
            let tail = &rest[pos + 1..];
            let digits = tail.bytes().take_while(u8::is_ascii_digit).count();
            let param = tail[..digits]
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| self.params.get(i));
            match param {
                Some(param) => sql.push_str(&param.to_string()),
                None => sql.push_str(&rest[pos..=pos + digits]),
            }
            rest = &tail[digits..];
        }
        sql.push_str(rest);
        sql
    }
}

impl std::fmt::Display for SqlFragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_where_clause() {
        assert_eq!(SqlFragment::default().where_clause(), "");
        let fragment = SqlFragment::new("\"t\".\"a\" = $1", vec![SqlParam::Int(1)]);
        assert_eq!(fragment.where_clause(), "WHERE \"t\".\"a\" = $1");
        assert_eq!(fragment.next_placeholder(), 2);
    }

    #[test]
    fn test_debug_sql_inlines_params() {
        let params = (1..=10).map(SqlParam::Int).collect();
        let fragment = SqlFragment::new("a = $1 AND b = $10", params);
        assert_eq!(fragment.to_debug_sql(), "a = 1 AND b = 10");
    }

    #[test]
    fn test_debug_sql_leaves_inlined_text_alone() {
        let fragment = SqlFragment::new(
            "a = $1 AND b = $2",
            vec![SqlParam::String("x".into()), SqlParam::String("$1".into())],
        );
        assert_eq!(fragment.to_debug_sql(), "a = 'x' AND b = '$1'");

        let fragment = SqlFragment::new("a = $1 AND b = $3 AND c = '$'", vec![SqlParam::Int(7)]);
        assert_eq!(fragment.to_debug_sql(), "a = 7 AND b = $3 AND c = '$'");
    }
}
