//! Filtered, paginated selects
//!
//! Runs a SELECT restricted by a compiled [`SqlFragment`], together with the
//! matching COUNT query for pagination metadata.

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};

use crate::error::SqlResult;
use crate::fragment::SqlFragment;
use crate::param::quote_ident;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset }
    }

    pub fn page(page: i64, per_page: i64) -> Self {
        Self {
            limit: per_page,
            offset: (page.max(1) - 1) * per_page,
        }
    }
}

/// Query result with pagination metadata
#[derive(Debug, Clone, serde::Serialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            limit: pagination.limit,
            offset: pagination.offset,
        }
    }

    pub fn page(&self) -> i64 {
        if self.limit == 0 {
            1
        } else {
            self.offset / self.limit + 1
        }
    }

    pub fn total_pages(&self) -> i64 {
        if self.limit == 0 {
            1
        } else {
            (self.total + self.limit - 1) / self.limit
        }
    }

    pub fn has_next(&self) -> bool {
        self.offset + self.limit < self.total
    }
}

/// The SELECT a fragment restricts
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredSelect {
    table: String,
    alias: Option<String>,
    columns: Vec<String>,
    order_by: Vec<(String, bool)>,
    json_rows: bool,
}

impl FilteredSelect {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: None,
            columns: Vec::new(),
            order_by: Vec::new(),
            json_rows: false,
        }
    }

    /// Must match the alias the fragment was rendered with
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order_by.push((column.into(), ascending));
        self
    }

    /// Select each row as a single `jsonb` column named `row`
    pub fn json_rows(mut self) -> Self {
        self.json_rows = true;
        self
    }

    fn source(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} AS {}", quote_ident(&self.table), quote_ident(alias)),
            None => quote_ident(&self.table),
        }
    }

    fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }

    fn column_list(&self) -> String {
        if self.json_rows {
            return format!("to_jsonb({}) AS \"row\"", quote_ident(self.qualifier()));
        }
        if self.columns.is_empty() {
            return format!("{}.*", quote_ident(self.qualifier()));
        }
        self.columns
            .iter()
            .map(|c| format!("{}.{}", quote_ident(self.qualifier()), quote_ident(c)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn order_clause(&self) -> String {
        if self.order_by.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = self
            .order_by
            .iter()
            .map(|(column, ascending)| {
                format!(
                    "{}.{} {}",
                    quote_ident(self.qualifier()),
                    quote_ident(column),
                    if *ascending { "ASC" } else { "DESC" }
                )
            })
            .collect();
        format!(" ORDER BY {}", parts.join(", "))
    }

    /// Page query; LIMIT and OFFSET take the placeholders after the fragment's
    pub fn select_sql(&self, fragment: &SqlFragment) -> String {
        let limit = fragment.next_placeholder();
        let mut sql = format!("SELECT {} FROM {}", self.column_list(), self.source());
        if !fragment.is_empty() {
            sql.push(' ');
            sql.push_str(&fragment.where_clause());
        }
        sql.push_str(&self.order_clause());
        sql.push_str(&format!(" LIMIT ${} OFFSET ${}", limit, limit + 1));
        sql
    }

    pub fn count_sql(&self, fragment: &SqlFragment) -> String {
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.source());
        if !fragment.is_empty() {
            sql.push(' ');
            sql.push_str(&fragment.where_clause());
        }
        sql
    }
}

/// Executes filtered selects against a pool
pub struct FilterQueryExecutor<'a> {
    pool: &'a PgPool,
}

impl<'a> FilterQueryExecutor<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch one page of rows plus the total match count
    pub async fn execute<T>(
        &self,
        select: &FilteredSelect,
        fragment: &SqlFragment,
        pagination: &Pagination,
    ) -> SqlResult<PaginatedResult<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let count_sql = select.count_sql(fragment);
        let sql = select.select_sql(fragment);
        tracing::debug!(sql = %sql, params = fragment.params.len(), "Executing filtered select");

        let (total,): (i64,) = fragment
            .bind_as(sqlx::query_as::<_, (i64,)>(&count_sql))
            .fetch_one(self.pool)
            .await?;

        let items = fragment
            .bind_as(sqlx::query_as::<_, T>(&sql))
            .bind(pagination.limit)
            .bind(pagination.offset)
            .fetch_all(self.pool)
            .await?;

        Ok(PaginatedResult::new(items, total, *pagination))
    }

    pub async fn count(&self, select: &FilteredSelect, fragment: &SqlFragment) -> SqlResult<i64> {
        let count_sql = select.count_sql(fragment);
        let (total,): (i64,) = fragment
            .bind_as(sqlx::query_as::<_, (i64,)>(&count_sql))
            .fetch_one(self.pool)
            .await?;
        Ok(total)
    }
}
