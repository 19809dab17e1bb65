//! # af-sql
//!
//! PostgreSQL rendering for compiled rule trees:
//! - `SqlSink`: a `QuerySink` producing a parameterised WHERE fragment
//! - Relationship mapping for `EXISTS`/`COUNT` subqueries
//! - sqlx binding and a paginated executor

pub mod error;
pub mod executor;
pub mod fragment;
pub mod param;
pub mod relation;
pub mod sink;

pub use error::{SqlError, SqlResult};
pub use executor::{FilterQueryExecutor, FilteredSelect, PaginatedResult, Pagination};
pub use fragment::SqlFragment;
pub use param::SqlParam;
pub use relation::{RelationDef, RelationMap};
pub use sink::SqlSink;

use af_core::FilterResult;
use af_query_builder::{Group, QueryCompiler};

/// Compile `group` into `sink` and render the fragment.
///
/// An unrestricted tree yields an empty fragment.
pub fn compile_to_sql(compiler: &QueryCompiler<'_>, group: &Group, mut sink: SqlSink) -> FilterResult<SqlFragment> {
    compiler.compile_into(&mut sink, group)?;
    Ok(sink.into_fragment())
}
