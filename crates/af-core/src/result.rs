//! Result type aliases

use crate::error::FilterError;

/// Standard Result type for filter operations
pub type FilterResult<T> = Result<T, FilterError>;
