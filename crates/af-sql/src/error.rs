//! SQL layer errors

use af_core::FilterError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqlError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Filter(#[from] FilterError),
}

pub type SqlResult<T> = Result<T, SqlError>;
