//! Core error types for Accelade Filters RS
//!
//! Data-quality problems in a rule tree (unknown constraints, unknown operators,
//! malformed values) never reach this type: the compiler degrades them to a
//! neutral predicate. Only resource-protection failures and caller-side misuse
//! are errors.

use thiserror::Error;

/// Why a rule tree was rejected as too complex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplexityReason {
    /// Group nesting went deeper than the configured maximum
    DepthExceeded { depth: usize, max: usize },
    /// The tree carries more rules than the configured maximum
    TooManyRules { count: usize, max: usize },
}

impl std::fmt::Display for ComplexityReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DepthExceeded { depth, max } => {
                write!(f, "nesting depth {} exceeds maximum of {}", depth, max)
            }
            Self::TooManyRules { count, max } => {
                write!(f, "{} rules exceed maximum of {}", count, max)
            }
        }
    }
}

/// Core error type for all filter operations
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Filter tree too complex: {reason}")]
    TreeTooComplex { reason: ComplexityReason },

    #[error("Invalid filter value: {message}")]
    InvalidValue { message: String },

    #[error("Invalid constraint definition: {message}")]
    Definition { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl FilterError {
    pub fn depth_exceeded(depth: usize, max: usize) -> Self {
        Self::TreeTooComplex {
            reason: ComplexityReason::DepthExceeded { depth, max },
        }
    }

    pub fn too_many_rules(count: usize, max: usize) -> Self {
        Self::TreeTooComplex {
            reason: ComplexityReason::TooManyRules { count, max },
        }
    }

    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue {
            message: message.into(),
        }
    }

    pub fn definition(message: impl Into<String>) -> Self {
        Self::Definition {
            message: message.into(),
        }
    }

    /// Whether the caller should reject the request outright
    pub fn is_too_complex(&self) -> bool {
        matches!(self, Self::TreeTooComplex { .. })
    }

    /// HTTP status code mapping for errors
    pub fn status_code(&self) -> u16 {
        match self {
            FilterError::TreeTooComplex { .. } => 422,
            FilterError::InvalidValue { .. } | FilterError::Serialization(_) => 400,
            FilterError::Definition { .. } | FilterError::Config(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            FilterError::TreeTooComplex { .. } => "tree_too_complex",
            FilterError::InvalidValue { .. } => "invalid_value",
            FilterError::Definition { .. } => "invalid_definition",
            FilterError::Serialization(_) => "serialization_error",
            FilterError::Config(_) => "configuration_error",
        }
    }
}
