//! # af-core
//!
//! Core types shared by every Accelade Filters RS crate:
//! - Error taxonomy (`FilterError`, `ComplexityReason`)
//! - Result alias
//! - Engine configuration (`FiltersConfig`, `CompileLimits`)

pub mod config;
pub mod error;
pub mod result;

pub use config::{CompileLimits, ConfigError, FiltersConfig};
pub use error::*;
pub use result::*;
