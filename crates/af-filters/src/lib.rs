//! # af-filters
//!
//! Filters that sit on top of the rule engine:
//! - Simple single-column filters (text, number, boolean, date, date range, select)
//! - `QueryBuilderFilter` carrying a nested rule tree
//! - `FilterPanel` orchestrating a set of filters against one query

pub mod components;
pub mod enums;
pub mod filter;
pub mod panel;
pub mod query_builder;

pub use components::*;
pub use enums::{FilterLayout, FilterWidth};
pub use filter::{format_indicator_value, Filter, FilterBase, FilterBuilder};
pub use panel::{FilterPanel, Indicator};
pub use query_builder::QueryBuilderFilter;
