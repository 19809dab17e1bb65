//! Built-in constraint types and their operator sets

mod boolean;
mod date;
mod number;
mod relationship;
mod select;
mod text;

pub use boolean::{BooleanConstraint, BooleanOperator};
pub use date::{DateConstraint, DateOperator};
pub use number::{NumberConstraint, NumberOperator};
pub use relationship::{RelationshipConstraint, RelationshipOperator};
pub use select::{SelectConstraint, SelectOperator};
pub use text::{TextConstraint, TextOperator};
