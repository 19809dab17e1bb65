//! Nested AND/OR rule trees compiled into query predicates
//!
//! Constraints describe filterable fields and the operators they offer. A
//! client submits a [`Group`] tree of rules; the [`QueryCompiler`] resolves it
//! against a [`ConstraintRegistry`] into one [`Predicate`], which can be
//! replayed into any [`QuerySink`].

pub mod compiler;
pub mod constraint;
pub mod constraints;
pub mod memory;
pub mod operator;
pub mod options;
pub mod predicate;
pub mod registry;
pub mod rule;
pub mod sink;
pub mod value;

pub use compiler::QueryCompiler;
pub use constraint::{Constraint, ConstraintBuilder, ConstraintSettings, ConstraintType};
pub use constraints::*;
pub use memory::MemorySink;
pub use operator::{FieldRef, InputType, Operator, OperatorKind, OperatorStrategy};
pub use options::{OptionList, SelectOption};
pub use predicate::{Combinator, CompareOp, CountBound, LikeKind, LikePattern, Predicate, Presence};
pub use registry::ConstraintRegistry;
pub use rule::{Group, Node, Rule};
pub use sink::QuerySink;
pub use value::Scalar;
