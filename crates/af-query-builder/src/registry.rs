//! Constraint registry

use std::collections::HashMap;

use serde_json::Value;

use crate::constraint::Constraint;

/// Constraints keyed by name, in declaration order.
///
/// Read-only once built, so one registry can serve concurrent compilations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintRegistry {
    constraints: Vec<Constraint>,
    index: HashMap<String, usize>,
}

impl ConstraintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constraint; a later constraint with the same name replaces the
    /// earlier one in place
    pub fn register(&mut self, constraint: impl Into<Constraint>) -> &mut Self {
        let constraint = constraint.into();
        match self.index.get(constraint.name()) {
            Some(&i) => {
                tracing::debug!(constraint = constraint.name(), "Replacing constraint");
                self.constraints[i] = constraint;
            }
            None => {
                self.index
                    .insert(constraint.name().to_string(), self.constraints.len());
                self.constraints.push(constraint);
            }
        }
        self
    }

    pub fn with(mut self, constraint: impl Into<Constraint>) -> Self {
        self.register(constraint);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Constraint> {
        self.index.get(name).map(|&i| &self.constraints[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Client-facing list of constraint descriptions
    pub fn to_schema(&self) -> Value {
        Value::Array(self.constraints.iter().map(Constraint::to_schema).collect())
    }
}

impl<C: Into<Constraint>> FromIterator<C> for ConstraintRegistry {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        let mut registry = Self::new();
        for constraint in iter {
            registry.register(constraint);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::ConstraintBuilder;
    use crate::constraints::{NumberConstraint, TextConstraint};

    #[test]
    fn test_lookup_and_order() {
        let registry = ConstraintRegistry::new()
            .with(TextConstraint::make("name"))
            .with(NumberConstraint::make("age"));

        assert_eq!(registry.len(), 2);
        assert!(registry.get("age").is_some());
        assert!(registry.get("missing").is_none());
        let names: Vec<&str> = registry.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["name", "age"]);
    }

    #[test]
    fn test_duplicate_name_replaces() {
        let registry: ConstraintRegistry = vec![
            Constraint::from(TextConstraint::make("name")),
            Constraint::from(TextConstraint::make("name").label("Full name")),
        ]
        .into_iter()
        .collect();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("name").map(|c| c.label()), Some("Full name"));
        assert_eq!(registry.to_schema()[0]["label"], "Full name");
    }
}
