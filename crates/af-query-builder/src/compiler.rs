//! Rule tree compilation
//!
//! Walks a [`Group`] against a [`ConstraintRegistry`] and produces one
//! predicate. Unresolvable or malformed nodes degrade to the neutral outcome
//! (`None`) and never fail compilation; only trees that exceed the configured
//! limits are rejected.

use af_core::{CompileLimits, FilterError, FilterResult};

use crate::predicate::Predicate;
use crate::registry::ConstraintRegistry;
use crate::rule::{Group, Node, Rule};
use crate::sink::QuerySink;

#[derive(Debug, Clone)]
pub struct QueryCompiler<'a> {
    registry: &'a ConstraintRegistry,
    limits: CompileLimits,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(registry: &'a ConstraintRegistry) -> Self {
        Self {
            registry,
            limits: CompileLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: CompileLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> CompileLimits {
        self.limits
    }

    /// Reject trees that are too deep or carry too many rules
    pub fn check_limits(&self, group: &Group) -> FilterResult<()> {
        let depth = group.depth();
        if depth > self.limits.max_depth {
            tracing::warn!(depth, max = self.limits.max_depth, "Rejecting rule tree: too deep");
            return Err(FilterError::depth_exceeded(depth, self.limits.max_depth));
        }

        let count = group.rule_count();
        if count > self.limits.max_rules {
            tracing::warn!(count, max = self.limits.max_rules, "Rejecting rule tree: too many rules");
            return Err(FilterError::too_many_rules(count, self.limits.max_rules));
        }

        Ok(())
    }

    /// Compile a tree into one predicate; `Ok(None)` means no restriction
    pub fn compile(&self, group: &Group) -> FilterResult<Option<Predicate>> {
        self.check_limits(group)?;
        Ok(self.compile_group(group))
    }

    /// Compile and emit into `sink` as a single parenthesised unit.
    ///
    /// Returns whether anything was emitted.
    pub fn compile_into<S: QuerySink>(&self, sink: &mut S, group: &Group) -> FilterResult<bool> {
        match self.compile(group)? {
            Some(predicate) => {
                predicate.apply_to(sink);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn compile_group(&self, group: &Group) -> Option<Predicate> {
        let children: Vec<Predicate> = group
            .rules
            .iter()
            .filter_map(|node| match node {
                Node::Group(child) => self.compile_group(child),
                Node::Rule(rule) => self.compile_rule(rule),
                Node::Other(_) => {
                    tracing::debug!("Skipping node that is neither rule nor group");
                    None
                }
            })
            .collect();

        // No restriction from an empty group, whatever its combinator
        if children.is_empty() {
            return None;
        }
        Some(Predicate::group(group.combinator, children))
    }

    fn compile_rule(&self, rule: &Rule) -> Option<Predicate> {
        let (Some(constraint_name), Some(operator_name)) = (&rule.constraint, &rule.operator) else {
            tracing::debug!("Skipping incomplete rule");
            return None;
        };

        let Some(constraint) = self.registry.get(constraint_name) else {
            tracing::debug!(constraint = %constraint_name, "Skipping rule: unknown constraint");
            return None;
        };

        let Some(operator) = constraint.find_operator(operator_name) else {
            tracing::debug!(
                constraint = %constraint_name,
                operator = %operator_name,
                "Skipping rule: unknown operator"
            );
            return None;
        };

        let predicate = operator.predicate(&constraint.field_ref(), rule.value.as_ref());
        if predicate.is_none() {
            tracing::debug!(
                constraint = %constraint_name,
                operator = %operator_name,
                "Skipping rule: missing or malformed value"
            );
        }
        predicate
    }
}
