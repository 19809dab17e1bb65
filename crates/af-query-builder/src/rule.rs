//! Rule tree wire model
//!
//! A submitted tree is a [`Group`] whose `rules` mix leaf [`Rule`]s and nested
//! groups. Anything in a `rules` array that is neither becomes
//! [`Node::Other`] and never restricts a query.

use af_core::{CompileLimits, FilterError, FilterResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::predicate::Combinator;

/// serde_json gives up on documents nesting this many containers
const PARSER_NESTING_LIMIT: usize = 128;

/// Each group level adds an object and its `rules` array
const MAX_PARSEABLE_DEPTH: usize = PARSER_NESTING_LIMIT / 2 - 1;

/// Deepest object/array nesting in a JSON document, found without parsing it
fn json_nesting(input: &str) -> usize {
    let mut deepest = 0;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for byte in input.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

/// Leaf selection of constraint, operator and raw value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub constraint: Option<String>,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
}

impl Rule {
    pub fn new(constraint: impl Into<String>, operator: impl Into<String>, value: Value) -> Self {
        Self {
            constraint: Some(constraint.into()),
            operator: Some(operator.into()),
            value: Some(value),
        }
    }

    /// Rule for a value-less operator
    pub fn bare(constraint: impl Into<String>, operator: impl Into<String>) -> Self {
        Self {
            constraint: Some(constraint.into()),
            operator: Some(operator.into()),
            value: None,
        }
    }

    /// A rule missing its constraint or operator compiles to nothing
    pub fn is_inert(&self) -> bool {
        self.constraint.is_none() || self.operator.is_none()
    }
}

/// One entry of a group's `rules`; groups are recognised by their `rules` array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Group(Group),
    Rule(Rule),
    Other(Value),
}

impl From<Rule> for Node {
    fn from(rule: Rule) -> Self {
        Self::Rule(rule)
    }
}

impl From<Group> for Node {
    fn from(group: Group) -> Self {
        Self::Group(group)
    }
}

/// Combinator over an ordered list of rules and groups
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Group {
    pub rules: Vec<Node>,
    #[serde(default)]
    pub combinator: Combinator,
}

impl Group {
    pub fn new(combinator: Combinator) -> Self {
        Self {
            rules: Vec::new(),
            combinator,
        }
    }

    pub fn and<I, N>(nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        Self::with(Combinator::And, nodes)
    }

    pub fn or<I, N>(nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        Self::with(Combinator::Or, nodes)
    }

    fn with<I, N>(combinator: Combinator, nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        Self {
            rules: nodes.into_iter().map(Into::into).collect(),
            combinator,
        }
    }

    pub fn push(&mut self, node: impl Into<Node>) -> &mut Self {
        self.rules.push(node.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Parse a submitted tree.
    ///
    /// The root must be a JSON object. A root without a usable `rules` array
    /// is an empty group.
    pub fn from_value(value: &Value) -> FilterResult<Self> {
        let Value::Object(map) = value else {
            return Err(FilterError::invalid_value("rule tree must be a JSON object"));
        };

        let combinator = map
            .get("combinator")
            .and_then(Value::as_str)
            .map(Combinator::from_str_lenient)
            .unwrap_or_default();

        match map.get("rules") {
            Some(Value::Array(_)) => Ok(serde_json::from_value(value.clone())?),
            _ => Ok(Self::new(combinator)),
        }
    }

    pub fn from_json_str(input: &str) -> FilterResult<Self> {
        Self::from_json_str_within(input, &CompileLimits::default())
    }

    /// Parse a JSON-encoded tree.
    ///
    /// A document nested too deeply to parse is rejected as too complex
    /// against `limits` rather than reported as malformed.
    pub fn from_json_str_within(input: &str, limits: &CompileLimits) -> FilterResult<Self> {
        let nesting = json_nesting(input);
        if nesting >= PARSER_NESTING_LIMIT {
            let depth = nesting / 2;
            let max = limits.max_depth.min(MAX_PARSEABLE_DEPTH);
            tracing::warn!(depth, max, "Rejecting rule tree: too deep to parse");
            return Err(FilterError::depth_exceeded(depth, max));
        }
        let value: Value = serde_json::from_str(input)?;
        Self::from_value(&value)
    }

    /// Parse, treating anything unusable as an empty group
    pub fn lenient(value: &Value) -> Self {
        Self::from_value(value).unwrap_or_default()
    }

    /// Nesting depth, counting this group as 1
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((group, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            for node in &group.rules {
                if let Node::Group(child) = node {
                    stack.push((child, depth + 1));
                }
            }
        }
        deepest
    }

    /// Leaf entries across the whole tree, inert ones included
    pub fn rule_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(group) = stack.pop() {
            for node in &group.rules {
                match node {
                    Node::Group(child) => stack.push(child),
                    Node::Rule(_) | Node::Other(_) => count += 1,
                }
            }
        }
        count
    }
}
