//! Configuration types and loading

use serde::{Deserialize, Serialize};

/// Structural limits applied to client-supplied rule trees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CompileLimits {
    /// Maximum group nesting depth; the root group is depth 1
    pub max_depth: usize,
    /// Maximum number of rules across the whole tree
    pub max_rules: usize,
}

impl Default for CompileLimits {
    fn default() -> Self {
        Self {
            max_depth: 32,
            max_rules: 1000,
        }
    }
}

impl CompileLimits {
    pub fn new(max_depth: usize, max_rules: usize) -> Self {
        Self {
            max_depth,
            max_rules,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_rules(mut self, max_rules: usize) -> Self {
        self.max_rules = max_rules;
        self
    }
}

/// Package-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FiltersConfig {
    /// Enable or disable filtering altogether
    pub enabled: bool,
    /// Limits for query builder trees
    pub limits: CompileLimits,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            limits: CompileLimits::default(),
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl FiltersConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("FILTERS_ENABLED") {
            config.enabled = parse_bool("FILTERS_ENABLED", &v)?;
        }
        if let Some(v) = lookup("FILTERS_MAX_DEPTH") {
            config.limits.max_depth = parse_limit("FILTERS_MAX_DEPTH", &v)?;
        }
        if let Some(v) = lookup("FILTERS_MAX_RULES") {
            config.limits.max_rules = parse_limit("FILTERS_MAX_RULES", &v)?;
        }

        tracing::debug!(
            enabled = config.enabled,
            max_depth = config.limits.max_depth,
            max_rules = config.limits.max_rules,
            "Loaded filters configuration"
        );

        Ok(config)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{}'", other),
        }),
    }
}

fn parse_limit(key: &str, value: &str) -> Result<usize, ConfigError> {
    let parsed: usize = value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a positive integer, got '{}'", value),
        })?;

    if parsed == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = FiltersConfig::default();
        assert!(config.enabled);
        assert_eq!(config.limits.max_depth, 32);
        assert_eq!(config.limits.max_rules, 1000);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = FiltersConfig::from_lookup(lookup(&[
            ("FILTERS_ENABLED", "no"),
            ("FILTERS_MAX_DEPTH", " 8 "),
            ("FILTERS_MAX_RULES", "50"),
        ]))
        .unwrap();

        assert!(!config.enabled);
        assert_eq!(config.limits, CompileLimits::new(8, 50));
    }

    #[test]
    fn test_from_lookup_rejects_invalid_numbers() {
        let err = FiltersConfig::from_lookup(lookup(&[("FILTERS_MAX_DEPTH", "deep")])).unwrap_err();
        assert!(err.to_string().contains("FILTERS_MAX_DEPTH"));

        let err = FiltersConfig::from_lookup(lookup(&[("FILTERS_MAX_RULES", "0")])).unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn test_limits_deserialize_with_defaults() {
        let limits: CompileLimits = serde_json::from_str(r#"{"max_depth": 4}"#).unwrap();
        assert_eq!(limits.max_depth, 4);
        assert_eq!(limits.max_rules, 1000);
    }
}
