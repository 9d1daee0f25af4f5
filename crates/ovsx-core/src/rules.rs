//! Compilation of raw rule configuration into evaluatable rules.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;
use thiserror::Error;

use crate::config::RuleConfig;
use crate::filter::{FilterFactory, RouterFilter};

/// Errors raised while compiling routing configuration.
///
/// All of these are fatal: a router cannot be constructed from a
/// configuration that produces any of them.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A rule carries condition keys no filter factory claimed. Catches
    /// typos that would otherwise silently disable a condition.
    #[error("unknown conditions: {}", .keys.join(", "))]
    UnknownConditions {
        /// The unclaimed keys, sorted.
        keys: Vec<String>,
    },

    /// Two filter factories claimed the same condition key.
    #[error("condition '{key}' claimed by more than one filter factory")]
    DuplicateCondition {
        /// The doubly-claimed key.
        key: String,
    },

    /// A recognized condition key carries an unusable value.
    #[error("invalid value for condition '{key}': {reason}")]
    InvalidCondition {
        /// The offending key.
        key: String,
        /// What was wrong with the value.
        reason: String,
    },
}

/// A compiled routing rule: the filters built from its conditions and its
/// alias-resolved target registries.
pub struct ParsedRule {
    /// Filters that must unanimously allow for the rule to match.
    pub filters: Vec<Arc<dyn RouterFilter>>,
    /// Target registry URLs; empty means "serve nothing".
    pub use_registries: Vec<String>,
}

impl std::fmt::Debug for ParsedRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedRule")
            .field("filters", &self.filters.len())
            .field("use_registries", &self.use_registries)
            .finish()
    }
}

/// Compile raw rules against the given filter factories.
///
/// Rules compile concurrently. Within one rule, every factory sees the full
/// condition map and returns the keys it claimed; after all factories ran,
/// a key claimed twice or claimed by nobody fails compilation.
///
/// # Errors
///
/// See [`ConfigError`].
pub async fn parse_rules(
    rules: &[RuleConfig],
    factories: &[Arc<dyn FilterFactory>],
    aliases: &HashMap<String, String>,
) -> Result<Vec<ParsedRule>, ConfigError> {
    try_join_all(rules.iter().map(|rule| parse_rule(rule, factories, aliases))).await
}

async fn parse_rule(
    rule: &RuleConfig,
    factories: &[Arc<dyn FilterFactory>],
    aliases: &HashMap<String, String>,
) -> Result<ParsedRule, ConfigError> {
    let mut filters = Vec::new();
    let mut claimed: Vec<String> = Vec::new();

    for factory in factories {
        if let Some(binding) = factory.create(&rule.conditions).await? {
            for key in &binding.claims {
                if claimed.contains(key) {
                    return Err(ConfigError::DuplicateCondition { key: key.clone() });
                }
                claimed.push(key.clone());
            }
            filters.push(binding.filter);
        }
    }

    let mut leftover: Vec<String> = rule
        .conditions
        .keys()
        .filter(|key| !claimed.contains(*key))
        .cloned()
        .collect();
    leftover.sort();
    if !leftover.is_empty() {
        return Err(ConfigError::UnknownConditions { keys: leftover });
    }

    Ok(ParsedRule {
        filters,
        use_registries: rule.use_registries.resolve(aliases),
    })
}
