//! Declarative routing configuration.
//!
//! A [`RouterConfig`] names backend registries (optionally behind short
//! aliases), picks the default registry set, and lists ordered routing
//! rules. It is supplied once at router construction and immutable
//! thereafter.
//!
//! ```json
//! {
//!     "registries": { "internal": "https://internal.example/api" },
//!     "use": ["internal", "https://open-vsx.org/api"],
//!     "rules": [
//!         { "ifExtensionIdMatches": "^some\\.", "use": "internal" },
//!         { "ifRequestContains": "secret", "use": null }
//!     ]
//! }
//! ```

use serde::Deserialize;
use std::collections::HashMap;

/// Top-level routing configuration, deserializable from JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    /// Registry aliases available to `use` directives, alias to URL.
    #[serde(default)]
    pub registries: HashMap<String, String>,
    /// The registry/ies to use when no rule matches.
    #[serde(rename = "use")]
    pub use_default: UseDirective,
    /// Ordered routing rules; the first matching rule wins.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

/// A single routing rule: arbitrary condition keys plus a `use` directive.
///
/// Condition keys are interpreted by the filter factories passed to the
/// router; a key no factory claims is a fatal configuration error.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    /// Target registries when this rule matches. `null` or absent means
    /// "serve nothing" for the matched request or extension.
    #[serde(default, rename = "use")]
    pub use_registries: UseDirective,
    /// Condition key/value pairs evaluated by filter factories.
    #[serde(flatten)]
    pub conditions: HashMap<String, serde_json::Value>,
}

/// A `use` directive: a single registry, several, or none.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum UseDirective {
    /// Serve nothing (`null` or absent).
    #[default]
    None,
    /// A single registry alias or URL.
    One(String),
    /// Several registry aliases or URLs, in priority order.
    Many(Vec<String>),
}

impl UseDirective {
    /// Resolve this directive to a list of registry URLs.
    ///
    /// Values matching a configured alias become the aliased URL; anything
    /// else passes through unchanged and is treated as a literal URL.
    pub fn resolve(&self, aliases: &HashMap<String, String>) -> Vec<String> {
        let alias = |name: &str| aliases.get(name).cloned().unwrap_or_else(|| name.to_string());
        match self {
            UseDirective::None => Vec::new(),
            UseDirective::One(name) => vec![alias(name)],
            UseDirective::Many(names) => names.iter().map(|name| alias(name)).collect(),
        }
    }
}
