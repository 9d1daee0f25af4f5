//! The filter protocol: per-phase predicates attached to routing rules, and
//! the factories that build them from raw rule conditions.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ovsx_schema::{ExtensionRef, QueryOptions, SearchOptions};

use crate::client::RegistryError;
use crate::rules::ConfigError;

/// Verdict of one filter for one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterVerdict {
    /// The filter applies and the subject passes.
    Allow,
    /// The filter applies and the subject is vetoed.
    Deny,
    /// The filter does not participate in this phase.
    Abstain,
}

impl FilterVerdict {
    /// `true` maps to [`FilterVerdict::Allow`], `false` to
    /// [`FilterVerdict::Deny`].
    pub fn from_bool(allow: bool) -> Self {
        if allow { Self::Allow } else { Self::Deny }
    }
}

/// A predicate attached to a routing rule.
///
/// A filter participates in a phase by overriding the corresponding method;
/// the defaults abstain. A rule matches a subject when at least one of its
/// filters returns a verdict for the probed phase and none of them denies.
#[async_trait]
pub trait RouterFilter: Send + Sync {
    /// Probe an outgoing search request.
    async fn filter_search_options(
        &self,
        _options: &SearchOptions,
    ) -> Result<FilterVerdict, RegistryError> {
        Ok(FilterVerdict::Abstain)
    }

    /// Probe an outgoing query request.
    async fn filter_query_options(
        &self,
        _options: &QueryOptions,
    ) -> Result<FilterVerdict, RegistryError> {
        Ok(FilterVerdict::Abstain)
    }

    /// Probe a single extension returned by a registry.
    async fn filter_extension(
        &self,
        _extension: &ExtensionRef,
    ) -> Result<FilterVerdict, RegistryError> {
        Ok(FilterVerdict::Abstain)
    }
}

/// A filter built by a factory, together with the condition keys the
/// factory consumed to build it.
pub struct FilterBinding {
    /// The constructed filter.
    pub filter: Arc<dyn RouterFilter>,
    /// Condition keys this filter accounts for. Claiming a key already
    /// claimed by another factory fails rule parsing.
    pub claims: Vec<String>,
}

impl FilterBinding {
    /// Bind a filter to a single claimed condition key.
    pub fn single(key: &str, filter: Arc<dyn RouterFilter>) -> Self {
        Self {
            filter,
            claims: vec![key.to_string()],
        }
    }
}

impl std::fmt::Debug for FilterBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterBinding")
            .field("claims", &self.claims)
            .finish_non_exhaustive()
    }
}

/// Builds a [`RouterFilter`] from the condition keys it understands.
///
/// A factory receives the full condition map of one rule. If the map
/// contains the factory's key(s), it returns a binding naming the keys it
/// claimed; otherwise it returns `None` and the rule's other factories get
/// their turn. Every condition key must end up claimed by exactly one
/// factory.
#[async_trait]
pub trait FilterFactory: Send + Sync {
    /// Inspect `conditions` and build a filter if this factory understands
    /// any of them.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a recognized key carries an invalid
    /// value (wrong type, malformed pattern).
    async fn create(
        &self,
        conditions: &HashMap<String, serde_json::Value>,
    ) -> Result<Option<FilterBinding>, ConfigError>;
}
