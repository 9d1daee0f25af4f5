//! Built-in condition filters.
//!
//! Two condition keys ship with the router:
//!
//! - `ifRequestContains`: regex matched against the textual content of the
//!   outgoing request (search query text; namespace/name/id fields of a
//!   query). Gates the request phases.
//! - `ifExtensionIdMatches`: regex matched against a returned extension's
//!   `namespace.name` identifier. Gates the per-extension phase.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ovsx_schema::{ExtensionRef, QueryOptions, SearchOptions};
use regex::{Regex, RegexBuilder};

use crate::client::RegistryError;
use crate::filter::{FilterBinding, FilterFactory, FilterVerdict, RouterFilter};
use crate::rules::ConfigError;

/// Condition key handled by [`RequestContainsFilterFactory`].
pub const IF_REQUEST_CONTAINS: &str = "ifRequestContains";

/// Condition key handled by [`ExtensionIdMatchesFilterFactory`].
pub const IF_EXTENSION_ID_MATCHES: &str = "ifExtensionIdMatches";

/// The filter factories every router gets unless the caller supplies its
/// own set.
pub fn default_filter_factories() -> Vec<Arc<dyn FilterFactory>> {
    vec![
        Arc::new(RequestContainsFilterFactory),
        Arc::new(ExtensionIdMatchesFilterFactory),
    ]
}

/// Compile a condition value into a case-insensitive regex.
fn condition_pattern(key: &str, value: &serde_json::Value) -> Result<Regex, ConfigError> {
    let pattern = value.as_str().ok_or_else(|| ConfigError::InvalidCondition {
        key: key.to_string(),
        reason: format!("expected a string pattern, got {value}"),
    })?;
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|err| ConfigError::InvalidCondition {
            key: key.to_string(),
            reason: err.to_string(),
        })
}

/// Builds filters for the `ifRequestContains` condition.
#[derive(Debug, Default)]
pub struct RequestContainsFilterFactory;

#[async_trait]
impl FilterFactory for RequestContainsFilterFactory {
    async fn create(
        &self,
        conditions: &HashMap<String, serde_json::Value>,
    ) -> Result<Option<FilterBinding>, ConfigError> {
        let Some(value) = conditions.get(IF_REQUEST_CONTAINS) else {
            return Ok(None);
        };
        let pattern = condition_pattern(IF_REQUEST_CONTAINS, value)?;
        Ok(Some(FilterBinding::single(
            IF_REQUEST_CONTAINS,
            Arc::new(RequestContainsFilter { pattern }),
        )))
    }
}

struct RequestContainsFilter {
    pattern: Regex,
}

#[async_trait]
impl RouterFilter for RequestContainsFilter {
    async fn filter_search_options(
        &self,
        options: &SearchOptions,
    ) -> Result<FilterVerdict, RegistryError> {
        // A request without query text carries nothing to veto.
        Ok(match options.query.as_deref() {
            Some(query) if !query.is_empty() => {
                FilterVerdict::from_bool(self.pattern.is_match(query))
            }
            _ => FilterVerdict::Allow,
        })
    }

    async fn filter_query_options(
        &self,
        options: &QueryOptions,
    ) -> Result<FilterVerdict, RegistryError> {
        let fields = [
            options.extension_id.as_deref(),
            options.extension_name.as_deref(),
            options.namespace_name.as_deref(),
        ];
        let mut probed = false;
        let mut matched = false;
        for field in fields.into_iter().flatten() {
            probed = true;
            matched = matched || self.pattern.is_match(field);
        }
        Ok(if probed {
            FilterVerdict::from_bool(matched)
        } else {
            FilterVerdict::Allow
        })
    }
}

/// Builds filters for the `ifExtensionIdMatches` condition.
#[derive(Debug, Default)]
pub struct ExtensionIdMatchesFilterFactory;

#[async_trait]
impl FilterFactory for ExtensionIdMatchesFilterFactory {
    async fn create(
        &self,
        conditions: &HashMap<String, serde_json::Value>,
    ) -> Result<Option<FilterBinding>, ConfigError> {
        let Some(value) = conditions.get(IF_EXTENSION_ID_MATCHES) else {
            return Ok(None);
        };
        let pattern = condition_pattern(IF_EXTENSION_ID_MATCHES, value)?;
        Ok(Some(FilterBinding::single(
            IF_EXTENSION_ID_MATCHES,
            Arc::new(ExtensionIdMatchesFilter { pattern }),
        )))
    }
}

struct ExtensionIdMatchesFilter {
    pattern: Regex,
}

#[async_trait]
impl RouterFilter for ExtensionIdMatchesFilter {
    async fn filter_extension(
        &self,
        extension: &ExtensionRef,
    ) -> Result<FilterVerdict, RegistryError> {
        Ok(FilterVerdict::from_bool(self.pattern.is_match(&extension.id())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn build(
        factory: &dyn FilterFactory,
        conditions: serde_json::Value,
    ) -> Option<FilterBinding> {
        let map: HashMap<String, serde_json::Value> =
            serde_json::from_value(conditions).unwrap();
        factory.create(&map).await.unwrap()
    }

    #[tokio::test]
    async fn test_request_contains_search_phase() {
        let binding = build(
            &RequestContainsFilterFactory,
            json!({ "ifRequestContains": "internal" }),
        )
        .await
        .unwrap();
        assert_eq!(binding.claims, vec![IF_REQUEST_CONTAINS]);

        let matching = SearchOptions {
            query: Some("our Internal tools".to_string()),
            ..Default::default()
        };
        assert_eq!(
            binding.filter.filter_search_options(&matching).await.unwrap(),
            FilterVerdict::Allow
        );

        let other = SearchOptions {
            query: Some("rust".to_string()),
            ..Default::default()
        };
        assert_eq!(
            binding.filter.filter_search_options(&other).await.unwrap(),
            FilterVerdict::Deny
        );

        // Nothing to veto without query text
        assert_eq!(
            binding
                .filter
                .filter_search_options(&SearchOptions::default())
                .await
                .unwrap(),
            FilterVerdict::Allow
        );

        // Does not participate in the extension phase
        assert_eq!(
            binding
                .filter
                .filter_extension(&ExtensionRef::new("some", "a"))
                .await
                .unwrap(),
            FilterVerdict::Abstain
        );
    }

    #[tokio::test]
    async fn test_request_contains_query_phase() {
        let binding = build(
            &RequestContainsFilterFactory,
            json!({ "ifRequestContains": "^some$" }),
        )
        .await
        .unwrap();

        let by_namespace = QueryOptions {
            namespace_name: Some("some".to_string()),
            ..Default::default()
        };
        assert_eq!(
            binding.filter.filter_query_options(&by_namespace).await.unwrap(),
            FilterVerdict::Allow
        );

        let by_id = QueryOptions {
            extension_id: Some("other.e".to_string()),
            ..Default::default()
        };
        assert_eq!(
            binding.filter.filter_query_options(&by_id).await.unwrap(),
            FilterVerdict::Deny
        );

        assert_eq!(
            binding
                .filter
                .filter_query_options(&QueryOptions::default())
                .await
                .unwrap(),
            FilterVerdict::Allow
        );
    }

    #[tokio::test]
    async fn test_extension_id_matches() {
        let binding = build(
            &ExtensionIdMatchesFilterFactory,
            json!({ "ifExtensionIdMatches": "^some\\." }),
        )
        .await
        .unwrap();
        assert_eq!(binding.claims, vec![IF_EXTENSION_ID_MATCHES]);

        assert_eq!(
            binding
                .filter
                .filter_extension(&ExtensionRef::new("some", "a"))
                .await
                .unwrap(),
            FilterVerdict::Allow
        );
        assert_eq!(
            binding
                .filter
                .filter_extension(&ExtensionRef::new("other", "d"))
                .await
                .unwrap(),
            FilterVerdict::Deny
        );

        // Request phases are not this filter's concern
        assert_eq!(
            binding
                .filter
                .filter_search_options(&SearchOptions::default())
                .await
                .unwrap(),
            FilterVerdict::Abstain
        );
    }

    #[tokio::test]
    async fn test_unrelated_conditions_are_ignored() {
        assert!(
            build(
                &RequestContainsFilterFactory,
                json!({ "ifExtensionIdMatches": "^some\\." }),
            )
            .await
            .is_none()
        );
    }

    #[tokio::test]
    async fn test_non_string_condition_value_is_rejected() {
        let map: HashMap<String, serde_json::Value> =
            serde_json::from_value(json!({ "ifRequestContains": 42 })).unwrap();
        let err = RequestContainsFilterFactory.create(&map).await.unwrap_err();
        assert!(err.to_string().contains("ifRequestContains"));
    }
}
