//! Routing and agglomeration of requests across multiple registries.
//!
//! [`RouterClient`] exposes the same request surface as a single
//! [`RegistryClient`] but internally evaluates routing rules, fans the
//! request out to the selected registries concurrently, filters every
//! returned extension, and merges the per-registry results back into one
//! ordered result.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use ovsx_schema::{
    ExtensionRef, QueryOptions, QueryResult, SearchOptions, SearchResult,
};

use crate::client::{ClientProvider, RegistryClient, RegistryError};
use crate::config::RouterConfig;
use crate::filter::{FilterFactory, FilterVerdict, RouterFilter};
use crate::rules::{ConfigError, ParsedRule, parse_rules};

/// The phase a rule is being evaluated for, carrying the subject to probe
/// filters with.
enum RulePhase<'a> {
    /// Pre-request: an outgoing search.
    Search(&'a SearchOptions),
    /// Pre-request: an outgoing query.
    Query(&'a QueryOptions),
    /// Post-result: a single returned extension.
    Extension(&'a ExtensionRef),
}

impl RulePhase<'_> {
    async fn probe(&self, filter: &dyn RouterFilter) -> Result<FilterVerdict, RegistryError> {
        match self {
            RulePhase::Search(options) => filter.filter_search_options(options).await,
            RulePhase::Query(options) => filter.filter_query_options(options).await,
            RulePhase::Extension(extension) => filter.filter_extension(extension).await,
        }
    }
}

/// Routes and agglomerates search/query requests according to a
/// [`RouterConfig`].
///
/// Implements [`RegistryClient`] itself, so a router can stand in anywhere
/// a single registry client is expected.
pub struct RouterClient {
    use_default: Vec<String>,
    provider: Arc<dyn ClientProvider>,
    rules: Vec<ParsedRule>,
}

impl RouterClient {
    /// Build a router from declarative configuration.
    ///
    /// Rules are compiled eagerly; an unknown or doubly-claimed condition
    /// key fails construction.
    ///
    /// # Errors
    ///
    /// See [`ConfigError`].
    pub async fn from_config(
        config: &RouterConfig,
        provider: Arc<dyn ClientProvider>,
        factories: &[Arc<dyn FilterFactory>],
    ) -> Result<Self, ConfigError> {
        let rules = parse_rules(&config.rules, factories, &config.registries).await?;
        tracing::debug!(
            "router configured with {} rules, default registries: {:?}",
            rules.len(),
            config.use_default.resolve(&config.registries)
        );
        Ok(Self::new(
            config.use_default.resolve(&config.registries),
            provider,
            rules,
        ))
    }

    /// Build a router from already-compiled rules.
    pub fn new(
        use_default: Vec<String>,
        provider: Arc<dyn ClientProvider>,
        rules: Vec<ParsedRule>,
    ) -> Self {
        Self {
            use_default,
            provider,
            rules,
        }
    }

    /// Find the first rule matching the given phase, in configured order.
    ///
    /// Every filter of a rule is probed concurrently; abstentions are
    /// discarded. A rule matches when at least one verdict remains and all
    /// remaining verdicts allow.
    async fn first_matching_rule(
        &self,
        phase: &RulePhase<'_>,
    ) -> Result<Option<&ParsedRule>, RegistryError> {
        for rule in &self.rules {
            let verdicts =
                try_join_all(rule.filters.iter().map(|filter| phase.probe(filter.as_ref())))
                    .await?;
            let mut applicable = verdicts
                .into_iter()
                .filter(|verdict| *verdict != FilterVerdict::Abstain)
                .peekable();
            if applicable.peek().is_some() && applicable.all(|v| v == FilterVerdict::Allow) {
                return Ok(Some(rule));
            }
        }
        Ok(None)
    }

    /// Decide whether an extension fetched from `source` survives the
    /// post-result phase.
    ///
    /// A matching rule keeps the extension only if its target set contains
    /// the source registry; no matching rule means no restriction.
    async fn keep_extension(
        &self,
        source: &str,
        extension: &ExtensionRef,
    ) -> Result<bool, RegistryError> {
        match self
            .first_matching_rule(&RulePhase::Extension(extension))
            .await?
        {
            Some(rule) => Ok(rule.use_registries.iter().any(|registry| registry == source)),
            None => Ok(true),
        }
    }

    async fn merged_search(
        &self,
        registries: &[String],
        options: &SearchOptions,
    ) -> Result<SearchResult, RegistryError> {
        tracing::debug!("searching {} registries", registries.len());
        let results = try_join_all(registries.iter().map(|registry| async move {
            let client = self.provider.client_for(registry).await?;
            let result = client.search(options).await?;
            Ok::<_, RegistryError>((registry.as_str(), result))
        }))
        .await?;
        self.merge_search_results(results, options).await
    }

    async fn merged_query(
        &self,
        registries: &[String],
        options: &QueryOptions,
    ) -> Result<QueryResult, RegistryError> {
        tracing::debug!("querying {} registries", registries.len());
        let results = try_join_all(registries.iter().map(|registry| async move {
            let client = self.provider.client_for(registry).await?;
            let result = client.query(options).await?;
            Ok::<_, RegistryError>((registry.as_str(), result))
        }))
        .await?;
        self.merge_query_results(results).await
    }

    /// Merge per-registry search pages: filter each registry's entries,
    /// interleave the surviving lists round-robin, and take the most
    /// conservative offset the backends agree on.
    async fn merge_search_results(
        &self,
        results: Vec<(&str, SearchResult)>,
        options: &SearchOptions,
    ) -> Result<SearchResult, RegistryError> {
        let offset = results
            .iter()
            .map(|(_, result)| result.offset)
            .min()
            .unwrap_or_else(|| options.offset.unwrap_or(0));

        let filtered = try_join_all(results.into_iter().map(|(source, result)| async move {
            let kept = try_join_all(result.extensions.into_iter().map(|entry| async move {
                let keep = self.keep_extension(source, &entry.to_ref()).await?;
                Ok::<_, RegistryError>(keep.then_some(entry))
            }))
            .await?;
            Ok::<_, RegistryError>(kept.into_iter().flatten().collect::<Vec<_>>())
        }))
        .await?;

        Ok(SearchResult {
            offset,
            extensions: interleave(filtered),
        })
    }

    /// Merge per-registry query pages: filter each registry's records and
    /// flatten them in registry order. Query semantics have no pagination
    /// to preserve, so the offset resets and the total is recounted.
    async fn merge_query_results(
        &self,
        results: Vec<(&str, QueryResult)>,
    ) -> Result<QueryResult, RegistryError> {
        let filtered = try_join_all(results.into_iter().map(|(source, result)| async move {
            let kept = try_join_all(result.extensions.into_iter().map(|extension| async move {
                let keep = self.keep_extension(source, &extension.to_ref()).await?;
                Ok::<_, RegistryError>(keep.then_some(extension))
            }))
            .await?;
            Ok::<_, RegistryError>(kept.into_iter().flatten().collect::<Vec<_>>())
        }))
        .await?;

        let extensions: Vec<_> = filtered.into_iter().flatten().collect();
        Ok(QueryResult {
            offset: 0,
            total_size: extensions.len() as u32,
            extensions,
        })
    }

    fn empty_search_result(options: &SearchOptions) -> SearchResult {
        SearchResult {
            offset: options.offset.unwrap_or(0),
            extensions: Vec::new(),
        }
    }

    fn empty_query_result() -> QueryResult {
        QueryResult {
            offset: 0,
            total_size: 0,
            extensions: Vec::new(),
        }
    }
}

#[async_trait]
impl RegistryClient for RouterClient {
    async fn search(&self, options: &SearchOptions) -> Result<SearchResult, RegistryError> {
        match self.first_matching_rule(&RulePhase::Search(options)).await? {
            Some(rule) if rule.use_registries.is_empty() => {
                tracing::debug!("matched rule drops search request");
                Ok(Self::empty_search_result(options))
            }
            Some(rule) => self.merged_search(&rule.use_registries, options).await,
            None => self.merged_search(&self.use_default, options).await,
        }
    }

    async fn query(&self, options: &QueryOptions) -> Result<QueryResult, RegistryError> {
        match self.first_matching_rule(&RulePhase::Query(options)).await? {
            Some(rule) if rule.use_registries.is_empty() => {
                tracing::debug!("matched rule drops query request");
                Ok(Self::empty_query_result())
            }
            Some(rule) => self.merged_query(&rule.use_registries, options).await,
            None => self.merged_query(&self.use_default, options).await,
        }
    }
}

impl std::fmt::Debug for RouterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterClient")
            .field("use_default", &self.use_default)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

/// Round-robin merge of multiple ordered lists into one, preserving each
/// list's internal order.
///
/// ```text
/// interleave([[1, 2, 3], [4, 5], [6, 7, 8]]) == [1, 4, 6, 2, 5, 7, 3, 8]
/// ```
fn interleave<T>(lists: Vec<Vec<T>>) -> Vec<T> {
    let rounds = lists.iter().map(Vec::len).max().unwrap_or(0);
    let mut merged = Vec::with_capacity(lists.iter().map(Vec::len).sum());
    let mut sources: Vec<_> = lists.into_iter().map(Vec::into_iter).collect();
    for _ in 0..rounds {
        for source in &mut sources {
            if let Some(item) = source.next() {
                merged.push(item);
            }
        }
    }
    merged
}
