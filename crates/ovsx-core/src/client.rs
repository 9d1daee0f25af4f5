//! Client abstraction over a single backend registry, plus the provider
//! used to resolve registry URLs to live clients.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ovsx_schema::{QueryOptions, QueryResult, SearchOptions, SearchResult};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::http::HttpRegistryClient;

/// Errors surfaced by registry operations.
///
/// The router performs no local recovery: any of these aborts the whole
/// request that triggered it.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("registry '{registry}': {message}")]
    Backend { registry: String, message: String },

    #[error("no registry client available for '{0}'")]
    UnknownRegistry(String),

    #[error("filter evaluation failed: {0}")]
    Filter(String),
}

/// A backend registry serving search and query requests.
///
/// [`RouterClient`](crate::router::RouterClient) implements this same trait,
/// so a router is substitutable anywhere a single client is expected.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Run a ranked text search and return one page of results.
    async fn search(&self, options: &SearchOptions) -> Result<SearchResult, RegistryError>;

    /// Look up extension records by identifier fields.
    async fn query(&self, options: &QueryOptions) -> Result<QueryResult, RegistryError>;
}

/// Resolves a registry URL to a client instance.
///
/// Providers may construct clients lazily and must be safe to call from
/// multiple in-flight requests concurrently.
#[async_trait]
pub trait ClientProvider: Send + Sync {
    /// Get or create the client for the given registry URL.
    async fn client_for(
        &self,
        registry_url: &str,
    ) -> Result<Arc<dyn RegistryClient>, RegistryError>;
}

/// Default [`ClientProvider`]: one [`HttpRegistryClient`] per registry URL,
/// constructed on first use and memoized for the provider's lifetime.
///
/// All memoized clients share a single [`reqwest::Client`] (connection
/// pooling happens there).
pub struct HttpClientProvider {
    http: reqwest::Client,
    clients: Mutex<HashMap<String, Arc<HttpRegistryClient>>>,
}

impl HttpClientProvider {
    /// Create a provider with a fresh [`reqwest::Client`].
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Create a provider sharing an existing [`reqwest::Client`].
    pub fn with_client(http: reqwest::Client) -> Self {
        Self {
            http,
            clients: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for HttpClientProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HttpClientProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClientProvider").finish_non_exhaustive()
    }
}

#[async_trait]
impl ClientProvider for HttpClientProvider {
    async fn client_for(
        &self,
        registry_url: &str,
    ) -> Result<Arc<dyn RegistryClient>, RegistryError> {
        let mut clients = self.clients.lock().await;
        let client = clients
            .entry(registry_url.to_string())
            .or_insert_with(|| {
                tracing::debug!("creating registry client for {registry_url}");
                Arc::new(HttpRegistryClient::new(self.http.clone(), registry_url))
            })
            .clone();
        Ok(client)
    }
}
