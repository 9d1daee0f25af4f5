//! HTTP client for a single OVSX-style registry.

use async_trait::async_trait;
use ovsx_schema::{QueryOptions, QueryResult, SearchOptions, SearchResult};

use crate::client::{RegistryClient, RegistryError};

/// Talks HTTP+JSON to one registry's `/-/search` and `/-/query` endpoints.
///
/// Does exactly one request per operation: no retries, no rate limiting,
/// no caching. Callers wanting such behavior wrap this client.
#[derive(Debug, Clone)]
pub struct HttpRegistryClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRegistryClient {
    /// Create a client for the registry at `base_url` (e.g.
    /// `https://open-vsx.org/api`). A trailing slash is tolerated.
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The registry URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl RegistryClient for HttpRegistryClient {
    async fn search(&self, options: &SearchOptions) -> Result<SearchResult, RegistryError> {
        let url = self.endpoint("/-/search");
        tracing::debug!("GET {url}");
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
            .query(options)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn query(&self, options: &QueryOptions) -> Result<QueryResult, RegistryError> {
        let url = self.endpoint("/-/query");
        tracing::debug!("POST {url}");
        let response = self
            .client
            .post(&url)
            .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
            .json(options)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_search_builds_query_string() {
        let mut server = Server::new_async().await;

        let mock_body = r#"{
            "offset": 0,
            "extensions": [
                { "namespace": "some", "name": "a", "version": "1.0.0" },
                { "namespace": "some", "name": "b", "version": "2.1.0" }
            ]
        }"#;

        let _m = server
            .mock("GET", "/-/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("query".into(), "vim".into()),
                Matcher::UrlEncoded("size".into(), "10".into()),
                Matcher::UrlEncoded("sortBy".into(), "downloadCount".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(mock_body)
            .create_async()
            .await;

        let client = HttpRegistryClient::new(reqwest::Client::new(), &server.url());
        let options = SearchOptions {
            query: Some("vim".to_string()),
            size: Some(10),
            sort_by: Some(ovsx_schema::SortBy::DownloadCount),
            ..Default::default()
        };
        let result = client.search(&options).await.unwrap();

        assert_eq!(result.extensions.len(), 2);
        assert_eq!(result.extensions[0].to_ref().id(), "some.a");
        assert_eq!(result.extensions[1].version, "2.1.0");
    }

    #[tokio::test]
    async fn test_query_posts_json_body() {
        let mut server = Server::new_async().await;

        let mock_body = r#"{
            "offset": 0,
            "totalSize": 1,
            "extensions": [
                {
                    "namespace": "other",
                    "name": "d",
                    "version": "0.3.1",
                    "engines": { "vscode": "^1.50.0" }
                }
            ]
        }"#;

        let _m = server
            .mock("POST", "/-/query")
            .match_body(Matcher::Json(serde_json::json!({
                "namespaceName": "other"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(mock_body)
            .create_async()
            .await;

        // Trailing slash on the base URL must not double up
        let client =
            HttpRegistryClient::new(reqwest::Client::new(), &format!("{}/", server.url()));
        let options = QueryOptions {
            namespace_name: Some("other".to_string()),
            ..Default::default()
        };
        let result = client.query(&options).await.unwrap();

        assert_eq!(result.total_size, 1);
        assert_eq!(result.extensions[0].to_ref().to_string(), "other.d@0.3.1");
    }

    #[tokio::test]
    async fn test_http_error_propagates() {
        let mut server = Server::new_async().await;

        let _m = server
            .mock("GET", "/-/search")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let client = HttpRegistryClient::new(reqwest::Client::new(), &server.url());
        let err = client.search(&SearchOptions::default()).await.unwrap_err();
        assert!(matches!(err, RegistryError::Http(_)));
    }
}
