//! Request parameter DTOs for the search and query operations.

use serde::{Deserialize, Serialize};

/// Sort key accepted by the search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    /// Relevance to the query text (registry default).
    Relevance,
    /// Most recently published first.
    Timestamp,
    /// Highest average rating first.
    AverageRating,
    /// Most downloaded first.
    DownloadCount,
}

/// Sort direction accepted by the search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// Parameters of a `/-/search` request.
///
/// All fields are optional; the registry applies its own defaults for
/// anything left unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    /// Free-form query text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Restrict results to a category (e.g. `Programming Languages`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Maximum number of entries to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    /// Number of entries to skip from the start of the result set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    /// Sort key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,
    /// Sort direction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    /// Return every published version instead of only the latest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_all_versions: Option<bool>,
}

/// Parameters of a `/-/query` request: direct identifier lookup rather than
/// ranked search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    /// Match extensions published under this namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_name: Option<String>,
    /// Match extensions with this name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_name: Option<String>,
    /// Match this exact version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_version: Option<String>,
    /// Match this `namespace.name` identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_id: Option<String>,
    /// Match the extension with this UUID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_uuid: Option<String>,
    /// Match extensions in the namespace with this UUID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_uuid: Option<String>,
    /// Return one record per published version instead of only the latest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_all_versions: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_options_serialization() {
        let options = SearchOptions {
            query: Some("rust".to_string()),
            size: Some(20),
            sort_by: Some(SortBy::DownloadCount),
            sort_order: Some(SortOrder::Desc),
            ..Default::default()
        };

        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "query": "rust",
                "size": 20,
                "sortBy": "downloadCount",
                "sortOrder": "desc"
            })
        );
    }

    #[test]
    fn test_query_options_camel_case() {
        let options: QueryOptions = serde_json::from_str(
            r#"{ "namespaceName": "some", "includeAllVersions": true }"#,
        )
        .unwrap();
        assert_eq!(options.namespace_name.as_deref(), Some("some"));
        assert_eq!(options.include_all_versions, Some(true));
        assert!(options.extension_id.is_none());
    }
}
