//! Extension identity and registry result records.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A validated extension identifier in `namespace.name` format.
///
/// The namespace may not contain a dot; the name may (the split happens at
/// the first dot, matching how registries parse identifiers).
///
/// # Example
///
/// ```
/// use ovsx_schema::ExtensionId;
///
/// let id = ExtensionId::new("redhat.java").unwrap();
/// assert_eq!(id.namespace(), "redhat");
/// assert_eq!(id.name(), "java");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtensionId(String);

impl ExtensionId {
    /// Create a new `ExtensionId`, validating the `namespace.name` format.
    ///
    /// # Errors
    ///
    /// Returns [`ExtensionIdError::InvalidFormat`] if `s` has no dot or if
    /// either component is empty.
    pub fn new(s: &str) -> Result<Self, ExtensionIdError> {
        match s.split_once('.') {
            Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => {
                Ok(Self(s.to_string()))
            }
            _ => Err(ExtensionIdError::InvalidFormat(s.to_string())),
        }
    }

    /// Get the namespace part.
    pub fn namespace(&self) -> &str {
        self.0.split('.').next().unwrap_or("")
    }

    /// Get the extension name part.
    pub fn name(&self) -> &str {
        self.0.split_once('.').map_or("", |(_, name)| name)
    }

    /// Return the raw `namespace.name` string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur when validating an [`ExtensionId`].
#[derive(thiserror::Error, Debug)]
pub enum ExtensionIdError {
    /// The identifier is not in `namespace.name` format.
    #[error("Invalid extension id: expected 'namespace.name', got '{0}'")]
    InvalidFormat(String),
}

/// Minimal identity of an extension: namespace, name, and optionally a
/// pinned version.
///
/// This is the shape the router's per-extension filters operate on. It is a
/// value type, never mutated after a registry returns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionRef {
    /// Publishing namespace (e.g. `redhat`).
    pub namespace: String,
    /// Extension name within the namespace (e.g. `java`).
    pub name: String,
    /// Pinned version, if the reference targets one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ExtensionRef {
    /// Create an unversioned reference.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            version: None,
        }
    }

    /// Pin this reference to a version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Canonical `namespace.name` identifier.
    pub fn id(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

impl std::fmt::Display for ExtensionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}.{}@{version}", self.namespace, self.name),
            None => write!(f, "{}.{}", self.namespace, self.name),
        }
    }
}

/// One entry of a search result page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEntry {
    /// Publishing namespace.
    pub namespace: String,
    /// Extension name.
    pub name: String,
    /// Latest (or requested) version.
    pub version: String,
    /// Human-readable display name, if published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Short description, if published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Publication timestamp in RFC 3339 format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Total downloads across all versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_count: Option<u64>,
    /// Average user rating, when the registry tracks ratings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
}

impl SearchEntry {
    /// Identity of this entry, for filtering.
    pub fn to_ref(&self) -> ExtensionRef {
        ExtensionRef::new(self.namespace.clone(), self.name.clone())
            .with_version(self.version.clone())
    }
}

/// A full extension record as returned by the `/-/query` endpoint.
///
/// When `includeAllVersions` is requested, the registry returns one record
/// per published version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionRaw {
    /// Publishing namespace.
    pub namespace: String,
    /// Extension name.
    pub name: String,
    /// Version of this record.
    pub version: String,
    /// Declared engine requirements, engine name to version range
    /// (e.g. `vscode` -> `^1.50.0`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engines: Option<HashMap<String, String>>,
    /// Human-readable display name, if published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Short description, if published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Publication timestamp in RFC 3339 format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Total downloads across all versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_count: Option<u64>,
}

impl ExtensionRaw {
    /// Identity of this record, for filtering.
    pub fn to_ref(&self) -> ExtensionRef {
        ExtensionRef::new(self.namespace.clone(), self.name.clone())
            .with_version(self.version.clone())
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Offset of the first entry relative to the full result set.
    #[serde(default)]
    pub offset: u32,
    /// Entries of this page.
    #[serde(default)]
    pub extensions: Vec<SearchEntry>,
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// Offset of the first record relative to the full result set.
    #[serde(default)]
    pub offset: u32,
    /// Total number of records matching the query.
    #[serde(default)]
    pub total_size: u32,
    /// Records of this page.
    #[serde(default)]
    pub extensions: Vec<ExtensionRaw>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_id_parsing() {
        let id = ExtensionId::new("redhat.java").unwrap();
        assert_eq!(id.namespace(), "redhat");
        assert_eq!(id.name(), "java");
        assert_eq!(id.as_str(), "redhat.java");

        // Name keeps everything after the first dot
        let id = ExtensionId::new("ms-vscode.cpptools.insiders").unwrap();
        assert_eq!(id.namespace(), "ms-vscode");
        assert_eq!(id.name(), "cpptools.insiders");

        assert!(ExtensionId::new("nodot").is_err());
        assert!(ExtensionId::new(".name").is_err());
        assert!(ExtensionId::new("namespace.").is_err());
    }

    #[test]
    fn test_extension_ref_display() {
        let unversioned = ExtensionRef::new("some", "a");
        assert_eq!(unversioned.id(), "some.a");
        assert_eq!(unversioned.to_string(), "some.a");

        let versioned = ExtensionRef::new("some", "a").with_version("1.2.3");
        assert_eq!(versioned.id(), "some.a");
        assert_eq!(versioned.to_string(), "some.a@1.2.3");
    }

    #[test]
    fn test_search_result_decoding() {
        let json = r#"{
            "offset": 10,
            "extensions": [
                {
                    "namespace": "some",
                    "name": "a",
                    "version": "1.0.0",
                    "displayName": "Some A",
                    "downloadCount": 42
                }
            ]
        }"#;

        let result: SearchResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.offset, 10);
        assert_eq!(result.extensions.len(), 1);
        let entry = &result.extensions[0];
        assert_eq!(entry.display_name.as_deref(), Some("Some A"));
        assert_eq!(entry.download_count, Some(42));
        assert_eq!(entry.to_ref().to_string(), "some.a@1.0.0");
    }

    #[test]
    fn test_query_result_decoding_defaults() {
        let json = r#"{
            "extensions": [
                {
                    "namespace": "other",
                    "name": "d",
                    "version": "0.3.1",
                    "engines": { "vscode": "^1.50.0" }
                }
            ]
        }"#;

        let result: QueryResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.offset, 0);
        assert_eq!(result.total_size, 0);
        let raw = &result.extensions[0];
        assert_eq!(
            raw.engines.as_ref().unwrap().get("vscode").unwrap(),
            "^1.50.0"
        );
        assert_eq!(raw.to_ref().id(), "other.d");
    }
}
