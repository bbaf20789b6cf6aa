//! Field-definition documents and the adapters that supply them.
//!
//! A field-definition node is either a leaf carrying a `type` tag or a container
//! carrying named children under `properties`. Anything else in the node (`fields`,
//! `analyzer`, `format`, ...) is ignored. Children are kept sorted by name, so every
//! walk over a node is deterministic whatever order the document listed them in.
//!
//! Two [`MappingSource`] implementations live here:
//! - [`StaticFileSource`] reads a JSON dump from disk.
//! - [`ElasticsearchSource`] calls `GET /<index>/_mapping` on a live cluster.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::ElasticsearchConfig;
use crate::contract::{AdapterError, MappingSource};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDefinitionNode {
    pub field_type: Option<String>,
    pub properties: Option<BTreeMap<String, FieldDefinitionNode>>,
}

/// How the flattener treats a node. `type` wins over `properties` when both are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind<'a> {
    Leaf(&'a str),
    Container(&'a BTreeMap<String, FieldDefinitionNode>),
    Malformed,
}

impl FieldDefinitionNode {
    pub fn leaf(field_type: impl Into<String>) -> Self {
        Self {
            field_type: Some(field_type.into()),
            properties: None,
        }
    }

    pub fn container<I, K>(children: I) -> Self
    where
        I: IntoIterator<Item = (K, FieldDefinitionNode)>,
        K: Into<String>,
    {
        Self {
            field_type: None,
            properties: Some(children.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    /// Build a node from arbitrary JSON. Non-object values and non-string `type`
    /// tags yield nodes the flattener reports as [`NodeKind::Malformed`]. A `type`
    /// key decides the node on its own, so `properties` next to a bad tag are dropped.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        if let Some(tag) = obj.get("type") {
            return Self {
                field_type: tag.as_str().map(str::to_owned),
                properties: None,
            };
        }
        let properties = obj.get("properties").and_then(Value::as_object).map(|props| {
            props
                .iter()
                .map(|(name, child)| (name.clone(), Self::from_value(child)))
                .collect()
        });
        Self {
            field_type: None,
            properties,
        }
    }

    pub fn kind(&self) -> NodeKind<'_> {
        match (&self.field_type, &self.properties) {
            (Some(t), _) => NodeKind::Leaf(t),
            (None, Some(children)) => NodeKind::Container(children),
            (None, None) => NodeKind::Malformed,
        }
    }
}

impl<'de> Deserialize<'de> for FieldDefinitionNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

/// Locate the root node of `index` inside a get-mapping response.
///
/// Accepts both response shapes:
/// - typeless (ES 7+): `{index: {mappings: {properties: ...}}}`
/// - typed (ES 6): `{index: {mappings: {<doc_type>: {properties: ...}}}}`
///
/// The response must carry an entry keyed by `index`, otherwise the lookup fails
/// with [`AdapterError::UnknownIndex`].
pub fn extract_mapping_root(
    response: &Value,
    index: &str,
    doc_type: &str,
) -> Result<FieldDefinitionNode, AdapterError> {
    let entry = response
        .get(index)
        .ok_or_else(|| AdapterError::UnknownIndex(index.to_string()))?;
    root_from_entry(entry, index, doc_type)
}

/// Like [`extract_mapping_root`], for responses of a server that already resolved
/// `index`. An alias comes back keyed by its concrete index, so a response with a
/// single entry is accepted under any key.
pub fn extract_resolved_mapping_root(
    response: &Value,
    index: &str,
    doc_type: &str,
) -> Result<FieldDefinitionNode, AdapterError> {
    if response.get(index).is_some() {
        return extract_mapping_root(response, index, doc_type);
    }
    match response.as_object() {
        Some(obj) if obj.len() == 1 => {
            let (concrete, entry) = obj
                .iter()
                .next()
                .ok_or_else(|| AdapterError::UnknownIndex(index.to_string()))?;
            debug!(index, concrete = %concrete, "Resolved index alias");
            root_from_entry(entry, index, doc_type)
        }
        _ => Err(AdapterError::UnknownIndex(index.to_string())),
    }
}

fn root_from_entry(
    entry: &Value,
    index: &str,
    doc_type: &str,
) -> Result<FieldDefinitionNode, AdapterError> {
    let mappings = entry.get("mappings").unwrap_or(&Value::Null);
    let root = if mappings.get("properties").is_some() {
        mappings
    } else {
        mappings.get(doc_type).unwrap_or(&Value::Null)
    };
    non_empty_root(root, index)
}

fn non_empty_root(root: &Value, index: &str) -> Result<FieldDefinitionNode, AdapterError> {
    match root.as_object() {
        Some(obj) if !obj.is_empty() => Ok(FieldDefinitionNode::from_value(root)),
        _ => {
            error!(index, "Mapping items are empty");
            Err(AdapterError::EmptyMapping(index.to_string()))
        }
    }
}

/// Reads the mapping from a JSON dump file. The dump may hold either the bare root
/// node (an object with `properties`) or a whole get-mapping response.
#[derive(Debug, Clone)]
pub struct StaticFileSource {
    path: PathBuf,
    doc_type: String,
}

impl StaticFileSource {
    pub fn new(path: impl Into<PathBuf>, doc_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            doc_type: doc_type.into(),
        }
    }
}

#[async_trait]
impl MappingSource for StaticFileSource {
    async fn fetch_mapping(&self, index: &str) -> Result<FieldDefinitionNode, AdapterError> {
        info!(path = %self.path.display(), index, "Reading mapping dump");
        let content = fs::read_to_string(&self.path).map_err(|source| {
            error!(error = ?source, path = %self.path.display(), "Failed to read mapping dump");
            AdapterError::Io {
                path: self.path.clone(),
                source,
            }
        })?;
        let document: Value = serde_json::from_str(&content).map_err(|e| {
            error!(error = ?e, path = %self.path.display(), "Mapping dump is not valid JSON");
            AdapterError::Parse(e)
        })?;

        if document.as_object().is_some_and(|obj| obj.is_empty()) {
            error!(path = %self.path.display(), index, "Mapping dump is empty");
            return Err(AdapterError::EmptyMapping(index.to_string()));
        }
        if document.get("properties").is_some() {
            non_empty_root(&document, index)
        } else {
            extract_mapping_root(&document, index, &self.doc_type)
        }
    }
}

/// Fetches the mapping from a running Elasticsearch/OpenSearch cluster.
pub struct ElasticsearchSource {
    client: reqwest::Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    doc_type: String,
}

impl ElasticsearchSource {
    pub fn new(config: &ElasticsearchConfig) -> Result<Self, AdapterError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.verify_certs)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|source| AdapterError::Connection {
                url: config.url.clone(),
                source,
            })?;
        debug!(
            url = %config.url,
            verify_certs = config.verify_certs,
            "Connecting to elasticsearch using client"
        );
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            doc_type: config.doc_type.clone(),
        })
    }
}

#[async_trait]
impl MappingSource for ElasticsearchSource {
    async fn fetch_mapping(&self, index: &str) -> Result<FieldDefinitionNode, AdapterError> {
        let url = format!("{}/{}/_mapping", self.base_url, index);
        info!(url = %url, "Fetching index mapping");

        let mut request = self.client.get(&url);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_ref());
        }

        let response = request.send().await.map_err(|source| {
            error!(error = ?source, url = %url, "There is some problem connecting to es");
            AdapterError::Connection {
                url: url.clone(),
                source,
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| AdapterError::Connection {
                url: url.clone(),
                source,
            })?;

        if status == reqwest::StatusCode::NOT_FOUND {
            error!(index, url = %url, "Index not found");
            return Err(AdapterError::UnknownIndex(index.to_string()));
        }
        if !status.is_success() {
            error!(status = %status, url = %url, "Mapping lookup returned error. Response body: {body}");
            return Err(AdapterError::Status {
                index: index.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let document: Value = serde_json::from_str(&body)?;
        extract_resolved_mapping_root(&document, index, &self.doc_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_takes_precedence_over_properties() {
        let node = FieldDefinitionNode::from_value(&json!({
            "type": "nested",
            "properties": { "x": { "type": "keyword" } }
        }));
        assert_eq!(node.kind(), NodeKind::Leaf("nested"));
    }

    #[test]
    fn non_string_type_is_malformed() {
        let node = FieldDefinitionNode::from_value(&json!({ "type": { "nope": 1 } }));
        assert_eq!(node.kind(), NodeKind::Malformed);
        assert_eq!(FieldDefinitionNode::from_value(&json!("keyword")).kind(), NodeKind::Malformed);
    }

    #[test]
    fn extracts_typed_and_typeless_mappings() {
        let typed = json!({ "git": { "mappings": { "items": { "properties": { "a": { "type": "keyword" } } } } } });
        let typeless = json!({ "git": { "mappings": { "properties": { "a": { "type": "keyword" } } } } });
        let expected = FieldDefinitionNode::container([("a", FieldDefinitionNode::leaf("keyword"))]);

        assert_eq!(extract_mapping_root(&typed, "git", "items").unwrap(), expected);
        assert_eq!(extract_mapping_root(&typeless, "git", "items").unwrap(), expected);
    }

    #[test]
    fn non_string_type_with_properties_is_malformed() {
        let node = FieldDefinitionNode::from_value(&json!({
            "type": 7,
            "properties": { "x": { "type": "keyword" } }
        }));
        assert_eq!(node.kind(), NodeKind::Malformed);
    }

    #[test]
    fn alias_resolves_to_single_concrete_index() {
        let response = json!({ "git_20200101": { "mappings": { "properties": { "a": { "type": "long" } } } } });
        let root = extract_resolved_mapping_root(&response, "git", "items").unwrap();
        assert_eq!(root, FieldDefinitionNode::container([("a", FieldDefinitionNode::leaf("long"))]));

        assert!(matches!(
            extract_mapping_root(&response, "git", "items"),
            Err(AdapterError::UnknownIndex(index)) if index == "git"
        ));
    }

    #[test]
    fn missing_index_and_empty_mappings_are_refused() {
        let two = json!({ "a": {}, "b": {} });
        assert!(matches!(
            extract_mapping_root(&two, "git", "items"),
            Err(AdapterError::UnknownIndex(_))
        ));

        let empty = json!({ "git": { "mappings": {} } });
        assert!(matches!(
            extract_mapping_root(&empty, "git", "items"),
            Err(AdapterError::EmptyMapping(_))
        ));
    }
}
