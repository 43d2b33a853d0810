//! Decomposition of multi-document release manifests.
//!
//! A manifest is split on YAML document separators and every document that
//! describes an object becomes a [`ResourceDescriptor`]. Descriptors keep the
//! whole object as a JSON map, so fields this crate knows nothing about pass
//! through untouched.

use std::fmt;
use std::sync::LazyLock;

use antecedent_backend::GroupVersionKind;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Document separator: `---` at the start of the text or of a line.
static DOCUMENT_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s*\n)---\s*").expect("Invalid document separator regex"));

/// The rendered manifest of a release together with its namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseManifest {
    manifest: String,
    namespace: String,
}

impl ReleaseManifest {
    pub fn new(manifest: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            manifest: manifest.into(),
            namespace: namespace.into(),
        }
    }

    pub fn manifest(&self) -> &str {
        &self.manifest
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Decomposes the manifest, defaulting empty namespaces to the release's.
    pub fn descriptors(&self) -> Vec<ResourceDescriptor> {
        decompose(&self.manifest)
            .into_iter()
            .map(|descriptor| descriptor.with_default_namespace(&self.namespace))
            .collect()
    }
}

/// A single object of a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceDescriptor {
    object: Map<String, Value>,
}

impl ResourceDescriptor {
    /// Wraps a decoded document.
    ///
    /// Returns `None` unless the value is a mapping with a non-empty `kind`.
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Object(object) = value else {
            return None;
        };
        let descriptor = Self { object };
        if descriptor.kind().is_empty() {
            return None;
        }
        Some(descriptor)
    }

    fn str_field(&self, key: &str) -> &str {
        self.object.get(key).and_then(Value::as_str).unwrap_or("")
    }

    fn metadata(&self) -> Option<&Map<String, Value>> {
        self.object.get("metadata").and_then(Value::as_object)
    }

    fn metadata_str(&self, key: &str) -> &str {
        self.metadata()
            .and_then(|m| m.get(key))
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    pub fn kind(&self) -> &str {
        self.str_field("kind")
    }

    pub fn api_version(&self) -> &str {
        self.str_field("apiVersion")
    }

    pub fn name(&self) -> &str {
        self.metadata_str("name")
    }

    /// The namespace, or `""` when the document names none.
    pub fn namespace(&self) -> &str {
        self.metadata_str("namespace")
    }

    /// Sets `metadata.namespace`, creating `metadata` if needed.
    pub fn set_namespace(&mut self, namespace: &str) {
        let metadata = self
            .object
            .entry("metadata")
            .or_insert_with(|| Value::Object(Map::new()));
        if !metadata.is_object() {
            *metadata = Value::Object(Map::new());
        }
        if let Value::Object(metadata) = metadata {
            metadata.insert("namespace".to_string(), Value::String(namespace.to_string()));
        }
    }

    /// Applies `namespace` only when the document leaves it empty.
    #[must_use]
    pub fn with_default_namespace(mut self, namespace: &str) -> Self {
        if self.namespace().is_empty() {
            self.set_namespace(namespace);
        }
        self
    }

    pub fn annotations(&self) -> Option<&Map<String, Value>> {
        self.metadata()
            .and_then(|m| m.get("annotations"))
            .and_then(Value::as_object)
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations()
            .and_then(|a| a.get(key))
            .and_then(Value::as_str)
    }

    pub fn group_version_kind(&self) -> GroupVersionKind {
        GroupVersionKind::from_api_version_kind(self.api_version(), self.kind())
    }

    pub fn reference(&self) -> ResourceRef {
        ResourceRef {
            api_version: self.api_version().to_string(),
            kind: self.kind().to_string(),
            namespace: Some(self.namespace())
                .filter(|ns| !ns.is_empty())
                .map(str::to_string),
            name: self.name().to_string(),
        }
    }

    pub fn as_object(&self) -> &Map<String, Value> {
        &self.object
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.object)
    }

    fn is_list(&self) -> bool {
        self.object.get("items").is_some_and(Value::is_array)
    }
}

/// Lightweight, printable identity of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRef {
    pub api_version: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub name: String,
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{ns}/{}/{}", self.kind, self.name),
            None => write!(f, "{}/{}", self.kind, self.name),
        }
    }
}

/// Splits manifest text into its non-blank YAML documents.
pub fn split_documents(manifest: &str) -> Vec<&str> {
    DOCUMENT_SEPARATOR
        .split(manifest.trim())
        .filter(|doc| !doc.trim().is_empty())
        .collect()
}

/// Turns manifest text into descriptors, in manifest order.
///
/// Documents that are not valid YAML objects with a `kind` are skipped.
/// List documents (anything carrying an `items` array) are replaced by
/// their members.
pub fn decompose(manifest: &str) -> Vec<ResourceDescriptor> {
    let mut descriptors = Vec::new();

    for (index, document) in split_documents(manifest).into_iter().enumerate() {
        let value: Value = match serde_yaml::from_str(document) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(document = index, error = %err, "Skipping unparsable manifest document");
                continue;
            }
        };
        let Some(descriptor) = ResourceDescriptor::from_value(value) else {
            tracing::debug!(document = index, "Skipping manifest document without a kind");
            continue;
        };

        if descriptor.is_list() {
            match expand_list(descriptor) {
                Ok(items) => descriptors.extend(items),
                Err(reason) => {
                    tracing::warn!(document = index, reason = %reason, "Skipping malformed list document");
                }
            }
            continue;
        }

        descriptors.push(descriptor);
    }

    descriptors
}

/// Expands a list document into its members.
///
/// Members missing `kind` take the list's kind without its `List` suffix
/// (`ConfigMapList` gives `ConfigMap`); members missing `apiVersion` take the
/// list's. The list is rejected as a whole if
/// any member is not an object or still has no kind.
fn expand_list(list: ResourceDescriptor) -> Result<Vec<ResourceDescriptor>, String> {
    let item_kind = list
        .kind()
        .strip_suffix("List")
        .unwrap_or(list.kind())
        .to_string();
    let list_api_version = list.api_version().to_string();

    let Some(Value::Array(items)) = list.object.get("items") else {
        return Ok(Vec::new());
    };

    items
        .iter()
        .enumerate()
        .map(|(position, item)| {
            let Value::Object(object) = item else {
                return Err(format!("item {position} is not an object"));
            };
            let mut object = object.clone();
            let has_kind = object.get("kind").and_then(Value::as_str).is_some_and(|k| !k.is_empty());
            let has_version = object
                .get("apiVersion")
                .and_then(Value::as_str)
                .is_some_and(|v| !v.is_empty());
            if !has_kind && !item_kind.is_empty() {
                object.insert("kind".to_string(), Value::String(item_kind.clone()));
            }
            if !has_version && !list_api_version.is_empty() {
                object.insert("apiVersion".to_string(), Value::String(list_api_version.clone()));
            }
            ResourceDescriptor::from_value(Value::Object(object))
                .ok_or_else(|| format!("item {position} has no kind"))
        })
        .collect()
}
