//! Discovery and addressing types shared by all backends.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An API group and version, e.g. `apps/v1` or the core group's `v1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct GroupVersion {
    /// The API group. Empty for the core group.
    pub group: String,
    /// The version within the group.
    pub version: String,
}

impl GroupVersion {
    /// Parses an `apiVersion` string.
    ///
    /// A value without a `/` names a version of the core group.
    #[must_use]
    pub fn parse(api_version: &str) -> Self {
        match api_version.split_once('/') {
            Some((group, version)) => Self {
                group: group.to_string(),
                version: version.to_string(),
            },
            None => Self {
                group: String::new(),
                version: api_version.to_string(),
            },
        }
    }

    /// Returns the `apiVersion` form of this group version.
    #[must_use]
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl fmt::Display for GroupVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.api_version())
    }
}

/// A fully qualified object kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    #[must_use]
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Builds a kind from an object's `apiVersion` and `kind` fields.
    #[must_use]
    pub fn from_api_version_kind(api_version: &str, kind: &str) -> Self {
        let gv = GroupVersion::parse(api_version);
        Self {
            group: gv.group,
            version: gv.version,
            kind: kind.to_string(),
        }
    }

    /// Returns the `apiVersion` form of this kind's group version.
    #[must_use]
    pub fn api_version(&self) -> String {
        GroupVersion {
            group: self.group.clone(),
            version: self.version.clone(),
        }
        .api_version()
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, Kind={}", self.api_version(), self.kind)
    }
}

/// Whether objects of a resource type live inside a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceScope {
    Namespaced,
    Cluster,
}

/// A backend-addressable resource type resolved from discovery.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApiResource {
    /// The API group. Empty for the core group.
    pub group: String,
    /// The served version.
    pub version: String,
    /// The object kind, e.g. `Deployment`.
    pub kind: String,
    /// The plural resource name used in request paths, e.g. `deployments`.
    pub plural: String,
    /// Whether the resource is namespaced or cluster-scoped.
    pub scope: ResourceScope,
}

impl ApiResource {
    /// Returns the kind this resource type serves.
    #[must_use]
    pub fn group_version_kind(&self) -> GroupVersionKind {
        GroupVersionKind::new(&self.group, &self.version, &self.kind)
    }

    /// Returns the `apiVersion` of objects of this type.
    #[must_use]
    pub fn api_version(&self) -> String {
        self.group_version_kind().api_version()
    }

    /// Returns `true` if objects of this type live in a namespace.
    #[must_use]
    pub fn is_namespaced(&self) -> bool {
        self.scope == ResourceScope::Namespaced
    }
}

impl fmt::Display for ApiResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}", self.plural)
        } else {
            write!(f, "{}.{}", self.plural, self.group)
        }
    }
}

/// One resource entry of an `APIResourceList` discovery document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResourceEntry {
    /// Plural name, or `plural/subresource` for subresources.
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub namespaced: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verbs: Vec<String>,
}

impl ApiResourceEntry {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: impl Into<String>, namespaced: bool) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            namespaced,
            verbs: Vec::new(),
        }
    }

    /// Returns `true` for entries such as `pods/status`.
    #[must_use]
    pub fn is_subresource(&self) -> bool {
        self.name.contains('/')
    }
}

/// The resources served for a single group version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResourceList {
    pub group_version: String,
    #[serde(default)]
    pub resources: Vec<ApiResourceEntry>,
}

impl ApiResourceList {
    #[must_use]
    pub fn new(group_version: impl Into<String>, resources: Vec<ApiResourceEntry>) -> Self {
        Self {
            group_version: group_version.into(),
            resources,
        }
    }

    /// Iterates over the addressable resource types, skipping subresources.
    pub fn api_resources(&self) -> impl Iterator<Item = ApiResource> + '_ {
        let gv = GroupVersion::parse(&self.group_version);
        self.resources
            .iter()
            .filter(|entry| !entry.is_subresource())
            .map(move |entry| ApiResource {
                group: gv.group.clone(),
                version: gv.version.clone(),
                kind: entry.kind.clone(),
                plural: entry.name.clone(),
                scope: if entry.namespaced {
                    ResourceScope::Namespaced
                } else {
                    ResourceScope::Cluster
                },
            })
    }
}
