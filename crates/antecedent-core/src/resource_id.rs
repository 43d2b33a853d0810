//! Logical identifier of the release that owns a set of resources.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Namespace placeholder used for cluster-scoped identifiers.
pub const CLUSTER_SCOPE: &str = "<cluster>";

/// Errors that can occur while parsing a [`ResourceId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceIdError {
    #[error("resource id {0:?} is not of the form <namespace>:<kind>/<name>")]
    Malformed(String),

    #[error("resource id {id:?} has an empty {segment}")]
    EmptySegment { id: String, segment: &'static str },
}

/// Identifier of a release, serialised as `<namespace>:<kind>/<name>`.
///
/// Kinds are lower-cased on construction so that `HelmRelease` and
/// `helmrelease` produce the same identifier. Two identifiers own the same
/// resources exactly when their string forms are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId {
    namespace: String,
    kind: String,
    name: String,
}

impl ResourceId {
    pub fn new(namespace: impl Into<String>, kind: impl AsRef<str>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            kind: kind.as_ref().to_lowercase(),
            name: name.into(),
        }
    }

    /// Identifier of a cluster-scoped owner.
    pub fn cluster_scoped(kind: impl AsRef<str>, name: impl Into<String>) -> Self {
        Self::new(CLUSTER_SCOPE, kind, name)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_cluster_scoped(&self) -> bool {
        self.namespace == CLUSTER_SCOPE
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.namespace, self.kind, self.name)
    }
}

impl FromStr for ResourceId {
    type Err = ResourceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, rest) = s
            .split_once(':')
            .ok_or_else(|| ResourceIdError::Malformed(s.to_string()))?;
        let (kind, name) = rest
            .split_once('/')
            .ok_or_else(|| ResourceIdError::Malformed(s.to_string()))?;

        for (segment, value) in [("namespace", namespace), ("kind", kind), ("name", name)] {
            if value.is_empty() {
                return Err(ResourceIdError::EmptySegment {
                    id: s.to_string(),
                    segment,
                });
            }
        }
        if name.contains('/') {
            return Err(ResourceIdError::Malformed(s.to_string()));
        }

        Ok(Self::new(namespace, kind, name))
    }
}

impl TryFrom<String> for ResourceId {
    type Error = ResourceIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.to_string()
    }
}
