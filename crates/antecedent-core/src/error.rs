//! Error types for ownership verification and claiming.

use std::fmt;

use antecedent_backend::BackendError;

use crate::manifest::{ResourceDescriptor, ResourceRef};
use crate::retry;

/// Errors that abort a verify or claim call.
///
/// Per-resource failures while claiming are not errors; they are reported
/// through [`crate::ClaimReport`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum OwnershipError {
    /// A backend handle could not be opened.
    #[error("Failed to construct backend client: {0}")]
    BackendConstruction(#[source] BackendError),

    /// The server's resource types could not be listed.
    #[error("Failed to discover server resource types: {0}")]
    SchemaDiscovery(#[source] BackendError),

    /// Reading an object failed terminally or retries ran out.
    #[error("Failed to fetch {resource}: {source}")]
    Fetch {
        resource: ResourceRef,
        #[source]
        source: BackendError,
    },
}

impl OwnershipError {
    pub fn fetch(descriptor: &ResourceDescriptor, source: BackendError) -> Self {
        Self::Fetch {
            resource: descriptor.reference(),
            source,
        }
    }

    /// The underlying backend failure.
    pub fn backend_error(&self) -> &BackendError {
        match self {
            Self::BackendConstruction(err) | Self::SchemaDiscovery(err) => err,
            Self::Fetch { source, .. } => source,
        }
    }

    /// Returns `true` if a fetch kept failing with retryable errors until the
    /// retry schedule ran out.
    pub fn retries_exhausted(&self) -> bool {
        matches!(self, Self::Fetch { source, .. } if retry::is_transient(source))
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::BackendConstruction(_) => ErrorCategory::Connection,
            Self::SchemaDiscovery(_) => ErrorCategory::Discovery,
            Self::Fetch { .. } if self.retries_exhausted() => ErrorCategory::RetriesExhausted,
            Self::Fetch { .. } => ErrorCategory::Fetch,
        }
    }
}

/// Categories of ownership errors for logging and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Connection,
    Discovery,
    Fetch,
    RetriesExhausted,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection => write!(f, "connection"),
            Self::Discovery => write!(f, "discovery"),
            Self::Fetch => write!(f, "fetch"),
            Self::RetriesExhausted => write!(f, "retries_exhausted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn descriptor() -> ResourceDescriptor {
        ResourceDescriptor::from_value(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": "settings", "namespace": "shop"}
        }))
        .unwrap()
    }

    #[test]
    fn test_fetch_error_display() {
        let err = OwnershipError::fetch(&descriptor(), BackendError::not_found("configmaps", "settings"));
        assert_eq!(
            err.to_string(),
            "Failed to fetch shop/ConfigMap/settings: API error 404 (NotFound): configmaps \"settings\" not found"
        );
        assert!(err.backend_error().is_not_found());
    }

    #[test]
    fn test_retries_exhausted() {
        let terminal = OwnershipError::fetch(&descriptor(), BackendError::not_found("configmaps", "settings"));
        assert!(!terminal.retries_exhausted());
        assert_eq!(terminal.category(), ErrorCategory::Fetch);

        let transient = OwnershipError::fetch(&descriptor(), BackendError::internal("etcd"));
        assert!(transient.retries_exhausted());
        assert_eq!(transient.category(), ErrorCategory::RetriesExhausted);
    }

    #[test]
    fn test_category() {
        let err = OwnershipError::BackendConstruction(BackendError::configuration("bad url"));
        assert_eq!(err.category(), ErrorCategory::Connection);
        assert!(!err.retries_exhausted());

        let err = OwnershipError::SchemaDiscovery(BackendError::internal("down"));
        assert_eq!(err.category().to_string(), "discovery");
    }
}
