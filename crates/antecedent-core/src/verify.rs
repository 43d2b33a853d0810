//! Ownership verification against live objects.

use antecedent_backend::{BackendError, DynConnector, StatusReason};
use serde_json::Value;

use crate::ANTECEDENT_ANNOTATION;
use crate::error::OwnershipError;
use crate::manifest::{ReleaseManifest, ResourceRef};
use crate::mapper::ResourceMapper;
use crate::resource_id::ResourceId;
use crate::retry::{self, RetryPolicy};

/// Result of checking a release's resources for an existing claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnershipStatus {
    /// No live object of the release carries the annotation.
    Unclaimed,
    /// The first annotated live object, and whose claim it holds.
    Claimed {
        owner: String,
        matches_expected: bool,
        resource: ResourceRef,
    },
}

impl OwnershipStatus {
    /// `true` when the release may take over its resources: either nobody
    /// claimed them or the expected release did.
    pub fn is_owned_by_expected(&self) -> bool {
        match self {
            Self::Unclaimed => true,
            Self::Claimed {
                matches_expected, ..
            } => *matches_expected,
        }
    }

    /// The annotation value found, or `""` when unclaimed.
    pub fn annotation_value(&self) -> &str {
        self.owner().unwrap_or("")
    }

    pub fn owner(&self) -> Option<&str> {
        match self {
            Self::Unclaimed => None,
            Self::Claimed { owner, .. } => Some(owner),
        }
    }

    pub fn is_unclaimed(&self) -> bool {
        matches!(self, Self::Unclaimed)
    }
}

/// Reads the live counterparts of a release's resources and reports which
/// release, if any, has claimed them.
pub struct OwnershipVerifier {
    connector: DynConnector,
    retry: RetryPolicy,
}

impl OwnershipVerifier {
    pub fn new(connector: DynConnector) -> Self {
        Self {
            connector,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Checks whether the release's resources are claimed by `expected`.
    ///
    /// Descriptors are visited in manifest order and the first live object
    /// carrying the annotation decides the outcome; later objects are not
    /// read. Kinds the server does not serve are skipped. Reads are retried
    /// on transient failures.
    ///
    /// # Errors
    ///
    /// Fails if a backend handle cannot be opened, if discovery fails, or if
    /// reading any object fails terminally or exhausts its retries. A
    /// missing object and a descriptor without a name are terminal failures.
    pub async fn verify(
        &self,
        release: &ReleaseManifest,
        expected: &ResourceId,
    ) -> Result<OwnershipStatus, OwnershipError> {
        let client = self
            .connector
            .client()
            .map_err(OwnershipError::BackendConstruction)?;
        tracing::debug!(backend = client.backend_name(), "Opened backend for verification");
        let mapper = ResourceMapper::discover(self.connector.as_ref()).await?;
        let expected = expected.to_string();

        for descriptor in release.descriptors() {
            let Some((resource, namespace)) = mapper.locate(&descriptor) else {
                tracing::debug!(
                    resource = %descriptor.reference(),
                    gvk = %descriptor.group_version_kind(),
                    "Skipping resource with unknown kind"
                );
                continue;
            };
            if descriptor.name().is_empty() {
                tracing::warn!(resource = %descriptor.reference(), "Resource has no name");
                return Err(OwnershipError::fetch(
                    &descriptor,
                    BackendError::api(400, StatusReason::BadRequest, "resource name may not be empty"),
                ));
            }

            let object = retry::with_backoff(&self.retry, retry::classify_fetch_error, || {
                client.get(resource, namespace, descriptor.name())
            })
            .await
            .map_err(|err| OwnershipError::fetch(&descriptor, err))?;

            if let Some(owner) = annotation(&object) {
                let matches_expected = owner == expected;
                tracing::debug!(
                    resource = %descriptor.reference(),
                    owner,
                    matches_expected,
                    "Found ownership annotation"
                );
                return Ok(OwnershipStatus::Claimed {
                    owner: owner.to_string(),
                    matches_expected,
                    resource: descriptor.reference(),
                });
            }
        }

        Ok(OwnershipStatus::Unclaimed)
    }
}

fn annotation(object: &Value) -> Option<&str> {
    object
        .get("metadata")?
        .get("annotations")?
        .get(ANTECEDENT_ANNOTATION)?
        .as_str()
}
