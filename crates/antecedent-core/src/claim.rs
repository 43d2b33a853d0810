//! Stamping a release's live objects with its identifier.

use antecedent_backend::{BackendError, DynConnector};
use serde_json::{Map, Value};

use crate::ANTECEDENT_ANNOTATION;
use crate::error::OwnershipError;
use crate::manifest::{ReleaseManifest, ResourceRef};
use crate::mapper::ResourceMapper;
use crate::resource_id::ResourceId;

/// What happened to one descriptor during a claim.
#[derive(Debug, Clone)]
pub enum ClaimStatus {
    Annotated,
    /// The server serves no type for this kind.
    Unresolved { gvk: String },
    /// The descriptor has no `metadata.name`.
    Unnamed,
    PatchFailed(BackendError),
}

impl ClaimStatus {
    pub fn is_annotated(&self) -> bool {
        matches!(self, Self::Annotated)
    }
}

#[derive(Debug, Clone)]
pub struct ClaimOutcome {
    pub resource: ResourceRef,
    pub status: ClaimStatus,
}

/// Per-descriptor outcomes of a claim, in manifest order.
#[derive(Debug, Clone, Default)]
pub struct ClaimReport {
    outcomes: Vec<ClaimOutcome>,
}

impl ClaimReport {
    pub fn outcomes(&self) -> &[ClaimOutcome] {
        &self.outcomes
    }

    pub fn annotated(&self) -> impl Iterator<Item = &ClaimOutcome> {
        self.outcomes.iter().filter(|o| o.status.is_annotated())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ClaimOutcome> {
        self.outcomes.iter().filter(|o| !o.status.is_annotated())
    }

    /// `true` when every descriptor was annotated.
    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }

    fn push(&mut self, resource: ResourceRef, status: ClaimStatus) {
        self.outcomes.push(ClaimOutcome { resource, status });
    }
}

/// Writes a release's identifier into the annotation of its live objects.
pub struct OwnershipWriter {
    connector: DynConnector,
}

impl OwnershipWriter {
    pub fn new(connector: DynConnector) -> Self {
        Self { connector }
    }

    /// Annotates every resource of the release with `id`.
    ///
    /// Best effort: a resource that cannot be resolved or patched is logged,
    /// recorded in the report and skipped. Patches are not retried.
    /// Re-running a claim with the same identifier leaves objects unchanged.
    ///
    /// # Errors
    ///
    /// Fails only if a backend handle cannot be opened or discovery fails,
    /// in which case nothing is patched.
    pub async fn claim(
        &self,
        release: &ReleaseManifest,
        id: &ResourceId,
    ) -> Result<ClaimReport, OwnershipError> {
        let client = self
            .connector
            .client()
            .map_err(OwnershipError::BackendConstruction)?;
        tracing::debug!(backend = client.backend_name(), "Opened backend for claim");
        let mapper = ResourceMapper::discover(self.connector.as_ref()).await?;
        let patch = annotation_patch(id);
        let mut report = ClaimReport::default();

        for descriptor in release.descriptors() {
            let reference = descriptor.reference();
            let Some((resource, namespace)) = mapper.locate(&descriptor) else {
                let gvk = descriptor.group_version_kind().to_string();
                tracing::warn!(resource = %reference, gvk = %gvk, "Cannot annotate resource of unknown kind");
                report.push(reference, ClaimStatus::Unresolved { gvk });
                continue;
            };
            if descriptor.name().is_empty() {
                tracing::warn!(kind = descriptor.kind(), "Cannot annotate resource without a name");
                report.push(reference, ClaimStatus::Unnamed);
                continue;
            }

            match client.patch(resource, namespace, descriptor.name(), &patch).await {
                Ok(_) => report.push(reference, ClaimStatus::Annotated),
                Err(err) => {
                    tracing::warn!(
                        resource = %reference,
                        error = %err,
                        category = %err.category(),
                        "Failed to annotate resource"
                    );
                    report.push(reference, ClaimStatus::PatchFailed(err));
                }
            }
        }

        tracing::info!(
            release = %id,
            annotated = report.annotated().count(),
            failed = report.failures().count(),
            "Claimed release resources"
        );
        Ok(report)
    }
}

/// Merge patch setting only the ownership annotation.
fn annotation_patch(id: &ResourceId) -> Value {
    let mut annotations = Map::new();
    annotations.insert(ANTECEDENT_ANNOTATION.to_string(), Value::String(id.to_string()));
    let mut metadata = Map::new();
    metadata.insert("annotations".to_string(), Value::Object(annotations));
    let mut patch = Map::new();
    patch.insert("metadata".to_string(), Value::Object(metadata));
    Value::Object(patch)
}
