//! Release ownership tracking for externally deployed resources.
//!
//! A release claims the resources it deploys by writing its identifier into
//! the [`ANTECEDENT_ANNOTATION`] of every object in its manifest. Before a
//! reconciler adopts pre-existing objects it asks [`OwnershipVerifier`]
//! whether they are unclaimed, already claimed by the same release, or owned
//! by someone else; afterwards it stamps them with [`OwnershipWriter`].
//!
//! ```text
//!  manifest text ──► manifest::decompose ──► ResourceDescriptor*
//!                                                   │
//!  SchemaDiscovery ──► ResourceMapper ──────────────┤
//!                                                   ▼
//!                         OwnershipVerifier (GET + retry, first annotation wins)
//!                         OwnershipWriter   (merge-patch, per-resource outcomes)
//! ```
//!
//! The annotation is used instead of native owner references because it
//! has to work across namespaces.
//!
//! # Example
//!
//! ```ignore
//! use antecedent_core::{OwnershipVerifier, OwnershipWriter, ReleaseManifest, ResourceId};
//!
//! let release = ReleaseManifest::new(rendered_manifest, "shop");
//! let id: ResourceId = "shop:helmrelease/web".parse()?;
//!
//! let status = OwnershipVerifier::new(connector.clone()).verify(&release, &id).await?;
//! if status.is_owned_by_expected() {
//!     // upgrade the release, then claim everything it deployed
//!     let report = OwnershipWriter::new(connector).claim(&release, &id).await?;
//!     for failure in report.failures() {
//!         tracing::warn!(resource = %failure.resource, "not yet annotated");
//!     }
//! }
//! ```

pub mod claim;
pub mod error;
pub mod manifest;
pub mod mapper;
pub mod resource_id;
pub mod retry;
pub mod verify;

pub use claim::{ClaimOutcome, ClaimReport, ClaimStatus, OwnershipWriter};
pub use error::{ErrorCategory, OwnershipError};
pub use manifest::{ReleaseManifest, ResourceDescriptor, ResourceRef, decompose};
pub use mapper::ResourceMapper;
pub use resource_id::{ResourceId, ResourceIdError};
pub use retry::{Classification, RetryPolicy};
pub use verify::{OwnershipStatus, OwnershipVerifier};

/// Annotation recording which release most recently claimed a resource.
///
/// The value is the string form of a [`ResourceId`].
pub const ANTECEDENT_ANNOTATION: &str = "helm.fluxcd.io/antecedent";

/// Result type for ownership operations
pub type Result<T> = std::result::Result<T, OwnershipError>;
