//! # antecedent-backend
//!
//! Backend abstraction layer for antecedent.
//!
//! This crate defines the traits and types every resource backend must
//! implement. It does not contain any implementations - those are provided
//! by `antecedent-backend-http` and `antecedent-backend-memory`.
//!
//! ## Overview
//!
//! - [`ResourceClient`] fetches and merge-patches individual objects.
//! - [`SchemaDiscovery`] enumerates the resource types the backend serves.
//! - [`Connector`] opens fresh handles of both from a connection config.
//!
//! ## Example
//!
//! ```ignore
//! use antecedent_backend::{ApiResource, BackendError, Connector};
//!
//! async fn read_deployment(
//!     connector: &dyn Connector,
//!     deployments: &ApiResource,
//! ) -> Result<serde_json::Value, BackendError> {
//!     let client = connector.client()?;
//!     client.get(deployments, Some("default"), "web").await
//! }
//! ```

mod config;
mod error;
mod traits;
mod types;

pub use config::ConnectionConfig;
pub use error::{BackendError, ErrorCategory, StatusReason};
pub use traits::{Connector, ResourceClient, SchemaDiscovery};
pub use types::{
    ApiResource, ApiResourceEntry, ApiResourceList, GroupVersion, GroupVersionKind, ResourceScope,
};

/// Type alias for a shareable connector trait object.
pub type DynConnector = std::sync::Arc<dyn Connector>;

