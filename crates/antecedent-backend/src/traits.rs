//! Backend traits for the resource backend abstraction layer.
//!
//! This module defines the capabilities the ownership core consumes.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::BackendError;
use crate::types::{ApiResource, ApiResourceList};

/// Reads and merge-patches individual objects.
///
/// Implementations must be thread-safe (`Send + Sync`). `namespace` is
/// `None` for cluster-scoped resource types.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Fetches the live object.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` API error if the object does not exist, or any
    /// transport/API failure.
    async fn get(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Value, BackendError>;

    /// Applies a JSON merge patch (RFC 7396) and returns the patched object.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` API error if the object does not exist, or any
    /// transport/API failure.
    async fn patch(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
        merge_patch: &Value,
    ) -> Result<Value, BackendError>;

    /// Returns the name of this backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}

/// Enumerates the resource types a backend currently serves.
#[async_trait]
pub trait SchemaDiscovery: Send + Sync {
    /// Returns one list per served group version, preferred versions first.
    ///
    /// # Errors
    ///
    /// Returns an error if the served groups cannot be listed. Backends may
    /// leave out individual group versions that fail to answer.
    async fn server_resources(&self) -> Result<Vec<ApiResourceList>, BackendError>;
}

/// Opens fresh backend handles.
///
/// Every call returns a new handle; callers own it for the duration of a
/// single operation and drop it afterwards.
pub trait Connector: Send + Sync {
    /// Constructs a new object client.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Configuration` if the handle cannot be built.
    fn client(&self) -> Result<Box<dyn ResourceClient>, BackendError>;

    /// Constructs a new discovery client.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Configuration` if the handle cannot be built.
    fn discovery(&self) -> Result<Box<dyn SchemaDiscovery>, BackendError>;
}
