//! In-memory resource backend for antecedent.
//!
//! This crate provides an in-memory implementation of the `ResourceClient`,
//! `SchemaDiscovery` and `Connector` traits from `antecedent-backend`, using
//! dashmap for concurrent access. Faults can be scripted per object so that
//! retry and failure-handling paths can be exercised deterministically.
//!
//! # Example
//!
//! ```ignore
//! use antecedent_backend_memory::MemoryCluster;
//! use antecedent_backend::{BackendError, Connector};
//!
//! let cluster = MemoryCluster::with_builtin_resources();
//! cluster.insert(serde_json::json!({
//!     "apiVersion": "v1",
//!     "kind": "ConfigMap",
//!     "metadata": {"name": "settings", "namespace": "default"}
//! }))?;
//!
//! // The next GET of the config map fails once with a 500
//! cluster.fail_next_gets("v1", "ConfigMap", Some("default"), "settings", [
//!     BackendError::internal("etcd leader changed"),
//! ])?;
//! ```

mod builtin;
mod client;
pub mod cluster;

pub use builtin::builtin_resources;
pub use client::{MemoryClient, MemoryDiscovery};
pub use cluster::{MemoryCluster, ObjectKey};
