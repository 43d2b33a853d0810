//! HTTP resource backend for antecedent.
//!
//! Talks to a Kubernetes-style API server: discovery through `/api` and
//! `/apis`, object reads with `GET` and annotation writes with JSON merge
//! patches. Every [`HttpConnector`] call builds a new `reqwest::Client`, so
//! handles never outlive the operation that opened them.
//!
//! # Example
//!
//! ```ignore
//! use antecedent_backend::{ConnectionConfig, Connector};
//! use antecedent_backend_http::HttpConnector;
//!
//! let connector = HttpConnector::new(
//!     ConnectionConfig::new("https://10.0.0.1:6443").with_token(token),
//! );
//! let discovery = connector.discovery()?;
//! let lists = discovery.server_resources().await?;
//! ```

mod client;
mod connector;
mod discovery;
mod response;
mod transport;

pub use client::HttpClient;
pub use connector::HttpConnector;
pub use discovery::HttpDiscovery;
