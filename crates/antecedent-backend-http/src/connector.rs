use antecedent_backend::{BackendError, ConnectionConfig, Connector, ResourceClient, SchemaDiscovery};

use crate::client::HttpClient;
use crate::discovery::HttpDiscovery;
use crate::transport::Transport;

/// Opens HTTP handles from a [`ConnectionConfig`].
#[derive(Debug, Clone)]
pub struct HttpConnector {
    config: ConnectionConfig,
}

impl HttpConnector {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Builds a concrete client, for callers that want the HTTP type.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Configuration` for an unusable server URL or
    /// TLS setup.
    pub fn http_client(&self) -> Result<HttpClient, BackendError> {
        Ok(HttpClient::new(Transport::from_config(&self.config)?))
    }
}

impl Connector for HttpConnector {
    fn client(&self) -> Result<Box<dyn ResourceClient>, BackendError> {
        Ok(Box::new(self.http_client()?))
    }

    fn discovery(&self) -> Result<Box<dyn SchemaDiscovery>, BackendError> {
        let transport = Transport::from_config(&self.config)?;
        Ok(Box::new(HttpDiscovery::new(transport)))
    }
}
