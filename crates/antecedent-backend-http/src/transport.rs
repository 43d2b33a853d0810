use antecedent_backend::{BackendError, ConnectionConfig};
use serde_json::Value;
use url::Url;

use crate::response::{decode_response, map_transport_error};

/// Authenticated `reqwest` client bound to one API server.
#[derive(Debug, Clone)]
pub(crate) struct Transport {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl Transport {
    pub(crate) fn from_config(config: &ConnectionConfig) -> Result<Self, BackendError> {
        let parsed = Url::parse(&config.server).map_err(|e| {
            BackendError::configuration(format!("invalid server URL '{}': {e}", config.server))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BackendError::configuration(format!(
                "unsupported server URL scheme '{}'",
                parsed.scheme()
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.insecure_skip_tls_verify)
            .build()
            .map_err(|e| BackendError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.server.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let mut req = self.http.request(method, url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req.header("Accept", "application/json")
    }

    pub(crate) async fn get(&self, path: &str) -> Result<Value, BackendError> {
        let url = self.url(path);
        tracing::trace!(url = %url, "GET");
        let resp = self
            .request(reqwest::Method::GET, &url)
            .send()
            .await
            .map_err(map_transport_error)?;
        decode_response(resp).await
    }

    pub(crate) async fn merge_patch(&self, path: &str, body: &Value) -> Result<Value, BackendError> {
        let url = self.url(path);
        tracing::trace!(url = %url, "PATCH");
        let payload = serde_json::to_vec(body)
            .map_err(|e| BackendError::invalid_response(format!("unencodable patch: {e}")))?;
        let resp = self
            .request(reqwest::Method::PATCH, &url)
            .header("Content-Type", "application/merge-patch+json")
            .body(payload)
            .send()
            .await
            .map_err(map_transport_error)?;
        decode_response(resp).await
    }
}
