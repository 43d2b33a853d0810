use antecedent_backend::{ApiResourceList, BackendError, SchemaDiscovery};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::transport::Transport;

/// `GET /api` response.
#[derive(Debug, Deserialize)]
struct ApiVersions {
    #[serde(default)]
    versions: Vec<String>,
}

/// `GET /apis` response.
#[derive(Debug, Deserialize)]
struct ApiGroupList {
    #[serde(default)]
    groups: Vec<ApiGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiGroup {
    name: String,
    #[serde(default)]
    versions: Vec<GroupVersionForDiscovery>,
    #[serde(default)]
    preferred_version: Option<GroupVersionForDiscovery>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupVersionForDiscovery {
    group_version: String,
}

impl ApiGroup {
    /// Group versions with the preferred one first.
    fn ordered_group_versions(&self) -> Vec<String> {
        let mut ordered = Vec::with_capacity(self.versions.len());
        if let Some(preferred) = &self.preferred_version {
            ordered.push(preferred.group_version.clone());
        }
        for version in &self.versions {
            if !ordered.contains(&version.group_version) {
                ordered.push(version.group_version.clone());
            }
        }
        ordered
    }
}

/// Discovery client for a Kubernetes-style API server.
#[derive(Debug, Clone)]
pub struct HttpDiscovery {
    transport: Transport,
}

impl HttpDiscovery {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    async fn fetch<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let value: Value = self.transport.get(path).await?;
        serde_json::from_value(value).map_err(|e| {
            BackendError::invalid_response(format!("malformed discovery document at {path}: {e}"))
        })
    }
}

#[async_trait]
impl SchemaDiscovery for HttpDiscovery {
    async fn server_resources(&self) -> Result<Vec<ApiResourceList>, BackendError> {
        let mut lists = Vec::new();

        let core: ApiVersions = self.fetch("/api").await?;
        for version in &core.versions {
            let list: ApiResourceList = self.fetch(&format!("/api/{version}")).await?;
            lists.push(list);
        }

        let groups: ApiGroupList = self.fetch("/apis").await?;
        for group in &groups.groups {
            // An unavailable group only hides its own kinds.
            for group_version in group.ordered_group_versions() {
                match self.fetch::<ApiResourceList>(&format!("/apis/{group_version}")).await {
                    Ok(list) => lists.push(list),
                    Err(err) => {
                        tracing::warn!(
                            group_version = %group_version,
                            error = %err,
                            "Skipping unavailable API group version"
                        );
                    }
                }
            }
            tracing::trace!(group = %group.name, "Discovered API group");
        }

        tracing::debug!(group_versions = lists.len(), "Completed schema discovery");
        Ok(lists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferred_version_first() {
        let group: ApiGroup = serde_json::from_value(serde_json::json!({
            "name": "autoscaling",
            "versions": [
                {"groupVersion": "autoscaling/v1", "version": "v1"},
                {"groupVersion": "autoscaling/v2", "version": "v2"}
            ],
            "preferredVersion": {"groupVersion": "autoscaling/v2", "version": "v2"}
        }))
        .unwrap();

        assert_eq!(
            group.ordered_group_versions(),
            vec!["autoscaling/v2".to_string(), "autoscaling/v1".to_string()]
        );
    }
}
