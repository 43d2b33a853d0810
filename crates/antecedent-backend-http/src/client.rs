use antecedent_backend::{ApiResource, BackendError, ResourceClient};
use async_trait::async_trait;
use serde_json::Value;

use crate::transport::Transport;

/// Object client for a Kubernetes-style API server.
#[derive(Debug, Clone)]
pub struct HttpClient {
    transport: Transport,
}

impl HttpClient {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }
}

/// Builds the request path of a single object.
///
/// The core group lives under `/api/<version>`, every other group under
/// `/apis/<group>/<version>`. Cluster-scoped resources never carry a
/// namespace segment.
pub(crate) fn object_path(resource: &ApiResource, namespace: Option<&str>, name: &str) -> String {
    let mut path = if resource.group.is_empty() {
        format!("/api/{}", resource.version)
    } else {
        format!("/apis/{}/{}", resource.group, resource.version)
    };
    if resource.is_namespaced()
        && let Some(ns) = namespace.filter(|ns| !ns.is_empty())
    {
        path.push_str(&format!("/namespaces/{ns}"));
    }
    path.push_str(&format!("/{}/{}", resource.plural, name));
    path
}

#[async_trait]
impl ResourceClient for HttpClient {
    async fn get(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Value, BackendError> {
        self.transport
            .get(&object_path(resource, namespace, name))
            .await
    }

    async fn patch(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
        merge_patch: &Value,
    ) -> Result<Value, BackendError> {
        self.transport
            .merge_patch(&object_path(resource, namespace, name), merge_patch)
            .await
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use antecedent_backend::ResourceScope;

    use super::*;

    fn resource(group: &str, plural: &str, scope: ResourceScope) -> ApiResource {
        ApiResource {
            group: group.to_string(),
            version: "v1".to_string(),
            kind: "Irrelevant".to_string(),
            plural: plural.to_string(),
            scope,
        }
    }

    #[test]
    fn test_object_paths() {
        assert_eq!(
            object_path(&resource("", "configmaps", ResourceScope::Namespaced), Some("ns"), "cm"),
            "/api/v1/namespaces/ns/configmaps/cm"
        );
        assert_eq!(
            object_path(&resource("apps", "deployments", ResourceScope::Namespaced), Some("ns"), "web"),
            "/apis/apps/v1/namespaces/ns/deployments/web"
        );
        assert_eq!(
            object_path(
                &resource("rbac.authorization.k8s.io", "clusterroles", ResourceScope::Cluster),
                Some("ns"),
                "reader"
            ),
            "/apis/rbac.authorization.k8s.io/v1/clusterroles/reader"
        );
        assert_eq!(
            object_path(&resource("", "namespaces", ResourceScope::Cluster), None, "shop"),
            "/api/v1/namespaces/shop"
        );
    }
}
