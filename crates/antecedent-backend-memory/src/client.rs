use std::sync::atomic::Ordering;
use std::sync::{Arc, PoisonError};

use antecedent_backend::{
    ApiResource, ApiResourceList, BackendError, ResourceClient, SchemaDiscovery,
};
use async_trait::async_trait;
use serde_json::Value;

use crate::cluster::{ClusterState, ObjectKey};

/// Object client over a [`crate::MemoryCluster`].
#[derive(Debug)]
pub struct MemoryClient {
    state: Arc<ClusterState>,
}

impl MemoryClient {
    pub(crate) fn new(state: Arc<ClusterState>) -> Self {
        Self { state }
    }

    fn next_get_fault(&self, key: &ObjectKey) -> Option<BackendError> {
        self.state
            .get_faults
            .get_mut(key)
            .and_then(|mut queue| queue.pop_front())
    }
}

#[async_trait]
impl ResourceClient for MemoryClient {
    async fn get(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Value, BackendError> {
        self.state.get_calls.fetch_add(1, Ordering::SeqCst);
        let key = ObjectKey::new(resource, namespace, name);

        if let Some(err) = self.next_get_fault(&key) {
            return Err(err);
        }

        self.state
            .objects
            .get(&key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| BackendError::not_found(resource, name))
    }

    async fn patch(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
        merge_patch: &Value,
    ) -> Result<Value, BackendError> {
        self.state.patch_calls.fetch_add(1, Ordering::SeqCst);
        let key = ObjectKey::new(resource, namespace, name);

        if let Some(err) = self.state.patch_faults.get(&key) {
            return Err(err.value().clone());
        }

        let mut entry = self
            .state
            .objects
            .get_mut(&key)
            .ok_or_else(|| BackendError::not_found(resource, name))?;
        json_patch::merge(entry.value_mut(), merge_patch);
        Ok(entry.value().clone())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Discovery client over a [`crate::MemoryCluster`].
#[derive(Debug)]
pub struct MemoryDiscovery {
    state: Arc<ClusterState>,
}

impl MemoryDiscovery {
    pub(crate) fn new(state: Arc<ClusterState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl SchemaDiscovery for MemoryDiscovery {
    async fn server_resources(&self) -> Result<Vec<ApiResourceList>, BackendError> {
        let fault = self
            .state
            .discovery_fault
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(err) = fault {
            return Err(err);
        }

        Ok(self
            .state
            .resources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}
