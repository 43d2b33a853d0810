use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use antecedent_backend::{
    ApiResource, ApiResourceList, BackendError, Connector, GroupVersionKind, ResourceClient,
    SchemaDiscovery, StatusReason,
};
use dashmap::DashMap;
use serde_json::Value;

use crate::builtin::builtin_resources;
use crate::client::{MemoryClient, MemoryDiscovery};

/// Storage key of an object: resource group and plural, namespace, name.
///
/// Every served version of a resource addresses the same stored object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    pub group: String,
    pub plural: String,
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectKey {
    pub(crate) fn new(resource: &ApiResource, namespace: Option<&str>, name: &str) -> Self {
        Self {
            group: resource.group.clone(),
            plural: resource.plural.clone(),
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
        }
    }
}

/// Shared state behind every handle opened from a [`MemoryCluster`].
#[derive(Debug, Default)]
pub(crate) struct ClusterState {
    pub(crate) resources: RwLock<Vec<ApiResourceList>>,
    pub(crate) objects: DashMap<ObjectKey, Value>,
    pub(crate) get_faults: DashMap<ObjectKey, VecDeque<BackendError>>,
    pub(crate) patch_faults: DashMap<ObjectKey, BackendError>,
    pub(crate) discovery_fault: Mutex<Option<BackendError>>,
    pub(crate) connect_fault: Mutex<Option<BackendError>>,
    pub(crate) get_calls: AtomicUsize,
    pub(crate) patch_calls: AtomicUsize,
    pub(crate) connections: AtomicUsize,
}

/// In-memory API server.
///
/// Cloning is cheap; clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryCluster {
    pub(crate) state: Arc<ClusterState>,
}

impl MemoryCluster {
    /// Creates an empty cluster that serves no resource types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cluster serving [`builtin_resources`].
    pub fn with_builtin_resources() -> Self {
        let cluster = Self::new();
        for list in builtin_resources() {
            cluster.register(list);
        }
        cluster
    }

    /// Starts serving the resource types of `list`.
    pub fn register(&self, list: ApiResourceList) {
        self.state
            .resources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(list);
    }

    /// Resolves a served resource type by kind.
    pub fn resource_for(&self, api_version: &str, kind: &str) -> Option<ApiResource> {
        let wanted = GroupVersionKind::from_api_version_kind(api_version, kind);
        self.state
            .resources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .flat_map(|list| list.api_resources().collect::<Vec<_>>())
            .find(|resource| resource.group_version_kind() == wanted)
    }

    fn key_for(
        &self,
        api_version: &str,
        kind: &str,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<ObjectKey, BackendError> {
        let resource = self.resource_for(api_version, kind).ok_or_else(|| {
            BackendError::api(
                404,
                StatusReason::NotFound,
                format!(
                    "the server could not find the requested resource ({api_version}, Kind={kind})"
                ),
            )
        })?;
        let namespace = if resource.is_namespaced() {
            namespace
        } else {
            None
        };
        Ok(ObjectKey::new(&resource, namespace, name))
    }

    /// Stores an object, replacing any existing object with the same key.
    ///
    /// # Errors
    ///
    /// Returns an error if the object lacks `apiVersion`, `kind` or
    /// `metadata.name`, or its kind is not served.
    pub fn insert(&self, object: Value) -> Result<(), BackendError> {
        let field = |path: &[&str]| -> Option<String> {
            let mut cursor = &object;
            for segment in path {
                cursor = cursor.get(segment)?;
            }
            cursor.as_str().map(str::to_string)
        };
        let api_version = field(&["apiVersion"])
            .ok_or_else(|| BackendError::invalid_response("object has no apiVersion"))?;
        let kind =
            field(&["kind"]).ok_or_else(|| BackendError::invalid_response("object has no kind"))?;
        let name = field(&["metadata", "name"])
            .ok_or_else(|| BackendError::invalid_response("object has no metadata.name"))?;
        let namespace = field(&["metadata", "namespace"]);

        let key = self.key_for(&api_version, &kind, namespace.as_deref(), &name)?;
        tracing::trace!(kind = %kind, name = %name, "Stored object in memory cluster");
        self.state.objects.insert(key, object);
        Ok(())
    }

    /// Returns a copy of a stored object.
    pub fn object(
        &self,
        api_version: &str,
        kind: &str,
        namespace: Option<&str>,
        name: &str,
    ) -> Option<Value> {
        let key = self.key_for(api_version, kind, namespace, name).ok()?;
        self.state.objects.get(&key).map(|entry| entry.value().clone())
    }

    /// Returns an annotation of a stored object.
    pub fn annotation(
        &self,
        api_version: &str,
        kind: &str,
        namespace: Option<&str>,
        name: &str,
        key: &str,
    ) -> Option<String> {
        self.object(api_version, kind, namespace, name)?
            .get("metadata")?
            .get("annotations")?
            .get(key)?
            .as_str()
            .map(str::to_string)
    }

    /// Makes the next GETs of an object fail with `errors`, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is not served.
    pub fn fail_next_gets(
        &self,
        api_version: &str,
        kind: &str,
        namespace: Option<&str>,
        name: &str,
        errors: impl IntoIterator<Item = BackendError>,
    ) -> Result<(), BackendError> {
        let key = self.key_for(api_version, kind, namespace, name)?;
        self.state.get_faults.entry(key).or_default().extend(errors);
        Ok(())
    }

    /// Makes every PATCH of an object fail with `error`.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is not served.
    pub fn fail_patches(
        &self,
        api_version: &str,
        kind: &str,
        namespace: Option<&str>,
        name: &str,
        error: BackendError,
    ) -> Result<(), BackendError> {
        let key = self.key_for(api_version, kind, namespace, name)?;
        self.state.patch_faults.insert(key, error);
        Ok(())
    }

    /// Makes discovery fail until cleared with `None`.
    pub fn fail_discovery(&self, error: Option<BackendError>) {
        *self
            .state
            .discovery_fault
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = error;
    }

    /// Makes handle construction fail until cleared with `None`.
    pub fn fail_connect(&self, error: Option<BackendError>) {
        *self
            .state
            .connect_fault
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = error;
    }

    /// Number of GET requests served, including failed ones.
    pub fn get_calls(&self) -> usize {
        self.state.get_calls.load(Ordering::SeqCst)
    }

    /// Number of PATCH requests served, including failed ones.
    pub fn patch_calls(&self) -> usize {
        self.state.patch_calls.load(Ordering::SeqCst)
    }

    /// Number of handles opened through [`Connector`].
    pub fn connections(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }

    fn check_connect(&self) -> Result<(), BackendError> {
        let fault = self
            .state
            .connect_fault
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match fault {
            Some(err) => Err(err),
            None => {
                self.state.connections.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }
    }
}

impl Connector for MemoryCluster {
    fn client(&self) -> Result<Box<dyn ResourceClient>, BackendError> {
        self.check_connect()?;
        Ok(Box::new(MemoryClient::new(Arc::clone(&self.state))))
    }

    fn discovery(&self) -> Result<Box<dyn SchemaDiscovery>, BackendError> {
        self.check_connect()?;
        Ok(Box::new(MemoryDiscovery::new(Arc::clone(&self.state))))
    }
}
