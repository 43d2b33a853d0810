//! Kind to resource type resolution backed by live discovery.

use std::collections::HashMap;

use antecedent_backend::{ApiResource, ApiResourceList, Connector, GroupVersionKind};

use crate::error::OwnershipError;
use crate::manifest::ResourceDescriptor;

/// Table mapping object kinds to the resource types that serve them.
///
/// Built fresh for every verify or claim call, since the set of served
/// types can change between calls.
#[derive(Debug, Clone, Default)]
pub struct ResourceMapper {
    by_kind: HashMap<GroupVersionKind, ApiResource>,
    /// First (preferred) version seen per group and kind.
    preferred: HashMap<(String, String), ApiResource>,
}

impl ResourceMapper {
    /// Builds a table from discovery documents, preferred versions first.
    pub fn from_resource_lists(lists: &[ApiResourceList]) -> Self {
        let mut mapper = Self::default();
        for resource in lists.iter().flat_map(ApiResourceList::api_resources) {
            mapper
                .preferred
                .entry((resource.group.clone(), resource.kind.clone()))
                .or_insert_with(|| resource.clone());
            mapper
                .by_kind
                .entry(resource.group_version_kind())
                .or_insert(resource);
        }
        mapper
    }

    /// Opens a discovery handle and builds the table from it.
    ///
    /// # Errors
    ///
    /// Returns [`OwnershipError::BackendConstruction`] if the handle cannot
    /// be opened and [`OwnershipError::SchemaDiscovery`] if discovery fails.
    pub async fn discover(connector: &dyn Connector) -> Result<Self, OwnershipError> {
        let discovery = connector
            .discovery()
            .map_err(OwnershipError::BackendConstruction)?;
        let lists = discovery
            .server_resources()
            .await
            .map_err(OwnershipError::SchemaDiscovery)?;
        let mapper = Self::from_resource_lists(&lists);
        tracing::debug!(kinds = mapper.len(), "Built resource type table");
        Ok(mapper)
    }

    /// Resolves a kind. An empty version selects the preferred version.
    pub fn resolve(&self, gvk: &GroupVersionKind) -> Option<&ApiResource> {
        if gvk.version.is_empty() {
            return self.preferred.get(&(gvk.group.clone(), gvk.kind.clone()));
        }
        self.by_kind.get(gvk)
    }

    /// Resolves a descriptor's type and the namespace to address it in.
    ///
    /// The namespace is `None` for cluster-scoped types, whatever the
    /// descriptor says.
    pub fn locate<'a>(
        &'a self,
        descriptor: &'a ResourceDescriptor,
    ) -> Option<(&'a ApiResource, Option<&'a str>)> {
        let resource = self.resolve(&descriptor.group_version_kind())?;
        let namespace = resource
            .is_namespaced()
            .then(|| descriptor.namespace())
            .filter(|ns| !ns.is_empty());
        Some((resource, namespace))
    }

    pub fn len(&self) -> usize {
        self.by_kind.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }
}
