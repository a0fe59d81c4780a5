//! Provider abstraction and declared resource sets

use crate::client::RemoteClient;
use crate::codec::DesiredState;
use crate::error::{CloudError, Result};
use crate::reconciler::ResourceReconciler;
use crate::schema::ResourceSchema;
use crate::state::TrackedState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Ordered set of resource schemas
///
/// The order is the dependency order: resources are created in catalog
/// order and deleted in reverse.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    schemas: Vec<Arc<ResourceSchema>>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, schema: ResourceSchema) -> Self {
        self.schemas.push(Arc::new(schema));
        self
    }

    pub fn get(&self, resource_type: &str) -> Option<Arc<ResourceSchema>> {
        self.schemas
            .iter()
            .find(|s| s.resource_type == resource_type)
            .cloned()
    }

    pub fn require(&self, resource_type: &str) -> Result<Arc<ResourceSchema>> {
        self.get(resource_type)
            .ok_or_else(|| CloudError::UnknownResourceType(resource_type.to_string()))
    }

    pub fn resource_types(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.schemas.iter().map(|s| s.resource_type.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceSchema> {
        self.schemas.iter().map(|s| s.as_ref())
    }
}

/// Cloud provider abstraction trait
///
/// A provider knows the schemas of its resource types and hands out one
/// [`RemoteClient`] per type. Clients are injected into reconcilers; there is
/// no process-wide connection.
pub trait Provider: Send + Sync {
    /// Returns the provider name (e.g. "gamelift")
    fn name(&self) -> &str;

    /// Returns the provider display name for UI
    fn display_name(&self) -> &str;

    fn catalog(&self) -> &SchemaCatalog;

    fn client(&self, resource_type: &str) -> Option<Arc<dyn RemoteClient>>;

    /// Per-call timeout applied by reconcilers
    fn timeout(&self) -> Option<Duration> {
        None
    }

    /// Build a reconciler for one instance, resuming from `tracked`
    fn reconciler(
        &self,
        resource_type: &str,
        tracked: Option<TrackedState>,
    ) -> Result<ResourceReconciler> {
        let schema = self.catalog().require(resource_type)?;
        let client = self
            .client(resource_type)
            .ok_or_else(|| CloudError::UnknownResourceType(resource_type.to_string()))?;
        Ok(ResourceReconciler::new(schema, client)
            .with_tracked(tracked)
            .with_timeout(self.timeout()))
    }
}

/// Set of declared resources
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceSet {
    /// Resources indexed by `type:name`
    pub resources: BTreeMap<String, ResourceConfig>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, resource: ResourceConfig) {
        self.resources.insert(resource.key(), resource);
    }

    pub fn get(&self, resource_type: &str, name: &str) -> Option<&ResourceConfig> {
        self.resources.get(&resource_key(resource_type, name))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.resources.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceConfig> {
        self.resources.values()
    }

    pub fn by_type<'a>(&'a self, resource_type: &'a str) -> impl Iterator<Item = &'a ResourceConfig> {
        self.resources
            .values()
            .filter(move |r| r.resource_type == resource_type)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// State key of a resource
pub fn resource_key(resource_type: &str, name: &str) -> String {
    format!("{}:{}", resource_type, name)
}

/// One declared resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Resource type (e.g. "alias", "fleet")
    pub resource_type: String,

    /// Local name, unique per type
    pub name: String,

    pub desired: DesiredState,
}

impl ResourceConfig {
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        desired: DesiredState,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            desired,
        }
    }

    /// Get the full resource key (type:name)
    pub fn key(&self) -> String {
        resource_key(&self.resource_type, &self.name)
    }
}
