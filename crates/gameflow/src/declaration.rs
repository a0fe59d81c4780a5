//! Manifest entries to declared resources

use anyhow::Context;
use gameflow_cloud::{DesiredState, ResourceConfig, ResourceSet, SchemaCatalog, resource_key};
use gameflow_config::{Manifest, ResourceBody};

pub fn desired_state(body: &ResourceBody) -> serde_json::Result<DesiredState> {
    serde_json::to_value(body).and_then(serde_json::from_value)
}

/// Declared resources of a manifest; unknown resource types are rejected
pub fn resource_set(manifest: &Manifest, catalog: &SchemaCatalog) -> anyhow::Result<ResourceSet> {
    let mut set = ResourceSet::new();
    for (resource_type, name, body) in manifest.instances() {
        catalog.require(resource_type)?;
        let desired = desired_state(body)
            .with_context(|| format!("invalid attributes in {}", resource_key(resource_type, name)))?;
        set.add(ResourceConfig::new(resource_type, name, desired));
    }
    Ok(set)
}
