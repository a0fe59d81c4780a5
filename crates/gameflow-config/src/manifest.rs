//! Declarative resource manifest

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Provider connection settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderSettings {
    /// AWS region; the default chain decides when unset
    #[serde(default)]
    pub region: Option<String>,

    /// Named AWS profile
    #[serde(default)]
    pub profile: Option<String>,

    /// Per-call timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ProviderSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Attributes of one declared resource, as written in the file
pub type ResourceBody = BTreeMap<String, serde_json::Value>;

/// Parsed manifest
///
/// ```yaml
/// provider:
///   region: us-west-2
/// resources:
///   alias:
///     main:
///       name: alias1
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub provider: ProviderSettings,

    /// resource type → local name → attributes
    #[serde(default)]
    pub resources: BTreeMap<String, BTreeMap<String, ResourceBody>>,
}

impl Manifest {
    pub fn parse(content: &str, origin: &str) -> Result<Self> {
        // an empty file is an empty manifest
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let manifest: Manifest =
            serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
                path: origin.to_string(),
                source,
            })?;
        manifest.check()?;
        Ok(manifest)
    }

    fn check(&self) -> Result<()> {
        for (resource_type, instances) in &self.resources {
            for (name, body) in instances {
                if name.is_empty() || name.contains(':') {
                    return Err(ConfigError::InvalidManifest(format!(
                        "resource name '{}' of type {} must be non-empty and must not contain ':'",
                        name, resource_type
                    )));
                }
                if let Some((attribute, _)) = body.iter().find(|(_, v)| v.is_null()) {
                    return Err(ConfigError::InvalidManifest(format!(
                        "{}.{}: attribute {} has no value",
                        resource_type, name, attribute
                    )));
                }
            }
        }
        Ok(())
    }

    /// Declared instances as `(type, name, body)`
    pub fn instances(&self) -> impl Iterator<Item = (&str, &str, &ResourceBody)> {
        self.resources.iter().flat_map(|(resource_type, instances)| {
            instances
                .iter()
                .map(move |(name, body)| (resource_type.as_str(), name.as_str(), body))
        })
    }

    pub fn len(&self) -> usize {
        self.resources.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read and parse a manifest file
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)?;
    Manifest::parse(&content, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
provider:
  region: us-west-2
  timeout_secs: 300
resources:
  alias:
    main:
      name: alias1
      routing_strategy:
        - fleet_id: fleet-1
          type: SIMPLE
  fleet:
    arena:
      name: arena
      ec2_inbound_permissions:
        - from_port: 7777
          to_port: 7780
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::parse(SAMPLE, "test").unwrap();

        assert_eq!(manifest.provider.region.as_deref(), Some("us-west-2"));
        assert_eq!(manifest.provider.timeout(), Some(Duration::from_secs(300)));
        assert_eq!(manifest.provider.profile, None);
        assert_eq!(manifest.len(), 2);

        let alias = &manifest.resources["alias"]["main"];
        assert_eq!(alias["name"], serde_json::json!("alias1"));
        assert!(alias["routing_strategy"].is_array());

        let ports = &manifest.resources["fleet"]["arena"]["ec2_inbound_permissions"][0];
        assert_eq!(ports["from_port"], serde_json::json!(7777));
    }

    #[test]
    fn test_instances_iteration() {
        let manifest = Manifest::parse(SAMPLE, "test").unwrap();
        let keys: Vec<_> = manifest
            .instances()
            .map(|(resource_type, name, _)| format!("{}:{}", resource_type, name))
            .collect();
        assert_eq!(keys, vec!["alias:main", "fleet:arena"]);
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = Manifest::parse("   \n", "empty").unwrap();
        assert!(manifest.is_empty());
        assert_eq!(manifest.provider, ProviderSettings::default());
    }

    #[test]
    fn test_rejects_unknown_sections() {
        let err = Manifest::parse("providers:\n  region: x\n", "typo").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_rejects_invalid_names_and_null_values() {
        let err = Manifest::parse("resources:\n  alias:\n    'a:b':\n      name: x\n", "t")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidManifest(_)));

        let err = Manifest::parse("resources:\n  alias:\n    main:\n      name:\n", "t")
            .unwrap_err();
        assert!(err.to_string().contains("alias.main: attribute name has no value"));
    }

    #[test]
    fn test_load_manifest_from_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("gameflow.yaml");
        std::fs::write(&path, SAMPLE).unwrap();

        let manifest = load_manifest(&path).unwrap();
        assert_eq!(manifest.len(), 2);

        let missing = load_manifest(&temp_dir.path().join("missing.yaml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
