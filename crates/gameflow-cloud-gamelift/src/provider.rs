//! Amazon GameLift provider implementation

use crate::alias::AliasClient;
use crate::build::BuildClient;
use crate::fleet::FleetClient;
use crate::schema::{self, ALIAS, BUILD, FLEET};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_gamelift::Client;
use gameflow_cloud::{Provider, RemoteClient, SchemaCatalog};
use std::sync::Arc;
use std::time::Duration;

/// Amazon GameLift provider
///
/// Owns one SDK client shared by the per-type remote clients.
pub struct GameLiftProvider {
    catalog: SchemaCatalog,
    alias: Arc<AliasClient>,
    build: Arc<BuildClient>,
    fleet: Arc<FleetClient>,
    timeout: Option<Duration>,
}

impl GameLiftProvider {
    pub fn new(client: Client) -> Self {
        Self {
            catalog: schema::catalog(),
            alias: Arc::new(AliasClient::new(client.clone())),
            build: Arc::new(BuildClient::new(client.clone())),
            fleet: Arc::new(FleetClient::new(client)),
            timeout: None,
        }
    }

    /// Build from the AWS default credential and region chain
    pub async fn from_env(region: Option<String>, profile: Option<String>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        let config = loader.load().await;
        tracing::debug!(region = ?config.region(), "Loaded AWS configuration");
        Self::new(Client::new(&config))
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Provider for GameLiftProvider {
    fn name(&self) -> &str {
        "gamelift"
    }

    fn display_name(&self) -> &str {
        "Amazon GameLift"
    }

    fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    fn client(&self, resource_type: &str) -> Option<Arc<dyn RemoteClient>> {
        match resource_type {
            ALIAS => Some(self.alias.clone()),
            BUILD => Some(self.build.clone()),
            FLEET => Some(self.fleet.clone()),
            _ => None,
        }
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
