//! GameLift alias client

use crate::error::{GameLiftError, remote_error};
use crate::fields::{self, Collector};
use crate::schema::ALIAS;
use async_trait::async_trait;
use aws_sdk_gamelift::Client;
use aws_sdk_gamelift::types::{Alias, RoutingStrategy, RoutingStrategyType};
use gameflow_cloud::{Attributes, RemoteClient, RemoteEntity, RemoteError, RemoteFields};

pub struct AliasClient {
    client: Client,
}

impl AliasClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn routing_strategy(fields: &RemoteFields) -> Option<RoutingStrategy> {
    let block = fields::block(fields.attributes(), "RoutingStrategy")?;
    Some(
        RoutingStrategy::builder()
            .set_fleet_id(fields::text(block, "FleetId"))
            .set_message(fields::text(block, "Message"))
            .set_type(fields::text(block, "Type").map(|t| RoutingStrategyType::from(t.as_str())))
            .build(),
    )
}

fn flatten_routing_strategy(strategy: &RoutingStrategy) -> Attributes {
    Collector::new()
        .text("FleetId", strategy.fleet_id())
        .text("Message", strategy.message())
        .text("Type", strategy.r#type().map(|t| t.as_str()))
        .into_attributes()
}

pub(crate) fn alias_entity(alias: Option<&Alias>) -> Result<RemoteEntity, GameLiftError> {
    let alias = alias.ok_or(GameLiftError::MissingIdentifier(ALIAS))?;
    let id = alias
        .alias_id()
        .ok_or(GameLiftError::MissingIdentifier(ALIAS))?;
    let fields = Collector::new()
        .text("Name", alias.name())
        .text("Description", alias.description())
        .block(
            "RoutingStrategy",
            alias.routing_strategy().map(flatten_routing_strategy),
        )
        .text("AliasArn", alias.alias_arn())
        .into_fields();
    Ok(RemoteEntity::new(id, fields))
}

#[async_trait]
impl RemoteClient for AliasClient {
    fn resource_type(&self) -> &str {
        ALIAS
    }

    async fn create(&self, fields: &RemoteFields) -> Result<RemoteEntity, RemoteError> {
        let attrs = fields.attributes();
        tracing::debug!("CreateAlias {:?}", fields::text(attrs, "Name"));
        let out = self
            .client
            .create_alias()
            .set_name(fields::text(attrs, "Name"))
            .set_description(fields::text(attrs, "Description"))
            .set_routing_strategy(routing_strategy(fields))
            .send()
            .await
            .map_err(|e| remote_error(ALIAS, e))?;
        Ok(alias_entity(out.alias())?)
    }

    async fn read(&self, id: &str) -> Result<RemoteEntity, RemoteError> {
        let out = self
            .client
            .describe_alias()
            .alias_id(id)
            .send()
            .await
            .map_err(|e| remote_error(id, e))?;
        Ok(alias_entity(out.alias())?)
    }

    async fn update(&self, id: &str, fields: &RemoteFields) -> Result<RemoteEntity, RemoteError> {
        let attrs = fields.attributes();
        let out = self
            .client
            .update_alias()
            .alias_id(id)
            .set_name(fields::text(attrs, "Name"))
            .set_description(fields::text(attrs, "Description"))
            .set_routing_strategy(routing_strategy(fields))
            .send()
            .await
            .map_err(|e| remote_error(id, e))?;
        Ok(alias_entity(out.alias())?)
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        self.client
            .delete_alias()
            .alias_id(id)
            .send()
            .await
            .map_err(|e| remote_error(id, e))?;
        Ok(())
    }
}
