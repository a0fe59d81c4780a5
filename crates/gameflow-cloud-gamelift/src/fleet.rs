//! GameLift fleet client

use crate::error::{GameLiftError, Result, remote_error};
use crate::fields::{self, Collector};
use crate::schema::FLEET;
use async_trait::async_trait;
use aws_sdk_gamelift::Client;
use aws_sdk_gamelift::types::{
    Ec2InstanceType, FleetAttributes, IpPermission, IpProtocol, ProtectionPolicy,
    ResourceCreationLimitPolicy, RuntimeConfiguration, ServerProcess,
};
use gameflow_cloud::{Attributes, RemoteClient, RemoteEntity, RemoteError, RemoteFields};

pub struct FleetClient {
    client: Client,
}

impl FleetClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn ip_permissions(attrs: &Attributes) -> Result<Option<Vec<IpPermission>>> {
    let blocks = fields::blocks(attrs, "EC2InboundPermissions");
    if blocks.is_empty() {
        return Ok(None);
    }
    blocks
        .iter()
        .map(|block| {
            IpPermission::builder()
                .set_from_port(fields::integer(block, "FromPort")?)
                .set_to_port(fields::integer(block, "ToPort")?)
                .set_ip_range(fields::text(block, "IpRange"))
                .set_protocol(fields::text(block, "Protocol").map(|p| IpProtocol::from(p.as_str())))
                .build()
                .map_err(|source| GameLiftError::Incomplete {
                    shape: "inbound permission",
                    source,
                })
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn resource_creation_limit_policy(attrs: &Attributes) -> Result<Option<ResourceCreationLimitPolicy>> {
    let Some(block) = fields::block(attrs, "ResourceCreationLimitPolicy") else {
        return Ok(None);
    };
    Ok(Some(
        ResourceCreationLimitPolicy::builder()
            .set_new_game_sessions_per_creator(fields::integer(block, "NewGameSessionsPerCreator")?)
            .set_policy_period_in_minutes(fields::integer(block, "PolicyPeriodInMinutes")?)
            .build(),
    ))
}

fn runtime_configuration(attrs: &Attributes) -> Result<Option<RuntimeConfiguration>> {
    let Some(block) = fields::block(attrs, "RuntimeConfiguration") else {
        return Ok(None);
    };
    let processes = fields::blocks(block, "ServerProcesses")
        .iter()
        .map(|process| {
            ServerProcess::builder()
                .set_launch_path(fields::text(process, "LaunchPath"))
                .set_parameters(fields::text(process, "Parameters"))
                .set_concurrent_executions(fields::integer(process, "ConcurrentExecutions")?)
                .build()
                .map_err(|source| GameLiftError::Incomplete {
                    shape: "server process",
                    source,
                })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(
        RuntimeConfiguration::builder()
            .set_server_processes((!processes.is_empty()).then_some(processes))
            .set_game_session_activation_timeout_seconds(fields::integer(
                block,
                "GameSessionActivationTimeoutSeconds",
            )?)
            .set_max_concurrent_game_session_activations(fields::integer(
                block,
                "MaxConcurrentGameSessionActivations",
            )?)
            .build(),
    ))
}

fn protection_policy(attrs: &Attributes) -> Option<ProtectionPolicy> {
    fields::text(attrs, "NewGameSessionProtectionPolicy")
        .map(|p| ProtectionPolicy::from(p.as_str()))
}

fn flatten_limit_policy(policy: &ResourceCreationLimitPolicy) -> Attributes {
    Collector::new()
        .number("NewGameSessionsPerCreator", policy.new_game_sessions_per_creator())
        .number("PolicyPeriodInMinutes", policy.policy_period_in_minutes())
        .into_attributes()
}

/// Write-only members keep no trace in the described attributes.
pub(crate) fn fleet_entity(fleet: &FleetAttributes) -> Result<RemoteEntity> {
    let id = fleet
        .fleet_id()
        .ok_or(GameLiftError::MissingIdentifier(FLEET))?;
    let fields = Collector::new()
        .text("BuildId", fleet.build_id())
        .text("EC2InstanceType", fleet.instance_type().map(|t| t.as_str()))
        .text("Name", fleet.name())
        .text("Description", fleet.description())
        .strings("LogPaths", fleet.log_paths())
        .strings("MetricGroups", fleet.metric_groups())
        .text(
            "NewGameSessionProtectionPolicy",
            fleet.new_game_session_protection_policy().map(|p| p.as_str()),
        )
        .block(
            "ResourceCreationLimitPolicy",
            fleet.resource_creation_limit_policy().map(flatten_limit_policy),
        )
        .text("ServerLaunchParameters", fleet.server_launch_parameters())
        .text("ServerLaunchPath", fleet.server_launch_path())
        .text("FleetArn", fleet.fleet_arn())
        .text("OperatingSystem", fleet.operating_system().map(|os| os.as_str()))
        .text("Status", fleet.status().map(|s| s.as_str()))
        .into_fields();
    Ok(RemoteEntity::new(id, fields))
}

#[async_trait]
impl RemoteClient for FleetClient {
    fn resource_type(&self) -> &str {
        FLEET
    }

    async fn create(&self, fields: &RemoteFields) -> std::result::Result<RemoteEntity, RemoteError> {
        let attrs = fields.attributes();
        tracing::debug!("CreateFleet {:?}", fields::text(attrs, "Name"));
        let out = self
            .client
            .create_fleet()
            .set_name(fields::text(attrs, "Name"))
            .set_description(fields::text(attrs, "Description"))
            .set_build_id(fields::text(attrs, "BuildId"))
            .set_ec2_instance_type(
                fields::text(attrs, "EC2InstanceType").map(|t| Ec2InstanceType::from(t.as_str())),
            )
            .set_ec2_inbound_permissions(ip_permissions(attrs)?)
            .set_log_paths(fields::strings(attrs, "LogPaths"))
            .set_metric_groups(fields::strings(attrs, "MetricGroups"))
            .set_new_game_session_protection_policy(protection_policy(attrs))
            .set_peer_vpc_aws_account_id(fields::text(attrs, "PeerVpcAwsAccountId"))
            .set_peer_vpc_id(fields::text(attrs, "PeerVpcId"))
            .set_resource_creation_limit_policy(resource_creation_limit_policy(attrs)?)
            .set_runtime_configuration(runtime_configuration(attrs)?)
            .set_server_launch_parameters(fields::text(attrs, "ServerLaunchParameters"))
            .set_server_launch_path(fields::text(attrs, "ServerLaunchPath"))
            .send()
            .await
            .map_err(|e| remote_error(FLEET, e))?;
        let fleet = out
            .fleet_attributes()
            .ok_or(GameLiftError::MissingIdentifier(FLEET))?;
        Ok(fleet_entity(fleet)?)
    }

    async fn read(&self, id: &str) -> std::result::Result<RemoteEntity, RemoteError> {
        let out = self
            .client
            .describe_fleet_attributes()
            .fleet_ids(id)
            .send()
            .await
            .map_err(|e| remote_error(id, e))?;
        match out.fleet_attributes() {
            [] => Err(RemoteError::NotFound(id.to_string())),
            [fleet] => Ok(fleet_entity(fleet)?),
            many => Err(RemoteError::Api(format!(
                "expected exactly one fleet for {}, found {}",
                id,
                many.len()
            ))),
        }
    }

    async fn update(
        &self,
        id: &str,
        fields: &RemoteFields,
    ) -> std::result::Result<RemoteEntity, RemoteError> {
        let attrs = fields.attributes();
        self.client
            .update_fleet_attributes()
            .fleet_id(id)
            .set_name(fields::text(attrs, "Name"))
            .set_description(fields::text(attrs, "Description"))
            .set_metric_groups(fields::strings(attrs, "MetricGroups"))
            .set_new_game_session_protection_policy(protection_policy(attrs))
            .set_resource_creation_limit_policy(resource_creation_limit_policy(attrs)?)
            .send()
            .await
            .map_err(|e| remote_error(id, e))?;
        // the response only echoes the fleet id
        Ok(RemoteEntity::new(id, fields.clone()))
    }

    async fn delete(&self, id: &str) -> std::result::Result<(), RemoteError> {
        self.client
            .delete_fleet()
            .fleet_id(id)
            .send()
            .await
            .map_err(|e| remote_error(id, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;
    use aws_sdk_gamelift::types::FleetStatus;
    use gameflow_cloud::{DesiredState, Value, expand, flatten};

    fn block(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::scalar(*v)))
            .collect()
    }

    fn desired() -> DesiredState {
        DesiredState::new()
            .with("build_id", "build-1")
            .with("ec2_instance_type", "c5.large")
            .with("name", "arena")
            .with(
                "ec2_inbound_permissions",
                Value::Blocks(vec![
                    block(&[
                        ("from_port", "7777"),
                        ("to_port", "7780"),
                        ("ip_range", "0.0.0.0/0"),
                        ("protocol", "UDP"),
                    ]),
                    block(&[
                        ("from_port", "22"),
                        ("to_port", "22"),
                        ("ip_range", "10.0.0.0/8"),
                        ("protocol", "TCP"),
                    ]),
                ]),
            )
            .with(
                "runtime_configuration",
                Value::Blocks(vec![{
                    let mut rc = block(&[("max_concurrent_game_session_activations", "2")]);
                    rc.insert(
                        "server_process".to_string(),
                        Value::Blocks(vec![block(&[
                            ("concurrent_executions", "1"),
                            ("launch_path", "/local/game/server"),
                        ])]),
                    );
                    rc
                }]),
            )
    }

    #[test]
    fn test_inbound_permissions_keep_order() {
        let fields = expand(&desired(), &schema::fleet()).unwrap();
        let permissions = ip_permissions(fields.attributes()).unwrap().unwrap();

        assert_eq!(permissions.len(), 2);
        assert_eq!(permissions[0].from_port(), 7777);
        assert_eq!(permissions[0].protocol(), &IpProtocol::Udp);
        assert_eq!(permissions[1].ip_range(), "10.0.0.0/8");
    }

    #[test]
    fn test_runtime_configuration_from_fields() {
        let fields = expand(&desired(), &schema::fleet()).unwrap();
        let config = runtime_configuration(fields.attributes()).unwrap().unwrap();

        assert_eq!(config.max_concurrent_game_session_activations(), Some(2));
        assert_eq!(config.server_processes().len(), 1);
        assert_eq!(config.server_processes()[0].launch_path(), "/local/game/server");
        assert_eq!(config.server_processes()[0].concurrent_executions(), 1);
    }

    #[test]
    fn test_incomplete_server_process_is_rejected() {
        let mut process = Attributes::new();
        process.insert("LaunchPath".to_string(), Value::scalar("/local/game/server"));
        let mut rc = Attributes::new();
        rc.insert("ServerProcesses".to_string(), Value::Blocks(vec![process]));
        let mut attrs = Attributes::new();
        attrs.insert("RuntimeConfiguration".to_string(), Value::Block(rc));

        assert!(matches!(
            runtime_configuration(&attrs),
            Err(GameLiftError::Incomplete { shape: "server process", .. })
        ));
    }

    #[test]
    fn test_fleet_entity_flattens_into_schema() {
        let fleet = FleetAttributes::builder()
            .fleet_id("fleet-1")
            .build_id("build-1")
            .instance_type(Ec2InstanceType::C5Large)
            .name("arena")
            .metric_groups("default")
            .new_game_session_protection_policy(ProtectionPolicy::NoProtection)
            .status(FleetStatus::Error)
            .build();

        let entity = fleet_entity(&fleet).unwrap();
        let state = flatten(&entity, &schema::fleet()).unwrap();

        assert_eq!(entity.id, "fleet-1");
        assert_eq!(state.get("ec2_instance_type"), Some(&Value::scalar("c5.large")));
        assert_eq!(state.get("metric_groups"), Some(&Value::list(["default"])));
        assert_eq!(state.get("log_paths"), None);
        assert!(schema::fleet().is_failed_status("ERROR"));
        assert_eq!(state.get("status"), Some(&Value::scalar("ERROR")));
    }
}
