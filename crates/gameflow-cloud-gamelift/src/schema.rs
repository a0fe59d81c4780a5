//! GameLift resource schemas
//!
//! Remote names follow the GameLift API member names so the clients can read
//! request fields without a second mapping table.

use gameflow_cloud::{AttributeSpec, ResourceSchema, SchemaCatalog};

pub const ALIAS: &str = "alias";
pub const BUILD: &str = "build";
pub const FLEET: &str = "fleet";

pub fn alias() -> ResourceSchema {
    ResourceSchema::new(ALIAS)
        .attribute(AttributeSpec::string("name", "Name").required())
        .attribute(AttributeSpec::string("description", "Description").not_clearable())
        .attribute(
            AttributeSpec::block(
                "routing_strategy",
                "RoutingStrategy",
                vec![
                    AttributeSpec::string("fleet_id", "FleetId"),
                    AttributeSpec::string("message", "Message"),
                    AttributeSpec::string("type", "Type").required(),
                ],
            )
            .required(),
        )
        .attribute(AttributeSpec::string("arn", "AliasArn").computed())
}

/// Build schema
///
/// Name and version accept no empty value on update, and the operating
/// system is picked by the service when left out.
pub fn build() -> ResourceSchema {
    ResourceSchema::new(BUILD)
        .attribute(AttributeSpec::string("name", "Name").not_clearable())
        .attribute(AttributeSpec::string("version", "Version").not_clearable())
        .attribute(
            AttributeSpec::string("operating_system", "OperatingSystem")
                .server_default()
                .immutable(),
        )
        .attribute(
            AttributeSpec::block(
                "storage_location",
                "StorageLocation",
                vec![
                    AttributeSpec::string("bucket", "Bucket").required(),
                    AttributeSpec::string("key", "Key").required(),
                    AttributeSpec::string("role_arn", "RoleArn").required(),
                ],
            )
            .required()
            .immutable()
            .write_only(),
        )
        .attribute(AttributeSpec::string("arn", "BuildArn").computed())
        .attribute(AttributeSpec::string("status", "Status").computed())
        .attribute(AttributeSpec::integer("size_on_disk", "SizeOnDisk").computed())
        .with_failed_status("status", ["FAILED"])
}

/// Fleet schema
///
/// Inbound permissions, runtime configuration and peering are not part of
/// the fleet attributes the service describes, so they are write-only.
/// Metric groups fall back to `default` when none are given.
pub fn fleet() -> ResourceSchema {
    ResourceSchema::new(FLEET)
        .attribute(AttributeSpec::string("build_id", "BuildId").required().immutable())
        .attribute(
            AttributeSpec::string("ec2_instance_type", "EC2InstanceType")
                .required()
                .immutable(),
        )
        .attribute(AttributeSpec::string("name", "Name").required())
        .attribute(AttributeSpec::string("description", "Description").not_clearable())
        .attribute(
            AttributeSpec::block_list(
                "ec2_inbound_permissions",
                "EC2InboundPermissions",
                vec![
                    AttributeSpec::integer("from_port", "FromPort").required(),
                    AttributeSpec::integer("to_port", "ToPort").required(),
                    AttributeSpec::string("ip_range", "IpRange").required(),
                    AttributeSpec::string("protocol", "Protocol").required(),
                ],
            )
            .immutable()
            .write_only(),
        )
        .attribute(AttributeSpec::string_list("log_paths", "LogPaths").immutable())
        .attribute(AttributeSpec::string_list("metric_groups", "MetricGroups").server_default())
        .attribute(
            AttributeSpec::string(
                "new_game_session_protection_policy",
                "NewGameSessionProtectionPolicy",
            )
            .with_default("NoProtection"),
        )
        .attribute(
            AttributeSpec::string("peer_vpc_aws_account_id", "PeerVpcAwsAccountId")
                .immutable()
                .write_only(),
        )
        .attribute(
            AttributeSpec::string("peer_vpc_id", "PeerVpcId")
                .immutable()
                .write_only(),
        )
        .attribute(
            AttributeSpec::block(
                "resource_creation_limit_policy",
                "ResourceCreationLimitPolicy",
                vec![
                    AttributeSpec::integer(
                        "new_game_sessions_per_creator",
                        "NewGameSessionsPerCreator",
                    ),
                    AttributeSpec::integer("policy_period_in_minutes", "PolicyPeriodInMinutes"),
                ],
            )
            .not_clearable(),
        )
        .attribute(
            AttributeSpec::block(
                "runtime_configuration",
                "RuntimeConfiguration",
                vec![
                    AttributeSpec::integer(
                        "game_session_activation_timeout_seconds",
                        "GameSessionActivationTimeoutSeconds",
                    ),
                    AttributeSpec::integer(
                        "max_concurrent_game_session_activations",
                        "MaxConcurrentGameSessionActivations",
                    ),
                    AttributeSpec::block_list(
                        "server_process",
                        "ServerProcesses",
                        vec![
                            AttributeSpec::integer("concurrent_executions", "ConcurrentExecutions")
                                .required(),
                            AttributeSpec::string("launch_path", "LaunchPath").required(),
                            AttributeSpec::string("parameters", "Parameters"),
                        ],
                    ),
                ],
            )
            .immutable()
            .write_only(),
        )
        .attribute(
            AttributeSpec::string("server_launch_parameters", "ServerLaunchParameters").immutable(),
        )
        .attribute(AttributeSpec::string("server_launch_path", "ServerLaunchPath").immutable())
        .attribute(AttributeSpec::string("arn", "FleetArn").computed())
        .attribute(AttributeSpec::string("operating_system", "OperatingSystem").computed())
        .attribute(AttributeSpec::string("status", "Status").computed())
        .with_failed_status("status", ["ERROR"])
}

/// All GameLift schemas in dependency order
pub fn catalog() -> SchemaCatalog {
    SchemaCatalog::new().with(build()).with(fleet()).with(alias())
}
