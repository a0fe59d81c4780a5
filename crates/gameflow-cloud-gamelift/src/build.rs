//! GameLift build client

use crate::error::{GameLiftError, remote_error};
use crate::fields::{self, Collector};
use crate::schema::BUILD;
use async_trait::async_trait;
use aws_sdk_gamelift::Client;
use aws_sdk_gamelift::types::{Build, OperatingSystem, S3Location};
use gameflow_cloud::{RemoteClient, RemoteEntity, RemoteError, RemoteFields};

pub struct BuildClient {
    client: Client,
}

impl BuildClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn storage_location(fields: &RemoteFields) -> Option<S3Location> {
    let block = fields::block(fields.attributes(), "StorageLocation")?;
    Some(
        S3Location::builder()
            .set_bucket(fields::text(block, "Bucket"))
            .set_key(fields::text(block, "Key"))
            .set_role_arn(fields::text(block, "RoleArn"))
            .build(),
    )
}

/// The storage location is not echoed back by the service.
pub(crate) fn build_entity(build: Option<&Build>) -> Result<RemoteEntity, GameLiftError> {
    let build = build.ok_or(GameLiftError::MissingIdentifier(BUILD))?;
    let id = build
        .build_id()
        .ok_or(GameLiftError::MissingIdentifier(BUILD))?;
    let fields = Collector::new()
        .text("Name", build.name())
        .text("Version", build.version())
        .text("OperatingSystem", build.operating_system().map(|os| os.as_str()))
        .text("BuildArn", build.build_arn())
        .text("Status", build.status().map(|s| s.as_str()))
        .number("SizeOnDisk", build.size_on_disk())
        .into_fields();
    Ok(RemoteEntity::new(id, fields))
}

#[async_trait]
impl RemoteClient for BuildClient {
    fn resource_type(&self) -> &str {
        BUILD
    }

    async fn create(&self, fields: &RemoteFields) -> Result<RemoteEntity, RemoteError> {
        let attrs = fields.attributes();
        tracing::debug!("CreateBuild {:?}", fields::text(attrs, "Name"));
        let out = self
            .client
            .create_build()
            .set_name(fields::text(attrs, "Name"))
            .set_version(fields::text(attrs, "Version"))
            .set_operating_system(
                fields::text(attrs, "OperatingSystem").map(|os| OperatingSystem::from(os.as_str())),
            )
            .set_storage_location(storage_location(fields))
            .send()
            .await
            .map_err(|e| remote_error(BUILD, e))?;
        Ok(build_entity(out.build_value())?)
    }

    async fn read(&self, id: &str) -> Result<RemoteEntity, RemoteError> {
        let out = self
            .client
            .describe_build()
            .build_id(id)
            .send()
            .await
            .map_err(|e| remote_error(id, e))?;
        Ok(build_entity(out.build_value())?)
    }

    /// Only name and version can change in place
    async fn update(&self, id: &str, fields: &RemoteFields) -> Result<RemoteEntity, RemoteError> {
        let attrs = fields.attributes();
        let out = self
            .client
            .update_build()
            .build_id(id)
            .set_name(fields::text(attrs, "Name"))
            .set_version(fields::text(attrs, "Version"))
            .send()
            .await
            .map_err(|e| remote_error(id, e))?;
        Ok(build_entity(out.build_value())?)
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        self.client
            .delete_build()
            .build_id(id)
            .send()
            .await
            .map_err(|e| remote_error(id, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_gamelift::types::BuildStatus;
    use gameflow_cloud::{Attributes, Value};

    #[test]
    fn test_build_entity_fields() {
        let build = Build::builder()
            .build_id("build-1")
            .name("server")
            .status(BuildStatus::Failed)
            .size_on_disk(1024)
            .operating_system(OperatingSystem::AmazonLinux2)
            .build();

        let entity = build_entity(Some(&build)).unwrap();
        assert_eq!(entity.id, "build-1");
        assert_eq!(entity.attributes.scalar("Status"), Some("FAILED"));
        assert_eq!(entity.attributes.scalar("SizeOnDisk"), Some("1024"));
        assert_eq!(
            entity.attributes.scalar("OperatingSystem"),
            Some("AMAZON_LINUX_2")
        );
        assert!(!entity.attributes.contains("StorageLocation"));
    }

    #[test]
    fn test_storage_location_from_fields() {
        let mut inner = Attributes::new();
        inner.insert("Bucket".to_string(), Value::scalar("assets"));
        inner.insert("Key".to_string(), Value::scalar("server.zip"));
        inner.insert("RoleArn".to_string(), Value::scalar("arn:aws:iam::1:role/gl"));
        let fields = RemoteFields::new().with("StorageLocation", Value::Block(inner));

        let location = storage_location(&fields).unwrap();
        assert_eq!(location.bucket(), Some("assets"));
        assert_eq!(location.key(), Some("server.zip"));
        assert!(storage_location(&RemoteFields::new()).is_none());
    }
}
