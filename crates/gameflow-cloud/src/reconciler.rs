//! Resource lifecycle reconciler
//!
//! Drives one resource instance through Absent → Present (→ Tainted) → Absent
//! against a [`RemoteClient`]. Local state is only changed after the remote
//! side confirmed the operation, with one exception: the identifier returned
//! by a successful create is recorded before anything else so the remote
//! entity can never be orphaned.

use crate::client::RemoteClient;
use crate::codec::{self, DesiredState};
use crate::diff;
use crate::error::{CloudError, RemoteError, Result, ValidationError};
use crate::schema::ResourceSchema;
use crate::state::TrackedState;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle position of a resource instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Absent,
    Present,
    Tainted,
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lifecycle::Absent => write!(f, "absent"),
            Lifecycle::Present => write!(f, "present"),
            Lifecycle::Tainted => write!(f, "tainted"),
        }
    }
}

/// Lifecycle operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// Result of a successful read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Snapshot refreshed, entity healthy
    Present,
    /// Snapshot refreshed, entity unusable and must be replaced
    Tainted,
    /// Entity no longer exists; tracked state was cleared and the resource
    /// needs to be recreated
    Vanished,
}

/// Result of a successful update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Declaration matches the snapshot; nothing was sent
    Unchanged,
    /// Changes applied; carries the outcome of the follow-up read
    Updated(ReadOutcome),
}

/// Reject a declaration that gives a single-block attribute several blocks
pub fn check_cardinality(
    desired: &DesiredState,
    schema: &ResourceSchema,
) -> std::result::Result<(), ValidationError> {
    for spec in schema.configurable().filter(|s| s.is_single_block()) {
        if let Some(blocks) = desired.get(&spec.name).and_then(Value::as_blocks) {
            if blocks.len() > 1 {
                return Err(ValidationError::MultipleBlocksNotAllowed {
                    attribute: spec.name.clone(),
                    count: blocks.len(),
                });
            }
        }
    }
    Ok(())
}

/// Reconciles one resource instance
///
/// Operations take `&mut self`; callers must not run two operations on the
/// same instance concurrently, which the borrow checker enforces for a single
/// reconciler value.
pub struct ResourceReconciler {
    schema: Arc<ResourceSchema>,
    client: Arc<dyn RemoteClient>,
    tracked: Option<TrackedState>,
    timeout: Option<Duration>,
}

impl ResourceReconciler {
    pub fn new(schema: Arc<ResourceSchema>, client: Arc<dyn RemoteClient>) -> Self {
        Self {
            schema,
            client,
            tracked: None,
            timeout: None,
        }
    }

    /// Resume from a persisted record
    pub fn with_tracked(mut self, tracked: Option<TrackedState>) -> Self {
        self.tracked = tracked;
        self
    }

    /// Bound every remote call; an elapsed call counts as a remote failure
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    pub fn lifecycle(&self) -> Lifecycle {
        match &self.tracked {
            None => Lifecycle::Absent,
            Some(t) if t.is_tainted() => Lifecycle::Tainted,
            Some(_) => Lifecycle::Present,
        }
    }

    pub fn tracked(&self) -> Option<&TrackedState> {
        self.tracked.as_ref()
    }

    pub fn into_tracked(self) -> Option<TrackedState> {
        self.tracked
    }

    pub fn id(&self) -> Option<&str> {
        self.tracked.as_ref().map(|t| t.id.as_str())
    }

    fn require(&self, operation: Operation, allowed: &[Lifecycle]) -> Result<String> {
        let state = self.lifecycle();
        match &self.tracked {
            Some(t) if allowed.contains(&state) => Ok(t.id.clone()),
            None if allowed.contains(&state) => Ok(String::new()),
            _ => Err(CloudError::InvalidTransition { operation, state }),
        }
    }

    async fn call<T, F>(&self, operation: Operation, fut: F) -> std::result::Result<T, RemoteError>
    where
        F: Future<Output = std::result::Result<T, RemoteError>>,
    {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
                RemoteError::Timeout(format!(
                    "{} {} did not complete within {:?}",
                    operation, self.schema.resource_type, limit
                ))
            })?,
            None => fut.await,
        }
    }

    /// Create the remote entity, then read it back
    ///
    /// If the follow-up read fails the identifier is kept and the instance is
    /// tainted, so the next pass replaces it instead of leaking it.
    pub async fn create(&mut self, desired: &DesiredState) -> Result<ReadOutcome> {
        self.require(Operation::Create, &[Lifecycle::Absent])?;
        check_cardinality(desired, &self.schema)?;
        let fields = codec::expand(desired, &self.schema)?;

        tracing::info!(
            resource_type = %self.schema.resource_type,
            "Creating {}",
            self.schema.resource_type
        );
        let entity = self
            .call(Operation::Create, self.client.create(&fields))
            .await?;

        self.tracked = Some(TrackedState::new(
            entity.id.clone(),
            self.schema.resource_type.clone(),
            desired.clone(),
        ));
        tracing::info!(id = %entity.id, "Created {} {}", self.schema.resource_type, entity.id);

        match self.read().await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                if let Some(tracked) = self.tracked.as_mut() {
                    tracked.taint();
                }
                tracing::warn!(
                    id = %entity.id,
                    "Read after create failed, marking {} tainted: {}",
                    self.schema.resource_type,
                    err
                );
                Err(err)
            }
        }
    }

    /// Refresh the snapshot from the remote entity
    pub async fn read(&mut self) -> Result<ReadOutcome> {
        let id = self.require(Operation::Read, &[Lifecycle::Present, Lifecycle::Tainted])?;

        tracing::debug!(id = %id, "Reading {} {}", self.schema.resource_type, id);
        let entity = match self.call(Operation::Read, self.client.read(&id)).await {
            Ok(entity) => entity,
            Err(RemoteError::NotFound(_)) => {
                tracing::warn!(
                    id = %id,
                    "{} {} no longer exists, it will be recreated",
                    self.schema.resource_type,
                    id
                );
                self.tracked = None;
                return Ok(ReadOutcome::Vanished);
            }
            Err(err) => return Err(err.into()),
        };

        let mut observed = codec::flatten(&entity, &self.schema)?;
        let failed_status = self
            .schema
            .status_attribute
            .as_ref()
            .and_then(|attr| observed.get(attr))
            .and_then(Value::as_scalar)
            .filter(|status| self.schema.is_failed_status(status))
            .map(str::to_string);

        let Some(tracked) = self.tracked.as_mut() else {
            return Ok(ReadOutcome::Vanished);
        };

        for spec in self.schema.attributes.iter().filter(|s| s.write_only) {
            if observed.get(&spec.name).is_none() {
                if let Some(previous) = tracked.attributes.get(&spec.name) {
                    observed.insert(spec.name.clone(), previous.clone());
                }
            }
        }
        tracked.refresh(observed);

        if let Some(status) = failed_status {
            if !tracked.is_tainted() {
                tracing::warn!(
                    id = %id,
                    "{} {} reports status {}, marking tainted",
                    self.schema.resource_type,
                    id,
                    status
                );
                tracked.taint();
            }
        }

        Ok(if tracked.is_tainted() {
            ReadOutcome::Tainted
        } else {
            ReadOutcome::Present
        })
    }

    /// Push changed attributes to the remote entity
    pub async fn update(&mut self, desired: &DesiredState) -> Result<UpdateOutcome> {
        let id = self.require(Operation::Update, &[Lifecycle::Present])?;
        check_cardinality(desired, &self.schema)?;

        let Some(tracked) = self.tracked.as_ref() else {
            return Err(CloudError::InvalidTransition {
                operation: Operation::Update,
                state: Lifecycle::Absent,
            });
        };
        let changed = diff::changed_attributes(&tracked.attributes, desired, &self.schema);
        if changed.is_empty() {
            tracing::debug!(id = %id, "{} {} is up to date", self.schema.resource_type, id);
            return Ok(UpdateOutcome::Unchanged);
        }

        let immutable: Vec<String> = changed
            .iter()
            .filter(|spec| spec.immutable)
            .map(|spec| spec.name.clone())
            .collect();
        if !immutable.is_empty() {
            return Err(CloudError::ImmutableAttributeChanged {
                resource_type: self.schema.resource_type.clone(),
                id,
                attributes: immutable,
            });
        }

        let stuck: Vec<String> = changed
            .iter()
            .filter(|spec| diff::forces_replacement(spec, desired))
            .map(|spec| spec.name.clone())
            .collect();
        if !stuck.is_empty() {
            return Err(CloudError::AttributeNotClearable {
                resource_type: self.schema.resource_type.clone(),
                id,
                attributes: stuck,
            });
        }

        let names: Vec<&str> = changed.iter().map(|spec| spec.name.as_str()).collect();
        let fields = codec::expand_changes(desired, &self.schema, &names)?;

        tracing::info!(
            id = %id,
            "Updating {} {}: {}",
            self.schema.resource_type,
            id,
            names.join(", ")
        );
        self.call(Operation::Update, self.client.update(&id, &fields))
            .await?;

        // the read below cannot observe write-only attributes
        if let Some(tracked) = self.tracked.as_mut() {
            let mut attributes = tracked.attributes.clone();
            for spec in self.schema.attributes.iter().filter(|s| s.write_only) {
                match desired.get(&spec.name) {
                    Some(value) => attributes.insert(spec.name.clone(), value.clone()),
                    None => {
                        attributes.remove(&spec.name);
                    }
                }
            }
            tracked.refresh(attributes);
        }

        self.read().await.map(UpdateOutcome::Updated)
    }

    /// Delete the remote entity; already-gone entities count as deleted
    pub async fn delete(&mut self) -> Result<()> {
        let Some(id) = self.id().map(str::to_string) else {
            tracing::debug!("{} is already absent", self.schema.resource_type);
            return Ok(());
        };

        tracing::info!(id = %id, "Deleting {} {}", self.schema.resource_type, id);
        match self.call(Operation::Delete, self.client.delete(&id)).await {
            Ok(()) => {}
            Err(RemoteError::NotFound(_)) => {
                tracing::debug!(id = %id, "{} {} was already deleted", self.schema.resource_type, id);
            }
            Err(err) => return Err(err.into()),
        }

        self.tracked = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{RemoteEntity, RemoteFields};
    use crate::schema::AttributeSpec;
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl RemoteClient for Unreachable {
        fn resource_type(&self) -> &str {
            "alias"
        }

        async fn create(&self, _: &RemoteFields) -> std::result::Result<RemoteEntity, RemoteError> {
            Err(RemoteError::Api("unreachable".to_string()))
        }

        async fn read(&self, _: &str) -> std::result::Result<RemoteEntity, RemoteError> {
            Err(RemoteError::Api("unreachable".to_string()))
        }

        async fn update(
            &self,
            _: &str,
            _: &RemoteFields,
        ) -> std::result::Result<RemoteEntity, RemoteError> {
            Err(RemoteError::Api("unreachable".to_string()))
        }

        async fn delete(&self, _: &str) -> std::result::Result<(), RemoteError> {
            Err(RemoteError::Api("unreachable".to_string()))
        }
    }

    fn schema() -> Arc<ResourceSchema> {
        Arc::new(
            ResourceSchema::new("alias")
                .attribute(AttributeSpec::string("name", "Name").required())
                .attribute(AttributeSpec::block(
                    "routing_strategy",
                    "RoutingStrategy",
                    vec![AttributeSpec::string("type", "Type").required()],
                )),
        )
    }

    #[test]
    fn test_check_cardinality() {
        let block = || {
            let mut attrs = crate::value::Attributes::new();
            attrs.insert("type".to_string(), Value::scalar("SIMPLE"));
            attrs
        };
        let desired = DesiredState::new()
            .with("name", "alias1")
            .with("routing_strategy", Value::Blocks(vec![block(), block()]));

        assert_eq!(
            check_cardinality(&desired, &schema()),
            Err(ValidationError::MultipleBlocksNotAllowed {
                attribute: "routing_strategy".to_string(),
                count: 2,
            })
        );
    }

    #[tokio::test]
    async fn test_invalid_transitions() {
        let mut reconciler = ResourceReconciler::new(schema(), Arc::new(Unreachable));
        assert_eq!(reconciler.lifecycle(), Lifecycle::Absent);

        let err = reconciler.read().await.unwrap_err();
        assert!(matches!(
            err,
            CloudError::InvalidTransition {
                operation: Operation::Read,
                state: Lifecycle::Absent
            }
        ));

        let err = reconciler
            .update(&DesiredState::new().with("name", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::InvalidTransition { .. }));

        let mut reconciler = reconciler.with_tracked(Some(TrackedState::new(
            "alias-abc",
            "alias",
            DesiredState::new(),
        )));
        let err = reconciler
            .create(&DesiredState::new().with("name", "x"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CloudError::InvalidTransition {
                operation: Operation::Create,
                state: Lifecycle::Present
            }
        ));
    }

    #[tokio::test]
    async fn test_remote_failure_is_surfaced_without_state_change() {
        let tracked = TrackedState::new("alias-abc", "alias", DesiredState::new().with("name", "a"));
        let mut reconciler =
            ResourceReconciler::new(schema(), Arc::new(Unreachable)).with_tracked(Some(tracked.clone()));

        let err = reconciler.delete().await.unwrap_err();
        assert!(matches!(err, CloudError::Remote(RemoteError::Api(_))));
        assert_eq!(reconciler.tracked(), Some(&tracked));
    }
}
