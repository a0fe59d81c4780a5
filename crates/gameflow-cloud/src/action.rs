//! Planned actions for declared resources

use crate::codec;
use crate::diff;
use crate::error::{CloudError, Result};
use crate::provider::{ResourceSet, SchemaCatalog, resource_key};
use crate::reconciler::check_cardinality;
use crate::state::GlobalState;
use serde::{Deserialize, Serialize};

/// Represents a planned action for a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Type of action to perform
    pub action_type: ActionType,

    /// Resource type (e.g. "alias", "fleet", "build")
    pub resource_type: String,

    /// Local resource name
    pub name: String,

    /// Remote identifier, when tracked
    pub remote_id: Option<String>,

    /// Attributes that differ from the snapshot
    pub changed: Vec<String>,

    /// Description of the action
    pub description: String,
}

impl Action {
    pub fn key(&self) -> String {
        resource_key(&self.resource_type, &self.name)
    }
}

/// Type of action to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Create a new resource
    Create,
    /// Update an existing resource in place
    Update,
    /// Delete and create again
    Replace,
    /// Delete a resource
    Delete,
    /// No changes needed
    NoOp,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::Replace => write!(f, "replace"),
            ActionType::Delete => write!(f, "delete"),
            ActionType::NoOp => write!(f, "no-op"),
        }
    }
}

/// Result of applying actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyResult {
    /// Successfully applied actions
    pub succeeded: Vec<ActionResult>,

    /// Failed actions
    pub failed: Vec<ActionResult>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl ApplyResult {
    pub fn new() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn add_success(&mut self, key: String, message: String) {
        self.succeeded.push(ActionResult {
            key,
            success: true,
            message,
            error: None,
        });
    }

    pub fn add_failure(&mut self, key: String, error: String) {
        self.failed.push(ActionResult {
            key,
            success: false,
            message: String::new(),
            error: Some(error),
        });
    }
}

impl Default for ApplyResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a single action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    /// Resource key (type:name)
    pub key: String,

    pub success: bool,

    pub message: String,

    pub error: Option<String>,
}

/// Plan containing all actions to be applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Actions in execution order
    pub actions: Vec<Action>,

    /// Whether the plan has any changes
    pub has_changes: bool,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        let has_changes = actions.iter().any(|a| a.action_type != ActionType::NoOp);
        Self {
            actions,
            has_changes,
        }
    }

    pub fn empty() -> Self {
        Self {
            actions: Vec::new(),
            has_changes: false,
        }
    }

    /// Compare declared resources with the tracked state
    ///
    /// Creates, updates and replacements follow catalog order; deletions of
    /// resources no longer declared follow, in reverse catalog order.
    pub fn compute(
        declared: &ResourceSet,
        state: &GlobalState,
        catalog: &SchemaCatalog,
    ) -> Result<Self> {
        for resource in declared.iter() {
            catalog.require(&resource.resource_type)?;
        }

        let mut actions = Vec::new();

        for resource_type in catalog.resource_types() {
            let schema = catalog.require(resource_type)?;
            for resource in declared.by_type(resource_type) {
                let key = resource.key();
                check_cardinality(&resource.desired, &schema)
                    .and_then(|_| codec::expand(&resource.desired, &schema).map(|_| ()))
                    .map_err(|source| CloudError::InvalidResource {
                        key: key.clone(),
                        source,
                    })?;

                let action = match state.get_resource(&key) {
                    None => Action {
                        action_type: ActionType::Create,
                        resource_type: resource_type.to_string(),
                        name: resource.name.clone(),
                        remote_id: None,
                        changed: Vec::new(),
                        description: format!("{} {} will be created", resource_type, resource.name),
                    },
                    Some(tracked) if tracked.is_tainted() => Action {
                        action_type: ActionType::Replace,
                        resource_type: resource_type.to_string(),
                        name: resource.name.clone(),
                        remote_id: Some(tracked.id.clone()),
                        changed: Vec::new(),
                        description: format!(
                            "{} {} is tainted and will be replaced",
                            resource_type, resource.name
                        ),
                    },
                    Some(tracked) => {
                        let changed =
                            diff::changed_attributes(&tracked.attributes, &resource.desired, &schema);
                        let forces_replacement = changed
                            .iter()
                            .any(|spec| diff::forces_replacement(spec, &resource.desired));
                        let changed: Vec<String> =
                            changed.into_iter().map(|spec| spec.name.clone()).collect();
                        let (action_type, description) = if changed.is_empty() {
                            (
                                ActionType::NoOp,
                                format!("{} {} is up to date", resource_type, resource.name),
                            )
                        } else if forces_replacement {
                            (
                                ActionType::Replace,
                                format!(
                                    "{} {} will be replaced ({})",
                                    resource_type,
                                    resource.name,
                                    changed.join(", ")
                                ),
                            )
                        } else {
                            (
                                ActionType::Update,
                                format!(
                                    "{} {} will be updated ({})",
                                    resource_type,
                                    resource.name,
                                    changed.join(", ")
                                ),
                            )
                        };
                        Action {
                            action_type,
                            resource_type: resource_type.to_string(),
                            name: resource.name.clone(),
                            remote_id: Some(tracked.id.clone()),
                            changed,
                            description,
                        }
                    }
                };
                actions.push(action);
            }
        }

        for resource_type in catalog.resource_types().rev() {
            for (name, tracked) in state.by_type(resource_type) {
                if declared.get(resource_type, name).is_none() {
                    actions.push(Action {
                        action_type: ActionType::Delete,
                        resource_type: resource_type.to_string(),
                        name: name.to_string(),
                        remote_id: Some(tracked.id.clone()),
                        changed: Vec::new(),
                        description: format!("{} {} will be deleted", resource_type, name),
                    });
                }
            }
        }

        Ok(Self::new(actions))
    }

    /// Get actions by type
    pub fn actions_by_type(&self, action_type: ActionType) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .collect()
    }

    /// Summary of the plan
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.actions_by_type(ActionType::Create).len(),
            update: self.actions_by_type(ActionType::Update).len(),
            replace: self.actions_by_type(ActionType::Replace).len(),
            delete: self.actions_by_type(ActionType::Delete).len(),
            no_change: self.actions_by_type(ActionType::NoOp).len(),
        }
    }
}

/// Summary of planned actions
#[derive(Debug, Clone)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub replace: usize,
    pub delete: usize,
    pub no_change: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to replace, {} to delete, {} unchanged",
            self.create, self.update, self.replace, self.delete, self.no_change
        )
    }
}
