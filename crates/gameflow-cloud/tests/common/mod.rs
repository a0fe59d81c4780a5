use async_trait::async_trait;
use gameflow_cloud::{
    AttributeSpec, Attributes, DesiredState, RemoteClient, RemoteEntity, RemoteError, RemoteFields,
    ResourceSchema, Value,
};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory control plane for one resource type
pub struct MemoryControlPlane {
    resource_type: String,
    entities: Mutex<BTreeMap<String, RemoteFields>>,
    ids: Mutex<VecDeque<String>>,
    counter: Mutex<usize>,
    calls: Mutex<Vec<String>>,
    hidden: Vec<String>,
    server_defaults: Vec<(String, Value)>,
    pub fail_create: AtomicBool,
    pub fail_read: AtomicBool,
    pub fail_update: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl MemoryControlPlane {
    pub fn new(resource_type: &str) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            entities: Mutex::new(BTreeMap::new()),
            ids: Mutex::new(VecDeque::new()),
            counter: Mutex::new(0),
            calls: Mutex::new(Vec::new()),
            hidden: Vec::new(),
            server_defaults: Vec::new(),
            fail_create: AtomicBool::new(false),
            fail_read: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
        }
    }

    /// Identifiers handed out by the next creates, in order
    #[allow(dead_code)]
    pub fn with_ids(self, ids: &[&str]) -> Self {
        self.ids
            .lock()
            .unwrap()
            .extend(ids.iter().map(|id| id.to_string()));
        self
    }

    /// Remote fields accepted on write but never returned by read
    #[allow(dead_code)]
    pub fn with_hidden(mut self, fields: &[&str]) -> Self {
        self.hidden = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Remote fields the service fills in when a create leaves them out
    #[allow(dead_code)]
    pub fn with_server_defaults(mut self, fields: &[(&str, Value)]) -> Self {
        self.server_defaults = fields
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == operation).count()
    }

    #[allow(dead_code)]
    pub fn entity(&self, id: &str) -> Option<RemoteFields> {
        self.entities.lock().unwrap().get(id).cloned()
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.entities.lock().unwrap().len()
    }

    /// Simulate deletion outside the reconciler
    #[allow(dead_code)]
    pub fn remove(&self, id: &str) {
        self.entities.lock().unwrap().remove(id);
    }

    #[allow(dead_code)]
    pub fn set_field(&self, id: &str, name: &str, value: Value) {
        if let Some(fields) = self.entities.lock().unwrap().get_mut(id) {
            fields.insert(name, value);
        }
    }

    fn record(&self, operation: &str) {
        self.calls.lock().unwrap().push(operation.to_string());
    }

    fn next_id(&self) -> String {
        if let Some(id) = self.ids.lock().unwrap().pop_front() {
            return id;
        }
        let mut counter = self.counter.lock().unwrap();
        *counter += 1;
        format!("{}-{}", self.resource_type, counter)
    }
}

#[async_trait]
impl RemoteClient for MemoryControlPlane {
    fn resource_type(&self) -> &str {
        &self.resource_type
    }

    async fn create(&self, fields: &RemoteFields) -> Result<RemoteEntity, RemoteError> {
        self.record("create");
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(RemoteError::Api("create rejected".to_string()));
        }
        let id = self.next_id();
        let mut stored = fields.clone();
        for (name, value) in &self.server_defaults {
            if !stored.contains(name) {
                stored.insert(name.clone(), value.clone());
            }
        }
        stored.insert("Arn", format!("arn:test:{}/{}", self.resource_type, id));
        stored.insert("Status", "ACTIVE");
        self.entities
            .lock()
            .unwrap()
            .insert(id.clone(), stored.clone());
        Ok(RemoteEntity::new(id, stored))
    }

    async fn read(&self, id: &str) -> Result<RemoteEntity, RemoteError> {
        self.record("read");
        if self.fail_read.load(Ordering::SeqCst) {
            return Err(RemoteError::Timeout("read timed out".to_string()));
        }
        let fields = self
            .entity(id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
        let visible: Attributes = fields
            .attributes()
            .iter()
            .filter(|(name, _)| !self.hidden.contains(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        Ok(RemoteEntity::new(id, RemoteFields::from(visible)))
    }

    async fn update(&self, id: &str, fields: &RemoteFields) -> Result<RemoteEntity, RemoteError> {
        self.record("update");
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(RemoteError::Api("update rejected".to_string()));
        }
        let mut entities = self.entities.lock().unwrap();
        let stored = entities
            .get_mut(id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
        let mut merged: Attributes = stored.attributes().clone();
        for (name, value) in fields.attributes() {
            let cleared = match value {
                Value::Scalar(s) => s.is_empty(),
                Value::List(items) => items.is_empty(),
                Value::Blocks(blocks) => blocks.is_empty(),
                Value::Block(attrs) => attrs.is_empty(),
            };
            if cleared {
                merged.remove(name);
            } else {
                merged.insert(name.clone(), value.clone());
            }
        }
        *stored = RemoteFields::from(merged);
        Ok(RemoteEntity::new(id, stored.clone()))
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        self.record("delete");
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(RemoteError::Api("delete rejected".to_string()));
        }
        self.entities
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))
    }
}

pub fn alias_schema() -> ResourceSchema {
    ResourceSchema::new("alias")
        .attribute(AttributeSpec::string("name", "Name").required())
        .attribute(AttributeSpec::string("description", "Description"))
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
        .attribute(AttributeSpec::string("arn", "Arn").computed())
}

#[allow(dead_code)]
pub fn build_schema() -> ResourceSchema {
    ResourceSchema::new("build")
        .attribute(AttributeSpec::string("name", "Name"))
        .attribute(
            AttributeSpec::string("operating_system", "OperatingSystem")
                .server_default()
                .immutable(),
        )
        .attribute(AttributeSpec::string_list("metric_groups", "MetricGroups").server_default())
        .attribute(
            AttributeSpec::block(
                "storage_location",
                "StorageLocation",
                vec![
                    AttributeSpec::string("bucket", "Bucket").required(),
                    AttributeSpec::string("key", "Key").required(),
                ],
            )
            .required()
            .write_only(),
        )
        .attribute(AttributeSpec::string("status", "Status").computed())
        .with_failed_status("status", ["FAILED"])
}

pub fn block(pairs: &[(&str, &str)]) -> Attributes {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Value::scalar(*v)))
        .collect()
}

pub fn alias_desired(name: &str) -> DesiredState {
    DesiredState::new().with("name", name).with(
        "routing_strategy",
        Value::Blocks(vec![block(&[("fleet_id", "fleet-1"), ("type", "SIMPLE")])]),
    )
}
