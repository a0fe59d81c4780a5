//! Attribute codec
//!
//! Converts a local declaration ([`DesiredState`]) into remote request fields
//! ("expand") and remote entities back into the local shape ("flatten").
//! Locally every nested block is written as a list of blocks; remotely a
//! single-cardinality block is one nested [`Value::Block`].

use crate::error::ValidationError;
use crate::schema::{AttrKind, AttributeSpec, Cardinality, ResourceSchema};
use crate::value::{Attributes, Value};
use serde::{Deserialize, Serialize};

/// Local declaration of one resource instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DesiredState(Attributes);

impl DesiredState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.0
    }

    pub fn into_attributes(self) -> Attributes {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Attributes> for DesiredState {
    fn from(attrs: Attributes) -> Self {
        Self(attrs)
    }
}

/// Remote request/response fields keyed by remote attribute name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteFields(Attributes);

impl RemoteFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn scalar(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_scalar)
    }

    pub fn list(&self, name: &str) -> Option<&[String]> {
        match self.0.get(name) {
            Some(Value::List(items)) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn block(&self, name: &str) -> Option<&Attributes> {
        match self.0.get(name) {
            Some(Value::Block(attrs)) => Some(attrs),
            _ => None,
        }
    }

    pub fn blocks(&self, name: &str) -> Option<&[Attributes]> {
        self.0.get(name).and_then(Value::as_blocks)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Attributes> for RemoteFields {
    fn from(attrs: Attributes) -> Self {
        Self(attrs)
    }
}

/// The remote service's view of a resource instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntity {
    /// Identifier assigned by the remote service
    pub id: String,

    pub attributes: RemoteFields,
}

impl RemoteEntity {
    pub fn new(id: impl Into<String>, attributes: RemoteFields) -> Self {
        Self {
            id: id.into(),
            attributes,
        }
    }
}

fn qualified(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

fn mismatch(attribute: &str, kind: &AttrKind, found: &Value) -> ValidationError {
    let found = match found {
        Value::Scalar(raw) => format!("'{}'", raw),
        other => other.shape().to_string(),
    };
    ValidationError::TypeMismatch {
        attribute: attribute.to_string(),
        expected: kind.describe(),
        found,
    }
}

fn missing(spec: &AttributeSpec, attribute: String) -> ValidationError {
    match spec.kind {
        AttrKind::Block { .. } => ValidationError::MissingRequiredBlock { attribute },
        _ => ValidationError::MissingRequiredAttribute { attribute },
    }
}

/// Convert a declaration into remote request fields
pub fn expand(
    desired: &DesiredState,
    schema: &ResourceSchema,
) -> Result<RemoteFields, ValidationError> {
    expand_attributes(desired.attributes(), &schema.attributes, "").map(RemoteFields)
}

/// Expand only `changed` attributes, after validating the whole declaration
///
/// An attribute that is no longer declared is sent as the empty value of its
/// kind so the remote side clears it.
pub fn expand_changes(
    desired: &DesiredState,
    schema: &ResourceSchema,
    changed: &[&str],
) -> Result<RemoteFields, ValidationError> {
    let full = expand(desired, schema)?;
    let mut fields = RemoteFields::new();
    for spec in changed.iter().filter_map(|name| schema.get(name)) {
        let value = full
            .get(&spec.remote_name)
            .cloned()
            .unwrap_or_else(|| spec.kind.empty_remote_value());
        fields.insert(spec.remote_name.clone(), value);
    }
    Ok(fields)
}

fn expand_attributes(
    local: &Attributes,
    specs: &[AttributeSpec],
    path: &str,
) -> Result<Attributes, ValidationError> {
    let mut out = Attributes::new();
    for spec in specs.iter().filter(|s| !s.is_computed()) {
        let name = qualified(path, &spec.name);
        match local.get(&spec.name) {
            Some(value) => {
                if let Some(expanded) = expand_value(value, spec, &name)? {
                    out.insert(spec.remote_name.clone(), expanded);
                }
            }
            None => {
                if let Some(default) = &spec.default {
                    out.insert(spec.remote_name.clone(), Value::Scalar(default.clone()));
                } else if spec.is_required() {
                    return Err(missing(spec, name));
                }
            }
        }
    }
    Ok(out)
}

fn expand_value(
    value: &Value,
    spec: &AttributeSpec,
    name: &str,
) -> Result<Option<Value>, ValidationError> {
    match &spec.kind {
        AttrKind::Scalar(kind) => match value {
            Value::Scalar(raw) if kind.accepts(raw) => Ok(Some(value.clone())),
            other => Err(mismatch(name, &spec.kind, other)),
        },
        AttrKind::ScalarList => match value {
            Value::List(_) => Ok(Some(value.clone())),
            other => Err(mismatch(name, &spec.kind, other)),
        },
        AttrKind::Block {
            cardinality,
            attributes,
        } => {
            let blocks = value
                .as_blocks()
                .ok_or_else(|| mismatch(name, &spec.kind, value))?;
            match cardinality {
                Cardinality::Single => match blocks {
                    [] if spec.is_required() => Err(missing(spec, name.to_string())),
                    [] => Ok(None),
                    [block] => expand_attributes(block, attributes, name)
                        .map(|inner| Some(Value::Block(inner))),
                    _ => Err(ValidationError::MultipleBlocksNotAllowed {
                        attribute: name.to_string(),
                        count: blocks.len(),
                    }),
                },
                Cardinality::List => {
                    if blocks.is_empty() && spec.is_required() {
                        return Err(missing(spec, name.to_string()));
                    }
                    blocks
                        .iter()
                        .map(|block| expand_attributes(block, attributes, name))
                        .collect::<Result<Vec<_>, _>>()
                        .map(|inner| Some(Value::Blocks(inner)))
                }
            }
        }
    }
}

/// Convert a remote entity back into the local shape
///
/// Computed attributes are included; remote fields unknown to the schema are
/// dropped.
pub fn flatten(
    remote: &RemoteEntity,
    schema: &ResourceSchema,
) -> Result<DesiredState, ValidationError> {
    flatten_attributes(remote.attributes.attributes(), &schema.attributes, "").map(DesiredState)
}

fn flatten_attributes(
    remote: &Attributes,
    specs: &[AttributeSpec],
    path: &str,
) -> Result<Attributes, ValidationError> {
    let mut out = Attributes::new();
    for spec in specs {
        if let Some(value) = remote.get(&spec.remote_name) {
            let name = qualified(path, &spec.name);
            out.insert(spec.name.clone(), flatten_value(value, spec, &name)?);
        }
    }
    Ok(out)
}

fn flatten_value(value: &Value, spec: &AttributeSpec, name: &str) -> Result<Value, ValidationError> {
    match (&spec.kind, value) {
        (AttrKind::Scalar(kind), Value::Scalar(raw)) if kind.accepts(raw) => Ok(value.clone()),
        (AttrKind::ScalarList, Value::List(_)) => Ok(value.clone()),
        (
            AttrKind::Block {
                cardinality: Cardinality::Single,
                attributes,
            },
            Value::Block(inner),
        ) => Ok(Value::Blocks(vec![flatten_attributes(inner, attributes, name)?])),
        (
            AttrKind::Block {
                cardinality: Cardinality::List,
                attributes,
            },
            Value::Blocks(blocks),
        ) => blocks
            .iter()
            .map(|block| flatten_attributes(block, attributes, name))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Blocks),
        (kind, other) => Err(mismatch(name, kind, other)),
    }
}
