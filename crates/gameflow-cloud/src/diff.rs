//! Drift detection between a declaration and the last observed snapshot

use crate::codec::DesiredState;
use crate::schema::{AttributeSpec, ResourceSchema};
use crate::value::{Attributes, Value};

/// Drop empty strings, empty lists and empty block lists
///
/// The remote API does not distinguish "unset" from "empty" for these, so
/// neither does drift detection.
fn normalize(value: &Value) -> Option<Value> {
    match value {
        Value::Scalar(s) if s.is_empty() => None,
        Value::List(items) if items.is_empty() => None,
        Value::Blocks(blocks) if blocks.is_empty() => None,
        Value::Scalar(_) | Value::List(_) => Some(value.clone()),
        Value::Block(attrs) => Some(Value::Block(normalize_block(attrs))),
        Value::Blocks(blocks) => Some(Value::Blocks(blocks.iter().map(normalize_block).collect())),
    }
}

fn normalize_block(attrs: &Attributes) -> Attributes {
    attrs
        .iter()
        .filter_map(|(k, v)| normalize(v).map(|v| (k.clone(), v)))
        .collect()
}

fn effective(desired: &DesiredState, spec: &AttributeSpec) -> Option<Value> {
    desired
        .get(&spec.name)
        .cloned()
        .or_else(|| spec.default.clone().map(Value::Scalar))
}

/// Whether two optional values are the same for drift purposes
pub fn equivalent(a: Option<&Value>, b: Option<&Value>) -> bool {
    a.and_then(normalize) == b.and_then(normalize)
}

fn declared(desired: &DesiredState, spec: &AttributeSpec) -> bool {
    effective(desired, spec).as_ref().and_then(normalize).is_some()
}

/// Configurable attributes whose declared value differs from the snapshot
///
/// Defaults count as declared, so an omitted optional attribute whose default
/// the service echoed back is not drift. Undeclared server-default attributes
/// are never drift: whatever the service picked stands.
pub fn changed_attributes<'a>(
    snapshot: &DesiredState,
    desired: &DesiredState,
    schema: &'a ResourceSchema,
) -> Vec<&'a AttributeSpec> {
    schema
        .configurable()
        .filter(|spec| !(spec.is_server_default() && !declared(desired, spec)))
        .filter(|spec| !equivalent(effective(desired, spec).as_ref(), snapshot.get(&spec.name)))
        .collect()
}

/// Whether applying a change to `spec` needs delete + create
///
/// True for immutable attributes, and for attributes the API cannot reset
/// when the declaration drops them.
pub fn forces_replacement(spec: &AttributeSpec, desired: &DesiredState) -> bool {
    spec.immutable || (!spec.clearable && !declared(desired, spec))
}
