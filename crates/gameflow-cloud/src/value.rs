//! Attribute value model
//!
//! Values shared by the local declaration and the remote request/response
//! shapes. Configuration files may use numbers and booleans; they are carried
//! as their canonical string form so every leaf is a string.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute name to value mapping
pub type Attributes = BTreeMap<String, Value>;

/// A single attribute value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    /// String, number or boolean leaf
    Scalar(String),
    /// Ordered list of leaves
    List(Vec<String>),
    /// One nested block
    Block(Attributes),
    /// Ordered list of nested blocks
    Blocks(Vec<Attributes>),
}

impl Value {
    pub fn scalar(value: impl Into<String>) -> Self {
        Value::Scalar(value.into())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Short shape name used in error messages
    pub fn shape(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::List(_) => "list",
            Value::Block(_) => "block",
            Value::Blocks(_) => "block list",
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Blocks of a nested-block value
    ///
    /// An empty `[]` cannot be told apart from an empty scalar list when read
    /// from a file, so it is accepted here as zero blocks.
    pub fn as_blocks(&self) -> Option<&[Attributes]> {
        match self {
            Value::Blocks(blocks) => Some(blocks.as_slice()),
            Value::List(items) if items.is_empty() => Some(&[][..]),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Scalar(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Scalar(value)
    }
}

/// Error converting an untyped JSON/YAML document into a [`Value`]
#[derive(Debug, thiserror::Error)]
#[error("unsupported attribute value: {0}")]
pub struct InvalidValue(String);

fn leaf(value: serde_json::Value) -> Result<String, InvalidValue> {
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        other => Err(InvalidValue(other.to_string())),
    }
}

fn block(map: serde_json::Map<String, serde_json::Value>) -> Result<Attributes, InvalidValue> {
    map.into_iter()
        .map(|(k, v)| Value::try_from(v).map(|v| (k, v)))
        .collect()
}

impl TryFrom<serde_json::Value> for Value {
    type Error = InvalidValue;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Object(map) => Ok(Value::Block(block(map)?)),
            serde_json::Value::Array(items) => {
                if items.iter().any(|i| i.is_object()) {
                    items
                        .into_iter()
                        .map(|item| match item {
                            serde_json::Value::Object(map) => block(map),
                            other => Err(InvalidValue(other.to_string())),
                        })
                        .collect::<Result<Vec<_>, _>>()
                        .map(Value::Blocks)
                } else {
                    items
                        .into_iter()
                        .map(leaf)
                        .collect::<Result<Vec<_>, _>>()
                        .map(Value::List)
                }
            }
            other => leaf(other).map(Value::Scalar),
        }
    }
}

fn block_to_json(attrs: Attributes) -> serde_json::Value {
    serde_json::Value::Object(attrs.into_iter().map(|(k, v)| (k, v.into())).collect())
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Scalar(s) => serde_json::Value::String(s),
            Value::List(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::String).collect())
            }
            Value::Block(attrs) => block_to_json(attrs),
            Value::Blocks(blocks) => {
                serde_json::Value::Array(blocks.into_iter().map(block_to_json).collect())
            }
        }
    }
}
