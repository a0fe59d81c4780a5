//! Attribute schema tables
//!
//! Each resource type is described by a [`ResourceSchema`]: the list of
//! attributes it accepts, how they map to the remote API, and which of them
//! force replacement when changed.

use crate::value::Value;

/// Leaf type of a scalar attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Integer,
    Boolean,
}

impl ScalarKind {
    pub fn accepts(&self, raw: &str) -> bool {
        match self {
            ScalarKind::String => true,
            ScalarKind::Integer => raw.parse::<i64>().is_ok(),
            ScalarKind::Boolean => raw == "true" || raw == "false",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Integer => "integer",
            ScalarKind::Boolean => "boolean",
        }
    }
}

/// How many nested blocks an attribute holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Exactly one block, written locally as a one-element list
    Single,
    /// Any number of blocks, order preserved
    List,
}

/// Shape of an attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrKind {
    Scalar(ScalarKind),
    ScalarList,
    Block {
        cardinality: Cardinality,
        attributes: Vec<AttributeSpec>,
    },
}

impl AttrKind {
    pub fn describe(&self) -> String {
        match self {
            AttrKind::Scalar(kind) => kind.name().to_string(),
            AttrKind::ScalarList => "list".to_string(),
            AttrKind::Block {
                cardinality: Cardinality::Single,
                ..
            } => "single block".to_string(),
            AttrKind::Block {
                cardinality: Cardinality::List,
                ..
            } => "block list".to_string(),
        }
    }

    /// Remote value that clears the attribute
    pub fn empty_remote_value(&self) -> Value {
        match self {
            AttrKind::Scalar(_) => Value::Scalar(String::new()),
            AttrKind::ScalarList => Value::List(Vec::new()),
            AttrKind::Block {
                cardinality: Cardinality::Single,
                ..
            } => Value::Block(Default::default()),
            AttrKind::Block {
                cardinality: Cardinality::List,
                ..
            } => Value::Blocks(Vec::new()),
        }
    }
}

/// Whether the user must, may, or cannot set an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
    /// Optional; the remote service picks a value when none is declared
    OptionalComputed,
    /// Set by the remote service only
    Computed,
}

/// Description of one attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSpec {
    /// Local (configuration) name
    pub name: String,

    /// Name used in remote request/response fields
    pub remote_name: String,

    pub kind: AttrKind,

    pub presence: Presence,

    /// Value sent when the attribute is optional and not declared
    pub default: Option<String>,

    /// Changing the value requires delete + create
    pub immutable: bool,

    /// Never returned by the remote read; the last known value is kept
    pub write_only: bool,

    /// The remote API can reset the value once set
    pub clearable: bool,
}

impl AttributeSpec {
    pub fn new(name: impl Into<String>, remote_name: impl Into<String>, kind: AttrKind) -> Self {
        Self {
            name: name.into(),
            remote_name: remote_name.into(),
            kind,
            presence: Presence::Optional,
            default: None,
            immutable: false,
            write_only: false,
            clearable: true,
        }
    }

    pub fn string(name: impl Into<String>, remote_name: impl Into<String>) -> Self {
        Self::new(name, remote_name, AttrKind::Scalar(ScalarKind::String))
    }

    pub fn integer(name: impl Into<String>, remote_name: impl Into<String>) -> Self {
        Self::new(name, remote_name, AttrKind::Scalar(ScalarKind::Integer))
    }

    pub fn string_list(name: impl Into<String>, remote_name: impl Into<String>) -> Self {
        Self::new(name, remote_name, AttrKind::ScalarList)
    }

    pub fn block(
        name: impl Into<String>,
        remote_name: impl Into<String>,
        attributes: Vec<AttributeSpec>,
    ) -> Self {
        Self::new(
            name,
            remote_name,
            AttrKind::Block {
                cardinality: Cardinality::Single,
                attributes,
            },
        )
    }

    pub fn block_list(
        name: impl Into<String>,
        remote_name: impl Into<String>,
        attributes: Vec<AttributeSpec>,
    ) -> Self {
        Self::new(
            name,
            remote_name,
            AttrKind::Block {
                cardinality: Cardinality::List,
                attributes,
            },
        )
    }

    pub fn required(mut self) -> Self {
        self.presence = Presence::Required;
        self
    }

    pub fn computed(mut self) -> Self {
        self.presence = Presence::Computed;
        self
    }

    /// Leave the value to the service when undeclared
    pub fn server_default(mut self) -> Self {
        self.presence = Presence::OptionalComputed;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.write_only = true;
        self
    }

    /// Removing a declared value needs delete + create
    pub fn not_clearable(mut self) -> Self {
        self.clearable = false;
        self
    }

    pub fn is_required(&self) -> bool {
        self.presence == Presence::Required
    }

    pub fn is_computed(&self) -> bool {
        self.presence == Presence::Computed
    }

    pub fn is_server_default(&self) -> bool {
        self.presence == Presence::OptionalComputed
    }

    pub fn is_single_block(&self) -> bool {
        matches!(
            self.kind,
            AttrKind::Block {
                cardinality: Cardinality::Single,
                ..
            }
        )
    }
}

/// Attribute table and status rules for one resource type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSchema {
    pub resource_type: String,

    pub attributes: Vec<AttributeSpec>,

    /// Local name of the attribute carrying the remote lifecycle status
    pub status_attribute: Option<String>,

    /// Status values that mean the remote entity is unusable
    pub failed_statuses: Vec<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: Vec::new(),
            status_attribute: None,
            failed_statuses: Vec::new(),
        }
    }

    pub fn attribute(mut self, spec: AttributeSpec) -> Self {
        self.attributes.push(spec);
        self
    }

    pub fn with_failed_status<I, S>(mut self, attribute: impl Into<String>, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.status_attribute = Some(attribute.into());
        self.failed_statuses = statuses.into_iter().map(Into::into).collect();
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Attributes the user may declare
    pub fn configurable(&self) -> impl Iterator<Item = &AttributeSpec> {
        self.attributes.iter().filter(|a| !a.is_computed())
    }

    pub fn is_failed_status(&self, status: &str) -> bool {
        self.failed_statuses.iter().any(|s| s == status)
    }
}
