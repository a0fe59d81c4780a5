//! Reconciler error types

use crate::reconciler::{Lifecycle, Operation};
use thiserror::Error;

/// Local validation failures, detected before any remote call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required block '{attribute}' is missing or empty")]
    MissingRequiredBlock { attribute: String },

    #[error("Required attribute '{attribute}' is missing")]
    MissingRequiredAttribute { attribute: String },

    #[error("Attribute '{attribute}' expects {expected}, got {found}")]
    TypeMismatch {
        attribute: String,
        expected: String,
        found: String,
    },

    #[error("Attribute '{attribute}' allows a single block, got {count}")]
    MultipleBlocksNotAllowed { attribute: String, count: usize },
}

/// Failures reported by a [`RemoteClient`](crate::RemoteClient)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Remote entity not found: {0}")]
    NotFound(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

impl RemoteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound(_))
    }
}

/// What the caller should do about a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The declaration is invalid; fix the configuration
    FixConfiguration,
    /// Transient or remote failure; the same operation may be retried
    RetryLater,
    /// The backing entity is gone or must be replaced
    NeedsRecreation,
    /// Local state file or programming error
    Internal,
}

/// Cloud reconciler errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid resource '{key}': {source}")]
    InvalidResource {
        key: String,
        #[source]
        source: ValidationError,
    },

    #[error("Immutable attributes changed on {resource_type} '{id}': {}", .attributes.join(", "))]
    ImmutableAttributeChanged {
        resource_type: String,
        id: String,
        attributes: Vec<String>,
    },

    #[error("Attributes of {resource_type} '{id}' cannot be removed in place: {}", .attributes.join(", "))]
    AttributeNotClearable {
        resource_type: String,
        id: String,
        attributes: Vec<String>,
    },

    #[error("Remote call failed: {0}")]
    Remote(#[from] RemoteError),

    #[error("Cannot {operation} a resource in state {state}")]
    InvalidTransition { operation: Operation, state: Lifecycle },

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CloudError::Validation(_)
            | CloudError::InvalidResource { .. }
            | CloudError::ImmutableAttributeChanged { .. }
            | CloudError::AttributeNotClearable { .. }
            | CloudError::UnknownResourceType(_) => ErrorKind::FixConfiguration,
            CloudError::Remote(RemoteError::NotFound(_)) => ErrorKind::NeedsRecreation,
            CloudError::Remote(_) => ErrorKind::RetryLater,
            CloudError::InvalidTransition { .. }
            | CloudError::StateError(_)
            | CloudError::LockError(_)
            | CloudError::Io(_)
            | CloudError::Json(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
