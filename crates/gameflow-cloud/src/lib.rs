//! GameFlow Cloud
//!
//! Declarative resource reconciliation for game-server hosting control
//! planes. A resource type is described by a [`ResourceSchema`]; a
//! [`ResourceReconciler`] keeps one declared instance in sync with its remote
//! entity through a [`RemoteClient`], translating attributes with the codec
//! (`expand` / `flatten`).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │              gameflow CLI (driver)               │
//! │         plan / apply / refresh / destroy         │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                gameflow-cloud                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │   ResourceReconciler (per instance)       │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ Codec/Schema │  │  State Mgmt  │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │ trait RemoteClient
//! ┌───────▼───────┐
//! │   gamelift    │
//! │   provider    │
//! └───────────────┘
//! ```

pub mod action;
pub mod client;
pub mod codec;
pub mod diff;
pub mod error;
pub mod provider;
pub mod reconciler;
pub mod schema;
pub mod state;
pub mod value;

// Re-exports
pub use action::{Action, ActionResult, ActionType, ApplyResult, Plan, PlanSummary};
pub use client::RemoteClient;
pub use codec::{DesiredState, RemoteEntity, RemoteFields, expand, flatten};
pub use diff::{changed_attributes, forces_replacement};
pub use error::{CloudError, ErrorKind, RemoteError, Result, ValidationError};
pub use provider::{Provider, ResourceConfig, ResourceSet, SchemaCatalog, resource_key};
pub use reconciler::{Lifecycle, Operation, ReadOutcome, ResourceReconciler, UpdateOutcome};
pub use schema::{AttrKind, AttributeSpec, Cardinality, Presence, ResourceSchema, ScalarKind};
pub use state::{GlobalState, ResourceStatus, StateLock, StateManager, TrackedState};
pub use value::{Attributes, Value};
