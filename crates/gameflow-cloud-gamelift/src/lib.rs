//! Amazon GameLift provider for GameFlow
//!
//! This crate implements the `Provider` trait for Amazon GameLift, with one
//! `RemoteClient` per resource type:
//!
//! - `build`: uploaded game server builds
//! - `fleet`: EC2 fleets running a build
//! - `alias`: routing aliases in front of fleets
//!
//! # Requirements
//!
//! - AWS credentials resolvable through the default provider chain
//!
//! # Example
//!
//! ```ignore
//! use gameflow_cloud::Provider;
//! use gameflow_cloud_gamelift::GameLiftProvider;
//!
//! let provider = GameLiftProvider::from_env(Some("us-west-2".into()), None).await;
//! let mut reconciler = provider.reconciler("alias", None)?;
//! reconciler.create(&desired).await?;
//! ```

pub mod alias;
pub mod build;
pub mod error;
mod fields;
pub mod fleet;
pub mod provider;
pub mod schema;

pub use alias::AliasClient;
pub use build::BuildClient;
pub use error::{GameLiftError, Result};
pub use fleet::FleetClient;
pub use provider::GameLiftProvider;
pub use schema::catalog;
