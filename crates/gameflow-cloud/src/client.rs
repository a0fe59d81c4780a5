//! Remote control-plane client trait

use crate::codec::{RemoteEntity, RemoteFields};
use crate::error::RemoteError;
use async_trait::async_trait;

/// Create/Read/Update/Delete calls for one resource type
///
/// Implementations are stateless from the reconciler's point of view (or
/// synchronised internally) and are shared between reconcilers. A missing
/// entity must be reported as [`RemoteError::NotFound`].
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Resource type served by this client (e.g. "alias", "fleet")
    fn resource_type(&self) -> &str;

    /// Create a new entity; the returned identifier is final
    async fn create(&self, fields: &RemoteFields) -> Result<RemoteEntity, RemoteError>;

    async fn read(&self, id: &str) -> Result<RemoteEntity, RemoteError>;

    /// Apply `fields` to an existing entity; unlisted fields are left alone
    async fn update(&self, id: &str, fields: &RemoteFields) -> Result<RemoteEntity, RemoteError>;

    async fn delete(&self, id: &str) -> Result<(), RemoteError>;
}
