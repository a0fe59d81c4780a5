//! GameLift provider error types

use aws_sdk_gamelift::error::{
    BuildError, DisplayErrorContext, ProvideErrorMetadata, SdkError,
};
use gameflow_cloud::RemoteError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameLiftError {
    #[error("Field {field} must be a 32-bit integer, got '{value}'")]
    InvalidInteger { field: String, value: String },

    #[error("Incomplete {shape}: {source}")]
    Incomplete {
        shape: &'static str,
        #[source]
        source: BuildError,
    },

    #[error("Response for {0} carried no identifier")]
    MissingIdentifier(&'static str),
}

pub type Result<T> = std::result::Result<T, GameLiftError>;

impl From<GameLiftError> for RemoteError {
    fn from(err: GameLiftError) -> Self {
        RemoteError::Api(err.to_string())
    }
}

/// Classify an SDK failure for the reconciler
pub(crate) fn remote_error<E>(id: &str, err: SdkError<E>) -> RemoteError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    if matches!(err, SdkError::TimeoutError(_)) {
        return RemoteError::Timeout(format!("request for {} timed out", id));
    }
    if err.as_service_error().and_then(|e| e.code()) == Some("NotFoundException") {
        return RemoteError::NotFound(id.to_string());
    }
    RemoteError::Api(DisplayErrorContext(&err).to_string())
}
