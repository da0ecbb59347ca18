//! Error types for the zkguard facade.

use thiserror::Error;
use zkguard_acl::CredentialsError;
use zkguard_client::ZkError;
use zkguard_config::ConfigError;
use zkguard_types::PathError;

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, ZkGuardError>;

/// Errors from building or connecting a client out of configuration.
#[derive(Debug, Error)]
pub enum ZkGuardError {
    /// Configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configured digest credentials are unusable.
    #[error("invalid credentials: {0}")]
    Credentials(#[from] CredentialsError),

    /// A configured path is malformed.
    #[error("invalid path: {0}")]
    Path(#[from] PathError),

    /// The store rejected the connection.
    #[error(transparent)]
    Zk(#[from] ZkError),

    /// A global tracing subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Tracing(String),
}
