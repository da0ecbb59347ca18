//! Client error types.

use zkguard_acl::CredentialsError;
use zkguard_types::{NodePath, PathError, Permission};

/// Result type for store and client operations.
pub type ZkResult<T> = Result<T, ZkError>;

/// Errors surfaced by the coordination store and the client wrapper.
///
/// ACL decisions themselves never fail; every variant here originates at the
/// store boundary or from argument validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ZkError {
    /// The node already exists. Callers decide whether that counts as success.
    #[error("node already exists: {path}")]
    NodeExists { path: NodePath },

    /// The node (or the parent it would be created under) does not exist.
    #[error("no node: {path}")]
    NoNode { path: NodePath },

    /// The session's identity lacks the permission the operation needs.
    ///
    /// Signals a policy or identity misconfiguration; never retried.
    #[error("not authorized: {required} on {path}")]
    NoAuth {
        path: NodePath,
        required: Permission,
    },

    /// The node still has children.
    #[error("node not empty: {path}")]
    NotEmpty { path: NodePath },

    /// The connection to the store was lost. Safe to retry only after the
    /// caller has checked whether the operation took effect.
    #[error("connection loss")]
    ConnectionLoss,

    /// The session was closed.
    #[error("session closed")]
    SessionClosed,

    /// The session could not be authenticated.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// Malformed path or argument combination.
    #[error("bad arguments: {0}")]
    BadArguments(String),

    /// Internal store failure.
    #[error("system error: {0}")]
    SystemError(String),
}

impl ZkError {
    /// Returns true for errors a caller may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionLoss)
    }

    pub fn is_no_auth(&self) -> bool {
        matches!(self, Self::NoAuth { .. })
    }

    pub fn is_node_exists(&self) -> bool {
        matches!(self, Self::NodeExists { .. })
    }

    /// The path the error refers to, if any.
    pub fn path(&self) -> Option<&NodePath> {
        match self {
            Self::NodeExists { path }
            | Self::NoNode { path }
            | Self::NoAuth { path, .. }
            | Self::NotEmpty { path } => Some(path),
            _ => None,
        }
    }
}

impl From<PathError> for ZkError {
    fn from(err: PathError) -> Self {
        Self::BadArguments(err.to_string())
    }
}

impl From<CredentialsError> for ZkError {
    fn from(err: CredentialsError) -> Self {
        Self::AuthFailed(err.to_string())
    }
}
