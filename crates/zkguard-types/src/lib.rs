//! # zkguard-types: Core types for `zkguard`
//!
//! Shared value types used across the ACL layer:
//! - Node paths ([`NodePath`], [`SECURITY_CONFIG_PATH`])
//! - ACL entries ([`Acl`], [`AclList`], [`Scheme`])
//! - Permissions ([`Permission`], [`Perms`])
//! - Session identity ([`SessionIdentity`])
//! - Node metadata ([`CreateMode`], [`Stat`])

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

mod acl;
mod path;

pub use acl::{Acl, AclList, EmptyAclList, Permission, Perms, Scheme, UnknownScheme};
pub use path::{NodePath, PathError, ROOT_PATH, SECURITY_CONFIG_PATH};

// ============================================================================
// Session identity
// ============================================================================

/// Who a session is, as established when it connected.
///
/// The identity is fixed for the session's lifetime. It is the input ACL
/// providers use to scope restricted entries to the creating session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum SessionIdentity {
    /// No authentication took place.
    #[default]
    Anonymous,
    /// Strong (SASL/Kerberos) authentication succeeded as this principal.
    AuthenticatedPrincipal(String),
    /// The session presented digest credentials for this username.
    DigestIdentity(String),
}

impl SessionIdentity {
    pub fn authenticated(principal: impl Into<String>) -> Self {
        Self::AuthenticatedPrincipal(principal.into())
    }

    pub fn digest(username: impl Into<String>) -> Self {
        Self::DigestIdentity(username.into())
    }

    /// The SASL principal, if the session has one.
    pub fn principal(&self) -> Option<&str> {
        match self {
            Self::AuthenticatedPrincipal(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }
}

impl Display for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("anonymous"),
            Self::AuthenticatedPrincipal(name) => write!(f, "sasl:{name}"),
            Self::DigestIdentity(name) => write!(f, "digest:{name}"),
        }
    }
}

// ============================================================================
// Node metadata
// ============================================================================

/// How a node is created. Passed through to the store unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CreateMode {
    /// The node outlives the session that created it.
    #[default]
    Persistent,
    /// The node is tied to the creating session.
    Ephemeral,
}

impl CreateMode {
    pub fn is_ephemeral(self) -> bool {
        matches!(self, CreateMode::Ephemeral)
    }
}

/// Metadata returned by the store for an existing node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    /// Length of the node's data in bytes.
    pub data_length: usize,
    /// Number of direct children.
    pub num_children: usize,
    /// Mode the node was created with.
    pub mode: CreateMode,
}
