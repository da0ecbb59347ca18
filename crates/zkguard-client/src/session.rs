//! Session abstraction.
//!
//! The [`ZkSession`] trait is the black-box handle to the coordination
//! store: transport, reconnects and watch delivery live behind it. A
//! [`Connector`] establishes a session, running whatever authentication
//! handshake the deployment uses, and reports the outcome only as a
//! [`SessionIdentity`].
//!
//! ```text
//! ┌──────────────────────────┐
//! │         ZkClient         │
//! │  (applies ACL policy)    │
//! └────────────┬─────────────┘
//!              │ ZkSession
//! ┌────────────┴─────────────┐
//! │  ┌─────────┐  ┌────────┐ │
//! │  │ Memory  │  │ Network│ │
//! │  │ Session │  │ client │ │
//! │  └─────────┘  └────────┘ │
//! └──────────────────────────┘
//! ```

use std::sync::Arc;

use bytes::Bytes;
use zkguard_acl::ZkCredentials;
use zkguard_types::{AclList, CreateMode, NodePath, SessionIdentity, Stat};

use crate::error::ZkResult;

/// Handle to an established store session.
///
/// All methods are synchronous and may be called from several threads at
/// once; ordering between concurrent calls is whatever the store provides.
pub trait ZkSession: Send + Sync {
    /// Identity established when the session connected. Never changes.
    fn identity(&self) -> &SessionIdentity;

    /// Creates a node with its data and ACL in one atomic step.
    ///
    /// Returns the path of the created node.
    fn create(
        &self,
        path: &NodePath,
        data: &[u8],
        mode: CreateMode,
        acl: &AclList,
    ) -> ZkResult<NodePath>;

    /// Returns the node's metadata, or `None` if it does not exist.
    fn exists(&self, path: &NodePath) -> ZkResult<Option<Stat>>;

    /// Reads the node's data.
    fn get_data(&self, path: &NodePath) -> ZkResult<(Bytes, Stat)>;

    /// Overwrites the node's data.
    fn set_data(&self, path: &NodePath, data: &[u8]) -> ZkResult<Stat>;

    /// Deletes a node without children.
    fn delete(&self, path: &NodePath) -> ZkResult<()>;

    /// Lists the names of the node's direct children, sorted.
    fn get_children(&self, path: &NodePath) -> ZkResult<Vec<String>>;

    /// Reads the node's ACL.
    fn get_acl(&self, path: &NodePath) -> ZkResult<(AclList, Stat)>;

    /// Releases the session and everything it owns. Idempotent.
    fn close(&self) -> ZkResult<()>;
}

/// Establishes sessions.
///
/// Credentials come from the client's
/// [`CredentialsProvider`](zkguard_acl::CredentialsProvider) and are bound to
/// the session as part of establishing it.
pub trait Connector {
    type Session: ZkSession;

    fn connect(&self, credentials: &[ZkCredentials]) -> ZkResult<Self::Session>;
}

impl<S: ZkSession + ?Sized> ZkSession for Arc<S> {
    fn identity(&self) -> &SessionIdentity {
        (**self).identity()
    }

    fn create(
        &self,
        path: &NodePath,
        data: &[u8],
        mode: CreateMode,
        acl: &AclList,
    ) -> ZkResult<NodePath> {
        (**self).create(path, data, mode, acl)
    }

    fn exists(&self, path: &NodePath) -> ZkResult<Option<Stat>> {
        (**self).exists(path)
    }

    fn get_data(&self, path: &NodePath) -> ZkResult<(Bytes, Stat)> {
        (**self).get_data(path)
    }

    fn set_data(&self, path: &NodePath, data: &[u8]) -> ZkResult<Stat> {
        (**self).set_data(path, data)
    }

    fn delete(&self, path: &NodePath) -> ZkResult<()> {
        (**self).delete(path)
    }

    fn get_children(&self, path: &NodePath) -> ZkResult<Vec<String>> {
        (**self).get_children(path)
    }

    fn get_acl(&self, path: &NodePath) -> ZkResult<(AclList, Stat)> {
        (**self).get_acl(path)
    }

    fn close(&self) -> ZkResult<()> {
        (**self).close()
    }
}
