//! The ACL-applying client.
//!
//! [`ZkClient`] wraps a [`ZkSession`] and attaches an ACL chosen by its
//! [`AclProvider`] to every node it creates. Every other operation is passed
//! through to the session unchanged.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use tracing::{debug, info, warn};
use zkguard_acl::{AclProvider, CredentialsProvider, NoCredentials};
use zkguard_types::{AclList, CreateMode, NodePath, SessionIdentity, Stat};

use crate::error::{ZkError, ZkResult};
use crate::session::{Connector, ZkSession};

/// Configures and connects a [`ZkClient`].
///
/// Defaults to the `Open` provider and no credentials.
#[derive(Debug)]
pub struct ZkClientBuilder {
    acl_provider: AclProvider,
    credentials_provider: Box<dyn CredentialsProvider>,
}

impl ZkClientBuilder {
    pub fn new() -> Self {
        Self {
            acl_provider: AclProvider::Open,
            credentials_provider: Box::new(NoCredentials),
        }
    }

    #[must_use]
    pub fn with_acl_provider(mut self, acl_provider: AclProvider) -> Self {
        self.acl_provider = acl_provider;
        self
    }

    #[must_use]
    pub fn with_credentials_provider(
        mut self,
        credentials_provider: impl CredentialsProvider + 'static,
    ) -> Self {
        self.credentials_provider = Box::new(credentials_provider);
        self
    }

    /// Establishes a session and wraps it.
    ///
    /// The credentials provider is consulted exactly once, here.
    pub fn connect<C: Connector>(self, connector: &C) -> ZkResult<ZkClient<C::Session>> {
        let credentials = self.credentials_provider.credentials();
        let session = connector.connect(&credentials)?;
        info!(
            identity = %session.identity(),
            acl_provider = self.acl_provider.name(),
            "client connected"
        );
        Ok(ZkClient {
            session,
            acl_provider: self.acl_provider,
            credentials_provider: self.credentials_provider,
            closed: AtomicBool::new(false),
        })
    }
}

impl Default for ZkClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A store client that secures the nodes it creates.
///
/// Safe to share between threads; the ACL provider is read-only after
/// construction. Paths are taken as strings and validated on every call,
/// failing with [`ZkError::BadArguments`] when malformed.
pub struct ZkClient<S: ZkSession> {
    session: S,
    acl_provider: AclProvider,
    credentials_provider: Box<dyn CredentialsProvider>,
    closed: AtomicBool,
}

impl<S: ZkSession> ZkClient<S> {
    /// Wraps an already established session.
    pub fn from_session(session: S, acl_provider: AclProvider) -> Self {
        Self {
            session,
            acl_provider,
            credentials_provider: Box::new(NoCredentials),
            closed: AtomicBool::new(false),
        }
    }

    pub fn identity(&self) -> &SessionIdentity {
        self.session.identity()
    }

    pub fn acl_provider(&self) -> &AclProvider {
        &self.acl_provider
    }

    pub fn credentials_provider(&self) -> &dyn CredentialsProvider {
        self.credentials_provider.as_ref()
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// The ACL a node at `path` would get if this client created it.
    pub fn acl_for(&self, path: &NodePath, protect: bool) -> AclList {
        self.acl_provider
            .acls_for_path(path, protect, self.session.identity())
    }

    /// Creates one node. The parent must exist.
    ///
    /// Fails with [`ZkError::NodeExists`] if the node is already there and
    /// with [`ZkError::NoAuth`] if the parent denies CREATE.
    pub fn create(
        &self,
        path: &str,
        data: &[u8],
        mode: CreateMode,
        protect: bool,
    ) -> ZkResult<NodePath> {
        self.ensure_open()?;
        let path = NodePath::parse(path)?;
        self.create_node(&path, data, mode, protect)
    }

    /// Creates `path` and any missing ancestors. An existing terminal node
    /// is left alone.
    pub fn make_path(
        &self,
        path: &str,
        data: &[u8],
        mode: CreateMode,
        protect: bool,
    ) -> ZkResult<()> {
        self.make_path_with(path, data, mode, protect, false)
    }

    /// Like [`make_path`](Self::make_path), failing with
    /// [`ZkError::NodeExists`] when `fail_on_exists` is set and the terminal
    /// node already exists.
    ///
    /// Missing ancestors are created persistent, empty, and with the ACL
    /// the provider chooses for them without the `protect` flag. Ancestors
    /// created before a failure are not rolled back.
    pub fn make_path_with(
        &self,
        path: &str,
        data: &[u8],
        mode: CreateMode,
        protect: bool,
        fail_on_exists: bool,
    ) -> ZkResult<()> {
        self.ensure_open()?;
        let path = NodePath::parse(path)?;
        if path.is_root() {
            return if fail_on_exists {
                Err(ZkError::NodeExists { path })
            } else {
                Ok(())
            };
        }

        for ancestor in path.ancestors() {
            if self.session.exists(&ancestor)?.is_some() {
                continue;
            }
            match self.create_node(&ancestor, &[], CreateMode::Persistent, false) {
                Ok(_) | Err(ZkError::NodeExists { .. }) => {}
                Err(err) => return Err(err),
            }
        }

        if self.session.exists(&path)?.is_some() {
            return if fail_on_exists {
                Err(ZkError::NodeExists { path })
            } else {
                debug!(path = %path, "node already exists");
                Ok(())
            };
        }

        match self.create_node(&path, data, mode, protect) {
            Ok(_) => Ok(()),
            // Created concurrently since the exists check.
            Err(ZkError::NodeExists { .. }) if !fail_on_exists => {
                debug!(path = %path, "node already exists");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Returns true if the node exists. Never restricted by ACLs.
    pub fn exists(&self, path: &str) -> ZkResult<bool> {
        Ok(self.stat(path)?.is_some())
    }

    /// The node's metadata, or `None` if it does not exist.
    pub fn stat(&self, path: &str) -> ZkResult<Option<Stat>> {
        self.ensure_open()?;
        let path = NodePath::parse(path)?;
        self.session.exists(&path)
    }

    pub fn get_data(&self, path: &str) -> ZkResult<Bytes> {
        self.ensure_open()?;
        let path = NodePath::parse(path)?;
        let (data, _) = self.session.get_data(&path).inspect_err(|e| self.report(e))?;
        Ok(data)
    }

    pub fn set_data(&self, path: &str, data: &[u8]) -> ZkResult<Stat> {
        self.ensure_open()?;
        let path = NodePath::parse(path)?;
        self.session
            .set_data(&path, data)
            .inspect_err(|e| self.report(e))
    }

    pub fn delete(&self, path: &str) -> ZkResult<()> {
        self.ensure_open()?;
        let path = NodePath::parse(path)?;
        self.session.delete(&path).inspect_err(|e| self.report(e))
    }

    pub fn get_children(&self, path: &str) -> ZkResult<Vec<String>> {
        self.ensure_open()?;
        let path = NodePath::parse(path)?;
        self.session
            .get_children(&path)
            .inspect_err(|e| self.report(e))
    }

    /// Reads the node's ACL. Never restricted by ACLs.
    pub fn get_acl(&self, path: &str) -> ZkResult<AclList> {
        self.ensure_open()?;
        let path = NodePath::parse(path)?;
        let (acl, _) = self.session.get_acl(&path)?;
        Ok(acl)
    }

    /// Deletes `path` and everything below it. A missing node is not an
    /// error. Cleaning the root removes its children only.
    pub fn clean(&self, path: &str) -> ZkResult<()> {
        self.ensure_open()?;
        let path = NodePath::parse(path)?;
        self.clean_node(&path)
    }

    /// Closes the session. Later calls are no-ops.
    pub fn close(&self) -> ZkResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!(identity = %self.session.identity(), "closing client");
        self.session.close()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> ZkResult<()> {
        if self.is_closed() {
            Err(ZkError::SessionClosed)
        } else {
            Ok(())
        }
    }

    fn create_node(
        &self,
        path: &NodePath,
        data: &[u8],
        mode: CreateMode,
        protect: bool,
    ) -> ZkResult<NodePath> {
        let acl = self.acl_for(path, protect);
        debug!(path = %path, protect, acl = %acl, ?mode, "creating node");
        self.session
            .create(path, data, mode, &acl)
            .inspect_err(|e| self.report(e))
    }

    fn clean_node(&self, path: &NodePath) -> ZkResult<()> {
        let children = match self.session.get_children(path) {
            Ok(children) => children,
            Err(ZkError::NoNode { .. }) => return Ok(()),
            Err(err) => {
                self.report(&err);
                return Err(err);
            }
        };
        for child in children {
            self.clean_node(&path.join(&child)?)?;
        }
        if path.is_root() {
            return Ok(());
        }
        match self.session.delete(path) {
            Ok(()) | Err(ZkError::NoNode { .. }) => Ok(()),
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    fn report(&self, err: &ZkError) {
        if let ZkError::NoAuth { path, required } = err {
            warn!(
                path = %path,
                %required,
                identity = %self.session.identity(),
                acl_provider = self.acl_provider.name(),
                "permission denied"
            );
        }
    }
}

impl<S: ZkSession> fmt::Debug for ZkClient<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZkClient")
            .field("identity", self.session.identity())
            .field("acl_provider", &self.acl_provider)
            .field("credentials_provider", &self.credentials_provider)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl<S: ZkSession> Drop for ZkClient<S> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(error = %err, "failed to close session on drop");
        }
    }
}
