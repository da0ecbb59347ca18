//! In-process coordination store.
//!
//! [`MemoryStore`] keeps a node tree in memory and checks ACLs the way the
//! networked store does:
//!
//! | Operation      | Checked node | Permission |
//! |----------------|--------------|------------|
//! | `create`       | parent       | CREATE     |
//! | `delete`       | parent       | DELETE     |
//! | `get_data`     | node         | READ       |
//! | `get_children` | node         | READ       |
//! | `set_data`     | node         | WRITE      |
//! | `exists`       | none         |            |
//! | `get_acl`      | none         |            |
//!
//! Sessions come from a [`MemoryConnector`], which stands in for the
//! authentication handshake. Several connectors with different handshakes
//! can share one store, so tests can observe how nodes written by one
//! identity look to another.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bytes::Bytes;
use tracing::{debug, info, warn};
use zkguard_acl::{ZkCredentials, generate_digest, parse_digest_auth};
use zkguard_types::{
    Acl, AclList, CreateMode, NodePath, Permission, Scheme, SessionIdentity, Stat,
};

use crate::error::{ZkError, ZkResult};
use crate::session::{Connector, ZkSession};

// ============================================================================
// Options
// ============================================================================

/// Server-side switches of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Authenticate sessions through the SASL handshake. When off, SASL
    /// handshakes are ignored and such sessions connect anonymously.
    pub sasl_enabled: bool,
    /// Grant every operation regardless of ACLs.
    pub skip_acl: bool,
    /// Drop the `/host` part of Kerberos principals.
    pub remove_host_from_principal: bool,
    /// Drop the `@REALM` part of Kerberos principals.
    pub remove_realm_from_principal: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            sasl_enabled: true,
            skip_acl: false,
            remove_host_from_principal: false,
            remove_realm_from_principal: false,
        }
    }
}

impl StoreOptions {
    /// Options that reduce `solr/host@REALM` to `solr`.
    pub fn short_principals() -> Self {
        Self {
            remove_host_from_principal: true,
            remove_realm_from_principal: true,
            ..Self::default()
        }
    }

    /// Maps a Kerberos principal to the id used in `sasl` ACL entries.
    ///
    /// ```
    /// use zkguard_client::StoreOptions;
    ///
    /// let options = StoreOptions::short_principals();
    /// assert_eq!(options.normalize_principal("solr/node1.example.com@EXAMPLE.COM"), "solr");
    /// assert_eq!(StoreOptions::default().normalize_principal("solr@EXAMPLE.COM"), "solr@EXAMPLE.COM");
    /// ```
    pub fn normalize_principal(&self, principal: &str) -> String {
        let (user_and_host, realm) = match principal.split_once('@') {
            Some((user_and_host, realm)) => (user_and_host, Some(realm)),
            None => (principal, None),
        };
        let (user, host) = match user_and_host.split_once('/') {
            Some((user, host)) => (user, Some(host)),
            None => (user_and_host, None),
        };

        let mut id = user.to_string();
        if let Some(host) = host.filter(|_| !self.remove_host_from_principal) {
            id.push('/');
            id.push_str(host);
        }
        if let Some(realm) = realm.filter(|_| !self.remove_realm_from_principal) {
            id.push('@');
            id.push_str(realm);
        }
        id
    }
}

// ============================================================================
// Store
// ============================================================================

#[derive(Debug, Clone)]
struct Node {
    data: Bytes,
    acl: AclList,
    mode: CreateMode,
    children: BTreeSet<String>,
}

impl Node {
    fn new(data: &[u8], acl: AclList, mode: CreateMode) -> Self {
        Self {
            data: Bytes::copy_from_slice(data),
            acl,
            mode,
            children: BTreeSet::new(),
        }
    }

    fn stat(&self) -> Stat {
        Stat {
            data_length: self.data.len(),
            num_children: self.children.len(),
            mode: self.mode,
        }
    }
}

type Tree = BTreeMap<NodePath, Node>;

#[derive(Debug)]
struct StoreInner {
    options: StoreOptions,
    tree: RwLock<Tree>,
    available: AtomicBool,
    next_session_id: AtomicU64,
}

/// A shared in-memory node tree.
///
/// Cloning is cheap and yields a handle to the same tree.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<StoreInner>,
}

impl MemoryStore {
    /// Creates a store with default options. The root node is open.
    pub fn new() -> Self {
        Self::with_options(StoreOptions::default())
    }

    pub fn with_options(options: StoreOptions) -> Self {
        let mut tree = Tree::new();
        tree.insert(
            NodePath::root(),
            Node::new(&[], AclList::open(), CreateMode::Persistent),
        );
        Self {
            inner: Arc::new(StoreInner {
                options,
                tree: RwLock::new(tree),
                available: AtomicBool::new(true),
                next_session_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn options(&self) -> StoreOptions {
        self.inner.options
    }

    /// Connector whose sessions authenticate with `handshake`.
    pub fn connector(&self, handshake: Handshake) -> MemoryConnector {
        MemoryConnector {
            store: self.clone(),
            handshake,
        }
    }

    /// Connector for sessions without a SASL handshake.
    pub fn anonymous(&self) -> MemoryConnector {
        self.connector(Handshake::None)
    }

    /// Connector for sessions that authenticate as a Kerberos principal.
    pub fn kerberos(&self, principal: impl Into<String>) -> MemoryConnector {
        self.connector(Handshake::Kerberos {
            principal: principal.into(),
        })
    }

    /// Simulates the store going away or coming back. While unavailable,
    /// every session operation and every connect fails with
    /// [`ZkError::ConnectionLoss`].
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.inner.available.load(Ordering::SeqCst)
    }

    /// Reads a node's ACL without a session and without any check.
    pub fn acl_of(&self, path: &NodePath) -> ZkResult<Option<AclList>> {
        Ok(self.read()?.get(path).map(|node| node.acl.clone()))
    }

    /// Number of nodes, the root included.
    pub fn node_count(&self) -> ZkResult<usize> {
        Ok(self.read()?.len())
    }

    fn read(&self) -> ZkResult<RwLockReadGuard<'_, Tree>> {
        self.inner
            .tree
            .read()
            .map_err(|_| ZkError::SystemError("node tree lock poisoned".to_string()))
    }

    fn write(&self) -> ZkResult<RwLockWriteGuard<'_, Tree>> {
        self.inner
            .tree
            .write()
            .map_err(|_| ZkError::SystemError("node tree lock poisoned".to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Connector
// ============================================================================

/// How a session authenticates when it connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handshake {
    /// No SASL handshake; the session is anonymous unless it presents
    /// digest credentials.
    None,
    /// A successful Kerberos handshake as `principal`.
    Kerberos { principal: String },
    /// A handshake the server rejects.
    Rejected { reason: String },
}

/// Establishes [`MemorySession`]s against a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    store: MemoryStore,
    handshake: Handshake,
}

impl MemoryConnector {
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn handshake(&self) -> &Handshake {
        &self.handshake
    }
}

impl Connector for MemoryConnector {
    type Session = MemorySession;

    fn connect(&self, credentials: &[ZkCredentials]) -> ZkResult<MemorySession> {
        if !self.store.is_available() {
            return Err(ZkError::ConnectionLoss);
        }
        let options = self.store.options();
        let mut identity = SessionIdentity::Anonymous;
        let mut auth_ids = Vec::new();

        match &self.handshake {
            Handshake::None => {}
            Handshake::Kerberos { principal } if options.sasl_enabled => {
                let id = options.normalize_principal(principal);
                auth_ids.push((Scheme::Sasl, id.clone()));
                identity = SessionIdentity::authenticated(id);
            }
            Handshake::Rejected { reason } if options.sasl_enabled => {
                warn!(reason = %reason, "SASL handshake rejected");
                return Err(ZkError::AuthFailed(reason.clone()));
            }
            Handshake::Kerberos { .. } | Handshake::Rejected { .. } => {
                debug!("SASL disabled on the store, ignoring handshake");
            }
        }

        for credentials in credentials {
            match credentials.scheme() {
                Scheme::Digest => {
                    let (username, password) = parse_digest_auth(credentials.auth())?;
                    auth_ids.push((Scheme::Digest, generate_digest(&username, &password)));
                    if identity.is_anonymous() {
                        identity = SessionIdentity::digest(username);
                    }
                }
                scheme => {
                    return Err(ZkError::AuthFailed(format!(
                        "unsupported auth scheme: {scheme}"
                    )));
                }
            }
        }

        let session_id = self.store.inner.next_session_id.fetch_add(1, Ordering::Relaxed);
        info!(session_id, identity = %identity, "session established");

        Ok(MemorySession {
            store: self.store.clone(),
            session_id,
            identity,
            auth_ids,
            state: AtomicU8::new(CONNECTED),
        })
    }
}

// ============================================================================
// Session
// ============================================================================

const CONNECTED: u8 = 0;
const DISCONNECTED: u8 = 1;
const CLOSED: u8 = 2;

/// A session on a [`MemoryStore`].
#[derive(Debug)]
pub struct MemorySession {
    store: MemoryStore,
    session_id: u64,
    identity: SessionIdentity,
    auth_ids: Vec<(Scheme, String)>,
    state: AtomicU8,
}

impl MemorySession {
    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    /// The `(scheme, id)` pairs ACL entries are matched against.
    pub fn auth_ids(&self) -> &[(Scheme, String)] {
        &self.auth_ids
    }

    /// Drops the connection. Operations fail with
    /// [`ZkError::ConnectionLoss`] until [`reconnect`](Self::reconnect).
    ///
    /// Does nothing unless the session is connected. A closed session stays
    /// closed.
    pub fn disconnect(&self) {
        if self
            .state
            .compare_exchange(CONNECTED, DISCONNECTED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            debug!(session_id = self.session_id, "session disconnected");
        }
    }

    /// Does nothing unless the session is disconnected.
    pub fn reconnect(&self) {
        if self
            .state
            .compare_exchange(DISCONNECTED, CONNECTED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            debug!(session_id = self.session_id, "session reconnected");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.load(Ordering::SeqCst) == CLOSED
    }

    fn ensure_connected(&self) -> ZkResult<()> {
        match self.state.load(Ordering::SeqCst) {
            CLOSED => Err(ZkError::SessionClosed),
            DISCONNECTED => Err(ZkError::ConnectionLoss),
            _ if !self.store.is_available() => Err(ZkError::ConnectionLoss),
            _ => Ok(()),
        }
    }

    fn matches(&self, entry: &Acl) -> bool {
        match entry.scheme() {
            Scheme::World => true,
            scheme => self
                .auth_ids
                .iter()
                .any(|(auth_scheme, id)| *auth_scheme == scheme && id == entry.id()),
        }
    }

    fn check_acl(&self, node: &Node, required: Permission, path: &NodePath) -> ZkResult<()> {
        if self.store.inner.options.skip_acl {
            return Ok(());
        }
        let granted = node
            .acl
            .iter()
            .any(|entry| entry.perms().allows(required) && self.matches(entry));
        if granted {
            Ok(())
        } else {
            debug!(session_id = self.session_id, path = %path, %required, "ACL check failed");
            Err(ZkError::NoAuth {
                path: path.clone(),
                required,
            })
        }
    }
}

impl ZkSession for MemorySession {
    fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    fn create(
        &self,
        path: &NodePath,
        data: &[u8],
        mode: CreateMode,
        acl: &AclList,
    ) -> ZkResult<NodePath> {
        self.ensure_connected()?;
        let Some(parent_path) = path.parent() else {
            return Err(ZkError::NodeExists { path: path.clone() });
        };

        let mut tree = self.store.write()?;
        let parent = tree
            .get(&parent_path)
            .ok_or_else(|| ZkError::NoNode { path: path.clone() })?;
        self.check_acl(parent, Permission::Create, path)?;
        if tree.contains_key(path) {
            return Err(ZkError::NodeExists { path: path.clone() });
        }

        tree.insert(path.clone(), Node::new(data, acl.clone(), mode));
        if let Some(parent) = tree.get_mut(&parent_path) {
            parent.children.insert(path.name().to_string());
        }
        debug!(session_id = self.session_id, path = %path, acl = %acl, "node created");
        Ok(path.clone())
    }

    fn exists(&self, path: &NodePath) -> ZkResult<Option<Stat>> {
        self.ensure_connected()?;
        Ok(self.store.read()?.get(path).map(Node::stat))
    }

    fn get_data(&self, path: &NodePath) -> ZkResult<(Bytes, Stat)> {
        self.ensure_connected()?;
        let tree = self.store.read()?;
        let node = tree
            .get(path)
            .ok_or_else(|| ZkError::NoNode { path: path.clone() })?;
        self.check_acl(node, Permission::Read, path)?;
        Ok((node.data.clone(), node.stat()))
    }

    fn set_data(&self, path: &NodePath, data: &[u8]) -> ZkResult<Stat> {
        self.ensure_connected()?;
        let mut tree = self.store.write()?;
        let node = tree
            .get_mut(path)
            .ok_or_else(|| ZkError::NoNode { path: path.clone() })?;
        self.check_acl(node, Permission::Write, path)?;
        node.data = Bytes::copy_from_slice(data);
        Ok(node.stat())
    }

    fn delete(&self, path: &NodePath) -> ZkResult<()> {
        self.ensure_connected()?;
        let Some(parent_path) = path.parent() else {
            return Err(ZkError::BadArguments("the root node cannot be deleted".to_string()));
        };

        let mut tree = self.store.write()?;
        let parent = tree
            .get(&parent_path)
            .ok_or_else(|| ZkError::NoNode { path: path.clone() })?;
        self.check_acl(parent, Permission::Delete, path)?;
        let node = tree
            .get(path)
            .ok_or_else(|| ZkError::NoNode { path: path.clone() })?;
        if !node.children.is_empty() {
            return Err(ZkError::NotEmpty { path: path.clone() });
        }

        tree.remove(path);
        if let Some(parent) = tree.get_mut(&parent_path) {
            parent.children.remove(path.name());
        }
        debug!(session_id = self.session_id, path = %path, "node deleted");
        Ok(())
    }

    fn get_children(&self, path: &NodePath) -> ZkResult<Vec<String>> {
        self.ensure_connected()?;
        let tree = self.store.read()?;
        let node = tree
            .get(path)
            .ok_or_else(|| ZkError::NoNode { path: path.clone() })?;
        self.check_acl(node, Permission::Read, path)?;
        Ok(node.children.iter().cloned().collect())
    }

    fn get_acl(&self, path: &NodePath) -> ZkResult<(AclList, Stat)> {
        self.ensure_connected()?;
        let tree = self.store.read()?;
        let node = tree
            .get(path)
            .ok_or_else(|| ZkError::NoNode { path: path.clone() })?;
        Ok((node.acl.clone(), node.stat()))
    }

    fn close(&self) -> ZkResult<()> {
        if self.state.swap(CLOSED, Ordering::SeqCst) != CLOSED {
            info!(session_id = self.session_id, "session closed");
        }
        Ok(())
    }
}
