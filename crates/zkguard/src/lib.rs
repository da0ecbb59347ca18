//! # zkguard
//!
//! ACL policy and enforcement for hierarchical coordination stores.
//!
//! Every node a [`ZkClient`] creates gets an access-control list chosen by
//! its [`AclProvider`]. Ordinary nodes stay open; the security-configuration
//! node and nodes created with `protect = true` are world-readable but only
//! writable by a privileged identity:
//!
//! - **`SaslRestricted`**: the principal the session authenticated as
//! - **`DigestRestricted`**: a configured `user:password` digest identity
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────────────┐
//! │ zkguard-     │ → │ zkguard-acl  │ → │ zkguard-client       │
//! │ config       │   │ (providers)  │   │ (ZkClient, sessions) │
//! └──────────────┘   └──────────────┘   └──────────────────────┘
//!                          ↑
//!                   zkguard-types (paths, ACLs, identities)
//! ```
//!
//! # Quick Start
//!
//! ```
//! use zkguard::{AclConfig, CreateMode, MemoryStore, ProviderKind};
//!
//! let store = MemoryStore::new();
//! let config = AclConfig {
//!     provider: ProviderKind::Sasl,
//!     ..AclConfig::default()
//! };
//!
//! let client = zkguard::connect(&config, &store.kerberos("solr"))?;
//! client.make_path("/security.json", b"{}", CreateMode::Persistent, false)?;
//! assert!(!client.get_acl("/security.json")?.is_world_writable());
//! # Ok::<(), zkguard::ZkGuardError>(())
//! ```

mod error;
mod setup;

pub use error::{Result, ZkGuardError};
pub use setup::{acl_provider, client_builder, connect, credentials_provider};

// Re-export core types
pub use zkguard_types::{
    Acl, AclList, CreateMode, NodePath, PathError, Permission, Perms, SECURITY_CONFIG_PATH,
    Scheme, SessionIdentity, Stat,
};

// Re-export ACL policy
pub use zkguard_acl::{
    AclProvider, CredentialsProvider, DigestCredentialsProvider, DigestRestriction, NoCredentials,
    SaslRestriction, SecurityAware, SecurityClassifier, ZkCredentials, generate_digest,
};

// Re-export the client
pub use zkguard_client::{
    Connector, Handshake, MemoryConnector, MemorySession, MemoryStore, StoreOptions, ZkClient,
    ZkClientBuilder, ZkError, ZkResult, ZkSession,
};

// Re-export configuration
pub use zkguard_config::{AclConfig, ConfigError, ConfigLoader, ProviderKind};

/// Installs a global `fmt` subscriber filtered by `RUST_LOG`, falling back
/// to `default_directive` (for example `"info"` or `"zkguard=debug"`).
///
/// For binaries; libraries never install a subscriber. Fails if one is
/// already installed.
pub fn init_tracing(default_directive: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| ZkGuardError::Tracing(e.to_string()))
}
