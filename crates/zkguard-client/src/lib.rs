//! # zkguard-client: ACL-applying coordination client
//!
//! Wraps a store session so every node it creates carries the ACL chosen by
//! an [`AclProvider`](zkguard_acl::AclProvider):
//!
//! - **[`ZkSession`] / [`Connector`]**: the store boundary
//! - **[`ZkClient`]**: creation with ACLs, recursive `make_path`, pass-through
//!   reads, writes and deletes
//! - **[`MemoryStore`]**: an in-process store that enforces ACLs, used by
//!   tests and embedded deployments
//!
//! # Example
//!
//! ```
//! use zkguard_acl::AclProvider;
//! use zkguard_client::{MemoryStore, ZkClientBuilder, ZkError};
//! use zkguard_types::CreateMode;
//!
//! let store = MemoryStore::new();
//!
//! let solr = ZkClientBuilder::new()
//!     .with_acl_provider(AclProvider::sasl_restricted())
//!     .connect(&store.kerberos("solr"))?;
//! solr.make_path("/security.json", b"{}", CreateMode::Persistent, false)?;
//!
//! let guest = ZkClientBuilder::new().connect(&store.anonymous())?;
//! assert_eq!(guest.get_data("/security.json")?.as_ref(), b"{}");
//! assert!(matches!(
//!     guest.set_data("/security.json", b"{\"open\":true}"),
//!     Err(ZkError::NoAuth { .. })
//! ));
//! # Ok::<(), ZkError>(())
//! ```

mod client;
mod error;
mod memory;
mod session;

pub use client::{ZkClient, ZkClientBuilder};
pub use error::{ZkError, ZkResult};
pub use memory::{Handshake, MemoryConnector, MemorySession, MemoryStore, StoreOptions};
pub use session::{Connector, ZkSession};

#[cfg(test)]
mod tests;
