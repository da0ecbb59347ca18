//! # zkguard-acl: ACL policy for the coordination store
//!
//! Decides which ACL entries protect each node a client creates:
//! - **Path classification** ([`SecurityClassifier`]): protected vs open
//! - **ACL providers** ([`AclProvider`]): `Open`, `SaslRestricted`,
//!   `DigestRestricted`
//! - **Credentials** ([`CredentialsProvider`]): identity assertions attached
//!   to a session when it connects
//!
//! ## Policies
//!
//! | Provider           | Open path       | Protected path                             |
//! |--------------------|-----------------|--------------------------------------------|
//! | `Open`             | world:cdrwa     | world:cdrwa                                |
//! | `SaslRestricted`   | world:cdrwa     | world:r, sasl:&lt;creator&gt;:cdrwa              |
//! | `DigestRestricted` | world:cdrwa     | world:r, digest:&lt;all&gt;:cdrwa [, digest:&lt;ro&gt;:r] |
//!
//! A path is protected when it is the security-configuration node or when
//! the caller passes `protect = true` at creation.
//!
//! ## Example
//!
//! ```
//! use zkguard_acl::{AclProvider, DigestCredentialsProvider};
//! use zkguard_types::{NodePath, SessionIdentity};
//!
//! let admin = DigestCredentialsProvider::new("admin", "secret")?;
//! let provider = AclProvider::digest_restricted(&admin);
//!
//! let acl = provider.acls_for_path(
//!     &NodePath::parse("/configs/main")?,
//!     true,
//!     &SessionIdentity::Anonymous,
//! );
//! assert!(!acl.is_world_writable());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod classifier;
pub mod credentials;
pub mod digest;
pub mod provider;

pub use classifier::SecurityClassifier;
pub use credentials::{
    CredentialsError, CredentialsProvider, DigestCredentialsProvider, NoCredentials,
    ZkCredentials, parse_digest_auth,
};
pub use digest::generate_digest;
pub use provider::{
    AclProvider, DEFAULT_SASL_SUPERUSER, DigestRestriction, Restriction, SaslRestriction,
    SecurityAware,
};
