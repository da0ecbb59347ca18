//! Digest identities.
//!
//! The store identifies digest users as `user:base64(sha1("user:password"))`.
//! Both sides must hash identically or digest ACLs never match.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha1::{Digest, Sha1};

/// Computes the digest id for a username/password pair.
///
/// # Examples
///
/// ```
/// use zkguard_acl::generate_digest;
///
/// let id = generate_digest("super", "secret");
/// assert!(id.starts_with("super:"));
/// ```
pub fn generate_digest(username: &str, password: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(username.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    let hash = hasher.finalize();
    format!("{username}:{}", STANDARD.encode(hash))
}
