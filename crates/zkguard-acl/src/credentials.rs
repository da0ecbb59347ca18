//! Credentials providers.
//!
//! A [`CredentialsProvider`] supplies the identity assertions a client
//! attaches to its session when it connects. SASL sessions need none (the
//! handshake authenticates them); digest sessions present `user:password`.

use std::fmt;

use tracing::debug;
use zeroize::Zeroizing;
use zkguard_types::Scheme;

use crate::digest::generate_digest;

/// Errors from building or parsing credentials.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialsError {
    /// Username is empty.
    #[error("digest username must not be empty")]
    EmptyUsername,

    /// Username contains the `:` separator.
    #[error("digest username must not contain ':': {username}")]
    InvalidUsername { username: String },

    /// Digest auth bytes are not `user:password` in UTF-8.
    #[error("malformed digest credentials")]
    MalformedAuth,
}

/// One identity assertion attached to a session at connect time.
///
/// The auth bytes are wiped from memory on drop and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ZkCredentials {
    scheme: Scheme,
    auth: Zeroizing<Vec<u8>>,
}

impl ZkCredentials {
    /// Raw credentials for an arbitrary scheme.
    pub fn new(scheme: Scheme, auth: Vec<u8>) -> Self {
        Self {
            scheme,
            auth: Zeroizing::new(auth),
        }
    }

    /// Digest credentials in the store's `user:password` form.
    pub fn digest(username: &str, password: &str) -> Self {
        Self::new(Scheme::Digest, format!("{username}:{password}").into_bytes())
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn auth(&self) -> &[u8] {
        &self.auth
    }
}

impl fmt::Debug for ZkCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZkCredentials")
            .field("scheme", &self.scheme)
            .field("auth", &"<redacted>")
            .finish()
    }
}

/// Splits digest auth bytes into username and password.
///
/// The username ends at the first `:`; the password may contain colons.
pub fn parse_digest_auth(auth: &[u8]) -> Result<(String, Zeroizing<String>), CredentialsError> {
    let text = std::str::from_utf8(auth).map_err(|_| CredentialsError::MalformedAuth)?;
    let (username, password) = text
        .split_once(':')
        .ok_or(CredentialsError::MalformedAuth)?;
    if username.is_empty() {
        return Err(CredentialsError::EmptyUsername);
    }
    Ok((username.to_string(), Zeroizing::new(password.to_string())))
}

/// Supplies the credentials a session is established with.
///
/// Called once per client when it connects. Implementations must not read
/// or mutate process-wide state, so clients with different credentials can
/// live side by side.
pub trait CredentialsProvider: Send + Sync + fmt::Debug {
    fn credentials(&self) -> Vec<ZkCredentials>;
}

impl<P: CredentialsProvider + ?Sized> CredentialsProvider for Box<P> {
    fn credentials(&self) -> Vec<ZkCredentials> {
        (**self).credentials()
    }
}

/// Attaches nothing. Used for anonymous and SASL sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoCredentials;

impl CredentialsProvider for NoCredentials {
    fn credentials(&self) -> Vec<ZkCredentials> {
        Vec::new()
    }
}

/// Attaches one digest `user:password` pair.
#[derive(Clone)]
pub struct DigestCredentialsProvider {
    username: String,
    password: Zeroizing<String>,
}

impl DigestCredentialsProvider {
    /// Validates and stores a username/password pair.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, CredentialsError> {
        let username = username.into();
        if username.is_empty() {
            return Err(CredentialsError::EmptyUsername);
        }
        if username.contains(':') {
            return Err(CredentialsError::InvalidUsername { username });
        }
        Ok(Self {
            username,
            password: Zeroizing::new(password.into()),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The ACL id this user matches: `user:base64(sha1(user:password))`.
    pub fn digest_id(&self) -> String {
        generate_digest(&self.username, &self.password)
    }
}

impl fmt::Debug for DigestCredentialsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestCredentialsProvider")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl CredentialsProvider for DigestCredentialsProvider {
    fn credentials(&self) -> Vec<ZkCredentials> {
        debug!(username = %self.username, "supplying digest credentials");
        vec![ZkCredentials::digest(&self.username, &self.password)]
    }
}
