//! Configuration management for zkguard
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. Environment variables (`ZKGUARD_*` prefix, `__` between sections)
//! 2. zkguard.local.toml (gitignored, local overrides)
//! 3. zkguard.toml (git-tracked, project config)
//! 4. ~/.config/zkguard/config.toml (user defaults)
//! 5. Built-in defaults (lowest precedence)
//!
//! ```toml
//! provider = "digest"
//! security_path = "/security.json"
//! chroot = "/solr"
//!
//! [digest]
//! username = "admin"
//! password = "admin-secret"
//! readonly_username = "reader"
//! readonly_password = "reader-secret"
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use zeroize::Zeroizing;
use zkguard_types::{NodePath, ROOT_PATH, SECURITY_CONFIG_PATH};

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::{LOCAL_CONFIG_FILE, PROJECT_CONFIG_FILE, Paths};

/// Fallback SASL principal used when a session has none.
pub const DEFAULT_FALLBACK_PRINCIPAL: &str = "solr";

/// ACL configuration for a zkguard client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AclConfig {
    /// Which ACL provider new clients use.
    pub provider: ProviderKind,
    /// Path of the security-configuration node, relative to `chroot`.
    pub security_path: String,
    /// Subtree the client's paths live under; `/` for none.
    pub chroot: String,
    pub sasl: SaslConfig,
    pub digest: DigestConfig,
}

impl Default for AclConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Open,
            security_path: SECURITY_CONFIG_PATH.to_string(),
            chroot: ROOT_PATH.to_string(),
            sasl: SaslConfig::default(),
            digest: DigestConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// `world:anyone:cdrwa` on every node.
    #[default]
    Open,
    /// Protected nodes restricted to the creating SASL principal.
    Sasl,
    /// Protected nodes restricted to a configured digest user.
    Digest,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Sasl => "sasl",
            Self::Digest => "digest",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SaslConfig {
    pub fallback_principal: String,
}

impl Default for SaslConfig {
    fn default() -> Self {
        Self {
            fallback_principal: DEFAULT_FALLBACK_PRINCIPAL.to_string(),
        }
    }
}

/// Digest users. Empty strings mean "not configured". Passwords are wiped
/// from memory when the config is dropped.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub username: String,
    pub password: Zeroizing<String>,
    pub readonly_username: String,
    pub readonly_password: Zeroizing<String>,
}

impl DigestConfig {
    pub fn has_readonly(&self) -> bool {
        !self.readonly_username.is_empty()
    }
}

impl fmt::Debug for DigestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("readonly_username", &self.readonly_username)
            .field("readonly_password", &"<redacted>")
            .finish()
    }
}

impl AclConfig {
    /// Reads a single TOML file, without layering.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks that paths are well-formed and the chosen provider has what
    /// it needs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.effective_security_path()?;
        if self.security_path == ROOT_PATH {
            return Err(ConfigError::ValidationError(
                "security_path must not be the root".to_string(),
            ));
        }

        match self.provider {
            ProviderKind::Open => {}
            ProviderKind::Sasl => {
                if self.sasl.fallback_principal.is_empty() {
                    return Err(ConfigError::ValidationError(
                        "sasl.fallback_principal must not be empty".to_string(),
                    ));
                }
            }
            ProviderKind::Digest => {
                validate_username("digest.username", &self.digest.username)?;
                if self.digest.has_readonly() {
                    validate_username(
                        "digest.readonly_username",
                        &self.digest.readonly_username,
                    )?;
                } else if !self.digest.readonly_password.is_empty() {
                    return Err(ConfigError::ValidationError(
                        "digest.readonly_password is set without digest.readonly_username"
                            .to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// The security path as seen from the store root, chroot applied.
    pub fn effective_security_path(&self) -> Result<NodePath, ConfigError> {
        let security_path = NodePath::parse(self.security_path.as_str())
            .map_err(|e| ConfigError::ValidationError(format!("security_path: {e}")))?;
        let chroot = NodePath::parse(self.chroot.as_str())
            .map_err(|e| ConfigError::ValidationError(format!("chroot: {e}")))?;
        Ok(security_path.with_chroot(&chroot))
    }
}

fn validate_username(field: &str, username: &str) -> Result<(), ConfigError> {
    if username.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "{field} is required for the digest provider"
        )));
    }
    if username.contains(':') {
        return Err(ConfigError::ValidationError(format!(
            "{field} must not contain ':'"
        )));
    }
    Ok(())
}
