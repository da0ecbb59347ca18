//! ACL providers.
//!
//! An [`AclProvider`] decides which ACL entries a node receives at creation.
//! Decisions are pure functions of the path, the caller's protection flag,
//! the creating session's identity and the provider's own configuration.
//!
//! ```text
//!                 ┌─────────────────────┐
//!  path, protect ─▶│ SecurityClassifier  │── open ──▶ [world:anyone:cdrwa]
//!                 └──────────┬──────────┘
//!                            │ protected
//!                            ▼
//!                 ┌─────────────────────┐
//!     identity ──▶│    Restriction      │──▶ [world:anyone:r, <restricted>...]
//!                 │  (Sasl | Digest)    │
//!                 └─────────────────────┘
//! ```
//!
//! New identity schemes plug in as new [`Restriction`] implementations and
//! new [`AclProvider`] variants; the classification rule is shared.

use std::fmt;

use tracing::debug;
use zkguard_types::{Acl, AclList, NodePath, Perms, SessionIdentity};

use crate::classifier::SecurityClassifier;
use crate::credentials::DigestCredentialsProvider;

/// Principal used for SASL entries when the creating session has none.
pub const DEFAULT_SASL_SUPERUSER: &str = "solr";

/// Identity-driven half of a security-aware provider.
///
/// Supplies the entries that follow `world:anyone:r` on protected paths.
pub trait Restriction: Send + Sync + fmt::Debug {
    fn restricted_entries(&self, identity: &SessionIdentity) -> Vec<Acl>;
}

/// Scopes protected nodes to the creating session's SASL principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaslRestriction {
    fallback_principal: String,
}

impl SaslRestriction {
    pub fn new() -> Self {
        Self {
            fallback_principal: DEFAULT_SASL_SUPERUSER.to_string(),
        }
    }

    /// Principal written into the entry when the session is not
    /// SASL-authenticated. The store still enforces it, so unauthenticated
    /// sessions cannot write the node afterwards.
    #[must_use]
    pub fn with_fallback_principal(mut self, principal: impl Into<String>) -> Self {
        self.fallback_principal = principal.into();
        self
    }

    pub fn fallback_principal(&self) -> &str {
        &self.fallback_principal
    }
}

impl Default for SaslRestriction {
    fn default() -> Self {
        Self::new()
    }
}

impl Restriction for SaslRestriction {
    fn restricted_entries(&self, identity: &SessionIdentity) -> Vec<Acl> {
        let principal = match identity.principal() {
            Some(principal) => principal,
            None => {
                debug!(
                    identity = %identity,
                    fallback = %self.fallback_principal,
                    "session has no SASL principal, using fallback"
                );
                self.fallback_principal.as_str()
            }
        };
        vec![Acl::sasl(principal, Perms::ALL)]
    }
}

/// Scopes protected nodes to configured digest users, independent of the
/// live session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestRestriction {
    all_id: String,
    readonly_id: Option<String>,
}

impl DigestRestriction {
    /// Grants full access to the user behind `all`.
    pub fn new(all: &DigestCredentialsProvider) -> Self {
        Self {
            all_id: all.digest_id(),
            readonly_id: None,
        }
    }

    /// Additionally grants read access to a second digest user.
    #[must_use]
    pub fn with_readonly(mut self, readonly: &DigestCredentialsProvider) -> Self {
        self.readonly_id = Some(readonly.digest_id());
        self
    }

    pub fn all_id(&self) -> &str {
        &self.all_id
    }

    pub fn readonly_id(&self) -> Option<&str> {
        self.readonly_id.as_deref()
    }
}

impl Restriction for DigestRestriction {
    fn restricted_entries(&self, _identity: &SessionIdentity) -> Vec<Acl> {
        let mut entries = vec![Acl::digest(&self.all_id, Perms::ALL)];
        if let Some(readonly) = &self.readonly_id {
            entries.push(Acl::digest(readonly, Perms::READ));
        }
        entries
    }
}

/// Shared classification rule parameterized by a restriction strategy.
///
/// Protected paths get `[world:anyone:r, <restricted entries>]`; every other
/// path gets the open default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityAware<R> {
    classifier: SecurityClassifier,
    restriction: R,
}

impl<R: Restriction> SecurityAware<R> {
    pub fn new(restriction: R) -> Self {
        Self {
            classifier: SecurityClassifier::new(),
            restriction,
        }
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: SecurityClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn classifier(&self) -> &SecurityClassifier {
        &self.classifier
    }

    pub fn restriction(&self) -> &R {
        &self.restriction
    }

    pub fn acls_for_path(
        &self,
        path: &NodePath,
        protect: bool,
        identity: &SessionIdentity,
    ) -> AclList {
        if !self.classifier.is_protected(path, protect) {
            return AclList::open();
        }
        let acl = AclList::new(
            Acl::world(Perms::READ),
            self.restriction.restricted_entries(identity),
        );
        debug!(path = %path, protect, identity = %identity, acl = %acl, "protected path");
        acl
    }
}

/// Policy choosing the ACL for every node a client creates.
///
/// # Examples
///
/// ```
/// use zkguard_acl::AclProvider;
/// use zkguard_types::{NodePath, Perms, Scheme, SessionIdentity};
///
/// let provider = AclProvider::sasl_restricted();
/// let solr = SessionIdentity::authenticated("solr");
///
/// let acl = provider.acls_for_path(&NodePath::security_config(), false, &solr);
/// assert_eq!(acl.perms_for(Scheme::Sasl, "solr"), Perms::ALL);
/// assert_eq!(acl.perms_for(Scheme::World, ""), Perms::READ);
///
/// let open = provider.acls_for_path(&NodePath::parse("/live_nodes").unwrap(), false, &solr);
/// assert_eq!(open.perms_for(Scheme::World, ""), Perms::ALL);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AclProvider {
    /// `world:anyone:cdrwa` everywhere.
    #[default]
    Open,
    /// Protected nodes are writable only by the creating SASL principal.
    SaslRestricted(SecurityAware<SaslRestriction>),
    /// Protected nodes are writable only by a configured digest user.
    DigestRestricted(SecurityAware<DigestRestriction>),
}

impl AclProvider {
    pub fn open() -> Self {
        Self::Open
    }

    /// SASL provider with the default security path and fallback principal.
    pub fn sasl_restricted() -> Self {
        Self::SaslRestricted(SecurityAware::new(SaslRestriction::new()))
    }

    /// Digest provider granting full access to `all`.
    pub fn digest_restricted(all: &DigestCredentialsProvider) -> Self {
        Self::DigestRestricted(SecurityAware::new(DigestRestriction::new(all)))
    }

    /// Short name used in logs and configuration.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::SaslRestricted(_) => "sasl",
            Self::DigestRestricted(_) => "digest",
        }
    }

    /// The classifier in use, if the provider is security-aware.
    pub fn classifier(&self) -> Option<&SecurityClassifier> {
        match self {
            Self::Open => None,
            Self::SaslRestricted(inner) => Some(inner.classifier()),
            Self::DigestRestricted(inner) => Some(inner.classifier()),
        }
    }

    /// Returns the ACL a node at `path` gets when created by `identity`.
    ///
    /// `protect` is the caller's request for restricted access; `Open`
    /// ignores it. Never fails and never returns an empty list.
    pub fn acls_for_path(
        &self,
        path: &NodePath,
        protect: bool,
        identity: &SessionIdentity,
    ) -> AclList {
        match self {
            Self::Open => AclList::open(),
            Self::SaslRestricted(inner) => inner.acls_for_path(path, protect, identity),
            Self::DigestRestricted(inner) => inner.acls_for_path(path, protect, identity),
        }
    }
}

impl From<SecurityAware<SaslRestriction>> for AclProvider {
    fn from(inner: SecurityAware<SaslRestriction>) -> Self {
        Self::SaslRestricted(inner)
    }
}

impl From<SecurityAware<DigestRestriction>> for AclProvider {
    fn from(inner: SecurityAware<DigestRestriction>) -> Self {
        Self::DigestRestricted(inner)
    }
}
