#![allow(clippy::match_same_arms)]
//! ACL entry model.
//!
//! An [`Acl`] binds a [`Perms`] set to an identity under a [`Scheme`]. Nodes
//! carry an [`AclList`], which is ordered and never empty.

use std::fmt::{self, Display};
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identity scheme of an ACL entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Matches every session (`world:anyone`).
    World,
    /// Matches a session authenticated through SASL/Kerberos as a principal.
    Sasl,
    /// Matches a session that presented `user:password` digest credentials.
    Digest,
}

impl Scheme {
    /// Returns the scheme name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::World => "world",
            Scheme::Sasl => "sasl",
            Scheme::Digest => "digest",
        }
    }
}

impl Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown scheme name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown ACL scheme: {0}")]
pub struct UnknownScheme(pub String);

impl FromStr for Scheme {
    type Err = UnknownScheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "world" => Ok(Scheme::World),
            "sasl" => Ok(Scheme::Sasl),
            "digest" => Ok(Scheme::Digest),
            other => Err(UnknownScheme(other.to_string())),
        }
    }
}

/// A single permission on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// Read node data and list children.
    Read,
    /// Overwrite node data.
    Write,
    /// Create children.
    Create,
    /// Delete children.
    Delete,
    /// Change the node's ACL.
    Admin,
}

impl Permission {
    /// All permissions in wire bit order.
    pub const ALL: [Permission; 5] = [
        Permission::Read,
        Permission::Write,
        Permission::Create,
        Permission::Delete,
        Permission::Admin,
    ];

    /// Returns the wire bit for this permission.
    pub const fn bit(self) -> u8 {
        match self {
            Permission::Read => 1,
            Permission::Write => 1 << 1,
            Permission::Create => 1 << 2,
            Permission::Delete => 1 << 3,
            Permission::Admin => 1 << 4,
        }
    }

    /// Single-letter code used by the store's shell (`cdrwa`).
    pub const fn code(self) -> char {
        match self {
            Permission::Read => 'r',
            Permission::Write => 'w',
            Permission::Create => 'c',
            Permission::Delete => 'd',
            Permission::Admin => 'a',
        }
    }

    /// Returns whether granting this permission lets the holder change the
    /// data or shape of the tree.
    pub fn is_mutating(self) -> bool {
        !matches!(self, Permission::Read)
    }
}

impl Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Permission::Read => "read",
            Permission::Write => "write",
            Permission::Create => "create",
            Permission::Delete => "delete",
            Permission::Admin => "admin",
        };
        f.write_str(name)
    }
}

/// Permission bitset with the store's wire layout.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Perms(u8);

impl Perms {
    pub const NONE: Perms = Perms(0);
    pub const READ: Perms = Perms(Permission::Read.bit());
    pub const WRITE: Perms = Perms(Permission::Write.bit());
    pub const CREATE: Perms = Perms(Permission::Create.bit());
    pub const DELETE: Perms = Perms(Permission::Delete.bit());
    pub const ADMIN: Perms = Perms(Permission::Admin.bit());
    pub const ALL: Perms = Perms(0b1_1111);

    /// Builds a set from raw wire bits, dropping unknown bits.
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Returns the raw wire bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns whether every permission in `other` is present.
    pub const fn contains(self, other: Perms) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns whether the single permission is present.
    pub const fn allows(self, permission: Permission) -> bool {
        self.0 & permission.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the permissions in the set.
    pub fn iter(self) -> impl Iterator<Item = Permission> {
        Permission::ALL.into_iter().filter(move |p| self.allows(*p))
    }
}

impl BitOr for Perms {
    type Output = Perms;

    fn bitor(self, rhs: Self) -> Self::Output {
        Perms(self.0 | rhs.0)
    }
}

impl BitOrAssign for Perms {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Perms {
    type Output = Perms;

    fn bitand(self, rhs: Self) -> Self::Output {
        Perms(self.0 & rhs.0)
    }
}

impl From<Permission> for Perms {
    fn from(permission: Permission) -> Self {
        Perms(permission.bit())
    }
}

impl FromIterator<Permission> for Perms {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        iter.into_iter().fold(Perms::NONE, |acc, p| acc | p.into())
    }
}

/// Renders in the store shell's `cdrwa` order.
impl Display for Perms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for permission in [
            Permission::Create,
            Permission::Delete,
            Permission::Read,
            Permission::Write,
            Permission::Admin,
        ] {
            if self.allows(permission) {
                write!(f, "{}", permission.code())?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Perms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Perms({self})")
    }
}

/// One access-control entry: who (scheme + id) may do what (perms).
///
/// Entries are immutable once built. The world entry carries an empty id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Acl {
    scheme: Scheme,
    id: String,
    perms: Perms,
}

impl Acl {
    /// Entry matching every session.
    pub fn world(perms: Perms) -> Self {
        Self {
            scheme: Scheme::World,
            id: String::new(),
            perms,
        }
    }

    /// Entry matching a SASL-authenticated principal.
    pub fn sasl(principal: impl Into<String>, perms: Perms) -> Self {
        Self {
            scheme: Scheme::Sasl,
            id: principal.into(),
            perms,
        }
    }

    /// Entry matching a digest id of the form `user:base64(sha1(user:password))`.
    pub fn digest(digest_id: impl Into<String>, perms: Perms) -> Self {
        Self {
            scheme: Scheme::Digest,
            id: digest_id.into(),
            perms,
        }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn perms(&self) -> Perms {
        self.perms
    }

    /// Returns true for a world entry granting any mutating permission.
    pub fn is_world_writable(&self) -> bool {
        self.scheme == Scheme::World && self.perms.iter().any(Permission::is_mutating)
    }
}

impl Display for Acl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scheme {
            Scheme::World => write!(f, "world:anyone:{}", self.perms),
            _ => write!(f, "{}:{}:{}", self.scheme, self.id, self.perms),
        }
    }
}

/// Error returned when building an [`AclList`] from no entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("an ACL list must contain at least one entry")]
pub struct EmptyAclList;

/// Ordered, non-empty list of ACL entries attached to a node at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Acl>", into = "Vec<Acl>")]
pub struct AclList(Vec<Acl>);

impl AclList {
    /// `[world:anyone:cdrwa]`, the store's unrestricted default.
    pub fn open() -> Self {
        Self(vec![Acl::world(Perms::ALL)])
    }

    /// A list holding one entry.
    pub fn single(entry: Acl) -> Self {
        Self(vec![entry])
    }

    /// A list with a guaranteed first entry followed by `rest`.
    pub fn new(first: Acl, rest: impl IntoIterator<Item = Acl>) -> Self {
        let mut entries = vec![first];
        entries.extend(rest);
        Self(entries)
    }

    pub fn as_slice(&self) -> &[Acl] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Acl> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Union of the permissions granted to entries of the given scheme and id.
    pub fn perms_for(&self, scheme: Scheme, id: &str) -> Perms {
        self.0
            .iter()
            .filter(|acl| acl.scheme == scheme && (scheme == Scheme::World || acl.id == id))
            .fold(Perms::NONE, |acc, acl| acc | acl.perms)
    }

    /// Returns true if any world entry grants a mutating permission.
    pub fn is_world_writable(&self) -> bool {
        self.0.iter().any(Acl::is_world_writable)
    }
}

impl TryFrom<Vec<Acl>> for AclList {
    type Error = EmptyAclList;

    fn try_from(entries: Vec<Acl>) -> Result<Self, Self::Error> {
        if entries.is_empty() {
            Err(EmptyAclList)
        } else {
            Ok(Self(entries))
        }
    }
}

impl From<AclList> for Vec<Acl> {
    fn from(list: AclList) -> Self {
        list.0
    }
}

impl<'a> IntoIterator for &'a AclList {
    type Item = &'a Acl;
    type IntoIter = std::slice::Iter<'a, Acl>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Display for AclList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, acl) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{acl}")?;
        }
        f.write_str("]")
    }
}
