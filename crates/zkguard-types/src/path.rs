//! Node paths.
//!
//! A [`NodePath`] is an absolute, slash-separated, case-sensitive path to a
//! node in the coordination store. Paths are validated once at construction
//! with the same rules the store applies, so every other layer can treat a
//! `NodePath` as well-formed.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The root node. Always exists and is never created or deleted.
pub const ROOT_PATH: &str = "/";

/// The well-known node holding the cluster's security configuration.
pub const SECURITY_CONFIG_PATH: &str = "/security.json";

/// Errors produced when a string is not a valid node path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The path is the empty string.
    #[error("path must not be empty")]
    Empty,

    /// The path does not start with `/`.
    #[error("path must start with '/': {path}")]
    NotAbsolute { path: String },

    /// The path ends with `/` and is not the root.
    #[error("path must not end with '/': {path}")]
    TrailingSlash { path: String },

    /// The path contains `//`.
    #[error("empty node name at byte {index} in {path}")]
    EmptySegment { path: String, index: usize },

    /// The path contains a `.` or `..` segment.
    #[error("relative segment '{segment}' not allowed in {path}")]
    RelativeSegment { path: String, segment: String },

    /// The path contains a character the store rejects.
    #[error("invalid character {ch:?} at byte {index} in {path}")]
    InvalidChar {
        path: String,
        ch: char,
        index: usize,
    },
}

/// A validated absolute node path.
///
/// # Examples
///
/// ```
/// use zkguard_types::NodePath;
///
/// let path = NodePath::parse("/collections/logs").unwrap();
/// assert_eq!(path.name(), "logs");
/// assert_eq!(path.parent().unwrap().as_str(), "/collections");
///
/// assert!(NodePath::parse("relative/path").is_err());
/// assert!(NodePath::parse("/trailing/").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodePath(String);

impl NodePath {
    /// Returns the root path `/`.
    pub fn root() -> Self {
        Self(ROOT_PATH.to_string())
    }

    /// Returns the default security-configuration path.
    pub fn security_config() -> Self {
        Self(SECURITY_CONFIG_PATH.to_string())
    }

    /// Parses and validates a node path.
    pub fn parse(path: impl Into<String>) -> Result<Self, PathError> {
        let path = path.into();
        validate(&path)?;
        Ok(Self(path))
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for `/`.
    pub fn is_root(&self) -> bool {
        self.0 == ROOT_PATH
    }

    /// Returns the parent path, or `None` for the root.
    pub fn parent(&self) -> Option<NodePath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// Returns the last segment of the path (empty for the root).
    pub fn name(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// Number of segments below the root. The root has depth 0.
    pub fn depth(&self) -> usize {
        if self.is_root() {
            0
        } else {
            self.0.matches('/').count()
        }
    }

    /// Appends a single child segment.
    pub fn join(&self, child: &str) -> Result<NodePath, PathError> {
        if self.is_root() {
            Self::parse(format!("/{child}"))
        } else {
            Self::parse(format!("{}/{child}", self.0))
        }
    }

    /// Prefixes this path with a chroot.
    ///
    /// `"/security.json".with_chroot("/solr")` is `"/solr/security.json"`.
    /// A root chroot leaves the path unchanged.
    pub fn with_chroot(&self, chroot: &NodePath) -> NodePath {
        match (chroot.is_root(), self.is_root()) {
            (true, _) => self.clone(),
            (false, true) => chroot.clone(),
            (false, false) => Self(format!("{}{}", chroot.0, self.0)),
        }
    }

    /// Returns true if `self` is a strict descendant of `other`.
    pub fn is_descendant_of(&self, other: &NodePath) -> bool {
        if self == other {
            return false;
        }
        if other.is_root() {
            return true;
        }
        self.0.starts_with(&other.0) && self.0.as_bytes().get(other.0.len()) == Some(&b'/')
    }

    /// Iterates the strict ancestors of this path, shallowest first.
    ///
    /// The root and the path itself are excluded, so `/a/b/c` yields `/a`
    /// then `/a/b`.
    pub fn ancestors(&self) -> impl Iterator<Item = NodePath> + '_ {
        self.0
            .match_indices('/')
            .map(|(idx, _)| idx)
            .filter(|&idx| idx > 0)
            .map(|idx| Self(self.0[..idx].to_string()))
    }
}

fn validate(path: &str) -> Result<(), PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }
    if !path.starts_with('/') {
        return Err(PathError::NotAbsolute {
            path: path.to_string(),
        });
    }
    if path.len() == 1 {
        return Ok(());
    }
    if path.ends_with('/') {
        return Err(PathError::TrailingSlash {
            path: path.to_string(),
        });
    }

    for (index, ch) in path.char_indices() {
        if is_forbidden_char(ch) {
            return Err(PathError::InvalidChar {
                path: path.to_string(),
                ch,
                index,
            });
        }
    }

    let mut offset = 0;
    for segment in path.split('/').skip(1) {
        offset += 1;
        match segment {
            "" => {
                return Err(PathError::EmptySegment {
                    path: path.to_string(),
                    index: offset,
                });
            }
            "." | ".." => {
                return Err(PathError::RelativeSegment {
                    path: path.to_string(),
                    segment: segment.to_string(),
                });
            }
            _ => {}
        }
        offset += segment.len();
    }

    Ok(())
}

/// Characters the store refuses in node names: NUL, C0/C1 controls, the
/// private-use block, the specials block and anything outside the BMP.
fn is_forbidden_char(ch: char) -> bool {
    matches!(
        ch,
        '\u{0}'..='\u{1F}' | '\u{7F}'..='\u{9F}' | '\u{E000}'..='\u{F8FF}' | '\u{FFF0}'..='\u{FFFF}'
    ) || u32::from(ch) > 0xFFFF
}

impl Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NodePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for NodePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NodePath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for NodePath {
    type Error = PathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<NodePath> for String {
    fn from(path: NodePath) -> Self {
        path.0
    }
}
