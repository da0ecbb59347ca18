//! Security-aware path classification.
//!
//! Decides whether a node is *protected*. A node is protected when it is the
//! security-configuration node or when the caller asked for protection at
//! creation time. Path shape is never used to infer protection.

use zkguard_types::NodePath;

/// Classifies node paths as protected or open.
///
/// # Examples
///
/// ```
/// use zkguard_acl::SecurityClassifier;
/// use zkguard_types::NodePath;
///
/// let classifier = SecurityClassifier::new();
/// let security = NodePath::security_config();
/// let plain = NodePath::parse("/collections").unwrap();
///
/// assert!(classifier.is_protected(&security, false));
/// assert!(classifier.is_protected(&plain, true));
/// assert!(!classifier.is_protected(&plain, false));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecurityClassifier {
    security_path: NodePath,
}

impl SecurityClassifier {
    /// Classifier using [`SECURITY_CONFIG_PATH`](zkguard_types::SECURITY_CONFIG_PATH).
    pub fn new() -> Self {
        Self {
            security_path: NodePath::security_config(),
        }
    }

    /// Classifier for a deployment that keeps its security configuration
    /// somewhere else.
    pub fn with_security_path(security_path: NodePath) -> Self {
        Self { security_path }
    }

    /// Classifier for a client that addresses a chrooted tree from the
    /// store root, so the security node lives at `<chroot>/security.json`.
    pub fn with_chroot(chroot: &NodePath) -> Self {
        Self {
            security_path: NodePath::security_config().with_chroot(chroot),
        }
    }

    pub fn security_path(&self) -> &NodePath {
        &self.security_path
    }

    /// Returns true if `path` must get the restricted ACL.
    pub fn is_protected(&self, path: &NodePath, protect: bool) -> bool {
        protect || *path == self.security_path
    }
}

impl Default for SecurityClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("/security.json", false, true; "security node without flag")]
    #[test_case("/security.json", true, true; "security node with flag")]
    #[test_case("/collections", true, true; "flagged node")]
    #[test_case("/collections", false, false; "plain node")]
    #[test_case("/security.json/child", false, false; "child of security node")]
    #[test_case("/Security.json", false, false; "case sensitive")]
    fn default_classification(path: &str, protect: bool, expected: bool) {
        let classifier = SecurityClassifier::new();
        let path = NodePath::parse(path).unwrap();
        assert_eq!(classifier.is_protected(&path, protect), expected);
    }

    #[test]
    fn custom_security_path() {
        let custom = NodePath::parse("/cluster/security").unwrap();
        let classifier = SecurityClassifier::with_security_path(custom.clone());
        assert!(classifier.is_protected(&custom, false));
        assert!(!classifier.is_protected(&NodePath::security_config(), false));
    }

    #[test]
    fn chroot_moves_the_security_node() {
        let classifier = SecurityClassifier::with_chroot(&NodePath::parse("/solr").unwrap());
        assert_eq!(classifier.security_path().as_str(), "/solr/security.json");
        assert!(classifier.is_protected(&NodePath::parse("/solr/security.json").unwrap(), false));
        assert!(!classifier.is_protected(&NodePath::security_config(), false));

        let unrooted = SecurityClassifier::with_chroot(&NodePath::root());
        assert_eq!(unrooted, SecurityClassifier::new());
    }
}
