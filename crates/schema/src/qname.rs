use std::fmt;

/// A qualified name: an optional namespace URI plus a local part.
///
/// Definition and instance names are qualified against the owning module's
/// namespace. Two names are equal only when both parts match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    pub namespace: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local: local.into(),
        }
    }

    /// A name with no namespace component.
    pub fn local_only(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local: local.into(),
        }
    }

    pub fn local_part(&self) -> &str {
        &self.local
    }

    pub fn namespace_uri(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Same local part under a different namespace.
    pub fn with_namespace(&self, namespace: Option<String>) -> Self {
        Self {
            namespace,
            local: self.local.clone(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

impl From<&str> for QName {
    fn from(s: &str) -> Self {
        QName::local_only(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let q = QName::new("http://example.com/ns", "group");
        assert_eq!(q.to_string(), "{http://example.com/ns}group");
        assert_eq!(QName::local_only("group").to_string(), "group");
    }

    #[test]
    fn test_equality_includes_namespace() {
        let a = QName::new("http://a", "name");
        let b = QName::new("http://b", "name");
        assert_ne!(a, b);
        assert_eq!(a, QName::new("http://a", "name"));
        assert_ne!(a, QName::local_only("name"));
    }
}
