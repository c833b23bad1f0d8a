use std::fmt;

use metapath_schema::QName;

/// A named function reference, resolvable through the function registry.
///
/// Arrays and maps are also callable values at the calling-convention
/// level; they carry their own variants in [`crate::types::Item`] and are
/// invoked positionally rather than through this reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionItem {
    pub name: QName,
    pub arity: usize,
}

impl FunctionItem {
    pub fn new(name: QName, arity: usize) -> Self {
        Self { name, arity }
    }
}

impl fmt::Display for FunctionItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.arity)
    }
}
