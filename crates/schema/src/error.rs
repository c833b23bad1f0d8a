use crate::qname::QName;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SchemaError {
    #[error("Unresolved {kind} reference '{name}'")]
    UnresolvedReference { kind: &'static str, name: QName },

    #[error("Duplicate {kind} definition '{name}'")]
    DuplicateDefinition { kind: &'static str, name: QName },

    #[error("Module has no root assembly named '{0}'")]
    UnknownRoot(QName),
}

impl SchemaError {
    pub fn unresolved(kind: &'static str, name: QName) -> Self {
        Self::UnresolvedReference { kind, name }
    }
}
