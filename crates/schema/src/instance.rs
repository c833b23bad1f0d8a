//! Usage contexts: how a definition is used inside a parent definition.

use std::sync::Arc;

use crate::definition::{AssemblyDef, Definition, FieldDef, FlagDef, ModuleDef};
use crate::error::SchemaError;
use crate::qname::QName;

/// A reference from an instance to its definition.
///
/// `ByName` carries no strong reference and resolves through the owning
/// module; `Inline` owns a definition declared in place. Recursive schemas
/// are only representable through `ByName`, which is what keeps the
/// definition graph free of `Arc` cycles.
#[derive(Debug)]
pub enum DefinitionRef<T> {
    Inline(Arc<T>),
    ByName(QName),
}

// not derived: cloning must not require T: Clone
impl<T> Clone for DefinitionRef<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Inline(def) => Self::Inline(Arc::clone(def)),
            Self::ByName(name) => Self::ByName(name.clone()),
        }
    }
}

impl<T: Definition> DefinitionRef<T> {
    pub fn inline(def: T) -> Self {
        Self::Inline(Arc::new(def))
    }

    pub fn by_name(name: QName) -> Self {
        Self::ByName(name)
    }

    pub fn resolve(&self, module: &ModuleDef) -> Result<Arc<T>, SchemaError> {
        match self {
            Self::Inline(def) => Ok(Arc::clone(def)),
            Self::ByName(name) => {
                T::lookup(module, name).ok_or_else(|| SchemaError::unresolved(T::KIND, name.clone()))
            }
        }
    }

    /// The referenced definition's name, without resolving.
    pub fn name(&self) -> QName {
        match self {
            Self::Inline(def) => def.name().clone(),
            Self::ByName(name) => name.clone(),
        }
    }
}

/// Occurrence bound for a model instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

impl MaxOccurs {
    pub fn allows_many(&self) -> bool {
        match self {
            MaxOccurs::Bounded(n) => *n > 1,
            MaxOccurs::Unbounded => true,
        }
    }
}

/// A flag used by an assembly or field definition.
#[derive(Debug, Clone)]
pub struct FlagInstance {
    pub def: DefinitionRef<FlagDef>,
    pub use_name: Option<String>,
    pub required: bool,
}

impl FlagInstance {
    pub fn new(def: DefinitionRef<FlagDef>) -> Self {
        Self {
            def,
            use_name: None,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_use_name(mut self, use_name: impl Into<String>) -> Self {
        self.use_name = Some(use_name.into());
        self
    }

    /// The name this flag appears under in bound data.
    pub fn effective_name(&self) -> QName {
        effective_name(&self.use_name, self.def.name())
    }

    pub fn definition(&self, module: &ModuleDef) -> Result<Arc<FlagDef>, SchemaError> {
        self.def.resolve(module)
    }
}

/// A field used within an assembly's model.
#[derive(Debug, Clone)]
pub struct FieldInstance {
    pub def: DefinitionRef<FieldDef>,
    pub use_name: Option<String>,
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
    pub group_as: Option<String>,
}

impl FieldInstance {
    pub fn new(def: DefinitionRef<FieldDef>) -> Self {
        Self {
            def,
            use_name: None,
            min_occurs: 0,
            max_occurs: MaxOccurs::Bounded(1),
            group_as: None,
        }
    }

    pub fn occurs(mut self, min: u32, max: MaxOccurs) -> Self {
        self.min_occurs = min;
        self.max_occurs = max;
        self
    }

    pub fn with_use_name(mut self, use_name: impl Into<String>) -> Self {
        self.use_name = Some(use_name.into());
        self
    }

    pub fn with_group_as(mut self, group_as: impl Into<String>) -> Self {
        self.group_as = Some(group_as.into());
        self
    }

    pub fn effective_name(&self) -> QName {
        effective_name(&self.use_name, self.def.name())
    }

    pub fn definition(&self, module: &ModuleDef) -> Result<Arc<FieldDef>, SchemaError> {
        self.def.resolve(module)
    }
}

/// An assembly used within an assembly's model.
#[derive(Debug, Clone)]
pub struct AssemblyInstance {
    pub def: DefinitionRef<AssemblyDef>,
    pub use_name: Option<String>,
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
    pub group_as: Option<String>,
}

impl AssemblyInstance {
    pub fn new(def: DefinitionRef<AssemblyDef>) -> Self {
        Self {
            def,
            use_name: None,
            min_occurs: 0,
            max_occurs: MaxOccurs::Bounded(1),
            group_as: None,
        }
    }

    pub fn occurs(mut self, min: u32, max: MaxOccurs) -> Self {
        self.min_occurs = min;
        self.max_occurs = max;
        self
    }

    pub fn with_use_name(mut self, use_name: impl Into<String>) -> Self {
        self.use_name = Some(use_name.into());
        self
    }

    pub fn with_group_as(mut self, group_as: impl Into<String>) -> Self {
        self.group_as = Some(group_as.into());
        self
    }

    pub fn effective_name(&self) -> QName {
        effective_name(&self.use_name, self.def.name())
    }

    pub fn definition(&self, module: &ModuleDef) -> Result<Arc<AssemblyDef>, SchemaError> {
        self.def.resolve(module)
    }
}

/// A member of an assembly's model: a field or a child assembly.
#[derive(Debug, Clone)]
pub enum ModelInstance {
    Field(FieldInstance),
    Assembly(AssemblyInstance),
}

impl ModelInstance {
    pub fn effective_name(&self) -> QName {
        match self {
            ModelInstance::Field(f) => f.effective_name(),
            ModelInstance::Assembly(a) => a.effective_name(),
        }
    }

    pub fn max_occurs(&self) -> MaxOccurs {
        match self {
            ModelInstance::Field(f) => f.max_occurs,
            ModelInstance::Assembly(a) => a.max_occurs,
        }
    }

    pub fn group_as(&self) -> Option<&str> {
        match self {
            ModelInstance::Field(f) => f.group_as.as_deref(),
            ModelInstance::Assembly(a) => a.group_as.as_deref(),
        }
    }
}

fn effective_name(use_name: &Option<String>, def_name: QName) -> QName {
    match use_name {
        Some(local) => QName {
            namespace: def_name.namespace,
            local: local.clone(),
        },
        None => def_name,
    }
}
