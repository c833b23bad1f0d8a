//! Schema definitions: the declared shapes bound data must follow.
//!
//! A [`ModuleDef`] owns its global definitions; instances elsewhere refer to
//! them by name and resolve through the module, so self-referential schemas
//! ("a group may contain groups") never form strong reference cycles.

use std::collections::HashMap;
use std::sync::Arc;

use crate::datatype::DataType;
use crate::error::SchemaError;
use crate::instance::{FlagInstance, ModelInstance};
use crate::qname::QName;

/// Common surface of the three definition kinds, keyed by qualified name.
///
/// Definition *identity* is `Arc` pointer identity: resolving the same
/// global definition twice yields clones of the same allocation, which is
/// what cycle detection in the node graph compares.
pub trait Definition {
    const KIND: &'static str;

    fn name(&self) -> &QName;

    fn lookup(module: &ModuleDef, name: &QName) -> Option<Arc<Self>>;
}

/// A schema module: a namespace plus the global definitions it declares.
#[derive(Debug, Default)]
pub struct ModuleDef {
    pub short_name: String,
    pub namespace: Option<String>,
    pub location: Option<String>,
    assemblies: HashMap<QName, Arc<AssemblyDef>>,
    fields: HashMap<QName, Arc<FieldDef>>,
    flags: HashMap<QName, Arc<FlagDef>>,
    roots: Vec<QName>,
}

impl ModuleDef {
    pub fn new(short_name: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            short_name: short_name.into(),
            namespace,
            location: None,
            assemblies: HashMap::new(),
            fields: HashMap::new(),
            flags: HashMap::new(),
            roots: Vec::new(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn add_assembly(&mut self, def: AssemblyDef) -> Result<Arc<AssemblyDef>, SchemaError> {
        let name = def.name.clone();
        if self.assemblies.contains_key(&name) {
            return Err(SchemaError::DuplicateDefinition {
                kind: AssemblyDef::KIND,
                name,
            });
        }
        let is_root = def.root_name.is_some();
        let def = Arc::new(def);
        self.assemblies.insert(name.clone(), Arc::clone(&def));
        if is_root {
            self.roots.push(name);
        }
        Ok(def)
    }

    pub fn add_field(&mut self, def: FieldDef) -> Result<Arc<FieldDef>, SchemaError> {
        let name = def.name.clone();
        if self.fields.contains_key(&name) {
            return Err(SchemaError::DuplicateDefinition {
                kind: FieldDef::KIND,
                name,
            });
        }
        let def = Arc::new(def);
        self.fields.insert(name, Arc::clone(&def));
        Ok(def)
    }

    pub fn add_flag(&mut self, def: FlagDef) -> Result<Arc<FlagDef>, SchemaError> {
        let name = def.name.clone();
        if self.flags.contains_key(&name) {
            return Err(SchemaError::DuplicateDefinition {
                kind: FlagDef::KIND,
                name,
            });
        }
        let def = Arc::new(def);
        self.flags.insert(name, Arc::clone(&def));
        Ok(def)
    }

    pub fn assembly(&self, name: &QName) -> Option<Arc<AssemblyDef>> {
        self.assemblies.get(name).cloned()
    }

    pub fn field(&self, name: &QName) -> Option<Arc<FieldDef>> {
        self.fields.get(name).cloned()
    }

    pub fn flag(&self, name: &QName) -> Option<Arc<FlagDef>> {
        self.flags.get(name).cloned()
    }

    pub fn assemblies(&self) -> impl Iterator<Item = &Arc<AssemblyDef>> {
        self.assemblies.values()
    }

    pub fn fields(&self) -> impl Iterator<Item = &Arc<FieldDef>> {
        self.fields.values()
    }

    pub fn flags(&self) -> impl Iterator<Item = &Arc<FlagDef>> {
        self.flags.values()
    }

    /// Assemblies declared as document roots, in declaration order.
    pub fn root_assemblies(&self) -> Vec<Arc<AssemblyDef>> {
        self.roots
            .iter()
            .filter_map(|name| self.assemblies.get(name).cloned())
            .collect()
    }

    pub fn root_assembly(&self, root_name: &QName) -> Result<Arc<AssemblyDef>, SchemaError> {
        self.root_assemblies()
            .into_iter()
            .find(|def| def.root_name.as_ref() == Some(root_name))
            .ok_or_else(|| SchemaError::UnknownRoot(root_name.clone()))
    }

    /// Qualify a local name against this module's namespace.
    pub fn qualify(&self, local: impl Into<String>) -> QName {
        QName {
            namespace: self.namespace.clone(),
            local: local.into(),
        }
    }
}

/// An assembly: a named container of flags and model children.
#[derive(Debug)]
pub struct AssemblyDef {
    pub name: QName,
    pub formal_name: Option<String>,
    pub description: Option<String>,
    pub flags: Vec<FlagInstance>,
    pub model: Vec<ModelInstance>,
    /// Set when this assembly may appear as a document root, under this name.
    pub root_name: Option<QName>,
}

impl AssemblyDef {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            formal_name: None,
            description: None,
            flags: Vec::new(),
            model: Vec::new(),
            root_name: None,
        }
    }

    pub fn with_root_name(mut self, root_name: QName) -> Self {
        self.root_name = Some(root_name);
        self
    }

    pub fn with_flag(mut self, flag: FlagInstance) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn with_model(mut self, instance: ModelInstance) -> Self {
        self.model.push(instance);
        self
    }
}

impl Definition for AssemblyDef {
    const KIND: &'static str = "assembly";

    fn name(&self) -> &QName {
        &self.name
    }

    fn lookup(module: &ModuleDef, name: &QName) -> Option<Arc<Self>> {
        module.assembly(name)
    }
}

/// A field: a named, typed value that may carry flags but no model children.
#[derive(Debug)]
pub struct FieldDef {
    pub name: QName,
    pub formal_name: Option<String>,
    pub description: Option<String>,
    pub data_type: DataType,
    pub flags: Vec<FlagInstance>,
}

impl FieldDef {
    pub fn new(name: QName, data_type: DataType) -> Self {
        Self {
            name,
            formal_name: None,
            description: None,
            data_type,
            flags: Vec::new(),
        }
    }

    pub fn with_flag(mut self, flag: FlagInstance) -> Self {
        self.flags.push(flag);
        self
    }
}

impl Definition for FieldDef {
    const KIND: &'static str = "field";

    fn name(&self) -> &QName {
        &self.name
    }

    fn lookup(module: &ModuleDef, name: &QName) -> Option<Arc<Self>> {
        module.field(name)
    }
}

/// A flag: a named, typed scalar attached to an assembly or field.
#[derive(Debug)]
pub struct FlagDef {
    pub name: QName,
    pub data_type: DataType,
    pub default: Option<String>,
}

impl FlagDef {
    pub fn new(name: QName, data_type: DataType) -> Self {
        Self {
            name,
            data_type,
            default: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

impl Definition for FlagDef {
    const KIND: &'static str = "flag";

    fn name(&self) -> &QName {
        &self.name
    }

    fn lookup(module: &ModuleDef, name: &QName) -> Option<Arc<Self>> {
        module.flag(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_lookup_returns_same_arc() {
        let mut module = ModuleDef::new("test", Some("http://example.com/ns".to_string()));
        let name = module.qualify("thing");
        let added = module.add_assembly(AssemblyDef::new(name.clone())).unwrap();

        let first = module.assembly(&name).unwrap();
        let second = module.assembly(&name).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &added));
    }

    #[test]
    fn test_duplicate_definition_rejected() {
        let mut module = ModuleDef::new("test", None);
        let name = QName::local_only("dup");
        module.add_field(FieldDef::new(name.clone(), DataType::String)).unwrap();
        let err = module.add_field(FieldDef::new(name, DataType::String));
        assert!(matches!(err, Err(SchemaError::DuplicateDefinition { .. })));
    }

    #[test]
    fn test_root_assemblies() {
        let mut module = ModuleDef::new("test", None);
        let root_name = QName::local_only("catalog");
        module
            .add_assembly(
                AssemblyDef::new(QName::local_only("catalog")).with_root_name(root_name.clone()),
            )
            .unwrap();
        module
            .add_assembly(AssemblyDef::new(QName::local_only("inner")))
            .unwrap();

        assert_eq!(module.root_assemblies().len(), 1);
        assert!(module.root_assembly(&root_name).is_ok());
        assert!(module.root_assembly(&QName::local_only("missing")).is_err());
    }
}
