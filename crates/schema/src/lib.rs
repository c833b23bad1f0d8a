//! Schema definition model and bound-data contract for the Metapath runtime.
//!
//! This crate is the foundation the node item graph is built against. It
//! describes *what a schema declares*: modules, assemblies, fields, flags,
//! and the instances that use them, plus the shape of already-deserialized
//! bound data. It knows nothing about query evaluation; the `metapath-core`
//! crate consumes these descriptors to materialize queryable node trees.
//!
//! # Key Types
//!
//! - [`ModuleDef`]: a schema module owning global definitions
//! - [`AssemblyDef`] / [`FieldDef`] / [`FlagDef`]: the three definition kinds
//! - [`ModelInstance`] / [`FlagInstance`]: usage contexts within a parent
//! - [`BoundValue`]: the in-memory object graph a deserializer produces

pub mod datatype;
pub mod definition;
pub mod error;
pub mod instance;
pub mod qname;
pub mod value;

pub use datatype::DataType;
pub use definition::{AssemblyDef, Definition, FieldDef, FlagDef, ModuleDef};
pub use error::SchemaError;
pub use instance::{
    AssemblyInstance, DefinitionRef, FieldInstance, FlagInstance, MaxOccurs, ModelInstance,
};
pub use qname::QName;
pub use value::{BoundAssembly, BoundField, BoundValue, ScalarValue};

// Test utilities - publicly available for integration testing in downstream crates
pub mod tests;
