//! Integration layer re-exporting the Metapath runtime crates.
//!
//! Depend on this crate for the full surface, or on `metapath-schema` /
//! `metapath-core` directly for a narrower one.

pub use metapath_core::{
    ArrayItem, AtomicItem, CompiledExpression, DEFAULT_DEPTH_LIMIT, Date, DateTime,
    DocumentLoader, DuplicatePolicy, DynamicContext, ExpressionEvaluator,
    FilesystemDocumentLoader, FunctionItem, FunctionRegistry, FunctionSignature,
    InMemoryDocumentLoader, Item, LoadedDocument, MapItem, MapKey, MetapathError, NodeGraph,
    NodeItem, NodeKind, RecursionCollector, RecursiveUse, SchemaVisitor, SchemaWalker, Sequence,
    StaticContext, Time,
};
pub use metapath_schema as schema;
pub use metapath_schema::{
    AssemblyDef, AssemblyInstance, BoundAssembly, BoundField, BoundValue, DataType, DefinitionRef,
    FieldDef, FieldInstance, FlagDef, FlagInstance, MaxOccurs, ModelInstance, ModuleDef, QName,
    ScalarValue, SchemaError,
};
