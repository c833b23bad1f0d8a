//! Metapath runtime data model and value semantics.
//!
//! The two load-bearing subsystems are the node item graph, a lazily
//! materialized, read-only tree over schema definitions and optional bound
//! data, and the item/sequence/collection value model with the coercion and
//! aggregation rules every library function applies identically.
//!
//! # Key Types
//!
//! - [`Sequence`] / [`Item`]: the universal result type and its variants
//! - [`AtomicItem`]: typed immutable scalars
//! - [`ArrayItem`] / [`MapItem`]: immutable persistent collections
//! - [`NodeGraph`] / [`NodeItem`]: the queryable document/schema graph
//! - [`FunctionRegistry`]: name-plus-arity lookup for the builtin library
//! - [`StaticContext`] / [`DynamicContext`]: the explicit evaluation
//!   environments
//!
//! # Example
//!
//! ```ignore
//! use metapath_core::{DynamicContext, FunctionRegistry, Sequence};
//! use metapath_schema::QName;
//!
//! let registry = FunctionRegistry::default();
//! let substring = registry.resolve(&QName::local_only("substring"), 2)?;
//! let result = substring.execute(
//!     vec![Sequence::from_string("metaschema"), Sequence::from_integer(5)],
//!     &DynamicContext::default(),
//!     None,
//! )?;
//! assert_eq!(result, Sequence::from_string("schema"));
//! ```

pub mod context;
pub mod error;
pub mod eval;
pub mod functions;
pub mod loader;
pub mod node;
pub mod types;
pub mod visitor;

pub use context::{DEFAULT_DEPTH_LIMIT, DynamicContext, StaticContext};
pub use error::MetapathError;
pub use eval::{CompiledExpression, ExpressionEvaluator};
pub use functions::{
    ArgumentSpec, BuiltinFn, FunctionRegistry, FunctionSignature, ItemType, Occurrence,
};
pub use loader::{
    DocumentLoader, FilesystemDocumentLoader, InMemoryDocumentLoader, LoadedDocument,
};
pub use node::{NodeGraph, NodeItem, NodeKind};
pub use types::{
    ArrayItem, AtomicItem, Date, DateTime, DuplicatePolicy, FunctionItem, Item, MapItem, MapKey,
    Sequence, Time,
};
pub use visitor::{RecursionCollector, RecursiveUse, SchemaVisitor, SchemaWalker};

pub use metapath_schema::QName;
