//! The built-in function library and its calling convention.
//!
//! Every function is described by a [`FunctionSignature`] in a
//! name-plus-arity-keyed [`FunctionRegistry`]. The evaluator resolves a call
//! through the registry and invokes the uniform
//! `execute(arguments, dynamic context, focus)` contract; the signature
//! enforces argument cardinality before the handler runs.

mod array;
mod boolean;
mod datetime;
mod doc;
mod duration;
mod map;
mod node;
mod numeric;
mod recurse;
mod sequence;
mod string;

use std::collections::HashMap;
use std::sync::Arc;

use metapath_schema::QName;
use rust_decimal::Decimal;

use crate::context::DynamicContext;
use crate::error::MetapathError;
use crate::types::{ArrayItem, AtomicItem, Item, MapItem, Sequence};

/// Namespace markers for the map and array function families. The
/// expression compiler maps whatever prefixes are in scope onto these.
pub const MAP_NS: &str = "map";
pub const ARRAY_NS: &str = "array";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence {
    One,
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
}

impl Occurrence {
    fn admits(&self, len: usize) -> bool {
        match self {
            Occurrence::One => len == 1,
            Occurrence::ZeroOrOne => len <= 1,
            Occurrence::ZeroOrMore => true,
            Occurrence::OneOrMore => len >= 1,
        }
    }

    fn expected(&self) -> &'static str {
        match self {
            Occurrence::One => "exactly one",
            Occurrence::ZeroOrOne => "zero or one",
            Occurrence::ZeroOrMore => "zero or more",
            Occurrence::OneOrMore => "one or more",
        }
    }
}

/// Advisory item type of an argument or return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    Any,
    Atomic,
    Node,
    Array,
    Map,
    Boolean,
    String,
    Numeric,
    Integer,
    Duration,
    Temporal,
    Uri,
}

#[derive(Debug, Clone, Copy)]
pub struct ArgumentSpec {
    pub name: &'static str,
    pub item_type: ItemType,
    pub occurrence: Occurrence,
}

impl ArgumentSpec {
    pub const fn new(name: &'static str, item_type: ItemType, occurrence: Occurrence) -> Self {
        Self {
            name,
            item_type,
            occurrence,
        }
    }
}

/// Handler contract shared by every builtin.
pub type BuiltinFn =
    fn(Vec<Sequence>, &DynamicContext, Option<&Item>) -> Result<Sequence, MetapathError>;

pub struct FunctionSignature {
    pub name: QName,
    pub min_args: usize,
    pub max_args: Option<usize>,
    pub args: Vec<ArgumentSpec>,
    pub returns: ArgumentSpec,
    pub deterministic: bool,
    pub focus_dependent: bool,
    pub context_dependent: bool,
    handler: BuiltinFn,
}

impl std::fmt::Debug for FunctionSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.name, self.min_args)?;
        if self.max_args != Some(self.min_args) {
            match self.max_args {
                Some(max) => write!(f, "..{max}")?,
                None => write!(f, "..")?,
            }
        }
        Ok(())
    }
}

impl FunctionSignature {
    pub fn new(
        name: QName,
        min_args: usize,
        max_args: Option<usize>,
        args: Vec<ArgumentSpec>,
        returns: ArgumentSpec,
        handler: BuiltinFn,
    ) -> Self {
        Self {
            name,
            min_args,
            max_args,
            args,
            returns,
            deterministic: true,
            focus_dependent: false,
            context_dependent: false,
            handler,
        }
    }

    pub fn non_deterministic(mut self) -> Self {
        self.deterministic = false;
        self
    }

    pub fn focus_dependent(mut self) -> Self {
        self.focus_dependent = true;
        self
    }

    pub fn context_dependent(mut self) -> Self {
        self.context_dependent = true;
        self
    }

    pub fn accepts_arity(&self, arity: usize) -> bool {
        arity >= self.min_args && self.max_args.is_none_or(|max| arity <= max)
    }

    /// Invoke this function: enforce argument count and per-argument
    /// cardinality, then run the handler.
    pub fn execute(
        &self,
        arguments: Vec<Sequence>,
        context: &DynamicContext,
        focus: Option<&Item>,
    ) -> Result<Sequence, MetapathError> {
        if !self.accepts_arity(arguments.len()) {
            return Err(MetapathError::UnknownFunction {
                name: self.name.clone(),
                arity: arguments.len(),
            });
        }
        for (i, argument) in arguments.iter().enumerate() {
            if let Some(spec) = self.args.get(i)
                && !spec.occurrence.admits(argument.len())
            {
                return Err(MetapathError::cardinality(
                    spec.occurrence.expected(),
                    argument.len(),
                ));
            }
        }
        (self.handler)(arguments, context, focus)
    }
}

/// Name-plus-arity-keyed table of built-in functions.
pub struct FunctionRegistry {
    table: HashMap<QName, Vec<Arc<FunctionSignature>>>,
}

impl FunctionRegistry {
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    pub fn register(&mut self, signature: FunctionSignature) {
        self.table
            .entry(signature.name.clone())
            .or_default()
            .push(Arc::new(signature));
    }

    pub fn resolve(
        &self,
        name: &QName,
        arity: usize,
    ) -> Result<Arc<FunctionSignature>, MetapathError> {
        self.table
            .get(name)
            .and_then(|candidates| {
                candidates
                    .iter()
                    .find(|sig| sig.accepts_arity(arity))
                    .cloned()
            })
            .ok_or_else(|| MetapathError::UnknownFunction {
                name: name.clone(),
                arity,
            })
    }

    pub fn len(&self) -> usize {
        self.table.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn signatures(&self) -> impl Iterator<Item = &Arc<FunctionSignature>> {
        self.table.values().flatten()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        array::register(&mut registry);
        boolean::register(&mut registry);
        datetime::register(&mut registry);
        doc::register(&mut registry);
        duration::register(&mut registry);
        map::register(&mut registry);
        node::register(&mut registry);
        numeric::register(&mut registry);
        recurse::register(&mut registry);
        sequence::register(&mut registry);
        string::register(&mut registry);
        registry
    }
}

// ---- shared argument coercion helpers ----

/// Single atomic from a zero-or-one argument; empty becomes `None`.
pub(crate) fn optional_atomic(seq: &Sequence) -> Result<Option<AtomicItem>, MetapathError> {
    let atoms = seq.atomize()?;
    match atoms.len() {
        0 | 1 => Ok(atoms.into_iter().next()),
        n => Err(MetapathError::cardinality("zero or one", n)),
    }
}

pub(crate) fn required_atomic(seq: &Sequence) -> Result<AtomicItem, MetapathError> {
    optional_atomic(seq)?.ok_or_else(|| MetapathError::cardinality("exactly one", 0))
}

/// String value of a zero-or-one argument; empty sequence is "".
pub(crate) fn string_arg(seq: &Sequence) -> Result<String, MetapathError> {
    Ok(optional_atomic(seq)?.map(|a| a.canonical()).unwrap_or_default())
}

/// A required integer argument.
pub(crate) fn integer_arg(seq: &Sequence) -> Result<i64, MetapathError> {
    let atom = required_atomic(seq)?;
    atom.as_integer()
        .ok_or_else(|| MetapathError::type_error(format!("expected integer, got {}", atom.type_name())))
}

/// A zero-or-one numeric argument widened to decimal, with
/// untyped-atomic going through the decimal cast.
pub(crate) fn optional_decimal(seq: &Sequence) -> Result<Option<Decimal>, MetapathError> {
    match optional_atomic(seq)? {
        None => Ok(None),
        Some(atom) => numeric_decimal(&atom).map(Some),
    }
}

pub(crate) fn numeric_decimal(atom: &AtomicItem) -> Result<Decimal, MetapathError> {
    let coerced = match atom {
        AtomicItem::Untyped(_) => atom.cast(metapath_schema::DataType::Decimal)?,
        other => other.clone(),
    };
    coerced
        .as_decimal()
        .ok_or_else(|| MetapathError::type_error(format!("expected numeric, got {}", atom.type_name())))
}

pub(crate) fn map_arg(seq: &Sequence) -> Result<MapItem, MetapathError> {
    match seq.one()? {
        Item::Map(m) => Ok(m.clone()),
        other => Err(MetapathError::type_error(format!(
            "expected map(*), got {}",
            other.type_name()
        ))),
    }
}

pub(crate) fn array_arg(seq: &Sequence) -> Result<ArrayItem, MetapathError> {
    match seq.one()? {
        Item::Array(a) => Ok(a.clone()),
        other => Err(MetapathError::type_error(format!(
            "expected array(*), got {}",
            other.type_name()
        ))),
    }
}

/// The node a 0/1-arity node function applies to: the explicit argument
/// when given, otherwise the focus item.
pub(crate) fn node_arg<'a>(
    arguments: &'a [Sequence],
    focus: Option<&'a Item>,
) -> Result<Option<&'a crate::node::NodeItem>, MetapathError> {
    let item = match arguments.first() {
        Some(seq) => seq.zero_or_one()?,
        None => match focus {
            Some(item) => Some(item),
            None => return Err(MetapathError::MissingFocus),
        },
    };
    match item {
        None => Ok(None),
        Some(Item::Node(n)) => Ok(Some(n)),
        Some(other) => Err(MetapathError::type_error(format!(
            "expected node(), got {}",
            other.type_name()
        ))),
    }
}

/// The argument to operate on for 0/1-arity functions that default to the
/// focus item.
pub(crate) fn focus_or_first<'a>(
    arguments: &'a [Sequence],
    focus: Option<&'a Item>,
) -> Result<FocusTarget<'a>, MetapathError> {
    match arguments.first() {
        Some(seq) => Ok(FocusTarget::Argument(seq)),
        None => match focus {
            Some(item) => Ok(FocusTarget::Focus(item)),
            None => Err(MetapathError::MissingFocus),
        },
    }
}

pub(crate) enum FocusTarget<'a> {
    Argument(&'a Sequence),
    Focus(&'a Item),
}

impl FocusTarget<'_> {
    pub(crate) fn string_value(&self) -> Result<String, MetapathError> {
        match self {
            FocusTarget::Argument(seq) => string_arg(seq),
            FocusTarget::Focus(item) => Ok(item.string_value()),
        }
    }
}
