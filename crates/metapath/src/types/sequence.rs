use std::fmt;

use crate::error::MetapathError;
use crate::node::NodeItem;
use crate::types::{ArrayItem, AtomicItem, FunctionItem, MapItem};

/// A single value in the data model: a node, an atomic, or a function-shaped
/// collection value.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Node(NodeItem),
    Atomic(AtomicItem),
    Array(ArrayItem),
    Map(MapItem),
    Function(FunctionItem),
}

impl Item {
    pub fn is_node(&self) -> bool {
        matches!(self, Item::Node(_))
    }

    pub fn as_node(&self) -> Option<&NodeItem> {
        match self {
            Item::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_atomic(&self) -> Option<&AtomicItem> {
        match self {
            Item::Atomic(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayItem> {
        match self {
            Item::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapItem> {
        match self {
            Item::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Item::Node(_) => "node()",
            Item::Atomic(a) => a.type_name(),
            Item::Array(_) => "array(*)",
            Item::Map(_) => "map(*)",
            Item::Function(_) => "function(*)",
        }
    }

    pub fn string_value(&self) -> String {
        match self {
            Item::Node(n) => n.string_value(),
            Item::Atomic(a) => a.canonical(),
            Item::Array(_) | Item::Map(_) | Item::Function(_) => String::new(),
        }
    }

    /// Atomize this item, appending the resulting atomics to `out`.
    ///
    /// Arrays atomize member-wise; maps and other function items have no
    /// typed value and raise a type error.
    pub fn atomize_into(&self, out: &mut Vec<AtomicItem>) -> Result<(), MetapathError> {
        match self {
            Item::Atomic(a) => out.push(a.clone()),
            Item::Node(n) => out.extend(n.atomized()),
            Item::Array(arr) => {
                for member in arr.members() {
                    for item in member.items() {
                        item.atomize_into(out)?;
                    }
                }
            }
            Item::Map(_) | Item::Function(_) => {
                return Err(MetapathError::type_error(format!(
                    "cannot atomize {}",
                    self.type_name()
                )));
            }
        }
        Ok(())
    }
}

impl From<AtomicItem> for Item {
    fn from(a: AtomicItem) -> Self {
        Item::Atomic(a)
    }
}

impl From<NodeItem> for Item {
    fn from(n: NodeItem) -> Self {
        Item::Node(n)
    }
}

/// An ordered, possibly-empty list of items: the universal result type.
///
/// Sequences are immutable once produced; every operation that changes
/// membership returns a new sequence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sequence {
    items: Vec<Item>,
}

impl Sequence {
    pub fn empty() -> Self {
        Self { items: Vec::new() }
    }

    pub fn of(item: Item) -> Self {
        Self { items: vec![item] }
    }

    pub fn from_items(items: Vec<Item>) -> Self {
        Self { items }
    }

    pub fn from_atomic(value: AtomicItem) -> Self {
        Self::of(Item::Atomic(value))
    }

    pub fn from_node(node: NodeItem) -> Self {
        Self::of(Item::Node(node))
    }

    pub fn from_nodes(nodes: Vec<NodeItem>) -> Self {
        Self::from_items(nodes.into_iter().map(Item::Node).collect())
    }

    pub fn from_bool(b: bool) -> Self {
        Self::from_atomic(AtomicItem::Boolean(b))
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self::from_atomic(AtomicItem::String(s.into()))
    }

    pub fn from_integer(i: i64) -> Self {
        Self::from_atomic(AtomicItem::Integer(i))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    pub fn first(&self) -> Option<&Item> {
        self.items.first()
    }

    /// Exactly one item, or a cardinality error.
    pub fn one(&self) -> Result<&Item, MetapathError> {
        match self.items.as_slice() {
            [item] => Ok(item),
            items => Err(MetapathError::cardinality("exactly one", items.len())),
        }
    }

    /// At most one item, or a cardinality error.
    pub fn zero_or_one(&self) -> Result<Option<&Item>, MetapathError> {
        match self.items.as_slice() {
            [] => Ok(None),
            [item] => Ok(Some(item)),
            items => Err(MetapathError::cardinality("zero or one", items.len())),
        }
    }

    /// At least one item, or a cardinality error.
    pub fn one_or_more(&self) -> Result<&[Item], MetapathError> {
        if self.items.is_empty() {
            return Err(MetapathError::cardinality("one or more", 0));
        }
        Ok(&self.items)
    }

    /// The effective boolean value:
    /// - empty sequence is `false`
    /// - a sequence whose first item is a node is `true`
    /// - a singleton atomic uses its own boolean conversion
    /// - anything else is a type error
    pub fn effective_boolean_value(&self) -> Result<bool, MetapathError> {
        match self.items.as_slice() {
            [] => Ok(false),
            [Item::Node(_), ..] => Ok(true),
            [Item::Atomic(a)] => a.effective_boolean(),
            [single] => Err(MetapathError::type_error(format!(
                "{} has no effective boolean value",
                single.type_name()
            ))),
            _ => Err(MetapathError::type_error(
                "a sequence of more than one item has no effective boolean value",
            )),
        }
    }

    pub fn atomize(&self) -> Result<Vec<AtomicItem>, MetapathError> {
        let mut out = Vec::with_capacity(self.items.len());
        for item in &self.items {
            item.atomize_into(&mut out)?;
        }
        Ok(out)
    }

    pub fn concat(mut self, other: Sequence) -> Self {
        self.items.extend(other.items);
        self
    }

    /// Insert `inserts` before 1-based `position`. Out-of-range positions
    /// clamp to the nearest end instead of erroring.
    pub fn insert_before(&self, position: i64, inserts: &Sequence) -> Sequence {
        let at = position.saturating_sub(1).clamp(0, self.items.len() as i64) as usize;
        let mut items = Vec::with_capacity(self.items.len() + inserts.len());
        items.extend_from_slice(&self.items[..at]);
        items.extend_from_slice(&inserts.items);
        items.extend_from_slice(&self.items[at..]);
        Sequence::from_items(items)
    }

    /// Remove the item at 1-based `position`; out-of-range positions leave
    /// the sequence unchanged.
    pub fn remove(&self, position: i64) -> Sequence {
        let items = self
            .items
            .iter()
            .enumerate()
            .filter(|(i, _)| (*i as i64) + 1 != position)
            .map(|(_, item)| item.clone())
            .collect();
        Sequence::from_items(items)
    }
}

impl From<AtomicItem> for Sequence {
    fn from(a: AtomicItem) -> Self {
        Sequence::from_atomic(a)
    }
}

impl From<Item> for Sequence {
    fn from(item: Item) -> Self {
        Sequence::of(item)
    }
}

impl FromIterator<Item> for Sequence {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        Sequence::from_items(iter.into_iter().collect())
    }
}

impl IntoIterator for Sequence {
    type Item = Item;
    type IntoIter = std::vec::IntoIter<Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.items.is_empty() {
            return write!(f, "()");
        }
        write!(f, "(")?;
        let mut first = true;
        for item in &self.items {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}", item.string_value())?;
            first = false;
        }
        write!(f, ")")
    }
}
