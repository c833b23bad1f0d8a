//! The node item graph: a lazily materialized, read-only tree over schema
//! definitions and optional bound data.
//!
//! Nodes live in an arena owned by a [`NodeGraph`]; parents and children are
//! referenced by index, never by owned pointers, so recursive schemas cannot
//! form ownership cycles. Child containers are computed on first access and
//! memoized for the graph's lifetime.
//!
//! Two generation modes exist. *Schema* generation materializes exactly one
//! value-less node per legal child instance and marks recursive descent with
//! a cycled node instead of descending again. *Data* generation materializes
//! one node per bound value, with 1-based sibling positions, and needs no
//! cycle marking because bound data is finite.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use metapath_schema::{
    AssemblyDef, AssemblyInstance, BoundValue, DataType, FieldDef, FieldInstance, FlagDef,
    FlagInstance, ModelInstance, ModuleDef, QName, ScalarValue,
};
use url::Url;

use crate::context::StaticContext;
use crate::types::AtomicItem;

pub type NodeKey = usize;

/// The externally visible kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Module,
    Document,
    Assembly,
    Field,
    Flag,
}

#[derive(Debug)]
enum NodeData {
    Module,
    Document {
        uri: Option<Url>,
        root_def: Arc<AssemblyDef>,
        value: BoundValue,
    },
    Assembly {
        def: Arc<AssemblyDef>,
        instance: Option<AssemblyInstance>,
        value: Option<BoundValue>,
        position: usize,
    },
    Field {
        def: Arc<FieldDef>,
        instance: Option<FieldInstance>,
        value: Option<BoundValue>,
        position: usize,
    },
    Flag {
        def: Arc<FlagDef>,
        instance: Option<FlagInstance>,
        value: Option<ScalarValue>,
    },
    /// Marks recursive schema descent; children delegate to `target`.
    Cycled {
        target: NodeKey,
        instance: AssemblyInstance,
    },
}

struct NodeSlot {
    data: NodeData,
    parent: Option<NodeKey>,
    flags: Option<Vec<NodeKey>>,
    model: Option<Vec<NodeKey>>,
}

/// Arena of nodes sharing one module and static context.
pub struct NodeGraph {
    module: Arc<ModuleDef>,
    static_context: Arc<StaticContext>,
    slots: RefCell<Vec<NodeSlot>>,
}

impl fmt::Debug for NodeGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeGraph")
            .field("module", &self.module.short_name)
            .field("nodes", &self.slots.borrow().len())
            .finish()
    }
}

impl NodeGraph {
    fn new(module: Arc<ModuleDef>, static_context: StaticContext) -> Rc<Self> {
        Rc::new(Self {
            module,
            static_context: Arc::new(static_context),
            slots: RefCell::new(Vec::new()),
        })
    }

    fn module_context(module: &ModuleDef) -> StaticContext {
        let mut ctx = StaticContext::for_namespace(module.namespace.clone(), None);
        if let Some(location) = &module.location
            && let Ok(url) = Url::parse(location)
        {
            ctx = ctx.with_base_uri(url);
        }
        ctx
    }

    fn alloc(&self, data: NodeData, parent: Option<NodeKey>) -> NodeKey {
        let mut slots = self.slots.borrow_mut();
        let key = slots.len();
        slots.push(NodeSlot {
            data,
            parent,
            flags: None,
            model: None,
        });
        key
    }

    /// A module node over the schema alone. Its flag children are the
    /// module's global flag definitions; its model children are the global
    /// assembly and field definitions, each a schema-only node.
    pub fn for_module(module: Arc<ModuleDef>) -> NodeItem {
        let context = Self::module_context(&module);
        let graph = Self::new(module, context);
        let key = graph.alloc(NodeData::Module, None);
        NodeItem { graph, key }
    }

    /// A document node over bound data: data generation from here down.
    pub fn document(
        module: Arc<ModuleDef>,
        root_def: Arc<AssemblyDef>,
        value: BoundValue,
        uri: Option<Url>,
    ) -> NodeItem {
        let mut context = Self::module_context(&module);
        if let Some(uri) = &uri {
            context = context.with_base_uri(uri.clone());
        }
        let graph = Self::new(module, context);
        let key = graph.alloc(
            NodeData::Document {
                uri,
                root_def,
                value,
            },
            None,
        );
        NodeItem { graph, key }
    }

    /// An orphaned assembly-definition node: schema-only, parented to
    /// nothing, with a static context built from the definition's namespace
    /// and an optional base URI.
    pub fn orphan_assembly(
        module: Arc<ModuleDef>,
        def: Arc<AssemblyDef>,
        base_uri: Option<Url>,
    ) -> NodeItem {
        let context = StaticContext::for_namespace(def.name.namespace.clone(), base_uri);
        let graph = Self::new(module, context);
        let key = graph.alloc(
            NodeData::Assembly {
                def,
                instance: None,
                value: None,
                position: 1,
            },
            None,
        );
        NodeItem { graph, key }
    }

    /// An orphaned field-definition node; see [`NodeGraph::orphan_assembly`].
    pub fn orphan_field(
        module: Arc<ModuleDef>,
        def: Arc<FieldDef>,
        base_uri: Option<Url>,
    ) -> NodeItem {
        let context = StaticContext::for_namespace(def.name.namespace.clone(), base_uri);
        let graph = Self::new(module, context);
        let key = graph.alloc(
            NodeData::Field {
                def,
                instance: None,
                value: None,
                position: 1,
            },
            None,
        );
        NodeItem { graph, key }
    }

    // A broken definition reference means the module was never validated;
    // there is no legal node to build for it.
    fn resolve<T: metapath_schema::Definition>(
        &self,
        reference: &metapath_schema::DefinitionRef<T>,
    ) -> Arc<T> {
        match reference.resolve(&self.module) {
            Ok(def) => def,
            Err(e) => panic!("unresolvable schema reference: {e}"),
        }
    }

    fn parent_of(&self, key: NodeKey) -> Option<NodeKey> {
        self.slots.borrow()[key].parent
    }

    fn flags_of(self: &Rc<Self>, key: NodeKey) -> Vec<NodeKey> {
        if let Some(flags) = &self.slots.borrow()[key].flags {
            return flags.clone();
        }
        let computed = self.compute_flags(key);
        self.slots.borrow_mut()[key].flags = Some(computed.clone());
        computed
    }

    fn model_of(self: &Rc<Self>, key: NodeKey) -> Vec<NodeKey> {
        if let Some(model) = &self.slots.borrow()[key].model {
            return model.clone();
        }
        let computed = self.compute_model(key);
        self.slots.borrow_mut()[key].model = Some(computed.clone());
        computed
    }

    fn compute_flags(self: &Rc<Self>, key: NodeKey) -> Vec<NodeKey> {
        enum Plan {
            GlobalFlags,
            Instances(Vec<FlagInstance>, Option<BoundValue>),
            None,
        }

        let plan = {
            let slots = self.slots.borrow();
            match &slots[key].data {
                NodeData::Module => Plan::GlobalFlags,
                NodeData::Assembly { def, value, .. } => {
                    Plan::Instances(def.flags.clone(), value.clone())
                }
                NodeData::Field { def, value, .. } => {
                    Plan::Instances(def.flags.clone(), value.clone())
                }
                NodeData::Document { .. } | NodeData::Flag { .. } | NodeData::Cycled { .. } => {
                    Plan::None
                }
            }
        };

        match plan {
            Plan::None => Vec::new(),
            Plan::GlobalFlags => {
                let mut defs: Vec<Arc<FlagDef>> = self.module.flags().cloned().collect();
                defs.sort_by(|a, b| a.name.cmp(&b.name));
                defs.into_iter()
                    .map(|def| {
                        self.alloc(
                            NodeData::Flag {
                                def,
                                instance: None,
                                value: None,
                            },
                            Some(key),
                        )
                    })
                    .collect()
            }
            Plan::Instances(instances, value) => {
                let mut out = Vec::new();
                for instance in instances {
                    let def = self.resolve(&instance.def);
                    match &value {
                        // data generation: only bound flags yield nodes
                        Some(bound) => {
                            let name = instance.effective_name();
                            if let Some(scalar) = bound.flag(&name.local) {
                                out.push(self.alloc(
                                    NodeData::Flag {
                                        def,
                                        instance: Some(instance.clone()),
                                        value: Some(scalar.clone()),
                                    },
                                    Some(key),
                                ));
                            }
                        }
                        // schema generation: one value-less node per instance
                        None => {
                            out.push(self.alloc(
                                NodeData::Flag {
                                    def,
                                    instance: Some(instance.clone()),
                                    value: None,
                                },
                                Some(key),
                            ));
                        }
                    }
                }
                out
            }
        }
    }

    fn compute_model(self: &Rc<Self>, key: NodeKey) -> Vec<NodeKey> {
        enum Plan {
            GlobalDefs,
            Root(Arc<AssemblyDef>, BoundValue),
            Instances(Vec<ModelInstance>, Option<BoundValue>),
            Delegate(NodeKey),
            None,
        }

        let plan = {
            let slots = self.slots.borrow();
            match &slots[key].data {
                NodeData::Module => Plan::GlobalDefs,
                NodeData::Document {
                    root_def, value, ..
                } => Plan::Root(Arc::clone(root_def), value.clone()),
                NodeData::Assembly { def, value, .. } => {
                    Plan::Instances(def.model.clone(), value.clone())
                }
                NodeData::Field { .. } | NodeData::Flag { .. } => Plan::None,
                NodeData::Cycled { target, .. } => Plan::Delegate(*target),
            }
        };

        match plan {
            Plan::None => Vec::new(),
            // a cycled node reads the ancestor's children instead of
            // descending again
            Plan::Delegate(target) => self.model_of(target),
            Plan::GlobalDefs => {
                let mut out = Vec::new();
                let mut assemblies: Vec<Arc<AssemblyDef>> =
                    self.module.assemblies().cloned().collect();
                assemblies.sort_by(|a, b| a.name.cmp(&b.name));
                for def in assemblies {
                    out.push(self.alloc(
                        NodeData::Assembly {
                            def,
                            instance: None,
                            value: None,
                            position: 1,
                        },
                        Some(key),
                    ));
                }
                let mut fields: Vec<Arc<FieldDef>> = self.module.fields().cloned().collect();
                fields.sort_by(|a, b| a.name.cmp(&b.name));
                for def in fields {
                    out.push(self.alloc(
                        NodeData::Field {
                            def,
                            instance: None,
                            value: None,
                            position: 1,
                        },
                        Some(key),
                    ));
                }
                out
            }
            Plan::Root(def, value) => {
                vec![self.alloc(
                    NodeData::Assembly {
                        def,
                        instance: None,
                        value: Some(value),
                        position: 1,
                    },
                    Some(key),
                )]
            }
            Plan::Instances(instances, value) => {
                let mut out = Vec::new();
                for instance in instances {
                    match instance {
                        ModelInstance::Field(fi) => {
                            let def = self.resolve(&fi.def);
                            match &value {
                                Some(bound) => {
                                    let name = fi.effective_name();
                                    for (i, child) in bound.children(&name.local).iter().enumerate()
                                    {
                                        out.push(self.alloc(
                                            NodeData::Field {
                                                def: Arc::clone(&def),
                                                instance: Some(fi.clone()),
                                                value: Some(child.clone()),
                                                position: i + 1,
                                            },
                                            Some(key),
                                        ));
                                    }
                                }
                                None => {
                                    out.push(self.alloc(
                                        NodeData::Field {
                                            def,
                                            instance: Some(fi),
                                            value: None,
                                            position: 1,
                                        },
                                        Some(key),
                                    ));
                                }
                            }
                        }
                        ModelInstance::Assembly(ai) => {
                            let def = self.resolve(&ai.def);
                            match &value {
                                Some(bound) => {
                                    let name = ai.effective_name();
                                    for (i, child) in bound.children(&name.local).iter().enumerate()
                                    {
                                        out.push(self.alloc(
                                            NodeData::Assembly {
                                                def: Arc::clone(&def),
                                                instance: Some(ai.clone()),
                                                value: Some(child.clone()),
                                                position: i + 1,
                                            },
                                            Some(key),
                                        ));
                                    }
                                }
                                None => {
                                    let child = self.schema_assembly_child(key, ai, def);
                                    out.push(child);
                                }
                            }
                        }
                    }
                }
                out
            }
        }
    }

    /// Construct a schema-generation child for an assembly instance,
    /// marking recursion with a cycled node.
    ///
    /// The parent chain is scanned for an assembly carrying the same
    /// definition under the same qualified name; the first match becomes the
    /// cycle target. Cost is O(ancestor depth) per construction.
    fn schema_assembly_child(
        self: &Rc<Self>,
        parent: NodeKey,
        instance: AssemblyInstance,
        def: Arc<AssemblyDef>,
    ) -> NodeKey {
        let name = instance.effective_name();
        let mut cursor = Some(parent);
        while let Some(ancestor) = cursor {
            let slots = self.slots.borrow();
            let slot = &slots[ancestor];
            if let NodeData::Assembly {
                def: ancestor_def, ..
            } = &slot.data
                && Arc::ptr_eq(ancestor_def, &def)
                && node_name(&slot.data).as_ref() == Some(&name)
            {
                log::debug!("recursive schema use of '{name}', marking cycle");
                drop(slots);
                return self.alloc(
                    NodeData::Cycled {
                        target: ancestor,
                        instance,
                    },
                    Some(parent),
                );
            }
            cursor = slot.parent;
        }
        self.alloc(
            NodeData::Assembly {
                def,
                instance: Some(instance),
                value: None,
                position: 1,
            },
            Some(parent),
        )
    }
}

fn node_name(data: &NodeData) -> Option<QName> {
    match data {
        NodeData::Module | NodeData::Document { .. } => None,
        NodeData::Assembly { def, instance, .. } => Some(match instance {
            Some(i) => i.effective_name(),
            None => def.name.clone(),
        }),
        NodeData::Field { def, instance, .. } => Some(match instance {
            Some(i) => i.effective_name(),
            None => def.name.clone(),
        }),
        NodeData::Flag { def, instance, .. } => Some(match instance {
            Some(i) => i.effective_name(),
            None => def.name.clone(),
        }),
        NodeData::Cycled { instance, .. } => Some(instance.effective_name()),
    }
}

/// A handle to one node in a [`NodeGraph`].
#[derive(Clone)]
pub struct NodeItem {
    graph: Rc<NodeGraph>,
    key: NodeKey,
}

impl NodeItem {
    fn at(&self, key: NodeKey) -> NodeItem {
        NodeItem {
            graph: Rc::clone(&self.graph),
            key,
        }
    }

    pub fn kind(&self) -> NodeKind {
        let slots = self.graph.slots.borrow();
        match &slots[self.key].data {
            NodeData::Module => NodeKind::Module,
            NodeData::Document { .. } => NodeKind::Document,
            NodeData::Assembly { .. } | NodeData::Cycled { .. } => NodeKind::Assembly,
            NodeData::Field { .. } => NodeKind::Field,
            NodeData::Flag { .. } => NodeKind::Flag,
        }
    }

    /// True for a cycle-marker node standing in for recursive descent.
    pub fn is_cycled(&self) -> bool {
        matches!(
            self.graph.slots.borrow()[self.key].data,
            NodeData::Cycled { .. }
        )
    }

    /// The ancestor a cycled node delegates its children to.
    pub fn cycle_target(&self) -> Option<NodeItem> {
        match &self.graph.slots.borrow()[self.key].data {
            NodeData::Cycled { target, .. } => Some(self.at(*target)),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<QName> {
        node_name(&self.graph.slots.borrow()[self.key].data)
    }

    pub fn parent(&self) -> Option<NodeItem> {
        self.graph.parent_of(self.key).map(|key| self.at(key))
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self) -> Vec<NodeItem> {
        let mut out = Vec::new();
        let mut cursor = self.parent();
        while let Some(node) = cursor {
            cursor = node.parent();
            out.push(node);
        }
        out
    }

    pub fn root(&self) -> NodeItem {
        self.ancestors().into_iter().last().unwrap_or_else(|| self.clone())
    }

    /// Flag children, computed once and memoized.
    pub fn flags(&self) -> Vec<NodeItem> {
        self.graph
            .flags_of(self.key)
            .into_iter()
            .map(|key| self.at(key))
            .collect()
    }

    /// Model children (fields and assemblies), computed once and memoized.
    pub fn model_children(&self) -> Vec<NodeItem> {
        self.graph
            .model_of(self.key)
            .into_iter()
            .map(|key| self.at(key))
            .collect()
    }

    /// All descendants of the model axis, depth-first, document order.
    pub fn descendants(&self) -> Vec<NodeItem> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeItem> = self.model_children();
        stack.reverse();
        while let Some(node) = stack.pop() {
            out.push(node.clone());
            // a cycled node's children belong to its target; descending
            // through them here would loop forever
            if !node.is_cycled() {
                let mut children = node.model_children();
                children.reverse();
                stack.extend(children);
            }
        }
        out
    }

    pub fn following_siblings(&self) -> Vec<NodeItem> {
        self.siblings(|theirs, ours| theirs > ours)
    }

    pub fn preceding_siblings(&self) -> Vec<NodeItem> {
        self.siblings(|theirs, ours| theirs < ours)
    }

    fn siblings(&self, keep: impl Fn(usize, usize) -> bool) -> Vec<NodeItem> {
        let Some(parent) = self.parent() else {
            return Vec::new();
        };
        let children = parent.model_children();
        let Some(ours) = children.iter().position(|n| n == self) else {
            return Vec::new();
        };
        children
            .into_iter()
            .enumerate()
            .filter(|(i, _)| keep(*i, ours))
            .map(|(_, n)| n)
            .collect()
    }

    /// 1-based position among siblings produced by the same instance.
    /// Schema-only nodes are always at position 1.
    pub fn position(&self) -> usize {
        match &self.graph.slots.borrow()[self.key].data {
            NodeData::Assembly { position, .. } | NodeData::Field { position, .. } => *position,
            _ => 1,
        }
    }

    /// Whether this node carries bound data.
    pub fn has_value(&self) -> bool {
        match &self.graph.slots.borrow()[self.key].data {
            NodeData::Document { .. } => true,
            NodeData::Assembly { value, .. } | NodeData::Field { value, .. } => value.is_some(),
            NodeData::Flag { value, .. } => value.is_some(),
            NodeData::Module | NodeData::Cycled { .. } => false,
        }
    }

    /// True when this node exists purely from schema definitions.
    pub fn is_schema_only(&self) -> bool {
        !self.has_value() && !self.is_cycled()
    }

    pub fn string_value(&self) -> String {
        enum Kind {
            Scalar(ScalarValue),
            Children,
            Empty,
        }
        let kind = {
            let slots = self.graph.slots.borrow();
            match &slots[self.key].data {
                NodeData::Flag {
                    value: Some(scalar),
                    ..
                } => Kind::Scalar(scalar.clone()),
                NodeData::Field {
                    value: Some(BoundValue::Field(field)),
                    ..
                } => Kind::Scalar(field.value.clone()),
                NodeData::Document { .. } => Kind::Children,
                NodeData::Assembly { value: Some(_), .. } => Kind::Children,
                _ => Kind::Empty,
            }
        };
        match kind {
            Kind::Scalar(scalar) => scalar.lexical(),
            Kind::Children => self
                .model_children()
                .iter()
                .map(|c| c.string_value())
                .collect(),
            Kind::Empty => String::new(),
        }
    }

    /// The typed atomic value(s) of this node.
    ///
    /// Fields and flags atomize through their declared data type; container
    /// nodes atomize to the untyped concatenation of their content. Data
    /// that fails its declared type falls back to untyped rather than
    /// erroring, since validation is a separate concern.
    pub fn atomized(&self) -> Vec<AtomicItem> {
        enum Kind {
            Typed(ScalarValue, DataType),
            Container,
            Empty,
        }
        let kind = {
            let slots = self.graph.slots.borrow();
            match &slots[self.key].data {
                NodeData::Flag {
                    def,
                    value: Some(scalar),
                    ..
                } => Kind::Typed(scalar.clone(), def.data_type),
                NodeData::Field {
                    def,
                    value: Some(BoundValue::Field(field)),
                    ..
                } => Kind::Typed(field.value.clone(), def.data_type),
                NodeData::Document { .. } => Kind::Container,
                NodeData::Assembly { value: Some(_), .. } => Kind::Container,
                _ => Kind::Empty,
            }
        };
        match kind {
            Kind::Typed(scalar, data_type) => vec![atomic_from_scalar(&scalar, data_type)],
            Kind::Container => vec![AtomicItem::Untyped(self.string_value())],
            Kind::Empty => vec![AtomicItem::Untyped(String::new())],
        }
    }

    pub fn static_context(&self) -> Arc<StaticContext> {
        Arc::clone(&self.graph.static_context)
    }

    pub fn document_uri(&self) -> Option<Url> {
        match &self.graph.slots.borrow()[self.key].data {
            NodeData::Document { uri, .. } => uri.clone(),
            _ => None,
        }
    }

    pub fn base_uri(&self) -> Option<Url> {
        self.graph.static_context.base_uri().cloned()
    }

    /// Whether either child container has been materialized yet.
    pub fn has_materialized_children(&self) -> bool {
        let slots = self.graph.slots.borrow();
        slots[self.key].flags.is_some() || slots[self.key].model.is_some()
    }
}

impl PartialEq for NodeItem {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.graph, &other.graph) && self.key == other.key
    }
}

impl Eq for NodeItem {}

impl fmt::Debug for NodeItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .name()
            .map(|n| n.to_string())
            .unwrap_or_else(|| "(unnamed)".to_string());
        write!(f, "{:?} {} @{}", self.kind(), name, self.key)
    }
}

fn atomic_from_scalar(scalar: &ScalarValue, data_type: DataType) -> AtomicItem {
    let base = match scalar {
        ScalarValue::Bool(b) => AtomicItem::Boolean(*b),
        ScalarValue::Int(i) => AtomicItem::Integer(*i),
        ScalarValue::Dec(d) => AtomicItem::Decimal(*d),
        ScalarValue::Text(s) => AtomicItem::Untyped(s.clone()),
    };
    match base.cast(data_type) {
        Ok(typed) => typed,
        Err(e) => {
            log::warn!("bound value does not match declared type: {e}");
            AtomicItem::Untyped(scalar.lexical())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metapath_schema::tests::{
        computer_module, computer_value, nested_group_value, recursive_group_module,
    };

    fn computer_document() -> NodeItem {
        let module = Arc::new(computer_module());
        let root = module.qualify("computer");
        let def = module.assembly(&root).unwrap();
        NodeGraph::document(module, def, computer_value(), None)
    }

    #[test]
    fn test_document_children_are_lazy() {
        let doc = computer_document();
        assert_eq!(doc.kind(), NodeKind::Document);
        assert!(!doc.has_materialized_children());

        let children = doc.model_children();
        assert_eq!(children.len(), 1);
        assert!(doc.has_materialized_children());
    }

    #[test]
    fn test_data_generation_positions() {
        let doc = computer_document();
        let computer = doc.model_children().remove(0);
        assert_eq!(computer.kind(), NodeKind::Assembly);
        assert_eq!(computer.position(), 1);

        let children = computer.model_children();
        // one vendor plus two cpu-speed fields
        assert_eq!(children.len(), 3);

        let speeds: Vec<_> = children
            .iter()
            .filter(|c| c.name().map(|n| n.local == "cpu-speed").unwrap_or(false))
            .collect();
        assert_eq!(speeds.len(), 2);
        assert_eq!(speeds[0].position(), 1);
        assert_eq!(speeds[1].position(), 2);
    }

    #[test]
    fn test_flags_in_data_generation() {
        let doc = computer_document();
        let computer = doc.model_children().remove(0);
        let flags = computer.flags();
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].kind(), NodeKind::Flag);
        assert_eq!(flags[0].string_value(), "pc-0001");
        assert_eq!(flags[0].parent().unwrap(), computer);
    }

    #[test]
    fn test_field_value_and_atomization() {
        let doc = computer_document();
        let computer = doc.model_children().remove(0);
        let vendor = computer
            .model_children()
            .into_iter()
            .find(|c| c.name().map(|n| n.local == "vendor").unwrap_or(false))
            .unwrap();
        assert_eq!(vendor.string_value(), "Example Corp");
        assert_eq!(
            vendor.atomized(),
            vec![AtomicItem::String("Example Corp".to_string())]
        );

        let country = vendor.flags().remove(0);
        assert_eq!(country.string_value(), "DE");
    }

    #[test]
    fn test_schema_generation_is_value_less() {
        let module = Arc::new(computer_module());
        let node = NodeGraph::for_module(module);
        assert_eq!(node.kind(), NodeKind::Module);

        let globals = node.model_children();
        // one assembly plus two field definitions
        assert_eq!(globals.len(), 3);
        for global in &globals {
            assert!(global.is_schema_only());
            assert_eq!(global.position(), 1);
            assert_eq!(global.string_value(), "");
        }
    }

    #[test]
    fn test_recursive_schema_terminates_with_cycle_marker() {
        let module = Arc::new(recursive_group_module());
        let root = NodeGraph::for_module(Arc::clone(&module));

        let group_def_node = root
            .model_children()
            .into_iter()
            .find(|n| n.name().map(|q| q.local == "group").unwrap_or(false))
            .unwrap();

        // child instances: member field and the recursive group
        let children = group_def_node.model_children();
        assert_eq!(children.len(), 2);

        let nested = children
            .into_iter()
            .find(|n| n.kind() == NodeKind::Assembly)
            .unwrap();
        assert!(nested.is_cycled());
        assert_eq!(nested.cycle_target().unwrap(), group_def_node);

        // the cycled node's children are the ancestor's children
        let delegated = nested.model_children();
        let direct = group_def_node.model_children();
        assert_eq!(delegated.len(), direct.len());
        assert!(delegated.iter().zip(direct.iter()).all(|(a, b)| a == b));

        // full traversal terminates
        let all = root.descendants();
        assert!(all.len() < 100);
    }

    #[test]
    fn test_data_generation_descends_into_recursive_values() {
        let module = Arc::new(recursive_group_module());
        let root_name = module.qualify("group");
        let def = module.assembly(&root_name).unwrap();
        let doc = NodeGraph::document(module, def, nested_group_value(), None);

        let outer = doc.model_children().remove(0);
        assert_eq!(outer.flags()[0].string_value(), "outer");

        let inner = outer
            .model_children()
            .into_iter()
            .find(|n| n.kind() == NodeKind::Assembly)
            .unwrap();
        assert!(!inner.is_cycled());
        assert_eq!(inner.flags()[0].string_value(), "inner");

        let leaf = inner
            .model_children()
            .into_iter()
            .find(|n| n.kind() == NodeKind::Field)
            .unwrap();
        assert_eq!(leaf.string_value(), "leaf");
    }

    #[test]
    fn test_orphan_definition_node() {
        let module = Arc::new(computer_module());
        let def = module.assembly(&module.qualify("computer")).unwrap();
        let node = NodeGraph::orphan_assembly(Arc::clone(&module), def, None);

        assert!(node.parent().is_none());
        assert!(node.is_schema_only());
        assert_eq!(
            node.static_context().default_namespace(),
            Some(metapath_schema::tests::TEST_NS)
        );
        // children still resolve through the module
        assert_eq!(node.model_children().len(), 2);
    }

    #[test]
    fn test_ancestors_and_siblings() {
        let doc = computer_document();
        let computer = doc.model_children().remove(0);
        let children = computer.model_children();
        let first_speed = children
            .iter()
            .find(|c| c.name().map(|n| n.local == "cpu-speed").unwrap_or(false))
            .unwrap();

        let ancestors = first_speed.ancestors();
        assert_eq!(ancestors.len(), 2);
        assert_eq!(ancestors[0], computer);
        assert_eq!(first_speed.root(), doc);

        assert_eq!(first_speed.following_siblings().len(), 1);
        assert_eq!(first_speed.preceding_siblings().len(), 1);
    }

    #[test]
    fn test_assembly_string_value_concatenates_content() {
        let doc = computer_document();
        let computer = doc.model_children().remove(0);
        let text = computer.string_value();
        assert!(text.contains("Example Corp"));
        assert!(text.contains("2.4"));
    }
}
