//! Depth-first schema traversal with recursion avoidance.
//!
//! The walker drives a [`SchemaVisitor`] over definitions directly; no node
//! graph needs to exist. Before descending into an assembly it checks the
//! strict-ancestor stack for the same definition; a match invokes the
//! visitor's recursion callback instead of descending, which both bounds the
//! walk and lets analyses record where recursion occurs.

use std::collections::BTreeMap;
use std::sync::Arc;

use metapath_schema::{
    AssemblyDef, AssemblyInstance, Definition, DefinitionRef, FieldDef, FieldInstance, FlagDef,
    FlagInstance, ModelInstance, ModuleDef, QName,
};

/// Callbacks for each schema node kind.
///
/// Per-node results combine through [`SchemaVisitor::aggregate`]; the
/// default keeps the latest result, which suits visitors that accumulate
/// state internally and return `()`.
pub trait SchemaVisitor {
    type Result: Default;

    fn aggregate(&mut self, _previous: Self::Result, latest: Self::Result) -> Self::Result {
        latest
    }

    fn visit_module(&mut self, _module: &ModuleDef) -> Self::Result {
        Self::Result::default()
    }

    fn visit_document(&mut self, _root: &Arc<AssemblyDef>) -> Self::Result {
        Self::Result::default()
    }

    fn visit_flag(
        &mut self,
        _def: &Arc<FlagDef>,
        _instance: Option<&FlagInstance>,
    ) -> Self::Result {
        Self::Result::default()
    }

    fn visit_field(
        &mut self,
        _def: &Arc<FieldDef>,
        _instance: Option<&FieldInstance>,
    ) -> Self::Result {
        Self::Result::default()
    }

    fn visit_assembly(
        &mut self,
        _def: &Arc<AssemblyDef>,
        _instance: Option<&AssemblyInstance>,
    ) -> Self::Result {
        Self::Result::default()
    }

    /// An assembly instance gathered under a `group-as` name. Defaults to
    /// the plain assembly callback.
    fn visit_grouped_assembly(
        &mut self,
        def: &Arc<AssemblyDef>,
        instance: Option<&AssemblyInstance>,
    ) -> Self::Result {
        self.visit_assembly(def, instance)
    }

    /// Called instead of descending when an assembly definition already sits
    /// on the ancestor stack. `location` is the effective-name path from the
    /// walk root to the recursive usage site.
    fn visit_recursive_use(
        &mut self,
        _def: &Arc<AssemblyDef>,
        _instance: &AssemblyInstance,
        _location: &[QName],
    ) -> Self::Result {
        Self::Result::default()
    }
}

/// Depth-first walker over a module's definitions.
pub struct SchemaWalker<'m> {
    module: &'m ModuleDef,
    ancestors: Vec<Arc<AssemblyDef>>,
    path: Vec<QName>,
}

impl<'m> SchemaWalker<'m> {
    pub fn new(module: &'m ModuleDef) -> Self {
        Self {
            module,
            ancestors: Vec::new(),
            path: Vec::new(),
        }
    }

    fn resolve<T: Definition>(&self, reference: &DefinitionRef<T>) -> Arc<T> {
        match reference.resolve(self.module) {
            Ok(def) => def,
            Err(e) => panic!("unresolvable schema reference: {e}"),
        }
    }

    /// Walk the whole module: global flags first, then global fields and
    /// assemblies in name order.
    pub fn walk_module<V: SchemaVisitor>(&mut self, visitor: &mut V) -> V::Result {
        let mut acc = visitor.visit_module(self.module);

        let mut flags: Vec<Arc<FlagDef>> = self.module.flags().cloned().collect();
        flags.sort_by(|a, b| a.name.cmp(&b.name));
        for def in flags {
            let result = visitor.visit_flag(&def, None);
            acc = visitor.aggregate(acc, result);
        }

        let mut fields: Vec<Arc<FieldDef>> = self.module.fields().cloned().collect();
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        for def in fields {
            let result = self.walk_field(&def, None, visitor);
            acc = visitor.aggregate(acc, result);
        }

        let mut assemblies: Vec<Arc<AssemblyDef>> = self.module.assemblies().cloned().collect();
        assemblies.sort_by(|a, b| a.name.cmp(&b.name));
        for def in assemblies {
            let result = self.walk_assembly(&def, None, visitor);
            acc = visitor.aggregate(acc, result);
        }

        acc
    }

    /// Walk from a document root definition.
    pub fn walk_document<V: SchemaVisitor>(
        &mut self,
        root: &Arc<AssemblyDef>,
        visitor: &mut V,
    ) -> V::Result {
        let acc = visitor.visit_document(root);
        let walked = self.walk_assembly(root, None, visitor);
        visitor.aggregate(acc, walked)
    }

    pub fn walk_assembly<V: SchemaVisitor>(
        &mut self,
        def: &Arc<AssemblyDef>,
        instance: Option<&AssemblyInstance>,
        visitor: &mut V,
    ) -> V::Result {
        let name = match instance {
            Some(i) => i.effective_name(),
            None => def.name.clone(),
        };

        // recursion guard over strict ancestors
        if self.ancestors.iter().any(|a| Arc::ptr_eq(a, def)) {
            if let Some(instance) = instance {
                self.path.push(name);
                let result = visitor.visit_recursive_use(def, instance, &self.path);
                self.path.pop();
                return result;
            }
            return V::Result::default();
        }

        let mut acc = if instance.is_some_and(|i| i.group_as.is_some()) {
            visitor.visit_grouped_assembly(def, instance)
        } else {
            visitor.visit_assembly(def, instance)
        };

        self.ancestors.push(Arc::clone(def));
        self.path.push(name);

        for flag in &def.flags {
            let flag_def = self.resolve(&flag.def);
            let result = visitor.visit_flag(&flag_def, Some(flag));
            acc = visitor.aggregate(acc, result);
        }
        for member in &def.model {
            let result = match member {
                ModelInstance::Field(fi) => {
                    let field_def = self.resolve(&fi.def);
                    self.walk_field(&field_def, Some(fi), visitor)
                }
                ModelInstance::Assembly(ai) => {
                    let assembly_def = self.resolve(&ai.def);
                    self.walk_assembly(&assembly_def, Some(ai), visitor)
                }
            };
            acc = visitor.aggregate(acc, result);
        }

        self.path.pop();
        self.ancestors.pop();
        acc
    }

    fn walk_field<V: SchemaVisitor>(
        &mut self,
        def: &Arc<FieldDef>,
        instance: Option<&FieldInstance>,
        visitor: &mut V,
    ) -> V::Result {
        let mut acc = visitor.visit_field(def, instance);
        for flag in &def.flags {
            let flag_def = self.resolve(&flag.def);
            let result = visitor.visit_flag(&flag_def, Some(flag));
            acc = visitor.aggregate(acc, result);
        }
        acc
    }
}

/// Where a recursive assembly usage was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecursiveUse {
    pub definition: QName,
    pub location: Vec<QName>,
}

impl RecursiveUse {
    /// The location as a slash-joined path of local names.
    pub fn location_path(&self) -> String {
        self.location
            .iter()
            .map(|q| q.local.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Visitor that records, per assembly definition, every usage site where the
/// definition turned out to be its own descendant.
#[derive(Debug, Default)]
pub struct RecursionCollector {
    uses: Vec<RecursiveUse>,
}

impl RecursionCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the collector over a whole module.
    pub fn collect(module: &ModuleDef) -> Self {
        let mut collector = Self::new();
        SchemaWalker::new(module).walk_module(&mut collector);
        collector
    }

    pub fn is_recursive(&self, definition: &QName) -> bool {
        self.uses.iter().any(|u| &u.definition == definition)
    }

    pub fn uses_of(&self, definition: &QName) -> Vec<&RecursiveUse> {
        self.uses
            .iter()
            .filter(|u| &u.definition == definition)
            .collect()
    }

    pub fn all_uses(&self) -> &[RecursiveUse] {
        &self.uses
    }

    /// Recursive definitions with their recorded usage locations.
    pub fn report(&self) -> BTreeMap<QName, Vec<String>> {
        let mut report: BTreeMap<QName, Vec<String>> = BTreeMap::new();
        for use_site in &self.uses {
            report
                .entry(use_site.definition.clone())
                .or_default()
                .push(use_site.location_path());
        }
        report
    }
}

impl SchemaVisitor for RecursionCollector {
    type Result = ();

    fn visit_recursive_use(
        &mut self,
        def: &Arc<AssemblyDef>,
        _instance: &AssemblyInstance,
        location: &[QName],
    ) {
        self.uses.push(RecursiveUse {
            definition: def.name.clone(),
            location: location.to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metapath_schema::tests::{computer_module, recursive_group_module};

    /// Counts every visited node kind.
    #[derive(Default)]
    struct CountingVisitor {
        modules: usize,
        flags: usize,
        fields: usize,
        assemblies: usize,
    }

    impl SchemaVisitor for CountingVisitor {
        type Result = ();

        fn visit_module(&mut self, _module: &ModuleDef) {
            self.modules += 1;
        }

        fn visit_flag(&mut self, _def: &Arc<FlagDef>, _instance: Option<&FlagInstance>) {
            self.flags += 1;
        }

        fn visit_field(&mut self, _def: &Arc<FieldDef>, _instance: Option<&FieldInstance>) {
            self.fields += 1;
        }

        fn visit_assembly(
            &mut self,
            _def: &Arc<AssemblyDef>,
            _instance: Option<&AssemblyInstance>,
        ) {
            self.assemblies += 1;
        }
    }

    #[test]
    fn test_walk_visits_every_kind() {
        let module = computer_module();
        let mut visitor = CountingVisitor::default();
        SchemaWalker::new(&module).walk_module(&mut visitor);

        assert_eq!(visitor.modules, 1);
        assert_eq!(visitor.assemblies, 1);
        // global vendor + cpu-speed, plus their instance walks inside computer
        assert_eq!(visitor.fields, 4);
        assert!(visitor.flags >= 4);
    }

    #[test]
    fn test_recursion_guard_terminates_walk() {
        let module = recursive_group_module();
        let mut visitor = CountingVisitor::default();
        // terminates despite group-in-group
        SchemaWalker::new(&module).walk_module(&mut visitor);
        assert!(visitor.assemblies >= 1);
    }

    #[test]
    fn test_recursion_collector_reports_group() {
        let module = recursive_group_module();
        let collector = RecursionCollector::collect(&module);

        let group_name = module.qualify("group");
        assert!(collector.is_recursive(&group_name));

        let uses = collector.uses_of(&group_name);
        assert!(!uses.is_empty());
        assert_eq!(uses[0].location_path(), "group/group");

        let report = collector.report();
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_non_recursive_module_reports_nothing() {
        let module = computer_module();
        let collector = RecursionCollector::collect(&module);
        assert!(collector.all_uses().is_empty());
        assert!(!collector.is_recursive(&module.qualify("computer")));
    }

    /// Aggregation: collect all visited assembly names into the result.
    struct NameCollector;

    impl SchemaVisitor for NameCollector {
        type Result = Vec<String>;

        fn aggregate(&mut self, mut previous: Vec<String>, latest: Vec<String>) -> Vec<String> {
            previous.extend(latest);
            previous
        }

        fn visit_flag(
            &mut self,
            def: &Arc<FlagDef>,
            _instance: Option<&FlagInstance>,
        ) -> Vec<String> {
            vec![format!("flag:{}", def.name.local)]
        }

        fn visit_field(
            &mut self,
            def: &Arc<FieldDef>,
            _instance: Option<&FieldInstance>,
        ) -> Vec<String> {
            vec![format!("field:{}", def.name.local)]
        }

        fn visit_assembly(
            &mut self,
            def: &Arc<AssemblyDef>,
            _instance: Option<&AssemblyInstance>,
        ) -> Vec<String> {
            vec![format!("assembly:{}", def.name.local)]
        }
    }

    #[test]
    fn test_custom_aggregator_sees_flags_before_model() {
        let module = computer_module();
        let mut visitor = NameCollector;
        let names = SchemaWalker::new(&module).walk_module(&mut visitor);

        let computer_at = names
            .iter()
            .position(|n| n == "assembly:computer")
            .unwrap();
        let id_at = names.iter().rposition(|n| n == "flag:id").unwrap();
        let vendor_at = names.iter().rposition(|n| n == "field:vendor").unwrap();
        assert!(computer_at < id_at);
        assert!(id_at < vendor_at);
    }
}
