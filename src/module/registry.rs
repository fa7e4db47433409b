use super::{Module, ModuleId};
use std::collections::HashMap;
use std::fmt;

/// One loaded module: its id, its instance and the dependencies it declared.
pub struct ModuleNode {
    id: ModuleId,
    instance: Box<dyn Module>,
    dependencies: Vec<ModuleId>,
}

impl ModuleNode {
    pub fn new(id: ModuleId, instance: Box<dyn Module>, dependencies: Vec<ModuleId>) -> Self {
        Self {
            id,
            instance,
            dependencies,
        }
    }

    pub fn id(&self) -> ModuleId {
        self.id
    }

    pub fn dependencies(&self) -> &[ModuleId] {
        &self.dependencies
    }

    pub fn instance(&self) -> &dyn Module {
        self.instance.as_ref()
    }

    pub fn instance_mut(&mut self) -> &mut dyn Module {
        self.instance.as_mut()
    }
}

impl fmt::Debug for ModuleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleNode")
            .field("id", &self.id)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// In-memory store of loaded modules, kept in load order.
///
/// The order is the order nodes were added, which for nodes added by the
/// [`DependencyResolver`](super::DependencyResolver) is a valid topological
/// order. Replacing a node keeps its original position.
///
/// Not meant for concurrent writers: bootstrap runs as a single sequential task.
#[derive(Default)]
pub struct ModuleRegistry {
    nodes: Vec<ModuleNode>,
    index: HashMap<ModuleId, usize>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, replacing any node with the same id.
    ///
    /// Returns the replaced node, if any.
    pub fn add_module(&mut self, node: ModuleNode) -> Option<ModuleNode> {
        match self.index.get(&node.id) {
            Some(&position) => Some(std::mem::replace(&mut self.nodes[position], node)),
            None => {
                self.index.insert(node.id, self.nodes.len());
                self.nodes.push(node);
                None
            }
        }
    }

    pub fn get_module(&self, id: &ModuleId) -> Option<&ModuleNode> {
        self.index.get(id).map(|&position| &self.nodes[position])
    }

    pub fn get_module_mut(&mut self, id: &ModuleId) -> Option<&mut ModuleNode> {
        self.index.get(id).map(|&position| &mut self.nodes[position])
    }

    /// All nodes in load order.
    pub fn get_all_modules(&self) -> &[ModuleNode] {
        &self.nodes
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ModuleNode> {
        self.nodes.iter_mut()
    }

    pub fn clear_modules(&mut self) {
        self.nodes.clear();
        self.index.clear();
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.index.contains_key(id)
    }

    /// Load-order position of a module.
    pub fn position(&self, id: &ModuleId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.nodes.iter().map(ModuleNode::id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.nodes.iter().map(|n| n.id)).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{DependsOn, ModuleType};

    struct Tagged;

    #[async_trait::async_trait]
    impl Module for Tagged {}

    impl ModuleType for Tagged {
        fn create(_deps: &mut DependsOn) -> Self {
            Tagged
        }
    }

    struct Other;

    #[async_trait::async_trait]
    impl Module for Other {}

    impl ModuleType for Other {
        fn create(_deps: &mut DependsOn) -> Self {
            Other
        }
    }

    // The dependency list tells otherwise identical nodes apart.
    fn tagged(deps: Vec<ModuleId>) -> ModuleNode {
        ModuleNode::new(ModuleId::of::<Tagged>(), Box::new(Tagged), deps)
    }

    #[test]
    fn test_add_and_get() {
        let mut registry = ModuleRegistry::new();
        assert!(registry.add_module(tagged(Vec::new())).is_none());

        let node = registry.get_module(&ModuleId::of::<Tagged>()).unwrap();
        assert_eq!(node.id(), ModuleId::of::<Tagged>());
        assert!(registry.get_module(&ModuleId::of::<Other>()).is_none());
    }

    #[test]
    fn test_add_replaces_existing_node() {
        let mut registry = ModuleRegistry::new();
        registry.add_module(tagged(Vec::new()));
        registry.add_module(ModuleNode::new(
            ModuleId::of::<Other>(),
            Box::new(Other),
            Vec::new(),
        ));

        let replaced = registry
            .add_module(tagged(vec![ModuleId::of::<Other>()]))
            .unwrap();
        assert!(replaced.dependencies().is_empty());

        assert_eq!(registry.len(), 2);
        let all = registry.get_all_modules();
        assert_eq!(all[0].id(), ModuleId::of::<Tagged>());
        assert_eq!(all[0].dependencies(), &[ModuleId::of::<Other>()]);
        assert_eq!(all[1].id(), ModuleId::of::<Other>());
    }

    #[test]
    fn test_clear_modules() {
        let mut registry = ModuleRegistry::new();
        registry.add_module(tagged(Vec::new()));
        registry.clear_modules();

        assert!(registry.is_empty());
        assert!(!registry.contains(&ModuleId::of::<Tagged>()));
        assert_eq!(registry.position(&ModuleId::of::<Tagged>()), None);

        registry.add_module(tagged(Vec::new()));
        assert_eq!(registry.position(&ModuleId::of::<Tagged>()), Some(0));
    }
}
