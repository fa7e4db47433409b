use super::{ModuleId, ModuleRegistry};
use serde::Serialize;

/// Read-only description of one loaded module.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleInfo {
    #[serde(skip)]
    id: ModuleId,
    name: &'static str,
    dependencies: Vec<&'static str>,
}

impl ModuleInfo {
    pub fn id(&self) -> ModuleId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn dependencies(&self) -> &[&'static str] {
        &self.dependencies
    }
}

/// Snapshot of the resolved module graph in load order.
///
/// The kernel registers this in the service container after every load so
/// modules can look up metadata about each other.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ModuleGraph {
    modules: Vec<ModuleInfo>,
}

impl ModuleGraph {
    pub fn from_registry(registry: &ModuleRegistry) -> Self {
        let modules = registry
            .get_all_modules()
            .iter()
            .map(|node| ModuleInfo {
                id: node.id(),
                name: node.id().name(),
                dependencies: node.dependencies().iter().map(ModuleId::name).collect(),
            })
            .collect();
        Self { modules }
    }

    pub fn modules(&self) -> &[ModuleInfo] {
        &self.modules
    }

    pub fn get(&self, id: &ModuleId) -> Option<&ModuleInfo> {
        self.modules.iter().find(|m| m.id == *id)
    }

    pub fn position(&self, id: &ModuleId) -> Option<usize> {
        self.modules.iter().position(|m| m.id == *id)
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.position(id).is_some()
    }

    pub fn dependencies_of(&self, id: &ModuleId) -> Option<&[&'static str]> {
        self.get(id).map(ModuleInfo::dependencies)
    }

    /// Module names in load order.
    pub fn names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.name).collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
