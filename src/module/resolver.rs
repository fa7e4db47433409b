//! Dependency resolution
//!
//! Walks dependency declarations depth-first from a root module and appends
//! modules to the registry in post-order, so every dependency lands before
//! its dependents.

use super::id::ModuleConstructor;
use super::{DependsOn, ModuleId, ModuleNode, ModuleRegistry};
use crate::error::{BootstrapError, Result};
use std::collections::HashSet;

/// Check that `id` carries a module constructor.
///
/// Only ids built with [`ModuleId::of`] pass. Ids built with
/// [`ModuleId::of_type`] are rejected whatever their type, which covers
/// non-module types, trait objects and other unsized types.
pub fn validate_module_type(id: &ModuleId) -> Result<()> {
    constructor_for(id).map(|_| ())
}

fn constructor_for(id: &ModuleId) -> Result<ModuleConstructor> {
    id.constructor()
        .ok_or_else(|| BootstrapError::InvalidModuleType {
            type_name: id.name(),
            reason: "id carries no module constructor".to_string(),
        })
}

/// Builds the load order for a root module.
///
/// Resolution is all-or-nothing: modules are staged while the graph is
/// walked and only committed to the registry once the whole graph below the
/// root resolved. Modules already in the registry are treated as loaded and
/// are not constructed again.
#[derive(Debug, Default, Clone, Copy)]
pub struct DependencyResolver;

impl DependencyResolver {
    pub fn new() -> Self {
        Self
    }

    /// Load `root` and everything it transitively depends on.
    ///
    /// Returns the number of modules newly added to the registry.
    pub fn load_modules(&self, registry: &mut ModuleRegistry, root: ModuleId) -> Result<usize> {
        validate_module_type(&root)?;

        let mut walk = Walk {
            registry,
            visiting: HashSet::new(),
            path: Vec::new(),
            done: HashSet::new(),
            staged: Vec::new(),
        };
        walk.visit(root)?;

        let staged = walk.staged;
        let loaded = staged.len();
        for node in staged {
            tracing::debug!("Loaded module: {}", node.id().short_name());
            registry.add_module(node);
        }
        Ok(loaded)
    }
}

struct Walk<'r> {
    registry: &'r ModuleRegistry,
    visiting: HashSet<ModuleId>,
    path: Vec<ModuleId>,
    done: HashSet<ModuleId>,
    staged: Vec<ModuleNode>,
}

impl Walk<'_> {
    fn visit(&mut self, id: ModuleId) -> Result<()> {
        // An id without a constructor fails even if its type is already loaded.
        let constructor = constructor_for(&id)?;
        if self.done.contains(&id) || self.registry.contains(&id) {
            return Ok(());
        }

        if self.visiting.contains(&id) {
            let start = self.path.iter().position(|m| *m == id).unwrap_or(0);
            let mut cycle: Vec<&'static str> =
                self.path[start..].iter().map(ModuleId::name).collect();
            cycle.push(id.name());
            tracing::error!("Circular dependency detected: {}", cycle.join(" -> "));
            return Err(BootstrapError::CircularDependency { cycle });
        }

        self.visiting.insert(id);
        self.path.push(id);

        let mut deps = DependsOn::new();
        let instance = constructor(&mut deps);
        for dependency in deps.ids() {
            self.visit(*dependency)?;
        }

        self.path.pop();
        self.visiting.remove(&id);
        self.done.insert(id);
        self.staged.push(ModuleNode::new(id, instance, deps.into_vec()));
        Ok(())
    }
}
