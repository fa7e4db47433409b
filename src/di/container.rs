use crate::error::{BootstrapError, Result};
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;

type Instance = Arc<dyn Any + Send + Sync>;

/// Casts a concrete instance to the `Arc<dyn Trait>` it was bound to, boxed
/// again as `Arc<dyn Any>`. Returns `None` if the instance has the wrong type.
type CasterFn = Arc<dyn Fn(Instance) -> Option<Instance> + Send + Sync>;

/// Service container shared by all lifecycle hooks.
///
/// Modules register services into it while configuring and resolve them
/// while initializing. Registering a type twice replaces the earlier
/// instance.
#[derive(Clone, Default)]
pub struct ServiceContainer {
    services: DashMap<TypeId, Instance>,
    trait_mappings: DashMap<TypeId, TypeId>,
    casters: DashMap<TypeId, CasterFn>,
}

impl ServiceContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: 'static + Send + Sync>(&mut self, instance: T) -> &mut Self {
        self.register_arc(Arc::new(instance))
    }

    /// Register an instance that is already shared.
    pub fn register_arc<T: 'static + Send + Sync>(&mut self, instance: Arc<T>) -> &mut Self {
        self.services.insert(TypeId::of::<T>(), instance);
        self
    }

    /// Register `instance` only if no `T` is registered yet.
    ///
    /// Returns `true` if the instance was added.
    pub fn try_register<T: 'static + Send + Sync>(&mut self, instance: T) -> bool {
        if self.services.contains_key(&TypeId::of::<T>()) {
            return false;
        }
        self.register(instance);
        true
    }

    /// Map `Trait` to the registered `Impl` so it resolves as `Arc<dyn Trait>`.
    pub fn register_trait<Trait, Impl, F>(&mut self, caster_fn: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        Impl: 'static + Send + Sync,
        F: Fn(Arc<Impl>) -> Arc<Trait> + 'static + Send + Sync,
    {
        let trait_id = TypeId::of::<Trait>();
        self.trait_mappings.insert(trait_id, TypeId::of::<Impl>());

        let caster: CasterFn = Arc::new(move |instance: Instance| {
            let concrete = instance.downcast::<Impl>().ok()?;
            let trait_obj: Arc<Trait> = caster_fn(concrete);
            Some(Arc::new(trait_obj) as Instance)
        });
        self.casters.insert(trait_id, caster);
        self
    }

    pub fn resolve<T: 'static + Send + Sync>(&self) -> Result<Arc<T>> {
        let entry = self.services.get(&TypeId::of::<T>()).ok_or_else(|| {
            BootstrapError::DependencyNotFound {
                type_name: std::any::type_name::<T>().to_string(),
            }
        })?;
        entry
            .value()
            .clone()
            .downcast::<T>()
            .map_err(|_| BootstrapError::DowncastFailed {
                type_name: std::any::type_name::<T>().to_string(),
            })
    }

    pub fn resolve_trait<T: ?Sized + 'static + Send + Sync>(&self) -> Result<Arc<T>> {
        let trait_id = TypeId::of::<T>();
        let not_found = |detail: &str| BootstrapError::DependencyNotFound {
            type_name: format!("{} ({})", std::any::type_name::<T>(), detail),
        };

        let caster = self
            .casters
            .get(&trait_id)
            .ok_or_else(|| not_found("no binding"))?;
        let impl_id = *self
            .trait_mappings
            .get(&trait_id)
            .ok_or_else(|| not_found("no implementation mapping"))?;
        let instance = self
            .services
            .get(&impl_id)
            .ok_or_else(|| not_found("implementation not registered"))?
            .value()
            .clone();

        let downcast_failed = || BootstrapError::DowncastFailed {
            type_name: std::any::type_name::<T>().to_string(),
        };
        // The caster hands back an `Arc<dyn Any>` wrapping the `Arc<T>`.
        let wrapper = (caster.value())(instance)
            .ok_or_else(downcast_failed)?
            .downcast::<Arc<T>>()
            .map_err(|_| downcast_failed())?;
        Ok(wrapper.as_ref().clone())
    }

    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        let type_id = TypeId::of::<T>();
        self.services.contains_key(&type_id) || self.trait_mappings.contains_key(&type_id)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
