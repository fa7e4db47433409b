use super::{DependsOn, Module, ModuleType};
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Builds a boxed module instance, recording its declared dependencies.
pub(crate) type ModuleConstructor = fn(&mut DependsOn) -> Box<dyn Module>;

fn construct<M: ModuleType>(deps: &mut DependsOn) -> Box<dyn Module> {
    Box::new(M::create(deps))
}

/// Stable key naming a module type.
///
/// Equality and hashing only look at the underlying [`TypeId`]; the type name
/// is carried for diagnostics.
///
/// An id built with [`ModuleId::of`] also carries the module's constructor,
/// which is what makes it loadable. [`ModuleId::of_type`] accepts any type
/// (including `str` or `dyn Module`) and carries no constructor, so
/// [`validate_module_type`](crate::validate_module_type) rejects it.
#[derive(Clone, Copy)]
pub struct ModuleId {
    type_id: TypeId,
    type_name: &'static str,
    constructor: Option<ModuleConstructor>,
}

impl ModuleId {
    /// Id of a concrete module type.
    pub fn of<M: ModuleType>() -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            type_name: std::any::type_name::<M>(),
            constructor: Some(construct::<M>),
        }
    }

    /// Id of an arbitrary type.
    ///
    /// The id carries no constructor, so it never loads, even when `T` is a
    /// module that is already in a registry. It still compares equal to
    /// [`ModuleId::of::<T>`](ModuleId::of).
    pub fn of_type<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            constructor: None,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.type_name
    }

    /// Type name without its module path, e.g. `UserModule`.
    pub fn short_name(&self) -> &'static str {
        let base = self
            .type_name
            .split_once('<')
            .map_or(self.type_name, |(head, _)| head);
        match base.rfind("::") {
            Some(idx) => &self.type_name[idx + 2..],
            None => self.type_name,
        }
    }

    pub(crate) fn constructor(&self) -> Option<ModuleConstructor> {
        self.constructor
    }
}

impl PartialEq for ModuleId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ModuleId {}

impl Hash for ModuleId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ModuleId").field(&self.type_name).finish()
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}
