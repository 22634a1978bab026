use alloc::vec::Vec;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use mo_utils::hash::HashMap;

use crate::types::{BuiltinType, MetaType, TypeRef, USER_TYPE};

// -----------------------------------------------------------------------------
// TypeRegistry

/// Assigns stable runtime ids to custom types by name.
///
/// Ids are handed out from [`USER_TYPE`] in registration order and never
/// change. Registering a name twice returns the first id.
///
/// The registry answers the host's `RegisterPropertyMetaType` and
/// `RegisterMethodArgumentMetaType` queries; the process-wide instance is
/// reached through [`read`](Self::read) and [`write`](Self::write).
///
/// # Examples
///
/// ```
/// use mo_meta::types::{TypeRegistry, USER_TYPE};
///
/// let mut registry = TypeRegistry::empty();
/// let id = registry.register("Point");
///
/// assert_eq!(id, USER_TYPE);
/// assert_eq!(registry.register("Point"), id);
/// assert_eq!(registry.id_of("Point"), Some(id));
/// assert_eq!(registry.id_of("int"), Some(2));
/// assert_eq!(registry.name_of(id), Some("Point"));
/// ```
pub struct TypeRegistry {
    names: Vec<&'static str>,
    name_to_id: HashMap<&'static str, i32>,
}

static GLOBAL: RwLock<TypeRegistry> = RwLock::new(TypeRegistry::empty());

impl Default for TypeRegistry {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub const fn empty() -> Self {
        Self {
            names: Vec::new(),
            name_to_id: HashMap::with_hasher(mo_utils::hash::FIXED_STATE),
        }
    }

    /// Takes a read lock on the process-wide registry.
    pub fn read() -> RwLockReadGuard<'static, TypeRegistry> {
        GLOBAL.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes a write lock on the process-wide registry.
    pub fn write() -> RwLockWriteGuard<'static, TypeRegistry> {
        GLOBAL.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `name` and returns its id.
    pub fn register(&mut self, name: &'static str) -> i32 {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }
        let id = USER_TYPE + self.names.len() as i32;
        self.names.push(name);
        self.name_to_id.insert(name, id);
        log::trace!("registered meta type `{name}` as {id}");
        id
    }

    /// Registers `T` if it is a custom type.
    ///
    /// Returns the id, or `-1` for built-in types.
    pub fn register_type<T: MetaType>(&mut self) -> i32 {
        match T::TYPE {
            TypeRef::Builtin(_) => -1,
            TypeRef::Custom(name) => self.register(name),
        }
    }

    /// Returns the id for `name`: a built-in code or a registered user id.
    pub fn id_of(&self, name: &str) -> Option<i32> {
        if let Some(ty) = BuiltinType::from_name(name) {
            return Some(ty.code() as i32);
        }
        self.name_to_id.get(name).copied()
    }

    /// Returns the name registered under `id`, including built-in codes.
    pub fn name_of(&self, id: i32) -> Option<&'static str> {
        if id < USER_TYPE {
            return BuiltinType::from_code(u32::try_from(id).ok()?).map(BuiltinType::name);
        }
        self.names.get((id - USER_TYPE) as usize).copied()
    }

    /// Returns `true` if `name` is a registered custom type.
    pub fn contains(&self, name: &str) -> bool {
        self.name_to_id.contains_key(name)
    }

    /// Returns the number of registered custom types.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if no custom type is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates `(id, name)` pairs in registration order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (i32, &'static str)> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(i, &name)| (USER_TYPE + i as i32, name))
    }

    /// Registers every type declared with `#[meta_type(auto_register)]`.
    ///
    /// Returns `false` when the `auto_register` feature is disabled.
    #[cfg_attr(not(feature = "auto_register"), inline(always))]
    pub fn auto_register(&mut self) -> bool {
        #[cfg(feature = "auto_register")]
        {
            crate::__macro_exports::auto_register::__register_types(self);
            true
        }
        #[cfg(not(feature = "auto_register"))]
        {
            false
        }
    }
}

impl core::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::TypeRegistry;
    use crate::types::USER_TYPE;

    #[derive(Clone)]
    struct Local;

    crate::declare_meta_type!(Local => "Local");

    #[test]
    fn ids_are_sequential() {
        let mut registry = TypeRegistry::empty();
        assert_eq!(registry.register("A"), USER_TYPE);
        assert_eq!(registry.register("B"), USER_TYPE + 1);
        assert_eq!(registry.register("A"), USER_TYPE);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.name_of(USER_TYPE + 2), None);
    }

    #[test]
    fn builtins_are_not_registered() {
        let mut registry = TypeRegistry::empty();
        assert_eq!(registry.register_type::<i32>(), -1);
        assert_eq!(registry.register_type::<Local>(), USER_TYPE);
        assert!(!registry.contains("int"));
        assert_eq!(registry.name_of(10), Some("QString"));
        assert_eq!(registry.name_of(-3), None);
    }
}
