//! A name index over meta objects.

use alloc::vec::Vec;
use core::any::TypeId;
use core::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use mo_utils::TypeIdMap;
use mo_utils::hash::{FIXED_STATE, HashMap, HashSet};

use crate::host::MetaObject;
use crate::object::MetaClass;

// -----------------------------------------------------------------------------
// ClassRegistry

/// Maps class names to their meta objects.
///
/// Registering a class also indexes every base class reachable through
/// [`MetaObject::superclass`]. Distinct meta objects sharing a name (for
/// example two instantiations of a generic class) make that name
/// ambiguous: [`get`](Self::get) then answers `None`, and the classes stay
/// reachable by type through [`get_type`](Self::get_type).
///
/// # Examples
///
/// ```
/// use mo_meta::{ClassDef, ClassRegistry, MetaClass};
///
/// struct Base;
/// struct Derived {
///     base: Base,
/// }
///
/// impl MetaClass for Base {
///     fn declare() -> ClassDef<Self> {
///         ClassDef::new("Base")
///     }
/// }
///
/// impl MetaClass for Derived {
///     fn declare() -> ClassDef<Self> {
///         ClassDef::new("Derived").extends(|d: &mut Derived| &mut d.base)
///     }
/// }
///
/// let mut registry = ClassRegistry::empty();
/// registry.register::<Derived>();
///
/// assert_eq!(registry.len(), 1);
/// assert!(registry.get("Derived").is_some());
/// assert!(core::ptr::eq(registry.get("Base").unwrap(), Base::static_meta_object()));
/// ```
pub struct ClassRegistry {
    by_type: TypeIdMap<&'static MetaObject>,
    by_name: HashMap<&'static str, &'static MetaObject>,
    ambiguous: HashSet<&'static str>,
}

static GLOBAL: RwLock<ClassRegistry> = RwLock::new(ClassRegistry::empty());

impl Default for ClassRegistry {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl ClassRegistry {
    /// Creates an empty registry.
    pub const fn empty() -> Self {
        Self {
            by_type: TypeIdMap::new(),
            by_name: HashMap::with_hasher(FIXED_STATE),
            ambiguous: HashSet::with_hasher(FIXED_STATE),
        }
    }

    /// Takes a read lock on the process-wide registry.
    pub fn read() -> RwLockReadGuard<'static, ClassRegistry> {
        GLOBAL.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes a write lock on the process-wide registry.
    pub fn write() -> RwLockWriteGuard<'static, ClassRegistry> {
        GLOBAL.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `T` and its base classes, returning `T`'s meta object.
    ///
    /// Repeated calls are cheap.
    pub fn register<T: MetaClass>(&mut self) -> &'static MetaObject {
        let meta = T::static_meta_object();
        if self.by_type.try_insert_type::<T>(|| meta) {
            for class in meta.ancestry() {
                self.index_name(class);
            }
            log::trace!("registered class `{}`", meta.class_name());
        }
        meta
    }

    fn index_name(&mut self, meta: &'static MetaObject) {
        let name = meta.class_name();
        match self.by_name.get(name) {
            None => {
                self.by_name.insert(name, meta);
            }
            Some(&known) if core::ptr::eq(known, meta) => {}
            Some(_) => {
                if self.ambiguous.insert(name) {
                    log::debug!("class name `{name}` is shared by distinct classes");
                }
            }
        }
    }

    /// Returns the class registered under `name`, unless the name is ambiguous.
    pub fn get(&self, name: &str) -> Option<&'static MetaObject> {
        if self.ambiguous.contains(name) {
            return None;
        }
        self.by_name.get(name).copied()
    }

    /// Returns the meta object registered for `T`.
    #[inline]
    pub fn get_type<T: MetaClass>(&self) -> Option<&'static MetaObject> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Returns `true` if `name` names more than one class.
    #[inline]
    pub fn is_ambiguous(&self, name: &str) -> bool {
        self.ambiguous.contains(name)
    }

    /// Returns the number of classes registered by type.
    #[inline]
    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    /// Iterates the meta objects registered by type, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &'static MetaObject> + '_ {
        self.by_type.values().copied()
    }

    /// Registers every class declared with `impl_auto_register!`.
    ///
    /// Returns `false` when the `auto_register` feature is disabled.
    #[cfg_attr(not(feature = "auto_register"), inline(always))]
    pub fn auto_register(&mut self) -> bool {
        #[cfg(feature = "auto_register")]
        {
            crate::__macro_exports::auto_register::__register_classes(self);
            true
        }
        #[cfg(not(feature = "auto_register"))]
        {
            false
        }
    }
}

impl fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.iter().map(MetaObject::class_name).collect();
        names.sort_unstable();
        f.debug_struct("ClassRegistry")
            .field("classes", &names)
            .field("ambiguous", &self.ambiguous.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::ClassRegistry;
    use crate::{ClassDef, MetaClass};

    struct Cell<T>(T);

    impl<T: 'static> MetaClass for Cell<T> {
        fn declare() -> ClassDef<Self> {
            ClassDef::new("Cell")
        }
    }

    #[test]
    fn shared_names_are_ambiguous() {
        let _ = (Cell(0_u8).0, Cell(0_i8).0);
        let mut registry = ClassRegistry::empty();
        registry.register::<Cell<u8>>();
        assert!(registry.get("Cell").is_some());

        registry.register::<Cell<i8>>();
        assert!(registry.is_ambiguous("Cell"));
        assert!(registry.get("Cell").is_none());
        assert!(registry.get_type::<Cell<i8>>().is_some());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn registering_twice_is_a_no_op() {
        let mut registry = ClassRegistry::empty();
        let a = registry.register::<Cell<u32>>();
        let b = registry.register::<Cell<u32>>();
        assert!(core::ptr::eq(a, b));
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_ambiguous("Cell"));
    }
}
