//! The per-class entry point and its lazily built data.
//!
//! A class implements [`MetaClass`] by describing its members once, in
//! [`MetaClass::declare`]. Everything else is derived on first use and kept
//! for the rest of the process:
//!
//! - the finished [`ClassDef`], which dispatch resolves calls against;
//! - the flat [`DataArrays`], built by [`generate`];
//! - the [`MetaObject`] handed to the host.
//!
//! ## Storage
//!
//! By default the data lives in one process-wide map keyed by [`TypeId`],
//! so generic classes get one entry per instantiation. A non-generic class
//! may override [`MetaClass::class_data`] with a [`MetaCell`] in a local
//! `static` to skip the map.

use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::ffi::c_void;
use core::fmt;
use std::sync::{OnceLock, PoisonError, RwLock};

use mo_utils::TypeIdMap;

use crate::class::ClassDef;
use crate::data::{DataArrays, generate};
use crate::dispatch;
use crate::host::{CallKind, MetaObject};

// -----------------------------------------------------------------------------
// MetaClass

/// A type that exposes its members to the host.
///
/// # Examples
///
/// ```
/// use mo_meta::{ClassDef, MetaClass};
///
/// struct Switch {
///     on: bool,
/// }
///
/// impl Switch {
///     fn toggled(&self, _: bool) {}
///     fn toggle(&mut self) {
///         self.on = !self.on;
///     }
/// }
///
/// impl MetaClass for Switch {
///     fn declare() -> ClassDef<Self> {
///         ClassDef::new("Switch")
///             .signal("toggled", Switch::toggled as fn(&Switch, bool))
///             .slot("toggle", Switch::toggle as fn(&mut Switch))
///     }
/// }
///
/// let meta = Switch::static_meta_object();
/// assert_eq!(meta.class_name(), "Switch");
/// assert_eq!(meta.method_count(), 2);
/// assert_eq!(meta.index_of_signal("toggled(bool)"), 0);
/// ```
pub trait MetaClass: Sized + 'static {
    /// Describes the members of the class.
    ///
    /// Called at most once per process in the common case. The result must
    /// not depend on runtime state.
    fn declare() -> ClassDef<Self>;

    /// Returns the finished class data.
    #[inline]
    fn class_data() -> &'static ClassData<Self> {
        class_data::<Self>()
    }

    /// Returns the meta object of the class.
    #[inline]
    fn static_meta_object() -> &'static MetaObject {
        Self::class_data().meta_object()
    }

    /// Returns the meta object of the class `self` belongs to.
    #[inline]
    fn meta_object(&self) -> &'static MetaObject {
        Self::static_meta_object()
    }

    /// Instance dispatch, see [`dispatch::metacall`].
    ///
    /// # Safety
    ///
    /// `args` must match the signature selected by `call` and `id`.
    #[inline]
    unsafe fn metacall(&mut self, call: CallKind, id: i32, args: &mut [*mut c_void]) -> i32 {
        // SAFETY: upheld by the caller.
        unsafe { dispatch::metacall(self, call, id, args) }
    }
}

// -----------------------------------------------------------------------------
// ClassData

/// The finished description of class `T`, built once.
pub struct ClassData<T: 'static> {
    class: ClassDef<T>,
    meta_object: MetaObject,
}

impl<T: MetaClass> ClassData<T> {
    /// Finishes `class` and builds its tables.
    ///
    /// With the `debug` feature in debug builds the generated tables are
    /// checked against the layout rules.
    ///
    /// # Panics
    ///
    /// Panics if the checked tables are malformed, or, with
    /// `strict_properties`, if a property lacks an accessor.
    pub fn new(class: ClassDef<T>) -> Self {
        let class = class.finish();
        let arrays = generate(&class);

        #[cfg(all(debug_assertions, feature = "debug"))]
        check_layout(class.name(), &arrays);

        let parent = class.parent().map(|p| p.meta_object());
        let meta_object = MetaObject::new(parent, arrays, dispatch::erased_static_metacall::<T>);

        log::debug!(
            "{}: meta object ready ({} methods, {} properties, {} constructors)",
            class.name(),
            class.method_count(),
            class.property_count(),
            class.constructor_count(),
        );

        Self { class, meta_object }
    }
}

#[cfg(all(debug_assertions, feature = "debug"))]
#[track_caller]
fn check_layout(name: &str, arrays: &DataArrays) {
    if let Err(err) = arrays.verify() {
        panic!("{name}: malformed meta tables: {err}");
    }
}

impl<T: 'static> ClassData<T> {
    /// Returns the finished member collections.
    #[inline]
    pub fn class(&self) -> &ClassDef<T> {
        &self.class
    }

    /// Returns the meta object built from them.
    #[inline]
    pub fn meta_object(&self) -> &MetaObject {
        &self.meta_object
    }

    #[inline]
    pub fn arrays(&self) -> &DataArrays {
        self.meta_object.arrays()
    }
}

impl<T: 'static> fmt::Debug for ClassData<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassData")
            .field("class", &self.class)
            .field("meta_object", &self.meta_object)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// MetaCell

/// Static storage for the data of one non-generic class.
///
/// ```
/// use mo_meta::{ClassData, ClassDef, MetaCell, MetaClass};
///
/// struct Plain;
///
/// impl MetaClass for Plain {
///     fn declare() -> ClassDef<Self> {
///         ClassDef::new("Plain")
///     }
///
///     fn class_data() -> &'static ClassData<Self> {
///         static CELL: MetaCell<Plain> = MetaCell::new();
///         CELL.get_or_init()
///     }
/// }
///
/// assert_eq!(Plain::static_meta_object().class_name(), "Plain");
/// assert!(core::ptr::eq(Plain::static_meta_object(), Plain::static_meta_object()));
/// ```
pub struct MetaCell<T: 'static>(OnceLock<ClassData<T>>);

impl<T: 'static> MetaCell<T> {
    /// Creates an empty cell.
    #[inline]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }
}

impl<T: MetaClass> MetaCell<T> {
    /// Returns the class data, building it on first use.
    #[inline]
    pub fn get_or_init(&self) -> &ClassData<T> {
        self.0.get_or_init(|| ClassData::new(T::declare()))
    }
}

impl<T: 'static> Default for MetaCell<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

// -----------------------------------------------------------------------------
// Process-wide storage

type ErasedData = &'static (dyn Any + Send + Sync);

static CLASSES: RwLock<TypeIdMap<ErasedData>> = RwLock::new(TypeIdMap::new());

/// Returns the data of `T` from the process-wide map, building it on first use.
///
/// The data is built outside the lock, so a class may reach its base
/// class's data while being built. If two threads race, the first insert
/// wins and the other value is dropped.
pub fn class_data<T: MetaClass>() -> &'static ClassData<T> {
    let data = match get_by_type_id(TypeId::of::<T>()) {
        Some(data) => data,
        None => insert_by_type_id(TypeId::of::<T>(), || {
            Box::leak(Box::new(ClassData::new(T::declare())))
        }),
    };
    match data.downcast_ref::<ClassData<T>>() {
        Some(data) => data,
        None => unreachable!("class data stored under the wrong type id"),
    }
}

#[inline(never)]
fn get_by_type_id(type_id: TypeId) -> Option<ErasedData> {
    CLASSES
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&type_id)
        .copied()
}

#[inline(never)]
fn insert_by_type_id(type_id: TypeId, build: impl FnOnce() -> ErasedData) -> ErasedData {
    if let Some(data) = get_by_type_id(type_id) {
        return data;
    }
    let value = build();
    *CLASSES
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert(type_id, || value)
}
