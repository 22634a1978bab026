use alloc::string::String;
use core::ffi::c_void;
use core::fmt;

use mo_ptr::PtrMut;

use crate::data::{DataArrays, MethodView, PropertyView};
use crate::host::{CallKind, NOT_FOUND};
use crate::member::MethodKind;

/// The static dispatch entry point of a class.
///
/// `this` is `None` for calls that need no instance (`CreateInstance`,
/// `IndexOfMethod`, type registration).
///
/// # Safety
///
/// - A `Some(this)` must point at an instance of the class the function
///   belongs to.
/// - `args` must match the signature selected by `call` and `id`.
pub type StaticMetacall =
    unsafe fn(this: Option<PtrMut<'_>>, call: CallKind, id: i32, args: &mut [*mut c_void]);

// -----------------------------------------------------------------------------
// MetaObject

/// Everything the host receives for one class.
///
/// Method and property indices here are absolute: they count the members of
/// every base class first, starting from the root. All lookups read the flat
/// tables only.
pub struct MetaObject {
    parent: Option<&'static MetaObject>,
    arrays: DataArrays,
    static_metacall: StaticMetacall,
}

impl MetaObject {
    pub fn new(
        parent: Option<&'static MetaObject>,
        arrays: DataArrays,
        static_metacall: StaticMetacall,
    ) -> Self {
        Self {
            parent,
            arrays,
            static_metacall,
        }
    }

    /// Returns the base class's meta object.
    #[inline]
    pub fn superclass(&self) -> Option<&'static MetaObject> {
        self.parent
    }

    #[inline]
    pub fn class_name(&self) -> &str {
        self.arrays.class_name()
    }

    #[inline]
    pub fn arrays(&self) -> &DataArrays {
        &self.arrays
    }

    #[inline]
    pub fn string_data(&self) -> &[u8] {
        self.arrays.string_data()
    }

    #[inline]
    pub fn data(&self) -> &[u32] {
        self.arrays.data()
    }

    #[inline]
    pub fn static_metacall_fn(&self) -> StaticMetacall {
        self.static_metacall
    }

    /// Calls the static dispatch function.
    ///
    /// # Safety
    ///
    /// See [`StaticMetacall`].
    #[inline]
    pub unsafe fn static_metacall(
        &self,
        this: Option<PtrMut<'_>>,
        call: CallKind,
        id: i32,
        args: &mut [*mut c_void],
    ) {
        // SAFETY: upheld by the caller.
        unsafe { (self.static_metacall)(this, call, id, args) }
    }

    /// Iterates this class and its bases, most derived first.
    pub fn ancestry(&self) -> impl Iterator<Item = &MetaObject> + '_ {
        core::iter::successors(Some(self), |m| m.parent.map(|p| p as &MetaObject))
    }

    /// Returns `true` if `other` is this class or one of its bases.
    pub fn inherits(&self, other: &MetaObject) -> bool {
        self.ancestry().any(|m| core::ptr::eq(m, other))
    }

    // ---------------------------------------------------------------
    // Methods

    /// Returns the number of methods declared by all bases.
    pub fn method_offset(&self) -> usize {
        self.parent.map_or(0, MetaObject::method_count)
    }

    /// Returns the number of methods, bases included.
    pub fn method_count(&self) -> usize {
        self.method_offset() + self.arrays.method_count()
    }

    /// Returns the method at absolute index `index`.
    pub fn method(&self, index: usize) -> Option<MethodView<'_>> {
        let offset = self.method_offset();
        match index.checked_sub(offset) {
            Some(local) => self.arrays.method(local),
            None => self.parent?.method(index),
        }
    }

    /// Returns the absolute index of the method with `signature`.
    ///
    /// The most derived match wins. Returns [`NOT_FOUND`] if there is none.
    ///
    /// ```
    /// use mo_meta::host::NOT_FOUND;
    /// use mo_meta::MetaClass;
    /// use mo_meta::class::ClassDef;
    ///
    /// struct Door;
    ///
    /// impl Door {
    ///     fn open(&mut self, _: i32, _: String) {}
    /// }
    ///
    /// impl MetaClass for Door {
    ///     fn declare() -> ClassDef<Self> {
    ///         ClassDef::new("Door").slot("open", Door::open as fn(&mut Door, i32, String))
    ///     }
    /// }
    ///
    /// let meta = Door::static_meta_object();
    /// assert_eq!(meta.index_of_method("open( int, QString )"), 0);
    /// assert_eq!(meta.index_of_method("open(int)"), NOT_FOUND);
    /// ```
    pub fn index_of_method(&self, signature: &str) -> i32 {
        self.find_method(signature, |_| true)
    }

    /// Like [`index_of_method`](Self::index_of_method), signals only.
    pub fn index_of_signal(&self, signature: &str) -> i32 {
        self.find_method(signature, |m| m.flags().kind() == Some(MethodKind::Signal))
    }

    fn find_method(&self, signature: &str, filter: impl Fn(&MethodView<'_>) -> bool) -> i32 {
        let wanted = normalize_signature(signature);
        for meta in self.ancestry() {
            let offset = meta.method_offset();
            let found = meta
                .arrays
                .methods()
                .position(|m| filter(&m) && m.signature() == wanted);
            if let Some(local) = found {
                return (offset + local) as i32;
            }
        }
        NOT_FOUND
    }

    // ---------------------------------------------------------------
    // Properties

    /// Returns the number of properties declared by all bases.
    pub fn property_offset(&self) -> usize {
        self.parent.map_or(0, MetaObject::property_count)
    }

    /// Returns the number of properties, bases included.
    pub fn property_count(&self) -> usize {
        self.property_offset() + self.arrays.property_count()
    }

    /// Returns the property at absolute index `index`.
    pub fn property(&self, index: usize) -> Option<PropertyView<'_>> {
        match index.checked_sub(self.property_offset()) {
            Some(local) => self.arrays.property(local),
            None => self.parent?.property(index),
        }
    }

    /// Returns the absolute index of the property `name`, or [`NOT_FOUND`].
    pub fn index_of_property(&self, name: &str) -> i32 {
        for meta in self.ancestry() {
            if let Some(local) = meta.arrays.properties().position(|p| p.name() == name) {
                return (meta.property_offset() + local) as i32;
            }
        }
        NOT_FOUND
    }

    // ---------------------------------------------------------------
    // Constructors

    /// Returns the number of constructors; they are never inherited.
    #[inline]
    pub fn constructor_count(&self) -> usize {
        self.arrays.constructor_count()
    }

    #[inline]
    pub fn constructor(&self, index: usize) -> Option<MethodView<'_>> {
        self.arrays.constructor(index)
    }

    /// Returns the index of the constructor with `signature`, or [`NOT_FOUND`].
    ///
    /// Constructor signatures use the class name, e.g. `Door(int)`.
    pub fn index_of_constructor(&self, signature: &str) -> i32 {
        let wanted = normalize_signature(signature);
        self.arrays
            .constructors()
            .position(|c| c.signature() == wanted)
            .map_or(NOT_FOUND, |i| i as i32)
    }
}

impl fmt::Debug for MetaObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaObject")
            .field("class_name", &self.class_name())
            .field("superclass", &self.parent.map(MetaObject::class_name))
            .field("methods", &self.arrays.method_count())
            .field("properties", &self.arrays.property_count())
            .field("constructors", &self.arrays.constructor_count())
            .finish()
    }
}

/// Removes insignificant whitespace from a signature.
///
/// Whitespace next to `(),*&<>` is dropped; other runs collapse to one space.
///
/// ```
/// use mo_meta::host::normalize_signature;
///
/// assert_eq!(normalize_signature(" move ( int , signed  char ) "), "move(int,signed char)");
/// ```
pub fn normalize_signature(signature: &str) -> String {
    const PUNCT: &[char] = &['(', ')', ',', '*', '&', '<', '>'];

    let mut out = String::with_capacity(signature.len());
    let mut pending_space = false;
    for c in signature.trim().chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !PUNCT.contains(&c) && !out.ends_with(PUNCT) && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }
    out
}
