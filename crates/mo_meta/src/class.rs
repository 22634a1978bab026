//! The per-class member accumulator.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::ffi::c_void;
use core::fmt;

use crate::host::{CallKind, MetaObject};
use crate::member::{
    Constructible, ConstructorDecl, ConstructorDef, Invokable, MethodDecl, MethodDef, MethodKind,
    PropertyDecl, PropertyDef,
};
use crate::object::MetaClass;
use crate::types::MetaType;

// -----------------------------------------------------------------------------
// Parent

type ParentCall<T> = dyn Fn(&mut T, CallKind, i32, &mut [*mut c_void]) -> i32 + Send + Sync;

/// The base class of a [`ClassDef`], as recorded by [`ClassDef::extends`].
pub struct Parent<T> {
    meta_object: fn() -> &'static MetaObject,
    metacall: Box<ParentCall<T>>,
}

impl<T: 'static> Parent<T> {
    /// Returns the parent's meta object.
    #[inline]
    pub fn meta_object(&self) -> &'static MetaObject {
        (self.meta_object)()
    }

    /// Runs the parent's instance dispatch on the embedded parent of `this`.
    ///
    /// # Safety
    ///
    /// See [`dispatch::metacall`](crate::dispatch::metacall).
    #[inline]
    pub unsafe fn metacall(
        &self,
        this: &mut T,
        call: CallKind,
        id: i32,
        args: &mut [*mut c_void],
    ) -> i32 {
        (self.metacall)(this, call, id, args)
    }
}

// -----------------------------------------------------------------------------
// ClassDef

/// The ordered member collections of class `T`.
///
/// Every builder method consumes the value and returns the extended one;
/// nothing already added is reordered or changed. Signals, slots and plain
/// methods are kept apart: the method table lists all signals first, then
/// slots, then methods, each in declaration order.
///
/// # Examples
///
/// ```
/// use mo_meta::class::ClassDef;
/// use mo_meta::member::PropertyDecl;
///
/// #[derive(Default)]
/// struct Counter {
///     value: i32,
/// }
///
/// impl Counter {
///     fn value_changed(&self, _: i32) {}
///     fn set_value(&mut self, value: i32) {
///         self.value = value;
///     }
///     fn reset(&mut self) {}
/// }
///
/// let class = ClassDef::<Counter>::new("Counter")
///     .slot("setValue", Counter::set_value as fn(&mut Counter, i32))
///     .method("reset", Counter::reset as fn(&mut Counter))
///     .signal_named("valueChanged", Counter::value_changed as fn(&Counter, i32), &["value"])
///     .property(PropertyDecl::<Counter, i32>::new("value").member(|c| &c.value, |c| &mut c.value));
///
/// let names: Vec<_> = class.methods().map(|m| m.name()).collect();
/// assert_eq!(names, ["valueChanged", "setValue", "reset"]);
/// assert_eq!(class.signal_count(), 1);
/// ```
pub struct ClassDef<T> {
    name: &'static str,
    signals: Vec<MethodDef<T>>,
    slots: Vec<MethodDef<T>>,
    methods: Vec<MethodDef<T>>,
    properties: Vec<PropertyDef<T>>,
    constructors: Vec<ConstructorDef<T>>,
    parent: Option<Parent<T>>,
}

impl<T: 'static> ClassDef<T> {
    /// Starts an empty class.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            signals: Vec::new(),
            slots: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            constructors: Vec::new(),
            parent: None,
        }
    }

    // ---------------------------------------------------------------
    // Builder

    /// Appends a method-like member to the collection of its kind.
    pub fn declare<F: Invokable<T>>(mut self, decl: MethodDecl<T, F>) -> Self {
        let def = MethodDef::from(decl);
        match def.kind() {
            MethodKind::Signal => self.signals.push(def),
            MethodKind::Slot => self.slots.push(def),
            MethodKind::Method => self.methods.push(def),
        }
        self
    }

    #[inline]
    pub fn signal<F: Invokable<T>>(self, name: &'static str, func: F) -> Self {
        self.declare(MethodDecl::signal(name, func))
    }

    #[inline]
    pub fn signal_named<F: Invokable<T>, const N: usize>(
        self,
        name: &'static str,
        func: F,
        arg_names: &'static [&'static str; N],
    ) -> Self {
        self.declare(MethodDecl::signal(name, func).arg_names(arg_names))
    }

    #[inline]
    pub fn slot<F: Invokable<T>>(self, name: &'static str, func: F) -> Self {
        self.declare(MethodDecl::slot(name, func))
    }

    #[inline]
    pub fn slot_named<F: Invokable<T>, const N: usize>(
        self,
        name: &'static str,
        func: F,
        arg_names: &'static [&'static str; N],
    ) -> Self {
        self.declare(MethodDecl::slot(name, func).arg_names(arg_names))
    }

    #[inline]
    pub fn method<F: Invokable<T>>(self, name: &'static str, func: F) -> Self {
        self.declare(MethodDecl::method(name, func))
    }

    #[inline]
    pub fn method_named<F: Invokable<T>, const N: usize>(
        self,
        name: &'static str,
        func: F,
        arg_names: &'static [&'static str; N],
    ) -> Self {
        self.declare(MethodDecl::method(name, func).arg_names(arg_names))
    }

    /// Appends a property.
    pub fn property<P: MetaType>(mut self, decl: PropertyDecl<T, P>) -> Self {
        self.properties.push(decl.into());
        self
    }

    /// Appends a constructor declaration.
    pub fn declare_constructor<F: Constructible<T>>(mut self, decl: ConstructorDecl<T, F>) -> Self {
        self.constructors.push(decl.into());
        self
    }

    #[inline]
    pub fn constructor<F: Constructible<T>>(self, func: F) -> Self {
        self.declare_constructor(ConstructorDecl::new(func))
    }

    #[inline]
    pub fn constructor_named<F: Constructible<T>, const N: usize>(
        self,
        func: F,
        arg_names: &'static [&'static str; N],
    ) -> Self {
        self.declare_constructor(ConstructorDecl::new(func).arg_names(arg_names))
    }

    /// Chains `B` as the base class.
    ///
    /// `project` reaches the embedded `B` inside a `T`; instance dispatch
    /// runs `B`'s members on it before looking at `T`'s own.
    pub fn extends<B: MetaClass>(mut self, project: fn(&mut T) -> &mut B) -> Self {
        self.parent = Some(Parent {
            meta_object: B::static_meta_object,
            // SAFETY: only reachable through `Parent::metacall`, which is unsafe.
            metacall: Box::new(move |this, call, id, args| unsafe {
                crate::dispatch::metacall::<B>(project(this), call, id, args)
            }),
        });
        self
    }

    /// Resolves notify signals and checks accessors.
    ///
    /// # Panics
    ///
    /// With `strict_properties`, panics if a property lacks a read or a
    /// write accessor.
    pub(crate) fn finish(mut self) -> Self {
        for i in 0..self.properties.len() {
            let notify = self.properties[i].notify_addr();
            if let Some(addr) = notify {
                let index = self.signal_index(addr);
                if index.is_none() {
                    log::warn!(
                        "{}::{}: notify function is not a declared signal, NOTIFY dropped",
                        self.name,
                        self.properties[i].name(),
                    );
                }
                self.properties[i].resolve_notify(index);
            }

            let property = &self.properties[i];
            if !property.has_read_accessor() || !property.has_write_accessor() {
                #[cfg(feature = "strict_properties")]
                panic!(
                    "{}::{}: property needs both a read and a write accessor",
                    self.name,
                    property.name(),
                );
                #[cfg(not(feature = "strict_properties"))]
                log::debug!(
                    "{}::{}: missing accessors degrade to no-ops",
                    self.name,
                    property.name(),
                );
            }
        }
        self
    }

    // ---------------------------------------------------------------
    // Accessors

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Iterates methods in table order: signals, slots, methods.
    pub fn methods(&self) -> impl Iterator<Item = &MethodDef<T>> + '_ {
        self.signals
            .iter()
            .chain(self.slots.iter())
            .chain(self.methods.iter())
    }

    /// Returns the method at table index `index`.
    pub fn method_at(&self, index: usize) -> Option<&MethodDef<T>> {
        let mut index = index;
        for group in [&self.signals, &self.slots, &self.methods] {
            if index < group.len() {
                return Some(&group[index]);
            }
            index -= group.len();
        }
        None
    }

    #[inline]
    pub fn method_count(&self) -> usize {
        self.signals.len() + self.slots.len() + self.methods.len()
    }

    #[inline]
    pub fn signals(&self) -> &[MethodDef<T>] {
        &self.signals
    }

    #[inline]
    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    /// Returns the position of the signal at `addr` among the signals.
    ///
    /// Recomputed from declaration order on every call.
    pub fn signal_index(&self, addr: usize) -> Option<u32> {
        self.signals
            .iter()
            .position(|s| s.addr() == addr)
            .map(|i| i as u32)
    }

    #[inline]
    pub fn properties(&self) -> &[PropertyDef<T>] {
        &self.properties
    }

    #[inline]
    pub fn property_at(&self, index: usize) -> Option<&PropertyDef<T>> {
        self.properties.get(index)
    }

    #[inline]
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    #[inline]
    pub fn constructors(&self) -> &[ConstructorDef<T>] {
        &self.constructors
    }

    #[inline]
    pub fn constructor_at(&self, index: usize) -> Option<&ConstructorDef<T>> {
        self.constructors.get(index)
    }

    #[inline]
    pub fn constructor_count(&self) -> usize {
        self.constructors.len()
    }

    #[inline]
    pub fn parent(&self) -> Option<&Parent<T>> {
        self.parent.as_ref()
    }
}

impl<T> fmt::Debug for ClassDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDef")
            .field("name", &self.name)
            .field("signals", &self.signals)
            .field("slots", &self.slots)
            .field("methods", &self.methods)
            .field("properties", &self.properties)
            .field("constructors", &self.constructors)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::ClassDef;
    use crate::member::{MethodKind, PropertyDecl, PropertyFlags};

    struct Beacon {
        level: i32,
    }

    impl Beacon {
        fn fired(&self) {}
        fn moved(&self, _: i32, _: i32) {}
        fn poke(&mut self) {}
        fn level(&self) -> i32 {
            self.level
        }
        fn unrelated(&self) {}
    }

    fn beacon() -> ClassDef<Beacon> {
        ClassDef::new("Beacon")
            .method("level", Beacon::level as fn(&Beacon) -> i32)
            .signal("fired", Beacon::fired as fn(&Beacon))
            .slot("poke", Beacon::poke as fn(&mut Beacon))
            .signal("moved", Beacon::moved as fn(&Beacon, i32, i32))
    }

    #[test]
    fn table_order_groups_by_kind() {
        let class = beacon();
        let kinds: Vec<_> = class.methods().map(|m| m.kind()).collect();
        assert_eq!(
            kinds,
            [MethodKind::Signal, MethodKind::Signal, MethodKind::Slot, MethodKind::Method]
        );
        assert_eq!(class.method_at(1).map(|m| m.name()), Some("moved"));
        assert_eq!(class.method_at(3).map(|m| m.name()), Some("level"));
        assert!(class.method_at(4).is_none());
    }

    #[test]
    fn signal_index_is_declaration_position() {
        let class = beacon();
        let moved = Beacon::moved as fn(&Beacon, i32, i32) as usize;
        let poke = Beacon::poke as fn(&mut Beacon) as usize;
        assert_eq!(class.signal_index(moved), Some(1));
        assert_eq!(class.signal_index(poke), None);
    }

    #[test]
    #[cfg(not(feature = "strict_properties"))]
    fn unknown_notify_is_dropped() {
        let class = beacon()
            .property(
                PropertyDecl::<Beacon, i32>::new("level")
                    .getter(Beacon::level)
                    .notify(Beacon::unrelated as fn(&Beacon)),
            )
            .property(
                PropertyDecl::<Beacon, i32>::new("level2")
                    .member(|p| &p.level, |p| &mut p.level)
                    .notify(Beacon::moved as fn(&Beacon, i32, i32)),
            )
            .finish();

        let first = &class.properties()[0];
        assert!(!first.flags().contains(PropertyFlags::NOTIFY));
        assert_eq!(first.notify_index(), None);

        let second = &class.properties()[1];
        assert!(second.flags().contains(PropertyFlags::NOTIFY));
        assert_eq!(second.notify_index(), Some(1));
    }

    #[test]
    #[cfg(not(feature = "strict_properties"))]
    fn read_only_property_degrades_to_no_op_writes() {
        use core::ffi::c_void;
        use mo_ptr::ArgSlots;

        let class = beacon()
            .property(PropertyDecl::<Beacon, i32>::new("level").getter(Beacon::level))
            .finish();
        assert_eq!(class.property_count(), 1);

        let level = &class.properties()[0];
        assert!(level.has_read_accessor());
        assert!(!level.has_write_accessor());

        let mut obj = Beacon { level: 3 };
        let mut value = 9_i32;
        let mut raw = [(&raw mut value).cast::<c_void>()];
        unsafe { level.write(&mut obj, &mut ArgSlots::new(&mut raw)) };
        assert_eq!(obj.level, 3);

        let mut out = 0_i32;
        let mut raw = [(&raw mut out).cast::<c_void>()];
        unsafe { level.read(&obj, &mut ArgSlots::new(&mut raw)) };
        assert_eq!(out, 3);
    }

    #[test]
    #[cfg(feature = "strict_properties")]
    #[should_panic(expected = "needs both a read and a write accessor")]
    fn strict_properties_reject_read_only() {
        let _ = beacon()
            .property(PropertyDecl::<Beacon, i32>::new("level").getter(Beacon::level))
            .finish();
    }
}
