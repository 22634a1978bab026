//! Dispatch glue between the host and the typed member collections.
//!
//! Incoming calls ([`static_metacall`], [`metacall`]) are resolved against
//! the [`ClassDef`](crate::class::ClassDef) kept in the class data, never
//! against the flat tables, so they reach the real function pointers.
//! Outgoing signal emissions go through [`activate`] (usually via
//! [`emit!`](crate::emit)).
//!
//! Misses never fail: unknown indices are ignored, `IndexOfMethod` answers
//! [`NOT_FOUND`], and [`metacall`] returns the index left over for the next
//! class in the chain.

use alloc::boxed::Box;
use core::ffi::c_void;

use mo_ptr::{ArgSlots, Ptr, PtrMut};

use crate::host::{self, CallKind, NOT_FOUND};
use crate::member::Invokable;
use crate::object::MetaClass;

/// Serves one call against the members declared by `T` itself.
///
/// `id` is class-local. See the crate documentation of the argument layout
/// for what each call kind reads and writes.
///
/// # Safety
///
/// - `args` must match the signature selected by `call` and `id`.
/// - For `CreateInstance`, slot 0 must point at a `*mut c_void`.
/// - For `IndexOfMethod`, slot 0 must point at an `i32` and slot 1 at a `usize`.
/// - For the two `Register*MetaType` calls, slot 0 must point at an `i32`.
pub unsafe fn static_metacall<T: MetaClass>(
    this: Option<&mut T>,
    call: CallKind,
    id: i32,
    args: &mut [*mut c_void],
) {
    let class = T::class_data().class();
    let index = usize::try_from(id).ok();
    let mut slots = ArgSlots::new(args);

    match call {
        CallKind::InvokeMetaMethod => {
            match (this, index.and_then(|i| class.method_at(i))) {
                // SAFETY: upheld by the caller.
                (Some(this), Some(method)) => unsafe { method.invoke(this, &mut slots) },
                (_, method) => miss::<T>(call, id, method.is_some()),
            }
        }
        CallKind::RegisterMethodArgumentMetaType => {
            let result = match index.and_then(|i| class.method_at(i)) {
                Some(method) => {
                    // SAFETY: upheld by the caller.
                    let arg = unsafe { *slots.arg::<i32>(0) };
                    usize::try_from(arg).map_or(-1, |arg| method.register_arg_type(arg))
                }
                None => -1,
            };
            // SAFETY: upheld by the caller.
            unsafe { slots.set_return::<i32>(result) };
        }
        CallKind::ReadProperty | CallKind::WriteProperty | CallKind::ResetProperty => {
            let (Some(this), Some(property)) = (this, index.and_then(|i| class.property_at(i)))
            else {
                return miss::<T>(call, id, false);
            };
            match call {
                // SAFETY: upheld by the caller.
                CallKind::ReadProperty => unsafe { property.read(this, &mut slots) },
                // SAFETY: upheld by the caller.
                CallKind::WriteProperty => unsafe { property.write(this, &mut slots) },
                _ => {
                    property.reset(this);
                }
            }
        }
        CallKind::RegisterPropertyMetaType => {
            let result = index
                .and_then(|i| class.property_at(i))
                .map_or(-1, |p| p.register_type());
            // SAFETY: upheld by the caller.
            unsafe { slots.set_return::<i32>(result) };
        }
        CallKind::CreateInstance => match index.and_then(|i| class.constructor_at(i)) {
            Some(constructor) => {
                // SAFETY: upheld by the caller.
                let instance = unsafe { constructor.create(&slots) };
                let raw = Box::into_raw(instance).cast::<c_void>();
                // SAFETY: upheld by the caller.
                unsafe { slots.set_return::<*mut c_void>(raw) };
            }
            None => miss::<T>(call, id, false),
        },
        CallKind::IndexOfMethod => {
            // SAFETY: upheld by the caller.
            let addr = unsafe { *slots.arg::<usize>(0) };
            // SAFETY: upheld by the caller.
            unsafe { slots.set_return::<i32>(index_of_method::<T>(addr)) };
        }
        CallKind::QueryPropertyDesignable
        | CallKind::QueryPropertyScriptable
        | CallKind::QueryPropertyStored
        | CallKind::QueryPropertyEditable
        | CallKind::QueryPropertyUser => {
            // answered from the property flags
        }
    }
}

#[cold]
fn miss<T: MetaClass>(call: CallKind, id: i32, had_member: bool) {
    log::trace!(
        "{}: {call:?} #{id} ignored ({})",
        T::class_data().class().name(),
        if had_member { "no instance" } else { "no such member" },
    );
}

/// Type-erased form of [`static_metacall`], stored in the [`MetaObject`](crate::host::MetaObject).
///
/// # Safety
///
/// See [`StaticMetacall`](crate::host::StaticMetacall).
pub unsafe fn erased_static_metacall<T: MetaClass>(
    this: Option<PtrMut<'_>>,
    call: CallKind,
    id: i32,
    args: &mut [*mut c_void],
) {
    // SAFETY: upheld by the caller.
    let this = this.map(|ptr| unsafe { ptr.as_mut::<T>() });
    // SAFETY: upheld by the caller.
    unsafe { static_metacall::<T>(this, call, id, args) }
}

/// Instance dispatch over the whole class chain.
///
/// Asks the base class first. A negative result means the call was served
/// and is returned as is. Otherwise the index is rebased past the base
/// class's members; if it falls inside `T`'s own range the call is served
/// here. The return value is the index minus `T`'s member count, negative
/// once served.
///
/// # Safety
///
/// See [`static_metacall`].
pub unsafe fn metacall<T: MetaClass>(
    this: &mut T,
    call: CallKind,
    id: i32,
    args: &mut [*mut c_void],
) -> i32 {
    let class = T::class_data().class();

    let mut id = id;
    if let Some(parent) = class.parent() {
        // SAFETY: upheld by the caller.
        id = unsafe { parent.metacall(this, call, id, args) };
        if id < 0 {
            return id;
        }
    }

    let count = if call.targets_method() {
        class.method_count()
    } else if call.targets_property() {
        class.property_count()
    } else {
        return id;
    } as i32;

    if id < count {
        // SAFETY: upheld by the caller.
        unsafe { static_metacall(Some(this), call, id, args) };
    }
    id - count
}

/// Returns the table index of the signal whose function address is `addr`.
///
/// Only signals are searched. Returns [`NOT_FOUND`] for anything else.
pub fn index_of_method<T: MetaClass>(addr: usize) -> i32 {
    T::class_data()
        .class()
        .signal_index(addr)
        .map_or(NOT_FOUND, |i| i as i32)
}

/// Builds an instance with constructor `index`.
///
/// # Safety
///
/// Slot `i + 1` of `args` must point at a live value of argument type `i`.
pub unsafe fn create_instance<T: MetaClass>(index: usize, args: &mut [*mut c_void]) -> Option<Box<T>> {
    let constructor = T::class_data().class().constructor_at(index)?;
    // SAFETY: upheld by the caller.
    Some(unsafe { constructor.create(&ArgSlots::new(args)) })
}

/// Delivers an emission of `signal` to the host.
///
/// The signal index is looked up by function address on every call. A
/// function that is not a declared signal, or a missing activator, logs a
/// warning and drops the emission.
pub fn activate<T: MetaClass, F: Invokable<T>>(this: &T, signal: F, args: &F::Args) {
    let data = T::class_data();
    let class = data.class();

    let Some(index) = class.signal_index(signal.addr()) else {
        log::warn!(
            "{}: emitted function at {:#x} is not a declared signal",
            class.name(),
            signal.addr(),
        );
        return;
    };

    let mut packed = F::pack(args);
    if !host::deliver(Ptr::from_ref(this), data.meta_object(), index, &mut packed) {
        log::warn!(
            "{}: no activator installed, signal #{index} dropped",
            class.name(),
        );
    }
}

/// Emits a signal: `emit!(self, Self::changed as fn(&Self, String), value)`.
///
/// The arguments are packed by reference as `[null, &arg0, ..]` and handed
/// to the host's activator synchronously. Their types must match the
/// signal's parameters.
#[macro_export]
macro_rules! emit {
    ($this:expr, $signal:expr $(, $arg:expr)* $(,)?) => {
        $crate::dispatch::activate($this, $signal, &($($arg,)*))
    };
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::sync::Arc;
    use alloc::vec::Vec;
    use core::ffi::c_void;
    use core::ptr;
    use std::sync::Mutex;

    use mo_ptr::{Ptr, PtrMut};

    use super::{create_instance, index_of_method, metacall};
    use crate::host::{Activator, CallKind, MetaObject, NOT_FOUND, with_activator};
    use crate::member::PropertyDecl;
    use crate::{ClassDef, MetaClass};

    #[derive(Clone)]
    struct Tag;

    crate::declare_meta_type!(Tag => "Tag");

    #[derive(Default)]
    struct Panel {
        value: String,
        hits: Vec<i32>,
    }

    impl Panel {
        fn with_value(value: String) -> Self {
            Self {
                value,
                hits: Vec::new(),
            }
        }

        fn started(&self) {
            crate::emit!(self, Panel::started as fn(&Panel));
        }

        fn stopped(&self, code: i32) {
            crate::emit!(self, Panel::stopped as fn(&Panel, i32), code);
        }

        fn changed(&self, value: String) {
            crate::emit!(self, Panel::changed as fn(&Panel, String), value);
        }

        fn hit(&mut self, n: i32) {
            self.hits.push(n);
        }

        fn hit_pair(&mut self, a: i32, b: i32) {
            self.hits.extend([a, b]);
        }

        fn sum(&self, a: i32, b: i32) -> i32 {
            a + b
        }

        fn label(&mut self, _: Tag) {}

        fn value(&self) -> String {
            self.value.clone()
        }

        fn set_value(&mut self, value: String) {
            self.value = value;
        }
    }

    impl MetaClass for Panel {
        fn declare() -> ClassDef<Self> {
            ClassDef::new("Panel")
                .slot("hit", Panel::hit as fn(&mut Panel, i32))
                .signal("started", Panel::started as fn(&Panel))
                .slot("hit", Panel::hit_pair as fn(&mut Panel, i32, i32))
                .signal("stopped", Panel::stopped as fn(&Panel, i32))
                .method("sum", Panel::sum as fn(&Panel, i32, i32) -> i32)
                .signal_named("changed", Panel::changed as fn(&Panel, String), &["value"])
                .method("label", Panel::label as fn(&mut Panel, Tag))
                .property(
                    PropertyDecl::<Panel, String>::new("value")
                        .getter(Panel::value)
                        .setter(Panel::set_value)
                        .notify(Panel::changed as fn(&Panel, String)),
                )
                .constructor_named(Panel::with_value as fn(String) -> Panel, &["value"])
        }
    }

    fn slot<T>(value: &mut T) -> *mut c_void {
        ptr::from_mut(value).cast()
    }

    unsafe fn call(panel: &mut Panel, call: CallKind, id: i32, args: &mut [*mut c_void]) {
        let meta = Panel::static_meta_object();
        unsafe { meta.static_metacall(Some(PtrMut::from_mut(panel)), call, id, args) };
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(usize, usize, u32, bool, String)>>);

    impl Activator for Recorder {
        fn activate(
            &self,
            sender: Ptr<'_>,
            meta_object: &'static MetaObject,
            signal_index: u32,
            args: &mut [*mut c_void],
        ) {
            let value = match args.get(1) {
                Some(&arg) if signal_index == 2 => unsafe { (*arg.cast::<String>()).clone() },
                _ => String::new(),
            };
            self.0.lock().unwrap().push((
                sender.as_void() as usize,
                ptr::from_ref(meta_object) as usize,
                signal_index,
                args[0].is_null(),
                value,
            ));
        }
    }

    #[test]
    fn property_write_then_read() {
        let mut panel = Panel::default();
        let index = Panel::static_meta_object().index_of_property("value");
        assert_eq!(index, 0);

        let mut input = String::from("HOLLA");
        unsafe { call(&mut panel, CallKind::WriteProperty, index, &mut [slot(&mut input)]) };

        let mut output = String::new();
        unsafe { call(&mut panel, CallKind::ReadProperty, index, &mut [slot(&mut output)]) };

        assert_eq!(output, "HOLLA");
        assert_eq!(panel.value, "HOLLA");
    }

    #[test]
    fn signal_emission_activates_once() {
        let recorder = Arc::new(Recorder::default());
        let panel = Panel::default();

        with_activator(recorder.clone(), || panel.changed(String::from("newValue")));

        let seen = recorder.0.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (sender, meta, index, null_return, ref value) = seen[0];
        assert_eq!(sender, ptr::from_ref(&panel) as usize);
        assert_eq!(meta, ptr::from_ref(Panel::static_meta_object()) as usize);
        assert_eq!(index, 2);
        assert!(null_return);
        assert_eq!(value, "newValue");
    }

    #[test]
    fn invoking_a_signal_emits_it() {
        let recorder = Arc::new(Recorder::default());
        let mut panel = Panel::default();
        let mut code = 7_i32;

        with_activator(recorder.clone(), || unsafe {
            call(&mut panel, CallKind::InvokeMetaMethod, 0, &mut [ptr::null_mut()]);
            call(&mut panel, CallKind::InvokeMetaMethod, 1, &mut [ptr::null_mut(), slot(&mut code)]);
        });

        let indices: Vec<_> = recorder.0.lock().unwrap().iter().map(|r| r.2).collect();
        assert_eq!(indices, [0, 1]);
    }

    #[test]
    fn index_of_method_finds_signals_only() {
        let changed = Panel::changed as fn(&Panel, String) as usize;
        let hit = Panel::hit as fn(&mut Panel, i32) as usize;

        assert_eq!(index_of_method::<Panel>(changed), 2);
        assert_eq!(index_of_method::<Panel>(hit), NOT_FOUND);

        let mut result = 0_i32;
        let mut addr = changed;
        let meta = Panel::static_meta_object();
        unsafe {
            meta.static_metacall(None, CallKind::IndexOfMethod, 0, &mut [slot(&mut result), slot(&mut addr)]);
        }
        assert_eq!(result, 2);

        addr = hit;
        unsafe {
            meta.static_metacall(None, CallKind::IndexOfMethod, 0, &mut [slot(&mut result), slot(&mut addr)]);
        }
        assert_eq!(result, NOT_FOUND);
    }

    #[test]
    fn overloads_are_separate_records() {
        let meta = Panel::static_meta_object();
        let single = meta.index_of_method("hit(int)");
        let pair = meta.index_of_method("hit(int,int)");
        assert_eq!((single, pair), (3, 4));

        let mut panel = Panel::default();
        let (mut a, mut b) = (1_i32, 2_i32);
        unsafe {
            call(&mut panel, CallKind::InvokeMetaMethod, single, &mut [ptr::null_mut(), slot(&mut a)]);
            call(&mut panel, CallKind::InvokeMetaMethod, pair, &mut [ptr::null_mut(), slot(&mut a), slot(&mut b)]);
        }
        assert_eq!(panel.hits, [1, 1, 2]);
    }

    #[test]
    fn return_values_and_missing_slots() {
        let mut panel = Panel::default();
        let sum = Panel::static_meta_object().index_of_method("sum(int,int)");
        let (mut a, mut b, mut out) = (20_i32, 22_i32, 0_i32);

        unsafe { call(&mut panel, CallKind::InvokeMetaMethod, sum, &mut [slot(&mut out), slot(&mut a), slot(&mut b)]) };
        assert_eq!(out, 42);

        // A null return slot discards the result; an unknown index is ignored.
        unsafe {
            call(&mut panel, CallKind::InvokeMetaMethod, sum, &mut [ptr::null_mut(), slot(&mut a), slot(&mut b)]);
            call(&mut panel, CallKind::InvokeMetaMethod, 99, &mut []);
            call(&mut panel, CallKind::ReadProperty, 5, &mut [slot(&mut out)]);
        }
        assert_eq!(out, 42);
    }

    #[test]
    fn register_meta_types() {
        let meta = Panel::static_meta_object();
        let label = meta.index_of_method("label(Tag)");
        let (mut result, mut arg) = (0_i32, 0_i32);

        unsafe {
            meta.static_metacall(None, CallKind::RegisterMethodArgumentMetaType, label, &mut [slot(&mut result), slot(&mut arg)]);
        }
        assert!(result >= crate::types::USER_TYPE);
        assert_eq!(crate::types::TypeRegistry::read().id_of("Tag"), Some(result));

        arg = 3;
        unsafe {
            meta.static_metacall(None, CallKind::RegisterMethodArgumentMetaType, label, &mut [slot(&mut result), slot(&mut arg)]);
        }
        assert_eq!(result, -1);

        unsafe {
            meta.static_metacall(None, CallKind::RegisterPropertyMetaType, 0, &mut [slot(&mut result)]);
        }
        assert_eq!(result, -1);
    }

    #[test]
    fn create_instances() {
        let mut value = String::from("built");
        let mut raw: *mut c_void = ptr::null_mut();
        let meta = Panel::static_meta_object();
        assert_eq!(meta.index_of_constructor("Panel(QString)"), 0);

        unsafe {
            meta.static_metacall(None, CallKind::CreateInstance, 0, &mut [slot(&mut raw), slot(&mut value)]);
        }
        assert!(!raw.is_null());
        let panel = unsafe { Box::from_raw(raw.cast::<Panel>()) };
        assert_eq!(panel.value, "built");

        let direct = unsafe { create_instance::<Panel>(0, &mut [ptr::null_mut(), slot(&mut value)]) };
        assert_eq!(direct.map(|p| p.value), Some(String::from("built")));
        assert!(unsafe { create_instance::<Panel>(1, &mut []) }.is_none());
    }

    // -------------------------------------------------------------------------
    // Inheritance

    #[derive(Default)]
    struct Base {
        level: i32,
        pokes: u32,
    }

    impl Base {
        fn poke(&mut self) {
            self.pokes += 1;
        }
    }

    impl MetaClass for Base {
        fn declare() -> ClassDef<Self> {
            ClassDef::new("Base")
                .slot("poke", Base::poke as fn(&mut Base))
                .property(PropertyDecl::<Base, i32>::new("level").member(|b| &b.level, |b| &mut b.level))
        }
    }

    #[derive(Default)]
    struct Derived {
        base: Base,
        name: String,
        pokes: u32,
    }

    impl Derived {
        fn poke(&mut self) {
            self.pokes += 1;
        }
    }

    impl MetaClass for Derived {
        fn declare() -> ClassDef<Self> {
            ClassDef::new("Derived")
                .extends(|d: &mut Derived| &mut d.base)
                .slot("poke", Derived::poke as fn(&mut Derived))
                .property(PropertyDecl::<Derived, String>::new("name").member(|d| &d.name, |d| &mut d.name))
        }
    }

    #[test]
    fn metacall_walks_the_chain() {
        let mut derived = Derived::default();
        let meta = Derived::static_meta_object();
        assert!(core::ptr::eq(meta.superclass().unwrap(), Base::static_meta_object()));
        assert_eq!(meta.method_offset(), 1);
        assert_eq!(meta.property_count(), 2);

        unsafe {
            assert!(metacall(&mut derived, CallKind::InvokeMetaMethod, 0, &mut [ptr::null_mut()]) < 0);
            assert!(derived.metacall(CallKind::InvokeMetaMethod, 1, &mut [ptr::null_mut()]) < 0);
        }
        assert_eq!((derived.base.pokes, derived.pokes), (1, 1));

        let mut level = 9_i32;
        let mut name = String::from("leaf");
        unsafe {
            assert!(metacall(&mut derived, CallKind::WriteProperty, 0, &mut [slot(&mut level)]) < 0);
            assert!(metacall(&mut derived, CallKind::WriteProperty, 1, &mut [slot(&mut name)]) < 0);
        }
        assert_eq!(derived.base.level, 9);
        assert_eq!(derived.name, "leaf");

        // Past the end: the index comes back rebased for the next class.
        let rest = unsafe { metacall(&mut derived, CallKind::ReadProperty, 5, &mut [slot(&mut level)]) };
        assert_eq!(rest, 3);
        let rest = unsafe { metacall(&mut derived, CallKind::InvokeMetaMethod, 2, &mut [ptr::null_mut()]) };
        assert_eq!(rest, 0);
    }
}
