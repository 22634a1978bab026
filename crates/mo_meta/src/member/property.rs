use alloc::boxed::Box;
use core::fmt;

use mo_ptr::ArgSlots;

use crate::member::{Invokable, PropertyFlags};
use crate::types::{MetaType, TypeRef};

// -----------------------------------------------------------------------------
// Accessors

/// Where a property read comes from.
pub enum ReadAccessor<T, P> {
    /// Reads are a no-op.
    None,
    /// `getter(&this)`.
    Getter(fn(&T) -> P),
    /// A clone of the backing field.
    Member(fn(&T) -> &P),
}

/// Where a property write goes to.
pub enum WriteAccessor<T, P> {
    /// Writes are a no-op.
    None,
    /// `setter(&mut this, value)`.
    Setter(fn(&mut T, P)),
    /// Assigned into the backing field.
    Member(fn(&mut T) -> &mut P),
}

impl<T, P> Clone for ReadAccessor<T, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, P> Copy for ReadAccessor<T, P> {}

impl<T, P> Clone for WriteAccessor<T, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, P> Copy for WriteAccessor<T, P> {}

impl<T, P> ReadAccessor<T, P> {
    #[inline]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl<T, P> WriteAccessor<T, P> {
    #[inline]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

// -----------------------------------------------------------------------------
// PropertyDecl

/// A typed property declaration, before it is added to a class.
///
/// Every setter returns an updated copy. For reads, whichever of
/// [`getter`](Self::getter) and [`member`](Self::member) is applied last
/// wins; the same holds for [`setter`](Self::setter) and `member` on writes.
///
/// ```
/// use mo_meta::member::{PropertyDecl, PropertyFlags};
///
/// struct Label {
///     text: String,
/// }
///
/// impl Label {
///     fn text(&self) -> String {
///         self.text.clone()
///     }
/// }
///
/// let decl = PropertyDecl::<Label, String>::new("text")
///     .member(|l| &l.text, |l| &mut l.text)
///     .getter(Label::text);
///
/// assert!(decl.flags().contains(PropertyFlags::READABLE | PropertyFlags::WRITABLE));
/// assert!(!decl.flags().contains(PropertyFlags::NOTIFY));
/// ```
pub struct PropertyDecl<T, P> {
    name: &'static str,
    type_name: Option<&'static str>,
    read: ReadAccessor<T, P>,
    write: WriteAccessor<T, P>,
    reset: Option<fn(&mut T)>,
    notify: Option<usize>,
    flags: PropertyFlags,
}

impl<T: 'static, P: MetaType> PropertyDecl<T, P> {
    /// Declares a property with no accessors.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            type_name: None,
            read: ReadAccessor::None,
            write: WriteAccessor::None,
            reset: None,
            notify: None,
            flags: PropertyFlags::READABLE | PropertyFlags::WRITABLE,
        }
    }

    /// Spells a custom property type the way the declaring code does.
    #[inline]
    pub fn type_name(mut self, name: &'static str) -> Self {
        self.type_name = Some(name);
        self
    }

    #[inline]
    pub fn getter(mut self, getter: fn(&T) -> P) -> Self {
        self.read = ReadAccessor::Getter(getter);
        self
    }

    #[inline]
    pub fn setter(mut self, setter: fn(&mut T, P)) -> Self {
        self.write = WriteAccessor::Setter(setter);
        self
    }

    /// Backs both reads and writes with a field.
    #[inline]
    pub fn member(mut self, get: fn(&T) -> &P, get_mut: fn(&mut T) -> &mut P) -> Self {
        self.read = ReadAccessor::Member(get);
        self.write = WriteAccessor::Member(get_mut);
        self
    }

    /// Sets the reset function and the `RESETTABLE` flag.
    #[inline]
    pub fn reset(mut self, reset: fn(&mut T)) -> Self {
        self.reset = Some(reset);
        self.flags |= PropertyFlags::RESETTABLE;
        self
    }

    /// Names the change signal and sets the `NOTIFY` flag.
    ///
    /// The signal must be declared on the same class; otherwise the flag is
    /// dropped when the class is finalized.
    #[inline]
    pub fn notify<F: Invokable<T>>(mut self, signal: F) -> Self {
        self.notify = Some(signal.addr());
        self.flags |= PropertyFlags::NOTIFY;
        self
    }

    #[inline]
    pub fn constant(mut self) -> Self {
        self.flags |= PropertyFlags::CONSTANT;
        self
    }

    #[inline]
    pub fn final_(mut self) -> Self {
        self.flags |= PropertyFlags::FINAL;
        self
    }

    /// Adds extra flags. `NOTIFY` and `RESETTABLE` follow the accessors and
    /// are ignored here.
    #[inline]
    pub fn flags_with(mut self, flags: PropertyFlags) -> Self {
        self.flags |= flags - (PropertyFlags::NOTIFY | PropertyFlags::RESETTABLE);
        self
    }

    #[inline]
    pub fn flags(&self) -> PropertyFlags {
        self.flags
    }

    #[inline]
    pub fn read_accessor(&self) -> ReadAccessor<T, P> {
        self.read
    }

    #[inline]
    pub fn write_accessor(&self) -> WriteAccessor<T, P> {
        self.write
    }
}

impl<T: 'static, P: MetaType> From<PropertyDecl<T, P>> for PropertyDef<T> {
    fn from(decl: PropertyDecl<T, P>) -> Self {
        let type_ref = match (P::TYPE, decl.type_name) {
            (TypeRef::Custom(_), Some(spelled)) => TypeRef::Custom(spelled),
            (ty, _) => ty,
        };

        PropertyDef {
            name: decl.name,
            type_ref,
            flags: decl.flags,
            notify: decl.notify,
            notify_index: None,
            readable: !decl.read.is_none(),
            writable: !decl.write.is_none(),
            access: Box::new(Accessors {
                read: decl.read,
                write: decl.write,
                reset: decl.reset,
            }),
        }
    }
}

// -----------------------------------------------------------------------------
// PropertyDef

/// An erased property of `T`.
pub struct PropertyDef<T> {
    name: &'static str,
    type_ref: TypeRef,
    flags: PropertyFlags,
    notify: Option<usize>,
    notify_index: Option<u32>,
    readable: bool,
    writable: bool,
    access: Box<dyn ErasedAccess<T>>,
}

impl<T: 'static> PropertyDef<T> {
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn type_ref(&self) -> TypeRef {
        self.type_ref
    }

    #[inline]
    pub fn flags(&self) -> PropertyFlags {
        self.flags
    }

    /// Returns `true` if a getter or backing field supplies reads.
    #[inline]
    pub fn has_read_accessor(&self) -> bool {
        self.readable
    }

    /// Returns `true` if a setter or backing field accepts writes.
    #[inline]
    pub fn has_write_accessor(&self) -> bool {
        self.writable
    }

    /// Returns the address of the notify signal, if one was named.
    #[inline]
    pub fn notify_addr(&self) -> Option<usize> {
        self.notify
    }

    /// Returns the class-local index of the notify signal.
    ///
    /// Set when the class is finalized.
    #[inline]
    pub fn notify_index(&self) -> Option<u32> {
        self.notify_index
    }

    pub(crate) fn resolve_notify(&mut self, index: Option<u32>) {
        self.notify_index = index;
        if index.is_none() {
            self.notify = None;
            self.flags -= PropertyFlags::NOTIFY;
        }
    }

    /// Clones the value into slot 0, which must point at an initialized value.
    ///
    /// Without a read accessor this does nothing.
    ///
    /// # Safety
    ///
    /// A non-null slot 0 must point at an initialized value of the property type.
    #[inline]
    pub unsafe fn read(&self, this: &T, args: &mut ArgSlots<'_>) {
        // SAFETY: upheld by the caller.
        if !unsafe { self.access.read(this, args) } {
            log::warn!("property `{}` has no read accessor, read ignored", self.name);
        }
    }

    /// Clones the value out of slot 0 and stores it.
    ///
    /// Without a write accessor this does nothing.
    ///
    /// # Safety
    ///
    /// A non-null slot 0 must point at a live value of the property type.
    #[inline]
    pub unsafe fn write(&self, this: &mut T, args: &mut ArgSlots<'_>) {
        // SAFETY: upheld by the caller.
        if !unsafe { self.access.write(this, args) } {
            log::warn!("property `{}` has no write accessor, write ignored", self.name);
        }
    }

    /// Calls the reset function; returns `false` if there is none.
    #[inline]
    pub fn reset(&self, this: &mut T) -> bool {
        self.access.reset(this)
    }

    /// Registers the property type; `-1` for built-in types.
    #[inline]
    pub fn register_type(&self) -> i32 {
        self.access.register_type()
    }
}

impl<T> fmt::Debug for PropertyDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDef")
            .field("name", &self.name)
            .field("type", &self.type_ref)
            .field("flags", &self.flags)
            .field("notify_index", &self.notify_index)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Erasure

trait ErasedAccess<T>: Send + Sync {
    unsafe fn read(&self, this: &T, args: &mut ArgSlots<'_>) -> bool;

    unsafe fn write(&self, this: &mut T, args: &mut ArgSlots<'_>) -> bool;

    fn reset(&self, this: &mut T) -> bool;

    fn register_type(&self) -> i32;
}

struct Accessors<T, P> {
    read: ReadAccessor<T, P>,
    write: WriteAccessor<T, P>,
    reset: Option<fn(&mut T)>,
}

impl<T: 'static, P: MetaType> ErasedAccess<T> for Accessors<T, P> {
    unsafe fn read(&self, this: &T, args: &mut ArgSlots<'_>) -> bool {
        let value = match self.read {
            ReadAccessor::None => return false,
            ReadAccessor::Getter(getter) => getter(this),
            ReadAccessor::Member(get) => get(this).clone(),
        };
        // SAFETY: upheld by the caller.
        unsafe { args.set_return::<P>(value) };
        true
    }

    unsafe fn write(&self, this: &mut T, args: &mut ArgSlots<'_>) -> bool {
        if self.write.is_none() {
            return false;
        }
        // SAFETY: upheld by the caller.
        let Some(value) = (unsafe { args.slot(0) }).map(|ptr| unsafe { ptr.as_ref::<P>() }.clone())
        else {
            return true;
        };
        match self.write {
            WriteAccessor::None => {}
            WriteAccessor::Setter(setter) => setter(this, value),
            WriteAccessor::Member(get_mut) => *get_mut(this) = value,
        }
        true
    }

    fn reset(&self, this: &mut T) -> bool {
        match self.reset {
            Some(reset) => {
                reset(this);
                true
            }
            None => false,
        }
    }

    fn register_type(&self) -> i32 {
        P::register_meta_type()
    }
}

#[cfg(test)]
mod tests {
    use super::{PropertyDecl, PropertyDef, ReadAccessor, WriteAccessor};
    use crate::member::PropertyFlags;
    use alloc::string::String;
    use core::ffi::c_void;
    use mo_ptr::ArgSlots;

    struct Label {
        text: String,
        sets: u32,
    }

    impl Label {
        fn text(&self) -> String {
            self.text.clone()
        }

        fn set_text(&mut self, text: String) {
            self.sets += 1;
            self.text = text;
        }
    }

    fn label() -> Label {
        Label {
            text: String::from("a"),
            sets: 0,
        }
    }

    #[test]
    fn last_accessor_wins() {
        let decl = PropertyDecl::<Label, String>::new("text")
            .setter(Label::set_text)
            .member(|l| &l.text, |l| &mut l.text);
        assert!(matches!(decl.write_accessor(), WriteAccessor::Member(_)));

        let decl = decl.setter(Label::set_text).getter(Label::text);
        assert!(matches!(decl.write_accessor(), WriteAccessor::Setter(_)));
        assert!(matches!(decl.read_accessor(), ReadAccessor::Getter(_)));
    }

    #[test]
    fn write_then_read_through_slots() {
        let def: PropertyDef<Label> = PropertyDecl::new("text")
            .getter(Label::text)
            .setter(Label::set_text)
            .into();
        let mut obj = label();

        let mut value = String::from("HOLLA");
        let mut raw = [(&raw mut value).cast::<c_void>()];
        unsafe { def.write(&mut obj, &mut ArgSlots::new(&mut raw)) };
        assert_eq!(obj.text, "HOLLA");
        assert_eq!(obj.sets, 1);

        let mut out = String::new();
        let mut raw = [(&raw mut out).cast::<c_void>()];
        unsafe { def.read(&obj, &mut ArgSlots::new(&mut raw)) };
        assert_eq!(out, "HOLLA");
    }

    #[test]
    fn missing_accessors_are_no_ops() {
        let def: PropertyDef<Label> = PropertyDecl::<Label, String>::new("text").into();
        let mut obj = label();

        let mut value = String::from("ignored");
        let mut raw = [(&raw mut value).cast::<c_void>()];
        unsafe { def.write(&mut obj, &mut ArgSlots::new(&mut raw)) };
        unsafe { def.read(&obj, &mut ArgSlots::new(&mut raw)) };

        assert_eq!(obj.text, "a");
        assert_eq!(value, "ignored");
        assert!(!def.has_read_accessor());
        assert!(!def.reset(&mut obj));
        assert_eq!(
            def.flags(),
            PropertyFlags::READABLE | PropertyFlags::WRITABLE
        );
    }

    #[test]
    fn flags_follow_declaration() {
        let def: PropertyDef<Label> = PropertyDecl::<Label, String>::new("text")
            .reset(|l| l.text.clear())
            .constant()
            .final_()
            .flags_with(PropertyFlags::STORED | PropertyFlags::NOTIFY)
            .into();

        assert_eq!(
            def.flags(),
            PropertyFlags::READABLE
                | PropertyFlags::WRITABLE
                | PropertyFlags::RESETTABLE
                | PropertyFlags::CONSTANT
                | PropertyFlags::FINAL
                | PropertyFlags::STORED
        );
    }
}
