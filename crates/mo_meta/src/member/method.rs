use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;

use mo_ptr::ArgSlots;

use crate::member::{Access, Invokable, MethodFlags, MethodKind};
use crate::types::TypeRef;

/// Replaces custom argument types with their declared spellings.
pub(crate) fn respell(types: &[TypeRef], declared: &[&'static str]) -> Vec<TypeRef> {
    types
        .iter()
        .enumerate()
        .map(|(i, &ty)| match (ty, declared.get(i)) {
            (TypeRef::Custom(_), Some(&spelled)) => TypeRef::Custom(spelled),
            _ => ty,
        })
        .collect()
}

// -----------------------------------------------------------------------------
// MethodDecl

/// A typed method declaration, before it is added to a class.
///
/// Argument names and declared type spellings are checked against the
/// arity of `F` at compile time:
///
/// ```compile_fail
/// use mo_meta::member::MethodDecl;
///
/// struct Counter;
/// impl Counter {
///     fn set(&mut self, _: i32) {}
/// }
///
/// let _ = MethodDecl::slot("set", Counter::set as fn(&mut Counter, i32))
///     .arg_names(&["value", "extra"]);
/// ```
pub struct MethodDecl<T, F> {
    name: &'static str,
    kind: MethodKind,
    func: F,
    arg_names: &'static [&'static str],
    declared_types: &'static [&'static str],
    access: Access,
    extras: MethodFlags,
    _marker: PhantomData<fn(&T)>,
}

impl<T: 'static, F: Invokable<T>> MethodDecl<T, F> {
    /// Declares a member of the given kind.
    pub fn new(kind: MethodKind, name: &'static str, func: F) -> Self {
        Self {
            name,
            kind,
            func,
            arg_names: &[],
            declared_types: &[],
            access: Access::Public,
            extras: MethodFlags::empty(),
            _marker: PhantomData,
        }
    }

    /// Declares a signal.
    #[inline]
    pub fn signal(name: &'static str, func: F) -> Self {
        Self::new(MethodKind::Signal, name, func)
    }

    /// Declares a slot.
    #[inline]
    pub fn slot(name: &'static str, func: F) -> Self {
        Self::new(MethodKind::Slot, name, func)
    }

    /// Declares a plain invokable method.
    #[inline]
    pub fn method(name: &'static str, func: F) -> Self {
        Self::new(MethodKind::Method, name, func)
    }

    /// Names the arguments. Omitted names are written as the empty string.
    pub fn arg_names<const N: usize>(mut self, names: &'static [&'static str; N]) -> Self {
        const { assert!(N == F::ARITY, "argument name count must match the arity") };
        self.arg_names = names;
        self
    }

    /// Spells argument types the way the declaring code does.
    ///
    /// A spelling replaces the name of a custom type in signatures and in the
    /// string table. Built-in types keep their host code and spelling.
    pub fn declared_types<const N: usize>(mut self, types: &'static [&'static str; N]) -> Self {
        const { assert!(N == F::ARITY, "declared type count must match the arity") };
        self.declared_types = types;
        self
    }

    /// Sets the access level; the default is [`Access::Public`].
    #[inline]
    pub fn access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// Adds extra flags; bits outside [`MethodFlags::EXTRAS`] are ignored.
    #[inline]
    pub fn flags(mut self, flags: MethodFlags) -> Self {
        self.extras |= flags & MethodFlags::EXTRAS;
        self
    }
}

impl<T: 'static, F: Invokable<T>> From<MethodDecl<T, F>> for MethodDef<T> {
    fn from(decl: MethodDecl<T, F>) -> Self {
        let arg_types = respell(F::ARG_TYPES, decl.declared_types);

        MethodDef {
            name: decl.name,
            kind: decl.kind,
            flags: decl.kind.flags() | decl.access.flags() | decl.extras,
            return_type: F::RETURN_TYPE,
            arg_types,
            arg_names: decl.arg_names,
            addr: decl.func.addr(),
            call: Box::new(Thunk {
                func: decl.func,
                _marker: PhantomData,
            }),
        }
    }
}

// -----------------------------------------------------------------------------
// MethodDef

/// An erased method, signal or slot of `T`.
///
/// Keeps the real function pointer, so dispatch calls it directly instead of
/// going through the flat tables.
pub struct MethodDef<T> {
    name: &'static str,
    kind: MethodKind,
    flags: MethodFlags,
    return_type: TypeRef,
    arg_types: Vec<TypeRef>,
    arg_names: &'static [&'static str],
    addr: usize,
    call: Box<dyn ErasedCall<T>>,
}

impl<T: 'static> MethodDef<T> {
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    /// Returns the full flags word, kind and access included.
    #[inline]
    pub fn flags(&self) -> MethodFlags {
        self.flags
    }

    #[inline]
    pub fn access(&self) -> Access {
        self.flags.access()
    }

    #[inline]
    pub fn return_type(&self) -> TypeRef {
        self.return_type
    }

    #[inline]
    pub fn arg_types(&self) -> &[TypeRef] {
        &self.arg_types
    }

    #[inline]
    pub fn arg_count(&self) -> usize {
        self.arg_types.len()
    }

    /// Returns the argument names; empty if they were omitted.
    #[inline]
    pub fn arg_names(&self) -> &'static [&'static str] {
        self.arg_names
    }

    /// Returns the address of the function pointer.
    #[inline]
    pub fn addr(&self) -> usize {
        self.addr
    }

    /// Returns `true` if this member is a signal.
    #[inline]
    pub fn is_signal(&self) -> bool {
        self.kind == MethodKind::Signal
    }

    /// Calls the function, see [`Invokable::invoke`].
    ///
    /// # Safety
    ///
    /// `args` must match this member's signature.
    #[inline]
    pub unsafe fn invoke(&self, this: &mut T, args: &mut ArgSlots<'_>) {
        // SAFETY: upheld by the caller.
        unsafe { self.call.invoke(this, args) }
    }

    /// Registers the type of argument `index`; `-1` for built-in types.
    #[inline]
    pub fn register_arg_type(&self, index: usize) -> i32 {
        self.call.register_arg_type(index)
    }
}

impl<T> fmt::Debug for MethodDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("flags", &self.flags)
            .field("return_type", &self.return_type)
            .field("arg_types", &self.arg_types)
            .field("arg_names", &self.arg_names)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Erasure

trait ErasedCall<T>: Send + Sync {
    unsafe fn invoke(&self, this: &mut T, args: &mut ArgSlots<'_>);

    fn register_arg_type(&self, index: usize) -> i32;
}

struct Thunk<T, F> {
    func: F,
    _marker: PhantomData<fn(&T)>,
}

impl<T: 'static, F: Invokable<T>> ErasedCall<T> for Thunk<T, F> {
    #[inline]
    unsafe fn invoke(&self, this: &mut T, args: &mut ArgSlots<'_>) {
        // SAFETY: upheld by the caller.
        unsafe { self.func.invoke(this, args) }
    }

    #[inline]
    fn register_arg_type(&self, index: usize) -> i32 {
        F::register_arg_type(index)
    }
}

#[cfg(test)]
mod tests {
    use super::{MethodDecl, MethodDef};
    use crate::member::{Access, MethodFlags, MethodKind};
    use crate::types::TypeRef;

    #[derive(Clone)]
    struct Handle;

    crate::declare_meta_type!(Handle => "Handle");

    struct Widget;

    impl Widget {
        fn attach(&mut self, _: Handle, _: i32) {}
    }

    type AttachFn = fn(&mut Widget, Handle, i32);

    #[test]
    fn erasure_keeps_signature() {
        let def: MethodDef<Widget> = MethodDecl::slot("attach", Widget::attach as AttachFn)
            .arg_names(&["handle", "slot"])
            .access(Access::Protected)
            .flags(MethodFlags::CLONED | MethodFlags::SIGNAL)
            .into();

        assert_eq!(def.kind(), MethodKind::Slot);
        assert_eq!(def.access(), Access::Protected);
        assert_eq!(
            def.flags(),
            MethodFlags::SLOT | MethodFlags::ACCESS_PROTECTED | MethodFlags::CLONED
        );
        assert_eq!(def.arg_count(), 2);
        assert_eq!(def.arg_names(), &["handle", "slot"]);
        assert_eq!(def.addr(), Widget::attach as AttachFn as usize);
    }

    #[test]
    fn declared_types_rename_custom_only() {
        let def: MethodDef<Widget> = MethodDecl::method("attach", Widget::attach as AttachFn)
            .declared_types(&["WidgetHandle", "qint32"])
            .into();

        assert_eq!(def.arg_types()[0], TypeRef::Custom("WidgetHandle"));
        assert_eq!(def.arg_types()[1].name(), "int");
        assert!(def.arg_names().is_empty());
    }
}
