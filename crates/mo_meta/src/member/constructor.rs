use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;

use mo_ptr::ArgSlots;

use crate::member::method::respell;
use crate::member::{Access, Constructible, MethodFlags};
use crate::types::TypeRef;

/// A typed constructor declaration.
pub struct ConstructorDecl<T, F> {
    func: F,
    arg_names: &'static [&'static str],
    declared_types: &'static [&'static str],
    access: Access,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static, F: Constructible<T>> ConstructorDecl<T, F> {
    pub fn new(func: F) -> Self {
        Self {
            func,
            arg_names: &[],
            declared_types: &[],
            access: Access::Public,
            _marker: PhantomData,
        }
    }

    /// Names the arguments; the count must match the arity.
    pub fn arg_names<const N: usize>(mut self, names: &'static [&'static str; N]) -> Self {
        const { assert!(N == F::ARITY, "argument name count must match the arity") };
        self.arg_names = names;
        self
    }

    /// Spells custom argument types the way the declaring code does.
    pub fn declared_types<const N: usize>(mut self, types: &'static [&'static str; N]) -> Self {
        const { assert!(N == F::ARITY, "declared type count must match the arity") };
        self.declared_types = types;
        self
    }

    #[inline]
    pub fn access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }
}

impl<T: 'static, F: Constructible<T>> From<ConstructorDecl<T, F>> for ConstructorDef<T> {
    fn from(decl: ConstructorDecl<T, F>) -> Self {
        ConstructorDef {
            flags: MethodFlags::CONSTRUCTOR | decl.access.flags(),
            arg_types: respell(F::ARG_TYPES, decl.declared_types),
            arg_names: decl.arg_names,
            call: Box::new(Thunk {
                func: decl.func,
                _marker: PhantomData,
            }),
        }
    }
}

/// An erased constructor of `T`. Constructors have no name in the table.
pub struct ConstructorDef<T> {
    flags: MethodFlags,
    arg_types: Vec<TypeRef>,
    arg_names: &'static [&'static str],
    call: Box<dyn ErasedConstruct<T>>,
}

impl<T: 'static> ConstructorDef<T> {
    #[inline]
    pub fn flags(&self) -> MethodFlags {
        self.flags
    }

    #[inline]
    pub fn arg_types(&self) -> &[TypeRef] {
        &self.arg_types
    }

    #[inline]
    pub fn arg_count(&self) -> usize {
        self.arg_types.len()
    }

    #[inline]
    pub fn arg_names(&self) -> &'static [&'static str] {
        self.arg_names
    }

    /// Builds a boxed instance from `args`.
    ///
    /// # Safety
    ///
    /// Slot `i + 1` must point at a live value of argument type `i`.
    #[inline]
    pub unsafe fn create(&self, args: &ArgSlots<'_>) -> Box<T> {
        // SAFETY: upheld by the caller.
        Box::new(unsafe { self.call.construct(args) })
    }
}

impl<T> fmt::Debug for ConstructorDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDef")
            .field("flags", &self.flags)
            .field("arg_types", &self.arg_types)
            .field("arg_names", &self.arg_names)
            .finish_non_exhaustive()
    }
}

trait ErasedConstruct<T>: Send + Sync {
    unsafe fn construct(&self, args: &ArgSlots<'_>) -> T;
}

struct Thunk<T, F> {
    func: F,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static, F: Constructible<T>> ErasedConstruct<T> for Thunk<T, F> {
    #[inline]
    unsafe fn construct(&self, args: &ArgSlots<'_>) -> T {
        // SAFETY: upheld by the caller.
        unsafe { self.func.construct(args) }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConstructorDecl, ConstructorDef};
    use crate::member::{Access, MethodFlags};
    use crate::types::TypeRef;

    #[derive(Clone)]
    struct Handle;

    crate::declare_meta_type!(Handle => "Handle");

    struct Socket;

    impl Socket {
        fn open(_: Handle, _: i32) -> Self {
            Self
        }
    }

    type OpenFn = fn(Handle, i32) -> Socket;

    #[test]
    fn declared_types_rename_custom_only() {
        let def: ConstructorDef<Socket> = ConstructorDecl::new(Socket::open as OpenFn)
            .arg_names(&["handle", "port"])
            .declared_types(&["SocketHandle", "qint32"])
            .access(Access::Protected)
            .into();

        assert_eq!(def.flags(), MethodFlags::CONSTRUCTOR | MethodFlags::ACCESS_PROTECTED);
        assert_eq!(def.arg_types()[0], TypeRef::Custom("SocketHandle"));
        assert_eq!(def.arg_types()[1].name(), "int");
        assert_eq!(def.arg_names(), &["handle", "port"]);
    }

    #[test]
    fn undeclared_types_keep_their_names() {
        let def: ConstructorDef<Socket> = ConstructorDecl::new(Socket::open as OpenFn).into();
        assert_eq!(def.arg_types()[0], TypeRef::Custom("Handle"));
        assert_eq!(def.arg_count(), 2);
    }
}
