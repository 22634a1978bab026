use alloc::string::String;
use alloc::vec::Vec;
use core::ffi::c_void;
use core::fmt;

use crate::types::{BuiltinType, TypeRegistry};

// -----------------------------------------------------------------------------
// TypeRef

/// How a type is written into the descriptor array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// A host built-in, encoded as its code.
    Builtin(BuiltinType),
    /// A custom type, encoded as `UNRESOLVED_TYPE | index_of(name)`.
    Custom(&'static str),
}

impl TypeRef {
    /// Returns the spelling used in signatures and in the string table.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Builtin(ty) => ty.name(),
            Self::Custom(name) => name,
        }
    }

    /// Returns `true` for [`TypeRef::Builtin`].
    #[inline]
    pub const fn is_builtin(self) -> bool {
        matches!(self, Self::Builtin(_))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// -----------------------------------------------------------------------------
// MetaType

/// A type that may appear in a signature or as a property value.
///
/// Values cross the argument buffer by reference and are cloned out of it,
/// hence the `Clone` bound.
///
/// Custom types are declared with [`declare_meta_type!`](crate::declare_meta_type)
/// or `#[derive(MetaType)]`:
///
/// ```
/// use mo_meta::types::{MetaType, TypeRef};
///
/// #[derive(Clone)]
/// struct Point(i32, i32);
///
/// mo_meta::declare_meta_type!(Point => "Point");
///
/// assert_eq!(<Point as MetaType>::TYPE, TypeRef::Custom("Point"));
/// assert_eq!(<i32 as MetaType>::TYPE.name(), "int");
/// ```
pub trait MetaType: Clone + 'static {
    /// The encoding of this type.
    const TYPE: TypeRef;

    /// Returns the runtime type id, registering a custom type on first use.
    ///
    /// Built-in types need no registration and return `-1`.
    fn register_meta_type() -> i32 {
        match Self::TYPE {
            TypeRef::Builtin(_) => -1,
            TypeRef::Custom(name) => TypeRegistry::write().register(name),
        }
    }
}

macro_rules! impl_builtin {
    ($($ty:ty => $builtin:ident),* $(,)?) => {
        $(
            impl MetaType for $ty {
                const TYPE: TypeRef = TypeRef::Builtin(BuiltinType::$builtin);
            }
        )*
    };
}

impl_builtin! {
    bool => Bool,
    i32 => Int,
    u32 => UInt,
    i64 => LongLong,
    u64 => ULongLong,
    f64 => Double,
    String => QString,
    Vec<String> => QStringList,
    Vec<u8> => QByteArray,
    *mut c_void => VoidStar,
    i16 => Short,
    u16 => UShort,
    u8 => UChar,
    f32 => Float,
    i8 => SChar,
    () => Void,
}

/// Declares custom types by their host spelling.
///
/// ```
/// #[derive(Clone)]
/// struct Color(u32);
/// #[derive(Clone)]
/// struct Size { w: u32, h: u32 }
///
/// mo_meta::declare_meta_type! {
///     Color => "Color",
///     Size => "QSize",
/// }
/// ```
#[macro_export]
macro_rules! declare_meta_type {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl $crate::types::MetaType for $ty {
                const TYPE: $crate::types::TypeRef = $crate::types::TypeRef::Custom(
                    $crate::strings::StaticString::new($name).as_str()
                );
            }
        )*
    };
}
