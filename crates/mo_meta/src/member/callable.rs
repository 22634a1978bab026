use alloc::vec::Vec;
use core::ffi::c_void;

use mo_ptr::ArgSlots;

use crate::types::{MetaType, TypeRef};

// -----------------------------------------------------------------------------
// Invokable

/// A function pointer that can be stored as a method of `T`.
///
/// Implemented for `fn(&T, A0, ..) -> R` and `fn(&mut T, A0, ..) -> R` with
/// up to eight arguments, where every `Ai` and `R` implement [`MetaType`].
///
/// Overloads are told apart by casting to the exact pointer type:
///
/// ```
/// use mo_meta::member::Invokable;
///
/// struct Counter(i32);
///
/// impl Counter {
///     fn add(&mut self, n: i32) -> i32 {
///         self.0 += n;
///         self.0
///     }
/// }
///
/// let f = Counter::add as fn(&mut Counter, i32) -> i32;
/// assert_eq!(<fn(&mut Counter, i32) -> i32 as Invokable<Counter>>::ARITY, 1);
/// assert_eq!(f.addr(), f as usize);
/// ```
pub trait Invokable<T: 'static>: Copy + Send + Sync + 'static {
    /// The arguments as a tuple, used to pack signal emissions.
    type Args: 'static;

    /// The return type.
    type Output: MetaType;

    /// The number of arguments, excluding the receiver.
    const ARITY: usize;

    /// The encoding of [`Output`](Self::Output).
    const RETURN_TYPE: TypeRef;

    /// The encoding of every argument, in order.
    const ARG_TYPES: &'static [TypeRef];

    /// Returns the address used for identity comparison.
    fn addr(self) -> usize;

    /// Calls the function with arguments read from `args`.
    ///
    /// Arguments are cloned out of slots `1..=ARITY`; the return value is
    /// assigned into slot 0 unless it is null.
    ///
    /// # Safety
    ///
    /// - Slot `i + 1` must point at a live value of argument type `i`.
    /// - A non-null slot 0 must point at an initialized `Output`.
    unsafe fn invoke(self, this: &mut T, args: &mut ArgSlots<'_>);

    /// Builds the `[null, &arg0, &arg1, ..]` array for a signal emission.
    ///
    /// The pointers borrow from `args` and must not outlive it.
    fn pack(args: &Self::Args) -> Vec<*mut c_void>;

    /// Registers the type of argument `index`, see [`MetaType::register_meta_type`].
    ///
    /// Returns `-1` if `index` is out of range.
    fn register_arg_type(index: usize) -> i32;
}

// -----------------------------------------------------------------------------
// Constructible

/// A function pointer that builds a `T`: `fn(A0, ..) -> T`.
pub trait Constructible<T: 'static>: Copy + Send + Sync + 'static {
    /// The number of arguments.
    const ARITY: usize;

    /// The encoding of every argument, in order.
    const ARG_TYPES: &'static [TypeRef];

    /// Calls the function with arguments cloned out of slots `1..=ARITY`.
    ///
    /// # Safety
    ///
    /// - Slot `i + 1` must point at a live value of argument type `i`.
    unsafe fn construct(self, args: &ArgSlots<'_>) -> T;
}

#[inline(always)]
fn erase<A>(value: &A) -> *mut c_void {
    (value as *const A).cast_mut().cast()
}

macro_rules! impl_invokable {
    ($num:literal : [$($index:tt : $name:ident),*]) => {
        impl_invokable!(@recv $num, &T, [$($index : $name),*]);
        impl_invokable!(@recv $num, &mut T, [$($index : $name),*]);

        impl<T: 'static, $($name: MetaType),*> Constructible<T> for fn($($name),*) -> T {
            const ARITY: usize = $num;
            const ARG_TYPES: &'static [TypeRef] = &[$(<$name as MetaType>::TYPE),*];

            #[allow(unused_variables, reason = "macro implementation.")]
            unsafe fn construct(self, args: &ArgSlots<'_>) -> T {
                // SAFETY: upheld by the caller.
                self($(unsafe { args.arg::<$name>($index) }.clone()),*)
            }
        }
    };
    (@recv $num:literal, $recv:ty, [$($index:tt : $name:ident),*]) => {
        impl<T: 'static, R: MetaType, $($name: MetaType),*> Invokable<T> for fn($recv $(, $name)*) -> R {
            type Args = ($($name,)*);
            type Output = R;

            const ARITY: usize = $num;
            const RETURN_TYPE: TypeRef = R::TYPE;
            const ARG_TYPES: &'static [TypeRef] = &[$(<$name as MetaType>::TYPE),*];

            #[inline]
            fn addr(self) -> usize {
                self as usize
            }

            unsafe fn invoke(self, this: &mut T, args: &mut ArgSlots<'_>) {
                // SAFETY: upheld by the caller.
                let ret = self(this $(, unsafe { args.arg::<$name>($index) }.clone())*);
                unsafe { args.set_return::<R>(ret) };
            }

            #[allow(unused_variables, reason = "macro implementation.")]
            fn pack(args: &Self::Args) -> Vec<*mut c_void> {
                alloc::vec![core::ptr::null_mut() $(, erase(&args.$index))*]
            }

            fn register_arg_type(index: usize) -> i32 {
                match index {
                    $($index => <$name as MetaType>::register_meta_type(),)*
                    _ => -1,
                }
            }
        }
    };
}

mo_utils::arity_invoke!(impl_invokable);

#[cfg(test)]
mod tests {
    use super::{Constructible, Invokable};
    use crate::types::{BuiltinType, TypeRef};
    use core::ffi::c_void;
    use mo_ptr::ArgSlots;

    struct Acc {
        total: i64,
    }

    impl Acc {
        fn new(total: i64) -> Self {
            Self { total }
        }

        fn add(&mut self, a: i32, b: i32) -> i64 {
            self.total += i64::from(a) + i64::from(b);
            self.total
        }

        fn get(&self) -> i64 {
            self.total
        }
    }

    type AddFn = fn(&mut Acc, i32, i32) -> i64;

    #[test]
    fn signature_constants() {
        assert_eq!(<AddFn as Invokable<Acc>>::ARITY, 2);
        assert_eq!(
            <AddFn as Invokable<Acc>>::RETURN_TYPE,
            TypeRef::Builtin(BuiltinType::LongLong)
        );
        assert_eq!(
            <AddFn as Invokable<Acc>>::ARG_TYPES,
            &[TypeRef::Builtin(BuiltinType::Int); 2]
        );
        assert_eq!(<AddFn as Invokable<Acc>>::register_arg_type(0), -1);
        assert_eq!(<AddFn as Invokable<Acc>>::register_arg_type(2), -1);
    }

    #[test]
    fn invoke_reads_args_and_writes_return() {
        let mut acc = Acc::new(1);
        let (a, b) = (2i32, 3i32);
        let mut ret = 0i64;
        let mut raw = [
            (&raw mut ret).cast::<c_void>(),
            (&raw const a).cast_mut().cast(),
            (&raw const b).cast_mut().cast(),
        ];

        let f: AddFn = Acc::add;
        unsafe { f.invoke(&mut acc, &mut ArgSlots::new(&mut raw)) };
        assert_eq!(ret, 6);
        assert_eq!(acc.total, 6);

        let g = Acc::get as fn(&Acc) -> i64;
        let mut raw = [core::ptr::null_mut()];
        unsafe { g.invoke(&mut acc, &mut ArgSlots::new(&mut raw)) };
    }

    #[test]
    fn pack_points_at_tuple_fields() {
        let args = (7i32, 8i32);
        let packed = <AddFn as Invokable<Acc>>::pack(&args);
        assert_eq!(packed.len(), 3);
        assert!(packed[0].is_null());
        assert_eq!(unsafe { *packed[2].cast::<i32>() }, 8);
    }

    #[test]
    fn construct_from_slots() {
        let total = 42i64;
        let mut raw = [core::ptr::null_mut(), (&raw const total).cast_mut().cast()];
        let f = Acc::new as fn(i64) -> Acc;
        let acc = unsafe { f.construct(&ArgSlots::new(&mut raw)) };
        assert_eq!(acc.total, 42);
        assert_eq!(<fn(i64) -> Acc as Constructible<Acc>>::ARITY, 1);
    }
}
