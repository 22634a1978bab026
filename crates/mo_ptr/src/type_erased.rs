use core::ffi::c_void;
use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;

// -----------------------------------------------------------------------------
// Common methods

macro_rules! impl_ptr {
    ($ptr:ident) => {
        impl $ptr<'_> {
            /// Check if the pointer is aligned to type `T`.
            #[inline]
            pub fn is_aligned<T>(&self) -> bool {
                self.0.as_ptr().cast::<T>().is_aligned()
            }

            /// A function that only checks alignment in debug mode.
            #[cfg_attr(debug_assertions, track_caller)]
            #[cfg_attr(not(debug_assertions), inline(always))]
            pub fn debug_assert_aligned<T>(&self) {
                debug_assert!(
                    self.is_aligned::<T>(),
                    "pointer is not aligned. Address {:p} does not have alignment {} for type {}",
                    self.0,
                    align_of::<T>(),
                    core::any::type_name::<T>(),
                );
            }

            /// Returns the address as an untyped host pointer.
            #[inline(always)]
            pub const fn as_void(&self) -> *mut c_void {
                self.0.as_ptr()
            }
        }

        impl fmt::Pointer for $ptr<'_> {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Pointer::fmt(&self.0, f)
            }
        }

        impl fmt::Debug for $ptr<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($ptr), self.0)
            }
        }
    };
}

// -----------------------------------------------------------------------------
// Ptr

/// A type-erased shared pointer, similar to `&'a dyn Any` without the vtable.
///
/// It must always point to a valid value of whatever the pointee type is,
/// and the pointee must not change while this pointer is alive.
///
/// # Examples
///
/// ```
/// # use mo_ptr::Ptr;
/// let x = 8i32;
/// let ptr = Ptr::from_ref(&x);
///
/// let rx = unsafe { ptr.as_ref::<i32>() };
/// assert_eq!(*rx, 8);
/// ```
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct Ptr<'a>(NonNull<c_void>, PhantomData<&'a c_void>);

impl_ptr!(Ptr);

impl<'a> Ptr<'a> {
    /// Creates a `Ptr` from a reference with the same lifetime.
    #[inline(always)]
    pub const fn from_ref<T>(val: &'a T) -> Ptr<'a> {
        Ptr(NonNull::from_ref(val).cast(), PhantomData)
    }

    /// Wraps a host pointer, returning `None` when it is null.
    ///
    /// # Safety
    ///
    /// - A non-null `ptr` must point at a value valid for `'a`.
    #[inline(always)]
    pub const unsafe fn from_void(ptr: *const c_void) -> Option<Ptr<'a>> {
        match NonNull::new(ptr.cast_mut()) {
            Some(ptr) => Some(Ptr(ptr, PhantomData)),
            None => None,
        }
    }

    /// Converts this [`Ptr`] into a `&T` with the same lifetime `'a`.
    ///
    /// # Safety
    ///
    /// - `T` must be the erased pointee type for this pointer.
    #[inline(always)]
    pub unsafe fn as_ref<T>(self) -> &'a T {
        self.debug_assert_aligned::<T>();
        // SAFETY: the caller guarantees the pointee is a valid `T` for `'a`.
        unsafe { self.0.cast::<T>().as_ref() }
    }
}

impl<'a, T> From<&'a T> for Ptr<'a> {
    #[inline(always)]
    fn from(val: &'a T) -> Self {
        Ptr::from_ref(val)
    }
}

// -----------------------------------------------------------------------------
// PtrMut

/// A type-erased exclusive pointer, similar to `&'a mut dyn Any`.
///
/// While a `PtrMut` is alive no other pointer may access its target.
///
/// # Examples
///
/// ```
/// # use mo_ptr::PtrMut;
/// let mut x = 8i32;
/// let ptr = PtrMut::from_mut(&mut x);
///
/// unsafe { *ptr.as_mut::<i32>() = 9 };
/// assert_eq!(x, 9);
/// ```
#[repr(transparent)]
pub struct PtrMut<'a>(NonNull<c_void>, PhantomData<&'a mut c_void>);

impl_ptr!(PtrMut);

impl<'a> PtrMut<'a> {
    /// Creates a `PtrMut` from a mutable reference with the same lifetime.
    #[inline(always)]
    pub const fn from_mut<T>(val: &'a mut T) -> PtrMut<'a> {
        PtrMut(NonNull::from_mut(val).cast(), PhantomData)
    }

    /// Wraps a host pointer, returning `None` when it is null.
    ///
    /// # Safety
    ///
    /// - A non-null `ptr` must point at a value valid for `'a`.
    /// - Nothing else may access the pointee while the result is alive.
    #[inline(always)]
    pub const unsafe fn from_void(ptr: *mut c_void) -> Option<PtrMut<'a>> {
        match NonNull::new(ptr) {
            Some(ptr) => Some(PtrMut(ptr, PhantomData)),
            None => None,
        }
    }

    /// Reborrows this pointer for a shorter lifetime.
    #[inline(always)]
    pub fn reborrow(&mut self) -> PtrMut<'_> {
        PtrMut(self.0, PhantomData)
    }

    /// Downgrades to a shared [`Ptr`].
    #[inline(always)]
    pub fn as_shared(&self) -> Ptr<'_> {
        Ptr(self.0, PhantomData)
    }

    /// Converts this [`PtrMut`] into a `&mut T` with the same lifetime `'a`.
    ///
    /// # Safety
    ///
    /// - `T` must be the erased pointee type for this pointer.
    #[inline(always)]
    pub unsafe fn as_mut<T>(self) -> &'a mut T {
        self.debug_assert_aligned::<T>();
        // SAFETY: the caller guarantees the pointee is a valid `T` for `'a`.
        unsafe { self.0.cast::<T>().as_mut() }
    }
}

impl<'a, T> From<&'a mut T> for PtrMut<'a> {
    #[inline(always)]
    fn from(val: &'a mut T) -> Self {
        PtrMut::from_mut(val)
    }
}
