use core::ffi::c_void;
use core::fmt;

use crate::{Ptr, PtrMut};

/// A view over the host's argument array.
///
/// Layout: `[return, arg0, arg1, ...]`. Every slot is an untyped pointer
/// and may be null; a null return slot means the caller ignores the result.
///
/// Reading and writing typed values is `unsafe`: only the dispatch code that
/// knows the declared signature can say what each slot points to.
///
/// # Examples
///
/// ```
/// use core::ffi::c_void;
/// use mo_ptr::ArgSlots;
///
/// let mut ret = 0i32;
/// let arg = 20i32;
/// let mut raw = [
///     (&raw mut ret).cast::<c_void>(),
///     (&raw const arg).cast_mut().cast::<c_void>(),
/// ];
///
/// let mut slots = ArgSlots::new(&mut raw);
/// let doubled = unsafe { *slots.arg::<i32>(0) } * 2;
/// unsafe { slots.set_return(doubled) };
///
/// assert_eq!(ret, 40);
/// ```
pub struct ArgSlots<'a> {
    slots: &'a mut [*mut c_void],
}

impl<'a> ArgSlots<'a> {
    /// Wraps a host argument array.
    #[inline(always)]
    pub const fn new(slots: &'a mut [*mut c_void]) -> Self {
        Self { slots }
    }

    /// Returns the number of slots, including the return slot.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if there is not even a return slot.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the raw pointer stored in `slot`, or null if out of range.
    #[inline]
    pub fn raw(&self, slot: usize) -> *mut c_void {
        self.slots.get(slot).copied().unwrap_or(core::ptr::null_mut())
    }

    /// Returns the raw slots.
    #[inline(always)]
    pub fn as_raw_mut(&mut self) -> &mut [*mut c_void] {
        &mut *self.slots
    }

    /// Returns `slot` as a shared pointer, or `None` if null or out of range.
    ///
    /// # Safety
    ///
    /// - A non-null slot must point at a value that outlives this view.
    #[inline]
    pub unsafe fn slot(&self, slot: usize) -> Option<Ptr<'_>> {
        // SAFETY: upheld by the caller.
        unsafe { Ptr::from_void(self.raw(slot)) }
    }

    /// Returns `slot` as an exclusive pointer, or `None` if null or out of range.
    ///
    /// # Safety
    ///
    /// - A non-null slot must point at a value that outlives this view.
    /// - The pointee must not be aliased by another slot.
    #[inline]
    pub unsafe fn slot_mut(&mut self, slot: usize) -> Option<PtrMut<'_>> {
        // SAFETY: upheld by the caller.
        unsafe { PtrMut::from_void(self.raw(slot)) }
    }

    /// Returns argument `index` (stored in slot `index + 1`).
    ///
    /// # Panics
    ///
    /// Panics if the slot is missing or null.
    ///
    /// # Safety
    ///
    /// - The slot must point at a live `T`.
    #[track_caller]
    pub unsafe fn arg<T>(&self, index: usize) -> &T {
        // SAFETY: upheld by the caller.
        match unsafe { self.slot(index + 1) } {
            Some(ptr) => unsafe { ptr.as_ref::<T>() },
            None => panic!("argument slot {} is missing or null", index + 1),
        }
    }

    /// Assigns `value` into the return slot; drops it if the slot is null.
    ///
    /// The previous value behind the slot is dropped, as with `*slot = value`.
    ///
    /// # Safety
    ///
    /// - A non-null return slot must point at an initialized `T`.
    pub unsafe fn set_return<T>(&mut self, value: T) {
        // SAFETY: upheld by the caller.
        if let Some(ptr) = unsafe { self.slot_mut(0) } {
            unsafe { *ptr.as_mut::<T>() = value };
        }
    }
}

impl fmt::Debug for ArgSlots<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.slots.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::ArgSlots;
    use core::ffi::c_void;
    use core::ptr;

    #[test]
    fn null_return_slot_drops_value() {
        let arg = 3u8;
        let mut raw = [ptr::null_mut(), (&raw const arg).cast_mut().cast::<c_void>()];
        let mut slots = ArgSlots::new(&mut raw);

        assert_eq!(slots.len(), 2);
        assert_eq!(unsafe { *slots.arg::<u8>(0) }, 3);
        unsafe { slots.set_return(7u8) };
        assert!(unsafe { slots.slot(0) }.is_none());
        assert!(slots.raw(5).is_null());
    }

    #[test]
    #[should_panic(expected = "argument slot 2 is missing or null")]
    fn missing_argument_panics() {
        let mut raw = [ptr::null_mut::<c_void>()];
        let slots = ArgSlots::new(&mut raw);
        let _ = unsafe { slots.arg::<u8>(1) };
    }
}
