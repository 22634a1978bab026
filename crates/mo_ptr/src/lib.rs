//! Pointer wrappers for the host dispatch boundary.
//!
//! The host object system talks to generated dispatch code through untyped
//! pointers: the instance being called and an array of argument slots.
//! This crate wraps both so the rest of the workspace deals with lifetimes
//! instead of bare `*mut c_void`.
//!
//! **Ptr** and **PtrMut**
//!
//! [`Ptr<'a>`] and [`PtrMut<'a>`] are type-erased `&T` and `&mut T` equivalents.
//! They add a lifetime and debug alignment checks on top of a raw pointer.
//!
//! **ArgSlots**
//!
//! [`ArgSlots<'a>`] views the host's argument array: slot 0 is the return
//! slot, slot `i + 1` points at argument `i`. Any slot may be null.
#![expect(unsafe_code, reason = "Raw pointers are inherently unsafe.")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// Modules

mod arg_slots;
mod type_erased;

// -----------------------------------------------------------------------------
// Top-level exports

pub use arg_slots::ArgSlots;
pub use type_erased::{Ptr, PtrMut};
