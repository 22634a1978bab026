//! Member descriptors: methods, signals, slots, properties and constructors.
//!
//! A declaration starts typed ([`MethodDecl`], [`PropertyDecl`],
//! [`ConstructorDecl`]) so that arity and value types are checked at compile
//! time. Adding it to a [`ClassDef`](crate::class::ClassDef) erases it into
//! a [`MethodDef`], [`PropertyDef`] or [`ConstructorDef`], which keep the real
//! function pointers for dispatch.

// -----------------------------------------------------------------------------
// Modules

mod callable;
mod constructor;
mod flags;
mod method;
mod property;

// -----------------------------------------------------------------------------
// Exports

pub use callable::{Constructible, Invokable};
pub use constructor::{ConstructorDecl, ConstructorDef};
pub use flags::{Access, MethodFlags, MethodKind, PropertyFlags};
pub use method::{MethodDecl, MethodDef};
pub use property::{PropertyDecl, PropertyDef, ReadAccessor, WriteAccessor};
