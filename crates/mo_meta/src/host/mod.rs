//! The interface to the host object system.
//!
//! - [`MetaObject`]: what the host receives per class: parent, string
//!   buffer, integer array, static dispatch function.
//! - [`CallKind`]: the operations the host requests through dispatch.
//! - [`Activator`]: the host's signal delivery primitive.

// -----------------------------------------------------------------------------
// Modules

mod activator;
mod call_kind;
mod meta_object;

// -----------------------------------------------------------------------------
// Exports

pub use activator::{Activator, ActivatorError, set_activator, with_activator};
pub use call_kind::CallKind;
pub use meta_object::{MetaObject, StaticMetacall, normalize_signature};

pub(crate) use activator::deliver;

/// Returned by lookups that find nothing.
pub const NOT_FOUND: i32 = -1;
