//! Type handling: how a Rust type becomes a host type code.
//!
//! A type may appear in a signature or as a property only if it implements
//! [`MetaType`]. Built-in types map to the host's fixed codes; every other
//! type must be declared with [`declare_meta_type!`](crate::declare_meta_type)
//! or `#[derive(MetaType)]`, and is encoded as a flagged index into the
//! class's string table.
//!
//! Using an undeclared type fails to compile:
//!
//! ```compile_fail
//! use mo_meta::class::ClassDef;
//!
//! #[derive(Clone)]
//! struct Opaque;
//!
//! struct Holder;
//!
//! impl Holder {
//!     fn take(&mut self, _: Opaque) {}
//! }
//!
//! let _ = ClassDef::<Holder>::new("Holder")
//!     .slot("take", Holder::take as fn(&mut Holder, Opaque));
//! ```

// -----------------------------------------------------------------------------
// Modules

mod builtin;
mod meta_type;
mod registry;

// -----------------------------------------------------------------------------
// Exports

pub use builtin::BuiltinType;
pub use meta_type::{MetaType, TypeRef};
pub use registry::TypeRegistry;

/// High bit marking a type code as "string table index, resolve by name".
pub const UNRESOLVED_TYPE: u32 = 1 << 31;

/// The first id handed out to a custom type by [`TypeRegistry`].
pub const USER_TYPE: i32 = 1024;
