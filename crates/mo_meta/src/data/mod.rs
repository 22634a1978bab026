//! The data array generator and its readers.
//!
//! [`generate`] walks a finished [`ClassDef`](crate::class::ClassDef) once
//! and emits both the string table and the integer array. The integer
//! array is laid out as:
//!
//! | section | words |
//! |---|---|
//! | header | [`HEADER_LEN`] |
//! | method records | [`METHOD_RECORD_LEN`] per method |
//! | property records | [`PROPERTY_RECORD_LEN`] per property |
//! | constructor records | [`CONSTRUCTOR_RECORD_LEN`] per constructor |
//! | parameter blocks | `1 + 2 * argc` per method, then per constructor |
//!
//! [`verify`] re-reads a table and checks that every count, offset and index
//! agrees with this layout.

// -----------------------------------------------------------------------------
// Modules

mod arrays;
mod generator;
mod layout;
mod verify;

// -----------------------------------------------------------------------------
// Exports

pub use arrays::{DataArrays, MethodView, PropertyView};
pub use generator::generate;
pub use layout::*;
pub use verify::{LayoutError, verify};
