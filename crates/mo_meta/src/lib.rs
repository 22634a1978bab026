#![doc = include_str!("../README.md")]
#![expect(unsafe_code, reason = "Host dispatch passes arguments as raw pointers.")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Extern Self

// Generated code names `mo_meta`, which must also resolve inside this crate
// and its doc tests.
extern crate self as mo_meta;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod object;

pub mod class;
pub mod data;
pub mod dispatch;
pub mod host;
pub mod member;
pub mod registry;
pub mod seq;
pub mod strings;
pub mod types;

// -----------------------------------------------------------------------------
// Top-Level exports

#[doc(hidden)]
pub mod __macro_exports;

pub use class::ClassDef;
pub use host::{CallKind, MetaObject};
pub use object::{ClassData, MetaCell, MetaClass, class_data};
pub use registry::ClassRegistry;
pub use types::MetaType;

pub use mo_meta_derive as derive;
pub use mo_ptr as ptr;
