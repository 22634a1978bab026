//! Small containers shared by the meta-object crates.
//!
//! - [`TypeIdMap`]: a map keyed by [`TypeId`](core::any::TypeId), used to key
//!   per-class data by class identity.
//! - [`hash`]: `hashbrown` containers with a fixed `foldhash` seed.
//! - [`arity_invoke!`]: expands a macro once per callable arity.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// Modules

mod arity_invoke;
mod typeid_map;

pub mod hash;

// -----------------------------------------------------------------------------
// Top-level exports

pub use typeid_map::TypeIdMap;
