//! See following macros:
//!
//! - [`MetaType`]
//! - [`impl_auto_register`]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

static META_TYPE_ATTRIBUTE_NAME: &str = "meta_type";

// -----------------------------------------------------------------------------
// Modules

mod attributes;
mod impls;
mod path;

// -----------------------------------------------------------------------------
// Macros

/// Declares a custom type usable in signatures and properties.
///
/// The type must be `Clone + 'static` and must not be generic. It is
/// spelled by its identifier unless renamed:
///
/// ```ignore
/// #[derive(Clone, MetaType)]
/// #[meta_type(name = "QPoint", auto_register)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
/// ```
///
/// - `name = "..."`: the host spelling of the type.
/// - `auto_register`: add the type to `TypeRegistry::auto_register`. A
///   no-op without the `auto_register` feature.
#[proc_macro_derive(MetaType, attributes(meta_type))]
pub fn derive_meta_type(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    impls::meta_type(&ast)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Adds a class to `ClassRegistry::auto_register`.
///
/// If the feature is not enabled, this macro will not do anything.
///
/// The type must implement `MetaClass` and be concrete.
///
/// ```ignore
/// impl_auto_register!(widgets::Button);
/// impl_auto_register!(Wrapper<u32>); // Ok
/// ```
#[proc_macro]
pub fn impl_auto_register(input: TokenStream) -> TokenStream {
    let ty = parse_macro_input!(input as syn::Type);
    impls::class_auto_register(&ty).into()
}
