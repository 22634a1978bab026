//! Paths into `mo_meta` used by generated code.

use proc_macro2::TokenStream;
use quote::quote;

/// The path generated code uses for `mo_meta`.
///
/// `::mo_meta` for crates depending on it directly, `::mo_core::meta` for
/// crates depending on the facade. This reads the caller's manifest, so it
/// is called once per macro invocation.
pub(crate) fn mo_meta() -> syn::Path {
    mo_macro_utils::Manifest::shared(|manifest| manifest.get_crate_path("mo_meta"))
}

#[inline(always)]
pub(crate) fn types_(mo_meta_path: &syn::Path) -> TokenStream {
    quote! {
        #mo_meta_path::types
    }
}

#[inline(always)]
pub(crate) fn static_string_(mo_meta_path: &syn::Path) -> TokenStream {
    quote! {
        #mo_meta_path::strings::StaticString
    }
}

#[cfg(feature = "auto_register")]
#[inline(always)]
pub(crate) fn auto_register_(mo_meta_path: &syn::Path) -> TokenStream {
    quote! {
        #mo_meta_path::__macro_exports::auto_register
    }
}
