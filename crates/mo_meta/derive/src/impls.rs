use proc_macro2::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{DeriveInput, LitStr};

use crate::attributes::MetaTypeAttributes;
use crate::path;

/// Expands `#[derive(MetaType)]`.
pub(crate) fn meta_type(ast: &DeriveInput) -> syn::Result<TokenStream> {
    if !ast.generics.params.is_empty() {
        return Err(syn::Error::new(
            ast.generics.span(),
            "`MetaType` cannot be derived for generic types; \
             use `declare_meta_type!` on each concrete instantiation",
        ));
    }

    let attrs = MetaTypeAttributes::parse(&ast.attrs)?;
    let ident = &ast.ident;
    let name = attrs
        .name
        .unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()));

    let mo_meta_path = path::mo_meta();
    let types_ = path::types_(&mo_meta_path);
    let static_string_ = path::static_string_(&mo_meta_path);
    let auto_register = type_auto_register(&mo_meta_path, ident, attrs.auto_register);

    Ok(quote! {
        const _: () = {
            impl #types_::MetaType for #ident {
                const TYPE: #types_::TypeRef =
                    #types_::TypeRef::Custom(#static_string_::new(#name).as_str());
            }

            #auto_register
        };
    })
}

#[cfg(feature = "auto_register")]
fn type_auto_register(
    mo_meta_path: &syn::Path,
    ident: &syn::Ident,
    span: Option<proc_macro2::Span>,
) -> TokenStream {
    let Some(span) = span else {
        return TokenStream::new();
    };
    let auto_register_ = path::auto_register_(mo_meta_path);
    quote::quote_spanned! { span =>
        #auto_register_::inventory::submit! {
            #auto_register_::__AutoRegisterType(
                <#ident as #auto_register_::__RegisterType>::__register
            )
        }
    }
}

#[cfg(not(feature = "auto_register"))]
fn type_auto_register(
    _: &syn::Path,
    _: &syn::Ident,
    _: Option<proc_macro2::Span>,
) -> TokenStream {
    TokenStream::new()
}

/// Expands `impl_auto_register!(Type)`.
#[cfg(feature = "auto_register")]
pub(crate) fn class_auto_register(ty: &syn::Type) -> TokenStream {
    let mo_meta_path = path::mo_meta();
    let auto_register_ = path::auto_register_(&mo_meta_path);

    quote! {
        const _: () = {
            #auto_register_::inventory::submit! {
                #auto_register_::__AutoRegisterClass(
                    <#ty as #auto_register_::__RegisterClass>::__register
                )
            }
        };
    }
}

#[cfg(not(feature = "auto_register"))]
pub(crate) fn class_auto_register(_: &syn::Type) -> TokenStream {
    TokenStream::new()
}
