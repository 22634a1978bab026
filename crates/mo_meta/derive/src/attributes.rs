use proc_macro2::Span;
use syn::{Attribute, LitStr};

use crate::META_TYPE_ATTRIBUTE_NAME;

/// Options collected from every `#[meta_type(..)]` on a type.
#[derive(Default)]
pub(crate) struct MetaTypeAttributes {
    /// `name = "..."`, the host spelling.
    pub name: Option<LitStr>,
    /// `auto_register`, with the span it was written at.
    pub auto_register: Option<Span>,
}

impl MetaTypeAttributes {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();

        for attr in attrs {
            if !attr.path().is_ident(META_TYPE_ATTRIBUTE_NAME) {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let lit: LitStr = meta.value()?.parse()?;
                    if out.name.is_some() {
                        return Err(meta.error("duplicate `name`"));
                    }
                    if lit.value().contains('\0') {
                        return Err(syn::Error::new(lit.span(), "type names may not contain NUL"));
                    }
                    out.name = Some(lit);
                    Ok(())
                } else if meta.path.is_ident("auto_register") {
                    out.auto_register = Some(meta.path.require_ident()?.span());
                    Ok(())
                } else {
                    Err(meta.error("expected `name = \"...\"` or `auto_register`"))
                }
            })?;
        }

        Ok(out)
    }
}
