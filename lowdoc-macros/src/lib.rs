//! Procedural macros for the lowdoc project.
//!
//! Provides `#[derive(Document)]`, which implements `lowdoc::document::Document`
//! for a struct with named fields.
//!
//! ```ignore
//! use lowdoc::Document;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Document)]
//! #[document(collection = "departments")]
//! pub struct Department {
//!     #[document(id)]
//!     pub code: String,
//!     pub name: String,
//! }
//! ```
//!
//! Without `#[document(id)]` the field named `id` is used. Without
//! `collection = "..."` the collection is the lowercased type name.

#[allow(unused_extern_crates)]
extern crate self as lowdoc_macros;

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DataStruct, DeriveInput, Error, Field, Fields, LitStr, parse_macro_input};

#[proc_macro_derive(Document, attributes(document))]
pub fn derive_document(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand_document(input)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

fn expand_document(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut collection: Option<LitStr> = None;
    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("document")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                collection = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("expected `collection = \"...\"`"))
            }
        })?;
    }
    let collection = collection
        .map(|lit| lit.value())
        .unwrap_or_else(|| name.to_string().to_lowercase());

    let fields = match &input.data {
        Data::Struct(DataStruct { fields: Fields::Named(named), .. }) => &named.named,
        _ => {
            return Err(Error::new_spanned(
                name,
                "Document can only be derived for structs with named fields",
            ));
        }
    };

    let id_field = find_id_field(name, fields.iter())?;
    let Some(id_ident) = &id_field.ident else {
        return Err(Error::new_spanned(id_field, "identity field must be named"));
    };
    let id_ty = &id_field.ty;

    Ok(quote! {
        impl #impl_generics ::lowdoc::document::Document for #name #ty_generics #where_clause {
            type Id = #id_ty;

            fn id(&self) -> &Self::Id {
                &self.#id_ident
            }

            fn collection_name() -> &'static str {
                #collection
            }
        }
    })
}

/// Picks the field tagged `#[document(id)]`, else the field named `id`.
fn find_id_field<'a>(
    name: &syn::Ident,
    fields: impl Iterator<Item = &'a Field> + Clone,
) -> syn::Result<&'a Field> {
    let mut tagged: Option<&Field> = None;

    for field in fields.clone() {
        for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("document")) {
            let mut is_id = false;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("id") {
                    is_id = true;
                    Ok(())
                } else {
                    Err(meta.error("expected `id`"))
                }
            })?;

            if is_id {
                if tagged.is_some() {
                    return Err(Error::new_spanned(field, "only one field can be marked #[document(id)]"));
                }
                tagged = Some(field);
            }
        }
    }

    if let Some(field) = tagged {
        return Ok(field);
    }

    fields
        .into_iter()
        .find(|field| field.ident.as_ref().is_some_and(|ident| ident == "id"))
        .ok_or_else(|| {
            Error::new_spanned(
                name,
                "no field named `id`; mark the identity field with #[document(id)]",
            )
        })
}
