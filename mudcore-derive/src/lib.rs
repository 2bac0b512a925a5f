//! `#[derive(Entity)]`: generates a [`mudcore::Schema`] impl from a struct's
//! fields, walking the field list the same way a `#[proc_macro_derive]`
//! expanding a per-field trait body would, specialized for one trait
//! instead of recursing the same call across every field.
//!
//! Expects an `id: u16` field, an `extras: mudcore::AttributeList` field,
//! a struct-level `#[entity(domain = "...")]`, and zero or more
//! `#[entity(name = "...")]`-annotated `String`/`u32` fields that become
//! typed schema entries; unannotated non-special fields fall back to their
//! Rust identifier as the on-disk name.

use proc_macro2::TokenStream;
use quote::{format_ident, quote, quote_spanned};
use syn::spanned::Spanned;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Type};

#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let domain = struct_domain(&input.attrs).unwrap_or_else(|| {
        panic!("#[derive(Entity)] on `{name}` needs a #[entity(domain = \"...\")] attribute")
    });

    let fields = match input.data {
        Data::Struct(ref data) => match data.fields {
            Fields::Named(ref fields) => &fields.named,
            _ => panic!("#[derive(Entity)] only supports structs with named fields"),
        },
        _ => panic!("#[derive(Entity)] only supports structs"),
    };

    let mut has_id = false;
    let mut has_extras = false;
    let mut blank_inits = Vec::new();
    let mut getter_fns = Vec::new();
    let mut descriptor_entries = Vec::new();

    for f in fields.iter() {
        let ident = f.ident.as_ref().expect("named field");
        if ident == "id" {
            has_id = true;
            continue;
        }
        if ident == "extras" {
            has_extras = true;
            blank_inits.push(quote_spanned! {f.span()=>
                extras: mudcore::AttributeList::new(),
            });
            continue;
        }

        let disk_name = field_name(&f.attrs).unwrap_or_else(|| ident.to_string());
        let kind = field_kind(&f.ty);

        let getter = format_ident!("__mudcore_get_{ident}");
        let setter = format_ident!("__mudcore_set_{ident}");

        let (kind_tok, get_body, set_body) = match kind {
            FieldKind::Str => (
                quote! { mudcore::FieldType::Str },
                quote_spanned! {f.span()=> mudcore::FieldValue::Str(entity.#ident.clone()) },
                quote_spanned! {f.span()=>
                    match value {
                        mudcore::FieldValue::Str(s) => { entity.#ident = s; Ok(()) }
                        mudcore::FieldValue::Unsigned(_) => unreachable!("schema kind mismatch"),
                    }
                },
            ),
            FieldKind::Unsigned => (
                quote! { mudcore::FieldType::Unsigned },
                quote_spanned! {f.span()=> mudcore::FieldValue::Unsigned(entity.#ident) },
                quote_spanned! {f.span()=>
                    match value {
                        mudcore::FieldValue::Unsigned(n) => { entity.#ident = n; Ok(()) }
                        mudcore::FieldValue::Str(_) => unreachable!("schema kind mismatch"),
                    }
                },
            ),
        };

        getter_fns.push(quote_spanned! {f.span()=>
            fn #getter(entity: &#name) -> mudcore::FieldValue {
                #get_body
            }
            fn #setter(entity: &mut #name, value: mudcore::FieldValue) -> ::std::result::Result<(), mudcore::Error> {
                #set_body
            }
        });

        descriptor_entries.push(quote_spanned! {f.span()=>
            mudcore::FieldDescriptor {
                name: #disk_name,
                kind: #kind_tok,
                get: #getter,
                set: #setter,
            }
        });

        blank_inits.push(quote_spanned! {f.span()=>
            #ident: ::std::default::Default::default(),
        });
    }

    assert!(has_id, "#[derive(Entity)] on `{name}` needs an `id: u16` field");
    assert!(
        has_extras,
        "#[derive(Entity)] on `{name}` needs an `extras: mudcore::AttributeList` field"
    );

    let descriptors_static = format_ident!("__MUDCORE_{}_FIELDS", name.to_string().to_uppercase());

    let expanded = quote! {
        #(#getter_fns)*

        static #descriptors_static: &[mudcore::FieldDescriptor<#name>] = &[
            #(#descriptor_entries),*
        ];

        impl #impl_generics mudcore::Schema for #name #ty_generics #where_clause {
            const DOMAIN: &'static str = #domain;

            fn field_descriptors() -> &'static [mudcore::FieldDescriptor<Self>] {
                #descriptors_static
            }

            fn id(&self) -> u16 {
                self.id
            }

            fn set_id(&mut self, id: u16) {
                self.id = id;
            }

            fn extras(&self) -> &mudcore::AttributeList {
                &self.extras
            }

            fn extras_mut(&mut self) -> &mut mudcore::AttributeList {
                &mut self.extras
            }

            fn blank(id: u16) -> Self {
                Self {
                    id,
                    #(#blank_inits)*
                }
            }
        }
    };

    proc_macro::TokenStream::from(expanded)
}

enum FieldKind {
    Str,
    Unsigned,
}

fn field_kind(ty: &Type) -> FieldKind {
    if let Type::Path(p) = ty {
        if let Some(seg) = p.path.segments.last() {
            match seg.ident.to_string().as_str() {
                "String" => return FieldKind::Str,
                "u32" => return FieldKind::Unsigned,
                _ => {}
            }
        }
    }
    panic!("#[derive(Entity)] schema fields must be `String` or `u32`");
}

fn struct_domain(attrs: &[syn::Attribute]) -> Option<String> {
    let mut domain = None;
    for attr in attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("domain") {
                let value: syn::LitStr = meta.value()?.parse()?;
                domain = Some(value.value());
            }
            Ok(())
        });
    }
    domain
}

fn field_name(attrs: &[syn::Attribute]) -> Option<String> {
    let mut name = None;
    for attr in attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: syn::LitStr = meta.value()?.parse()?;
                name = Some(value.value());
            }
            Ok(())
        });
    }
    name
}
