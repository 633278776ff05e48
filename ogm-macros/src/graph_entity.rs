//! Implementation of #[derive(GraphEntity)] proc-macro.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, LitStr, Meta};

pub fn derive_graph_entity_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return syn::Error::new_spanned(
                    &input,
                    "GraphEntity can only be derived for structs with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new_spanned(&input, "GraphEntity can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    let label = match parse_label(&input.attrs) {
        Ok(Some(label)) => quote! { ::std::option::Option::Some(#label) },
        Ok(None) => quote! { ::std::option::Option::None },
        Err(err) => return err.to_compile_error().into(),
    };

    // (rust ident, field name as string, directive)
    let mut mapped = Vec::new();
    for field in fields {
        let ident = field.ident.as_ref().unwrap();
        let directive = match parse_directive(&field.attrs) {
            Ok(Some(directive)) => directive,
            Ok(None) => continue,
            Err(err) => return err.to_compile_error().into(),
        };
        let field_name = ident.to_string().trim_start_matches("r#").to_string();
        mapped.push((ident, field_name, directive));
    }

    let type_name = name.to_string();

    let schema_fields = mapped.iter().map(|(_, field_name, directive)| {
        quote! {
            ::neopersist::mapping::FieldSchema::new(#field_name, #directive)
        }
    });

    let read_arms = mapped.iter().map(|(ident, field_name, _)| {
        quote! {
            #field_name => ::neopersist::__private::serde_json::to_value(&self.#ident).map_err(
                |source| ::neopersist::mapping::MappingError::Encode {
                    field: #field_name.to_string(),
                    source,
                },
            ),
        }
    });

    let write_arms = mapped.iter().map(|(ident, field_name, _)| {
        quote! {
            #field_name => {
                self.#ident = ::neopersist::__private::serde_json::from_value(value).map_err(
                    |source| ::neopersist::mapping::MappingError::Decode {
                        field: #field_name.to_string(),
                        source,
                    },
                )?;
                ::std::result::Result::Ok(())
            }
        }
    });

    let expanded = quote! {
        impl #impl_generics ::neopersist::GraphEntity for #name #ty_generics #where_clause {
            fn schema() -> ::neopersist::mapping::TypeSchema {
                ::neopersist::mapping::TypeSchema::record(
                    #type_name,
                    #label,
                    ::std::vec![#(#schema_fields),*],
                )
            }

            fn read_field(
                &self,
                field: &str,
            ) -> ::std::result::Result<
                ::neopersist::__private::serde_json::Value,
                ::neopersist::mapping::MappingError,
            > {
                match field {
                    #(#read_arms)*
                    other => ::std::result::Result::Err(
                        ::neopersist::mapping::MappingError::UnknownField(other.to_string()),
                    ),
                }
            }

            #[allow(unused_variables)]
            fn write_field(
                &mut self,
                field: &str,
                value: ::neopersist::__private::serde_json::Value,
            ) -> ::std::result::Result<(), ::neopersist::mapping::MappingError> {
                match field {
                    #(#write_arms)*
                    other => ::std::result::Result::Err(
                        ::neopersist::mapping::MappingError::UnknownField(other.to_string()),
                    ),
                }
            }
        }
    };

    TokenStream::from(expanded)
}

/// Parses `#[graph(label = "Person")]` on the struct.
fn parse_label(attrs: &[Attribute]) -> syn::Result<Option<LitStr>> {
    let mut label = None;
    for attr in attrs {
        if !attr.path().is_ident("graph") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("label") {
                label = Some(meta.value()?.parse::<LitStr>()?);
                Ok(())
            } else {
                Err(meta.error("unsupported graph attribute, expected `label = \"...\"`"))
            }
        })?;
    }
    Ok(label)
}

/// Parses the field directive: `#[graph("pk,property:userId")]`.
///
/// A bare `#[graph]` yields an empty directive, which leaves the field unmapped.
fn parse_directive(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    for attr in attrs {
        if !attr.path().is_ident("graph") {
            continue;
        }
        return match &attr.meta {
            Meta::Path(_) => Ok(Some(String::new())),
            Meta::List(_) => Ok(Some(attr.parse_args::<LitStr>()?.value())),
            Meta::NameValue(_) => Err(syn::Error::new_spanned(
                attr,
                "expected #[graph(\"pk,property:name\")]",
            )),
        };
    }
    Ok(None)
}
