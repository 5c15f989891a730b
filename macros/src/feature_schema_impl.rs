//! FeatureSchema derive macro implementation
//!
//! This module contains the implementation of the FeatureSchema derive macro,
//! which generates the ordered feature list, value extraction and raw-record
//! coercion for a record struct.

use darling::{ast, FromDeriveInput, FromField};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

use crate::utils::{self, FeatureKind};

/// Receiver for the struct that derives FeatureSchema
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(schema), supports(struct_named))]
pub struct FeatureSchemaReceiver {
    /// The struct identifier
    ident: syn::Ident,
    /// Schema name from #[schema(name = "...")]
    #[darling(default)]
    name: Option<String>,
    /// Schema version from #[schema(version = N)]
    #[darling(default)]
    version: Option<u32>,
    /// The struct data with parsed fields
    data: ast::Data<(), FeatureFieldReceiver>,
}

/// Receiver for the fields in the struct
#[derive(Debug, FromField)]
#[darling(attributes(field))]
pub struct FeatureFieldReceiver {
    /// The field identifier
    ident: Option<syn::Ident>,
    /// The field type
    ty: syn::Type,
    /// Raw record key, defaults to the field name
    #[darling(default)]
    name: Option<String>,
    /// One of numeric, flag, categorical
    #[darling(default)]
    kind: Option<String>,
    /// Comma-separated categories for categorical fields
    #[darling(default)]
    categories: Option<String>,
    /// Exclude the field from the schema
    #[darling(default)]
    skip: bool,
}

/// A validated field ready for code generation
struct SchemaField<'a> {
    ident: &'a syn::Ident,
    key: String,
    kind: FeatureKind,
    categories: Vec<String>,
}

/// Process the FeatureSchema derive macro
pub fn process_derive_feature_schema(input: TokenStream) -> TokenStream {
    // Parse the input tokens into a syntax tree
    let input = parse_macro_input!(input as DeriveInput);

    // Parse with darling
    let receiver = match FeatureSchemaReceiver::from_derive_input(&input) {
        Ok(receiver) => receiver,
        Err(err) => return err.write_errors().into(),
    };

    let ast::Data::Struct(fields) = &receiver.data else {
        unreachable!("Darling ensures this is a struct")
    };

    let mut schema_fields = Vec::new();
    let mut skipped = Vec::new();
    for field in fields.iter() {
        match validate_field(field) {
            Ok(Some(schema_field)) => schema_fields.push(schema_field),
            Ok(None) => {
                if let Some(ident) = field.ident.as_ref() {
                    skipped.push(ident);
                }
            }
            Err(err) => return err.to_compile_error().into(),
        }
    }

    let expanded = generate_feature_schema_impl(&receiver, &schema_fields, &skipped);
    TokenStream::from(expanded)
}

/// Check a field's attributes and type against its declared kind
fn validate_field(field: &FeatureFieldReceiver) -> syn::Result<Option<SchemaField<'_>>> {
    let Some(ident) = field.ident.as_ref() else {
        return Err(syn::Error::new_spanned(&field.ty, "FeatureSchema requires named fields"));
    };

    if field.skip {
        return Ok(None);
    }

    let kind = FeatureKind::parse(field.kind.as_deref()).ok_or_else(|| {
        syn::Error::new_spanned(
            ident,
            "unknown feature kind, expected one of: numeric, flag, categorical",
        )
    })?;

    let expected = kind.expected_inner_type();
    if utils::option_inner_type_name(&field.ty).as_deref() != Some(expected) {
        return Err(syn::Error::new_spanned(
            &field.ty,
            format!("feature field `{ident}` must have type Option<{expected}>"),
        ));
    }

    let categories = match (kind, field.categories.as_deref()) {
        (FeatureKind::Categorical, Some(raw)) => {
            let categories = utils::parse_categories(raw);
            if categories.is_empty() {
                return Err(syn::Error::new_spanned(
                    ident,
                    "categorical feature needs at least one category",
                ));
            }
            categories
        }
        (FeatureKind::Categorical, None) => {
            return Err(syn::Error::new_spanned(
                ident,
                "categorical feature requires `categories = \"a,b,...\"`",
            ));
        }
        (_, Some(_)) => {
            return Err(syn::Error::new_spanned(
                ident,
                "`categories` is only valid on categorical features",
            ));
        }
        (_, None) => Vec::new(),
    };

    Ok(Some(SchemaField {
        ident,
        key: field.name.clone().unwrap_or_else(|| ident.to_string()),
        kind,
        categories,
    }))
}

/// Generate the FeatureSchema implementation
fn generate_feature_schema_impl(
    receiver: &FeatureSchemaReceiver,
    fields: &[SchemaField<'_>],
    skipped: &[&syn::Ident],
) -> TokenStream2 {
    let struct_name = &receiver.ident;
    let schema_name = receiver
        .name
        .clone()
        .unwrap_or_else(|| struct_name.to_string());
    let schema_version = receiver.version.unwrap_or(1);

    let mut feature_names = Vec::new();
    let mut value_pushes = Vec::new();
    let mut value_arms = Vec::new();
    let mut field_parsers = Vec::new();

    for field in fields {
        let ident = field.ident;
        let key = &field.key;

        match field.kind {
            FeatureKind::Numeric | FeatureKind::Flag => {
                feature_names.push(key.clone());
                value_pushes.push(quote! { values.push(self.#ident); });
                value_arms.push(quote! { #key => self.#ident, });
            }
            FeatureKind::Categorical => {
                let mut pushes = Vec::new();
                for category in &field.categories {
                    let expanded = utils::one_hot_name(key, category);
                    pushes.push(quote! {
                        values.push(present.map(|value| if value == #category { 1.0 } else { 0.0 }));
                    });
                    value_arms.push(quote! {
                        #expanded => self.#ident
                            .as_deref()
                            .map(|value| if value == #category { 1.0 } else { 0.0 }),
                    });
                    feature_names.push(expanded);
                }
                value_pushes.push(quote! {
                    let present = self.#ident.as_deref();
                    #(#pushes)*
                });
            }
        }

        let coerce = match field.kind {
            FeatureKind::Numeric => quote! { ::health_insight::features::coerce_numeric },
            FeatureKind::Flag => quote! { ::health_insight::features::coerce_flag },
            FeatureKind::Categorical => quote! { ::health_insight::features::coerce_category },
        };
        field_parsers.push(quote! {
            let #ident = match #coerce(raw, #key) {
                ::std::result::Result::Ok(value) => value,
                ::std::result::Result::Err(field) => {
                    malformed.push(field);
                    ::std::option::Option::None
                }
            };
        });
    }

    let feature_count = feature_names.len();
    let field_idents = fields.iter().map(|f| f.ident);

    quote! {
        impl ::health_insight::features::FeatureSchema for #struct_name {
            const SCHEMA_NAME: &'static str = #schema_name;
            const SCHEMA_VERSION: u32 = #schema_version;

            fn feature_names() -> &'static [&'static str] {
                &[#(#feature_names),*]
            }

            fn feature_values(&self) -> ::std::vec::Vec<::std::option::Option<f64>> {
                let mut values = ::std::vec::Vec::with_capacity(#feature_count);
                #(#value_pushes)*
                values
            }

            fn feature_value(&self, name: &str) -> ::std::option::Option<f64> {
                match name {
                    #(#value_arms)*
                    _ => ::std::option::Option::None,
                }
            }

            fn from_raw(
                raw: &::health_insight::features::RawRecord,
            ) -> ::health_insight::error::Result<Self> {
                let mut malformed = ::std::vec::Vec::new();
                #(#field_parsers)*
                if !malformed.is_empty() {
                    return ::std::result::Result::Err(
                        ::health_insight::error::HealthInsightError::MalformedFeature {
                            fields: malformed,
                        },
                    );
                }
                ::std::result::Result::Ok(Self {
                    #(#field_idents,)*
                    #(#skipped: ::std::default::Default::default(),)*
                })
            }
        }
    }
}
