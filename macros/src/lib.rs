//! Procedural macros for the health-insight crate
//!
//! This crate provides the `FeatureSchema` derive, which turns a plain record
//! struct into the ordered, typed feature schema used by the risk pipeline.

use proc_macro::TokenStream;

// Import modules
mod feature_schema_impl;
mod utils;

// Tests
#[cfg(test)]
mod tests;

/// Derive macro for generating a feature schema
///
/// Every field becomes one or more named numeric features, in declaration
/// order. Fields must be `Option<f64>` (`numeric` and `flag` kinds) or
/// `Option<String>` (`categorical` kind, one-hot expanded over `categories`).
///
/// # Example
///
/// ```rust,ignore
/// #[derive(FeatureSchema)]
/// #[schema(name = "vitals", version = 1)]
/// struct Vitals {
///     #[field(kind = "numeric")]
///     heart_rate: Option<f64>,
///
///     #[field(kind = "flag")]
///     smoking: Option<f64>,
///
///     #[field(kind = "categorical", categories = "male,female")]
///     gender: Option<String>,
/// }
/// ```
///
/// The struct above exposes the features `heart_rate`, `smoking`,
/// `gender_male` and `gender_female`.
#[proc_macro_derive(FeatureSchema, attributes(schema, field))]
pub fn derive_feature_schema(input: TokenStream) -> TokenStream {
    feature_schema_impl::process_derive_feature_schema(input)
}
