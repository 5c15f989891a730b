//! Utility functions for procedural macros
//!
//! This module contains utility functions used by the procedural macros,
//! such as type checking and attribute value parsing.

use syn::Type;

/// Feature kinds accepted by `#[field(kind = "...")]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    /// Continuous measurement stored as `Option<f64>`
    Numeric,
    /// Boolean indicator stored as `Option<f64>` holding 0/1
    Flag,
    /// Categorical value stored as `Option<String>`, one-hot expanded
    Categorical,
}

impl FeatureKind {
    /// Parse a kind name, defaulting to numeric when absent
    pub fn parse(kind: Option<&str>) -> Option<Self> {
        match kind.map(str::trim) {
            None | Some("numeric") => Some(Self::Numeric),
            Some("flag") => Some(Self::Flag),
            Some("categorical") => Some(Self::Categorical),
            Some(_) => None,
        }
    }

    /// The inner type the field must wrap in `Option<...>`
    pub const fn expected_inner_type(self) -> &'static str {
        match self {
            Self::Numeric | Self::Flag => "f64",
            Self::Categorical => "String",
        }
    }
}

/// Check if a type is an Option<T>
pub fn is_option_type(ty: &Type) -> bool {
    match ty {
        Type::Path(type_path) => {
            let path = &type_path.path;
            if path.segments.len() == 1 {
                let segment = &path.segments[0];
                segment.ident == "Option"
            } else {
                false
            }
        }
        _ => false,
    }
}

/// Extract the name of the inner type of an Option<T>
pub fn option_inner_type_name(ty: &Type) -> Option<String> {
    if !is_option_type(ty) {
        return None;
    }

    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = &type_path.path.segments[0];
    if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
        if let Some(syn::GenericArgument::Type(Type::Path(inner))) = args.args.first() {
            return inner.path.segments.last().map(|s| s.ident.to_string());
        }
    }
    None
}

/// Split a comma-separated category list into normalised category names
pub fn parse_categories(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect()
}

/// Build the expanded feature name for one category of a categorical field
pub fn one_hot_name(field: &str, category: &str) -> String {
    format!("{field}_{category}")
}
