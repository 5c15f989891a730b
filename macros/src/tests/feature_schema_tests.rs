//! Tests for the FeatureSchema derive helpers
//!
//! The derive itself is exercised by the main crate's `HealthRecord`; these
//! tests cover the attribute parsing helpers.

use crate::utils::{self, FeatureKind};

#[test]
fn test_feature_kind_parsing() {
    assert_eq!(FeatureKind::parse(None), Some(FeatureKind::Numeric));
    assert_eq!(FeatureKind::parse(Some("flag")), Some(FeatureKind::Flag));
    assert_eq!(
        FeatureKind::parse(Some(" categorical ")),
        Some(FeatureKind::Categorical)
    );
    assert_eq!(FeatureKind::parse(Some("ordinal")), None);
}

#[test]
fn test_parse_categories() {
    assert_eq!(
        utils::parse_categories("Male, female,,"),
        vec!["male".to_string(), "female".to_string()]
    );
    assert_eq!(utils::one_hot_name("gender", "male"), "gender_male");
}

#[test]
fn test_option_inner_type_name() {
    let numeric: syn::Type = syn::parse_quote!(Option<f64>);
    let text: syn::Type = syn::parse_quote!(Option<String>);
    let plain: syn::Type = syn::parse_quote!(f64);

    assert_eq!(utils::option_inner_type_name(&numeric).as_deref(), Some("f64"));
    assert_eq!(utils::option_inner_type_name(&text).as_deref(), Some("String"));
    assert_eq!(utils::option_inner_type_name(&plain), None);
}
