//! Structured feature handling for the risk pipeline
//!
//! * `schema` - the [`FeatureSchema`] trait, raw records and value coercion
//! * `record` - [`HealthRecord`], the canonical schema
//! * `preparer` - the frozen training-time feature layout

pub mod preparer;
pub mod record;
pub mod schema;

pub use preparer::{FeaturePreparer, FeatureVector};
pub use record::HealthRecord;
pub use schema::{FeatureSchema, RawRecord, RawValue, coerce_category, coerce_flag, coerce_numeric};
