//! Unified field type mapping for schema-driven models
//!
//! This crate owns the closed set of field data types, the conversion of raw
//! stored or user-supplied values into their typed form, and the per-type
//! value validators.

pub mod normalize;
pub mod types;
pub mod validate;

pub use normalize::{
    import_value, is_empty_value, loosely_equal, normalize_value, value_to_text, ZERO_DATES,
};
pub use types::{DataType, UnknownDataType};
pub use validate::{FieldValidator, ValidatorOptions, ValidatorSet};
