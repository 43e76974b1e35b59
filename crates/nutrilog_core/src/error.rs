//! crates/nutrilog_core/src/error.rs
//!
//! Validation errors raised by the core's pure functions.

/// Input the core refuses to compute with.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("Quantity must be a positive number of grams, got {0}")]
    InvalidQuantity(f64),
    #[error("Invalid value for {field}: '{value}'")]
    InvalidValue { field: &'static str, value: String },
}
