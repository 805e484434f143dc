//! Validation error types.
//!
//! Field-level validation failures are first-class values, never exceptions:
//! [`FieldError`] describes a single rule failure and [`FieldErrors`] is a
//! non-empty accumulation of them.

mod field_error;

pub use field_error::{FieldError, FieldErrors};
