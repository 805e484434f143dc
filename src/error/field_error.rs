//! Field-level validation failures and their accumulation.

use std::fmt::{self, Display};

use stillwater::prelude::*;

/// A single rule failure recorded against a declared attribute.
///
/// # Example
///
/// ```rust
/// use triage::FieldError;
///
/// let error = FieldError::new("weight", "can't be blank").with_code("blank");
/// assert_eq!(error.attribute, "weight");
/// assert_eq!(error.code, "blank");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    /// The declared attribute the rule ran against.
    pub attribute: String,
    /// Human-readable description of the failure.
    pub message: String,
    /// Machine-readable error code (e.g., `blank`, `format`).
    pub code: String,
}

impl FieldError {
    /// Creates a new field error with the given attribute and message.
    ///
    /// The error code defaults to "invalid". Use `with_code` to set a more
    /// specific code.
    pub fn new(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            message: message.into(),
            code: "invalid".to_string(),
        }
    }

    /// Sets the error code and returns self for chaining.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.attribute, self.message)
    }
}

impl std::error::Error for FieldError {}

/// A non-empty collection of field errors.
///
/// Wraps a `NonEmptyVec<FieldError>` so a failure always carries at least one
/// error, which is what `Validation<T, FieldErrors>` requires. Implements
/// `Semigroup` so failures from independent rules combine without loss.
///
/// ```rust
/// use stillwater::prelude::*;
/// use triage::{FieldError, FieldErrors};
///
/// let a = FieldErrors::single(FieldError::new("type", "can't be blank"));
/// let b = FieldErrors::single(FieldError::new("unit", "can't be blank"));
/// assert_eq!(a.combine(b).len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldErrors(NonEmptyVec<FieldError>);

impl FieldErrors {
    /// Creates a `FieldErrors` containing a single error.
    pub fn single(error: FieldError) -> Self {
        Self(NonEmptyVec::singleton(error))
    }

    /// Creates a `FieldErrors` from a `Vec<FieldError>`.
    ///
    /// # Panics
    ///
    /// Panics if the provided vec is empty.
    pub fn from_vec(errors: Vec<FieldError>) -> Self {
        Self(NonEmptyVec::from_vec(errors).expect("FieldErrors requires at least one error"))
    }

    /// Returns the number of errors in this collection.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns false since this collection is guaranteed non-empty.
    ///
    /// This method exists for API consistency but always returns false.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns an iterator over the contained errors.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Returns all errors recorded against the given attribute.
    pub fn for_attribute(&self, attribute: &str) -> Vec<&FieldError> {
        self.0.iter().filter(|e| e.attribute == attribute).collect()
    }

    /// Returns all errors with the specified error code.
    pub fn with_code(&self, code: &str) -> Vec<&FieldError> {
        self.0.iter().filter(|e| e.code == code).collect()
    }

    /// Returns the first error in the collection.
    pub fn first(&self) -> &FieldError {
        self.0.head()
    }

    /// Converts this collection into a `Vec<FieldError>`.
    pub fn into_vec(self) -> Vec<FieldError> {
        self.0.into_vec()
    }
}

impl Semigroup for FieldErrors {
    fn combine(self, other: Self) -> Self {
        FieldErrors(self.0.combine(other.0))
    }
}

impl Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation failed with {} error(s):", self.len())?;
        for (i, error) in self.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

impl IntoIterator for FieldErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_vec().into_iter()
    }
}

// All fields are owned; keep these assertions true if the types change.
const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<FieldError>();
    assert_sync::<FieldError>();
    assert_send::<FieldErrors>();
    assert_sync::<FieldErrors>();
};
