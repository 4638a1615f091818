// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Field-addressed validation errors.
//!
//! Validation never stops at the first problem. Every violation is recorded
//! as a [`FieldError`] carrying the JSON path of the offending field, and the
//! whole set is returned as one [`ValidationErrors`] so a user can fix all of
//! them in a single round-trip.
//!
//! # Example
//!
//! ```rust
//! use mysql_operator::field_errors::{FieldError, ValidationErrors};
//!
//! let mut errs = ValidationErrors::new();
//! errs.push(FieldError::required("spec.executor", "executor must be set"));
//! errs.push(FieldError::invalid("spec.replicas", "10", "must be between 1 and 9"));
//!
//! assert_eq!(errs.len(), 2);
//! assert!(errs.contains_field("spec.replicas"));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Category of a single field violation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldErrorKind {
    /// A required value is missing or empty
    Required,
    /// The value is present but unacceptable
    Invalid,
    /// The value is not one of the supported choices
    NotSupported,
    /// The value exceeds a length limit
    TooLong,
    /// The value is not allowed in this combination
    Forbidden,
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Required => "Required value",
            Self::Invalid => "Invalid value",
            Self::NotSupported => "Unsupported value",
            Self::TooLong => "Too long",
            Self::Forbidden => "Forbidden",
        };
        f.write_str(s)
    }
}

/// One violation of a validation rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted JSON path of the field, e.g. `spec.backupTemplate.executor.name`
    pub field: String,
    /// Violation category
    pub kind: FieldErrorKind,
    /// Offending value rendered as text, when there is one
    pub value: Option<String>,
    /// Human-readable explanation
    pub detail: String,
}

impl FieldError {
    fn new(
        field: impl Into<String>,
        kind: FieldErrorKind,
        value: Option<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            kind,
            value,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn required(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(field, FieldErrorKind::Required, None, detail)
    }

    #[must_use]
    pub fn invalid(
        field: impl Into<String>,
        value: impl fmt::Display,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(
            field,
            FieldErrorKind::Invalid,
            Some(value.to_string()),
            detail,
        )
    }

    /// Value is not in `supported`; the detail lists the accepted values.
    #[must_use]
    pub fn not_supported(
        field: impl Into<String>,
        value: impl fmt::Display,
        supported: &[String],
    ) -> Self {
        let detail = format!("supported values: {}", quoted_list(supported));
        Self::new(
            field,
            FieldErrorKind::NotSupported,
            Some(value.to_string()),
            detail,
        )
    }

    #[must_use]
    pub fn too_long(field: impl Into<String>, value: impl fmt::Display, max: usize) -> Self {
        Self::new(
            field,
            FieldErrorKind::TooLong,
            Some(value.to_string()),
            format!("must have at most {max} characters"),
        )
    }

    #[must_use]
    pub fn forbidden(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(field, FieldErrorKind::Forbidden, None, detail)
    }

    /// Message without the field path, as used in the per-field map view.
    #[must_use]
    pub fn message(&self) -> String {
        match &self.value {
            Some(value) => format!("{}: \"{value}\": {}", self.kind, self.detail),
            None => format!("{}: {}", self.kind, self.detail),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message())
    }
}

fn quoted_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!("\"{v}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Ordered aggregate of every violation found on one object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Error)]
#[error("{}", summarize(.errors))]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

/// One violation as is, several as a bracketed list.
fn summarize(errors: &[FieldError]) -> String {
    match errors {
        [] => "no validation errors".to_string(),
        [only] => only.to_string(),
        many => format!(
            "[{}]",
            many.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        ),
    }
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: FieldError) {
        self.errors.push(err);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.errors.iter()
    }

    /// Violations in the order they were found.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Whether any violation is reported against `field`.
    #[must_use]
    pub fn contains_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Field path to messages view.
    ///
    /// Messages for the same field keep their discovery order.
    #[must_use]
    pub fn by_field(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for err in &self.errors {
            map.entry(err.field.clone()).or_default().push(err.message());
        }
        map
    }

    /// `Ok(())` when nothing was collected, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns the aggregate itself when it holds at least one violation.
    pub fn into_result(self) -> Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Extend<FieldError> for ValidationErrors {
    fn extend<T: IntoIterator<Item = FieldError>>(&mut self, iter: T) {
        self.errors.extend(iter);
    }
}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

#[cfg(test)]
#[path = "field_errors_tests.rs"]
mod field_errors_tests;
