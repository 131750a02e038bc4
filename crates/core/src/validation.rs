//! Input validation
//!
//! Fluent checks shared by the registry, the feed, the router and the
//! configuration loader. Each check records a [`ValidationError`] instead of
//! failing fast so configuration problems can be reported together.
//!
//! # Example
//!
//! ```
//! use roadlink_core::validation::Validator;
//!
//! let result = Validator::new()
//!     .required("id", "driver_abc")
//!     .positive("range_meters", 5000.0)
//!     .validate();
//!
//! assert!(result.is_valid());
//! ```

use crate::error::{Error, ErrorCode, Result};
use roadlink_geo::GeoPoint;
use serde::{Deserialize, Serialize};

/// Validation error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field that failed validation
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
    /// Actual value (if applicable)
    pub actual: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// Create a new empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get all errors
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Add an error
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Convert to Result type, failing with `code` if any check failed
    pub fn into_result(self, code: ErrorCode) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            let messages: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
            Err(Error::new(
                code,
                format!("Validation failed: {}", messages.join("; ")),
            ))
        }
    }
}

/// Fluent validator builder
#[derive(Debug, Default)]
pub struct Validator {
    result: ValidationResult,
}

impl Validator {
    /// Create a new validator
    pub fn new() -> Self {
        Self::default()
    }

    fn fail(&mut self, field: &str, code: &str, message: String, actual: Option<String>) {
        self.result.add_error(ValidationError {
            field: field.to_string(),
            message,
            code: code.to_string(),
            actual,
        });
    }

    /// Validate that a field is not empty after trimming
    pub fn required(mut self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.fail(field, "REQUIRED", "Field is required".to_string(), None);
        }
        self
    }

    /// Validate that a number is finite and strictly positive
    pub fn positive(mut self, field: &str, value: f64) -> Self {
        if !value.is_finite() || value <= 0.0 {
            self.fail(
                field,
                "POSITIVE",
                "Must be a positive number".to_string(),
                Some(value.to_string()),
            );
        }
        self
    }

    /// Validate that an integer is not zero
    pub fn non_zero(mut self, field: &str, value: u64) -> Self {
        if value == 0 {
            self.fail(field, "NON_ZERO", "Must be greater than zero".to_string(), None);
        }
        self
    }

    /// Validate a numeric range (inclusive). Unordered values such as NaN fail.
    pub fn range<T: PartialOrd + std::fmt::Display>(
        mut self,
        field: &str,
        value: T,
        min: T,
        max: T,
    ) -> Self {
        if !(&min..=&max).contains(&&value) {
            self.fail(
                field,
                "RANGE",
                format!("Must be between {} and {}", min, max),
                Some(value.to_string()),
            );
        }
        self
    }

    /// Validate that `min` does not exceed `max`
    pub fn ordered<T: PartialOrd + std::fmt::Display>(mut self, field: &str, min: T, max: T) -> Self {
        if min > max {
            self.fail(
                field,
                "ORDERED",
                format!("Lower bound {} exceeds upper bound {}", min, max),
                None,
            );
        }
        self
    }

    /// Validate that a point lies on the globe
    pub fn coordinate(mut self, field: &str, point: &GeoPoint) -> Self {
        if let Err(err) = point.validate() {
            self.fail(field, "COORDINATE", err.to_string(), Some(point.to_string()));
        }
        self
    }

    /// Complete validation and return result
    pub fn validate(self) -> ValidationResult {
        self.result
    }
}

/// Trims message text, rejecting text that is empty or only whitespace.
pub fn message_text(text: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::empty_message());
    }
    Ok(trimmed.to_string())
}

/// Checks a visibility range in meters.
pub fn range_meters(range: f64) -> Result<f64> {
    if range.is_finite() && range > 0.0 {
        Ok(range)
    } else {
        Err(Error::invalid_range(range))
    }
}
