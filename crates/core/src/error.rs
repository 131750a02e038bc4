//! Structured errors for the proximity engine
//!
//! Every failure the engine reports is local and synchronous. Errors carry:
//! - A numbered code for programmatic handling
//! - A human-readable message
//! - Optional context and recovery suggestion

use crate::transport::LocationError;
use roadlink_geo::GeoError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // General errors (1xxx)
    Unknown = 1000,
    Internal = 1001,

    // IO errors (2xxx)
    IoError = 2000,
    FileNotFound = 2001,
    PermissionDenied = 2002,

    // Configuration errors (3xxx)
    ConfigError = 3000,
    ConfigNotFound = 3001,
    ConfigParseError = 3002,
    ConfigValidationError = 3003,

    // Location errors (4xxx)
    LocationPermissionDenied = 4001,
    LocationUnavailable = 4002,
    LocationTimeout = 4003,

    // Validation errors (6xxx)
    ValidationError = 6000,
    InvalidCoordinate = 6001,
    EmptyMessage = 6002,
    InvalidRange = 6003,
    InvalidPeerId = 6004,
    SessionOffline = 6005,

    // Routing errors (7xxx)
    UnknownSender = 7001,

    // Lifecycle errors (8xxx)
    NotStarted = 8001,
}

impl ErrorCode {
    /// Get the numeric code
    #[must_use]
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a human-readable category
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self.code() / 1000 {
            1 => "General",
            2 => "IO",
            3 => "Configuration",
            4 => "Location",
            6 => "Validation",
            7 => "Routing",
            8 => "Lifecycle",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Main error type with rich context
#[derive(Error, Debug)]
pub struct Error {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional context
    pub context: Option<String>,
    /// Recovery suggestion
    pub suggestion: Option<String>,
    /// Source error
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, "\n  Context: {}", ctx)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  Suggestion: {}", suggestion)?;
        }
        Ok(())
    }
}

impl Error {
    /// Create a new error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            suggestion: None,
            source: None,
        }
    }

    /// Add context to the error
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add a recovery suggestion
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add a source error
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Malformed input: bad coordinates, empty text, non-positive range.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.code.category() == "Validation"
    }

    /// A remote message named a peer the registry is not tracking.
    #[must_use]
    pub fn is_unknown_sender(&self) -> bool {
        self.code == ErrorCode::UnknownSender
    }

    /// The operation needs an active feed.
    #[must_use]
    pub fn is_not_started(&self) -> bool {
        self.code == ErrorCode::NotStarted
    }

    // Convenience constructors

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn empty_message() -> Self {
        Self::new(ErrorCode::EmptyMessage, "Message text is empty")
            .with_suggestion("Type something other than whitespace before sending")
    }

    pub fn invalid_range(range_meters: f64) -> Self {
        Self::new(
            ErrorCode::InvalidRange,
            format!("Range must be a positive number of meters, got {}", range_meters),
        )
    }

    pub fn invalid_peer_id() -> Self {
        Self::new(ErrorCode::InvalidPeerId, "Peer id must not be empty")
    }

    pub fn offline() -> Self {
        Self::new(ErrorCode::SessionOffline, "Session is offline")
            .with_suggestion("Go online before sending messages")
    }

    pub fn unknown_sender(sender_id: &str) -> Self {
        Self::new(
            ErrorCode::UnknownSender,
            format!("Unknown sender: {}", sender_id),
        )
        .with_suggestion("Messages can only be attributed to peers currently in the registry")
    }

    pub fn not_started(operation: &str) -> Self {
        Self::new(
            ErrorCode::NotStarted,
            format!("Proximity feed is not started: cannot {}", operation),
        )
        .with_suggestion("Call start() with the observer's position first")
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    pub fn config_not_found(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(
            ErrorCode::ConfigNotFound,
            format!("Configuration file not found: {}", path.as_ref().display()),
        )
        .with_suggestion("Create a .roadlink.toml file or use --config to specify a path")
    }

    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigValidationError, message)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

// Implement From for common error types

impl From<GeoError> for Error {
    fn from(err: GeoError) -> Self {
        let code = match err {
            GeoError::InvalidLatitude(_) | GeoError::InvalidLongitude(_) => {
                ErrorCode::InvalidCoordinate
            }
            GeoError::InvalidDistance(_) => ErrorCode::ValidationError,
        };
        Error::new(code, err.to_string()).with_source(err)
    }
}

impl From<LocationError> for Error {
    fn from(err: LocationError) -> Self {
        let code = match err {
            LocationError::PermissionDenied => ErrorCode::LocationPermissionDenied,
            LocationError::Unavailable => ErrorCode::LocationUnavailable,
            LocationError::Timeout => ErrorCode::LocationTimeout,
        };
        Error::new(code, err.to_string()).with_source(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorCode::PermissionDenied,
            _ => ErrorCode::IoError,
        };
        Error::new(code, err.to_string()).with_source(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::new(ErrorCode::ConfigParseError, format!("TOML parse error: {}", err))
            .with_source(err)
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
    fn with_suggestion(self, suggestion: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_suggestion(self, suggestion: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_suggestion(suggestion))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::FileNotFound.to_string(), "E2001");
        assert_eq!(ErrorCode::UnknownSender.to_string(), "E7001");
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::IoError.category(), "IO");
        assert_eq!(ErrorCode::EmptyMessage.category(), "Validation");
        assert_eq!(ErrorCode::NotStarted.category(), "Lifecycle");
    }

    #[test]
    fn test_taxonomy_predicates() {
        assert!(Error::empty_message().is_validation());
        assert!(Error::invalid_range(-1.0).is_validation());
        assert!(Error::from(GeoError::InvalidLatitude(95.0)).is_validation());
        assert!(Error::unknown_sender("ghost").is_unknown_sender());
        assert!(!Error::unknown_sender("ghost").is_validation());
        assert!(Error::not_started("report position").is_not_started());
    }

    #[test]
    fn test_location_error_conversion() {
        let err = Error::from(LocationError::Timeout);
        assert_eq!(err.code, ErrorCode::LocationTimeout);
        assert_eq!(err.code.category(), "Location");
        assert!(!err.is_validation());
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::unknown_sender("driver_x").with_context("While routing inbound message");

        assert_eq!(err.code, ErrorCode::UnknownSender);
        assert!(err.context.is_some());
        assert!(err.suggestion.is_some());
        assert!(err.to_string().contains("driver_x"));
    }

    #[test]
    fn test_geo_error_conversion() {
        let err = Error::from(GeoError::InvalidLongitude(200.0)).with_context("During upsert");
        assert_eq!(err.code, ErrorCode::InvalidCoordinate);
        assert!(err.to_string().contains("Invalid longitude"));

        let err = Error::from(GeoError::InvalidDistance(-5.0));
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.is_validation());
        assert!(err.message.contains("Invalid distance"));
    }

    #[test]
    fn test_result_ext_context() {
        let result: Result<()> = Err(Error::offline());
        let err = result.context("Sending quick message").unwrap_err();
        assert_eq!(err.context.as_deref(), Some("Sending quick message"));
    }
}
