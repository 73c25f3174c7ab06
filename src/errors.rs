//! Error handling for the bytecode inspector.
//!
//! Decoding and disassembly never fail: unknown opcodes and short trailing
//! windows are ordinary input. The errors in this module cover the fallible
//! edges of the crate instead, such as render setup, configuration loading,
//! ELF lookup and I/O.

use thiserror::Error;
use std::fmt;

/// Main error type for the inspector.
///
/// Each variant corresponds to a category of failure, with a descriptive
/// message providing details about the specific error.
#[derive(Error, Debug)]
pub enum InspectorError {
    /// A render was requested with a dimension outside the supported range.
    #[error("Invalid dimension: base size {base_size} (supported range 1..={max})")]
    InvalidDimension {
        base_size: usize,
        max: usize,
    },

    /// Input bytes that cannot be used for the requested operation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Errors locating or parsing an ELF image inside account data.
    #[error("ELF error: {0}")]
    Elf(String),

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failures of the background render task itself.
    #[error("Render error: {0}")]
    Render(String),

    /// Errors related to file I/O, such as file not found or permission denied.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failures.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64 account data that does not decode.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Fallback for other errors that don't fit into the above categories.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<base64::DecodeError> for InspectorError {
    fn from(err: base64::DecodeError) -> Self {
        InspectorError::Decode(err.to_string())
    }
}

/// Result type alias for the inspector.
pub type InspectorResult<T> = Result<T, InspectorError>;

/// Context information for errors.
///
/// Records which component was running which operation, and on how large a
/// buffer, when an error was raised.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Length of the account buffer being processed, if applicable.
    pub buffer_len: Option<usize>,

    /// Component where the error occurred (e.g., "render").
    pub component: String,

    /// Operation being performed when the error occurred (e.g., "plan").
    pub operation: String,

    /// Additional context details, such as dimensions or paths.
    pub details: Option<String>,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "In {} while {}", self.component, self.operation)?;
        if let Some(len) = self.buffer_len {
            write!(f, " on {} bytes", len)?;
        }
        if let Some(details) = &self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorExt<T> {
    /// Add context to an error.
    ///
    /// Errors that already are an [`InspectorError`] keep their variant;
    /// foreign errors are classified by their message.
    fn with_context(self, context: ErrorContext) -> InspectorResult<T>;

    /// Add component and operation context to an error.
    fn with_simple_context(self, component: &str, operation: &str) -> InspectorResult<T>;
}

impl<T, E: std::error::Error + 'static> ErrorExt<T> for Result<T, E> {
    fn with_context(self, context: ErrorContext) -> InspectorResult<T> {
        self.map_err(|e| {
            let error_msg = format!("{}: {}", context, e);
            let boxed: Box<dyn std::error::Error + 'static> = Box::new(e);
            let boxed = match boxed.downcast::<InspectorError>() {
                Ok(inspector_err) => return *inspector_err,
                Err(e) => e,
            };
            // I/O failures keep their kind
            match boxed.downcast::<std::io::Error>() {
                Ok(io_err) => InspectorError::Io(std::io::Error::new(io_err.kind(), error_msg)),
                Err(e) => match e.to_string().to_lowercase() {
                    s if s.contains("elf") || s.contains("section") =>
                        InspectorError::Elf(error_msg),
                    s if s.contains("config") =>
                        InspectorError::Config(error_msg),
                    s if s.contains("base64") || s.contains("invalid byte") =>
                        InspectorError::Decode(error_msg),
                    s if s.contains("render") || s.contains("channel") =>
                        InspectorError::Render(error_msg),
                    _ => InspectorError::Unknown(error_msg),
                }
            }
        })
    }

    fn with_simple_context(self, component: &str, operation: &str) -> InspectorResult<T> {
        self.with_context(ErrorContext {
            buffer_len: None,
            component: component.to_string(),
            operation: operation.to_string(),
            details: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_display() {
        let context = ErrorContext {
            buffer_len: Some(64),
            component: "render".to_string(),
            operation: "planning".to_string(),
            details: Some("base_size=0".to_string()),
        };
        assert_eq!(context.to_string(), "In render while planning on 64 bytes (base_size=0)");
    }

    #[test]
    fn test_inspector_error_keeps_variant() {
        let result: Result<(), InspectorError> = Err(InspectorError::InvalidDimension { base_size: 0, max: 16 });
        let err = result.with_simple_context("render", "planning").unwrap_err();
        assert!(matches!(err, InspectorError::InvalidDimension { base_size: 0, max: 16 }));
    }

    #[test]
    fn test_foreign_error_is_classified() {
        let result: Result<(), std::fmt::Error> = Err(std::fmt::Error);
        let err = result.with_simple_context("render", "formatting").unwrap_err();
        assert!(matches!(err, InspectorError::Unknown(_)));
    }

    #[test]
    fn test_io_error_keeps_kind() {
        let result: Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "config denied",
        ));
        match result.with_simple_context("config", "loading").unwrap_err() {
            InspectorError::Io(err) => {
                assert_eq!(err.kind(), std::io::ErrorKind::PermissionDenied);
                assert!(err.to_string().starts_with("In config while loading"));
            }
            other => panic!("expected an I/O error, got {:?}", other),
        }
    }
}
