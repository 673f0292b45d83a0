//! Error types for schema reading, translation and host evaluation

use std::path::PathBuf;
use thiserror::Error;

/// Source location information for error messages
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLocation {
    pub file: Option<PathBuf>,
    pub line: u32,
    pub column: u32,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}:{}:{}", file.display(), self.line, self.column)
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

/// Main error type for the crate.
///
/// The variants follow where a fault is detected: while reading text, while
/// resolving a schema, while lowering a typed expression, or inside the host.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("SyntaxError: {message} at {location}")]
    SyntaxError {
        message: String,
        location: SourceLocation,
    },

    /// Schema-authoring defect (duplicate or inconsistent members, unknown types, ...)
    #[error("SchemaError: {message}{}", format_location(.location))]
    SchemaError {
        message: String,
        location: Option<SourceLocation>,
    },

    /// A typed expression that cannot be lowered (class objects, bad arity, unknown members)
    #[error("TranslationError: {message}")]
    TranslationError { message: String },

    /// Raised by the host environment and passed through untouched
    #[error("HostError: {message}")]
    Host { message: String },

    #[error("ConfigError: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn format_location(location: &Option<SourceLocation>) -> String {
    match location {
        Some(loc) => format!(" at {}", loc),
        None => String::new(),
    }
}

impl BindError {
    pub fn syntax_error(message: impl Into<String>, line: u32, column: u32) -> Self {
        BindError::SyntaxError {
            message: message.into(),
            location: SourceLocation {
                file: None,
                line,
                column,
            },
        }
    }

    pub fn schema_error(message: impl Into<String>) -> Self {
        BindError::SchemaError {
            message: message.into(),
            location: None,
        }
    }

    pub fn schema_error_at(message: impl Into<String>, line: u32, column: u32) -> Self {
        BindError::SchemaError {
            message: message.into(),
            location: Some(SourceLocation {
                file: None,
                line,
                column,
            }),
        }
    }

    pub fn translation_error(message: impl Into<String>) -> Self {
        BindError::TranslationError {
            message: message.into(),
        }
    }

    pub fn host_error(message: impl Into<String>) -> Self {
        BindError::Host {
            message: message.into(),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        BindError::Config {
            message: message.into(),
        }
    }

    /// Attach a file name to syntax and schema errors that carry a location
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        match &mut self {
            BindError::SyntaxError { location, .. } => location.file = Some(path.into()),
            BindError::SchemaError {
                location: Some(location),
                ..
            } => location.file = Some(path.into()),
            _ => {}
        }
        self
    }
}
