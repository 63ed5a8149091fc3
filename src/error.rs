//! Error types for the binding generator
//!
//! This module provides structured error types using thiserror. Recoverable
//! problems (a base class that cannot be found, a typedef whose template is
//! missing) are not errors: they become exclusion flags plus a diagnostic, see
//! [`crate::resolve::Diagnostic`]. Everything here aborts the run.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pipeline operations
#[derive(Error, Debug)]
pub enum BindError {
    /// File system errors
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Declaration dump could not be decoded
    #[error("Invalid declaration dump '{path}': {source}")]
    InvalidDeclarations {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Front end failures
    #[error("Front end failed on '{path}': {source}")]
    Frontend {
        path: PathBuf,
        source: FrontendError,
    },

    /// A base specifier references a declaration kind outside {class, typedef, template}
    #[error(
        "Unknown base kind '{kind}' for base '{base}' of '{entity}'. The declaration model does not understand this construct"
    )]
    UnknownBaseKind {
        entity: String,
        base: String,
        kind: String,
    },

    /// A template registration would be emitted with an empty parameter
    #[error("Empty template parameter in '{entity}' (template '{template}')")]
    EmptyTemplateParameter { entity: String, template: String },

    /// Configuration errors
    #[error("Invalid configuration: {reason}")]
    ConfigError { reason: String },

    /// Emission could not be completed
    #[error("Failed to emit bindings into '{path}': {reason}")]
    EmitFailed { path: PathBuf, reason: String },
}

impl BindError {
    /// Get a stable status code for this error type.
    pub fn status_code(&self) -> String {
        match self {
            Self::FileRead { .. } => "FILE_READ_ERROR",
            Self::FileWrite { .. } => "FILE_WRITE_ERROR",
            Self::InvalidDeclarations { .. } => "INVALID_DECLARATIONS",
            Self::Frontend { .. } => "FRONTEND_ERROR",
            Self::UnknownBaseKind { .. } => "UNKNOWN_BASE_KIND",
            Self::EmptyTemplateParameter { .. } => "EMPTY_TEMPLATE_PARAMETER",
            Self::ConfigError { .. } => "CONFIG_ERROR",
            Self::EmitFailed { .. } => "EMIT_FAILED",
        }
        .to_string()
    }

    /// Whether this error is a violation of the declaration model (as opposed to I/O)
    pub fn is_model_violation(&self) -> bool {
        matches!(
            self,
            Self::UnknownBaseKind { .. } | Self::EmptyTemplateParameter { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::UnknownBaseKind { .. } => vec![
                "Exclude the offending class in [exclude] classes or [modules.<name>] excluded_classes",
                "Regenerate from scratch once the configuration is fixed, partial output is invalid",
            ],
            Self::EmptyTemplateParameter { .. } => vec![
                "Exclude the typedef or class that instantiates the template",
                "Check the front end reports template arguments for this declaration",
            ],
            Self::InvalidDeclarations { .. } => vec![
                "Re-export the declaration dump, it must be a JSON array or JSON lines",
            ],
            Self::ConfigError { .. } => vec![
                "Run 'bindforge config' to inspect the effective settings",
                "Run 'bindforge init --force' to regenerate the settings file",
            ],
            Self::FileRead { .. } => vec![
                "Check that the file exists and you have read permissions",
            ],
            Self::FileWrite { .. } | Self::EmitFailed { .. } => vec![
                "Check disk space and permissions of the output directory",
            ],
            _ => vec![],
        }
    }
}

/// Errors specific to front end parsing
#[derive(Error, Debug)]
pub enum FrontendError {
    #[error("Failed to initialize {language} parser: {reason}")]
    ParserInit { language: String, reason: String },

    #[error("Failed to parse header at line {line}, column {column}: {reason}")]
    SyntaxError {
        line: u32,
        column: u32,
        reason: String,
    },
}

/// Result type alias for pipeline operations
pub type BindResult<T> = Result<T, BindError>;

/// Result type alias for front end operations
pub type FrontendResult<T> = Result<T, FrontendError>;
