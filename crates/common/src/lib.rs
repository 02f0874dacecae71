//! Common types and utilities for Swagger Pipeline
//!
//! This crate contains the error taxonomy, document helpers, validation
//! result types and configuration structures shared by the parser,
//! generator, and CLI components.

pub mod config;
pub mod document;
pub mod validation;

pub use config::{CodegenOptions, FragmentSource, GeneratorKind, PipelineOptions, TemplateConfig};
pub use document::{Document, REF_KEY};
pub use validation::{Severity, ValidationEntry, ValidationResult};

use thiserror::Error;

/// Errors that can occur while processing a Swagger document
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Template load error: {0}")]
    TemplateLoad(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unable to resolve reference {reference}")]
    ReferenceResolution {
        reference: String,
        #[source]
        cause: ResolutionCause,
    },

    #[error("The Swagger schema is invalid ({} errors, {} warnings)", .0.errors.len(), .0.warnings.len())]
    SchemaInvalid(ValidationResult),

    #[error("Validator failure: {0}")]
    ValidatorInternal(String),

    #[error("Unknown generator kind: {0}")]
    UnknownGeneratorKind(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Underlying reason a `$ref` pointer could not be resolved
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionCause {
    #[error("target {0} does not exist")]
    MissingTarget(String),

    #[error("circular reference chain: {0}")]
    Circular(String),

    #[error("failed to load {location}: {message}")]
    Load { location: String, message: String },

    #[error("malformed reference: {0}")]
    Malformed(String),
}

impl PipelineError {
    /// Build a resolution error for `reference` with the given cause
    pub fn unresolved(reference: impl Into<String>, cause: ResolutionCause) -> Self {
        PipelineError::ReferenceResolution {
            reference: reference.into(),
            cause,
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
