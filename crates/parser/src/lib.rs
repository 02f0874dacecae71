//! Document loading, reference resolution and validation
//!
//! This crate turns a Swagger 2.0 source into a checked document tree:
//!
//! - [`source`] reads JSON or YAML from a file, a buffer or a remote location
//! - [`resolver`] inlines `$ref` targets, either external ones only or all of them
//! - [`validator`] checks the structural and semantic rules of Swagger 2.0
//!
//! ## Resolution Strategy
//!
//! Validation needs internal references intact (it reports dangling and
//! unused ones), so the usual sequence is:
//! 1. [`ReferenceResolver::resolve_external`] on the source
//! 2. [`SchemaValidator::validate`] on the result
//! 3. [`ReferenceResolver::resolve_all`] once the document is known to be valid

pub mod pointer;
pub mod resolver;
pub mod source;
pub mod validator;

pub use resolver::{ReferenceResolver, ResolutionDepth};
#[cfg(feature = "remote")]
pub use source::HttpSourceLoader;
pub use source::{
    load_document, location_from_path, parse_document, DefaultSourceLoader, DocumentSource,
    FileSourceLoader, LoadedDocument, SourceLoader,
};
pub use validator::{SchemaValidator, Swagger2Validator, HTTP_METHODS};

use std::path::Path;

use swagger_pipeline_common::{Result, ValidationResult};

/// Load a document from disk, inline its external references and validate it
///
/// Returns the externally-resolved document together with the validation
/// outcome; internal references are left in place.
pub fn validate_file(path: &Path) -> Result<(LoadedDocument, ValidationResult)> {
    let resolver = ReferenceResolver::new();
    let loaded = resolver.resolve_external(DocumentSource::Path(path.to_path_buf()))?;
    let result = Swagger2Validator::new().validate(&loaded.document)?;
    Ok((loaded, result))
}
