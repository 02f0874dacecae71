//! Schema projection and client generation for Swagger Pipeline
//!
//! This crate turns a fully-resolved Swagger document into the pipeline's
//! final artifact: either the document's JSON text or a client rendered from
//! template fragments.
//!
//! ## Template Context
//!
//! Fragments are rendered with:
//! - the client view (`className`, `moduleName`, `domain`, `methods`, ...)
//! - `esnext`, always `true`
//! - user-supplied context entries
//! - `document`, `swagger` and `JSONSchemas`, which user entries cannot replace

mod dispatcher;
pub mod projection;
mod templates;
pub mod view;

pub use dispatcher::{
    CodeGenDispatcher, CodegenSettings, GeneratedArtifact, OutputMode, DOCUMENT_KEY, SCHEMAS_KEY,
    SWAGGER_KEY,
};
pub use projection::{project, OperationSchemas, ProjectionMap};
pub use templates::{build_engine, TemplateFragments, TemplateLoader};
pub use view::ClientView;
