//! Swagger Pipeline
//!
//! Loads a Swagger 2.0 document, resolves its references, validates it and
//! produces a single artifact: the resolved document as JSON, or a client
//! generated from templates.
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use swagger_pipeline::{DocumentSource, Pipeline, PipelineOptions};
//!
//! let options = PipelineOptions {
//!     filename: Some("petstore.json".to_string()),
//!     codegen: None,
//! };
//! let pipeline = Pipeline::new(&options, Path::new("."))?;
//! let artifact = pipeline.process(DocumentSource::Path("petstore.yaml".into()))?;
//! println!("{}", artifact.contents);
//! # Ok::<(), swagger_pipeline::PipelineError>(())
//! ```

pub mod overrides;
pub mod pipeline;
pub mod report;

pub use overrides::{parse_context_entry, Overrides};
pub use pipeline::{DiagnosticSink, Pipeline};
pub use swagger_pipeline_common::{PipelineError, PipelineOptions, ValidationResult};
pub use swagger_pipeline_generator::{GeneratedArtifact, OutputMode};
pub use swagger_pipeline_parser::DocumentSource;
