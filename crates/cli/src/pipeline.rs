//! Pipeline orchestration
//!
//! A [`Pipeline`] is configured once and then processes any number of
//! documents independently:
//!
//! 1. resolve external references
//! 2. validate, reporting every error and warning
//! 3. abort if there is at least one error
//! 4. resolve the remaining internal references
//! 5. produce the artifact (JSON text or a generated client)

use std::path::Path;

use swagger_pipeline_common::{PipelineError, PipelineOptions, Result, ValidationResult};
use swagger_pipeline_generator::{
    CodeGenDispatcher, CodegenSettings, GeneratedArtifact, OutputMode, TemplateLoader,
};
use swagger_pipeline_parser::{
    DefaultSourceLoader, DocumentSource, ReferenceResolver, SchemaValidator, SourceLoader,
    Swagger2Validator,
};

use crate::report;

/// Receives the validation outcome of every processed document
pub type DiagnosticSink = Box<dyn Fn(&ValidationResult) + Send + Sync>;

/// Configured document pipeline
pub struct Pipeline<L = DefaultSourceLoader, V = Swagger2Validator> {
    file_name: String,
    resolver: ReferenceResolver<L>,
    validator: V,
    dispatcher: CodeGenDispatcher,
    diagnostics: DiagnosticSink,
}

impl Pipeline {
    /// Configure a pipeline reading files and HTTP locations
    ///
    /// `base_dir` anchors relative template paths.
    pub fn new(options: &PipelineOptions, base_dir: &Path) -> Result<Self> {
        Self::with_parts(
            options,
            base_dir,
            DefaultSourceLoader::new(),
            Swagger2Validator::new(),
        )
    }
}

impl<L: SourceLoader, V: SchemaValidator> Pipeline<L, V> {
    /// Configure a pipeline with a custom source loader and validator
    ///
    /// Configuration errors are reported before any template is read.
    pub fn with_parts(
        options: &PipelineOptions,
        base_dir: &Path,
        loader: L,
        validator: V,
    ) -> Result<Self> {
        let file_name = options.file_name()?.to_string();

        let settings = match &options.codegen {
            Some(codegen) => {
                let loader = TemplateLoader::new(base_dir);
                Some(CodegenSettings::from_options(codegen, &loader)?)
            }
            None => None,
        };
        let dispatcher = CodeGenDispatcher::new(settings)?;

        tracing::debug!(file_name = %file_name, mode = ?dispatcher.mode(), "pipeline configured");

        Ok(Self {
            file_name,
            resolver: ReferenceResolver::with_loader(loader),
            validator,
            dispatcher,
            diagnostics: Box::new(report::emit),
        })
    }

    /// Replace the default stderr diagnostic report
    pub fn with_diagnostics(mut self, sink: DiagnosticSink) -> Self {
        self.diagnostics = sink;
        self
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mode(&self) -> OutputMode {
        self.dispatcher.mode()
    }

    /// Run one document through every stage
    ///
    /// Nothing is produced unless every stage succeeds.
    pub fn process(&self, source: DocumentSource) -> Result<GeneratedArtifact> {
        let loaded = self.resolver.resolve_external(source)?;
        tracing::info!(origin = %loaded.origin, "external references resolved");

        let result = self.validator.validate(&loaded.document)?;
        if !result.is_empty() {
            (self.diagnostics)(&result);
        }
        if !result.is_valid() {
            return Err(PipelineError::SchemaInvalid(result));
        }
        if !result.warnings.is_empty() {
            tracing::warn!(warnings = result.warnings.len(), "schema has warnings");
        }

        let resolved = self.resolver.resolve_all(&loaded)?;
        tracing::info!(origin = %resolved.origin, "document fully resolved");

        self.dispatcher.generate(&self.file_name, &resolved.document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use swagger_pipeline_common::CodegenOptions;

    fn buffer(text: &str) -> DocumentSource {
        DocumentSource::Buffer {
            contents: text.as_bytes().to_vec(),
            origin: "/specs/api.json".into(),
        }
    }

    fn options(codegen: Option<CodegenOptions>) -> PipelineOptions {
        PipelineOptions {
            filename: Some("api.json".to_string()),
            codegen,
        }
    }

    #[test]
    fn test_filename_is_required() {
        let result = Pipeline::new(&PipelineOptions::default(), Path::new("."));
        assert!(matches!(result, Err(PipelineError::Configuration(_))));
    }

    #[test]
    fn test_custom_kind_without_template_is_configuration_error() {
        let codegen = CodegenOptions {
            kind: Some("custom".to_string()),
            ..Default::default()
        };
        let result = Pipeline::new(&options(Some(codegen)), Path::new("/nonexistent"));
        assert!(matches!(result, Err(PipelineError::Configuration(_))));
    }

    #[test]
    fn test_stream_input_is_rejected() {
        let pipeline = Pipeline::new(&options(None), Path::new(".")).unwrap();
        let result = pipeline.process(DocumentSource::Stream(Box::new(std::io::empty())));
        assert!(matches!(result, Err(PipelineError::Parse(_))));
    }

    #[test]
    fn test_invalid_schema_reports_then_aborts() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let pipeline = Pipeline::new(&options(None), Path::new("."))
            .unwrap()
            .with_diagnostics(Box::new(move |result| {
                sink.lock().unwrap().push(result.clone());
            }));

        let result = pipeline.process(buffer(r#"{"swagger": "2.0", "paths": {}}"#));
        match result {
            Err(PipelineError::SchemaInvalid(validation)) => {
                assert_eq!(validation.errors.len(), 1);
                assert_eq!(validation.errors[0].message, "Missing required property: info");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_valid_document_is_silent() {
        let seen = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&seen);
        let pipeline = Pipeline::new(&options(None), Path::new("."))
            .unwrap()
            .with_diagnostics(Box::new(move |_| *sink.lock().unwrap() += 1));

        let artifact = pipeline
            .process(buffer(
                r#"{"swagger": "2.0", "info": {"title": "t", "version": "1"}, "paths": {}}"#,
            ))
            .unwrap();
        assert_eq!(artifact.mode, OutputMode::Json);
        assert_eq!(*seen.lock().unwrap(), 0);
    }
}
