//! Final artifact production
//!
//! Without code generation settings the dispatcher serializes the resolved
//! document. With settings it renders the `class` fragment of the selected
//! generator kind against a context built fresh for every document.

use serde_json::{Map, Value};
use swagger_pipeline_common::{CodegenOptions, Document, GeneratorKind, PipelineError, Result};
use tera::{Context, Tera};

use crate::projection;
use crate::templates::{self, TemplateFragments, TemplateLoader};
use crate::view::ClientView;

/// Context key holding the resolved document
pub const DOCUMENT_KEY: &str = "document";
/// Context key holding the resolved document as JSON text
pub const SWAGGER_KEY: &str = "swagger";
/// Context key holding the schema projection as JSON text
pub const SCHEMAS_KEY: &str = "JSONSchemas";

/// Immutable code generation settings
#[derive(Debug, Clone, PartialEq)]
pub struct CodegenSettings {
    pub kind: GeneratorKind,
    pub module_name: String,
    pub class_name: String,
    pub fragments: TemplateFragments,
    /// Auxiliary template data
    pub context: Map<String, Value>,
}

impl CodegenSettings {
    /// Settings from user options, loading fragments through `loader`
    pub fn from_options(options: &CodegenOptions, loader: &TemplateLoader) -> Result<Self> {
        let kind = options.generator_kind()?;
        let fragments = loader.fragments_for(kind, options.template())?;

        Ok(Self {
            kind,
            module_name: options.module_name().to_string(),
            class_name: options.class_name().to_string(),
            fragments,
            context: options.context.clone(),
        })
    }
}

/// How an artifact was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// JSON serialization of the resolved document
    Json,
    /// Client rendered by a generator
    Generated(GeneratorKind),
}

/// The single output of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub file_name: String,
    pub contents: String,
    pub mode: OutputMode,
}

/// Produces the final artifact for resolved documents
pub struct CodeGenDispatcher {
    generator: Option<Generator>,
}

struct Generator {
    settings: CodegenSettings,
    tera: Tera,
}

impl CodeGenDispatcher {
    /// Dispatcher that only serializes documents
    pub fn validate_only() -> Self {
        Self { generator: None }
    }

    /// Dispatcher for `settings`, compiling its fragments once
    pub fn new(settings: Option<CodegenSettings>) -> Result<Self> {
        let generator = match settings {
            Some(settings) => {
                let tera = templates::build_engine(&settings.fragments)?;
                Some(Generator { settings, tera })
            }
            None => None,
        };
        Ok(Self { generator })
    }

    pub fn mode(&self) -> OutputMode {
        match &self.generator {
            Some(generator) => OutputMode::Generated(generator.settings.kind),
            None => OutputMode::Json,
        }
    }

    pub fn settings(&self) -> Option<&CodegenSettings> {
        self.generator.as_ref().map(|g| &g.settings)
    }

    /// Produce the output text for a fully-resolved document
    pub fn render(&self, document: &Document) -> Result<String> {
        match &self.generator {
            None => Ok(serde_json::to_string(document)?),
            Some(generator) => generator.render(document),
        }
    }

    /// Produce the artifact named `file_name`
    pub fn generate(&self, file_name: &str, document: &Document) -> Result<GeneratedArtifact> {
        let contents = self.render(document)?;
        tracing::info!(file_name, mode = ?self.mode(), bytes = contents.len(), "artifact generated");

        Ok(GeneratedArtifact {
            file_name: file_name.to_string(),
            contents,
            mode: self.mode(),
        })
    }
}

impl Generator {
    fn render(&self, document: &Document) -> Result<String> {
        let context = self.context(document)?;
        self.tera.render("class", &context).map_err(|e| {
            PipelineError::Generation(format!(
                "Template error in {} generator: {}",
                self.settings.kind,
                templates::describe(&e)
            ))
        })
    }

    /// View model, then user data, then the fixed enrichment keys
    fn context(&self, document: &Document) -> Result<Context> {
        let settings = &self.settings;
        let view = ClientView::build(
            document,
            settings.kind,
            &settings.module_name,
            &settings.class_name,
        );

        let mut context = Context::from_serialize(&view).map_err(|e| {
            PipelineError::Generation(format!(
                "Failed to build template context: {}",
                templates::describe(&e)
            ))
        })?;
        context.insert("esnext", &true);

        for (key, value) in &settings.context {
            context.insert(key.as_str(), value);
        }

        let schemas = projection::project(document);
        context.insert(DOCUMENT_KEY, document);
        context.insert(SWAGGER_KEY, &serde_json::to_string(document)?);
        context.insert(SCHEMAS_KEY, &projection::to_json(&schemas)?);

        tracing::debug!(
            kind = %settings.kind,
            methods = view.methods.len(),
            "template context built"
        );

        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(class: &str) -> CodegenSettings {
        CodegenSettings {
            kind: GeneratorKind::Custom,
            module_name: "API".to_string(),
            class_name: "PetClient".to_string(),
            fragments: TemplateFragments {
                class: class.to_string(),
                ..Default::default()
            },
            context: Map::new(),
        }
    }

    fn document() -> Value {
        json!({
            "swagger": "2.0",
            "info": {"title": "Petstore", "version": "1"},
            "paths": {
                "/pets": {
                    "post": {
                        "operationId": "createPet",
                        "parameters": [{"name": "pet", "in": "body", "schema": {"type": "object"}}],
                        "responses": {"201": {"description": "created"}}
                    }
                }
            }
        })
    }

    #[test]
    fn test_validate_only_serializes_document() {
        let dispatcher = CodeGenDispatcher::validate_only();
        let doc = document();

        let artifact = dispatcher.generate("api.json", &doc).unwrap();
        assert_eq!(artifact.mode, OutputMode::Json);
        assert_eq!(artifact.file_name, "api.json");
        assert_eq!(serde_json::from_str::<Value>(&artifact.contents).unwrap(), doc);
    }

    #[test]
    fn test_context_exposes_enrichment_keys() {
        let dispatcher = CodeGenDispatcher::new(Some(settings(
            "{{ className }}|{{ esnext }}|{{ document.info.title }}|{{ JSONSchemas }}",
        )))
        .unwrap();

        let rendered = dispatcher.render(&document()).unwrap();
        assert_eq!(
            rendered,
            r#"PetClient|true|Petstore|{"/pets":{"post":{"request":{"type":"object"},"responses":{"201":{}}}}}"#
        );
    }

    #[test]
    fn test_user_context_cannot_replace_fixed_keys() {
        let mut settings = settings(
            r#"{{ owner }} {% if swagger != "x" %}fixed{% endif %} {{ className }}"#,
        );
        settings.context.insert("owner".to_string(), json!("pets-team"));
        settings.context.insert("swagger".to_string(), json!("x"));
        settings.context.insert("className".to_string(), json!("Renamed"));

        let rendered = CodeGenDispatcher::new(Some(settings))
            .unwrap()
            .render(&document())
            .unwrap();
        assert_eq!(rendered, "pets-team fixed Renamed");
    }

    #[test]
    fn test_method_fragment_sees_each_operation() {
        let mut settings = settings(r#"{% for method in methods %}{% include "method" %}{% endfor %}"#);
        settings.fragments.method = "{{ method.method }} {{ method.methodName }};".to_string();

        let rendered = CodeGenDispatcher::new(Some(settings))
            .unwrap()
            .render(&document())
            .unwrap();
        assert_eq!(rendered, "POST createPet;");
    }

    #[test]
    fn test_render_error_is_generation_error() {
        let dispatcher = CodeGenDispatcher::new(Some(settings("{{ missing.value }}"))).unwrap();
        assert!(matches!(
            dispatcher.render(&document()),
            Err(PipelineError::Generation(_))
        ));
    }

    #[test]
    fn test_builtin_node_client_renders() {
        let settings = CodegenSettings {
            kind: GeneratorKind::Node,
            fragments: TemplateFragments::builtin(GeneratorKind::Node).unwrap(),
            ..settings("")
        };

        let dispatcher = CodeGenDispatcher::new(Some(settings)).unwrap();
        assert_eq!(dispatcher.mode(), OutputMode::Generated(GeneratorKind::Node));

        let rendered = dispatcher.render(&document()).unwrap();
        assert!(rendered.contains("var PetClient = (function(){"));
        assert!(rendered.contains("PetClient.prototype.createPet = function(parameters){"));
        assert!(rendered.contains("method: 'POST'"));
        assert!(rendered.contains("exports.PetClient = PetClient;"));
    }
}
