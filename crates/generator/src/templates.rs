//! Template loading and management
//!
//! A client is rendered from three fragments: `class` (the entry point),
//! `method` (included once per operation) and `request` (included by the
//! method fragment). Fragments use Tera syntax.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use swagger_pipeline_common::{
    FragmentSource, GeneratorKind, PipelineError, Result, TemplateConfig,
};
use tera::{Tera, Value};

use crate::view;

/// Template text for each fragment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateFragments {
    pub class: String,
    pub method: String,
    pub request: String,
}

impl TemplateFragments {
    /// Templates shipped for a generator kind, if it has any
    pub fn builtin(kind: GeneratorKind) -> Option<Self> {
        match kind {
            GeneratorKind::Custom => None,
            GeneratorKind::Node => Some(Self {
                class: include_str!("../templates/node-class.tera").to_string(),
                method: include_str!("../templates/node-method.tera").to_string(),
                request: include_str!("../templates/node-request.tera").to_string(),
            }),
            GeneratorKind::Angular => Some(Self {
                class: include_str!("../templates/angular-class.tera").to_string(),
                method: include_str!("../templates/angular-method.tera").to_string(),
                request: include_str!("../templates/angular-request.tera").to_string(),
            }),
        }
    }
}

/// Reads template fragments from disk
///
/// Relative fragment paths resolve against `base_dir`.
#[derive(Debug, Clone)]
pub struct TemplateLoader {
    base_dir: PathBuf,
}

impl TemplateLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Fragments for `kind`, with user configuration layered over built-in templates
    ///
    /// `Custom` has no built-in templates, so it fails with a configuration
    /// error when `config` is absent. That check runs before any file is read.
    pub fn fragments_for(
        &self,
        kind: GeneratorKind,
        config: Option<&TemplateConfig>,
    ) -> Result<TemplateFragments> {
        let defaults = match (TemplateFragments::builtin(kind), config) {
            (Some(builtin), _) => builtin,
            (None, Some(_)) => TemplateFragments::default(),
            (None, None) => {
                return Err(PipelineError::Configuration(format!(
                    "The '{}' generator requires a template",
                    kind
                )))
            }
        };

        match config {
            Some(config) => self.load_onto(config, defaults),
            None => Ok(defaults),
        }
    }

    /// Load a template configuration; absent fragments are empty
    pub fn load(&self, config: &TemplateConfig) -> Result<TemplateFragments> {
        self.load_onto(config, TemplateFragments::default())
    }

    fn load_onto(
        &self,
        config: &TemplateConfig,
        defaults: TemplateFragments,
    ) -> Result<TemplateFragments> {
        let mut fragments = defaults;

        match config {
            TemplateConfig::Single(path) if path.is_empty() => {}
            TemplateConfig::Single(path) => {
                fragments.class = self.read(path)?;
            }
            TemplateConfig::Fragments {
                class,
                method,
                request,
            } => {
                if let Some(source) = class.as_ref().filter(|s| !s.is_empty()) {
                    fragments.class = self.fragment(source)?;
                }
                if let Some(source) = method.as_ref().filter(|s| !s.is_empty()) {
                    fragments.method = self.fragment(source)?;
                }
                if let Some(source) = request.as_ref().filter(|s| !s.is_empty()) {
                    fragments.request = self.fragment(source)?;
                }
            }
        }

        Ok(fragments)
    }

    fn fragment(&self, source: &FragmentSource) -> Result<String> {
        match source {
            FragmentSource::Path(path) => self.read(path),
            FragmentSource::Inline { inline } => Ok(inline.clone()),
        }
    }

    fn read(&self, path: &str) -> Result<String> {
        let full_path = self.base_dir.join(Path::new(path));
        tracing::debug!(path = %full_path.display(), "loading template fragment");

        let text = fs::read_to_string(&full_path).map_err(|e| {
            PipelineError::TemplateLoad(format!(
                "Failed to read template {}: {}",
                full_path.display(),
                e
            ))
        })?;

        if text.is_empty() {
            return Err(PipelineError::TemplateLoad(format!(
                "Template {} is empty",
                full_path.display()
            )));
        }

        Ok(text)
    }
}

/// Compile fragments into a Tera engine with the client filters registered
pub fn build_engine(fragments: &TemplateFragments) -> Result<Tera> {
    let mut tera = Tera::default();

    tera.register_filter("upper_first", upper_first_filter);
    tera.register_filter("camel_case", camel_case_filter);

    tera.add_raw_templates(vec![
        ("request", fragments.request.as_str()),
        ("method", fragments.method.as_str()),
        ("class", fragments.class.as_str()),
    ])
    .map_err(|e| {
        PipelineError::TemplateLoad(format!("Failed to compile templates: {}", describe(&e)))
    })?;

    Ok(tera)
}

/// Render a Tera error with its causes
pub(crate) fn describe(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    message
}

/// Filter to upper-case the first letter
fn upper_first_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("upper_first filter expects a string"))?;

    Ok(Value::String(view::upper_first(s)))
}

/// Filter to convert to lowerCamelCase
fn camel_case_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("camel_case filter expects a string"))?;

    Ok(Value::String(view::camel_case(s)))
}
