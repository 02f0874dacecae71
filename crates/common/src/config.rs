//! Pipeline configuration
//!
//! Options may be assembled in code, from CLI flags, or loaded from a YAML or
//! JSON config file. Key names follow the camelCase convention used by
//! Swagger tooling (`moduleName`, `className`).

use crate::{PipelineError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::Path;

/// Default module and class name for generated clients
pub const DEFAULT_API_NAME: &str = "API";

/// Root pipeline options
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOptions {
    /// Output file name (required)
    #[serde(default)]
    pub filename: Option<String>,

    /// Code generation settings; absent means validate-only mode
    #[serde(default)]
    pub codegen: Option<CodegenOptions>,
}

/// Code generation settings as configured by the user
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodegenOptions {
    /// Generator kind (`custom`, `node`, `angular`); defaults to `custom`
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    /// Module name exposed to templates; defaults to `API`
    #[serde(default)]
    pub module_name: Option<String>,

    /// Class name exposed to templates; defaults to `API`
    #[serde(default)]
    pub class_name: Option<String>,

    /// Template fragments
    #[serde(default)]
    pub template: Option<TemplateConfig>,

    /// Auxiliary key/value data exposed to templates
    #[serde(default, alias = "mustache")]
    pub context: Map<String, Value>,
}

/// Template configuration: a single class fragment or up to three fragments
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TemplateConfig {
    /// Path to the class fragment only
    Single(String),

    /// Individually configured fragments; absent ones default to empty text
    Fragments {
        #[serde(default, deserialize_with = "fragment_or_absent")]
        class: Option<FragmentSource>,
        #[serde(default, deserialize_with = "fragment_or_absent")]
        method: Option<FragmentSource>,
        #[serde(default, deserialize_with = "fragment_or_absent")]
        request: Option<FragmentSource>,
    },
}

/// Where a template fragment's text comes from
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FragmentSource {
    /// File path, relative to the configuration base directory
    Path(String),

    /// Literal template text
    Inline { inline: String },
}

impl FragmentSource {
    /// An empty path stands for an absent fragment
    pub fn is_empty(&self) -> bool {
        matches!(self, FragmentSource::Path(path) if path.is_empty())
    }
}

/// Fragment values that are neither a path nor `{inline}`, and empty paths,
/// leave the fragment unset
fn fragment_or_absent<'de, D>(deserializer: D) -> std::result::Result<Option<FragmentSource>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value::<FragmentSource>(value)
        .ok()
        .filter(|source| !source.is_empty()))
}

impl TemplateConfig {
    /// Whether this configuration supplies anything at all
    pub fn is_supplied(&self) -> bool {
        match self {
            TemplateConfig::Single(path) => !path.is_empty(),
            TemplateConfig::Fragments { .. } => true,
        }
    }
}

/// Closed set of code generation strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneratorKind {
    /// User templates only
    Custom,
    /// Built-in Node.js client templates
    Node,
    /// Built-in AngularJS service templates
    Angular,
}

impl GeneratorKind {
    pub const ALL: [GeneratorKind; 3] = [
        GeneratorKind::Custom,
        GeneratorKind::Node,
        GeneratorKind::Angular,
    ];

    /// Parse a configured kind
    ///
    /// The first character is upper-cased and the result must name an entry
    /// point exactly, so `custom` and `Custom` are accepted but `CUSTOM` is not.
    pub fn parse(kind: &str) -> Result<Self> {
        let mut chars = kind.chars();
        let entry_point = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => return Err(PipelineError::UnknownGeneratorKind(kind.to_string())),
        };

        Self::ALL
            .into_iter()
            .find(|candidate| candidate.entry_point() == entry_point)
            .ok_or_else(|| PipelineError::UnknownGeneratorKind(kind.to_string()))
    }

    /// Entry point name of the strategy
    pub fn entry_point(&self) -> &'static str {
        match self {
            GeneratorKind::Custom => "Custom",
            GeneratorKind::Node => "Node",
            GeneratorKind::Angular => "Angular",
        }
    }

    /// Whether the strategy ships its own templates
    pub fn has_builtin_templates(&self) -> bool {
        !matches!(self, GeneratorKind::Custom)
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entry_point().to_lowercase())
    }
}

impl PipelineOptions {
    /// Load options from a YAML or JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            serde_json::from_str(&content).map_err(|e| {
                PipelineError::Configuration(format!(
                    "Failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            })
        } else {
            serde_yaml::from_str(&content).map_err(|e| {
                PipelineError::Configuration(format!(
                    "Failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            })
        }
    }

    /// Required output file name
    pub fn file_name(&self) -> Result<&str> {
        match self.filename.as_deref() {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(PipelineError::Configuration(
                "A file name is required".to_string(),
            )),
        }
    }
}

impl CodegenOptions {
    /// Configured generator kind, defaulting to `custom`
    pub fn generator_kind(&self) -> Result<GeneratorKind> {
        match self.kind.as_deref() {
            None | Some("") => Ok(GeneratorKind::Custom),
            Some(kind) => GeneratorKind::parse(kind),
        }
    }

    pub fn module_name(&self) -> &str {
        non_empty_or_default(self.module_name.as_deref())
    }

    pub fn class_name(&self) -> &str {
        non_empty_or_default(self.class_name.as_deref())
    }

    /// Supplied template configuration, ignoring an empty single path
    pub fn template(&self) -> Option<&TemplateConfig> {
        self.template.as_ref().filter(|t| t.is_supplied())
    }
}

fn non_empty_or_default(value: Option<&str>) -> &str {
    match value {
        Some(name) if !name.is_empty() => name,
        _ => DEFAULT_API_NAME,
    }
}
