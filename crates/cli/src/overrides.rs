//! Command-line overrides for pipeline options

use serde_json::Value;
use swagger_pipeline_common::{CodegenOptions, FragmentSource, PipelineOptions, TemplateConfig};

/// Option values given as flags; each one replaces the configured value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub filename: Option<String>,
    pub codegen: Option<String>,
    pub module_name: Option<String>,
    pub class_name: Option<String>,
    pub template: Option<String>,
    pub class_template: Option<String>,
    pub method_template: Option<String>,
    pub request_template: Option<String>,
    pub context: Vec<(String, Value)>,
}

impl Overrides {
    fn touches_codegen(&self) -> bool {
        self.codegen.is_some()
            || self.module_name.is_some()
            || self.class_name.is_some()
            || self.template.is_some()
            || self.class_template.is_some()
            || self.method_template.is_some()
            || self.request_template.is_some()
            || !self.context.is_empty()
    }

    /// Layer the overrides onto `options`
    ///
    /// Any code generation flag enables code generation.
    pub fn apply(self, options: &mut PipelineOptions) {
        if let Some(filename) = self.filename.clone() {
            options.filename = Some(filename);
        }
        if !self.touches_codegen() {
            return;
        }

        let codegen = options.codegen.get_or_insert_with(CodegenOptions::default);
        if let Some(kind) = self.codegen {
            codegen.kind = Some(kind);
        }
        if let Some(module_name) = self.module_name {
            codegen.module_name = Some(module_name);
        }
        if let Some(class_name) = self.class_name {
            codegen.class_name = Some(class_name);
        }
        if let Some(template) = self.template {
            codegen.template = Some(TemplateConfig::Single(template));
        }

        let fragments = [self.class_template, self.method_template, self.request_template];
        if fragments.iter().any(Option::is_some) {
            let (mut class, mut method, mut request) = match codegen.template.take() {
                Some(TemplateConfig::Single(path)) => (Some(FragmentSource::Path(path)), None, None),
                Some(TemplateConfig::Fragments {
                    class,
                    method,
                    request,
                }) => (class, method, request),
                None => (None, None, None),
            };

            let [class_path, method_path, request_path] = fragments;
            if let Some(path) = class_path {
                class = Some(FragmentSource::Path(path));
            }
            if let Some(path) = method_path {
                method = Some(FragmentSource::Path(path));
            }
            if let Some(path) = request_path {
                request = Some(FragmentSource::Path(path));
            }

            codegen.template = Some(TemplateConfig::Fragments {
                class,
                method,
                request,
            });
        }

        for (key, value) in self.context {
            codegen.context.insert(key, value);
        }
    }
}

/// Parse a `KEY=VALUE` context entry
///
/// The value is read as JSON when possible and kept as a string otherwise.
pub fn parse_context_entry(entry: &str) -> Result<(String, Value), String> {
    let (key, value) = entry
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", entry))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{}'", entry));
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_context_entry() {
        assert_eq!(
            parse_context_entry("retries=3").unwrap(),
            ("retries".to_string(), json!(3))
        );
        assert_eq!(
            parse_context_entry("owner=pets team").unwrap(),
            ("owner".to_string(), json!("pets team"))
        );
        assert_eq!(
            parse_context_entry("flags={\"beta\":true}").unwrap(),
            ("flags".to_string(), json!({"beta": true}))
        );
        assert!(parse_context_entry("novalue").is_err());
        assert!(parse_context_entry("=3").is_err());
    }

    #[test]
    fn test_filename_only_keeps_validate_only_mode() {
        let mut options = PipelineOptions::default();
        Overrides {
            filename: Some("api.json".to_string()),
            ..Default::default()
        }
        .apply(&mut options);

        assert_eq!(options.filename.as_deref(), Some("api.json"));
        assert!(options.codegen.is_none());
    }

    #[test]
    fn test_fragment_flags_extend_single_template() {
        let mut options = PipelineOptions {
            filename: Some("api.js".to_string()),
            codegen: Some(CodegenOptions {
                kind: Some("custom".to_string()),
                template: Some(TemplateConfig::Single("class.tera".to_string())),
                ..Default::default()
            }),
        };

        Overrides {
            method_template: Some("method.tera".to_string()),
            class_name: Some("PetClient".to_string()),
            context: vec![("owner".to_string(), json!("pets"))],
            ..Default::default()
        }
        .apply(&mut options);

        let codegen = options.codegen.unwrap();
        assert_eq!(codegen.class_name.as_deref(), Some("PetClient"));
        assert_eq!(codegen.context["owner"], json!("pets"));
        assert_eq!(
            codegen.template,
            Some(TemplateConfig::Fragments {
                class: Some(FragmentSource::Path("class.tera".to_string())),
                method: Some(FragmentSource::Path("method.tera".to_string())),
                request: None,
            })
        );
    }
}
