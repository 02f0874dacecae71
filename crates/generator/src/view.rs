//! Client view model exposed to templates
//!
//! The view flattens a resolved document into what a client template needs:
//! one entry per operation with a method name, HTTP headers and categorized
//! parameters, plus the connection domain and a list of definitions.

use serde::Serialize;
use serde_json::{Map, Value};
use swagger_pipeline_common::document::HTTP_METHODS;
use swagger_pipeline_common::{Document, GeneratorKind};

/// Top-level view of a client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientView {
    pub is_node: bool,
    pub description: String,
    pub is_secure: bool,
    pub module_name: String,
    pub class_name: String,
    pub domain: String,
    pub methods: Vec<MethodView>,
    pub definitions: Vec<DefinitionView>,
}

/// One path + method combination
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodView {
    pub path: String,
    pub method_name: String,
    /// Upper-cased HTTP method
    pub method: String,
    #[serde(rename = "isGET")]
    pub is_get: bool,
    #[serde(rename = "isPOST")]
    pub is_post: bool,
    pub summary: String,
    pub is_secure: bool,
    pub headers: Vec<HeaderView>,
    pub parameters: Vec<ParameterView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderView {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterView {
    pub name: String,
    pub camel_case_name: String,
    #[serde(rename = "in")]
    pub location: String,
    pub description: String,
    pub required: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// `""` when required, `"?"` otherwise
    pub cardinality: String,
    pub is_body_parameter: bool,
    pub is_path_parameter: bool,
    pub is_query_parameter: bool,
    pub is_header_parameter: bool,
    pub is_form_parameter: bool,
    pub is_array: bool,
    /// Set when the parameter's enum admits exactly one value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub singleton: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinitionView {
    pub name: String,
    pub description: String,
}

impl ClientView {
    /// Build the view of a fully-resolved document
    pub fn build(
        document: &Document,
        kind: GeneratorKind,
        module_name: &str,
        class_name: &str,
    ) -> Self {
        let has_security_definitions = document.get("securityDefinitions").is_some();

        let mut methods = Vec::new();
        if let Some(paths) = document.get("paths").and_then(Value::as_object) {
            for (path, item) in paths {
                let Some(item) = item.as_object() else {
                    continue;
                };
                let shared = item.get("parameters").and_then(Value::as_array);

                for (method, operation) in item {
                    if !HTTP_METHODS.contains(&method.as_str()) {
                        continue;
                    }
                    let Some(operation) = operation.as_object() else {
                        continue;
                    };
                    methods.push(method_view(
                        document,
                        path,
                        method,
                        operation,
                        shared,
                        has_security_definitions,
                    ));
                }
            }
        }

        let definitions = document
            .get("definitions")
            .and_then(Value::as_object)
            .map(|definitions| {
                definitions
                    .iter()
                    .map(|(name, definition)| DefinitionView {
                        name: name.clone(),
                        description: string_member(definition, "description"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            is_node: kind == GeneratorKind::Node,
            description: document
                .get("info")
                .map(|info| string_member(info, "description"))
                .unwrap_or_default(),
            is_secure: has_security_definitions,
            module_name: module_name.to_string(),
            class_name: class_name.to_string(),
            domain: domain(document),
            methods,
            definitions,
        }
    }
}

fn method_view(
    document: &Document,
    path: &str,
    method: &str,
    operation: &Map<String, Value>,
    shared: Option<&Vec<Value>>,
    has_security_definitions: bool,
) -> MethodView {
    let method_name = match operation.get("operationId").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => normalize_name(id),
        _ => path_to_method_name(method, path),
    };

    let summary = ["description", "summary"]
        .iter()
        .find_map(|key| operation.get(*key).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string();

    let mut headers = Vec::new();
    if let Some(accept) = media_types(operation, document, "produces") {
        headers.push(HeaderView {
            name: "Accept".to_string(),
            value: accept,
        });
    }
    if let Some(content_type) = media_types(operation, document, "consumes") {
        headers.push(HeaderView {
            name: "Content-Type".to_string(),
            value: content_type,
        });
    }

    let own = operation.get("parameters").and_then(Value::as_array);
    let parameters = merged_parameters(shared, own)
        .into_iter()
        .filter(|p| p.get("x-exclude-from-bindings") != Some(&Value::Bool(true)))
        .map(parameter_view)
        .collect();

    let upper = method.to_uppercase();
    MethodView {
        path: path.to_string(),
        method_name,
        is_get: upper == "GET",
        is_post: upper == "POST",
        method: upper,
        summary,
        is_secure: has_security_definitions || operation.contains_key("security"),
        headers,
        parameters,
    }
}

/// Path-level parameters, replaced by operation parameters with the same name and location
fn merged_parameters<'a>(
    shared: Option<&'a Vec<Value>>,
    own: Option<&'a Vec<Value>>,
) -> Vec<&'a Value> {
    let own: Vec<&Value> = own.map(|list| list.iter().collect()).unwrap_or_default();
    let key = |p: &Value| (string_member(p, "name"), string_member(p, "in"));

    let mut merged: Vec<&Value> = shared
        .map(|list| {
            list.iter()
                .filter(|p| !own.iter().any(|o| key(*o) == key(*p)))
                .collect()
        })
        .unwrap_or_default();
    merged.extend(own);
    merged
}

fn parameter_view(parameter: &Value) -> ParameterView {
    let name = string_member(parameter, "name");
    let location = string_member(parameter, "in");
    let required = parameter.get("required") == Some(&Value::Bool(true));
    let kind = parameter
        .get("type")
        .and_then(Value::as_str)
        .map(str::to_string);

    let singleton = parameter
        .get("enum")
        .and_then(Value::as_array)
        .filter(|values| values.len() == 1)
        .map(|values| values[0].clone());

    ParameterView {
        camel_case_name: camel_case(&name),
        description: string_member(parameter, "description"),
        cardinality: if required { String::new() } else { "?".to_string() },
        is_body_parameter: location == "body",
        is_path_parameter: location == "path",
        is_query_parameter: location == "query",
        is_header_parameter: location == "header",
        is_form_parameter: location == "formData",
        is_array: kind.as_deref() == Some("array"),
        name,
        location,
        required,
        kind,
        singleton,
    }
}

/// Media types of an operation (or the document default) joined for a header value
fn media_types(operation: &Map<String, Value>, document: &Document, key: &str) -> Option<String> {
    let types: Vec<&str> = operation
        .get(key)
        .or_else(|| document.get(key))
        .and_then(Value::as_array)?
        .iter()
        .filter_map(Value::as_str)
        .collect();

    if types.is_empty() {
        None
    } else {
        Some(types.join(", "))
    }
}

/// Default domain: first scheme, host and base path, without a trailing slash
///
/// Empty unless all three parts are present.
pub fn domain(document: &Document) -> String {
    let scheme = document
        .get("schemes")
        .and_then(Value::as_array)
        .and_then(|schemes| schemes.first())
        .and_then(Value::as_str);
    let host = document.get("host").and_then(Value::as_str);
    let base_path = document.get("basePath").and_then(Value::as_str);

    match (scheme, host, base_path) {
        (Some(scheme), Some(host), Some(base_path)) => {
            format!("{}://{}{}", scheme, host, base_path)
                .trim_end_matches('/')
                .to_string()
        }
        _ => String::new(),
    }
}

/// Replace characters that cannot appear in an identifier (`.`, `-`, braces, whitespace)
pub fn normalize_name(id: &str) -> String {
    id.chars()
        .map(|c| match c {
            '.' | '-' | '{' | '}' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}

/// Method name derived from the HTTP method and the path template
///
/// `get /pets/{petId}/toys` becomes `getPetsByPetIdToys`.
pub fn path_to_method_name(method: &str, path: &str) -> String {
    let method = method.to_lowercase();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return method;
    }

    let segments: Vec<String> = trimmed
        .split('/')
        .skip(1)
        .map(|segment| match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => format!("by{}", upper_first(name)),
            None => segment.to_string(),
        })
        .collect();

    format!("{}{}", method, upper_first(&camel_case(&segments.join("-"))))
}

/// Upper-case the first character
pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Convert to lowerCamelCase, splitting on separators and case boundaries
pub fn camel_case(s: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut previous: Option<char> = None;

    for c in s.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            previous = None;
            continue;
        }
        let boundary = c.is_uppercase()
            && matches!(previous, Some(p) if p.is_lowercase() || p.is_ascii_digit());
        if boundary && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
        previous = Some(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .enumerate()
        .map(|(index, word)| {
            let lower = word.to_lowercase();
            if index == 0 {
                lower
            } else {
                upper_first(&lower)
            }
        })
        .collect()
}

fn string_member(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
