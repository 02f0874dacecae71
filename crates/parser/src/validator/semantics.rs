//! Semantic rules: references, identifiers, parameters and paths

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};
use swagger_pipeline_common::document::{collect_references, internal_pointer, is_internal_reference};
use swagger_pipeline_common::ValidationResult;

use super::{child, follow, HTTP_METHODS};
use crate::pointer;

/// Root sections whose entries must be referenced somewhere
const REUSABLE_SECTIONS: [&str; 3] = ["definitions", "parameters", "responses"];

pub(super) fn check(root: &Value, result: &mut ValidationResult) {
    let Some(map) = root.as_object() else {
        return;
    };

    let used = check_references(root, result);

    let security_definitions = map
        .get("securityDefinitions")
        .and_then(Value::as_object)
        .map(|definitions| definitions.keys().map(String::as_str).collect::<HashSet<_>>())
        .unwrap_or_default();

    if let Some(security) = map.get("security") {
        check_security(security, &security_definitions, &["security".to_string()], result);
    }

    if let Some(paths) = map.get("paths").and_then(Value::as_object) {
        check_paths(root, paths, &security_definitions, result);
    }

    for section in REUSABLE_SECTIONS {
        let Some(entries) = map.get(section).and_then(Value::as_object) else {
            continue;
        };
        for name in entries.keys() {
            if !used.contains(&(section, name.as_str())) {
                result.push_warning(
                    "UNUSED_DEFINITION",
                    [section, name.as_str()],
                    format!(
                        "Definition is not used: {}",
                        internal_pointer([section, name.as_str()])
                    ),
                );
            }
        }
    }
}

/// Report dangling internal references and return the reusable entries they use
fn check_references<'a>(
    root: &'a Value,
    result: &mut ValidationResult,
) -> HashSet<(&'static str, &'a str)> {
    let mut used = HashSet::new();

    for (path, reference) in collect_references(root) {
        if !is_internal_reference(&reference) {
            continue;
        }

        let fragment = &reference[1..];
        if pointer::lookup_fragment(root, fragment).is_err() {
            result.push_error(
                "UNRESOLVABLE_REFERENCE",
                path,
                format!("Reference could not be resolved: {}", reference),
            );
            continue;
        }

        let Ok(tokens) = pointer::parse_fragment(fragment) else {
            continue;
        };
        if let [section, name, ..] = tokens.as_slice() {
            if let Some(section) = REUSABLE_SECTIONS.iter().find(|s| *s == section) {
                // Borrow the key from the tree so the set outlives the token list.
                if let Some((key, _)) = root
                    .get(*section)
                    .and_then(Value::as_object)
                    .and_then(|entries| entries.get_key_value(name.as_str()))
                {
                    used.insert((*section, key.as_str()));
                }
            }
        }
    }

    used
}

fn check_paths(
    root: &Value,
    paths: &Map<String, Value>,
    security_definitions: &HashSet<&str>,
    result: &mut ValidationResult,
) {
    let mut operation_ids: HashMap<&str, Vec<String>> = HashMap::new();
    let mut shapes: HashMap<String, &str> = HashMap::new();

    for (template, item) in paths {
        if template.starts_with("x-") {
            continue;
        }
        let item_path = vec!["paths".to_string(), template.clone()];

        let shape = path_shape(template);
        match shapes.get(shape.as_str()) {
            Some(existing) => result.push_error(
                "EQUIVALENT_PATH",
                item_path.clone(),
                format!("Equivalent path already exists: {}", existing),
            ),
            None => {
                shapes.insert(shape, template.as_str());
            }
        }

        let Some(item) = follow(root, item).and_then(Value::as_object) else {
            continue;
        };

        let shared = parameter_list(root, item.get("parameters"));
        report_duplicates(&shared, &child(&item_path, "parameters"), result);

        let declared = template_parameters(template);

        for method in HTTP_METHODS {
            let Some(operation) = item.get(method).and_then(Value::as_object) else {
                continue;
            };
            let operation_path = child(&item_path, method);

            if let Some(id) = operation.get("operationId").and_then(Value::as_str) {
                match operation_ids.get(id) {
                    Some(first) => result.push_error(
                        "DUPLICATE_OPERATIONID",
                        child(&operation_path, "operationId"),
                        format!(
                            "Cannot have multiple operations with the same operationId: {} (first declared at {})",
                            id,
                            internal_pointer(first)
                        ),
                    ),
                    None => {
                        operation_ids.insert(id, operation_path.clone());
                    }
                }
            }

            let own = parameter_list(root, operation.get("parameters"));
            let parameters_path = child(&operation_path, "parameters");
            report_duplicates(&own, &parameters_path, result);

            let effective = effective_parameters(&shared, &own);
            check_parameter_mix(&effective, &parameters_path, result);
            check_path_parameters(&effective, &declared, &operation_path, result);

            if let Some(security) = operation.get("security") {
                check_security(
                    security,
                    security_definitions,
                    &child(&operation_path, "security"),
                    result,
                );
            }

            if let Some(responses) = operation.get("responses").and_then(Value::as_object) {
                let succeeds = responses
                    .keys()
                    .any(|code| code == "default" || code.starts_with('2'));
                if !succeeds {
                    result.push_warning(
                        "MISSING_SUCCESS_RESPONSE",
                        child(&operation_path, "responses"),
                        "Operation does not define a success (2xx) or default response",
                    );
                }
            }
        }
    }
}

/// A parameter after following references, with its position in the declaring list
#[derive(Debug, Clone, Copy)]
struct Parameter<'a> {
    index: usize,
    name: &'a str,
    location: &'a str,
}

impl Parameter<'_> {
    fn key(&self) -> (&str, &str) {
        (self.name, self.location)
    }
}

fn parameter_list<'a>(root: &'a Value, list: Option<&'a Value>) -> Vec<Parameter<'a>> {
    let Some(items) = list.and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let parameter = follow(root, item)?.as_object()?;
            Some(Parameter {
                index,
                name: parameter.get("name")?.as_str()?,
                location: parameter.get("in")?.as_str()?,
            })
        })
        .collect()
}

fn report_duplicates(parameters: &[Parameter<'_>], path: &[String], result: &mut ValidationResult) {
    let mut seen = HashSet::new();
    for parameter in parameters {
        if !seen.insert(parameter.key()) {
            result.push_error(
                "DUPLICATE_PARAMETER",
                child(path, parameter.index.to_string()),
                format!(
                    "Operation cannot have duplicate parameters: {} in {}",
                    parameter.name, parameter.location
                ),
            );
        }
    }
}

/// Path-level parameters overridden by operation-level ones with the same name and location
fn effective_parameters<'a>(
    shared: &[Parameter<'a>],
    own: &[Parameter<'a>],
) -> Vec<Parameter<'a>> {
    let overridden: HashSet<(&str, &str)> = own.iter().map(Parameter::key).collect();
    shared
        .iter()
        .filter(|p| !overridden.contains(&p.key()))
        .chain(own.iter())
        .copied()
        .collect()
}

fn check_parameter_mix(parameters: &[Parameter<'_>], path: &[String], result: &mut ValidationResult) {
    let bodies = parameters.iter().filter(|p| p.location == "body").count();
    if bodies > 1 {
        result.push_error(
            "MULTIPLE_BODY_PARAMETERS",
            path.to_vec(),
            "Operation cannot have multiple body parameters",
        );
    }
    if bodies > 0 && parameters.iter().any(|p| p.location == "formData") {
        result.push_error(
            "INVALID_PARAMETER_COMBINATION",
            path.to_vec(),
            "Operation cannot have a body parameter and a formData parameter",
        );
    }
}

fn check_path_parameters(
    parameters: &[Parameter<'_>],
    declared: &[String],
    path: &[String],
    result: &mut ValidationResult,
) {
    for parameter in parameters.iter().filter(|p| p.location == "path") {
        if !declared.iter().any(|name| name == parameter.name) {
            result.push_error(
                "MISSING_PATH_PARAMETER_DECLARATION",
                path.to_vec(),
                format!(
                    "Path parameter is defined but is not declared: {}",
                    parameter.name
                ),
            );
        }
    }

    for name in declared {
        let defined = parameters
            .iter()
            .any(|p| p.location == "path" && p.name == name);
        if !defined {
            result.push_error(
                "MISSING_PATH_PARAMETER_DEFINITION",
                path.to_vec(),
                format!("Path parameter is declared but is not defined: {}", name),
            );
        }
    }
}

fn check_security(
    security: &Value,
    definitions: &HashSet<&str>,
    path: &[String],
    result: &mut ValidationResult,
) {
    let Some(requirements) = security.as_array() else {
        return;
    };

    for (index, requirement) in requirements.iter().enumerate() {
        let Some(requirement) = requirement.as_object() else {
            continue;
        };
        for name in requirement.keys() {
            if !definitions.contains(name.as_str()) {
                result.push_error(
                    "UNRESOLVABLE_SECURITY_DEFINITION",
                    child(&child(path, index.to_string()), name.as_str()),
                    format!("Security definition could not be resolved: {}", name),
                );
            }
        }
    }
}

/// Names between braces in a path template, in order
fn template_parameters(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let Some(length) = rest[start + 1..].find('}') else {
            break;
        };
        names.push(rest[start + 1..start + 1 + length].to_string());
        rest = &rest[start + 1 + length + 1..];
    }
    names
}

/// Path template with parameter names erased (`/pets/{id}` → `/pets/{}`)
fn path_shape(template: &str) -> String {
    let mut shape = String::with_capacity(template.len());
    let mut in_parameter = false;
    for c in template.chars() {
        match c {
            '{' => {
                in_parameter = true;
                shape.push('{');
            }
            '}' => {
                in_parameter = false;
                shape.push('}');
            }
            _ if in_parameter => {}
            c => shape.push(c),
        }
    }
    shape
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(paths: Value) -> ValidationResult {
        let doc = json!({
            "swagger": "2.0",
            "info": {"title": "t", "version": "1"},
            "paths": paths
        });
        let mut result = ValidationResult::default();
        check(&doc, &mut result);
        result
    }

    fn codes(result: &ValidationResult) -> Vec<&str> {
        result.errors.iter().map(|e| e.code.as_str()).collect()
    }

    fn ok() -> Value {
        json!({"200": {"description": "ok"}})
    }

    #[test]
    fn test_template_parameters_and_shape() {
        assert_eq!(template_parameters("/a/{x}/b/{y}"), vec!["x", "y"]);
        assert!(template_parameters("/plain").is_empty());
        assert_eq!(path_shape("/pets/{petId}/toys/{toy}"), "/pets/{}/toys/{}");
    }

    #[test]
    fn test_dangling_reference_reported_at_reference_node() {
        let result = run(json!({
            "/pets": {
                "get": {
                    "responses": {"200": {"description": "ok", "schema": {"$ref": "#/definitions/Missing"}}}
                }
            }
        }));
        assert_eq!(codes(&result), vec!["UNRESOLVABLE_REFERENCE"]);
        assert_eq!(
            result.errors[0].locator(),
            "#/paths//pets/get/responses/200/schema"
        );
    }

    #[test]
    fn test_non_canonical_array_index_is_unresolvable() {
        let paths = |index: &str| {
            json!({
                "/a": {
                    "get": {
                        "parameters": [{"name": "q", "in": "query", "type": "string"}],
                        "responses": {"200": {
                            "description": "ok",
                            "schema": {"$ref": format!("#/paths/~1a/get/parameters/{}", index)}
                        }}
                    }
                }
            })
        };

        assert!(run(paths("0")).errors.is_empty());
        assert_eq!(codes(&run(paths("00"))), vec!["UNRESOLVABLE_REFERENCE"]);
        assert_eq!(codes(&run(paths("+0"))), vec!["UNRESOLVABLE_REFERENCE"]);
    }

    #[test]
    fn test_duplicate_operation_ids() {
        let result = run(json!({
            "/a": {"get": {"operationId": "fetch", "responses": ok()}},
            "/b": {"get": {"operationId": "fetch", "responses": ok()}}
        }));
        assert_eq!(codes(&result), vec!["DUPLICATE_OPERATIONID"]);
        assert_eq!(result.errors[0].path, vec!["paths", "/b", "get", "operationId"]);
    }

    #[test]
    fn test_parameter_rules() {
        let result = run(json!({
            "/upload": {
                "post": {
                    "parameters": [
                        {"name": "a", "in": "body", "schema": {}},
                        {"name": "b", "in": "body", "schema": {}},
                        {"name": "f", "in": "formData", "type": "file"},
                        {"name": "f", "in": "formData", "type": "file"}
                    ],
                    "responses": ok()
                }
            }
        }));
        assert_eq!(
            codes(&result),
            vec![
                "DUPLICATE_PARAMETER",
                "MULTIPLE_BODY_PARAMETERS",
                "INVALID_PARAMETER_COMBINATION"
            ]
        );
        assert_eq!(
            result.errors[0].path,
            vec!["paths", "/upload", "post", "parameters", "3"]
        );
    }

    #[test]
    fn test_path_parameters_must_match_template() {
        let result = run(json!({
            "/pets/{petId}": {
                "get": {
                    "parameters": [{"name": "id", "in": "path", "required": true, "type": "string"}],
                    "responses": ok()
                }
            }
        }));
        assert_eq!(
            codes(&result),
            vec![
                "MISSING_PATH_PARAMETER_DECLARATION",
                "MISSING_PATH_PARAMETER_DEFINITION"
            ]
        );
    }

    #[test]
    fn test_path_level_parameters_apply_to_operations() {
        let result = run(json!({
            "/pets/{petId}": {
                "parameters": [{"name": "petId", "in": "path", "required": true, "type": "string"}],
                "get": {"responses": ok()},
                "delete": {"responses": ok()}
            }
        }));
        assert!(result.is_empty(), "{:?}", result);
    }

    #[test]
    fn test_equivalent_paths() {
        let result = run(json!({
            "/pets/{id}": {"parameters": [{"name": "id", "in": "path", "required": true, "type": "string"}]},
            "/pets/{petId}": {"parameters": [{"name": "petId", "in": "path", "required": true, "type": "string"}]}
        }));
        assert_eq!(codes(&result), vec!["EQUIVALENT_PATH"]);
        assert_eq!(result.errors[0].message, "Equivalent path already exists: /pets/{id}");
    }

    #[test]
    fn test_undefined_security_definition() {
        let result = run(json!({
            "/pets": {"get": {"security": [{"api_key": []}], "responses": ok()}}
        }));
        assert_eq!(codes(&result), vec!["UNRESOLVABLE_SECURITY_DEFINITION"]);
        assert_eq!(
            result.errors[0].path,
            vec!["paths", "/pets", "get", "security", "0", "api_key"]
        );
    }

    #[test]
    fn test_missing_success_response_is_warning() {
        let result = run(json!({
            "/pets": {"get": {"responses": {"404": {"description": "missing"}}}}
        }));
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].code, "MISSING_SUCCESS_RESPONSE");
    }

    #[test]
    fn test_reference_to_nested_member_marks_entry_used() {
        let doc = json!({
            "swagger": "2.0",
            "info": {"title": "t", "version": "1"},
            "paths": {
                "/pets": {
                    "get": {
                        "parameters": [{"$ref": "#/parameters/limit"}],
                        "responses": {"200": {"$ref": "#/responses/Ok"}}
                    }
                }
            },
            "parameters": {"limit": {"name": "limit", "in": "query", "type": "integer"}},
            "responses": {
                "Ok": {"description": "ok", "schema": {"$ref": "#/definitions/Pet/properties/id"}},
                "Gone": {"description": "gone"}
            },
            "definitions": {"Pet": {"properties": {"id": {"type": "integer"}}}}
        });

        let mut result = ValidationResult::default();
        check(&doc, &mut result);
        assert!(result.is_valid(), "{:?}", result.errors);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].message, "Definition is not used: #/responses/Gone");
    }
}
