//! Structural rules: required members, JSON types, enumerations and patterns

use serde_json::{Map, Value};
use swagger_pipeline_common::document::reference_target;
use swagger_pipeline_common::ValidationResult;

use super::{child, type_name, HTTP_METHODS};

const ROOT_MEMBERS: [&str; 15] = [
    "swagger",
    "info",
    "host",
    "basePath",
    "schemes",
    "consumes",
    "produces",
    "paths",
    "definitions",
    "parameters",
    "responses",
    "securityDefinitions",
    "security",
    "tags",
    "externalDocs",
];
const PARAMETER_LOCATIONS: [&str; 5] = ["query", "header", "path", "formData", "body"];
const PARAMETER_TYPES: [&str; 6] = ["string", "number", "integer", "boolean", "array", "file"];
const SCHEMA_TYPES: [&str; 7] = [
    "string", "number", "integer", "boolean", "array", "object", "null",
];
const SCHEMES: [&str; 4] = ["http", "https", "ws", "wss"];
const SECURITY_TYPES: [&str; 3] = ["basic", "apiKey", "oauth2"];

pub(super) fn check(root: &Value, result: &mut ValidationResult) {
    let Some(map) = root.as_object() else {
        return;
    };
    let path: Vec<String> = Vec::new();

    require(map, &path, &["swagger", "info", "paths"], result);
    additional_members(map, &path, &ROOT_MEMBERS, result);

    if let Some(version) = map.get("swagger") {
        match version.as_str() {
            Some("2.0") => {}
            Some(other) => result.push_error(
                "ENUM_MISMATCH",
                child(&path, "swagger"),
                format!("No enum match for: {}", other),
            ),
            None => invalid_type(version, "string", child(&path, "swagger"), result),
        }
    }

    if let Some(info) = map.get("info") {
        check_info(info, &child(&path, "info"), result);
    }

    if let Some(host) = map.get("host") {
        let host_path = child(&path, "host");
        match host.as_str() {
            Some(h) if h.contains("://") || h.contains('/') => result.push_error(
                "PATTERN",
                host_path,
                format!("Host must not include a scheme or sub-path: {}", h),
            ),
            Some(_) => {}
            None => invalid_type(host, "string", host_path, result),
        }
    }

    if let Some(base_path) = map.get("basePath") {
        let base_path_path = child(&path, "basePath");
        match base_path.as_str() {
            Some(p) if !p.starts_with('/') => result.push_error(
                "PATTERN",
                base_path_path,
                format!("basePath must start with a leading slash: {}", p),
            ),
            Some(_) => {}
            None => invalid_type(base_path, "string", base_path_path, result),
        }
    }

    check_common_lists(map, &path, result);

    if let Some(paths) = map.get("paths") {
        check_paths(paths, &child(&path, "paths"), result);
    }

    if let Some(definitions) = object_member(map, "definitions", &path, result) {
        for (name, schema) in definitions {
            check_schema(schema, &child(&child(&path, "definitions"), name), result);
        }
    }

    if let Some(parameters) = object_member(map, "parameters", &path, result) {
        for (name, parameter) in parameters {
            check_parameter(parameter, &child(&child(&path, "parameters"), name), result);
        }
    }

    if let Some(responses) = object_member(map, "responses", &path, result) {
        for (name, response) in responses {
            check_response(response, &child(&child(&path, "responses"), name), result);
        }
    }

    if let Some(definitions) = object_member(map, "securityDefinitions", &path, result) {
        for (name, scheme) in definitions {
            check_security_scheme(
                scheme,
                &child(&child(&path, "securityDefinitions"), name),
                result,
            );
        }
    }

    if let Some(tags) = map.get("tags") {
        check_tags(tags, &child(&path, "tags"), result);
    }
}

fn check_info(info: &Value, path: &[String], result: &mut ValidationResult) {
    let Some(map) = info.as_object() else {
        invalid_type(info, "object", path.to_vec(), result);
        return;
    };

    require(map, path, &["title", "version"], result);
    for member in ["title", "version", "description", "termsOfService"] {
        if let Some(value) = map.get(member) {
            expect_string(value, child(path, member), result);
        }
    }
}

/// `schemes`, `consumes` and `produces` on the root or an operation
fn check_common_lists(map: &Map<String, Value>, path: &[String], result: &mut ValidationResult) {
    if let Some(schemes) = map.get("schemes") {
        let schemes_path = child(path, "schemes");
        if let Some(items) = string_list(schemes, &schemes_path, result) {
            for (index, scheme) in items {
                if !SCHEMES.contains(&scheme) {
                    result.push_error(
                        "ENUM_MISMATCH",
                        child(&schemes_path, index.to_string()),
                        format!("No enum match for: {}", scheme),
                    );
                }
            }
        }
    }

    for member in ["consumes", "produces"] {
        if let Some(value) = map.get(member) {
            string_list(value, &child(path, member), result);
        }
    }
}

fn check_paths(paths: &Value, path: &[String], result: &mut ValidationResult) {
    let Some(map) = paths.as_object() else {
        invalid_type(paths, "object", path.to_vec(), result);
        return;
    };

    for (key, item) in map {
        if is_extension(key) {
            continue;
        }
        let item_path = child(path, key.as_str());
        if !key.starts_with('/') {
            result.push_error(
                "PATTERN",
                item_path.clone(),
                format!("Path must start with a leading slash: {}", key),
            );
        }
        check_path_item(item, &item_path, result);
    }
}

fn check_path_item(item: &Value, path: &[String], result: &mut ValidationResult) {
    let Some(map) = item.as_object() else {
        invalid_type(item, "object", path.to_vec(), result);
        return;
    };
    if reference_target(item).is_some() {
        return;
    }

    for key in map.keys() {
        if key != "parameters" && !HTTP_METHODS.contains(&key.as_str()) && !is_extension(key) {
            result.push_error(
                "OBJECT_ADDITIONAL_PROPERTIES",
                path.to_vec(),
                format!("Additional properties not allowed: {}", key),
            );
        }
    }

    if let Some(parameters) = map.get("parameters") {
        check_parameter_list(parameters, &child(path, "parameters"), result);
    }

    for method in HTTP_METHODS {
        if let Some(operation) = map.get(method) {
            check_operation(operation, &child(path, method), result);
        }
    }
}

fn check_operation(operation: &Value, path: &[String], result: &mut ValidationResult) {
    let Some(map) = operation.as_object() else {
        invalid_type(operation, "object", path.to_vec(), result);
        return;
    };

    require(map, path, &["responses"], result);

    for member in ["operationId", "summary", "description"] {
        if let Some(value) = map.get(member) {
            expect_string(value, child(path, member), result);
        }
    }

    if let Some(tags) = map.get("tags") {
        string_list(tags, &child(path, "tags"), result);
    }

    check_common_lists(map, path, result);

    if let Some(parameters) = map.get("parameters") {
        check_parameter_list(parameters, &child(path, "parameters"), result);
    }

    if let Some(responses) = map.get("responses") {
        check_responses(responses, &child(path, "responses"), result);
    }
}

fn check_responses(responses: &Value, path: &[String], result: &mut ValidationResult) {
    let Some(map) = responses.as_object() else {
        invalid_type(responses, "object", path.to_vec(), result);
        return;
    };

    if map.keys().all(|key| is_extension(key)) {
        result.push_error(
            "OBJECT_PROPERTIES_MINIMUM",
            path.to_vec(),
            "Too few properties defined (0), minimum 1",
        );
    }

    for (code, response) in map {
        if is_extension(code) {
            continue;
        }
        let response_path = child(path, code.as_str());
        if !is_response_code(code) {
            result.push_error(
                "INVALID_RESPONSE_CODE",
                response_path.clone(),
                format!("Response code must be 'default' or a 3-digit status: {}", code),
            );
        }
        check_response(response, &response_path, result);
    }
}

fn check_response(response: &Value, path: &[String], result: &mut ValidationResult) {
    let Some(map) = response.as_object() else {
        invalid_type(response, "object", path.to_vec(), result);
        return;
    };
    if reference_target(response).is_some() {
        return;
    }

    require(map, path, &["description"], result);
    if let Some(description) = map.get("description") {
        expect_string(description, child(path, "description"), result);
    }
    if let Some(schema) = map.get("schema") {
        check_schema(schema, &child(path, "schema"), result);
    }
    if let Some(headers) = map.get("headers") {
        if !headers.is_object() {
            invalid_type(headers, "object", child(path, "headers"), result);
        }
    }
}

fn check_parameter_list(parameters: &Value, path: &[String], result: &mut ValidationResult) {
    let Some(items) = parameters.as_array() else {
        invalid_type(parameters, "array", path.to_vec(), result);
        return;
    };

    for (index, parameter) in items.iter().enumerate() {
        check_parameter(parameter, &child(path, index.to_string()), result);
    }
}

fn check_parameter(parameter: &Value, path: &[String], result: &mut ValidationResult) {
    let Some(map) = parameter.as_object() else {
        invalid_type(parameter, "object", path.to_vec(), result);
        return;
    };
    if reference_target(parameter).is_some() {
        return;
    }

    require(map, path, &["name", "in"], result);
    if let Some(name) = map.get("name") {
        expect_string(name, child(path, "name"), result);
    }

    let location = match map.get("in") {
        Some(Value::String(location)) if PARAMETER_LOCATIONS.contains(&location.as_str()) => {
            location.as_str()
        }
        Some(Value::String(location)) => {
            result.push_error(
                "ENUM_MISMATCH",
                child(path, "in"),
                format!("No enum match for: {}", location),
            );
            return;
        }
        Some(other) => {
            invalid_type(other, "string", child(path, "in"), result);
            return;
        }
        None => return,
    };

    if location == "body" {
        require(map, path, &["schema"], result);
        if let Some(schema) = map.get("schema") {
            check_schema(schema, &child(path, "schema"), result);
        }
        return;
    }

    require(map, path, &["type"], result);
    let kind = match map.get("type") {
        Some(Value::String(kind)) if PARAMETER_TYPES.contains(&kind.as_str()) => kind.as_str(),
        Some(Value::String(kind)) => {
            result.push_error(
                "ENUM_MISMATCH",
                child(path, "type"),
                format!("No enum match for: {}", kind),
            );
            return;
        }
        Some(other) => {
            invalid_type(other, "string", child(path, "type"), result);
            return;
        }
        None => return,
    };

    if kind == "array" {
        require(map, path, &["items"], result);
    }
    if kind == "file" && location != "formData" {
        result.push_error(
            "INVALID_PARAMETER_TYPE",
            child(path, "type"),
            "Parameters of type 'file' must be located in formData",
        );
    }
    if location == "path" && map.get("required") != Some(&Value::Bool(true)) {
        result.push_error(
            "PATH_PARAMETER_NOT_REQUIRED",
            child(path, "required"),
            format!(
                "Path parameter must be required: {}",
                map.get("name").and_then(Value::as_str).unwrap_or_default()
            ),
        );
    }
}

fn check_schema(schema: &Value, path: &[String], result: &mut ValidationResult) {
    let Some(map) = schema.as_object() else {
        invalid_type(schema, "object", path.to_vec(), result);
        return;
    };
    if reference_target(schema).is_some() {
        return;
    }

    let mut is_array = false;
    if let Some(kind) = map.get("type") {
        let kinds: Vec<&Value> = match kind {
            Value::Array(kinds) => kinds.iter().collect(),
            other => vec![other],
        };
        for kind in kinds {
            match kind.as_str() {
                Some(k) if SCHEMA_TYPES.contains(&k) => is_array |= k == "array",
                Some(k) => result.push_error(
                    "ENUM_MISMATCH",
                    child(path, "type"),
                    format!("No enum match for: {}", k),
                ),
                None => invalid_type(kind, "string", child(path, "type"), result),
            }
        }
    }

    if is_array {
        require(map, path, &["items"], result);
    }

    if let Some(required) = map.get("required") {
        string_list(required, &child(path, "required"), result);
    }

    if let Some(properties) = map.get("properties") {
        let properties_path = child(path, "properties");
        match properties.as_object() {
            Some(properties) => {
                for (name, property) in properties {
                    check_schema(property, &child(&properties_path, name.as_str()), result);
                }
            }
            None => invalid_type(properties, "object", properties_path, result),
        }
    }

    if let Some(items) = map.get("items") {
        let items_path = child(path, "items");
        match items {
            Value::Array(tuple) => {
                for (index, item) in tuple.iter().enumerate() {
                    check_schema(item, &child(&items_path, index.to_string()), result);
                }
            }
            other => check_schema(other, &items_path, result),
        }
    }

    if let Some(all_of) = map.get("allOf") {
        let all_of_path = child(path, "allOf");
        match all_of.as_array() {
            Some(parts) => {
                for (index, part) in parts.iter().enumerate() {
                    check_schema(part, &child(&all_of_path, index.to_string()), result);
                }
            }
            None => invalid_type(all_of, "array", all_of_path, result),
        }
    }

    if let Some(additional) = map.get("additionalProperties") {
        if !additional.is_boolean() {
            check_schema(additional, &child(path, "additionalProperties"), result);
        }
    }
}

fn check_security_scheme(scheme: &Value, path: &[String], result: &mut ValidationResult) {
    let Some(map) = scheme.as_object() else {
        invalid_type(scheme, "object", path.to_vec(), result);
        return;
    };

    require(map, path, &["type"], result);
    match map.get("type") {
        Some(Value::String(kind)) if SECURITY_TYPES.contains(&kind.as_str()) => {}
        Some(Value::String(kind)) => result.push_error(
            "ENUM_MISMATCH",
            child(path, "type"),
            format!("No enum match for: {}", kind),
        ),
        Some(other) => invalid_type(other, "string", child(path, "type"), result),
        None => {}
    }
}

fn check_tags(tags: &Value, path: &[String], result: &mut ValidationResult) {
    let Some(items) = tags.as_array() else {
        invalid_type(tags, "array", path.to_vec(), result);
        return;
    };

    for (index, tag) in items.iter().enumerate() {
        let tag_path = child(path, index.to_string());
        match tag.as_object() {
            Some(map) => require(map, &tag_path, &["name"], result),
            None => invalid_type(tag, "object", tag_path, result),
        }
    }
}

fn require(
    map: &Map<String, Value>,
    path: &[String],
    members: &[&str],
    result: &mut ValidationResult,
) {
    for member in members {
        if !map.contains_key(*member) {
            result.push_error(
                "OBJECT_MISSING_REQUIRED_PROPERTY",
                path.to_vec(),
                format!("Missing required property: {}", member),
            );
        }
    }
}

fn additional_members(
    map: &Map<String, Value>,
    path: &[String],
    allowed: &[&str],
    result: &mut ValidationResult,
) {
    for key in map.keys() {
        if !allowed.contains(&key.as_str()) && !is_extension(key) {
            result.push_error(
                "OBJECT_ADDITIONAL_PROPERTIES",
                path.to_vec(),
                format!("Additional properties not allowed: {}", key),
            );
        }
    }
}

fn object_member<'a>(
    map: &'a Map<String, Value>,
    member: &str,
    path: &[String],
    result: &mut ValidationResult,
) -> Option<&'a Map<String, Value>> {
    let value = map.get(member)?;
    if value.is_object() {
        value.as_object()
    } else {
        invalid_type(value, "object", child(path, member), result);
        None
    }
}

fn string_list<'a>(
    value: &'a Value,
    path: &[String],
    result: &mut ValidationResult,
) -> Option<Vec<(usize, &'a str)>> {
    let Some(items) = value.as_array() else {
        invalid_type(value, "array", path.to_vec(), result);
        return None;
    };

    let mut strings = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match item.as_str() {
            Some(s) => strings.push((index, s)),
            None => invalid_type(item, "string", child(path, index.to_string()), result),
        }
    }
    Some(strings)
}

fn expect_string(value: &Value, path: Vec<String>, result: &mut ValidationResult) {
    if !value.is_string() {
        invalid_type(value, "string", path, result);
    }
}

fn invalid_type(value: &Value, expected: &str, path: Vec<String>, result: &mut ValidationResult) {
    result.push_error(
        "INVALID_TYPE",
        path,
        format!(
            "Expected type {} but found type {}",
            expected,
            type_name(value)
        ),
    );
}

fn is_extension(key: &str) -> bool {
    key.starts_with("x-")
}

fn is_response_code(code: &str) -> bool {
    code == "default"
        || (code.len() == 3
            && code.chars().all(|c| c.is_ascii_digit())
            && ('1'..='5').contains(&code.chars().next().unwrap_or('0')))
}
