//! Swagger 2.0 conformance validation
//!
//! Violations are data: they are collected into a [`ValidationResult`] and the
//! caller decides whether to abort. Only a document the rules cannot walk at
//! all (a non-object root) is reported as an error of the validator itself.
//!
//! The validator expects external references to be resolved already and
//! follows internal references itself where a rule needs the target.

mod semantics;
mod structure;

use serde_json::Value;
use swagger_pipeline_common::document::reference_target;
use swagger_pipeline_common::{Document, PipelineError, Result, ValidationResult};

use crate::pointer;

pub use swagger_pipeline_common::document::HTTP_METHODS;

/// Swagger 2.0 conformance validator
pub trait SchemaValidator {
    fn validate(&self, document: &Document) -> Result<ValidationResult>;
}

/// Structural and semantic rules for Swagger 2.0 documents
#[derive(Debug, Default, Clone, Copy)]
pub struct Swagger2Validator;

impl Swagger2Validator {
    pub fn new() -> Self {
        Self
    }
}

impl SchemaValidator for Swagger2Validator {
    fn validate(&self, document: &Document) -> Result<ValidationResult> {
        if !document.is_object() {
            return Err(PipelineError::ValidatorInternal(format!(
                "document root must be an object, found {}",
                type_name(document)
            )));
        }

        let mut result = ValidationResult::default();
        structure::check(document, &mut result);
        semantics::check(document, &mut result);

        tracing::debug!(
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "validation finished"
        );

        Ok(result)
    }
}

/// JSON type name in the vocabulary used by validation messages
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Follow internal references from `value` until a non-reference node
///
/// Returns `None` for dangling or circular chains; those are reported by the
/// reference rule.
pub(crate) fn follow<'a>(root: &'a Value, value: &'a Value) -> Option<&'a Value> {
    let mut current = value;
    for _ in 0..32 {
        let Some(reference) = reference_target(current) else {
            return Some(current);
        };
        let fragment = reference.strip_prefix('#')?;
        current = pointer::lookup_fragment(root, fragment).ok()?;
    }
    None
}

/// Path extended by one segment
pub(crate) fn child(path: &[String], segment: impl Into<String>) -> Vec<String> {
    let mut extended = path.to_vec();
    extended.push(segment.into());
    extended
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn petstore() -> Value {
        json!({
            "swagger": "2.0",
            "info": {"title": "Petstore", "version": "1.0.0"},
            "host": "petstore.swagger.io",
            "basePath": "/v1",
            "schemes": ["http"],
            "paths": {
                "/pets": {
                    "get": {
                        "operationId": "listPets",
                        "parameters": [
                            {"name": "limit", "in": "query", "type": "integer"}
                        ],
                        "responses": {
                            "200": {"description": "pets", "schema": {"$ref": "#/definitions/Pets"}}
                        }
                    },
                    "post": {
                        "operationId": "createPet",
                        "parameters": [
                            {"name": "pet", "in": "body", "schema": {"$ref": "#/definitions/Pet"}}
                        ],
                        "responses": {"201": {"description": "created"}}
                    }
                },
                "/pets/{petId}": {
                    "get": {
                        "operationId": "showPetById",
                        "parameters": [
                            {"name": "petId", "in": "path", "required": true, "type": "string"}
                        ],
                        "responses": {
                            "200": {"description": "pet", "schema": {"$ref": "#/definitions/Pet"}},
                            "default": {"description": "error"}
                        }
                    }
                }
            },
            "definitions": {
                "Pet": {
                    "type": "object",
                    "required": ["id", "name"],
                    "properties": {
                        "id": {"type": "integer", "format": "int64"},
                        "name": {"type": "string"}
                    }
                },
                "Pets": {"type": "array", "items": {"$ref": "#/definitions/Pet"}}
            }
        })
    }

    fn codes(entries: &[swagger_pipeline_common::ValidationEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.code.as_str()).collect()
    }

    #[test]
    fn test_valid_petstore_has_no_entries() {
        let result = Swagger2Validator::new().validate(&petstore()).unwrap();
        assert!(result.is_empty(), "unexpected entries: {:?}", result);
    }

    #[test]
    fn test_non_object_root_is_internal_error() {
        let result = Swagger2Validator::new().validate(&json!(["swagger"]));
        assert!(matches!(result, Err(PipelineError::ValidatorInternal(_))));
    }

    #[test]
    fn test_missing_required_root_members() {
        let result = Swagger2Validator::new().validate(&json!({})).unwrap();
        assert_eq!(
            codes(&result.errors),
            vec![
                "OBJECT_MISSING_REQUIRED_PROPERTY",
                "OBJECT_MISSING_REQUIRED_PROPERTY",
                "OBJECT_MISSING_REQUIRED_PROPERTY"
            ]
        );
        assert_eq!(result.errors[0].message, "Missing required property: swagger");
        assert!(result.errors[0].path.is_empty());
    }

    #[test]
    fn test_unused_definition_is_warning_only() {
        let mut doc = petstore();
        doc["definitions"]["Orphan"] = json!({"type": "string"});

        let result = Swagger2Validator::new().validate(&doc).unwrap();
        assert!(result.is_valid());
        assert_eq!(codes(&result.warnings), vec!["UNUSED_DEFINITION"]);
        assert_eq!(result.warnings[0].path, vec!["definitions", "Orphan"]);
    }

    #[test]
    fn test_follow_internal_chain() {
        let doc = json!({
            "parameters": {"a": {"$ref": "#/parameters/b"}, "b": {"name": "b", "in": "query"}},
            "loop": {"$ref": "#/loop"}
        });
        let start = json!({"$ref": "#/parameters/a"});
        assert_eq!(follow(&doc, &start), Some(&doc["parameters"]["b"]));
        assert_eq!(follow(&doc, &doc["loop"]), None);
    }
}
