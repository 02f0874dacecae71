//! Integration tests for loading, resolving and validating documents on disk

use std::fs;
use std::path::Path;

use serde_json::json;
use swagger_pipeline_common::document::count_references;
use swagger_pipeline_common::{PipelineError, ResolutionCause};
use swagger_pipeline_parser::{
    validate_file, DocumentSource, ReferenceResolver, SchemaValidator, Swagger2Validator,
};
use tempfile::TempDir;

const ROOT: &str = r##"
swagger: "2.0"
info:
  title: Petstore
  version: 1.0.0
basePath: /v1
paths:
  /pets:
    get:
      operationId: listPets
      responses:
        200:
          description: A list of pets
          schema:
            $ref: "#/definitions/Pets"
    post:
      operationId: createPet
      parameters:
        - name: pet
          in: body
          schema:
            $ref: "models/pet.yaml#/Pet"
      responses:
        201:
          description: Created
definitions:
  Pets:
    type: array
    items:
      $ref: "models/pet.yaml#/Pet"
"##;

const PET: &str = r##"
Pet:
  type: object
  required: [id, name]
  properties:
    id:
      type: integer
      format: int64
    name:
      type: string
    category:
      $ref: "#/Category"
Category:
  type: object
  properties:
    name:
      type: string
"##;

fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn petstore_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "petstore.yaml", ROOT);
    write(dir.path(), "models/pet.yaml", PET);
    dir
}

#[test]
fn test_external_files_are_inlined_and_internal_references_kept() {
    let dir = petstore_dir();
    let resolver = ReferenceResolver::new();

    let loaded = resolver
        .resolve_external(DocumentSource::Path(dir.path().join("petstore.yaml")))
        .unwrap();

    let body = &loaded.document["paths"]["/pets"]["post"]["parameters"][0]["schema"];
    assert_eq!(body["properties"]["category"]["properties"]["name"]["type"], json!("string"));
    assert_eq!(
        loaded.document["paths"]["/pets"]["get"]["responses"]["200"]["schema"],
        json!({"$ref": "#/definitions/Pets"})
    );
    assert_eq!(count_references(&loaded.document), 1);
}

#[test]
fn test_validated_document_resolves_completely() {
    let dir = petstore_dir();

    let (loaded, result) = validate_file(&dir.path().join("petstore.yaml")).unwrap();
    assert!(result.is_empty(), "unexpected entries: {:?}", result);

    let resolved = ReferenceResolver::new().resolve_all(&loaded).unwrap();
    assert_eq!(count_references(&resolved.document), 0);
    assert_eq!(
        resolved.document["paths"]["/pets"]["get"]["responses"]["200"]["schema"]["items"]["required"],
        json!(["id", "name"])
    );

    // A second full pass has nothing left to do.
    let again = ReferenceResolver::new().resolve_all(&resolved).unwrap();
    assert_eq!(again, resolved);
}

#[test]
fn test_buffer_source_resolves_relative_to_origin() {
    let dir = petstore_dir();
    let source = DocumentSource::Buffer {
        contents: ROOT.as_bytes().to_vec(),
        origin: dir.path().join("in-memory.yaml"),
    };

    let loaded = ReferenceResolver::new().resolve_external(source).unwrap();
    assert_eq!(count_references(&loaded.document), 1);
}

#[test]
fn test_missing_external_file_is_resolution_error() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "api.json",
        r##"{"swagger": "2.0", "definitions": {"Pet": {"$ref": "absent.json#/Pet"}}}"##,
    );

    let err = ReferenceResolver::new()
        .resolve_external(DocumentSource::Path(dir.path().join("api.json")))
        .unwrap_err();

    match err {
        PipelineError::ReferenceResolution { reference, cause } => {
            assert_eq!(reference, "absent.json#/Pet");
            assert!(matches!(cause, ResolutionCause::Load { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_validation_accumulates_every_entry() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "broken.json",
        r##"{
            "swagger": "2.0",
            "info": {"title": "Broken"},
            "paths": {
                "/pets/{petId}": {
                    "get": {
                        "operationId": "getPet",
                        "responses": {"200": {"description": "ok", "schema": {"$ref": "#/definitions/Nope"}}}
                    }
                },
                "/owners": {
                    "get": {"operationId": "getPet", "responses": {"404": {"description": "missing"}}}
                }
            },
            "definitions": {"Unused": {"type": "string"}}
        }"##,
    );

    let (_, result) = validate_file(&dir.path().join("broken.json")).unwrap();
    let errors: Vec<&str> = result.errors.iter().map(|e| e.code.as_str()).collect();
    let warnings: Vec<&str> = result.warnings.iter().map(|e| e.code.as_str()).collect();

    assert_eq!(
        errors,
        vec![
            "OBJECT_MISSING_REQUIRED_PROPERTY",
            "UNRESOLVABLE_REFERENCE",
            "MISSING_PATH_PARAMETER_DEFINITION",
            "DUPLICATE_OPERATIONID"
        ]
    );
    assert_eq!(warnings, vec!["MISSING_SUCCESS_RESPONSE", "UNUSED_DEFINITION"]);
    assert_eq!(result.errors[0].locator(), "#/info");
}

#[test]
fn test_validator_reads_yaml_and_json_alike() {
    let dir = petstore_dir();
    let yaml = ReferenceResolver::new()
        .resolve_external(DocumentSource::Path(dir.path().join("petstore.yaml")))
        .unwrap();

    let json_text = serde_json::to_string_pretty(&yaml.document).unwrap();
    write(dir.path(), "petstore.json", &json_text);
    let json = ReferenceResolver::new()
        .resolve_external(DocumentSource::Path(dir.path().join("petstore.json")))
        .unwrap();

    assert_eq!(json.document, yaml.document);
    assert_eq!(
        Swagger2Validator::new().validate(&json.document).unwrap(),
        Swagger2Validator::new().validate(&yaml.document).unwrap()
    );
}
