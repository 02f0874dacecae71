//! Per-operation request/response schemas
//!
//! The projection is keyed by path, then by HTTP method, in the order the
//! document declares them, so templates rendered from it are reproducible.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Value};
use swagger_pipeline_common::document::HTTP_METHODS;
use swagger_pipeline_common::Document;

/// Path → method → schemas
pub type ProjectionMap = IndexMap<String, IndexMap<String, OperationSchemas>>;

/// Schemas of one operation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OperationSchemas {
    /// Schema of the first body parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<Value>,

    /// Schema per response status code; `{}` when a response has none
    pub responses: IndexMap<String, Value>,
}

/// Project a fully-resolved document
///
/// Shapes that do not match Swagger 2.0 degrade to absent or empty entries.
pub fn project(document: &Document) -> ProjectionMap {
    let mut projection = ProjectionMap::new();

    let Some(paths) = document.get("paths").and_then(Value::as_object) else {
        return projection;
    };

    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            continue;
        };

        let methods: IndexMap<String, OperationSchemas> = item
            .iter()
            .filter(|(method, _)| HTTP_METHODS.contains(&method.as_str()))
            .map(|(method, operation)| (method.clone(), operation_schemas(operation)))
            .collect();

        projection.insert(path.clone(), methods);
    }

    projection
}

fn operation_schemas(operation: &Value) -> OperationSchemas {
    let request = operation
        .get("parameters")
        .and_then(Value::as_array)
        .and_then(|parameters| {
            parameters
                .iter()
                .find(|p| p.get("in").and_then(Value::as_str) == Some("body"))
        })
        .and_then(|body| body.get("schema"))
        .cloned();

    let responses = operation
        .get("responses")
        .and_then(Value::as_object)
        .map(|responses| {
            responses
                .iter()
                .filter(|(code, _)| !code.starts_with("x-"))
                .map(|(code, response)| {
                    let schema = response.get("schema").cloned().unwrap_or_else(|| json!({}));
                    (code.clone(), schema)
                })
                .collect()
        })
        .unwrap_or_default();

    OperationSchemas { request, responses }
}

/// JSON text of the projection, as exposed to templates
pub fn to_json(projection: &ProjectionMap) -> serde_json::Result<String> {
    serde_json::to_string(projection)
}
