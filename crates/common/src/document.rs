//! Document tree helpers
//!
//! A parsed API description is kept as a `serde_json::Value` tree. The
//! workspace enables `preserve_order`, so every mapping iterates in the order
//! its keys were declared in the source document.

use serde_json::Value;

/// Parsed Swagger document
pub type Document = Value;

/// Member name that marks a reference node
pub const REF_KEY: &str = "$ref";

/// Operation keys of a Swagger 2.0 path item, in the order Swagger 2.0 lists them
pub const HTTP_METHODS: [&str; 7] = ["get", "put", "post", "delete", "options", "head", "patch"];

/// Return the pointer carried by `value` if it is a reference node
///
/// A reference node is any mapping with a string `$ref` member.
pub fn reference_target(value: &Value) -> Option<&str> {
    value.as_object()?.get(REF_KEY)?.as_str()
}

/// Whether `reference` points inside the document that declares it
pub fn is_internal_reference(reference: &str) -> bool {
    reference.starts_with('#')
}

/// Count the reference nodes anywhere in `value`
pub fn count_references(value: &Value) -> usize {
    let mut count = 0;
    visit_references(value, &mut Vec::new(), &mut |_, _| count += 1);
    count
}

/// Collect every reference node as `(path, pointer)` in document order
pub fn collect_references(value: &Value) -> Vec<(Vec<String>, String)> {
    let mut found = Vec::new();
    visit_references(value, &mut Vec::new(), &mut |path, target| {
        found.push((path.to_vec(), target.to_string()));
    });
    found
}

fn visit_references<F>(value: &Value, path: &mut Vec<String>, visit: &mut F)
where
    F: FnMut(&[String], &str),
{
    if let Some(target) = reference_target(value) {
        visit(path, target);
        return;
    }

    match value {
        Value::Object(map) => {
            for (key, child) in map {
                path.push(key.clone());
                visit_references(child, path, visit);
                path.pop();
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                path.push(index.to_string());
                visit_references(child, path, visit);
                path.pop();
            }
        }
        _ => {}
    }
}

/// Escape a single JSON Pointer token (`~` → `~0`, `/` → `~1`)
pub fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Build an internal reference (`#/a/b`) from unescaped path segments
pub fn internal_pointer<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut pointer = String::from("#");
    for segment in segments {
        pointer.push('/');
        pointer.push_str(&escape_pointer_token(segment.as_ref()));
    }
    pointer
}
