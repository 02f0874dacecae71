//! Document sources and loading
//!
//! Every document (the root one and any external reference target) is read
//! through a [`SourceLoader`], addressed by a `url::Url`. Relative external
//! references are resolved by joining against the origin of the document
//! that declares them.

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde_json::{Map, Number, Value};
use swagger_pipeline_common::{Document, PipelineError, Result};
use url::Url;

/// Where the root document comes from
pub enum DocumentSource {
    /// A file on disk
    Path(PathBuf),

    /// An in-memory buffer; `origin` anchors relative external references
    Buffer { contents: Vec<u8>, origin: PathBuf },

    /// A streaming reader (rejected)
    Stream(Box<dyn Read + Send>),
}

impl fmt::Debug for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            DocumentSource::Buffer { contents, origin } => f
                .debug_struct("Buffer")
                .field("len", &contents.len())
                .field("origin", origin)
                .finish(),
            DocumentSource::Stream(_) => f.write_str("Stream"),
        }
    }
}

/// A parsed document together with the location it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    pub origin: Url,
    pub document: Document,
}

/// Reads raw document text from a location
#[cfg_attr(test, mockall::automock)]
pub trait SourceLoader {
    fn fetch(&self, location: &Url) -> Result<String>;
}

/// Reads `file:` locations from the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSourceLoader;

impl SourceLoader for FileSourceLoader {
    fn fetch(&self, location: &Url) -> Result<String> {
        let path = location
            .to_file_path()
            .map_err(|_| PipelineError::Parse(format!("Not a local file location: {}", location)))?;

        fs::read_to_string(&path).map_err(|e| {
            PipelineError::Parse(format!("Failed to read {}: {}", path.display(), e))
        })
    }
}

/// Fetches `http:` and `https:` locations with a blocking client
#[cfg(feature = "remote")]
#[derive(Debug, Default, Clone)]
pub struct HttpSourceLoader {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "remote")]
impl SourceLoader for HttpSourceLoader {
    fn fetch(&self, location: &Url) -> Result<String> {
        tracing::debug!(%location, "fetching remote document");

        self.client
            .get(location.clone())
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(|e| PipelineError::Parse(format!("Failed to fetch {}: {}", location, e)))
    }
}

/// Dispatches to the file or HTTP loader by URL scheme
#[derive(Debug, Default, Clone)]
pub struct DefaultSourceLoader {
    file: FileSourceLoader,
    #[cfg(feature = "remote")]
    http: HttpSourceLoader,
}

impl DefaultSourceLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SourceLoader for DefaultSourceLoader {
    fn fetch(&self, location: &Url) -> Result<String> {
        match location.scheme() {
            "file" => self.file.fetch(location),
            #[cfg(feature = "remote")]
            "http" | "https" => self.http.fetch(location),
            scheme => Err(PipelineError::Parse(format!(
                "Unsupported location scheme '{}' for {}",
                scheme, location
            ))),
        }
    }
}

/// Convert a filesystem path to an absolute `file:` URL
pub fn location_from_path(path: &Path) -> Result<Url> {
    let absolute = std::path::absolute(path)?;
    Url::from_file_path(&absolute).map_err(|_| {
        PipelineError::Parse(format!(
            "Cannot express {} as a file location",
            absolute.display()
        ))
    })
}

/// Read and parse the root document described by `source`
pub fn load_document<L: SourceLoader + ?Sized>(
    source: DocumentSource,
    loader: &L,
) -> Result<LoadedDocument> {
    match source {
        DocumentSource::Stream(_) => {
            Err(PipelineError::Parse("Streaming not supported".to_string()))
        }
        DocumentSource::Path(path) => {
            let origin = location_from_path(&path)?;
            let text = loader.fetch(&origin)?;
            let document = parse_document(&text, &origin)?;
            Ok(LoadedDocument { origin, document })
        }
        DocumentSource::Buffer { contents, origin } => {
            let origin = location_from_path(&origin)?;
            let text = String::from_utf8(contents).map_err(|e| {
                PipelineError::Parse(format!("Document {} is not valid UTF-8: {}", origin, e))
            })?;
            let document = parse_document(&text, &origin)?;
            Ok(LoadedDocument { origin, document })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Syntax {
    Json,
    Yaml,
    Unknown,
}

fn syntax_of(location: &Url) -> Syntax {
    let path = location.path().to_ascii_lowercase();
    if path.ends_with(".json") {
        Syntax::Json
    } else if path.ends_with(".yaml") || path.ends_with(".yml") {
        Syntax::Yaml
    } else {
        Syntax::Unknown
    }
}

/// Parse document text as JSON or YAML, guided by the location's extension
pub fn parse_document(text: &str, location: &Url) -> Result<Document> {
    match syntax_of(location) {
        Syntax::Json => serde_json::from_str(text).map_err(|e| {
            PipelineError::Parse(format!("Failed to parse JSON document {}: {}", location, e))
        }),
        Syntax::Yaml => parse_yaml(text).map_err(|e| {
            PipelineError::Parse(format!("Failed to parse YAML document {}: {}", location, e))
        }),
        Syntax::Unknown => serde_json::from_str(text)
            .or_else(|_| parse_yaml(text))
            .map_err(|e| {
                PipelineError::Parse(format!(
                    "Failed to parse document {} as JSON or YAML: {}",
                    location, e
                ))
            }),
    }
}

fn parse_yaml(text: &str) -> std::result::Result<Value, String> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| e.to_string())?;
    yaml_to_json(yaml)
}

/// Convert YAML into a JSON tree, stringifying non-string mapping keys
///
/// YAML allows `200:` as an integer key; Swagger treats response codes as
/// strings, so every key is rendered to its textual form.
fn yaml_to_json(yaml: serde_yaml::Value) -> std::result::Result<Value, String> {
    use serde_yaml::Value as Yaml;

    Ok(match yaml {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("unsupported number {}", n))?
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<std::result::Result<_, _>>()?,
        ),
        Yaml::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                map.insert(yaml_key(key)?, yaml_to_json(value)?);
            }
            Value::Object(map)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

fn yaml_key(key: serde_yaml::Value) -> std::result::Result<String, String> {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        Yaml::Tagged(tagged) => yaml_key(tagged.value),
        other => Err(format!("unsupported mapping key {:?}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn location(path: &str) -> Url {
        Url::parse(&format!("file:///specs/{}", path)).unwrap()
    }

    #[test]
    fn test_parse_yaml_stringifies_status_codes() {
        let yaml = r#"
swagger: "2.0"
paths:
  /pets:
    get:
      responses:
        200:
          description: ok
"#;
        let doc = parse_document(yaml, &location("petstore.yaml")).unwrap();
        assert_eq!(
            doc["paths"]["/pets"]["get"]["responses"]["200"]["description"],
            json!("ok")
        );
    }

    #[test]
    fn test_parse_preserves_declared_key_order() {
        let yaml = "paths:\n  /z: {}\n  /a: {}\n  /m: {}\n";
        let doc = parse_document(yaml, &location("api.yml")).unwrap();
        let keys: Vec<&String> = doc["paths"].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["/z", "/a", "/m"]);
    }

    #[test]
    fn test_unknown_extension_falls_back_to_yaml() {
        let doc = parse_document("swagger: '2.0'", &location("api.spec")).unwrap();
        assert_eq!(doc, json!({"swagger": "2.0"}));

        let doc = parse_document(r#"{"swagger": "2.0"}"#, &location("api.spec")).unwrap();
        assert_eq!(doc, json!({"swagger": "2.0"}));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let result = parse_document("{ not json", &location("api.json"));
        assert!(matches!(result, Err(PipelineError::Parse(_))));
    }

    #[test]
    fn test_stream_source_is_rejected() {
        let mut loader = MockSourceLoader::new();
        loader.expect_fetch().never();

        let source = DocumentSource::Stream(Box::new(std::io::empty()));
        let result = load_document(source, &loader);
        assert!(matches!(
            result,
            Err(PipelineError::Parse(message)) if message == "Streaming not supported"
        ));
    }

    #[test]
    fn test_buffer_source_uses_origin() {
        let loader = MockSourceLoader::new();
        let source = DocumentSource::Buffer {
            contents: br#"{"swagger": "2.0"}"#.to_vec(),
            origin: PathBuf::from("/specs/api.json"),
        };

        let loaded = load_document(source, &loader).unwrap();
        assert_eq!(loaded.origin.scheme(), "file");
        assert!(loaded.origin.path().ends_with("/specs/api.json"));
        assert_eq!(loaded.document, json!({"swagger": "2.0"}));
    }

    #[test]
    fn test_path_source_reads_through_loader() {
        let mut loader = MockSourceLoader::new();
        loader
            .expect_fetch()
            .withf(|url| url.path().ends_with("/petstore.yaml"))
            .times(1)
            .returning(|_| Ok("swagger: '2.0'\n".to_string()));

        let loaded =
            load_document(DocumentSource::Path(PathBuf::from("petstore.yaml")), &loader).unwrap();
        assert_eq!(loaded.document, json!({"swagger": "2.0"}));
    }

    #[test]
    fn test_default_loader_rejects_unknown_scheme() {
        let loader = DefaultSourceLoader::new();
        let result = loader.fetch(&Url::parse("ftp://example.com/api.json").unwrap());
        assert!(matches!(result, Err(PipelineError::Parse(_))));
    }
}
