//! `$ref` resolution
//!
//! Resolution runs at one of two depths:
//!
//! - [`ResolutionDepth::External`] replaces references that leave the root
//!   document and keeps same-document (`#/...`) references intact, so the
//!   validator sees the shape the author wrote.
//! - [`ResolutionDepth::Full`] additionally replaces every internal reference,
//!   leaving no reference node anywhere in the tree.
//!
//! Targets are copied into each referencing site. Copies are memoized per
//! pointer within a single call, and no state survives between calls.

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::{Map, Value};
use swagger_pipeline_common::document::{is_internal_reference, reference_target};
use swagger_pipeline_common::{PipelineError, ResolutionCause, Result};
use url::Url;

use crate::pointer;
use crate::source::{
    load_document, parse_document, DefaultSourceLoader, DocumentSource, LoadedDocument,
    SourceLoader,
};

/// How far resolution goes in the root document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionDepth {
    /// External references only
    External,
    /// Every reference
    Full,
}

/// Resolves `$ref` pointers through a [`SourceLoader`]
#[derive(Debug, Default)]
pub struct ReferenceResolver<L = DefaultSourceLoader> {
    loader: L,
}

impl ReferenceResolver<DefaultSourceLoader> {
    /// Resolver reading files and (with the `remote` feature) HTTP locations
    pub fn new() -> Self {
        Self::with_loader(DefaultSourceLoader::new())
    }
}

impl<L: SourceLoader> ReferenceResolver<L> {
    pub fn with_loader(loader: L) -> Self {
        Self { loader }
    }

    /// Read and parse the root document without resolving anything
    pub fn load(&self, source: DocumentSource) -> Result<LoadedDocument> {
        load_document(source, &self.loader)
    }

    /// Load the document and replace its external references
    pub fn resolve_external(&self, source: DocumentSource) -> Result<LoadedDocument> {
        let loaded = self.load(source)?;
        self.resolve(&loaded, ResolutionDepth::External)
    }

    /// Replace every remaining reference
    pub fn resolve_all(&self, document: &LoadedDocument) -> Result<LoadedDocument> {
        self.resolve(document, ResolutionDepth::Full)
    }

    /// Resolve `document` to the requested depth
    pub fn resolve(
        &self,
        document: &LoadedDocument,
        depth: ResolutionDepth,
    ) -> Result<LoadedDocument> {
        tracing::debug!(origin = %document.origin, ?depth, "resolving references");

        let mut session = Session::new(&self.loader, document);
        let root = Rc::clone(&session.root);
        let resolved = session.resolve_value(&root, &document.origin, &root, depth)?;

        tracing::debug!(
            origin = %document.origin,
            external_documents = session.documents.len() - 1,
            resolved_targets = session.memo.len(),
            "references resolved"
        );

        Ok(LoadedDocument {
            origin: document.origin.clone(),
            document: resolved,
        })
    }
}

/// State for one resolution call
struct Session<'a, L: ?Sized> {
    loader: &'a L,
    root: Rc<Value>,
    /// Parsed documents keyed by location without fragment
    documents: HashMap<String, Rc<Value>>,
    /// Fully resolved targets keyed by `location#fragment`
    memo: HashMap<String, Value>,
    /// Targets currently being resolved, outermost first
    stack: Vec<String>,
}

impl<'a, L: SourceLoader + ?Sized> Session<'a, L> {
    fn new(loader: &'a L, document: &LoadedDocument) -> Self {
        let root = Rc::new(document.document.clone());
        let mut documents = HashMap::new();
        documents.insert(document_key(&document.origin), Rc::clone(&root));

        Self {
            loader,
            root,
            documents,
            memo: HashMap::new(),
            stack: Vec::new(),
        }
    }

    fn resolve_value(
        &mut self,
        value: &Value,
        base: &Url,
        doc: &Value,
        depth: ResolutionDepth,
    ) -> Result<Value> {
        if let Some(reference) = reference_target(value) {
            return self.resolve_reference(value, reference, base, doc, depth);
        }

        match value {
            Value::Object(map) => {
                let mut resolved = Map::with_capacity(map.len());
                for (key, child) in map {
                    resolved.insert(key.clone(), self.resolve_value(child, base, doc, depth)?);
                }
                Ok(Value::Object(resolved))
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.resolve_value(item, base, doc, depth))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            _ => Ok(value.clone()),
        }
    }

    fn resolve_reference(
        &mut self,
        node: &Value,
        reference: &str,
        base: &Url,
        doc: &Value,
        depth: ResolutionDepth,
    ) -> Result<Value> {
        if is_internal_reference(reference) {
            if depth == ResolutionDepth::External {
                return Ok(node.clone());
            }
            return self.resolve_target(reference, base, doc, &reference[1..]);
        }

        let target = base.join(reference).map_err(|e| {
            PipelineError::unresolved(reference, ResolutionCause::Malformed(e.to_string()))
        })?;
        let fragment = target.fragment().unwrap_or_default().to_string();
        let external = self.fetch(reference, &target)?;

        // External content is resolved completely against its own document,
        // whatever the requested depth for the root.
        let location = strip_fragment(&target);
        self.resolve_target(reference, &location, &external, &fragment)
    }

    fn resolve_target(
        &mut self,
        reference: &str,
        location: &Url,
        doc: &Value,
        fragment: &str,
    ) -> Result<Value> {
        let key = format!("{}#{}", document_key(location), fragment);
        if let Some(resolved) = self.memo.get(&key) {
            return Ok(resolved.clone());
        }

        if self.stack.contains(&key) {
            let mut chain = self.stack.clone();
            chain.push(key);
            return Err(PipelineError::unresolved(
                reference,
                ResolutionCause::Circular(chain.join(" -> ")),
            ));
        }

        let target = pointer::lookup_fragment(doc, fragment)
            .map_err(|cause| PipelineError::unresolved(reference, cause))?;

        self.stack.push(key.clone());
        let resolved = self.resolve_value(target, location, doc, ResolutionDepth::Full);
        self.stack.pop();

        let resolved = resolved?;
        self.memo.insert(key, resolved.clone());
        Ok(resolved)
    }

    fn fetch(&mut self, reference: &str, target: &Url) -> Result<Rc<Value>> {
        let key = document_key(target);
        if let Some(doc) = self.documents.get(&key) {
            return Ok(Rc::clone(doc));
        }

        let location = strip_fragment(target);
        tracing::debug!(%location, "loading external document");

        let document = self
            .loader
            .fetch(&location)
            .and_then(|text| parse_document(&text, &location))
            .map_err(|e| {
                PipelineError::unresolved(
                    reference,
                    ResolutionCause::Load {
                        location: location.to_string(),
                        message: e.to_string(),
                    },
                )
            })?;

        let document = Rc::new(document);
        self.documents.insert(key, Rc::clone(&document));
        Ok(document)
    }
}

fn strip_fragment(location: &Url) -> Url {
    let mut location = location.clone();
    location.set_fragment(None);
    location
}

fn document_key(location: &Url) -> String {
    strip_fragment(location).to_string()
}
