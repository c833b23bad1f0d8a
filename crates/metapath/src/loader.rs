//! Document loading: the synchronous retrieval collaborator behind
//! `doc` and `doc-available`.
//!
//! The core never parses documents; a loader pairs retrieval with an
//! injected deserializer and hands back bound data ready for node graph
//! construction. Retrieval is blocking with no built-in timeout; callers
//! needing bounded latency wrap the loader.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use metapath_schema::{BoundValue, ModuleDef, QName};
use url::Url;

use crate::error::MetapathError;

/// A retrieved, deserialized document ready to become a document node.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub uri: Url,
    pub module: Arc<ModuleDef>,
    pub root_name: QName,
    pub value: BoundValue,
}

/// Synchronous document retrieval.
///
/// Implementations must accept at least `file:` URIs; HTTP(S) support is an
/// implementation concern and plugs in without core changes.
pub trait DocumentLoader: Debug {
    fn load(&self, uri: &Url) -> Result<LoadedDocument, MetapathError>;

    /// Lightweight availability probe. Never errors: any failure is `false`.
    fn is_available(&self, uri: &Url) -> bool {
        self.load(uri).is_ok()
    }
}

/// Loader over a pre-populated set of documents. Always available; the
/// default loader of a fresh dynamic context.
#[derive(Debug, Default)]
pub struct InMemoryDocumentLoader {
    documents: HashMap<Url, LoadedDocument>,
}

impl InMemoryDocumentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, document: LoadedDocument) {
        self.documents.insert(document.uri.clone(), document);
    }

    pub fn with_document(mut self, document: LoadedDocument) -> Self {
        self.add(document);
        self
    }
}

impl DocumentLoader for InMemoryDocumentLoader {
    fn load(&self, uri: &Url) -> Result<LoadedDocument, MetapathError> {
        self.documents
            .get(uri)
            .cloned()
            .ok_or_else(|| MetapathError::retrieval(uri.as_str(), "document not registered"))
    }

    fn is_available(&self, uri: &Url) -> bool {
        self.documents.contains_key(uri)
    }
}

/// Deserializer callback: raw text to (root name, bound value) against a
/// fixed module.
pub type Deserializer = dyn Fn(&str) -> Result<(QName, BoundValue), MetapathError>;

/// Loader for `file:` URIs, delegating parsing to an injected deserializer.
pub struct FilesystemDocumentLoader {
    module: Arc<ModuleDef>,
    deserialize: Box<Deserializer>,
}

impl Debug for FilesystemDocumentLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilesystemDocumentLoader")
            .field("module", &self.module.short_name)
            .finish()
    }
}

impl FilesystemDocumentLoader {
    pub fn new(module: Arc<ModuleDef>, deserialize: Box<Deserializer>) -> Self {
        Self {
            module,
            deserialize,
        }
    }
}

impl DocumentLoader for FilesystemDocumentLoader {
    fn load(&self, uri: &Url) -> Result<LoadedDocument, MetapathError> {
        if uri.scheme() != "file" {
            return Err(MetapathError::retrieval(
                uri.as_str(),
                format!("unsupported scheme '{}'", uri.scheme()),
            ));
        }
        let path = uri
            .to_file_path()
            .map_err(|_| MetapathError::UriError(uri.as_str().to_string()))?;
        log::debug!("loading document from {}", path.display());
        let text = std::fs::read_to_string(&path)
            .map_err(|e| MetapathError::retrieval(uri.as_str(), e.to_string()))?;
        let (root_name, value) = (self.deserialize)(&text)?;
        Ok(LoadedDocument {
            uri: uri.clone(),
            module: Arc::clone(&self.module),
            root_name,
            value,
        })
    }

    fn is_available(&self, uri: &Url) -> bool {
        match uri.to_file_path() {
            Ok(path) => path.is_file(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metapath_schema::tests::{computer_module, computer_value};
    use std::io::Write;

    fn sample_document(uri: &str) -> LoadedDocument {
        let module = Arc::new(computer_module());
        let root_name = module.qualify("computer");
        LoadedDocument {
            uri: Url::parse(uri).unwrap(),
            module,
            root_name,
            value: computer_value(),
        }
    }

    #[test]
    fn test_in_memory_loader() {
        let uri = Url::parse("https://example.com/pc.xml").unwrap();
        let loader =
            InMemoryDocumentLoader::new().with_document(sample_document("https://example.com/pc.xml"));

        assert!(loader.is_available(&uri));
        assert!(loader.load(&uri).is_ok());

        let missing = Url::parse("https://example.com/other.xml").unwrap();
        assert!(!loader.is_available(&missing));
        assert!(matches!(
            loader.load(&missing),
            Err(MetapathError::DocumentRetrieval { .. })
        ));
    }

    #[test]
    fn test_filesystem_loader_probe() {
        let module = Arc::new(computer_module());
        let root_name = module.qualify("computer");
        let loader = FilesystemDocumentLoader::new(
            Arc::clone(&module),
            Box::new(move |_text| Ok((root_name.clone(), computer_value()))),
        );

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "<computer/>").unwrap();
        let uri = Url::from_file_path(file.path()).unwrap();

        assert!(loader.is_available(&uri));
        let doc = loader.load(&uri).unwrap();
        assert_eq!(doc.root_name.local, "computer");

        let gone = Url::parse("file:///does/not/exist.xml").unwrap();
        assert!(!loader.is_available(&gone));
        assert!(loader.load(&gone).is_err());

        let http = Url::parse("https://example.com/x.xml").unwrap();
        assert!(loader.load(&http).is_err());
    }
}
