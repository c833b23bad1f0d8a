//! Static and dynamic evaluation contexts.
//!
//! A [`StaticContext`] is built once per module or document and never
//! changes; a [`DynamicContext`] wraps one for a single evaluation and is
//! passed explicitly to every operation. There is no ambient state.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use chrono::{FixedOffset, Offset, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use url::Url;

use crate::eval::ExpressionEvaluator;
use crate::loader::{DocumentLoader, InMemoryDocumentLoader};
use crate::types::DateTime;

/// Compile-time environment: namespace bindings and the base URI.
#[derive(Debug, Clone, Default)]
pub struct StaticContext {
    namespaces: HashMap<String, String>,
    default_namespace: Option<String>,
    base_uri: Option<Url>,
}

impl StaticContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for a schema namespace, as used by orphaned definition nodes.
    pub fn for_namespace(namespace: Option<String>, base_uri: Option<Url>) -> Self {
        Self {
            namespaces: HashMap::new(),
            default_namespace: namespace,
            base_uri,
        }
    }

    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), uri.into());
        self
    }

    pub fn with_default_namespace(mut self, uri: impl Into<String>) -> Self {
        self.default_namespace = Some(uri.into());
        self
    }

    pub fn with_base_uri(mut self, base_uri: Url) -> Self {
        self.base_uri = Some(base_uri);
        self
    }

    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.namespaces.get(prefix).map(String::as_str)
    }

    pub fn default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }

    pub fn base_uri(&self) -> Option<&Url> {
        self.base_uri.as_ref()
    }

    /// Resolve a possibly-relative reference against the base URI.
    pub fn resolve(&self, reference: &str) -> Result<Url, url::ParseError> {
        match &self.base_uri {
            Some(base) => base.join(reference),
            None => Url::parse(reference),
        }
    }
}

/// Default cap on recursive-path evaluation depth.
pub const DEFAULT_DEPTH_LIMIT: usize = 256;

/// Evaluation-time environment for one query evaluation.
///
/// Carries the evaluation instant (captured once at construction), the
/// implicit timezone, the document loader, the optional expression
/// evaluator, and the RNG that backs the non-deterministic `use-any`
/// merge policy.
#[derive(Clone)]
pub struct DynamicContext {
    static_context: Arc<StaticContext>,
    current_date_time: DateTime,
    implicit_timezone: FixedOffset,
    loader: Rc<dyn DocumentLoader>,
    evaluator: Option<Rc<dyn ExpressionEvaluator>>,
    rng: Rc<RefCell<StdRng>>,
    depth_limit: usize,
}

impl DynamicContext {
    pub fn new(static_context: Arc<StaticContext>) -> Self {
        let now = Utc::now();
        let utc = Utc.fix();
        Self {
            static_context,
            current_date_time: DateTime {
                value: now.naive_utc(),
                offset: Some(utc),
            },
            implicit_timezone: utc,
            loader: Rc::new(InMemoryDocumentLoader::new()),
            evaluator: None,
            rng: Rc::new(RefCell::new(StdRng::seed_from_u64(0))),
            depth_limit: DEFAULT_DEPTH_LIMIT,
        }
    }

    pub fn with_current_date_time(mut self, current: DateTime) -> Self {
        self.current_date_time = current;
        self
    }

    pub fn with_implicit_timezone(mut self, timezone: FixedOffset) -> Self {
        self.implicit_timezone = timezone;
        self
    }

    pub fn with_loader(mut self, loader: Rc<dyn DocumentLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_evaluator(mut self, evaluator: Rc<dyn ExpressionEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = Rc::new(RefCell::new(StdRng::seed_from_u64(seed)));
        self
    }

    pub fn with_depth_limit(mut self, depth_limit: usize) -> Self {
        self.depth_limit = depth_limit;
        self
    }

    pub fn static_context(&self) -> &StaticContext {
        &self.static_context
    }

    pub fn current_date_time(&self) -> DateTime {
        self.current_date_time
    }

    pub fn implicit_timezone(&self) -> FixedOffset {
        self.implicit_timezone
    }

    pub fn loader(&self) -> &dyn DocumentLoader {
        self.loader.as_ref()
    }

    pub fn evaluator(&self) -> Option<&dyn ExpressionEvaluator> {
        self.evaluator.as_deref()
    }

    pub fn rng(&self) -> &Rc<RefCell<StdRng>> {
        &self.rng
    }

    pub fn depth_limit(&self) -> usize {
        self.depth_limit
    }
}

impl Default for DynamicContext {
    fn default() -> Self {
        Self::new(Arc::new(StaticContext::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_context_resolution() {
        let ctx = StaticContext::new()
            .with_base_uri(Url::parse("file:///data/docs/").unwrap());
        let resolved = ctx.resolve("catalog.xml").unwrap();
        assert_eq!(resolved.as_str(), "file:///data/docs/catalog.xml");

        let bare = StaticContext::new();
        assert!(bare.resolve("relative.xml").is_err());
        assert!(bare.resolve("https://example.com/doc.xml").is_ok());
    }

    #[test]
    fn test_dynamic_context_captures_instant_once() {
        let ctx = DynamicContext::default();
        let a = ctx.current_date_time();
        let b = ctx.current_date_time();
        assert_eq!(a, b);
    }
}
