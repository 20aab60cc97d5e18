//! Context Reader
//!
//! Page and application metadata published in a
//! `<script type="application/sid+json">` block.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sid_dom::Document;

/// Script type carrying the context block
pub const CONTEXT_SCRIPT_TYPE: &str = "application/sid+json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
}

impl SidContext {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Caches the parsed context block until invalidated
#[derive(Debug, Default)]
pub struct ContextReader {
    cached: RefCell<Option<Rc<SidContext>>>,
}

impl ContextReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parsed context, reading the document only on the first call
    pub fn read(&self, doc: &Document) -> Rc<SidContext> {
        if let Some(context) = self.cached.borrow().as_ref() {
            return Rc::clone(context);
        }
        let context = Rc::new(Self::extract(doc));
        *self.cached.borrow_mut() = Some(Rc::clone(&context));
        context
    }

    /// Forget the cached record
    pub fn invalidate(&self) {
        self.cached.borrow_mut().take();
    }

    fn extract(doc: &Document) -> SidContext {
        let selector = format!("script[type=\"{CONTEXT_SCRIPT_TYPE}\"]");
        let script = match doc.query_selector(&selector) {
            Ok(Some(script)) => script,
            Ok(None) => return SidContext::default(),
            Err(e) => {
                tracing::warn!("context lookup failed: {}", e);
                return SidContext::default();
            }
        };
        Self::parse(&doc.text_content(script))
    }

    /// Parse the body of a context block; anything unusable yields an empty record
    pub fn parse(content: &str) -> SidContext {
        if content.trim().is_empty() {
            return SidContext::default();
        }
        let object = match serde_json::from_str::<Value>(content) {
            Ok(Value::Object(object)) => object,
            Ok(_) => {
                tracing::warn!("context block is not a JSON object");
                return SidContext::default();
            }
            Err(e) => {
                tracing::warn!("malformed context block: {}", e);
                return SidContext::default();
            }
        };
        let field = |name: &str| object.get(name).and_then(Value::as_str).map(str::to_string);
        SidContext {
            version: field("version"),
            app: field("app"),
            page: field("page"),
            auth: field("auth"),
        }
    }
}
