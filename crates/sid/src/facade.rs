//! Facade
//!
//! [`SidHost`] owns a page's document and at most one active [`Sid`]
//! instance. Agents talk to the instance; everything it exposes routes to
//! the registry, executor, context reader or legacy tracker.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use sid_dom::Document;

use crate::context::{ContextReader, SidContext};
use crate::{
    Action, Completion, CompletionTracker, ExecuteOptions, Executor, InteractionResult, OperationRecord, Registry,
    SID_VERSION, SidAuth, SidConfig, SidElement, SidError, TrackerError,
};

/// Owner of a document and its SID instance
#[derive(Debug)]
pub struct SidHost {
    document: Rc<RefCell<Document>>,
    instance: RefCell<Option<Rc<Sid>>>,
}

impl SidHost {
    pub fn new(document: Document) -> Self {
        Self {
            document: Rc::new(RefCell::new(document)),
            instance: RefCell::new(None),
        }
    }

    /// Parse `html` into a fresh document
    pub fn from_html(html: &str) -> Result<Self, sid_html::ParseError> {
        Ok(Self::new(sid_html::parse(html)?))
    }

    pub fn document(&self) -> Rc<RefCell<Document>> {
        Rc::clone(&self.document)
    }

    /// Create the instance; an active instance is returned unchanged, a
    /// destroyed one is replaced
    pub fn init(&self, config: SidConfig) -> Rc<Sid> {
        if let Some(existing) = self.instance.borrow().as_ref().filter(|sid| sid.is_available()) {
            tracing::warn!("SID already initialized, returning the existing instance");
            return Rc::clone(existing);
        }
        let sid = Rc::new(Sid::new(Rc::clone(&self.document), config));
        *self.instance.borrow_mut() = Some(Rc::clone(&sid));
        tracing::info!(version = SID_VERSION, "SID initialized");
        sid
    }

    pub fn sid(&self) -> Option<Rc<Sid>> {
        self.instance.borrow().clone().filter(|sid| sid.is_available())
    }

    pub fn is_active(&self) -> bool {
        self.instance.borrow().as_ref().is_some_and(|sid| sid.is_available())
    }

    /// Tear down the active instance, if any
    pub fn destroy(&self) {
        let instance = self.instance.borrow_mut().take();
        if let Some(sid) = instance {
            sid.destroy();
            tracing::info!("SID destroyed");
        }
    }
}

/// Agent-facing SID instance
pub struct Sid {
    document: Rc<RefCell<Document>>,
    registry: Rc<RefCell<Registry>>,
    executor: Executor,
    context: ContextReader,
    tracker: CompletionTracker,
    config: SidConfig,
    destroyed: Cell<bool>,
}

impl std::fmt::Debug for Sid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sid")
            .field("config", &self.config)
            .field("pending", &self.executor.pending_count())
            .field("destroyed", &self.destroyed.get())
            .finish_non_exhaustive()
    }
}

impl Sid {
    pub fn new(document: Rc<RefCell<Document>>, config: SidConfig) -> Self {
        let registry = Rc::new(RefCell::new(Registry::new(Rc::clone(&document), config.observe_mutations)));
        let executor = Executor::new(Rc::clone(&document), Rc::clone(&registry));
        Self {
            document,
            registry,
            executor,
            context: ContextReader::new(),
            tracker: CompletionTracker::new(),
            config,
            destroyed: Cell::new(false),
        }
    }

    pub fn is_available(&self) -> bool {
        !self.destroyed.get()
    }

    pub fn version(&self) -> &'static str {
        SID_VERSION
    }

    pub fn elements(&self) -> Vec<SidElement> {
        self.registry.borrow_mut().elements()
    }

    pub fn get_element(&self, id: &str) -> Option<SidElement> {
        self.registry.borrow_mut().get(id)
    }

    pub async fn interact(&self, id: &str, action: Action, options: ExecuteOptions) -> InteractionResult {
        self.executor.execute(id, action, options).await
    }

    /// Signal completion of a tracked interaction
    pub fn complete(&self, id: &str, completion: Completion) -> bool {
        self.executor.complete(id, completion)
    }

    pub fn context(&self) -> Rc<SidContext> {
        self.context.read(&self.document.borrow())
    }

    pub fn app_context(&self) -> Option<String> {
        self.context().app.clone()
    }

    pub fn page_context(&self) -> Option<String> {
        self.context().page.clone()
    }

    /// Re-read the context block on the next access
    pub fn refresh_context(&self) -> Rc<SidContext> {
        self.context.invalidate();
        self.context()
    }

    pub fn get_operation(&self, id: &str) -> Option<OperationRecord> {
        self.tracker.get(id)
    }

    pub async fn poll_operation(
        &self,
        id: &str,
        timeout: Duration,
        interval: Duration,
    ) -> Result<OperationRecord, TrackerError> {
        self.tracker.poll(id, timeout, interval).await
    }

    pub fn tracker(&self) -> &CompletionTracker {
        &self.tracker
    }

    pub fn auth(&self) -> Option<&SidAuth> {
        self.config.auth.as_ref()
    }

    /// Hand `token` to the application's authentication hook
    pub async fn authenticate(&self, token: &str) -> Result<(), SidError> {
        let callback = self.config.authenticate.clone().ok_or(SidError::AuthNotConfigured)?;
        callback(token.to_string()).await.map_err(SidError::AuthFailed)
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Stop observing, clear the registry and legacy operations, and cancel
    /// pending interactions
    pub fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        self.executor.cancel_all();
        self.registry.borrow_mut().destroy();
        self.context.invalidate();
        self.tracker.clear();
    }
}
