//! Interaction Executor
//!
//! Runs an action against a registered element. Preconditions are checked in
//! a fixed order and reported as an error result; native dispatch then goes
//! through the document so mutation observers and the event log see it.
//!
//! Tracked (`async`) interactions park a completion sender under the element
//! id and race it against a timer. The application settles them through
//! [`Executor::complete`].

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use sid_dom::{ControlKind, Document, DomError, DomEvent, EventType, NodeId};
use smol::channel::{self, Sender};
use smol::{Timer, future};

use crate::attributes::{self, TrackingKind};
use crate::{
    Action, ActionKind, ActionValue, Completion, ExecuteOptions, InteractionResult, Registry, SidError,
};

#[derive(Debug)]
struct PendingOperation {
    /// Identifies the call that registered the entry
    seq: u64,
    sender: Sender<Completion>,
}

/// Element resolved and checked, ready for dispatch
#[derive(Debug)]
struct Prepared {
    node: NodeId,
    desc: String,
    tracking: TrackingKind,
    destination: Option<String>,
}

#[derive(Debug)]
pub struct Executor {
    document: Rc<RefCell<Document>>,
    registry: Rc<RefCell<Registry>>,
    pending: RefCell<HashMap<String, PendingOperation>>,
    next_seq: Cell<u64>,
}

impl Executor {
    pub fn new(document: Rc<RefCell<Document>>, registry: Rc<RefCell<Registry>>) -> Self {
        Self {
            document,
            registry,
            pending: RefCell::new(HashMap::new()),
            next_seq: Cell::new(1),
        }
    }

    /// Perform `action` on the element registered as `id`
    pub async fn execute(&self, id: &str, action: Action, options: ExecuteOptions) -> InteractionResult {
        let prepared = match self.prepare(id, &action) {
            Ok(prepared) => prepared,
            Err(e) => {
                tracing::debug!(element = id, action = %action.kind, "interaction rejected: {}", e);
                return InteractionResult::failure(&e);
            }
        };

        match prepared.tracking {
            TrackingKind::None => self.untracked(id, &prepared, &action, InteractionResult::completed()),
            TrackingKind::Navigation => {
                let result = InteractionResult::navigation(prepared.destination.clone());
                self.untracked(id, &prepared, &action, result)
            }
            TrackingKind::External => {
                let result = InteractionResult::external(&prepared.desc);
                self.untracked(id, &prepared, &action, result)
            }
            TrackingKind::Async => self.tracked(id, &prepared, &action, options.timeout()).await,
        }
    }

    fn untracked(&self, id: &str, prepared: &Prepared, action: &Action, result: InteractionResult) -> InteractionResult {
        match self.dispatch(prepared.node, action) {
            Ok(()) => {
                tracing::debug!(element = id, action = %action.kind, status = ?result.status, "interaction done");
                result
            }
            Err(e) => {
                tracing::warn!(element = id, action = %action.kind, "dispatch failed: {}", e);
                InteractionResult::failure(&e)
            }
        }
    }

    async fn tracked(&self, id: &str, prepared: &Prepared, action: &Action, timeout: Duration) -> InteractionResult {
        let (sender, receiver) = channel::bounded(1);
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        {
            let mut pending = self.pending.borrow_mut();
            // a closed sender belongs to a call whose future was dropped
            if pending.get(id).is_some_and(|op| !op.sender.is_closed()) {
                let e = SidError::AlreadyPending(id.to_string());
                tracing::debug!(element = id, "{}", e);
                return InteractionResult::failure(&e);
            }
            pending.insert(id.to_string(), PendingOperation { seq, sender });
        }

        if let Err(e) = self.dispatch(prepared.node, action) {
            self.remove_pending(id, seq);
            tracing::warn!(element = id, action = %action.kind, "dispatch failed: {}", e);
            return InteractionResult::failure(&e);
        }
        tracing::debug!(element = id, action = %action.kind, timeout_ms = timeout.as_millis() as u64, "awaiting completion");

        let outcome = future::or(async { Some(receiver.recv().await) }, async {
            Timer::after(timeout).await;
            None
        })
        .await;

        match outcome {
            Some(Ok(completion)) => InteractionResult::from_completion(completion),
            Some(Err(_)) => InteractionResult::failure(&SidError::Cancelled),
            None => {
                self.remove_pending(id, seq);
                tracing::debug!(element = id, "interaction timed out");
                InteractionResult::timeout(timeout)
            }
        }
    }

    fn remove_pending(&self, id: &str, seq: u64) {
        let mut pending = self.pending.borrow_mut();
        if pending.get(id).is_some_and(|op| op.seq == seq) {
            pending.remove(id);
        }
    }

    /// Settle the pending interaction for `id`; false when nothing is waiting
    pub fn complete(&self, id: &str, completion: Completion) -> bool {
        let Some(operation) = self.pending.borrow_mut().remove(id) else {
            tracing::debug!(element = id, "completion with nothing pending");
            return false;
        };
        operation.sender.try_send(completion).is_ok()
    }

    /// Drop every pending sender; suspended calls resolve as cancelled
    pub fn cancel_all(&self) {
        let cancelled = std::mem::take(&mut *self.pending.borrow_mut());
        if !cancelled.is_empty() {
            tracing::debug!(count = cancelled.len(), "pending interactions cancelled");
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.borrow().contains_key(id)
    }

    fn prepare(&self, id: &str, action: &Action) -> Result<Prepared, SidError> {
        let element = self
            .registry
            .borrow_mut()
            .get(id)
            .ok_or_else(|| SidError::NotFound(id.to_string()))?;
        if element.disabled {
            return Err(SidError::Disabled {
                id: id.to_string(),
                reason: element.disabled_reason,
            });
        }

        let doc = self.document.borrow();
        let nodes = doc.query_selector_all(&element.selector)?;
        let [node] = nodes.as_slice() else {
            return Err(SidError::NotInDom {
                id: id.to_string(),
                matches: nodes.len(),
            });
        };
        let node = *node;

        if let Some(expected) = required_kind(action.kind) {
            if doc.control_kind(node) != expected {
                return Err(SidError::Unsupported {
                    action: action.kind,
                    expected: expected.describe(),
                });
            }
        }
        check_value(action)?;

        let (tracking, destination) = attributes::live_tracking(&doc, node);
        Ok(Prepared {
            node,
            desc: element.desc,
            tracking,
            destination,
        })
    }

    fn dispatch(&self, node: NodeId, action: &Action) -> Result<(), SidError> {
        let mut doc = self.document.borrow_mut();
        let invalid = |e: DomError| match e {
            DomError::InvalidValue(reason) => SidError::InvalidValue { action: action.kind, reason },
            other => SidError::Dispatch(other),
        };

        match (action.kind, action.value.as_ref()) {
            (ActionKind::Click, _) => doc.click(node)?,
            (ActionKind::Fill, Some(ActionValue::Text(text))) => {
                doc.set_value(node, text).map_err(invalid)?;
                doc.dispatch_event(node, DomEvent::bubbling(EventType::Input))?;
                doc.dispatch_event(node, DomEvent::bubbling(EventType::Change))?;
            }
            (ActionKind::Select, Some(ActionValue::Text(value))) => {
                doc.select_value(node, value).map_err(invalid)?;
                doc.dispatch_event(node, DomEvent::bubbling(EventType::Change))?;
            }
            (ActionKind::Check, value) => {
                let checked = !matches!(value, Some(ActionValue::Bool(false)));
                doc.set_checked(node, checked)?;
                doc.dispatch_event(node, DomEvent::bubbling(EventType::Change))?;
            }
            (ActionKind::Hover, _) => {
                doc.dispatch_event(node, DomEvent::new(EventType::MouseEnter))?;
                doc.dispatch_event(node, DomEvent::bubbling(EventType::MouseOver))?;
            }
            (ActionKind::Upload, Some(ActionValue::File(file))) => {
                doc.set_files(node, vec![file.clone()]).map_err(invalid)?;
                doc.dispatch_event(node, DomEvent::bubbling(EventType::Change))?;
            }
            (kind, _) => {
                return Err(SidError::InvalidValue {
                    action: kind,
                    reason: "missing or mistyped value".into(),
                });
            }
        }
        Ok(())
    }
}

/// Control kind an action needs, `None` when any element will do
fn required_kind(action: ActionKind) -> Option<ControlKind> {
    match action {
        ActionKind::Fill => Some(ControlKind::TextEntry),
        ActionKind::Select => Some(ControlKind::ChoiceList),
        ActionKind::Check => Some(ControlKind::Toggle),
        ActionKind::Upload => Some(ControlKind::FileInput),
        ActionKind::Click | ActionKind::Hover => None,
    }
}

fn check_value(action: &Action) -> Result<(), SidError> {
    let reason = match (action.kind, action.value.as_ref()) {
        (ActionKind::Fill | ActionKind::Select, Some(ActionValue::Text(_))) => return Ok(()),
        (ActionKind::Fill | ActionKind::Select, _) => "a text value is required",
        (ActionKind::Check, None | Some(ActionValue::Bool(_))) => return Ok(()),
        (ActionKind::Check, _) => "a boolean value is required",
        (ActionKind::Upload, Some(ActionValue::File(_))) => return Ok(()),
        (ActionKind::Upload, _) => "a file is required",
        (ActionKind::Click | ActionKind::Hover, _) => return Ok(()),
    };
    Err(SidError::InvalidValue {
        action: action.kind,
        reason: reason.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileData, InteractionStatus};

    fn executor(html: &str) -> Executor {
        let mut doc = sid_html::parse(html).unwrap();
        doc.set_event_recording(true);
        let doc = Rc::new(RefCell::new(doc));
        let registry = Rc::new(RefCell::new(Registry::new(Rc::clone(&doc), true)));
        Executor::new(doc, registry)
    }

    fn run(executor: &Executor, id: &str, action: Action) -> InteractionResult {
        smol::block_on(executor.execute(id, action, ExecuteOptions::default()))
    }

    fn events(executor: &Executor) -> Vec<&'static str> {
        executor
            .document
            .borrow_mut()
            .take_event_log()
            .into_iter()
            .map(|e| e.event_type.as_str())
            .collect()
    }

    #[test]
    fn test_not_found() {
        let executor = executor("<div></div>");
        let result = run(&executor, "missing", Action::click());

        assert!(!result.success);
        assert_eq!(result.status, InteractionStatus::Error);
        assert_eq!(result.error.as_deref(), Some("Element not found: missing"));
    }

    #[test]
    fn test_disabled_generic_message() {
        let executor = executor(r#"<button data-sid="b" data-sid-disabled="true">B</button>"#);
        let result = run(&executor, "b", Action::click());
        assert_eq!(result.error.as_deref(), Some("Element is disabled"));
        assert!(events(&executor).is_empty());
    }

    #[test]
    fn test_disabled_checked_before_applicability() {
        let executor = executor(r#"<div data-sid="d" data-sid-action="fill" data-sid-disabled="true"></div>"#);
        let result = run(&executor, "d", Action::fill("x"));
        assert!(result.error.unwrap().starts_with("Element is disabled"));
    }

    #[test]
    fn test_unsupported_action() {
        let executor = executor(r#"<div data-sid="d" data-sid-tracking="none">text</div>"#);

        let result = run(&executor, "d", Action::fill("x"));
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Element does not support fill: expected input or textarea"));

        let result = run(&executor, "d", Action::check(None));
        assert!(result.error.unwrap().contains("checkbox or radio input"));
    }

    #[test]
    fn test_missing_value() {
        let executor = executor(r#"<input data-sid="e" data-sid-action="fill" data-sid-tracking="none">"#);
        let result = run(&executor, "e", Action::new(ActionKind::Fill, None));
        assert_eq!(result.status, InteractionStatus::Error);
        assert!(result.error.unwrap().contains("text value is required"));
    }

    #[test]
    fn test_click_untracked() {
        let executor = executor(r#"<button data-sid="b" data-sid-tracking="none">B</button>"#);
        let result = run(&executor, "b", Action::click());

        assert!(result.success);
        assert_eq!(result.status, InteractionStatus::Completed);
        assert_eq!(events(&executor), ["click"]);
    }

    #[test]
    fn test_fill_dispatches_input_then_change() {
        let executor = executor(r#"<input data-sid="e" data-sid-action="fill" data-sid-tracking="none">"#);
        let result = run(&executor, "e", Action::fill("a@b.c"));

        assert!(result.success);
        let doc = executor.document.borrow();
        let node = doc.query_selector("[data-sid=\"e\"]").unwrap().unwrap();
        assert_eq!(doc.value(node).as_deref(), Some("a@b.c"));
        let log = doc.event_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].event_type, EventType::Input);
        assert_eq!(log[1].event_type, EventType::Change);
        assert!(log.iter().all(|e| e.bubbles && e.cancelable));
    }

    #[test]
    fn test_select_unknown_option() {
        let executor = executor(
            r#"<select data-sid="s" data-sid-action="select" data-sid-tracking="none">
                <option value="us">US</option><option value="fr">FR</option>
            </select>"#,
        );

        assert!(run(&executor, "s", Action::select("fr")).success);
        let result = run(&executor, "s", Action::select("de"));
        assert!(!result.success);
        assert!(result.error.unwrap().starts_with("Invalid value for select"));
    }

    #[test]
    fn test_check_defaults_to_checked() {
        let executor = executor(r#"<input type="checkbox" data-sid="c" data-sid-action="check" data-sid-tracking="none">"#);
        assert!(run(&executor, "c", Action::check(None)).success);

        let doc = executor.document.borrow();
        let node = doc.query_selector("[data-sid=\"c\"]").unwrap().unwrap();
        assert!(doc.checked(node));
    }

    #[test]
    fn test_hover_events() {
        let executor = executor(r#"<span data-sid="h" data-sid-action="hover" data-sid-tracking="none">?</span>"#);
        assert!(run(&executor, "h", Action::hover()).success);

        let doc = executor.document.borrow();
        let log = doc.event_log();
        assert_eq!(log[0].event_type, EventType::MouseEnter);
        assert!(!log[0].bubbles);
        assert_eq!(log[1].event_type, EventType::MouseOver);
        assert!(log[1].bubbles);
    }

    #[test]
    fn test_upload() {
        let executor = executor(r#"<input type="file" data-sid="f" data-sid-action="upload" data-sid-tracking="none">"#);
        let file = FileData::new("cv.pdf", "application/pdf", vec![1, 2, 3]);
        assert!(run(&executor, "f", Action::upload(file)).success);

        let doc = executor.document.borrow();
        let node = doc.query_selector("[data-sid=\"f\"]").unwrap().unwrap();
        assert_eq!(doc.files(node)[0].name, "cv.pdf");
    }

    #[test]
    fn test_external_uses_description() {
        let executor = executor(r#"<a data-sid="bank" data-sid-desc="Open bank" data-sid-tracking="external">Bank</a>"#);
        let result = run(&executor, "bank", Action::click());
        assert_eq!(result.status, InteractionStatus::External);
        assert_eq!(result.message.as_deref(), Some("Open bank"));
    }

    #[test]
    fn test_navigation_without_destination() {
        let executor = executor(r#"<a data-sid="next" data-sid-tracking="navigation">Next</a>"#);
        let result = run(&executor, "next", Action::click());
        assert_eq!(result.status, InteractionStatus::Navigation);
        assert_eq!(result.message.as_deref(), Some("Navigation triggered"));
    }

    #[test]
    fn test_complete_without_pending() {
        let executor = executor("<div></div>");
        assert!(!executor.complete("nothing", Completion::completed()));
        assert_eq!(executor.pending_count(), 0);
    }

    #[test]
    fn test_tracked_completion() {
        let executor = executor(r#"<button data-sid="save">Save</button>"#);

        let (result, ()) = smol::block_on(future::zip(
            executor.execute("save", Action::click(), ExecuteOptions::default()),
            async {
                future::yield_now().await;
                assert!(executor.is_pending("save"));
                assert!(executor.complete("save", Completion::completed().with_message("saved")));
            },
        ));

        assert!(result.success);
        assert_eq!(result.status, InteractionStatus::Completed);
        assert_eq!(result.message.as_deref(), Some("saved"));
        assert_eq!(executor.pending_count(), 0);
    }

    #[test]
    fn test_tracked_timeout_removes_entry() {
        let executor = executor(r#"<button data-sid="save">Save</button>"#);
        let result = smol::block_on(executor.execute(
            "save",
            Action::click(),
            ExecuteOptions::with_timeout(Duration::from_millis(10)),
        ));

        assert!(result.success);
        assert_eq!(result.status, InteractionStatus::Timeout);
        assert!(!executor.is_pending("save"));
        assert!(!executor.complete("save", Completion::completed()));
    }

    #[test]
    fn test_tracked_dispatch_failure_settles_immediately() {
        let executor = executor(r#"<input type="number" data-sid="n" data-sid-action="fill">"#);

        let result = smol::block_on(future::poll_once(executor.execute(
            "n",
            Action::fill("abc"),
            ExecuteOptions::with_timeout(Duration::from_secs(30)),
        )))
        .expect("dispatch failure settles on the first poll");

        assert!(!result.success);
        assert_eq!(result.status, InteractionStatus::Error);
        assert!(!executor.is_pending("n"));
        assert_eq!(executor.pending_count(), 0);
        assert!(events(&executor).is_empty());
    }

    #[test]
    fn test_cancel_all() {
        let executor = executor(r#"<button data-sid="save">Save</button>"#);

        let (result, ()) = smol::block_on(future::zip(
            executor.execute("save", Action::click(), ExecuteOptions::default()),
            async {
                future::yield_now().await;
                executor.cancel_all();
            },
        ));

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("interaction cancelled: SID instance destroyed"));
    }
}
