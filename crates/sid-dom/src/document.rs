//! Document - High-level document API
//!
//! Every mutation goes through `Document` so registered mutation observers
//! see it. Native actions (value edits, clicks, synthetic events) live here
//! too, since they need the same access to the tree.

use crate::events::{DispatchedEvent, DomEvent, EventType};
use crate::forms::{ControlKind, FileData, InputType};
use crate::observer::{MutationObserver, MutationObserverInit, MutationRecord, ObserverId};
use crate::{Attribute, DomError, DomResult, DomTree, ElementData, Node, NodeData, NodeId, Selector};

/// HTML Document
#[derive(Debug)]
pub struct Document {
    /// The DOM tree
    tree: DomTree,
    /// Document URL
    url: String,
    /// Cached reference to <html> element
    html_element: NodeId,
    /// Cached reference to <head> element
    head_element: NodeId,
    /// Cached reference to <body> element
    body_element: NodeId,
    observers: Vec<MutationObserver>,
    next_observer: u32,
    /// Dispatched events are only kept while recording is on
    record_events: bool,
    event_log: Vec<DispatchedEvent>,
}

impl Document {
    /// Create a new document with html/head/body
    pub fn new(url: &str) -> Self {
        let mut doc = Self::empty(url);

        let html = doc.create_element("html");
        let head = doc.create_element("head");
        let body = doc.create_element("body");
        let root = doc.root();
        for (parent, child) in [(root, html), (html, head), (html, body)] {
            // freshly created nodes cannot violate the hierarchy
            let _ = doc.tree.link(parent, child, NodeId::NONE);
        }

        doc.html_element = html;
        doc.head_element = head;
        doc.body_element = body;
        doc
    }

    /// Create an empty document (no structure)
    pub fn empty(url: &str) -> Self {
        Self {
            tree: DomTree::new(),
            url: url.to_string(),
            html_element: NodeId::NONE,
            head_element: NodeId::NONE,
            body_element: NodeId::NONE,
            observers: Vec::new(),
            next_observer: 1,
            record_events: false,
            event_log: Vec::new(),
        }
    }

    /// Locate html/head/body after the tree was built externally
    pub fn finalize(&mut self) {
        let find = |doc: &Self, parent: NodeId, tag: &str| {
            doc.tree
                .children(parent)
                .into_iter()
                .find(|&c| doc.tag_name(c) == Some(tag))
                .unwrap_or(NodeId::NONE)
        };
        self.html_element = find(self, self.root(), "html");
        if self.html_element.is_valid() {
            self.head_element = find(self, self.html_element, "head");
            self.body_element = find(self, self.html_element, "body");
        }
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get <html> element
    pub fn document_element(&self) -> Option<NodeId> {
        self.html_element.some()
    }

    /// Get <head> element
    pub fn head(&self) -> Option<NodeId> {
        self.head_element.some()
    }

    /// Get <body> element
    pub fn body(&self) -> Option<NodeId> {
        self.body_element.some()
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    // ------------------------------------------------------------------
    // Node creation and structure
    // ------------------------------------------------------------------

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.tree.push(Node::element(tag))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.tree.push(Node::text(text))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.tree.push(Node::comment(text))
    }

    /// Create a detached doctype node
    pub fn create_doctype(&mut self, name: &str) -> NodeId {
        self.tree.push(Node::doctype(name))
    }

    /// Append `child` to `parent`, moving it if already attached
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference` (append when `None`)
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> DomResult<NodeId> {
        self.tree.node(parent)?;
        self.tree.node(child)?;
        if child == NodeId::ROOT || self.tree.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest);
        }
        if let Some(reference) = reference {
            if self.tree.parent(reference) != Some(parent) {
                return Err(DomError::NotAChild);
            }
            if reference == child {
                return Ok(child);
            }
        }

        if let Some(old_parent) = self.tree.parent(child) {
            self.tree.unlink(child)?;
            self.queue_mutation(MutationRecord::child_list(old_parent, Vec::new(), vec![child]));
        }
        self.tree.link(parent, child, reference.unwrap_or(NodeId::NONE))?;
        self.queue_mutation(MutationRecord::child_list(parent, vec![child], Vec::new()));
        Ok(child)
    }

    /// Remove `child` from `parent`; the subtree stays in the arena
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        if self.tree.parent(child) != Some(parent) {
            return Err(DomError::NotAChild);
        }
        self.tree.unlink(child)?;
        self.queue_mutation(MutationRecord::child_list(parent, Vec::new(), vec![child]));
        Ok(child)
    }

    /// Remove a node from wherever it is attached (no-op when detached)
    pub fn detach(&mut self, node: NodeId) -> DomResult<()> {
        if let Some(parent) = self.tree.parent(node) {
            self.remove_child(parent, node)?;
        }
        Ok(())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.tree.parent(node)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.tree.children(node)
    }

    /// Descendants in document order
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        self.tree.descendants(node)
    }

    /// Whether the node is reachable from the document root
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.tree.get(node).is_some() && self.tree.is_inclusive_ancestor(NodeId::ROOT, node)
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, node: NodeId) -> String {
        if let Some(text) = self.tree.get(node).and_then(Node::as_text) {
            return text.to_string();
        }
        self.tree
            .descendants(node)
            .into_iter()
            .filter_map(|id| self.tree.get(id).and_then(Node::as_text))
            .collect()
    }

    // ------------------------------------------------------------------
    // Elements and attributes
    // ------------------------------------------------------------------

    pub fn element(&self, node: NodeId) -> Option<&ElementData> {
        self.tree.get(node).and_then(Node::as_element)
    }

    fn element_mut(&mut self, node: NodeId) -> DomResult<&mut ElementData> {
        self.tree
            .node_mut(node)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType { expected: "element" })
    }

    /// Lowercase tag name
    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.name.as_str())
    }

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|e| e.get_attr(name))
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.get_attribute(node, name).is_some()
    }

    pub fn attributes(&self, node: NodeId) -> &[Attribute] {
        self.element(node).map(|e| e.attrs.as_slice()).unwrap_or(&[])
    }

    /// Set an attribute and notify observers
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> DomResult<()> {
        let old = self.element_mut(node)?.set_attr(name, value);
        self.queue_mutation(MutationRecord::attribute(node, name, old));
        Ok(())
    }

    /// Remove an attribute; observers are only notified if it existed
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> DomResult<()> {
        if let Some(old) = self.element_mut(node)?.remove_attr(name) {
            self.queue_mutation(MutationRecord::attribute(node, name, Some(old)));
        }
        Ok(())
    }

    /// First element matching `selector` in document order
    pub fn query_selector(&self, selector: &str) -> DomResult<Option<NodeId>> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    /// All elements matching `selector` in document order
    pub fn query_selector_all(&self, selector: &str) -> DomResult<Vec<NodeId>> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .tree
            .descendants(self.root())
            .into_iter()
            .filter(|&id| self.element(id).is_some_and(|e| selector.matches(e)))
            .collect())
    }

    // ------------------------------------------------------------------
    // Mutation observers
    // ------------------------------------------------------------------

    /// Register a new observer on `target`
    ///
    /// Records accumulate until the owner drains them with [`Self::take_records`]
    /// or disconnects.
    pub fn observe(&mut self, target: NodeId, options: MutationObserverInit) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        let mut observer = MutationObserver::new(id);
        observer.observe(target, options);
        self.observers.push(observer);
        id
    }

    /// Drain queued records for an observer
    pub fn take_records(&mut self, observer: ObserverId) -> Vec<MutationRecord> {
        self.observers
            .iter_mut()
            .find(|o| o.id() == observer)
            .map(MutationObserver::take_records)
            .unwrap_or_default()
    }

    /// Stop an observer and drop its pending records
    pub fn disconnect(&mut self, observer: ObserverId) {
        self.observers.retain(|o| o.id() != observer);
    }

    fn queue_mutation(&mut self, record: MutationRecord) {
        if self.observers.is_empty() {
            return;
        }
        let mut ancestors = Vec::new();
        let mut cur = Some(record.target);
        while let Some(node) = cur {
            ancestors.push(node);
            cur = self.tree.parent(node);
        }
        for observer in &mut self.observers {
            observer.enqueue(&record, &ancestors);
        }
    }

    // ------------------------------------------------------------------
    // Form state
    // ------------------------------------------------------------------

    /// Classify the control kind of an element
    pub fn control_kind(&self, node: NodeId) -> ControlKind {
        match self.element(node) {
            Some(elem) => ControlKind::classify(&elem.name, elem.get_attr("type")),
            None => ControlKind::Other,
        }
    }

    /// Current value of an input, textarea or select
    pub fn value(&self, node: NodeId) -> Option<String> {
        let elem = self.element(node)?;
        if let Some(value) = &elem.control.value {
            return Some(value.clone());
        }
        match elem.name.as_str() {
            "input" => Some(elem.get_attr("value").unwrap_or_default().to_string()),
            "textarea" => Some(self.text_content(node)),
            "select" => Some(self.default_option(node).map(|o| self.option_value(o)).unwrap_or_default()),
            _ => None,
        }
    }

    /// Set the value of a text-entry control
    pub fn set_value(&mut self, node: NodeId, value: &str) -> DomResult<()> {
        if self.control_kind(node) != ControlKind::TextEntry {
            return Err(DomError::InvalidNodeType { expected: ControlKind::TextEntry.describe() });
        }
        if self.get_attribute(node, "type").map(InputType::parse) == Some(InputType::Number)
            && !value.is_empty()
            && value.trim().parse::<f64>().is_err()
        {
            return Err(DomError::InvalidValue(format!("{value:?} is not a number")));
        }
        self.element_mut(node)?.control.value = Some(value.to_string());
        Ok(())
    }

    fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.tree
            .descendants(select)
            .into_iter()
            .filter(|&id| self.tag_name(id) == Some("option"))
            .collect()
    }

    fn option_value(&self, option: NodeId) -> String {
        match self.get_attribute(option, "value") {
            Some(value) => value.to_string(),
            None => self.text_content(option).trim().to_string(),
        }
    }

    fn default_option(&self, select: NodeId) -> Option<NodeId> {
        let options = self.options(select);
        options
            .iter()
            .copied()
            .find(|&o| self.has_attribute(o, "selected"))
            .or_else(|| options.first().copied())
    }

    /// Choose the option whose value equals `value`
    pub fn select_value(&mut self, node: NodeId, value: &str) -> DomResult<()> {
        if self.control_kind(node) != ControlKind::ChoiceList {
            return Err(DomError::InvalidNodeType { expected: ControlKind::ChoiceList.describe() });
        }
        if !self.options(node).into_iter().any(|o| self.option_value(o) == value) {
            return Err(DomError::InvalidValue(format!("no option with value {value:?}")));
        }
        self.element_mut(node)?.control.value = Some(value.to_string());
        Ok(())
    }

    /// Checkedness of a checkbox or radio
    pub fn checked(&self, node: NodeId) -> bool {
        self.element(node)
            .map(|e| e.control.checked.unwrap_or_else(|| e.get_attr("checked").is_some()))
            .unwrap_or(false)
    }

    /// Set checkedness; checking a radio unchecks the rest of its group
    pub fn set_checked(&mut self, node: NodeId, checked: bool) -> DomResult<()> {
        if self.control_kind(node) != ControlKind::Toggle {
            return Err(DomError::InvalidNodeType { expected: ControlKind::Toggle.describe() });
        }
        let is_radio = self.get_attribute(node, "type").map(InputType::parse) == Some(InputType::Radio);
        if checked && is_radio {
            if let Some(name) = self.get_attribute(node, "name").map(str::to_string) {
                let group: Vec<NodeId> = self
                    .tree
                    .descendants(self.root())
                    .into_iter()
                    .filter(|&id| {
                        id != node
                            && self.control_kind(id) == ControlKind::Toggle
                            && self.get_attribute(id, "name") == Some(name.as_str())
                    })
                    .collect();
                for other in group {
                    self.element_mut(other)?.control.checked = Some(false);
                }
            }
        }
        self.element_mut(node)?.control.checked = Some(checked);
        Ok(())
    }

    /// Files attached to a file input
    pub fn files(&self, node: NodeId) -> &[FileData] {
        self.element(node).map(|e| e.control.files.as_slice()).unwrap_or(&[])
    }

    /// Replace the file list of a file input
    pub fn set_files(&mut self, node: NodeId, files: Vec<FileData>) -> DomResult<()> {
        if self.control_kind(node) != ControlKind::FileInput {
            return Err(DomError::InvalidNodeType { expected: ControlKind::FileInput.describe() });
        }
        if files.len() > 1 && !self.has_attribute(node, "multiple") {
            return Err(DomError::InvalidValue("input does not accept multiple files".into()));
        }
        self.element_mut(node)?.control.files = files;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Dispatch a synthetic event at `target`
    pub fn dispatch_event(&mut self, target: NodeId, event: DomEvent) -> DomResult<()> {
        if !self.tree.node(target)?.is_element() {
            return Err(DomError::InvalidNodeType { expected: "element" });
        }
        let mut path = vec![target];
        if event.bubbles {
            let mut cur = self.tree.parent(target);
            while let Some(node) = cur {
                path.push(node);
                cur = self.tree.parent(node);
            }
        }
        tracing::trace!(event = event.event_type.as_str(), ?target, "dispatch");
        if !self.record_events {
            return Ok(());
        }
        self.event_log.push(DispatchedEvent {
            event_type: event.event_type,
            target,
            bubbles: event.bubbles,
            cancelable: event.cancelable,
            path,
        });
        Ok(())
    }

    /// Native click: dispatch `click`, then run activation behavior
    pub fn click(&mut self, target: NodeId) -> DomResult<()> {
        self.dispatch_event(target, DomEvent::bubbling(EventType::Click))?;
        if self.control_kind(target) == ControlKind::Toggle {
            let is_radio = self.get_attribute(target, "type").map(InputType::parse) == Some(InputType::Radio);
            let next = if is_radio { true } else { !self.checked(target) };
            if next != self.checked(target) {
                self.set_checked(target, next)?;
                self.dispatch_event(target, DomEvent::bubbling(EventType::Input))?;
                self.dispatch_event(target, DomEvent::bubbling(EventType::Change))?;
            }
        }
        Ok(())
    }

    /// Start or stop keeping dispatched events; stopping clears the log
    pub fn set_event_recording(&mut self, enabled: bool) {
        self.record_events = enabled;
        if !enabled {
            self.event_log.clear();
        }
    }

    pub fn is_recording_events(&self) -> bool {
        self.record_events
    }

    /// Drain the log of dispatched events
    pub fn take_event_log(&mut self) -> Vec<DispatchedEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Look at the log without draining it
    pub fn event_log(&self) -> &[DispatchedEvent] {
        &self.event_log
    }

    /// Node data accessor for serializers
    pub fn node_data(&self, node: NodeId) -> Option<&NodeData> {
        self.tree.get(node).map(|n| &n.data)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}
