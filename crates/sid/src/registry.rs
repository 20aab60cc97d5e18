//! Element Registry
//!
//! Index of annotated elements keyed by their `data-sid` identifier. The
//! index is built by a scan of the document and then kept current from
//! mutation records, which are drained lazily before every query.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use sid_dom::{Document, MutationObserverInit, MutationRecord, MutationType, NodeId, ObserverId, css_escape};

use crate::attributes::{self, ATTR_ID, OBSERVED_ATTRIBUTES, SidAttributes, TrackingKind};
use crate::{ActionDescriptor, SidElement};

#[derive(Debug)]
struct Entry {
    node: NodeId,
    element: SidElement,
}

/// Live index of annotated elements
#[derive(Debug)]
pub struct Registry {
    document: Rc<RefCell<Document>>,
    observer: Option<ObserverId>,
    entries: HashMap<String, Entry>,
    /// Identifiers in index order
    order: Vec<String>,
    by_node: HashMap<NodeId, String>,
}

impl Registry {
    /// Scan the document, optionally staying subscribed to its mutations
    pub fn new(document: Rc<RefCell<Document>>, observe: bool) -> Self {
        let mut registry = Self {
            document,
            observer: None,
            entries: HashMap::new(),
            order: Vec::new(),
            by_node: HashMap::new(),
        };
        registry.scan();
        if observe {
            let options = MutationObserverInit {
                child_list: true,
                attributes: true,
                subtree: true,
                attribute_old_value: false,
                attribute_filter: Some(OBSERVED_ATTRIBUTES.iter().map(|a| a.to_string()).collect()),
            };
            let mut doc = registry.document.borrow_mut();
            let root = doc.root();
            registry.observer = Some(doc.observe(root, options));
        }
        tracing::debug!(elements = registry.order.len(), observing = observe, "registry initialized");
        registry
    }

    fn scan(&mut self) {
        let document = Rc::clone(&self.document);
        let doc = document.borrow();
        for node in doc.descendants(doc.root()) {
            if doc.has_attribute(node, ATTR_ID) {
                self.reindex(&doc, node);
            }
        }
    }

    /// Apply queued mutation records
    pub fn sync(&mut self) {
        let Some(observer) = self.observer else {
            return;
        };
        let records = self.document.borrow_mut().take_records(observer);
        if records.is_empty() {
            return;
        }
        let document = Rc::clone(&self.document);
        let doc = document.borrow();
        for record in &records {
            self.apply(&doc, record);
        }
        tracing::trace!(records = records.len(), elements = self.order.len(), "registry synced");
    }

    fn apply(&mut self, doc: &Document, record: &MutationRecord) {
        match record.mutation_type {
            MutationType::ChildList => {
                for &removed in &record.removed_nodes {
                    for node in Self::inclusive_descendants(doc, removed) {
                        if !doc.is_connected(node) {
                            self.drop_node(node);
                        }
                    }
                }
                for &added in &record.added_nodes {
                    if !doc.is_connected(added) {
                        continue;
                    }
                    for node in Self::inclusive_descendants(doc, added) {
                        self.reindex(doc, node);
                    }
                }
            }
            MutationType::Attributes => self.reindex(doc, record.target),
        }
    }

    fn inclusive_descendants(doc: &Document, node: NodeId) -> Vec<NodeId> {
        let mut nodes = vec![node];
        nodes.extend(doc.descendants(node));
        nodes
    }

    /// Bring one node's entry in line with its current markup
    fn reindex(&mut self, doc: &Document, node: NodeId) {
        if !doc.is_connected(node) {
            self.drop_node(node);
            return;
        }
        let Some(attrs) = attributes::parse_attributes(doc, node) else {
            self.drop_node(node);
            return;
        };
        if self.by_node.get(&node).is_some_and(|id| *id != attrs.id) {
            self.drop_node(node);
        }
        self.insert(node, attrs);
    }

    fn insert(&mut self, node: NodeId, attrs: SidAttributes) {
        let id = attrs.id.clone();
        let element = describe(attrs);
        match self.entries.insert(id.clone(), Entry { node, element }) {
            Some(previous) => {
                if previous.node != node {
                    tracing::debug!(element = %id, "identifier re-registered by another node");
                    self.by_node.remove(&previous.node);
                }
            }
            None => self.order.push(id.clone()),
        }
        self.by_node.insert(node, id);
    }

    fn drop_node(&mut self, node: NodeId) {
        if let Some(id) = self.by_node.remove(&node) {
            self.entries.remove(&id);
            self.order.retain(|other| *other != id);
            tracing::debug!(element = %id, "element unregistered");
        }
    }

    /// All registered elements, in index order
    pub fn elements(&mut self) -> Vec<SidElement> {
        self.sync();
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id))
            .map(|entry| entry.element.clone())
            .collect()
    }

    pub fn get(&mut self, id: &str) -> Option<SidElement> {
        self.sync();
        self.entries.get(id).map(|entry| entry.element.clone())
    }

    pub fn len(&mut self) -> usize {
        self.sync();
        self.order.len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    pub fn is_observing(&self) -> bool {
        self.observer.is_some()
    }

    /// Stop observing and forget every entry
    pub fn destroy(&mut self) {
        if let Some(observer) = self.observer.take() {
            self.document.borrow_mut().disconnect(observer);
        }
        self.entries.clear();
        self.order.clear();
        self.by_node.clear();
    }
}

/// Locator for an identifier
pub fn selector_for(id: &str) -> String {
    format!("[{ATTR_ID}=\"{}\"]", css_escape(id))
}

fn describe(attrs: SidAttributes) -> SidElement {
    let action = ActionDescriptor {
        kind: attrs.action,
        input: attrs.input,
        tracked: attrs.tracking != TrackingKind::None,
        description: attrs.desc.clone(),
    };
    SidElement {
        selector: selector_for(&attrs.id),
        id: attrs.id,
        desc: attrs.desc,
        desc_long: attrs.desc_long,
        actions: vec![action],
        disabled: attrs.disabled,
        disabled_reason: attrs.disabled_desc,
        human_input: attrs.human_input,
    }
}
