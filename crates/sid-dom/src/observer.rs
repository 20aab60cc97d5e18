//! DOM Observers
//!
//! MutationObserver bookkeeping. The document queues records into every
//! observer whose registrations cover the mutated node; consumers drain them
//! with [`Document::take_records`](crate::Document::take_records).

use crate::NodeId;

/// Handle for a registered mutation observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u32);

/// Mutation observer options
#[derive(Debug, Clone, Default)]
pub struct MutationObserverInit {
    pub child_list: bool,
    pub attributes: bool,
    pub subtree: bool,
    pub attribute_old_value: bool,
    pub attribute_filter: Option<Vec<String>>,
}

impl MutationObserverInit {
    fn wants(&self, record: &MutationRecord) -> bool {
        match record.mutation_type {
            MutationType::ChildList => self.child_list,
            MutationType::Attributes => {
                if !self.attributes {
                    return false;
                }
                match (&self.attribute_filter, &record.attribute_name) {
                    (Some(filter), Some(name)) => filter.iter().any(|f| f.eq_ignore_ascii_case(name)),
                    _ => true,
                }
            }
        }
    }
}

/// Mutation record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    pub attribute_name: Option<String>,
    pub old_value: Option<String>,
}

impl MutationRecord {
    /// Child list record for `parent`
    pub fn child_list(parent: NodeId, added: Vec<NodeId>, removed: Vec<NodeId>) -> Self {
        Self {
            mutation_type: MutationType::ChildList,
            target: parent,
            added_nodes: added,
            removed_nodes: removed,
            attribute_name: None,
            old_value: None,
        }
    }

    /// Attribute record for `target`
    pub fn attribute(target: NodeId, name: &str, old_value: Option<String>) -> Self {
        Self {
            mutation_type: MutationType::Attributes,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            attribute_name: Some(name.to_ascii_lowercase()),
            old_value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    Attributes,
    ChildList,
}

/// Mutation observer
#[derive(Debug)]
pub struct MutationObserver {
    id: ObserverId,
    registrations: Vec<(NodeId, MutationObserverInit)>,
    records: Vec<MutationRecord>,
}

impl MutationObserver {
    pub fn new(id: ObserverId) -> Self {
        Self {
            id,
            registrations: Vec::new(),
            records: Vec::new(),
        }
    }

    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Observe `target`; re-observing the same target replaces its options.
    pub fn observe(&mut self, target: NodeId, options: MutationObserverInit) {
        if let Some(existing) = self.registrations.iter_mut().find(|(t, _)| *t == target) {
            existing.1 = options;
        } else {
            self.registrations.push((target, options));
        }
    }

    pub fn disconnect(&mut self) {
        self.registrations.clear();
        self.records.clear();
    }

    pub fn is_observing(&self) -> bool {
        !self.registrations.is_empty()
    }

    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    /// Queue `record` if a registration covers it.
    ///
    /// `ancestors` is the inclusive ancestor chain of `record.target`, nearest first.
    pub fn enqueue(&mut self, record: &MutationRecord, ancestors: &[NodeId]) {
        let covered = self.registrations.iter().find(|(target, options)| {
            let in_scope = ancestors.first() == Some(target)
                || (options.subtree && ancestors.contains(target));
            in_scope && options.wants(record)
        });
        if let Some((_, options)) = covered {
            let mut record = record.clone();
            if record.mutation_type == MutationType::Attributes && !options.attribute_old_value {
                record.old_value = None;
            }
            self.records.push(record);
        }
    }
}
