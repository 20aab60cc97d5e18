//! DOM Events
//!
//! Synthetic UI events raised by native actions. There is no script engine
//! listening, so dispatch computes the propagation path and records the
//! event in the document's event log.

use crate::NodeId;

/// Event type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Click,
    Input,
    Change,
    MouseEnter,
    MouseOver,
}

impl EventType {
    /// DOM event name
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Click => "click",
            EventType::Input => "input",
            EventType::Change => "change",
            EventType::MouseEnter => "mouseenter",
            EventType::MouseOver => "mouseover",
        }
    }

    /// Whether the platform bubbles this event by default
    pub fn bubbles(&self) -> bool {
        !matches!(self, EventType::MouseEnter)
    }
}

/// Event to dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomEvent {
    pub event_type: EventType,
    pub bubbles: bool,
    pub cancelable: bool,
}

impl DomEvent {
    /// Event with the type's default bubbling, not cancelable
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            bubbles: event_type.bubbles(),
            cancelable: false,
        }
    }

    /// Bubbling, cancelable event (`{ bubbles: true, cancelable: true }`)
    pub fn bubbling(event_type: EventType) -> Self {
        Self {
            event_type,
            bubbles: true,
            cancelable: true,
        }
    }
}

/// An event as it was dispatched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedEvent {
    pub event_type: EventType,
    pub target: NodeId,
    pub bubbles: bool,
    pub cancelable: bool,
    /// Nodes the event visited, target first
    pub path: Vec<NodeId>,
}
