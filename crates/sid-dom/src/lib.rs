//! SID DOM - Document Object Model
//!
//! Arena-based DOM tree used by the SID layer: attributes, tree mutation,
//! mutation observation, simple selectors, form control state and synthetic
//! event dispatch.

mod node;
mod tree;
mod document;
mod error;
pub mod events;
pub mod forms;
pub mod observer;
pub mod selector;

pub use node::{Attribute, ControlState, ElementData, Node, NodeData};
pub use tree::DomTree;
pub use document::Document;
pub use error::{DomError, DomResult};
pub use events::{DispatchedEvent, DomEvent, EventType};
pub use forms::{ControlKind, FileData, InputType};
pub use observer::{MutationObserverInit, MutationRecord, MutationType, ObserverId};
pub use selector::{css_escape, Selector};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root (document) node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this ID points at a node
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Convert the sentinel into an `Option`
    #[inline]
    pub fn some(self) -> Option<NodeId> {
        self.is_valid().then_some(self)
    }

    /// Raw arena index
    pub fn index(self) -> u32 {
        self.0
    }
}
