//! DOM operation errors

use crate::NodeId;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node not found in the arena
    #[error("node {0:?} not found")]
    NotFound(NodeId),

    /// Hierarchy error (e.g., inserting an ancestor into its descendant)
    #[error("hierarchy request error")]
    HierarchyRequest,

    /// Operation requires a different kind of node
    #[error("invalid node type: expected {expected}")]
    InvalidNodeType { expected: &'static str },

    /// Node is not a child of the given parent
    #[error("node is not a child of the given parent")]
    NotAChild,

    /// Value rejected by the control
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Selector could not be parsed
    #[error("invalid selector: {0}")]
    Syntax(String),
}
