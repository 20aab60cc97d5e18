//! Error types

use sid_dom::DomError;

use crate::ActionKind;

/// Reasons an interaction cannot be carried out
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SidError {
    #[error("Element not found: {0}")]
    NotFound(String),

    #[error("{}", disabled_message(.reason))]
    Disabled { id: String, reason: Option<String> },

    /// The locator matched zero or several live nodes
    #[error("Element not found in DOM: {id} ({matches} matches)")]
    NotInDom { id: String, matches: usize },

    #[error("Element does not support {action}: expected {expected}")]
    Unsupported { action: ActionKind, expected: &'static str },

    #[error("Invalid value for {action}: {reason}")]
    InvalidValue { action: ActionKind, reason: String },

    #[error("Dispatch failed: {0}")]
    Dispatch(#[from] DomError),

    #[error("Interaction already pending for element: {0}")]
    AlreadyPending(String),

    #[error("interaction cancelled: SID instance destroyed")]
    Cancelled,

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Authentication is not configured")]
    AuthNotConfigured,

    #[error("Authentication failed: {0}")]
    AuthFailed(String),
}

fn disabled_message(reason: &Option<String>) -> String {
    match reason {
        Some(reason) => format!("Element is disabled: {reason}"),
        None => "Element is disabled".to_string(),
    }
}

/// Legacy tracker errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    #[error("Operation not found: {0}")]
    NotFound(String),

    #[error("Operation {id} timed out after {timeout_ms}ms")]
    Timeout { id: String, timeout_ms: u64 },
}
