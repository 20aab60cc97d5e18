//! Agent-facing records

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sid_dom::FileData;

use crate::attributes::{ActionKind, HumanInputRequirement, InputSpec};
use crate::SidError;

/// Timeout applied to tracked interactions when none is given
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Description of one annotated element, as exposed to agents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidElement {
    pub id: String,
    /// CSS locator resolving to the element
    pub selector: String,
    pub desc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc_long: Option<String>,
    pub actions: Vec<ActionDescriptor>,
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_input: Option<HumanInputRequirement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDescriptor {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<InputSpec>,
    /// Whether completion is signaled by something other than the dispatch itself
    pub tracked: bool,
    pub description: String,
}

/// An action request
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub kind: ActionKind,
    pub value: Option<ActionValue>,
}

impl Action {
    pub fn new(kind: ActionKind, value: Option<ActionValue>) -> Self {
        Self { kind, value }
    }

    pub fn click() -> Self {
        Self::new(ActionKind::Click, None)
    }

    pub fn hover() -> Self {
        Self::new(ActionKind::Hover, None)
    }

    pub fn fill(text: impl Into<String>) -> Self {
        Self::new(ActionKind::Fill, Some(ActionValue::Text(text.into())))
    }

    pub fn select(value: impl Into<String>) -> Self {
        Self::new(ActionKind::Select, Some(ActionValue::Text(value.into())))
    }

    /// Check or uncheck; `check(None)` is treated as checking
    pub fn check(checked: Option<bool>) -> Self {
        Self::new(ActionKind::Check, checked.map(ActionValue::Bool))
    }

    pub fn upload(file: FileData) -> Self {
        Self::new(ActionKind::Upload, Some(ActionValue::File(file)))
    }
}

/// Value carried by an action
#[derive(Debug, Clone, PartialEq)]
pub enum ActionValue {
    Text(String),
    Bool(bool),
    File(FileData),
}

impl ActionValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ActionValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Observable consequences of an interaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effects {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigated_to: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionStatus {
    Completed,
    Error,
    Timeout,
    Navigation,
    External,
}

/// Outcome of an interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionResult {
    pub success: bool,
    pub status: InteractionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effects: Option<Effects>,
}

impl InteractionResult {
    fn new(success: bool, status: InteractionStatus) -> Self {
        Self {
            success,
            status,
            error: None,
            message: None,
            effects: None,
        }
    }

    pub fn completed() -> Self {
        Self::new(true, InteractionStatus::Completed)
    }

    pub fn failure(error: &SidError) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(false, InteractionStatus::Error)
        }
    }

    pub fn navigation(destination: Option<String>) -> Self {
        Self {
            message: Some(destination.unwrap_or_else(|| "Navigation triggered".to_string())),
            ..Self::new(true, InteractionStatus::Navigation)
        }
    }

    pub fn external(description: &str) -> Self {
        let message = if description.is_empty() {
            "External action triggered".to_string()
        } else {
            description.to_string()
        };
        Self {
            message: Some(message),
            ..Self::new(true, InteractionStatus::External)
        }
    }

    /// The operation may still finish later; timeouts are not failures
    pub fn timeout(after: Duration) -> Self {
        Self {
            message: Some(format!("Operation timed out after {}ms", after.as_millis())),
            ..Self::new(true, InteractionStatus::Timeout)
        }
    }

    /// Settle from an application-signaled completion
    pub fn from_completion(completion: Completion) -> Self {
        let status = match completion.status {
            CompletionStatus::Completed => InteractionStatus::Completed,
            CompletionStatus::Error => InteractionStatus::Error,
        };
        Self {
            success: true,
            status,
            error: None,
            message: completion.message,
            effects: completion.effects,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionStatus {
    #[default]
    Completed,
    Error,
}

/// Completion signal sent by the application
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub status: CompletionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effects: Option<Effects>,
}

impl Completion {
    pub fn completed() -> Self {
        Self::default()
    }

    pub fn error() -> Self {
        Self {
            status: CompletionStatus::Error,
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_effects(mut self, effects: Effects) -> Self {
        self.effects = Some(effects);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Overrides [`DEFAULT_TIMEOUT`]
    pub timeout: Option<Duration>,
}

impl ExecuteOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout: Some(timeout) }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT)
    }
}
