//! Completion Tracker
//!
//! Legacy operation store. Applications that predate per-element completion
//! signals start an operation, settle it later, and agents poll for it.
//! Records never expire on their own.

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use smol::Timer;

use crate::{ActionKind, Effects, TrackerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRecord {
    pub id: String,
    pub element_id: String,
    pub action: ActionKind,
    pub status: OperationStatus,
    /// Milliseconds since the UNIX epoch
    pub started_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effects: Option<Effects>,
}

impl OperationRecord {
    pub fn is_settled(&self) -> bool {
        self.status != OperationStatus::Pending
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    records: HashMap<String, OperationRecord>,
    counter: u64,
}

/// Keyed store of legacy operations
#[derive(Debug, Default)]
pub struct CompletionTracker {
    state: RefCell<TrackerState>,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending operation
    pub fn start(&self, element_id: &str, action: ActionKind) -> OperationRecord {
        let mut state = self.state.borrow_mut();
        state.counter += 1;
        let record = OperationRecord {
            id: format!("op-{}", state.counter),
            element_id: element_id.to_string(),
            action,
            status: OperationStatus::Pending,
            started_at: now_ms(),
            completed_at: None,
            message: None,
            effects: None,
        };
        tracing::debug!(operation = %record.id, element = element_id, "operation started");
        state.records.insert(record.id.clone(), record.clone());
        record
    }

    /// Settle a pending operation; returns false for unknown or settled ids
    pub fn complete(
        &self,
        id: &str,
        status: OperationStatus,
        message: Option<String>,
        effects: Option<Effects>,
    ) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(record) = state.records.get_mut(id) else {
            tracing::warn!(operation = id, "completion for unknown operation");
            return false;
        };
        if record.is_settled() {
            tracing::warn!(operation = id, "operation already settled");
            return false;
        }
        record.status = status;
        record.completed_at = Some(now_ms());
        record.message = message;
        record.effects = effects;
        true
    }

    pub fn get(&self, id: &str) -> Option<OperationRecord> {
        self.state.borrow().records.get(id).cloned()
    }

    /// Wait until the operation settles or `timeout` has accumulated
    pub async fn poll(&self, id: &str, timeout: Duration, interval: Duration) -> Result<OperationRecord, TrackerError> {
        let interval = interval.max(Duration::from_millis(1));
        let mut waited = Duration::ZERO;
        loop {
            let record = self.get(id).ok_or_else(|| TrackerError::NotFound(id.to_string()))?;
            if record.is_settled() {
                return Ok(record);
            }
            if waited >= timeout {
                return Err(TrackerError::Timeout {
                    id: id.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            Timer::after(interval).await;
            waited += interval;
        }
    }

    /// Drop every record; ids keep counting up
    pub fn clear(&self) {
        self.state.borrow_mut().records.clear();
    }

    pub fn len(&self) -> usize {
        self.state.borrow().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_assigns_sequential_ids() {
        let tracker = CompletionTracker::new();
        let first = tracker.start("save", ActionKind::Click);
        let second = tracker.start("save", ActionKind::Click);

        assert_eq!(first.id, "op-1");
        assert_eq!(second.id, "op-2");
        assert_eq!(first.status, OperationStatus::Pending);
        assert!(first.started_at > 0);
    }

    #[test]
    fn test_complete_once() {
        let tracker = CompletionTracker::new();
        let op = tracker.start("save", ActionKind::Click);

        assert!(tracker.complete(&op.id, OperationStatus::Success, Some("ok".into()), None));
        assert!(!tracker.complete(&op.id, OperationStatus::Error, None, None));
        assert!(!tracker.complete("op-99", OperationStatus::Success, None, None));

        let record = tracker.get(&op.id).unwrap();
        assert_eq!(record.status, OperationStatus::Success);
        assert_eq!(record.message.as_deref(), Some("ok"));
        assert!(record.completed_at.is_some());
    }

    #[test]
    fn test_clear_keeps_counter() {
        let tracker = CompletionTracker::new();
        tracker.start("a", ActionKind::Click);
        tracker.clear();

        assert!(tracker.is_empty());
        assert_eq!(tracker.start("b", ActionKind::Fill).id, "op-2");
    }

    #[test]
    fn test_poll_unknown() {
        let tracker = CompletionTracker::new();
        let result = smol::block_on(tracker.poll("op-1", Duration::from_millis(10), Duration::from_millis(1)));
        assert_eq!(result, Err(TrackerError::NotFound("op-1".into())));
    }

    #[test]
    fn test_poll_settled_resolves_immediately() {
        let tracker = CompletionTracker::new();
        let op = tracker.start("a", ActionKind::Click);
        tracker.complete(&op.id, OperationStatus::Error, None, None);

        let record = smol::block_on(tracker.poll(&op.id, Duration::ZERO, Duration::from_millis(1))).unwrap();
        assert_eq!(record.status, OperationStatus::Error);
    }

    #[test]
    fn test_poll_times_out() {
        let tracker = CompletionTracker::new();
        let op = tracker.start("a", ActionKind::Click);

        let result = smol::block_on(tracker.poll(&op.id, Duration::from_millis(20), Duration::from_millis(5)));
        assert_eq!(result, Err(TrackerError::Timeout { id: op.id, timeout_ms: 20 }));
    }

    #[test]
    fn test_poll_sees_later_completion() {
        let tracker = CompletionTracker::new();
        let op = tracker.start("a", ActionKind::Click);

        let (polled, ()) = smol::block_on(smol::future::zip(
            tracker.poll(&op.id, Duration::from_secs(5), Duration::from_millis(2)),
            async {
                Timer::after(Duration::from_millis(5)).await;
                tracker.complete(&op.id, OperationStatus::Success, None, None);
            },
        ));
        assert_eq!(polled.unwrap().status, OperationStatus::Success);
    }
}
