//! SID - Semantic Interaction Descriptors
//!
//! A convention layer that lets automation agents discover and operate on
//! annotated HTML elements (`data-sid-*` attributes).
//!
//! # Components
//! - [`attributes`]: reads the markup contract off one node
//! - [`registry`]: live index of annotated elements
//! - [`context`]: page/app metadata from a JSON script block
//! - [`executor`]: performs actions and tracks their completion
//! - [`tracker`]: legacy operation store
//! - [`facade`]: [`SidHost`] and the [`Sid`] instance agents talk to
//!
//! # Example
//! ```rust,ignore
//! use sid::{Action, ExecuteOptions, SidConfig, SidHost};
//!
//! let host = SidHost::from_html(r#"<button data-sid="save" data-sid-tracking="none">Save</button>"#)?;
//! let sid = host.init(SidConfig::default());
//! let result = smol::block_on(sid.interact("save", Action::click(), ExecuteOptions::default()));
//! assert!(result.success);
//! ```

pub mod attributes;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod facade;
pub mod registry;
pub mod tracker;
mod types;

pub use attributes::{
    ActionKind, AttributeDiagnostic, HumanInputRequirement, InputDataType, InputSpec, SidAttributes,
    TrackingKind,
};
pub use config::{AuthCallback, SidAuth, SidConfig};
pub use context::{ContextReader, SidContext};
pub use error::{SidError, TrackerError};
pub use executor::Executor;
pub use facade::{Sid, SidHost};
pub use registry::Registry;
pub use tracker::{CompletionTracker, OperationRecord, OperationStatus};
pub use types::{
    Action, ActionDescriptor, ActionValue, Completion, CompletionStatus, Effects, ExecuteOptions,
    InteractionResult, InteractionStatus, SidElement, DEFAULT_TIMEOUT,
};

pub use sid_dom::{Document, FileData, NodeId};

/// Protocol version reported by [`Sid::version`]
pub const SID_VERSION: &str = "1.0.0";
