//! Appointment confirmation dialogue
//!
//! Features:
//! - Per-call session state with write-once outcome
//! - Template selection that avoids repeating recent phrasing
//! - Turn-taking controller with bounded clarification escalation
//! - Keyword intent classifier as the default `IntentClassifier`
//! - Hangup cancellation of in-flight classification

pub mod classifier;
pub mod controller;
pub mod metrics;
pub mod selector;
pub mod session;

pub use classifier::KeywordIntentClassifier;
pub use controller::{ControllerContext, DialogueController, HangupHandle};
pub use selector::ResponseSelector;
pub use session::CallSession;

use receptionist_core::DialogueState;
use thiserror::Error;

/// Dialogue errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DialogueError {
    /// Event delivered to a call that is resolved or not yet greeted
    #[error("Event '{event}' not accepted in state {state}")]
    InvalidSessionState {
        state: DialogueState,
        event: &'static str,
    },

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition {
        from: DialogueState,
        to: DialogueState,
    },

    /// Catalog has no template for a required category
    #[error("Template error: {0}")]
    Template(String),
}
