//! Core traits and types for the appointment-confirmation receptionist
//!
//! This crate provides the foundational types shared by every other crate:
//! - The appointment snapshot a call is about
//! - Dialogue states, input events, output actions and call outcomes
//! - Intent categories and classifier results
//! - The `IntentClassifier` trait for pluggable classification backends
//! - Classification error type

pub mod appointment;
pub mod conversation;
pub mod error;
pub mod intent;
pub mod traits;

pub use appointment::{Appointment, AppointmentDetail, TimeOfDay};
pub use conversation::{AgentAction, CallOutcome, DialogueState, InputEvent};
pub use error::ClassificationError;
pub use intent::{Classification, IntentCategory};
pub use traits::IntentClassifier;
