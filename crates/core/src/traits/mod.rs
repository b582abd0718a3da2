//! Core traits
//!
//! ```text
//! Understanding:
//!   - IntentClassifier: utterance + appointment context → category + confidence
//! ```
//!
//! Speech output needs no trait: the dialogue layer emits plain
//! `AgentAction::Speak` text and the runtime hands it to its synthesizer.

mod classifier;

pub use classifier::IntentClassifier;
