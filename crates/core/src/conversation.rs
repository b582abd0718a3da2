//! Dialogue states, turn events, agent actions and call outcomes

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Dialogue controller states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DialogueState {
    /// Call connected, greeting not yet spoken
    #[default]
    Greeting,
    /// Appointment read out, waiting for the customer's answer
    AwaitingConfirmation,
    /// Understanding failed at least once, escalating re-prompts
    Clarifying,
    /// Outcome fixed, no further turns
    Resolved,
}

static STATE_TRANSITIONS: Lazy<HashMap<DialogueState, &'static [DialogueState]>> =
    Lazy::new(|| {
        use DialogueState::*;
        let mut map = HashMap::new();
        map.insert(Greeting, &[AwaitingConfirmation, Resolved] as &[_]);
        map.insert(AwaitingConfirmation, &[Clarifying, Resolved] as &[_]);
        map.insert(Clarifying, &[AwaitingConfirmation, Resolved] as &[_]);
        map.insert(Resolved, &[] as &[_]);
        map
    });

impl DialogueState {
    /// States reachable from this one (self-loops are always allowed)
    pub fn allowed_transitions(&self) -> &'static [DialogueState] {
        STATE_TRANSITIONS.get(self).copied().unwrap_or(&[])
    }

    pub fn can_transition_to(&self, target: DialogueState) -> bool {
        *self == target || self.allowed_transitions().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DialogueState::Resolved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DialogueState::Greeting => "greeting",
            DialogueState::AwaitingConfirmation => "awaiting_confirmation",
            DialogueState::Clarifying => "clarifying",
            DialogueState::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for DialogueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events delivered by the call runtime, one at a time per call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// Final transcript of a customer utterance
    #[serde(rename = "utterance")]
    UtteranceRecognized {
        text: String,
        /// Recognizer confidence in [0, 1]
        confidence: f32,
    },
    /// No speech within the runtime's listening window
    SilenceTimeout,
    /// Far end hung up
    CallEnded,
}

impl InputEvent {
    pub fn utterance(text: impl Into<String>, confidence: f32) -> Self {
        Self::UtteranceRecognized {
            text: text.into(),
            confidence,
        }
    }

    /// Short name used in logs and metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            InputEvent::UtteranceRecognized { .. } => "utterance",
            InputEvent::SilenceTimeout => "silence_timeout",
            InputEvent::CallEnded => "call_ended",
        }
    }
}

/// Actions for the speech output sink and the call runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentAction {
    /// Plain text to synthesize
    Speak { text: String },
    /// Hang up
    EndCall,
}

impl AgentAction {
    pub fn speak(text: impl Into<String>) -> Self {
        Self::Speak { text: text.into() }
    }

    pub fn is_end_call(&self) -> bool {
        matches!(self, AgentAction::EndCall)
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            AgentAction::Speak { text } => Some(text),
            AgentAction::EndCall => None,
        }
    }
}

/// Final disposition of a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    #[default]
    Unresolved,
    Confirmed,
    RescheduleRequested,
    CancellationRequested,
    WrongPerson,
    Abandoned,
}

impl CallOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CallOutcome::Unresolved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallOutcome::Unresolved => "unresolved",
            CallOutcome::Confirmed => "confirmed",
            CallOutcome::RescheduleRequested => "reschedule_requested",
            CallOutcome::CancellationRequested => "cancellation_requested",
            CallOutcome::WrongPerson => "wrong_person",
            CallOutcome::Abandoned => "abandoned",
        }
    }
}

impl std::fmt::Display for CallOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        let state = DialogueState::Greeting;
        assert!(state.can_transition_to(DialogueState::AwaitingConfirmation));
        assert!(!state.can_transition_to(DialogueState::Clarifying));

        assert!(DialogueState::Clarifying.can_transition_to(DialogueState::AwaitingConfirmation));
        assert!(DialogueState::Clarifying.can_transition_to(DialogueState::Clarifying));
        assert!(DialogueState::Resolved.allowed_transitions().is_empty());
        assert!(DialogueState::Resolved.is_terminal());
    }

    #[test]
    fn test_event_wire_format() {
        let event: InputEvent =
            serde_json::from_str(r#"{"type":"utterance","text":"yes","confidence":0.9}"#).unwrap();
        assert_eq!(event, InputEvent::utterance("yes", 0.9));

        let event: InputEvent = serde_json::from_str(r#"{"type":"silence_timeout"}"#).unwrap();
        assert_eq!(event, InputEvent::SilenceTimeout);
        assert_eq!(event.kind(), "silence_timeout");
    }

    #[test]
    fn test_action_wire_format() {
        let json = serde_json::to_value(AgentAction::speak("Hello")).unwrap();
        assert_eq!(json["type"], "speak");
        assert_eq!(json["text"], "Hello");

        let json = serde_json::to_value(AgentAction::EndCall).unwrap();
        assert_eq!(json["type"], "end_call");
    }

    #[test]
    fn test_outcome_terminality() {
        assert!(!CallOutcome::Unresolved.is_terminal());
        assert!(CallOutcome::Abandoned.is_terminal());
        assert_eq!(CallOutcome::RescheduleRequested.to_string(), "reschedule_requested");
    }
}
