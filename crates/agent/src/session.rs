//! Per-call dialogue state

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

use receptionist_core::{Appointment, CallOutcome, DialogueState};

use crate::DialogueError;

/// One active phone call
///
/// Mutated only by its [`DialogueController`](crate::DialogueController).
/// Once `outcome` leaves `Unresolved` it never changes again.
#[derive(Debug, Clone, Serialize)]
pub struct CallSession {
    session_id: String,
    appointment: Appointment,
    state: DialogueState,
    clarification_attempts: u32,
    recent_response_keys: VecDeque<String>,
    #[serde(skip)]
    recent_window: usize,
    outcome: CallOutcome,
    started_at: DateTime<Utc>,
    turn_count: u64,
}

impl CallSession {
    pub fn new(session_id: impl Into<String>, appointment: Appointment, recent_window: usize) -> Self {
        let recent_window = recent_window.max(1);
        Self {
            session_id: session_id.into(),
            appointment,
            state: DialogueState::Greeting,
            clarification_attempts: 0,
            recent_response_keys: VecDeque::with_capacity(recent_window + 1),
            recent_window,
            outcome: CallOutcome::Unresolved,
            started_at: Utc::now(),
            turn_count: 0,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn appointment(&self) -> &Appointment {
        &self.appointment
    }

    pub fn state(&self) -> DialogueState {
        self.state
    }

    pub fn clarification_attempts(&self) -> u32 {
        self.clarification_attempts
    }

    /// Template ids spoken recently, oldest first
    pub fn recent_response_keys(&self) -> &VecDeque<String> {
        &self.recent_response_keys
    }

    pub fn outcome(&self) -> CallOutcome {
        self.outcome
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn turn_count(&self) -> u64 {
        self.turn_count
    }

    pub fn is_resolved(&self) -> bool {
        self.state.is_terminal()
    }

    pub(crate) fn transition(&mut self, to: DialogueState) -> Result<(), DialogueError> {
        let from = self.state;
        if !from.can_transition_to(to) {
            return Err(DialogueError::InvalidTransition { from, to });
        }
        if from != to {
            tracing::debug!(
                session_id = %self.session_id,
                from = %from,
                to = %to,
                "Dialogue state transition"
            );
        }
        self.state = to;
        Ok(())
    }

    /// Count one more failed-understanding turn, returning the new total
    pub(crate) fn record_failed_turn(&mut self) -> u32 {
        self.clarification_attempts += 1;
        self.clarification_attempts
    }

    pub(crate) fn reset_attempts(&mut self) {
        self.clarification_attempts = 0;
    }

    pub(crate) fn record_turn(&mut self) {
        self.turn_count += 1;
    }

    pub(crate) fn remember_response(&mut self, id: &str) {
        self.recent_response_keys.push_back(id.to_string());
        while self.recent_response_keys.len() > self.recent_window {
            self.recent_response_keys.pop_front();
        }
    }

    /// Set the final outcome; returns false if one was already set
    pub(crate) fn set_outcome(&mut self, outcome: CallOutcome) -> bool {
        if self.outcome.is_terminal() || !outcome.is_terminal() {
            return false;
        }
        self.outcome = outcome;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(window: usize) -> CallSession {
        let appt = Appointment::new("tomorrow", "2:30 PM", "dental cleaning", "Dr. Johnson", "Main Street Dental");
        CallSession::new("call-1", appt, window)
    }

    #[test]
    fn test_new_session() {
        let s = session(5);
        assert_eq!(s.session_id(), "call-1");
        assert_eq!(s.state(), DialogueState::Greeting);
        assert_eq!(s.outcome(), CallOutcome::Unresolved);
        assert_eq!(s.clarification_attempts(), 0);
        assert!(s.recent_response_keys().is_empty());
    }

    #[test]
    fn test_outcome_is_write_once() {
        let mut s = session(5);
        assert!(!s.set_outcome(CallOutcome::Unresolved));
        assert!(s.set_outcome(CallOutcome::Confirmed));
        assert!(!s.set_outcome(CallOutcome::Abandoned));
        assert_eq!(s.outcome(), CallOutcome::Confirmed);
    }

    #[test]
    fn test_recent_window_evicts_oldest() {
        let mut s = session(3);
        for id in ["a", "b", "c", "d"] {
            s.remember_response(id);
        }
        let keys: Vec<&str> = s.recent_response_keys().iter().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "c", "d"]);
    }

    #[test]
    fn test_invalid_transition_rejected() {
        let mut s = session(5);
        assert!(s.transition(DialogueState::Clarifying).is_err());
        assert_eq!(s.state(), DialogueState::Greeting);

        s.transition(DialogueState::AwaitingConfirmation).unwrap();
        s.transition(DialogueState::Resolved).unwrap();
        assert!(s.transition(DialogueState::AwaitingConfirmation).is_err());
    }

    #[test]
    fn test_attempt_counting() {
        let mut s = session(5);
        assert_eq!(s.record_failed_turn(), 1);
        assert_eq!(s.record_failed_turn(), 2);
        s.reset_attempts();
        assert_eq!(s.clarification_attempts(), 0);
    }

    #[test]
    fn test_snapshot_json() {
        let s = session(5);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["state"], "greeting");
        assert_eq!(json["outcome"], "unresolved");
        assert_eq!(json["appointment"]["provider_name"], "Dr. Johnson");
        assert!(json.get("recent_window").is_none());
    }
}
