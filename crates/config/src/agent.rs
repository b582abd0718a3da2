//! Dialogue and persona configuration
//!
//! Escalation limits and thresholds are configuration so a deployment can
//! tune them without touching the controller.

use serde::{Deserialize, Serialize};

use crate::constants::{dialogue, persona};

/// Dialogue controller tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueConfig {
    /// Failed-understanding turns allowed before the call is abandoned
    #[serde(default = "default_max_clarification_attempts")]
    pub max_clarification_attempts: u32,

    /// How many recently spoken template ids are excluded from selection
    #[serde(default = "default_recent_response_window")]
    pub recent_response_window: usize,

    /// Confidence below this (recognizer or classifier) counts as not understood
    #[serde(default = "default_low_confidence_threshold")]
    pub low_confidence_threshold: f32,

    /// Per-call classifier timeout; unset means wait indefinitely
    #[serde(default)]
    pub classifier_timeout_ms: Option<u64>,
}

fn default_max_clarification_attempts() -> u32 {
    dialogue::MAX_CLARIFICATION_ATTEMPTS
}
fn default_recent_response_window() -> usize {
    dialogue::RECENT_RESPONSE_WINDOW
}
fn default_low_confidence_threshold() -> f32 {
    dialogue::LOW_CONFIDENCE_THRESHOLD
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            max_clarification_attempts: default_max_clarification_attempts(),
            recent_response_window: default_recent_response_window(),
            low_confidence_threshold: default_low_confidence_threshold(),
            classifier_timeout_ms: None,
        }
    }
}

impl DialogueConfig {
    pub fn classifier_timeout(&self) -> Option<std::time::Duration> {
        self.classifier_timeout_ms
            .map(std::time::Duration::from_millis)
    }
}

/// Who the agent says it is
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Name used in greetings and explanations
    #[serde(default = "default_persona_name")]
    pub name: String,

    /// Role wording, e.g. "receptionist"
    #[serde(default = "default_persona_role")]
    pub role: String,
}

fn default_persona_name() -> String {
    persona::NAME.to_string()
}
fn default_persona_role() -> String {
    persona::ROLE.to_string()
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: default_persona_name(),
            role: default_persona_role(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialogue_defaults() {
        let config = DialogueConfig::default();
        assert_eq!(config.max_clarification_attempts, 3);
        assert_eq!(config.recent_response_window, 5);
        assert!((config.low_confidence_threshold - 0.4).abs() < f32::EPSILON);
        assert!(config.classifier_timeout().is_none());
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: DialogueConfig =
            serde_json::from_str(r#"{"classifier_timeout_ms": 1500}"#).unwrap();
        assert_eq!(config.max_clarification_attempts, 3);
        assert_eq!(
            config.classifier_timeout(),
            Some(std::time::Duration::from_millis(1500))
        );
    }

    #[test]
    fn test_persona_defaults() {
        let persona = PersonaConfig::default();
        assert_eq!(persona.name, "Sarah");
        assert_eq!(persona.role, "receptionist");
    }
}
