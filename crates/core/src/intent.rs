//! Intent categories relevant to appointment confirmation

use serde::{Deserialize, Serialize};

use crate::appointment::AppointmentDetail;

/// What the customer meant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum IntentCategory {
    /// Will attend
    Confirm,
    /// Needs another time
    Reschedule,
    /// Wants to cancel outright
    Cancel,
    /// Does not know what the call is about
    Confused,
    /// Asks about one appointment detail
    AskDetail { detail: AppointmentDetail },
    /// Not the person the appointment is for
    WrongPerson,
    /// Anything else
    Other,
}

impl IntentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentCategory::Confirm => "confirm",
            IntentCategory::Reschedule => "reschedule",
            IntentCategory::Cancel => "cancel",
            IntentCategory::Confused => "confused",
            IntentCategory::AskDetail { .. } => "ask_detail",
            IntentCategory::WrongPerson => "wrong_person",
            IntentCategory::Other => "other",
        }
    }
}

impl std::fmt::Display for IntentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntentCategory::AskDetail { detail } => write!(f, "ask_detail({})", detail),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Classifier result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(flatten)]
    pub category: IntentCategory,
    /// Classifier confidence in [0, 1]
    pub confidence: f32,
}

impl Classification {
    pub fn new(category: IntentCategory, confidence: f32) -> Self {
        Self {
            category,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn other() -> Self {
        Self::new(IntentCategory::Other, 0.0)
    }
}
