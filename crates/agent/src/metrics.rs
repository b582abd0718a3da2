//! Dialogue counters
//!
//! Recorded through the `metrics` facade; they are no-ops until the
//! binary installs a recorder.

pub const CALLS_STARTED: &str = "receptionist_calls_started_total";
pub const TURNS: &str = "receptionist_turns_total";
pub const CALL_OUTCOMES: &str = "receptionist_call_outcomes_total";
pub const CLASSIFIER_FAILURES: &str = "receptionist_classifier_failures_total";

use receptionist_core::CallOutcome;

/// Register descriptions with the installed recorder
pub fn describe() {
    metrics::describe_counter!(CALLS_STARTED, "Calls whose greeting was spoken");
    metrics::describe_counter!(TURNS, "Input events processed, by event type");
    metrics::describe_counter!(CALL_OUTCOMES, "Resolved calls, by outcome");
    metrics::describe_counter!(
        CLASSIFIER_FAILURES,
        "Intent classifications that failed or timed out"
    );
}

pub(crate) fn call_started() {
    metrics::counter!(CALLS_STARTED).increment(1);
}

pub(crate) fn turn(event: &'static str) {
    metrics::counter!(TURNS, "event" => event).increment(1);
}

pub(crate) fn outcome(outcome: CallOutcome) {
    metrics::counter!(CALL_OUTCOMES, "outcome" => outcome.as_str()).increment(1);
}

pub(crate) fn classifier_failure() {
    metrics::counter!(CLASSIFIER_FAILURES).increment(1);
}
