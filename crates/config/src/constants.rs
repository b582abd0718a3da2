//! Centralized default values
//!
//! Serde defaults and validation bounds refer to these so the numbers
//! live in one place.

/// Dialogue defaults
pub mod dialogue {
    /// Failed-understanding turns before the call is abandoned
    pub const MAX_CLARIFICATION_ATTEMPTS: u32 = 3;

    /// Number of recently used template ids excluded from selection
    pub const RECENT_RESPONSE_WINDOW: usize = 5;

    /// Recognizer or classifier confidence below this is "not understood"
    pub const LOW_CONFIDENCE_THRESHOLD: f32 = 0.4;

    /// Upper bound accepted for `max_clarification_attempts`
    pub const MAX_CLARIFICATION_ATTEMPTS_LIMIT: u32 = 10;
}

/// Persona defaults
pub mod persona {
    pub const NAME: &str = "Sarah";
    pub const ROLE: &str = "receptionist";
}

/// Call runtime defaults
pub mod server {
    pub const HOST: &str = "0.0.0.0";
    pub const PORT: u16 = 8080;

    /// HTTP request timeout (seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Concurrent calls held by one process
    pub const MAX_CALLS: usize = 100;

    /// Calls with no event for this long are resolved as abandoned (seconds)
    pub const IDLE_TIMEOUT_SECS: u64 = 900;

    /// Period of the idle-call sweep (seconds)
    pub const CLEANUP_INTERVAL_SECS: u64 = 60;
}
