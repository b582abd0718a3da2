//! Error types

use thiserror::Error;

/// Intent classification failures
///
/// The dialogue layer never surfaces these to the caller. `Failed` and
/// `Timeout` are handled exactly like a low-confidence turn; `Cancelled`
/// discards the turn.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassificationError {
    #[error("Classifier failed: {0}")]
    Failed(String),

    #[error("Classifier timed out")]
    Timeout,

    /// Far end hung up while the classifier was running
    #[error("Classification cancelled")]
    Cancelled,
}
