//! Intent classification interface

use async_trait::async_trait;

use crate::appointment::Appointment;
use crate::error::ClassificationError;
use crate::intent::Classification;

/// Intent classifier interface
///
/// Implementations:
/// - `KeywordIntentClassifier` - pattern and example-phrase matching (default)
/// - LLM-backed classifiers live outside this workspace
///
/// # Example
///
/// ```ignore
/// let classifier: Arc<dyn IntentClassifier> = Arc::new(KeywordIntentClassifier::new());
/// let result = classifier.classify("yes I'll be there", &appointment).await?;
/// assert_eq!(result.category, IntentCategory::Confirm);
/// ```
#[async_trait]
pub trait IntentClassifier: Send + Sync + 'static {
    /// Classify one customer utterance
    ///
    /// # Arguments
    /// * `text` - Final transcript of the utterance
    /// * `appointment` - The appointment the call is about, for context
    ///
    /// # Returns
    /// Category and confidence, or an error the caller treats as
    /// "not understood"
    async fn classify(
        &self,
        text: &str,
        appointment: &Appointment,
    ) -> Result<Classification, ClassificationError>;

    /// Name for logging
    fn name(&self) -> &str;
}
