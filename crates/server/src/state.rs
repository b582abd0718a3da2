//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use receptionist_agent::{ControllerContext, KeywordIntentClassifier};
use receptionist_config::Settings;
use receptionist_core::IntentClassifier;

use crate::session::SessionManager;
use crate::ServerError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    /// State with the default keyword classifier and the configured catalog
    pub fn new(config: Settings) -> Result<Self, ServerError> {
        Self::with_classifier(config, Arc::new(KeywordIntentClassifier::new()))
    }

    /// State with a caller-supplied classifier
    pub fn with_classifier(
        config: Settings,
        classifier: Arc<dyn IntentClassifier>,
    ) -> Result<Self, ServerError> {
        let catalog = config.responses.load_catalog()?;
        tracing::info!(
            templates = catalog.len(),
            classifier = classifier.name(),
            "Dialogue dependencies ready"
        );

        let context = ControllerContext::new(classifier, Arc::new(catalog))
            .with_dialogue(config.dialogue.clone())
            .with_persona(config.persona.clone());
        let sessions = Arc::new(SessionManager::new(context, &config.server));

        Ok(Self {
            config: Arc::new(config),
            sessions,
        })
    }
}
