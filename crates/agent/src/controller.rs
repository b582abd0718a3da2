//! Dialogue controller
//!
//! Drives one confirmation call through
//! `Greeting → AwaitingConfirmation ⇄ Clarifying → Resolved`.
//!
//! Each input event produces an ordered list of actions. Failed
//! understanding (low recognizer or classifier confidence, `other`, a
//! classifier error or timeout, silence) increments the clarification
//! counter and escalates the re-prompt wording; reaching the configured
//! maximum abandons the call. Any successfully classified turn resets it.

use chrono::Timelike;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

use receptionist_config::{DialogueConfig, PersonaConfig, ResponseCatalog, ResponseCategory};
use receptionist_core::{
    AgentAction, Appointment, AppointmentDetail, CallOutcome, Classification, ClassificationError,
    DialogueState, InputEvent, IntentCategory, IntentClassifier, TimeOfDay,
};

use crate::metrics;
use crate::selector::ResponseSelector;
use crate::session::CallSession;
use crate::DialogueError;

/// Shared, per-process dependencies of every controller
#[derive(Clone)]
pub struct ControllerContext {
    pub classifier: Arc<dyn IntentClassifier>,
    pub catalog: Arc<ResponseCatalog>,
    pub dialogue: DialogueConfig,
    pub persona: PersonaConfig,
}

impl ControllerContext {
    pub fn new(classifier: Arc<dyn IntentClassifier>, catalog: Arc<ResponseCatalog>) -> Self {
        Self {
            classifier,
            catalog,
            dialogue: DialogueConfig::default(),
            persona: PersonaConfig::default(),
        }
    }

    pub fn with_dialogue(mut self, dialogue: DialogueConfig) -> Self {
        self.dialogue = dialogue;
        self
    }

    pub fn with_persona(mut self, persona: PersonaConfig) -> Self {
        self.persona = persona;
        self
    }
}

/// Signals far-end hangup to a controller that may be mid-classification
///
/// Cloneable; every clone drives the same signal. Once raised, the
/// controller ignores every event except `CallEnded`.
#[derive(Clone, Debug)]
pub struct HangupHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl HangupHandle {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn hang_up(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_hung_up(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

enum Understanding {
    Understood(Classification),
    NotUnderstood,
    HungUp,
}

/// Turn-taking controller for one call
pub struct DialogueController {
    session: CallSession,
    classifier: Arc<dyn IntentClassifier>,
    selector: ResponseSelector,
    config: DialogueConfig,
    persona: PersonaConfig,
    hangup: HangupHandle,
    time_of_day: Option<TimeOfDay>,
}

impl DialogueController {
    pub fn new(context: ControllerContext, session: CallSession) -> Self {
        Self {
            session,
            classifier: context.classifier,
            selector: ResponseSelector::new(context.catalog),
            config: context.dialogue,
            persona: context.persona,
            hangup: HangupHandle::new(),
            time_of_day: None,
        }
    }

    /// Controller for a fresh call
    pub fn for_call(
        context: ControllerContext,
        session_id: impl Into<String>,
        appointment: Appointment,
    ) -> Self {
        let session = CallSession::new(
            session_id,
            appointment,
            context.dialogue.recent_response_window,
        );
        Self::new(context, session)
    }

    /// Replace the entropy-seeded selector with a deterministic one
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.selector = ResponseSelector::with_seed(self.selector.catalog_arc(), seed);
        self
    }

    pub fn session(&self) -> &CallSession {
        &self.session
    }

    pub fn hangup_handle(&self) -> HangupHandle {
        self.hangup.clone()
    }

    /// Speak the greeting using the local hour
    pub fn begin(&mut self) -> Result<Vec<AgentAction>, DialogueError> {
        self.begin_at_hour(chrono::Local::now().hour())
    }

    /// Speak the greeting as if it were `hour` o'clock
    pub fn begin_at_hour(&mut self, hour: u32) -> Result<Vec<AgentAction>, DialogueError> {
        let state = self.session.state();
        if state != DialogueState::Greeting {
            return Err(DialogueError::InvalidSessionState {
                state,
                event: "begin",
            });
        }

        self.time_of_day = Some(TimeOfDay::from_hour(hour));
        let greeting = self.say(ResponseCategory::Greeting)?;
        self.session.transition(DialogueState::AwaitingConfirmation)?;
        metrics::call_started();

        tracing::info!(
            session_id = %self.session.session_id(),
            time_of_day = %self.time_of_day(),
            "Call started"
        );

        Ok(vec![greeting])
    }

    /// Process one input event
    ///
    /// Fails with `InvalidSessionState` and leaves the session untouched
    /// when the call is resolved, or when it has not been greeted yet and
    /// the event is not `CallEnded`. After a hangup signal, events other
    /// than `CallEnded` are discarded with no actions.
    pub async fn handle_event(
        &mut self,
        event: InputEvent,
    ) -> Result<Vec<AgentAction>, DialogueError> {
        let state = self.session.state();
        let accepted = match state {
            DialogueState::Resolved => false,
            DialogueState::Greeting => matches!(event, InputEvent::CallEnded),
            DialogueState::AwaitingConfirmation | DialogueState::Clarifying => true,
        };
        if !accepted {
            return Err(DialogueError::InvalidSessionState {
                state,
                event: event.kind(),
            });
        }

        let kind = event.kind();
        if self.hangup.is_hung_up() && !matches!(event, InputEvent::CallEnded) {
            tracing::debug!(
                session_id = %self.session.session_id(),
                event = kind,
                "Call hung up, discarding event"
            );
            return Ok(Vec::new());
        }

        let actions = match event {
            InputEvent::UtteranceRecognized { text, confidence } => {
                match self.understand(&text, confidence).await {
                    Understanding::HungUp => {
                        tracing::debug!(
                            session_id = %self.session.session_id(),
                            "Hangup during classification, discarding turn"
                        );
                        return Ok(Vec::new());
                    }
                    Understanding::Understood(classification) => {
                        self.on_understood(classification)?
                    }
                    Understanding::NotUnderstood => self.on_not_understood()?,
                }
            }
            InputEvent::SilenceTimeout => self.on_silence()?,
            InputEvent::CallEnded => self.on_call_ended()?,
        };

        self.session.record_turn();
        metrics::turn(kind);

        Ok(actions)
    }

    async fn understand(&self, text: &str, recognizer_confidence: f32) -> Understanding {
        let session_id = self.session.session_id();
        let threshold = self.config.low_confidence_threshold;

        if recognizer_confidence < threshold {
            tracing::debug!(
                session_id = %session_id,
                confidence = recognizer_confidence,
                threshold,
                "Recognizer confidence below threshold"
            );
            return Understanding::NotUnderstood;
        }

        let mut hangup = self.hangup.subscribe();
        let result = tokio::select! {
            biased;
            _ = hangup.wait_for(|hung_up| *hung_up) => Err(ClassificationError::Cancelled),
            result = self.classify(text) => result,
        };

        match result {
            Err(ClassificationError::Cancelled) => Understanding::HungUp,
            Ok(c) if c.category != IntentCategory::Other && c.confidence >= threshold => {
                tracing::debug!(
                    session_id = %session_id,
                    category = %c.category,
                    confidence = c.confidence,
                    "Utterance classified"
                );
                Understanding::Understood(c)
            }
            Ok(c) => {
                tracing::debug!(
                    session_id = %session_id,
                    category = %c.category,
                    confidence = c.confidence,
                    "Classification not usable"
                );
                Understanding::NotUnderstood
            }
            Err(e) => {
                metrics::classifier_failure();
                tracing::warn!(
                    session_id = %session_id,
                    classifier = self.classifier.name(),
                    error = %e,
                    "Intent classification failed"
                );
                Understanding::NotUnderstood
            }
        }
    }

    async fn classify(&self, text: &str) -> Result<Classification, ClassificationError> {
        let classify = self.classifier.classify(text, self.session.appointment());
        match self.config.classifier_timeout() {
            Some(limit) => tokio::time::timeout(limit, classify)
                .await
                .map_err(|_| ClassificationError::Timeout)?,
            None => classify.await,
        }
    }

    fn on_understood(
        &mut self,
        classification: Classification,
    ) -> Result<Vec<AgentAction>, DialogueError> {
        match classification.category {
            IntentCategory::Confirm => {
                self.finish(ResponseCategory::Confirmation, CallOutcome::Confirmed)
            }
            IntentCategory::Reschedule => self.finish(
                ResponseCategory::RescheduleNextSteps,
                CallOutcome::RescheduleRequested,
            ),
            IntentCategory::Cancel => self.finish(
                ResponseCategory::CancellationAck,
                CallOutcome::CancellationRequested,
            ),
            IntentCategory::WrongPerson => {
                self.finish(ResponseCategory::WrongPerson, CallOutcome::WrongPerson)
            }
            IntentCategory::Confused => {
                self.session.reset_attempts();
                let explanation = self.say(ResponseCategory::Explanation)?;
                self.session.transition(DialogueState::AwaitingConfirmation)?;
                Ok(vec![explanation])
            }
            IntentCategory::AskDetail { detail } => {
                self.session.reset_attempts();
                let answer = self.answer_detail(detail)?;
                self.session.transition(DialogueState::AwaitingConfirmation)?;
                Ok(vec![answer])
            }
            IntentCategory::Other => self.on_not_understood(),
        }
    }

    fn answer_detail(&mut self, detail: AppointmentDetail) -> Result<AgentAction, DialogueError> {
        let answer = self.render(ResponseCategory::for_detail(detail))?;
        let question = self.render(ResponseCategory::ConfirmationPrompt)?;
        Ok(AgentAction::speak(format!("{} {}", answer, question)))
    }

    fn on_not_understood(&mut self) -> Result<Vec<AgentAction>, DialogueError> {
        let attempts = self.session.record_failed_turn();

        if attempts >= self.config.max_clarification_attempts {
            let apology = self.say(ResponseCategory::AbandonApology)?;
            self.resolve(CallOutcome::Abandoned)?;
            return Ok(vec![apology, AgentAction::EndCall]);
        }

        let request = self.say(ResponseCategory::for_clarification(attempts))?;
        self.session.transition(DialogueState::Clarifying)?;
        tracing::debug!(
            session_id = %self.session.session_id(),
            attempts,
            "Requesting clarification"
        );
        Ok(vec![request])
    }

    fn on_silence(&mut self) -> Result<Vec<AgentAction>, DialogueError> {
        let attempts = self.session.record_failed_turn();

        if attempts >= self.config.max_clarification_attempts {
            self.resolve(CallOutcome::Abandoned)?;
            return Ok(vec![AgentAction::EndCall]);
        }

        Ok(vec![self.say(ResponseCategory::SilenceReprompt)?])
    }

    fn on_call_ended(&mut self) -> Result<Vec<AgentAction>, DialogueError> {
        self.resolve(CallOutcome::Abandoned)?;
        Ok(Vec::new())
    }

    /// Speak the closing line for a terminal intent, then hang up
    fn finish(
        &mut self,
        category: ResponseCategory,
        outcome: CallOutcome,
    ) -> Result<Vec<AgentAction>, DialogueError> {
        self.session.reset_attempts();
        let closing = self.say(category)?;
        self.resolve(outcome)?;
        Ok(vec![closing, AgentAction::EndCall])
    }

    fn resolve(&mut self, outcome: CallOutcome) -> Result<(), DialogueError> {
        self.session.transition(DialogueState::Resolved)?;
        if self.session.set_outcome(outcome) {
            metrics::outcome(outcome);
            tracing::info!(
                session_id = %self.session.session_id(),
                outcome = %outcome,
                attempts = self.session.clarification_attempts(),
                "Call resolved"
            );
        }
        Ok(())
    }

    fn say(&mut self, category: ResponseCategory) -> Result<AgentAction, DialogueError> {
        Ok(AgentAction::speak(self.render(category)?))
    }

    fn render(&mut self, category: ResponseCategory) -> Result<String, DialogueError> {
        let template = self.selector.select(category, &mut self.session)?;
        Ok(template.render(&self.template_vars()))
    }

    fn time_of_day(&self) -> TimeOfDay {
        self.time_of_day
            .unwrap_or_else(|| TimeOfDay::from_hour(chrono::Local::now().hour()))
    }

    fn template_vars(&self) -> HashMap<&'static str, String> {
        let appt = self.session.appointment();
        let mut vars = HashMap::new();
        vars.insert("agent_name", self.persona.name.clone());
        vars.insert("agent_role", self.persona.role.clone());
        vars.insert("time_of_day", self.time_of_day().as_str().to_string());
        vars.insert("date", appt.date.clone());
        vars.insert("time", appt.time.clone());
        vars.insert("service", appt.service_name.clone());
        vars.insert("provider", appt.provider_name.clone());
        vars.insert("location", appt.location_name.clone());
        vars.insert("customer_name", appt.recipient_name().to_string());
        vars
    }
}
