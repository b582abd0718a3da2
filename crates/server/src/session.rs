//! Call session management
//!
//! Each call owns one [`DialogueController`] behind an async mutex, so
//! events for the same call are processed one at a time while different
//! calls proceed in parallel. The manager enforces a capacity limit and a
//! background task resolves calls that have gone idle.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex, MutexGuard};

use receptionist_agent::{ControllerContext, DialogueController, DialogueError, HangupHandle};
use receptionist_config::ServerConfig;
use receptionist_core::{AgentAction, Appointment, InputEvent};

use crate::ServerError;

/// One live call
pub struct CallEntry {
    pub id: String,
    controller: Mutex<DialogueController>,
    hangup: HangupHandle,
    pub created_at: Instant,
    last_activity: RwLock<Instant>,
}

impl CallEntry {
    fn new(id: String, controller: DialogueController) -> Self {
        let hangup = controller.hangup_handle();
        let now = Instant::now();
        Self {
            id,
            controller: Mutex::new(controller),
            hangup,
            created_at: now,
            last_activity: RwLock::new(now),
        }
    }

    /// Exclusive access to the controller; waits for any in-flight turn
    pub async fn controller(&self) -> MutexGuard<'_, DialogueController> {
        self.controller.lock().await
    }

    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.read().elapsed()
    }

    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.idle_for() > timeout
    }

    /// Interrupt any in-flight classification, then resolve the call
    async fn end(&self, reason: &'static str) {
        self.hangup.hang_up();
        let mut controller = self.controller().await;
        match controller.handle_event(InputEvent::CallEnded).await {
            Ok(_) => {}
            Err(DialogueError::InvalidSessionState { .. }) => {
                tracing::debug!(session_id = %self.id, reason, "Call already resolved");
            }
            Err(e) => {
                tracing::warn!(session_id = %self.id, reason, error = %e, "Failed to end call");
            }
        }
    }
}

/// Registry of live calls
pub struct SessionManager {
    calls: RwLock<HashMap<String, Arc<CallEntry>>>,
    context: ControllerContext,
    max_calls: usize,
    idle_timeout: Duration,
    cleanup_interval: Duration,
}

impl SessionManager {
    pub fn new(context: ControllerContext, config: &ServerConfig) -> Self {
        Self::with_limits(
            context,
            config.max_calls,
            Duration::from_secs(config.idle_timeout_secs),
            Duration::from_secs(config.cleanup_interval_secs),
        )
    }

    pub fn with_limits(
        context: ControllerContext,
        max_calls: usize,
        idle_timeout: Duration,
        cleanup_interval: Duration,
    ) -> Self {
        Self {
            calls: RwLock::new(HashMap::new()),
            context,
            max_calls,
            idle_timeout,
            cleanup_interval,
        }
    }

    /// Start a background task that periodically resolves idle calls.
    ///
    /// Returns a shutdown sender that stops the task.
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(self);
        let interval = manager.cleanup_interval;

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let removed = manager.cleanup_expired().await;
                        if removed > 0 {
                            tracing::info!(
                                removed,
                                remaining = manager.count(),
                                "Idle call cleanup"
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Call cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }

    /// Register a call and speak its greeting
    pub fn create(
        &self,
        session_id: Option<String>,
        appointment: Appointment,
    ) -> Result<(Arc<CallEntry>, Vec<AgentAction>), ServerError> {
        let id = match session_id {
            Some(id) if id.trim().is_empty() => {
                return Err(ServerError::InvalidRequest(
                    "session_id must not be empty".to_string(),
                ))
            }
            Some(id) => id,
            None => uuid::Uuid::new_v4().to_string(),
        };

        let mut calls = self.calls.write();

        if calls.contains_key(&id) {
            return Err(ServerError::Conflict(format!("call {} already exists", id)));
        }
        if calls.len() >= self.max_calls {
            tracing::warn!(max_calls = self.max_calls, "Rejecting call: at capacity");
            return Err(ServerError::Capacity(self.max_calls));
        }

        let mut controller = DialogueController::for_call(self.context.clone(), id.clone(), appointment);
        let greeting = controller
            .begin()
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        let entry = Arc::new(CallEntry::new(id.clone(), controller));
        calls.insert(id, Arc::clone(&entry));

        Ok((entry, greeting))
    }

    pub fn get(&self, id: &str) -> Option<Arc<CallEntry>> {
        self.calls.read().get(id).cloned()
    }

    pub fn remove(&self, id: &str) -> Option<Arc<CallEntry>> {
        self.calls.write().remove(id)
    }

    /// Far-end hangup: interrupt, resolve and forget the call
    pub async fn hang_up(&self, id: &str) -> Result<(), ServerError> {
        let entry = self
            .remove(id)
            .ok_or_else(|| ServerError::NotFound(id.to_string()))?;
        entry.end("hangup").await;
        Ok(())
    }

    pub fn list(&self) -> Vec<String> {
        self.calls.read().keys().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.calls.read().len()
    }

    pub fn max_calls(&self) -> usize {
        self.max_calls
    }

    /// Resolve and drop calls idle longer than the timeout
    pub async fn cleanup_expired(&self) -> usize {
        let expired: Vec<Arc<CallEntry>> = {
            let mut calls = self.calls.write();
            let ids: Vec<String> = calls
                .iter()
                .filter(|(_, entry)| entry.is_expired(self.idle_timeout))
                .map(|(id, _)| id.clone())
                .collect();
            ids.iter().filter_map(|id| calls.remove(id)).collect()
        };

        for entry in &expired {
            tracing::info!(
                session_id = %entry.id,
                idle_secs = entry.idle_for().as_secs(),
                "Resolving idle call"
            );
            entry.end("idle").await;
        }

        expired.len()
    }
}
