//! Template selection with per-call variation

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Arc;

use receptionist_config::{ResponseCatalog, ResponseCategory, ResponseTemplate};

use crate::session::CallSession;
use crate::DialogueError;

/// Picks one template per category, avoiding what the call heard recently
///
/// Candidates are the category's templates minus the ids in the session's
/// recent window. If that leaves nothing, the whole category minus the last
/// spoken id is used, so a category with two or more templates never
/// repeats back-to-back. The choice is uniform over the candidates.
pub struct ResponseSelector {
    catalog: Arc<ResponseCatalog>,
    rng: StdRng,
}

impl ResponseSelector {
    /// Selector seeded from OS entropy
    pub fn new(catalog: Arc<ResponseCatalog>) -> Self {
        Self {
            catalog,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic selector for tests and replays
    pub fn with_seed(catalog: Arc<ResponseCatalog>, seed: u64) -> Self {
        Self {
            catalog,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn catalog(&self) -> &ResponseCatalog {
        &self.catalog
    }

    pub(crate) fn catalog_arc(&self) -> Arc<ResponseCatalog> {
        Arc::clone(&self.catalog)
    }

    /// Choose a template and record its id in the session's recent window
    pub fn select(
        &mut self,
        category: ResponseCategory,
        session: &mut CallSession,
    ) -> Result<ResponseTemplate, DialogueError> {
        let all = self.catalog.by_category(category);
        if all.is_empty() {
            return Err(DialogueError::Template(format!(
                "no templates for category {}",
                category
            )));
        }

        let recent = session.recent_response_keys();
        let fresh: Vec<&ResponseTemplate> = all
            .iter()
            .copied()
            .filter(|t| !recent.iter().any(|id| id == &t.id))
            .collect();
        let candidates = if !fresh.is_empty() {
            fresh
        } else {
            // Everything is recent: only avoid the line spoken last
            let last = recent.back();
            let not_last: Vec<&ResponseTemplate> = all
                .iter()
                .copied()
                .filter(|t| Some(&t.id) != last)
                .collect();
            if not_last.is_empty() {
                all
            } else {
                not_last
            }
        };

        let chosen = candidates
            .choose(&mut self.rng)
            .map(|t| (*t).clone())
            .ok_or_else(|| DialogueError::Template(format!("empty candidate set for {}", category)))?;

        session.remember_response(&chosen.id);
        Ok(chosen)
    }
}
