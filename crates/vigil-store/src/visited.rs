//! Persisted record of which wizard steps the operator has displayed.

use crate::error::StoreResult;
use crate::store::FlagStore;
use std::collections::BTreeSet;
use tracing::{debug, warn};
use vigil_core::StepId;

/// Key holding the visited-step list (JSON array of step ids).
pub const KEY_VISITED_STEPS: &str = "setup_visited_steps_v1";

/// Key holding the "operator explicitly picked a step" flag.
pub const KEY_STEP_TOUCHED: &str = "setup_step_touched_v1";

/// Persisted set of steps viewed at least once this provisioning lifecycle.
///
/// The set grows monotonically; only [`VisitedStepTracker::reset`] (the
/// setup-restart action) clears it. Loading tolerates anything: malformed
/// JSON and unknown step strings degrade to "not visited", never to an
/// error.
#[derive(Debug)]
pub struct VisitedStepTracker {
    store: FlagStore,
    visited: BTreeSet<StepId>,
}

impl VisitedStepTracker {
    /// Load the persisted set from `store`.
    #[must_use]
    pub fn load(store: FlagStore) -> Self {
        let visited = match store.get_string(KEY_VISITED_STEPS) {
            None => BTreeSet::new(),
            Some(raw) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(ids) => ids
                    .iter()
                    .filter_map(|id| {
                        let step = StepId::from_canonical(id);
                        if step.is_none() {
                            debug!(%id, "skipping unknown visited step");
                        }
                        step
                    })
                    .collect(),
                Err(err) => {
                    warn!(%err, "visited-step list corrupt, treating as empty");
                    BTreeSet::new()
                }
            },
        };
        VisitedStepTracker { store, visited }
    }

    /// Record that `step` has been displayed.
    ///
    /// # Errors
    /// Returns [`crate::StoreError`] if persisting the updated list fails;
    /// the in-memory set keeps the step either way.
    pub fn mark_visited(&mut self, step: StepId) -> StoreResult<()> {
        if !self.visited.insert(step) {
            return Ok(());
        }
        let ids: Vec<&str> = self.visited.iter().map(StepId::as_str).collect();
        self.store
            .set_string(KEY_VISITED_STEPS, &serde_json::to_string(&ids)?)
    }

    /// True once every canonical step has been displayed.
    #[must_use]
    pub fn all_visited(&self) -> bool {
        self.visited.len() == StepId::ALL.len()
    }

    #[must_use]
    pub fn contains(&self, step: StepId) -> bool {
        self.visited.contains(&step)
    }

    /// Steps visited so far, in declaration order.
    #[must_use]
    pub fn visited(&self) -> &BTreeSet<StepId> {
        &self.visited
    }

    /// Record that the operator explicitly chose a step, so later status
    /// refreshes must not move the selection.
    ///
    /// # Errors
    /// Returns [`crate::StoreError`] if the flag cannot be persisted.
    pub fn mark_step_touched(&self) -> StoreResult<()> {
        self.store.set_bool(KEY_STEP_TOUCHED, true)
    }

    #[must_use]
    pub fn step_touched(&self) -> bool {
        self.store.get_bool(KEY_STEP_TOUCHED)
    }

    /// Forget everything; part of the setup-restart action.
    ///
    /// # Errors
    /// Returns [`crate::StoreError`] if clearing the persisted keys fails.
    pub fn reset(&mut self) -> StoreResult<()> {
        self.visited.clear();
        self.store.remove(KEY_VISITED_STEPS)?;
        self.store.remove(KEY_STEP_TOUCHED)
    }
}
