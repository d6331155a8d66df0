use engine_logging::engine_debug;

use crate::{BatchId, ComputationPlan, ResultPollingState, ResultStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollPhase {
    #[default]
    Idle,
    Polling,
}

/// Pull-based reconciliation: re-scan the store for the outstanding plan on
/// every tick and report only when the set of missing addresses changes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PollingReconciler {
    plan: Option<ComputationPlan>,
    last: Option<ResultPollingState>,
}

impl PollingReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> PollPhase {
        if self.plan.is_some() {
            PollPhase::Polling
        } else {
            PollPhase::Idle
        }
    }

    /// Start polling for `plan`, replacing any plan outstanding before.
    /// Batch whose addresses are being watched, while polling.
    pub fn batch_id(&self) -> Option<BatchId> {
        self.plan.as_ref().map(ComputationPlan::batch_id)
    }

    pub fn start(&mut self, plan: ComputationPlan) {
        self.plan = Some(plan);
        self.last = None;
    }

    pub fn stop(&mut self) {
        self.plan = None;
    }

    /// Last snapshot emitted, if any.
    pub fn last_snapshot(&self) -> Option<&ResultPollingState> {
        self.last.as_ref()
    }

    /// One scan of the outstanding plan against `store`.
    ///
    /// Returns the new snapshot when it differs from the previous one, `None`
    /// when idle or unchanged. Returns to idle once nothing is missing.
    pub fn tick(
        &mut self,
        store: &dyn ResultStore,
    ) -> Result<Option<ResultPollingState>, StoreError> {
        let Some(plan) = self.plan.as_ref() else {
            return Ok(None);
        };

        let mut missing = Vec::new();
        for addr in plan.addresses() {
            if !store.has(addr)? {
                missing.push(addr.clone());
            }
        }
        let snapshot = ResultPollingState {
            compute_timestamp: plan.batch_id(),
            missing,
        };

        if snapshot.missing.is_empty() {
            self.plan = None;
        }
        if self.last.as_ref() == Some(&snapshot) {
            return Ok(None);
        }

        engine_debug!(
            "polling snapshot batch_id={} missing={}",
            snapshot.compute_timestamp,
            snapshot.missing.len()
        );
        self.last = Some(snapshot.clone());
        Ok(Some(snapshot))
    }
}
