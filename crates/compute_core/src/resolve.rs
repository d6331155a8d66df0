use engine_logging::engine_debug;

use crate::model::dedupe;
use crate::{ComputationPlan, ItemAddress, PresentationConfig, ResultStore, SequenceSource, StoreError, TextColor};

/// Counter name used for batch ids.
pub const BATCH_SEQUENCE: &str = "batchid";

/// Whether a selection needs any computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    /// The selection was empty.
    NothingSelected,
    /// Every selected address already has a stored result.
    AllCached,
    Compute(ComputationPlan),
}

impl PlanOutcome {
    pub fn plan(&self) -> Option<&ComputationPlan> {
        match self {
            PlanOutcome::Compute(plan) => Some(plan),
            PlanOutcome::NothingSelected | PlanOutcome::AllCached => None,
        }
    }

    pub fn into_plan(self) -> Option<ComputationPlan> {
        match self {
            PlanOutcome::Compute(plan) => Some(plan),
            PlanOutcome::NothingSelected | PlanOutcome::AllCached => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub presentation: PresentationConfig,
    pub plan: PlanOutcome,
}

/// Split `selected` into addresses to present and addresses to compute.
///
/// Reads the store but never writes it. A batch id is drawn from `sequence`
/// only when something actually needs computing.
pub fn resolve(
    selected: &[ItemAddress],
    text_color: TextColor,
    store: &dyn ResultStore,
    sequence: &dyn SequenceSource,
) -> Result<Resolution, StoreError> {
    let addresses = dedupe(selected.iter().cloned());

    let mut to_compute = Vec::new();
    for addr in &addresses {
        if !store.has(addr)? {
            to_compute.push(addr.clone());
        }
    }

    let plan = if addresses.is_empty() {
        PlanOutcome::NothingSelected
    } else if to_compute.is_empty() {
        PlanOutcome::AllCached
    } else {
        let batch_id = sequence.next(BATCH_SEQUENCE)?;
        PlanOutcome::Compute(ComputationPlan::new(batch_id, to_compute))
    };

    engine_debug!(
        "resolve selected={} outcome={:?}",
        addresses.len(),
        plan.plan().map(|p| (p.batch_id(), p.len()))
    );

    Ok(Resolution {
        presentation: PresentationConfig {
            text_color,
            addresses,
        },
        plan,
    })
}
