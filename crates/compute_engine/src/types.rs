use std::time::Duration;

use compute_core::{BatchId, ComputedResult, ItemAddress};
use thiserror::Error;

/// One address of a batch was computed and stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    pub batch_id: BatchId,
    /// The newly completed address only; consumers accumulate if they need to.
    pub address: ItemAddress,
    pub completed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Progress(BatchProgress),
    BatchCompleted {
        batch_id: BatchId,
        result: Result<ComputedResult, BatchError>,
    },
    /// A queued batch was dropped because a newer plan arrived before it started.
    BatchSuperseded { batch_id: BatchId },
    ResultsCleared { result: Result<(), String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComputeError {
    #[error("computation failed: {0}")]
    Failed(String),
    #[error("computation timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    /// Computing `address` failed; the rest of the batch was not attempted.
    #[error("{address} failed after {} completed: {source}", completed.len())]
    Computation {
        address: ItemAddress,
        completed: Vec<ItemAddress>,
        source: ComputeError,
    },
    /// Reading or writing the result store failed.
    #[error("store error after {} completed: {message}", completed.len())]
    Store {
        address: ItemAddress,
        completed: Vec<ItemAddress>,
        message: String,
    },
}

impl BatchError {
    /// Addresses durably stored before the batch stopped.
    pub fn completed(&self) -> &[ItemAddress] {
        match self {
            BatchError::Computation { completed, .. } | BatchError::Store { completed, .. } => {
                completed
            }
        }
    }
}
