use crate::{BatchFailure, BatchId, ComputedResult, ItemAddress, SelectionSnapshot, TextColor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Restore the selection persisted by a previous run.
    RestoreSelection(SelectionSnapshot),
    /// User picked a category.
    CategorySelected(String),
    /// User changed the checked items of the current category.
    ItemsSelected(Vec<String>),
    /// User picked a presentation text color.
    TextColorChanged(TextColor),
    /// User clicked "clear result cache".
    ClearCacheClicked,
    /// Engine finished clearing the store.
    ResultsCleared { error: Option<String> },
    /// Engine stored the result for one address of a batch.
    BatchProgress {
        batch_id: BatchId,
        address: ItemAddress,
        completed: usize,
        total: usize,
    },
    /// Engine finished a batch.
    BatchCompleted {
        batch_id: BatchId,
        result: Result<ComputedResult, BatchFailure>,
    },
    /// Engine dropped a queued batch in favour of a newer one.
    BatchSuperseded { batch_id: BatchId },
    /// Periodic tick driving the polling reconciler.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
