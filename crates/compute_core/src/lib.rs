//! Compute core: data model, store contracts, resolver, reconcilers and the
//! pure state machine that coordinates them.
mod effect;
mod inventory;
mod model;
mod msg;
mod polling;
mod resolve;
mod state;
mod store;
mod update;
mod view_model;

pub use effect::Effect;
pub use inventory::Inventory;
pub use model::{
    BatchId, ComputationPlan, ComputedResult, ItemAddress, PresentationConfig, ResultPollingState,
    TextColor,
};
pub use msg::Msg;
pub use polling::{PollPhase, PollingReconciler};
pub use resolve::{resolve, PlanOutcome, Resolution, BATCH_SEQUENCE};
pub use state::{AppState, BatchFailure, BatchProgressView, ReconcileMode, SelectionSnapshot};
pub use store::{AtomicSequence, MemoryResultStore, ResultStore, SequenceSource, StoreError};
pub use update::{update, Env};
pub use view_model::{render, AppViewModel, Listing, ListingRow, ABSENT_MARKER};
