use std::fmt;

use crate::{
    BatchProgressView, ComputationPlan, ComputedResult, ItemAddress, PollPhase,
    PresentationConfig, ReconcileMode, ResultPollingState, ResultStore, StoreError, TextColor,
};

/// Shown in place of a result that is not stored yet.
pub const ABSENT_MARKER: &str = "None";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub mode: ReconcileMode,
    pub categories: Vec<String>,
    pub category: Option<String>,
    pub available_items: Vec<String>,
    pub selected_items: Vec<String>,
    pub presentation: PresentationConfig,
    pub active_plan: Option<ComputationPlan>,
    pub computing: bool,
    pub progress: Option<BatchProgressView>,
    pub last_completed: Option<ComputedResult>,
    pub last_failure: Option<String>,
    pub last_error: Option<String>,
    pub polling: Option<ResultPollingState>,
    pub poll_phase: PollPhase,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    pub address: ItemAddress,
    pub result: Option<String>,
}

impl fmt::Display for ListingRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}: {}",
            self.address.category(),
            self.address.item_name(),
            self.result.as_deref().unwrap_or(ABSENT_MARKER)
        )
    }
}

/// Snapshot of the store for the addresses a [`PresentationConfig`] shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Listing {
    pub text_color: TextColor,
    pub rows: Vec<ListingRow>,
}

impl Listing {
    pub fn lines(&self) -> Vec<String> {
        self.rows.iter().map(ToString::to_string).collect()
    }

    pub fn pending(&self) -> usize {
        self.rows.iter().filter(|row| row.result.is_none()).count()
    }
}

/// Read the current store value of every presented address, in order.
///
/// Every call reads the store afresh.
pub fn render(config: &PresentationConfig, store: &dyn ResultStore) -> Result<Listing, StoreError> {
    let rows = config
        .addresses
        .iter()
        .map(|addr| {
            Ok(ListingRow {
                address: addr.clone(),
                result: store.get(addr)?,
            })
        })
        .collect::<Result<Vec<_>, StoreError>>()?;
    Ok(Listing {
        text_color: config.text_color,
        rows,
    })
}
