use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::view_model::AppViewModel;
use crate::{
    BatchId, ComputationPlan, ComputedResult, Inventory, ItemAddress, PollPhase,
    PollingReconciler, PresentationConfig, TextColor,
};

/// How completed results reach the presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReconcileMode {
    /// Re-render on engine progress notifications.
    #[default]
    Push,
    /// Re-render when the polling reconciler observes a changed store.
    Poll,
}

/// Why a batch stopped before finishing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// Address whose computation failed, if the failure was item specific.
    pub failed: Option<ItemAddress>,
    /// Addresses stored before the failure.
    pub completed: Vec<ItemAddress>,
    pub message: String,
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.failed {
            Some(addr) => write!(
                f,
                "{addr} failed after {} completed: {}",
                self.completed.len(),
                self.message
            ),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Selection state that survives restarts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    pub category: Option<String>,
    pub items: Vec<String>,
    pub text_color: TextColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgressView {
    pub batch_id: BatchId,
    pub completed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    inventory: Inventory,
    mode: ReconcileMode,
    category: Option<String>,
    selected_items: Vec<String>,
    presentation: PresentationConfig,
    active_plan: Option<ComputationPlan>,
    outstanding: BTreeSet<BatchId>,
    progress: Option<BatchProgressView>,
    last_completed: Option<ComputedResult>,
    last_failure: Option<String>,
    last_error: Option<String>,
    poller: PollingReconciler,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_inventory(Inventory::default(), ReconcileMode::default())
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: ReconcileMode) -> Self {
        Self::with_inventory(Inventory::default(), mode)
    }

    pub fn with_inventory(inventory: Inventory, mode: ReconcileMode) -> Self {
        let category = inventory.categories().first().map(|c| (*c).to_string());
        let selected_items = category
            .as_deref()
            .map(|c| inventory.reconcile_selection(c, &[]))
            .unwrap_or_default();
        Self {
            inventory,
            mode,
            category,
            selected_items,
            presentation: PresentationConfig::default(),
            active_plan: None,
            outstanding: BTreeSet::new(),
            progress: None,
            last_completed: None,
            last_failure: None,
            last_error: None,
            poller: PollingReconciler::new(),
            dirty: false,
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            mode: self.mode,
            categories: self
                .inventory
                .categories()
                .into_iter()
                .map(ToOwned::to_owned)
                .collect(),
            category: self.category.clone(),
            available_items: self
                .category
                .as_deref()
                .map(|c| {
                    self.inventory
                        .items_in(c)
                        .into_iter()
                        .map(ToOwned::to_owned)
                        .collect()
                })
                .unwrap_or_default(),
            selected_items: self.selected_items.clone(),
            presentation: self.presentation.clone(),
            active_plan: self.active_plan.clone(),
            computing: !self.outstanding.is_empty(),
            progress: self.progress,
            last_completed: self.last_completed.clone(),
            last_failure: self.last_failure.clone(),
            last_error: self.last_error.clone(),
            polling: self.poller.last_snapshot().cloned(),
            poll_phase: self.poller.phase(),
            dirty: self.dirty,
        }
    }

    pub fn poll_phase(&self) -> PollPhase {
        self.poller.phase()
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn selection_snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            category: self.category.clone(),
            items: self.selected_items.clone(),
            text_color: self.presentation.text_color,
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn mode(&self) -> ReconcileMode {
        self.mode
    }

    pub(crate) fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub(crate) fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub(crate) fn selected_items(&self) -> &[String] {
        &self.selected_items
    }

    pub(crate) fn text_color(&self) -> TextColor {
        self.presentation.text_color
    }

    pub(crate) fn set_selection(&mut self, category: String, items: Vec<String>) {
        self.category = Some(category);
        self.selected_items = items;
    }

    pub(crate) fn set_text_color(&mut self, color: TextColor) {
        self.presentation.text_color = color;
    }

    /// Addresses of the current selection, in selection order.
    pub(crate) fn selected_addresses(&self) -> Vec<ItemAddress> {
        let Some(category) = self.category.as_deref() else {
            return Vec::new();
        };
        self.selected_items
            .iter()
            .map(|item| ItemAddress::new(category, item.as_str()))
            .collect()
    }

    /// The presentation already shows exactly the current selection.
    pub(crate) fn presents_selection(&self) -> bool {
        self.presentation.addresses == self.selected_addresses()
    }

    pub(crate) fn set_presentation(&mut self, presentation: PresentationConfig) {
        self.presentation = presentation;
        self.last_error = None;
    }

    pub(crate) fn is_presented(&self, addr: &ItemAddress) -> bool {
        self.presentation.addresses.contains(addr)
    }

    pub(crate) fn activate_plan(&mut self, plan: Option<ComputationPlan>) {
        match &plan {
            Some(plan) => {
                self.outstanding.insert(plan.batch_id());
                self.progress = Some(BatchProgressView {
                    batch_id: plan.batch_id(),
                    completed: 0,
                    total: plan.len(),
                });
                if self.mode == ReconcileMode::Poll {
                    self.poller.start(plan.clone());
                }
            }
            None => self.poller.stop(),
        }
        self.active_plan = plan;
    }

    pub(crate) fn record_progress(&mut self, progress: BatchProgressView) {
        if self.outstanding.contains(&progress.batch_id) {
            self.progress = Some(progress);
        }
    }

    pub(crate) fn finish_batch(&mut self, batch_id: BatchId) -> bool {
        self.outstanding.remove(&batch_id)
    }

    /// A successful batch also retires the previous failure.
    pub(crate) fn record_completed(&mut self, result: ComputedResult) {
        self.last_completed = Some(result);
        self.last_failure = None;
    }

    pub(crate) fn record_failure(&mut self, failure: String) {
        self.last_failure = Some(failure);
    }

    pub(crate) fn record_error(&mut self, error: String) {
        self.last_error = Some(error);
    }

    pub(crate) fn poller_mut(&mut self) -> &mut PollingReconciler {
        &mut self.poller
    }
}
