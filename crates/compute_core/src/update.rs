use engine_logging::{engine_info, engine_warn};

use crate::{
    resolve, AppState, BatchId, BatchProgressView, Effect, Msg, ReconcileMode, ResultStore,
    SelectionSnapshot, SequenceSource,
};

/// Collaborators the reducer may read from.
#[derive(Clone, Copy)]
pub struct Env<'a> {
    pub store: &'a dyn ResultStore,
    pub sequence: &'a dyn SequenceSource,
}

impl<'a> Env<'a> {
    pub fn new(store: &'a dyn ResultStore, sequence: &'a dyn SequenceSource) -> Self {
        Self { store, sequence }
    }
}

/// Applies a message to state and returns any effects.
///
/// Deterministic given the state, the message and the store contents; the
/// store is only read here, all writes happen through returned effects.
pub fn update(mut state: AppState, msg: Msg, env: &Env<'_>) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::RestoreSelection(snapshot) => restore_selection(&mut state, snapshot, env),
        Msg::CategorySelected(category) => {
            if !state.inventory().contains_category(&category) {
                engine_warn!("Ignoring unknown category {:?}", category);
                return (state, Vec::new());
            }
            let items = state
                .inventory()
                .reconcile_selection(&category, state.selected_items());
            state.set_selection(category, items);
            reselect(&mut state, env)
        }
        Msg::ItemsSelected(items) => {
            let Some(category) = state.category().map(ToOwned::to_owned) else {
                return (state, Vec::new());
            };
            let available = state.inventory().items_in(&category);
            let mut accepted: Vec<String> = Vec::with_capacity(items.len());
            for item in items {
                if available.contains(&item.as_str()) && !accepted.contains(&item) {
                    accepted.push(item);
                }
            }
            if accepted == state.selected_items() && state.presents_selection() {
                return (state, Vec::new());
            }
            state.set_selection(category, accepted);
            reselect(&mut state, env)
        }
        Msg::TextColorChanged(color) => {
            if state.text_color() != color {
                state.set_text_color(color);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ClearCacheClicked => vec![Effect::ClearResults],
        Msg::ResultsCleared { error } => {
            match error {
                Some(error) => state.record_error(error),
                None => engine_info!("Result store cleared"),
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::BatchProgress {
            batch_id,
            address,
            completed,
            total,
        } => {
            state.record_progress(BatchProgressView {
                batch_id,
                completed,
                total,
            });
            if state.mode() == ReconcileMode::Push && state.is_presented(&address) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::BatchCompleted { batch_id, result } => {
            if !state.finish_batch(batch_id) {
                // Completion for a batch this state never started.
                return (state, Vec::new());
            }
            match result {
                Ok(computed) => {
                    engine_info!(
                        "Batch {} completed with {} results",
                        batch_id,
                        computed.addresses.len()
                    );
                    state.record_completed(computed);
                }
                Err(failure) => {
                    engine_warn!("Batch {} failed: {}", batch_id, failure);
                    state.record_failure(format!("batch {batch_id}: {failure}"));
                }
            }
            settle_poller(&mut state, batch_id, env);
            state.mark_dirty();
            Vec::new()
        }
        Msg::BatchSuperseded { batch_id } => {
            if state.finish_batch(batch_id) {
                engine_info!("Batch {} superseded before it started", batch_id);
                settle_poller(&mut state, batch_id, env);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::Tick => {
            if state.mode() == ReconcileMode::Poll {
                poll_once(&mut state, env);
            }
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn poll_once(state: &mut AppState, env: &Env<'_>) {
    match state.poller_mut().tick(env.store) {
        Ok(Some(_snapshot)) => state.mark_dirty(),
        Ok(None) => {}
        Err(err) => {
            engine_warn!("Polling tick skipped: {}", err);
            state.record_error(err.to_string());
            state.mark_dirty();
        }
    }
}

/// The poller's batch has ended: take a last snapshot, then go idle even if
/// addresses are still missing.
fn settle_poller(state: &mut AppState, batch_id: BatchId, env: &Env<'_>) {
    if state.poller_mut().batch_id() != Some(batch_id) {
        return;
    }
    poll_once(state, env);
    state.poller_mut().stop();
}

fn restore_selection(
    state: &mut AppState,
    snapshot: SelectionSnapshot,
    env: &Env<'_>,
) -> Vec<Effect> {
    state.set_text_color(snapshot.text_color);
    let category = snapshot
        .category
        .filter(|category| state.inventory().contains_category(category))
        .or_else(|| state.category().map(ToOwned::to_owned));
    let Some(category) = category else {
        state.mark_dirty();
        return Vec::new();
    };
    let items = state
        .inventory()
        .reconcile_selection(&category, &snapshot.items);
    state.set_selection(category, items);
    reselect(state, env)
}

/// Rebuild the presentation for the current selection and plan what is missing.
fn reselect(state: &mut AppState, env: &Env<'_>) -> Vec<Effect> {
    state.mark_dirty();
    let selected = state.selected_addresses();
    let resolution = match resolve(&selected, state.text_color(), env.store, env.sequence) {
        Ok(resolution) => resolution,
        Err(err) => {
            engine_warn!("Skipping selection update: {}", err);
            state.record_error(err.to_string());
            return Vec::new();
        }
    };

    state.set_presentation(resolution.presentation);
    match resolution.plan.into_plan() {
        Some(plan) => {
            engine_info!(
                "Planned batch {} with {} items to compute",
                plan.batch_id(),
                plan.len()
            );
            state.activate_plan(Some(plan.clone()));
            vec![Effect::ComputeBatch(plan)]
        }
        None => {
            state.activate_plan(None);
            Vec::new()
        }
    }
}
