use compute_core::{
    update, AppState, AtomicSequence, BatchFailure, ComputedResult, Effect, Env, ItemAddress,
    MemoryResultStore, Msg, PollPhase, ReconcileMode, ResultStore,
};
use pretty_assertions::assert_eq;

fn items(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn start_batch(state: AppState, env: &Env<'_>, names: &[&str]) -> (AppState, u64) {
    let (mut state, effects) = update(state, Msg::ItemsSelected(items(names)), env);
    state.consume_dirty();
    let batch_id = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::ComputeBatch(plan) => Some(plan.batch_id()),
            _ => None,
        })
        .expect("compute effect");
    (state, batch_id)
}

#[test]
fn push_progress_for_presented_item_marks_dirty() {
    engine_logging::initialize_for_tests();
    let store = MemoryResultStore::new();
    let sequence = AtomicSequence::new();
    let env = Env::new(&store, &sequence);
    let (state, batch_id) = start_batch(AppState::new(), &env, &["item_1", "item_2"]);

    let (mut state, effects) = update(
        state,
        Msg::BatchProgress {
            batch_id,
            address: ItemAddress::new("cat_a", "item_1"),
            completed: 1,
            total: 2,
        },
        &env,
    );

    assert!(effects.is_empty());
    assert!(state.consume_dirty());
    let progress = state.view().progress.expect("progress");
    assert_eq!((progress.completed, progress.total), (1, 2));
}

#[test]
fn progress_for_address_no_longer_presented_is_benign() {
    let store = MemoryResultStore::new();
    let sequence = AtomicSequence::new();
    let env = Env::new(&store, &sequence);
    let (state, batch_id) = start_batch(AppState::new(), &env, &["item_1", "item_2"]);
    let (state, _) = start_batch(state, &env, &["item_3"]);

    let (mut state, effects) = update(
        state,
        Msg::BatchProgress {
            batch_id,
            address: ItemAddress::new("cat_a", "item_1"),
            completed: 1,
            total: 2,
        },
        &env,
    );

    assert!(effects.is_empty());
    assert!(!state.consume_dirty());
}

#[test]
fn completion_records_result_and_stops_computing() {
    let store = MemoryResultStore::new();
    let sequence = AtomicSequence::new();
    let env = Env::new(&store, &sequence);
    let (state, batch_id) = start_batch(AppState::new(), &env, &["item_1"]);
    let computed = ComputedResult {
        batch_id,
        addresses: vec![ItemAddress::new("cat_a", "item_1")],
    };

    let (mut state, _) = update(
        state,
        Msg::BatchCompleted {
            batch_id,
            result: Ok(computed.clone()),
        },
        &env,
    );

    let view = state.view();
    assert!(!view.computing);
    assert_eq!(view.last_completed, Some(computed));
    assert!(state.consume_dirty());
}

#[test]
fn failed_batch_is_surfaced() {
    let store = MemoryResultStore::new();
    let sequence = AtomicSequence::new();
    let env = Env::new(&store, &sequence);
    let (state, batch_id) = start_batch(AppState::new(), &env, &["item_1", "item_2", "item_3"]);

    let (state, _) = update(
        state,
        Msg::BatchCompleted {
            batch_id,
            result: Err(BatchFailure {
                failed: Some(ItemAddress::new("cat_a", "item_2")),
                completed: vec![ItemAddress::new("cat_a", "item_1")],
                message: "boom".to_string(),
            }),
        },
        &env,
    );

    let view = state.view();
    assert!(!view.computing);
    let failure = view.last_failure.expect("failure");
    assert!(failure.contains("cat_a/item_2"));
    assert!(failure.contains("boom"));
}

#[test]
fn completion_of_unknown_batch_is_ignored() {
    let store = MemoryResultStore::new();
    let sequence = AtomicSequence::new();
    let env = Env::new(&store, &sequence);
    let state = AppState::new();

    let (next, _) = update(
        state.clone(),
        Msg::BatchCompleted {
            batch_id: 99,
            result: Ok(ComputedResult::new(99)),
        },
        &env,
    );

    assert_eq!(next, state);
}

#[test]
fn superseded_batch_is_no_longer_outstanding() {
    let store = MemoryResultStore::new();
    let sequence = AtomicSequence::new();
    let env = Env::new(&store, &sequence);
    let (state, first) = start_batch(AppState::new(), &env, &["item_1", "item_2"]);
    let (state, second) = start_batch(state, &env, &["item_3"]);

    let (state, _) = update(state, Msg::BatchSuperseded { batch_id: first }, &env);
    assert!(state.view().computing);

    let (state, _) = update(
        state,
        Msg::BatchCompleted {
            batch_id: second,
            result: Ok(ComputedResult::new(second)),
        },
        &env,
    );
    assert!(!state.view().computing);
}

#[test]
fn poll_mode_renders_on_changed_snapshots_only() {
    let store = MemoryResultStore::new();
    let sequence = AtomicSequence::new();
    let env = Env::new(&store, &sequence);
    let (state, _) = start_batch(
        AppState::with_mode(ReconcileMode::Poll),
        &env,
        &["item_1", "item_2"],
    );
    assert_eq!(state.view().poll_phase, PollPhase::Polling);

    let (mut state, _) = update(state, Msg::Tick, &env);
    assert!(state.consume_dirty());
    let (mut state, _) = update(state, Msg::Tick, &env);
    assert!(!state.consume_dirty());

    store.set(&ItemAddress::new("cat_a", "item_1"), "A").unwrap();
    let (mut state, _) = update(state, Msg::Tick, &env);
    assert!(state.consume_dirty());
    assert_eq!(
        state.view().polling.expect("snapshot").missing,
        vec![ItemAddress::new("cat_a", "item_2")]
    );

    store.set(&ItemAddress::new("cat_a", "item_2"), "B").unwrap();
    let (mut state, _) = update(state, Msg::Tick, &env);
    assert!(state.consume_dirty());
    assert_eq!(state.view().poll_phase, PollPhase::Idle);
}

#[test]
fn poll_mode_ignores_push_progress_for_rendering() {
    let store = MemoryResultStore::new();
    let sequence = AtomicSequence::new();
    let env = Env::new(&store, &sequence);
    let (state, batch_id) = start_batch(
        AppState::with_mode(ReconcileMode::Poll),
        &env,
        &["item_1"],
    );

    let (mut state, _) = update(
        state,
        Msg::BatchProgress {
            batch_id,
            address: ItemAddress::new("cat_a", "item_1"),
            completed: 1,
            total: 1,
        },
        &env,
    );

    assert!(!state.consume_dirty());
}

#[test]
fn failed_batch_in_poll_mode_returns_poller_to_idle() {
    let store = MemoryResultStore::new();
    let sequence = AtomicSequence::new();
    let env = Env::new(&store, &sequence);
    let (state, batch_id) = start_batch(
        AppState::with_mode(ReconcileMode::Poll),
        &env,
        &["item_1", "item_2"],
    );
    store.set(&ItemAddress::new("cat_a", "item_1"), "A").unwrap();

    let (mut state, _) = update(
        state,
        Msg::BatchCompleted {
            batch_id,
            result: Err(BatchFailure {
                failed: Some(ItemAddress::new("cat_a", "item_2")),
                completed: vec![ItemAddress::new("cat_a", "item_1")],
                message: "boom".to_string(),
            }),
        },
        &env,
    );

    assert!(state.consume_dirty());
    let view = state.view();
    assert!(!view.computing);
    assert_eq!(view.poll_phase, PollPhase::Idle);
    assert_eq!(
        view.polling.expect("final snapshot").missing,
        vec![ItemAddress::new("cat_a", "item_2")]
    );

    let (mut state, _) = update(state, Msg::Tick, &env);
    assert_eq!(state.poll_phase(), PollPhase::Idle);
    assert!(!state.consume_dirty());
}

#[test]
fn completion_of_older_batch_keeps_polling_the_newer_plan() {
    let store = MemoryResultStore::new();
    let sequence = AtomicSequence::new();
    let env = Env::new(&store, &sequence);
    let (state, first) = start_batch(
        AppState::with_mode(ReconcileMode::Poll),
        &env,
        &["item_1"],
    );
    let (state, second) = start_batch(state, &env, &["item_3"]);

    let (state, _) = update(
        state,
        Msg::BatchCompleted {
            batch_id: first,
            result: Ok(ComputedResult::new(first)),
        },
        &env,
    );
    assert_eq!(state.poll_phase(), PollPhase::Polling);

    let (state, _) = update(state, Msg::BatchSuperseded { batch_id: second }, &env);
    assert_eq!(state.poll_phase(), PollPhase::Idle);
}

#[test]
fn successful_batch_clears_previous_failure() {
    let store = MemoryResultStore::new();
    let sequence = AtomicSequence::new();
    let env = Env::new(&store, &sequence);
    let (state, failed) = start_batch(AppState::new(), &env, &["item_1", "item_2"]);
    let (state, _) = update(
        state,
        Msg::BatchCompleted {
            batch_id: failed,
            result: Err(BatchFailure {
                failed: Some(ItemAddress::new("cat_a", "item_1")),
                completed: Vec::new(),
                message: "boom".to_string(),
            }),
        },
        &env,
    );
    assert!(state.view().last_failure.is_some());

    let (state, next) = start_batch(state, &env, &["item_3"]);
    let (state, _) = update(
        state,
        Msg::BatchCompleted {
            batch_id: next,
            result: Ok(ComputedResult::new(next)),
        },
        &env,
    );

    assert_eq!(state.view().last_failure, None);
}
