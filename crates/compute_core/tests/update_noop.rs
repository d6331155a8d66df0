use compute_core::{update, AppState, AtomicSequence, Env, MemoryResultStore, Msg};

#[test]
fn update_is_noop() {
    let store = MemoryResultStore::new();
    let sequence = AtomicSequence::new();
    let env = Env::new(&store, &sequence);
    let state = AppState::new();
    let (next, effects) = update(state.clone(), Msg::NoOp, &env);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn tick_in_push_mode_is_noop() {
    let store = MemoryResultStore::new();
    let sequence = AtomicSequence::new();
    let env = Env::new(&store, &sequence);
    let state = AppState::new();
    let (next, effects) = update(state.clone(), Msg::Tick, &env);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}
