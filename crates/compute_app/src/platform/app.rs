use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use compute_core::{
    render, update, AppState, AtomicSequence, Env, MemoryResultStore, Msg, PollPhase,
    ReconcileMode, ResultStore, SequenceSource,
};
use compute_engine::{EngineHandle, FileResultStore, FileSequence, SimulatedComputer};
use engine_logging::{engine_info, engine_warn};

use super::commands::{self, Command};
use super::config::{AppConfig, StoreKind, DEFAULT_CONFIG_PATH};
use super::effects::EffectRunner;
use super::persistence;
use super::ui;

/// Everything the control thread reacts to.
enum Input {
    Line(String),
    Msg(Msg),
    Closed,
}

pub fn run_app() -> anyhow::Result<()> {
    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let loaded = AppConfig::load(&config_path);
    let config = loaded.as_ref().cloned().unwrap_or_default();
    engine_logging::initialize(&config.log);
    match &loaded {
        Ok(_) => engine_info!("Configuration from {:?}", config_path),
        Err(err) => engine_warn!("Using default configuration: {}", err),
    }

    let (store, sequence) = open_store(&config)?;
    let engine_config = config.engine_config();
    let computer = Arc::new(SimulatedComputer::new(engine_config.compute.clone()));
    let engine = EngineHandle::new(engine_config, store.clone(), computer)
        .context("failed to start compute engine")?;

    let (input_tx, input_rx) = mpsc::channel::<Input>();
    let engine_tx = input_tx.clone();
    let effects = EffectRunner::new(engine, move |msg| engine_tx.send(Input::Msg(msg)).is_ok());

    let polling = Arc::new(AtomicBool::new(false));
    spawn_stdin_reader(input_tx.clone());
    if config.reconcile == ReconcileMode::Poll {
        spawn_ticker(input_tx, config.poll_interval(), polling.clone());
    } else {
        drop(input_tx);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in ui::layout::banner(&config.data_dir, config.reconcile) {
        writeln!(out, "{line}")?;
    }

    let mut controller = Controller::new(
        AppState::with_mode(config.reconcile),
        store,
        sequence,
        effects,
        polling,
        out,
    );
    let snapshot = persistence::load_selection(&config.data_dir).unwrap_or_default();
    controller.dispatch(Msg::RestoreSelection(snapshot))?;
    controller.run(input_rx)?;

    persistence::save_selection(&config.data_dir, &controller.state.selection_snapshot());
    controller.effects.shutdown();
    engine_info!("compute_app exiting");
    Ok(())
}

fn open_store(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn ResultStore>, Box<dyn SequenceSource>)> {
    match config.store {
        StoreKind::File => {
            let store = FileResultStore::open(&config.data_dir)
                .with_context(|| format!("failed to open result store {:?}", config.data_dir))?;
            let sequence = FileSequence::open(config.sequence_path())
                .context("failed to open sequence file")?;
            if config.clear_store_on_startup {
                store.clear_all().context("failed to clear result store")?;
                sequence.clear().context("failed to reset sequence")?;
                engine_info!("Cleared result store at startup");
            }
            let store: Arc<dyn ResultStore> = Arc::new(store);
            let sequence: Box<dyn SequenceSource> = Box::new(sequence);
            Ok((store, sequence))
        }
        StoreKind::Memory => {
            let store: Arc<dyn ResultStore> = Arc::new(MemoryResultStore::new());
            let sequence: Box<dyn SequenceSource> = Box::new(AtomicSequence::new());
            Ok((store, sequence))
        }
    }
}

fn spawn_stdin_reader(tx: mpsc::Sender<Input>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(Input::Line(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(Input::Closed);
    });
}

/// Ticks only while `polling` is set; the controller clears it once the
/// reconciler is idle.
fn spawn_ticker(tx: mpsc::Sender<Input>, interval: Duration, polling: Arc<AtomicBool>) {
    thread::spawn(move || loop {
        thread::sleep(interval);
        if polling.load(Ordering::Relaxed) && tx.send(Input::Msg(Msg::Tick)).is_err() {
            break;
        }
    });
}

/// Owns the state and applies every input through the reducer.
struct Controller<W: Write> {
    state: AppState,
    store: Arc<dyn ResultStore>,
    sequence: Box<dyn SequenceSource>,
    effects: EffectRunner,
    polling: Arc<AtomicBool>,
    out: W,
}

impl<W: Write> Controller<W> {
    fn new(
        state: AppState,
        store: Arc<dyn ResultStore>,
        sequence: Box<dyn SequenceSource>,
        effects: EffectRunner,
        polling: Arc<AtomicBool>,
        out: W,
    ) -> Self {
        Self {
            state,
            store,
            sequence,
            effects,
            polling,
            out,
        }
    }

    fn run(&mut self, inputs: mpsc::Receiver<Input>) -> io::Result<()> {
        self.prompt()?;
        for input in inputs {
            match input {
                Input::Line(line) => {
                    if !self.handle_line(&line)? {
                        break;
                    }
                    self.prompt()?;
                }
                Input::Msg(msg) => self.dispatch(msg)?,
                Input::Closed => break,
            }
        }
        Ok(())
    }

    /// Returns false once the user asked to quit.
    fn handle_line(&mut self, line: &str) -> io::Result<bool> {
        match commands::parse(line) {
            Ok(None) => {}
            Ok(Some(Command::Dispatch(msg))) => self.dispatch(msg)?,
            Ok(Some(Command::Show)) => {
                self.redraw()?;
                let view = self.state.view();
                self.write_lines(ui::render::render_debug(&view))?;
            }
            Ok(Some(Command::Help)) => {
                self.write_lines(ui::layout::HELP.iter().map(|line| line.to_string()))?;
            }
            Ok(Some(Command::Quit)) => return Ok(false),
            Err(err) => writeln!(self.out, "{err}")?,
        }
        Ok(true)
    }

    fn dispatch(&mut self, msg: Msg) -> io::Result<()> {
        let env = Env::new(self.store.as_ref(), self.sequence.as_ref());
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg, &env);
        let was_dirty = state.consume_dirty();
        self.state = state;
        self.polling.store(
            self.state.poll_phase() == PollPhase::Polling,
            Ordering::Relaxed,
        );
        self.effects.enqueue(effects);
        if was_dirty {
            self.redraw()?;
        }
        Ok(())
    }

    fn redraw(&mut self) -> io::Result<()> {
        let view = self.state.view();
        let listing = match render(&view.presentation, self.store.as_ref()) {
            Ok(listing) => Some(listing),
            Err(err) => {
                engine_warn!("Skipping listing refresh: {}", err);
                None
            }
        };
        self.write_lines(ui::render::render(&view, listing.as_ref()))
    }

    fn write_lines(&mut self, lines: impl IntoIterator<Item = String>) -> io::Result<()> {
        for line in lines {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()
    }

    fn prompt(&mut self) -> io::Result<()> {
        write!(self.out, "{}", ui::constants::PROMPT)?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compute_core::{ItemAddress, TextColor};
    use compute_engine::{ComputeSettings, EngineConfig};
    use std::time::Instant;

    struct Harness {
        controller: Controller<Vec<u8>>,
        inputs: mpsc::Receiver<Input>,
        store: Arc<MemoryResultStore>,
    }

    impl Harness {
        fn new(mode: ReconcileMode) -> Self {
            engine_logging::initialize_for_tests();
            let store = Arc::new(MemoryResultStore::new());
            let config = EngineConfig {
                compute: ComputeSettings {
                    delay: Duration::from_millis(5),
                    scale_by_index: false,
                },
                ..EngineConfig::default()
            };
            let computer = Arc::new(SimulatedComputer::new(config.compute.clone()));
            let engine = EngineHandle::new(config, store.clone(), computer).unwrap();
            let (tx, inputs) = mpsc::channel();
            let effects = EffectRunner::new(engine, move |msg| tx.send(Input::Msg(msg)).is_ok());
            let controller = Controller::new(
                AppState::with_mode(mode),
                store.clone(),
                Box::new(AtomicSequence::new()),
                effects,
                Arc::new(AtomicBool::new(false)),
                Vec::new(),
            );
            Self {
                controller,
                inputs,
                store,
            }
        }

        /// Feed engine messages back until `done` holds or time runs out.
        fn pump_until(&mut self, done: impl Fn(&Harness) -> bool) {
            let deadline = Instant::now() + Duration::from_secs(5);
            while !done(self) && Instant::now() < deadline {
                if let Ok(Input::Msg(msg)) = self.inputs.recv_timeout(Duration::from_millis(50)) {
                    self.controller.dispatch(msg).unwrap();
                }
            }
        }

        fn output(&self) -> String {
            String::from_utf8_lossy(&self.controller.out).into_owned()
        }
    }

    fn computing(h: &Harness) -> bool {
        h.controller.state.view().computing
    }

    #[test]
    fn selection_is_computed_and_listed() {
        let mut h = Harness::new(ReconcileMode::Push);

        assert!(h.controller.handle_line("select item_1 item_2").unwrap());
        assert!(h.output().contains("cat_a, item_2: None"));
        h.pump_until(|h| !computing(h));

        assert!(h
            .store
            .has(&ItemAddress::new("cat_a", "item_2"))
            .unwrap());
        assert!(h.output().contains("cat_a, item_2: COMPUTED#cat_a_item_2"));
    }

    #[test]
    fn polling_flag_follows_the_reconciler() {
        let mut h = Harness::new(ReconcileMode::Poll);

        h.controller.handle_line("category cat_b").unwrap();
        assert!(h.controller.polling.load(Ordering::Relaxed));
        h.pump_until(|h| !computing(h));

        let view = h.controller.state.view();
        assert_eq!(view.poll_phase, PollPhase::Idle);
        assert_eq!(view.polling.map(|snapshot| snapshot.missing), Some(Vec::new()));
        assert!(!h.controller.polling.load(Ordering::Relaxed));
        assert!(h.output().contains("cat_b, item_1: COMPUTED#cat_b_item_1"));
    }

    #[test]
    fn ticker_is_silent_while_idle() {
        let (tx, rx) = mpsc::channel();
        let polling = Arc::new(AtomicBool::new(false));
        spawn_ticker(tx, Duration::from_millis(5), polling.clone());

        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

        polling.store(true, Ordering::Relaxed);
        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(2)),
            Ok(Input::Msg(Msg::Tick))
        ));
    }

    #[test]
    fn color_and_errors_are_reported() {
        let mut h = Harness::new(ReconcileMode::Push);

        h.controller.handle_line("color purple").unwrap();
        assert!(h.output().contains("unknown color \"purple\""));

        h.controller.handle_line("color blue").unwrap();
        assert_eq!(
            h.controller.state.selection_snapshot().text_color,
            TextColor::Blue
        );
        assert!(!h.controller.handle_line("quit").unwrap());
    }
}
