use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use compute_core::{BatchFailure, Effect, Msg};
use compute_engine::{BatchError, EngineEvent, EngineHandle};
use engine_logging::{engine_error, engine_info, engine_warn};

const EVENT_POLL: Duration = Duration::from_millis(50);

/// Carries reducer effects to the engine and engine events back as messages.
pub(crate) struct EffectRunner {
    engine: Arc<EngineHandle>,
    stop: Arc<AtomicBool>,
    forwarder: Option<thread::JoinHandle<()>>,
}

impl EffectRunner {
    /// Start forwarding engine events through `forward`; forwarding ends when
    /// `forward` returns false or the runner shuts down.
    pub(crate) fn new<F>(engine: EngineHandle, forward: F) -> Self
    where
        F: Fn(Msg) -> bool + Send + 'static,
    {
        let engine = Arc::new(engine);
        let stop = Arc::new(AtomicBool::new(false));
        let forwarder = spawn_event_loop(engine.clone(), stop.clone(), forward);
        Self {
            engine,
            stop,
            forwarder: Some(forwarder),
        }
    }

    pub(crate) fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ComputeBatch(plan) => {
                    engine_info!(
                        "ComputeBatch batch_id={} items={}",
                        plan.batch_id(),
                        plan.len()
                    );
                    self.engine.compute(plan);
                }
                Effect::ClearResults => {
                    engine_info!("ClearResults");
                    self.engine.clear_results();
                }
            }
        }
    }

    pub(crate) fn shutdown(mut self) {
        self.stop_forwarder();
        let engine = Arc::clone(&self.engine);
        drop(self);
        match Arc::try_unwrap(engine) {
            Ok(engine) => engine.shutdown(),
            // Dropping the last handle stops the engine.
            Err(_) => engine_warn!("Engine still shared at shutdown"),
        }
    }

    fn stop_forwarder(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(forwarder) = self.forwarder.take() {
            if forwarder.join().is_err() {
                engine_error!("Engine event forwarder panicked");
            }
        }
    }
}

impl Drop for EffectRunner {
    fn drop(&mut self) {
        self.stop_forwarder();
    }
}

fn spawn_event_loop<F>(
    engine: Arc<EngineHandle>,
    stop: Arc<AtomicBool>,
    forward: F,
) -> thread::JoinHandle<()>
where
    F: Fn(Msg) -> bool + Send + 'static,
{
    thread::spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            let Some(event) = engine.recv_timeout(EVENT_POLL) else {
                continue;
            };
            if !forward(event_to_msg(event)) {
                break;
            }
        }
    })
}

pub(crate) fn event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Progress(progress) => Msg::BatchProgress {
            batch_id: progress.batch_id,
            address: progress.address,
            completed: progress.completed,
            total: progress.total,
        },
        EngineEvent::BatchCompleted { batch_id, result } => Msg::BatchCompleted {
            batch_id,
            result: result.map_err(to_failure),
        },
        EngineEvent::BatchSuperseded { batch_id } => Msg::BatchSuperseded { batch_id },
        EngineEvent::ResultsCleared { result } => Msg::ResultsCleared {
            error: result.err(),
        },
    }
}

fn to_failure(err: BatchError) -> BatchFailure {
    match err {
        BatchError::Computation {
            address,
            completed,
            source,
        } => BatchFailure {
            failed: Some(address),
            completed,
            message: source.to_string(),
        },
        BatchError::Store {
            address,
            completed,
            message,
        } => BatchFailure {
            failed: Some(address),
            completed,
            message: format!("store error: {message}"),
        },
    }
}
