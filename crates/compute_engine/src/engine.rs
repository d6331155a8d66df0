use std::collections::VecDeque;
use std::io;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use compute_core::{ComputationPlan, ResultStore};
use engine_logging::{engine_error, engine_info, engine_warn};
use thiserror::Error;
use tokio::sync::{mpsc as async_mpsc, Notify};
use tokio_util::sync::CancellationToken;

use crate::runner::{BatchRunner, ChannelProgressSink, RunnerSettings};
use crate::{ComputeSettings, Computer, EngineEvent};

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub compute: ComputeSettings,
    pub runner: RunnerSettings,
    /// Worker threads of the engine runtime; `None` uses tokio's default.
    pub worker_threads: Option<usize>,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] io::Error),
}

enum EngineCommand {
    Compute(ComputationPlan),
    ClearResults,
}

/// Background runner for computation plans.
///
/// Owns a thread with its own tokio runtime. Plans run one batch at a time in
/// submission order; a plan still waiting when a newer one arrives is dropped
/// and reported as [`EngineEvent::BatchSuperseded`].
pub struct EngineHandle {
    cmd_tx: async_mpsc::UnboundedSender<EngineCommand>,
    event_rx: Mutex<mpsc::Receiver<EngineEvent>>,
    cancel: CancellationToken,
    thread: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn ResultStore>,
        computer: Arc<dyn Computer>,
    ) -> Result<Self, EngineError> {
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        builder.enable_time().thread_name("compute-engine");
        if let Some(threads) = config.worker_threads {
            builder.worker_threads(threads.max(1));
        }
        let runtime = builder.build()?;

        let (cmd_tx, cmd_rx) = async_mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();
        let cancel = CancellationToken::new();
        let runner = BatchRunner::new(store.clone(), computer, config.runner);

        let dispatcher = Dispatcher {
            runner,
            store,
            event_tx,
            queue: Arc::new(Mutex::new(VecDeque::new())),
            queued: Arc::new(Notify::new()),
            cancel: cancel.clone(),
        };
        let thread = thread::Builder::new()
            .name("compute-engine".to_string())
            .spawn(move || runtime.block_on(dispatcher.run(cmd_rx)))?;

        Ok(Self {
            cmd_tx,
            event_rx: Mutex::new(event_rx),
            cancel,
            thread: Some(thread),
        })
    }

    pub fn compute(&self, plan: ComputationPlan) {
        if self.cmd_tx.send(EngineCommand::Compute(plan)).is_err() {
            engine_warn!("Engine stopped; computation plan dropped");
        }
    }

    pub fn clear_results(&self) {
        if self.cmd_tx.send(EngineCommand::ClearResults).is_err() {
            engine_warn!("Engine stopped; clear request dropped");
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.recv_timeout(timeout).ok()
    }

    /// Stop the engine. The batch in flight is abandoned at its current item;
    /// results stored before that stay stored.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                engine_error!("Engine thread panicked");
            }
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Dispatcher {
    runner: BatchRunner,
    store: Arc<dyn ResultStore>,
    event_tx: mpsc::Sender<EngineEvent>,
    queue: Arc<Mutex<VecDeque<ComputationPlan>>>,
    queued: Arc<Notify>,
    cancel: CancellationToken,
}

impl Dispatcher {
    async fn run(self, mut cmd_rx: async_mpsc::UnboundedReceiver<EngineCommand>) {
        let worker = tokio::spawn(batch_worker(
            self.runner.clone(),
            self.event_tx.clone(),
            self.queue.clone(),
            self.queued.clone(),
            self.cancel.clone(),
        ));

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                command = cmd_rx.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
            }
        }

        self.cancel.cancel();
        let _ = worker.await;
        engine_info!("Engine stopped");
    }

    fn handle(&self, command: EngineCommand) {
        match command {
            EngineCommand::Compute(plan) => self.enqueue(plan),
            EngineCommand::ClearResults => {
                let store = self.store.clone();
                let event_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    let result = match tokio::task::spawn_blocking(move || store.clear_all()).await
                    {
                        Ok(Ok(())) => Ok(()),
                        Ok(Err(err)) => Err(err.to_string()),
                        Err(err) => Err(format!("clear task failed: {err}")),
                    };
                    if let Err(err) = &result {
                        engine_error!("Failed to clear result store: {}", err);
                    }
                    let _ = event_tx.send(EngineEvent::ResultsCleared { result });
                });
            }
        }
    }

    fn enqueue(&self, plan: ComputationPlan) {
        let superseded: Vec<ComputationPlan> = match self.queue.lock() {
            Ok(mut queue) => {
                let waiting = queue.drain(..).collect();
                queue.push_back(plan);
                waiting
            }
            Err(_) => {
                engine_error!("Batch queue poisoned; dropping batch {}", plan.batch_id());
                return;
            }
        };
        for old in superseded {
            engine_info!("Batch {} superseded before it started", old.batch_id());
            let _ = self.event_tx.send(EngineEvent::BatchSuperseded {
                batch_id: old.batch_id(),
            });
        }
        self.queued.notify_one();
    }
}

async fn batch_worker(
    runner: BatchRunner,
    event_tx: mpsc::Sender<EngineEvent>,
    queue: Arc<Mutex<VecDeque<ComputationPlan>>>,
    queued: Arc<Notify>,
    cancel: CancellationToken,
) {
    let sink = ChannelProgressSink::new(event_tx.clone());
    loop {
        let next = queue.lock().ok().and_then(|mut queue| queue.pop_front());
        let Some(plan) = next else {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = queued.notified() => {}
            }
            continue;
        };

        let batch_id = plan.batch_id();
        tokio::select! {
            _ = cancel.cancelled() => {
                engine_warn!("Batch {} abandoned at shutdown", batch_id);
                break;
            }
            result = runner.run(&plan, &sink) => {
                match &result {
                    Ok(computed) => engine_info!(
                        "Batch {} done, {} results stored",
                        batch_id,
                        computed.addresses.len()
                    ),
                    Err(err) => engine_warn!("Batch {} failed: {}", batch_id, err),
                }
                let _ = event_tx.send(EngineEvent::BatchCompleted { batch_id, result });
            }
        }
    }
}
