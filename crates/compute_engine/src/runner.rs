use std::sync::{mpsc, Arc};
use std::time::Duration;

use compute_core::{ComputationPlan, ComputedResult, ItemAddress, ResultStore, StoreError};
use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::{BatchError, BatchProgress, ComputeError, Computer, EngineEvent};

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[derive(Debug, Clone)]
pub struct RunnerSettings {
    /// Upper bound for a single item; `None` waits forever.
    pub item_timeout: Option<Duration>,
    /// Report addresses that are already stored as complete without recomputing them.
    pub skip_cached: bool,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            item_timeout: None,
            skip_cached: true,
        }
    }
}

/// Executes computation plans, storing every result before reporting it.
#[derive(Clone)]
pub struct BatchRunner {
    store: Arc<dyn ResultStore>,
    computer: Arc<dyn Computer>,
    settings: RunnerSettings,
}

impl BatchRunner {
    pub fn new(
        store: Arc<dyn ResultStore>,
        computer: Arc<dyn Computer>,
        settings: RunnerSettings,
    ) -> Self {
        Self {
            store,
            computer,
            settings,
        }
    }

    /// Run every address of `plan` in order.
    ///
    /// Progress is emitted after each address is durably stored. The first
    /// failure stops the batch; results stored before it are kept.
    pub async fn run(
        &self,
        plan: &ComputationPlan,
        sink: &dyn ProgressSink,
    ) -> Result<ComputedResult, BatchError> {
        let batch_id = plan.batch_id();
        let total = plan.len();
        let mut computed = ComputedResult::new(batch_id);
        engine_info!("Computing {} results, batch_id={}", total, batch_id);

        for (index, addr) in plan.addresses().iter().enumerate() {
            let cached = self.settings.skip_cached && {
                let key = addr.clone();
                self.with_store(move |store| store.has(&key))
                    .await
                    .map_err(|err| store_failure(addr, &computed, err))?
            };

            if cached {
                engine_debug!("Skipping {} in batch {}: already stored", addr, batch_id);
            } else {
                let result = self.compute_one(addr, index).await.map_err(|source| {
                    engine_warn!("Batch {} stopped at {}: {}", batch_id, addr, source);
                    BatchError::Computation {
                        address: addr.clone(),
                        completed: computed.addresses.clone(),
                        source,
                    }
                })?;
                let key = addr.clone();
                self.with_store(move |store| store.set(&key, &result))
                    .await
                    .map_err(|err| store_failure(addr, &computed, err))?;
            }

            computed.addresses.push(addr.clone());
            sink.emit(EngineEvent::Progress(BatchProgress {
                batch_id,
                address: addr.clone(),
                completed: computed.addresses.len(),
                total,
            }));
        }

        Ok(computed)
    }

    async fn compute_one(&self, addr: &ItemAddress, index: usize) -> Result<String, ComputeError> {
        let work = self.computer.compute(addr, index);
        match self.settings.item_timeout {
            Some(limit) => tokio::time::timeout(limit, work)
                .await
                .map_err(|_| ComputeError::Timeout(limit))?,
            None => work.await,
        }
    }

    /// Store calls block on file I/O, so they run off the async workers.
    async fn with_store<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn ResultStore) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        match tokio::task::spawn_blocking(move || call(store.as_ref())).await {
            Ok(result) => result,
            Err(err) => Err(StoreError::Unavailable(format!("store task failed: {err}"))),
        }
    }
}

fn store_failure(addr: &ItemAddress, computed: &ComputedResult, err: StoreError) -> BatchError {
    BatchError::Store {
        address: addr.clone(),
        completed: computed.addresses.clone(),
        message: err.to_string(),
    }
}
