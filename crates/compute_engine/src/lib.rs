//! Compute engine: durable result store, batch runner and the background
//! runtime that executes computation plans.
mod compute;
mod engine;
mod file_store;
mod filename;
mod persist;
mod runner;
mod sequence;
mod types;

pub use compute::{simulated_result, ComputeSettings, Computer, SimulatedComputer};
pub use engine::{EngineConfig, EngineError, EngineHandle};
pub use file_store::FileResultStore;
pub use filename::entry_filename;
pub use persist::{ensure_store_dir, AtomicFileWriter, PersistError};
pub use runner::{BatchRunner, ChannelProgressSink, ProgressSink, RunnerSettings};
pub use sequence::FileSequence;
pub use types::{BatchError, BatchProgress, ComputeError, EngineEvent};
