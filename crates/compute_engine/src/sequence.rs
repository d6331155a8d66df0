use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use compute_core::{SequenceSource, StoreError};
use engine_logging::engine_warn;

use crate::persist::AtomicFileWriter;

/// Named counters persisted to a RON file after every increment.
#[derive(Debug)]
pub struct FileSequence {
    path: PathBuf,
    writer: AtomicFileWriter,
    counters: Mutex<BTreeMap<String, u64>>,
}

impl FileSequence {
    /// Open the counter file at `path`, starting from zero if it is missing.
    ///
    /// A file that cannot be decoded is logged and replaced on the next write,
    /// so a damaged counter never blocks startup.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let counters = load_counters(&path)?;
        Ok(Self {
            path,
            writer: AtomicFileWriter::new(dir),
            counters: Mutex::new(counters),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reset every counter.
    pub fn clear(&self) -> Result<(), StoreError> {
        let mut counters = self.lock()?;
        counters.clear();
        self.save(&counters)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, u64>>, StoreError> {
        self.counters
            .lock()
            .map_err(|_| StoreError::Unavailable("sequence lock poisoned".to_string()))
    }

    fn save(&self, counters: &BTreeMap<String, u64>) -> Result<(), StoreError> {
        let text = ron::to_string(counters).map_err(|err| StoreError::Decode {
            what: format!("{:?}", self.path),
            message: err.to_string(),
        })?;
        let filename = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| StoreError::Unavailable(format!("invalid path {:?}", self.path)))?;
        self.writer.write(filename, text.as_bytes())?;
        Ok(())
    }
}

impl SequenceSource for FileSequence {
    fn next(&self, name: &str) -> Result<u64, StoreError> {
        let mut counters = self.lock()?;
        let value = counters.get(name).copied().unwrap_or(0) + 1;
        // Bumped before saving so a failed write never hands out a value twice.
        counters.insert(name.to_string(), value);
        self.save(&counters)?;
        Ok(value)
    }
}

fn load_counters(path: &Path) -> Result<BTreeMap<String, u64>, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(err) => return Err(err.into()),
    };
    match ron::from_str(&text) {
        Ok(counters) => Ok(counters),
        Err(err) => {
            engine_warn!("Failed to parse sequence file {:?}: {}", path, err);
            Ok(BTreeMap::new())
        }
    }
}
