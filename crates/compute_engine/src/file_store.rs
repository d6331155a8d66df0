use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use compute_core::{ItemAddress, ResultStore, StoreError};
use engine_logging::{engine_debug, engine_info};
use serde::{Deserialize, Serialize};

use crate::filename::{entry_filename, ENTRY_EXTENSION};
use crate::persist::{ensure_store_dir, remove_files_with_extension, AtomicFileWriter};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    address: ItemAddress,
    result: String,
    stored_utc: DateTime<Utc>,
}

/// Durable [`ResultStore`] keeping one JSON record per address in a directory.
///
/// Writes go through [`AtomicFileWriter`], so concurrent readers never observe
/// a half-written record and writes to different keys touch different files.
#[derive(Debug, Clone)]
pub struct FileResultStore {
    writer: AtomicFileWriter,
}

impl FileResultStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        ensure_store_dir(&dir)?;
        engine_info!("Opened result store at {:?}", dir);
        Ok(Self {
            writer: AtomicFileWriter::new(dir),
        })
    }

    pub fn dir(&self) -> &Path {
        self.writer.dir()
    }

    pub fn entry_path(&self, addr: &ItemAddress) -> PathBuf {
        self.dir().join(entry_filename(addr))
    }

    /// Time the stored value for `addr` was written.
    pub fn stored_at(&self, addr: &ItemAddress) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self.read_entry(addr)?.map(|entry| entry.stored_utc))
    }

    fn read_entry(&self, addr: &ItemAddress) -> Result<Option<StoredEntry>, StoreError> {
        let path = self.entry_path(addr);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let entry: StoredEntry =
            serde_json::from_slice(&bytes).map_err(|err| StoreError::Decode {
                what: format!("{:?}", path),
                message: err.to_string(),
            })?;
        if entry.address != *addr {
            return Err(StoreError::Decode {
                what: format!("{:?}", path),
                message: format!("record belongs to {}, expected {}", entry.address, addr),
            });
        }
        Ok(Some(entry))
    }
}

impl ResultStore for FileResultStore {
    fn has(&self, addr: &ItemAddress) -> Result<bool, StoreError> {
        Ok(self.entry_path(addr).try_exists()?)
    }

    fn get(&self, addr: &ItemAddress) -> Result<Option<String>, StoreError> {
        Ok(self.read_entry(addr)?.map(|entry| entry.result))
    }

    fn set(&self, addr: &ItemAddress, result: &str) -> Result<(), StoreError> {
        let entry = StoredEntry {
            address: addr.clone(),
            result: result.to_string(),
            stored_utc: Utc::now(),
        };
        let content = serde_json::to_vec(&entry).map_err(|err| StoreError::Decode {
            what: addr.store_key(),
            message: err.to_string(),
        })?;
        let path = self.writer.write(&entry_filename(addr), &content)?;
        engine_debug!("Stored {} at {:?}", addr, path);
        Ok(())
    }

    fn clear_all(&self) -> Result<(), StoreError> {
        let removed = remove_files_with_extension(self.dir(), ENTRY_EXTENSION)?;
        engine_info!("Cleared {} stored results from {:?}", removed, self.dir());
        Ok(())
    }
}
