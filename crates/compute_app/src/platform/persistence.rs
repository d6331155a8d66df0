use std::fs;
use std::path::{Path, PathBuf};

use compute_core::SelectionSnapshot;
use compute_engine::{ensure_store_dir, AtomicFileWriter};
use engine_logging::{engine_error, engine_info, engine_warn};

const STATE_FILENAME: &str = ".presentation_state.ron";

/// Selection saved by the previous run, if any could be read.
pub(crate) fn load_selection(data_dir: &Path) -> Option<SelectionSnapshot> {
    let path = data_dir.join(STATE_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return None;
        }
        Err(err) => {
            engine_warn!("Failed to read presentation state from {:?}: {}", path, err);
            return None;
        }
    };

    match ron::from_str(&content) {
        Ok(snapshot) => {
            engine_info!("Loaded presentation state from {:?}", path);
            Some(snapshot)
        }
        Err(err) => {
            engine_warn!("Failed to parse presentation state from {:?}: {}", path, err);
            None
        }
    }
}

pub(crate) fn save_selection(data_dir: &Path, snapshot: &SelectionSnapshot) {
    if let Err(err) = ensure_store_dir(data_dir) {
        engine_error!("Failed to ensure data dir {:?}: {}", data_dir, err);
        return;
    }

    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(snapshot, pretty) {
        Ok(text) => text,
        Err(err) => {
            engine_error!("Failed to serialize presentation state: {}", err);
            return;
        }
    };

    let writer = AtomicFileWriter::new(PathBuf::from(data_dir));
    if let Err(err) = writer.write(STATE_FILENAME, content.as_bytes()) {
        engine_error!(
            "Failed to write presentation state to {:?}: {}",
            data_dir,
            err
        );
    }
}
