//! Persistence for the last fully-scanned block number.
//!
//! A single JSON object at a fixed path. Missing or corrupt files are
//! non-fatal: the scanner falls back to its time-window lookback and the
//! file is rewritten on the next successful scan.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Serialize, Deserialize)]
struct CheckpointFile {
    last_scanned_block: u64,
}

/// File-backed store for the scan checkpoint.
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load the persisted block number. Any read or parse failure yields
    /// `None`.
    pub fn load(&self) -> Option<u64> {
        if !self.path.exists() {
            return None;
        }
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read checkpoint file");
                return None;
            }
        };
        match serde_json::from_str::<CheckpointFile>(&contents) {
            Ok(file) => Some(file.last_scanned_block),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to parse checkpoint file");
                None
            }
        }
    }

    /// Persist a new block number. The stored value never regresses: saves
    /// clamp to the maximum of the previous and new values. Write failures
    /// are logged and ignored.
    pub fn save(&self, block: u64) {
        let previous = self.load();
        let block = previous.map_or(block, |p| p.max(block));

        match previous {
            Some(p) => info!(from = p, to = block, "Updating last scanned block"),
            None => info!(block, "Setting last scanned block for the first time"),
        }

        let file = CheckpointFile {
            last_scanned_block: block,
        };
        let json = match serde_json::to_string(&file) {
            Ok(j) => j,
            Err(e) => {
                warn!(error = %e, "Failed to serialize checkpoint");
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, json) {
            warn!(path = %self.path.display(), error = %e, "Failed to write checkpoint file");
        }
    }
}
