//! # Sync Configuration
//!
//! Configuration for the directory block sync service.

use serde::{Deserialize, Serialize};

use crate::domain::ExplorerError;

/// Sync service configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncConfig {
    /// Stop a walk after this many newly committed directory blocks.
    /// The next `synchronize()` resumes below them. `None` is unbounded.
    pub max_walk_depth: Option<u64>,

    /// Record a value-transfer block that fails to decode as an empty
    /// block instead of aborting the walk.
    pub tolerate_value_transfer_decode_failure: bool,

    /// Dump each committed directory block as JSON at debug level.
    pub log_committed_blocks: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_walk_depth: None,
            tolerate_value_transfer_decode_failure: false,
            log_committed_blocks: true,
        }
    }
}

impl SyncConfig {
    /// Create a config for testing (no JSON dumps).
    pub fn for_testing() -> Self {
        Self {
            max_walk_depth: None,
            tolerate_value_transfer_decode_failure: false,
            log_committed_blocks: false,
        }
    }

    /// Reject settings that would make every walk a no-op.
    pub fn validate(&self) -> Result<(), ExplorerError> {
        if self.max_walk_depth == Some(0) {
            return Err(ExplorerError::Config(
                "max_walk_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
