// Store tuning.

/// Default spacing of in-memory reconstruction checkpoints.
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 16;

/// Configuration for a [`VersionStore`](super::VersionStore).
///
/// None of these settings affect what `get_version` returns or what `save`
/// writes; they only trade memory for reconstruction time.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Keep a full in-memory copy of every Nth version so reconstruction
    /// replays at most N-1 deltas. 0 disables checkpoints (always replay
    /// from the base).
    pub checkpoint_interval: usize,
    /// Maintain the prefix index for space accounting and content lookup.
    pub prefix_index: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            prefix_index: true,
        }
    }
}

impl StoreOptions {
    /// Whether `version` (1-based) should be checkpointed.
    pub(crate) fn is_checkpoint(&self, version: usize) -> bool {
        self.checkpoint_interval > 0 && version % self.checkpoint_interval == 0
    }
}
