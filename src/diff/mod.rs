// Character-level diff/patch engine.
//
// This module is the leaf of the crate: it knows nothing about versions or
// persistence, only how to turn two strings into an edit script and back.
//
// # Modules
//
// - `op`    — EditOp / Delta types and per-delta statistics
// - `myers` — Myers O(ND) shortest edit script (compute_delta)
// - `patch` — Delta replay with strict input accounting (apply_delta)

pub mod myers;
pub mod op;
pub mod patch;

// Re-export key types for convenience.
pub use myers::compute_delta;
pub use op::{Delta, DeltaStats, EditOp};
pub use patch::{PatchError, apply_delta};
