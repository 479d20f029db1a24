//! Observation hooks for external diagnostics and host reactions.

use crate::context::TargetSnapshot;
use crate::types::TargetHandle;
use crate::unlock::UnlockReason;

/// Read-only notifications fired by the [`crate::TargetHandler`].
///
/// All methods default to no-ops; implement only what you need. Observers
/// run on the single driving thread and must not call back into the handler
/// (passes are single-flight; a re-entrant find would be coalesced away).
pub trait TargetingObserver {
    /// Fired once per scored pair, after `compute_modifier` and before the
    /// post-check. Diagnostics only; the snapshot is already a copy.
    fn on_modifier_calculated(&self, probe: &TargetSnapshot, modifier: f32) {
        let _ = (probe, modifier);
    }

    /// Fired when a pass commits a new lock (both fresh locks and switches).
    fn on_target_locked(&self, target: TargetHandle) {
        let _ = target;
    }

    /// Fired on any release, whatever the reason.
    fn on_target_unlocked(&self, target: TargetHandle, reason: UnlockReason) {
        let _ = (target, reason);
    }
}
