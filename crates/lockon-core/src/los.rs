//! Line-of-sight tracking for the captured socket.
//!
//! The monitor is a small state machine fed by a periodic obstruction probe
//! on the host's driving loop. Losing sight starts a one-shot grace timer;
//! regaining sight cancels it; expiration raises the unlock signal. There is
//! no background thread: "the timer" is a deadline checked against the
//! host-supplied clock, and a generation counter makes expirations for a
//! stale lock detectable no-ops.

use std::time::Duration;

use crate::types::TargetHandle;

/// Visibility tracking state for the captured socket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum LosState {
    /// Nothing is tracked: no lock, or regular tracing is disabled.
    NotTracking,
    /// The captured socket was visible at the last probe.
    Visible,
    /// The socket is occluded; the lock is lost once `deadline` passes.
    Occluded { deadline: Duration },
}

/// Raised when the occlusion timer expires.
///
/// Carries the identity the timer was armed for so a consumer can reject
/// expirations that outlived their lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LosExpiry {
    pub target: TargetHandle,
    pub generation: u64,
}

/// Tracks visibility of the currently captured socket.
#[derive(Clone, Debug)]
pub struct LineOfSightMonitor {
    state: LosState,
    watched: Option<TargetHandle>,
    generation: u64,
}

impl LineOfSightMonitor {
    pub fn new() -> Self {
        Self {
            state: LosState::NotTracking,
            watched: None,
            generation: 0,
        }
    }

    pub fn state(&self) -> LosState {
        self.state
    }

    pub fn is_tracking(&self) -> bool {
        self.state != LosState::NotTracking
    }

    /// The generation of the currently armed watch. Incremented on every
    /// begin/cancel, so an expiry from an earlier watch never matches.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts tracking a freshly captured socket as visible. Any pending
    /// timer for a previous lock is implicitly cancelled.
    pub fn begin(&mut self, target: TargetHandle) {
        self.generation += 1;
        self.watched = Some(target);
        self.state = LosState::Visible;
    }

    /// Stops tracking and cancels a pending timer. Called on lock release,
    /// lock switch, visibility restore (internally), and teardown.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.watched = None;
        self.state = LosState::NotTracking;
    }

    /// Feeds one visibility probe for `target` at time `now`.
    ///
    /// Probes for anything other than the watched target are stale no-ops.
    /// While occluded the running timer is left untouched (no restart);
    /// visibility restored cancels it and returns to `Visible`. Returns the
    /// expiry signal when the timer ran out while still occluded.
    pub fn probe(
        &mut self,
        target: TargetHandle,
        obstructed: bool,
        now: Duration,
        delay: Duration,
    ) -> Option<LosExpiry> {
        if self.watched != Some(target) {
            return None;
        }

        match self.state {
            LosState::NotTracking => None,
            LosState::Visible => {
                if obstructed {
                    self.state = LosState::Occluded {
                        deadline: now + delay,
                    };
                }
                None
            }
            LosState::Occluded { deadline } => {
                if !obstructed {
                    self.state = LosState::Visible;
                    return None;
                }
                if now >= deadline {
                    let generation = self.generation;
                    self.cancel();
                    return Some(LosExpiry { target, generation });
                }
                None
            }
        }
    }
}

impl Default for LineOfSightMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CandidateId, SocketId};

    const DELAY: Duration = Duration::from_secs(2);

    fn target() -> TargetHandle {
        TargetHandle::new(CandidateId(1), SocketId(0))
    }

    fn secs(value: u64) -> Duration {
        Duration::from_secs(value)
    }

    #[test]
    fn occlusion_for_exactly_the_delay_expires() {
        let mut monitor = LineOfSightMonitor::new();
        monitor.begin(target());

        assert_eq!(monitor.probe(target(), true, secs(1), DELAY), None);
        // Just before the deadline: still pending.
        assert_eq!(
            monitor.probe(target(), true, Duration::from_millis(2999), DELAY),
            None
        );
        // At the deadline: fires, and tracking stops.
        let expiry = monitor.probe(target(), true, secs(3), DELAY);
        assert!(expiry.is_some_and(|e| e.target == target()));
        assert_eq!(monitor.state(), LosState::NotTracking);
    }

    #[test]
    fn visibility_restored_cancels_the_timer() {
        let mut monitor = LineOfSightMonitor::new();
        monitor.begin(target());

        assert_eq!(monitor.probe(target(), true, secs(1), DELAY), None);
        assert_eq!(monitor.probe(target(), false, secs(2), DELAY), None);
        assert_eq!(monitor.state(), LosState::Visible);

        // A later occlusion runs a fresh timer; no leftover deadline from
        // the first one can fire early.
        assert_eq!(monitor.probe(target(), true, secs(10), DELAY), None);
        assert_eq!(monitor.probe(target(), true, secs(11), DELAY), None);
        assert!(monitor.probe(target(), true, secs(12), DELAY).is_some());
    }

    #[test]
    fn repeated_occlusion_does_not_restart_the_timer() {
        let mut monitor = LineOfSightMonitor::new();
        monitor.begin(target());

        monitor.probe(target(), true, secs(1), DELAY);
        // Still obstructed at t=2: the original t=3 deadline must hold.
        monitor.probe(target(), true, secs(2), DELAY);
        assert!(monitor.probe(target(), true, secs(3), DELAY).is_some());
    }

    #[test]
    fn stale_probe_is_a_no_op() {
        let mut monitor = LineOfSightMonitor::new();
        monitor.begin(target());
        monitor.probe(target(), true, secs(1), DELAY);

        let other = TargetHandle::new(CandidateId(9), SocketId(2));
        assert_eq!(monitor.probe(other, true, secs(30), DELAY), None);
        assert!(matches!(monitor.state(), LosState::Occluded { .. }));
    }

    #[test]
    fn cancel_bumps_generation_and_stops_tracking() {
        let mut monitor = LineOfSightMonitor::new();
        monitor.begin(target());
        let armed = monitor.generation();
        monitor.probe(target(), true, secs(1), DELAY);

        monitor.cancel();
        assert_eq!(monitor.state(), LosState::NotTracking);
        assert!(monitor.generation() > armed);
        // Probes after teardown do nothing, even past the old deadline.
        assert_eq!(monitor.probe(target(), true, secs(60), DELAY), None);
    }

    #[test]
    fn retarget_supersedes_previous_watch() {
        let mut monitor = LineOfSightMonitor::new();
        monitor.begin(target());
        monitor.probe(target(), true, secs(1), DELAY);

        let next = TargetHandle::new(CandidateId(2), SocketId(1));
        monitor.begin(next);
        assert_eq!(monitor.state(), LosState::Visible);
        // The old target's pending deadline died with the retarget.
        assert_eq!(monitor.probe(target(), true, secs(10), DELAY), None);
        assert_eq!(monitor.probe(next, true, secs(10), DELAY), None);
    }
}
