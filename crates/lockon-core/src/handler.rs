//! The lock-on orchestrator.
//!
//! [`TargetHandler`] owns the candidate registry, the lock state, the
//! scoring strategy, and the line-of-sight monitor, and wires them together
//! per the host's update loop. All mutation happens on that single logical
//! thread; selection passes are synchronous and single-flight per handler.

use std::time::Duration;

use glam::Vec2;
use tracing::{debug, trace, warn};

use crate::config::{ConfigError, TargetingConfig};
use crate::context::EvalContext;
use crate::env::TargetingEnv;
use crate::los::{LineOfSightMonitor, LosExpiry};
use crate::observer::TargetingObserver;
use crate::registry::CandidateRegistry;
use crate::score::{TargetScorer, WeightedScorer, effective_capture_radius};
use crate::selection::run_pass;
use crate::types::{CandidateId, LockState, OwnerView, SocketId, TargetHandle};
use crate::unlock::UnlockReason;

/// Selects, captures, and maintains a lock on the best target.
///
/// One handler serves one owner (one player viewpoint). Hosts drive it with:
/// - candidate lifecycle calls (`register_candidate`, `unregister_candidate`,
///   `on_socket_removed`),
/// - `find_target` on lock/switch input,
/// - `update_line_of_sight` on a periodic cadence while locked,
/// - `can_continue_targeting` whenever structural validity matters.
pub struct TargetHandler {
    config: TargetingConfig,
    registry: CandidateRegistry,
    scorer: Box<dyn TargetScorer>,
    monitor: LineOfSightMonitor,
    observers: Vec<Box<dyn TargetingObserver>>,
    lock: LockState,
    /// Generation of the monitor watch armed for the current lock.
    watch_generation: u64,
    pass_active: bool,
}

impl TargetHandler {
    /// Creates a handler with the default weighted scorer.
    ///
    /// # Errors
    ///
    /// Returns the first configuration invariant violation; a handler is
    /// never constructed from an invalid config.
    pub fn new(config: TargetingConfig) -> Result<Self, ConfigError> {
        Self::with_scorer(config, Box::new(WeightedScorer))
    }

    /// Creates a handler with a custom scoring strategy.
    ///
    /// # Errors
    ///
    /// Same as [`TargetHandler::new`].
    pub fn with_scorer(
        config: TargetingConfig,
        scorer: Box<dyn TargetScorer>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            registry: CandidateRegistry::new(),
            scorer,
            monitor: LineOfSightMonitor::new(),
            observers: Vec::new(),
            lock: LockState::Unlocked,
            watch_generation: 0,
            pass_active: false,
        })
    }

    pub fn config(&self) -> &TargetingConfig {
        &self.config
    }

    /// Replaces the config between passes.
    ///
    /// # Errors
    ///
    /// Rejects invalid configs, leaving the current one untouched.
    pub fn set_config(&mut self, config: TargetingConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn lock_state(&self) -> LockState {
        self.lock
    }

    pub fn locked_target(&self) -> Option<TargetHandle> {
        self.lock.target()
    }

    pub fn candidate_count(&self) -> usize {
        self.registry.len()
    }

    pub fn add_observer(&mut self, observer: Box<dyn TargetingObserver>) {
        self.observers.push(observer);
    }

    // ========================================================================
    // Candidate lifecycle
    // ========================================================================

    /// Marks a candidate targetable. Returns true only if newly added.
    pub fn register_candidate(&mut self, candidate: CandidateId) -> bool {
        self.registry.register(candidate)
    }

    /// Marks a candidate no longer targetable. If it was the captured one,
    /// the lock is released with `TARGET_INVALIDATED` (and the auto-find
    /// mask may immediately start a find pass, which no longer sees it).
    pub fn unregister_candidate(
        &mut self,
        env: &TargetingEnv<'_>,
        view: OwnerView,
        candidate: CandidateId,
    ) -> bool {
        let removed = self.registry.unregister(candidate);
        if removed
            && self
                .lock
                .target()
                .is_some_and(|target| target.candidate == candidate)
        {
            self.clear_target(env, view, UnlockReason::TARGET_INVALIDATED);
        }
        removed
    }

    /// Host notification that a socket was removed from a candidate.
    /// Releases the lock with `SOCKET_REMOVED` if that socket was captured.
    pub fn on_socket_removed(
        &mut self,
        env: &TargetingEnv<'_>,
        view: OwnerView,
        candidate: CandidateId,
        socket: SocketId,
    ) {
        if self.lock.target() == Some(TargetHandle::new(candidate, socket)) {
            self.clear_target(env, view, UnlockReason::SOCKET_REMOVED);
        }
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Runs one selection pass and commits the result.
    ///
    /// Unlocked: a find pass; a hit locks it. Locked: a switch pass steered
    /// by `input`; input below the deadzone means no switch intent and the
    /// pass is skipped. Either way, `None` with a lock held keeps the lock.
    ///
    /// Passes are single-flight: a pass triggered while another one runs for
    /// this handler is coalesced into nothing rather than interleaved.
    pub fn find_target(
        &mut self,
        env: &TargetingEnv<'_>,
        view: OwnerView,
        input: Vec2,
    ) -> Option<TargetHandle> {
        if self.pass_active {
            warn!("selection pass already in progress, coalescing trigger");
            return None;
        }

        let mut ctx = match self.lock {
            LockState::Unlocked => EvalContext::finding(view),
            LockState::Locked(current) => {
                if input.length_squared() <= TargetingConfig::INPUT_DEADZONE_SQUARED {
                    trace!("locked with no steering intent, pass skipped");
                    return None;
                }
                let Some(anchor) = env
                    .candidates()
                    .socket_position(current.candidate, current.socket)
                else {
                    // The captured socket no longer resolves; structural
                    // invalidation is can_continue_targeting's job.
                    trace!(?current, "captured socket unresolvable, switch skipped");
                    return None;
                };
                EvalContext::switching(view, input, current, anchor, env)
            }
        };

        self.pass_active = true;
        let result = run_pass(
            &self.registry,
            self.scorer.as_ref(),
            &self.observers,
            env,
            &self.config,
            &mut ctx,
        );
        self.pass_active = false;

        if let Some(target) = result {
            self.commit_lock(target);
        }
        result
    }

    /// Releases the current lock explicitly. Never auto-finds.
    pub fn release_target(&mut self) {
        self.release_lock(UnlockReason::empty());
    }

    /// True while the lock is structurally sound: candidate registered and
    /// resolvable, socket present, capture not refused, within the lost
    /// distance. On failure the lock is released with the specific reason
    /// and the auto-find policy applies.
    pub fn can_continue_targeting(&mut self, env: &TargetingEnv<'_>, view: OwnerView) -> bool {
        let LockState::Locked(target) = self.lock else {
            return false;
        };

        match self.continuation_failure(env, view, target) {
            None => true,
            Some(reason) => {
                self.clear_target(env, view, reason);
                false
            }
        }
    }

    fn continuation_failure(
        &self,
        env: &TargetingEnv<'_>,
        view: OwnerView,
        target: TargetHandle,
    ) -> Option<UnlockReason> {
        if !self.registry.contains(target.candidate) {
            return Some(UnlockReason::TARGET_INVALIDATED);
        }
        let Some(root_position) = env.candidates().world_position(target.candidate) else {
            return Some(UnlockReason::TARGET_INVALIDATED);
        };
        if env
            .candidates()
            .socket_position(target.candidate, target.socket)
            .is_none()
        {
            return Some(UnlockReason::SOCKET_REMOVED);
        }
        if !env.candidates().can_be_captured(target.candidate) {
            return Some(UnlockReason::CAPTURE_REFUSED);
        }

        let lost_distance = effective_capture_radius(
            env.candidates().capture_radius(target.candidate),
            self.config.capture_radius_scale,
        ) + env.candidates().lost_offset_radius(target.candidate);
        if root_position.distance(view.eye) > lost_distance {
            return Some(UnlockReason::OUT_OF_LOST_DISTANCE);
        }

        None
    }

    // ========================================================================
    // Line of sight
    // ========================================================================

    /// Feeds one periodic visibility probe for the captured socket at time
    /// `now` (host-supplied monotonic clock). On timer expiry the lock is
    /// released with `LINE_OF_SIGHT_FAIL` under the auto-find policy.
    ///
    /// No-op while unlocked or when regular tracing is disabled.
    pub fn update_line_of_sight(&mut self, env: &TargetingEnv<'_>, view: OwnerView, now: Duration) {
        let LockState::Locked(target) = self.lock else {
            return;
        };
        if !self.monitor.is_tracking() {
            return;
        }
        let Some(socket_position) = env
            .candidates()
            .socket_position(target.candidate, target.socket)
        else {
            return;
        };

        let exclude = [target.candidate];
        let obstructed = env
            .geometry()
            .is_obstructed(view.eye, socket_position, &exclude);

        if let Some(expiry) = self
            .monitor
            .probe(target, obstructed, now, self.config.lost_target_delay)
        {
            // Identity check at fire time: an expiry armed for a watch that
            // is no longer current must not release anything.
            if self.expiry_is_current(&expiry) {
                self.clear_target(env, view, UnlockReason::LINE_OF_SIGHT_FAIL);
            }
        }
    }

    /// Whether an expiry belongs to the watch armed for the current lock.
    /// Rejects both a foreign handle and a handle that was re-locked after
    /// the expiry's watch was armed.
    fn expiry_is_current(&self, expiry: &LosExpiry) -> bool {
        expiry.generation == self.watch_generation && self.lock.target() == Some(expiry.target)
    }

    // ========================================================================
    // Lock transitions
    // ========================================================================

    fn commit_lock(&mut self, target: TargetHandle) {
        self.lock = LockState::Locked(target);
        if self.config.traces_regularly() {
            self.monitor.begin(target);
        } else {
            self.monitor.cancel();
        }
        self.watch_generation = self.monitor.generation();

        debug!(?target, "target locked");
        for observer in &self.observers {
            observer.on_target_locked(target);
        }
    }

    /// Releases and applies the auto-find policy for `reason`.
    fn clear_target(&mut self, env: &TargetingEnv<'_>, view: OwnerView, reason: UnlockReason) {
        if !self.release_lock(reason) {
            return;
        }
        if self.config.auto_find_flags.intersects(reason) {
            self.find_target(env, view, Vec2::ZERO);
        }
    }

    /// Drops the lock and notifies observers. Returns false if already
    /// unlocked: a released lock cannot be released twice, which also
    /// short-circuits further reasons raised in the same update.
    fn release_lock(&mut self, reason: UnlockReason) -> bool {
        let LockState::Locked(target) = self.lock else {
            return false;
        };

        self.monitor.cancel();
        self.lock = LockState::Unlocked;

        debug!(?target, ?reason, "target unlocked");
        for observer in &self.observers {
            observer.on_target_unlocked(target, reason);
        }
        true
    }
}

impl std::fmt::Debug for TargetHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetHandler")
            .field("lock", &self.lock)
            .field("candidates", &self.registry.len())
            .field("los", &self.monitor.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use super::*;
    use crate::env::{CandidateOracle, GeometryOracle, Socket, SocketList};

    struct EmptyWorld;

    impl CandidateOracle for EmptyWorld {
        fn world_position(&self, _candidate: CandidateId) -> Option<Vec3> {
            None
        }

        fn sockets(&self, _candidate: CandidateId) -> SocketList {
            SocketList::new()
        }

        fn capture_radius(&self, _candidate: CandidateId) -> f32 {
            0.0
        }
    }

    impl GeometryOracle for EmptyWorld {
        fn project_to_screen(&self, _world: Vec3) -> Option<Vec2> {
            None
        }

        fn viewport_size(&self) -> Vec2 {
            Vec2::ZERO
        }

        fn is_obstructed(&self, _from: Vec3, _to: Vec3, _exclude: &[CandidateId]) -> bool {
            false
        }
    }

    struct OneTarget {
        position: Vec3,
    }

    impl CandidateOracle for OneTarget {
        fn world_position(&self, _candidate: CandidateId) -> Option<Vec3> {
            Some(self.position)
        }

        fn sockets(&self, _candidate: CandidateId) -> SocketList {
            let mut sockets = SocketList::new();
            sockets.push(Socket {
                id: SocketId(0),
                position: self.position,
            });
            sockets
        }

        fn capture_radius(&self, _candidate: CandidateId) -> f32 {
            1000.0
        }
    }

    impl GeometryOracle for OneTarget {
        fn project_to_screen(&self, world: Vec3) -> Option<Vec2> {
            Some(Vec2::new(world.x + 500.0, world.z + 500.0))
        }

        fn viewport_size(&self) -> Vec2 {
            Vec2::new(1000.0, 1000.0)
        }

        fn is_obstructed(&self, _from: Vec3, _to: Vec3, _exclude: &[CandidateId]) -> bool {
            false
        }
    }

    fn view() -> OwnerView {
        OwnerView::new(Vec3::ZERO, Vec3::Z)
    }

    #[test]
    fn invalid_config_fails_construction() {
        let mut config = TargetingConfig::new();
        config.distance_weight = 2.0;
        assert!(TargetHandler::new(config).is_err());
    }

    #[test]
    fn set_config_rejects_without_clobbering() {
        let mut handler = TargetHandler::new(TargetingConfig::new()).unwrap();
        let mut bad = TargetingConfig::new();
        bad.capture_angle_deg = 500.0;
        assert!(handler.set_config(bad).is_err());
        assert_eq!(handler.config().capture_angle_deg, 35.0);
    }

    #[test]
    fn coalesces_re_entrant_pass() {
        let world = OneTarget {
            position: Vec3::new(0.0, 0.0, 100.0),
        };
        let env = TargetingEnv::new(&world, &world);
        let mut handler = TargetHandler::new(TargetingConfig::new()).unwrap();
        handler.register_candidate(CandidateId(1));

        handler.pass_active = true;
        assert_eq!(handler.find_target(&env, view(), Vec2::ZERO), None);
        assert_eq!(handler.lock_state(), LockState::Unlocked);

        handler.pass_active = false;
        assert!(handler.find_target(&env, view(), Vec2::ZERO).is_some());
    }

    #[test]
    fn unregistering_the_captured_candidate_releases() {
        let world = OneTarget {
            position: Vec3::new(0.0, 0.0, 100.0),
        };
        let env = TargetingEnv::new(&world, &world);
        let mut handler = TargetHandler::new(TargetingConfig::new()).unwrap();
        handler.register_candidate(CandidateId(1));

        let locked = handler.find_target(&env, view(), Vec2::ZERO);
        assert_eq!(locked.map(|t| t.candidate), Some(CandidateId(1)));

        assert!(handler.unregister_candidate(&env, view(), CandidateId(1)));
        assert_eq!(handler.lock_state(), LockState::Unlocked);
        assert_eq!(handler.candidate_count(), 0);
    }

    #[test]
    fn empty_world_finds_nothing_without_error() {
        let world = EmptyWorld;
        let env = TargetingEnv::new(&world, &world);
        let mut handler = TargetHandler::new(TargetingConfig::new()).unwrap();
        handler.register_candidate(CandidateId(1));

        assert_eq!(handler.find_target(&env, view(), Vec2::ZERO), None);
        assert!(!handler.can_continue_targeting(&env, view()));
    }

    #[test]
    fn expiry_from_an_earlier_watch_does_not_match_a_relock() {
        let world = OneTarget {
            position: Vec3::new(0.0, 0.0, 100.0),
        };
        let env = TargetingEnv::new(&world, &world);
        let mut handler = TargetHandler::new(TargetingConfig::new()).unwrap();
        handler.register_candidate(CandidateId(1));

        let target = handler.find_target(&env, view(), Vec2::ZERO).unwrap();
        let armed = LosExpiry {
            target,
            generation: handler.monitor.generation(),
        };
        assert!(handler.expiry_is_current(&armed));

        // Release and re-lock the exact same handle: the old watch's expiry
        // must be rejected even though the handle matches again.
        handler.release_target();
        assert!(!handler.expiry_is_current(&armed));
        assert_eq!(handler.find_target(&env, view(), Vec2::ZERO), Some(target));
        assert!(!handler.expiry_is_current(&armed));
    }

    #[test]
    fn explicit_release_is_idempotent() {
        let world = OneTarget {
            position: Vec3::new(0.0, 0.0, 100.0),
        };
        let env = TargetingEnv::new(&world, &world);
        let mut handler = TargetHandler::new(TargetingConfig::new()).unwrap();
        handler.register_candidate(CandidateId(1));
        handler.find_target(&env, view(), Vec2::ZERO);

        handler.release_target();
        assert_eq!(handler.lock_state(), LockState::Unlocked);
        // Second release: no double-unlock, no panic, still unlocked.
        handler.release_target();
        assert_eq!(handler.lock_state(), LockState::Unlocked);
    }
}
