//! Per-pass evaluation context.
//!
//! One [`EvalContext`] is built per selection pass and discarded at the end;
//! it carries no identity beyond that pass. The probe slot is reused across
//! loop iterations through [`EvalContext::load_probe`], which overwrites
//! every field of the slot so no state leaks between iterations.

use glam::{Vec2, Vec3};

use crate::env::{Socket, TargetingEnv};
use crate::types::{CandidateId, OwnerView, PassMode, SocketId, TargetHandle};

/// Cached state of one (candidate, socket) pair: world position plus the
/// projected screen position when available. An invalid projection is
/// `None`, never a stale value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetSnapshot {
    pub candidate: CandidateId,
    pub socket: SocketId,
    pub world_position: Vec3,
    pub screen_position: Option<Vec2>,
}

impl TargetSnapshot {
    /// An empty slot. Uses the reserved ids so it can never alias a real
    /// registered pair.
    pub const fn cleared() -> Self {
        Self {
            candidate: CandidateId::NONE,
            socket: SocketId::NONE,
            world_position: Vec3::ZERO,
            screen_position: None,
        }
    }

    pub fn handle(&self) -> TargetHandle {
        TargetHandle::new(self.candidate, self.socket)
    }
}

/// Transient state shared by every scoring call within one pass.
#[derive(Clone, Debug)]
pub struct EvalContext {
    /// Find or Switch; fixed for the whole pass.
    pub mode: PassMode,
    /// The owner's viewpoint.
    pub view: OwnerView,
    /// Raw player steering input. Meaningful only while switching.
    pub input: Vec2,
    /// The currently captured socket, populated only while switching.
    pub current: TargetSnapshot,
    /// The pair under evaluation. Overwritten whole by [`Self::load_probe`].
    pub probe: TargetSnapshot,
}

impl EvalContext {
    /// Context for a find pass (no lock held).
    pub fn finding(view: OwnerView) -> Self {
        Self {
            mode: PassMode::Find,
            view,
            input: Vec2::ZERO,
            current: TargetSnapshot::cleared(),
            probe: TargetSnapshot::cleared(),
        }
    }

    /// Context for a switch pass. Projects the captured socket once so every
    /// iteration measures screen-space offsets against the same origin.
    pub fn switching(
        view: OwnerView,
        input: Vec2,
        current: TargetHandle,
        current_position: Vec3,
        env: &TargetingEnv<'_>,
    ) -> Self {
        let current = TargetSnapshot {
            candidate: current.candidate,
            socket: current.socket,
            world_position: current_position,
            screen_position: env.geometry().project_to_screen(current_position),
        };

        Self {
            mode: PassMode::Switch,
            view,
            input,
            current,
            probe: TargetSnapshot::cleared(),
        }
    }

    pub fn is_switching(&self) -> bool {
        self.mode == PassMode::Switch
    }

    /// Loads a pair into the probe slot, replacing every field.
    ///
    /// The screen position is projected only while switching; find-mode
    /// eligibility already handled screen-space gating at candidate level
    /// and the finding angle term works in world space.
    pub fn load_probe(&mut self, env: &TargetingEnv<'_>, candidate: CandidateId, socket: Socket) {
        self.probe = TargetSnapshot {
            candidate,
            socket: socket.id,
            world_position: socket.position,
            screen_position: if self.is_switching() {
                env.geometry().project_to_screen(socket.position)
            } else {
                None
            },
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{CandidateOracle, GeometryOracle, SocketList};

    struct NoCandidates;

    impl CandidateOracle for NoCandidates {
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

    struct TopDownProjection;

    impl GeometryOracle for TopDownProjection {
        fn project_to_screen(&self, world: Vec3) -> Option<Vec2> {
            Some(Vec2::new(world.x, world.z))
        }

        fn viewport_size(&self) -> Vec2 {
            Vec2::new(100.0, 100.0)
        }

        fn is_obstructed(&self, _from: Vec3, _to: Vec3, _exclude: &[CandidateId]) -> bool {
            false
        }
    }

    #[test]
    fn load_probe_replaces_previous_slot_entirely() {
        let candidates = NoCandidates;
        let geometry = TopDownProjection;
        let env = TargetingEnv::new(&candidates, &geometry);

        let view = OwnerView::new(Vec3::ZERO, Vec3::Z);
        let mut ctx = EvalContext::switching(
            view,
            Vec2::X,
            TargetHandle::new(CandidateId(1), SocketId(0)),
            Vec3::new(10.0, 0.0, 10.0),
            &env,
        );

        ctx.load_probe(
            &env,
            CandidateId(2),
            Socket {
                id: SocketId(4),
                position: Vec3::new(3.0, 0.0, 7.0),
            },
        );
        assert_eq!(ctx.probe.candidate, CandidateId(2));
        assert_eq!(ctx.probe.screen_position, Some(Vec2::new(3.0, 7.0)));

        ctx.load_probe(
            &env,
            CandidateId(5),
            Socket {
                id: SocketId(0),
                position: Vec3::ZERO,
            },
        );
        assert_eq!(ctx.probe.candidate, CandidateId(5));
        assert_eq!(ctx.probe.socket, SocketId(0));
        assert_eq!(ctx.probe.world_position, Vec3::ZERO);
        assert_eq!(ctx.probe.screen_position, Some(Vec2::ZERO));
    }

    #[test]
    fn find_mode_skips_probe_projection() {
        let candidates = NoCandidates;
        let geometry = TopDownProjection;
        let env = TargetingEnv::new(&candidates, &geometry);

        let mut ctx = EvalContext::finding(OwnerView::new(Vec3::ZERO, Vec3::Z));
        ctx.load_probe(
            &env,
            CandidateId(2),
            Socket {
                id: SocketId(1),
                position: Vec3::ONE,
            },
        );
        assert_eq!(ctx.probe.screen_position, None);
    }
}
