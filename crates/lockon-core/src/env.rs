//! Traits describing the host-provided world.
//!
//! The engine never owns candidates or geometry. Oracles resolve candidate
//! ids to world data and provide projection/obstruction queries; the
//! [`TargetingEnv`] aggregate bundles them so the selection loop can access
//! everything it needs without hard coupling to concrete implementations.

use arrayvec::ArrayVec;
use glam::{Vec2, Vec3};

use crate::config::TargetingConfig;
use crate::types::{CandidateId, SocketId};

/// An attachment point resolved for the current frame.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Socket {
    pub id: SocketId,
    pub position: Vec3,
}

/// Per-candidate socket list, in the candidate's declared order.
pub type SocketList = ArrayVec<Socket, { TargetingConfig::MAX_SOCKETS }>;

/// Read-only access to candidate data owned by the host.
///
/// Every method takes a [`CandidateId`]; returning `None` (or an empty
/// socket list) means the candidate no longer resolves, which the engine
/// treats as ineligibility or invalidation, never as an error.
pub trait CandidateOracle {
    /// The candidate's root world position, used for eligibility gating.
    fn world_position(&self, candidate: CandidateId) -> Option<Vec3>;

    /// The candidate's sockets with current world positions.
    fn sockets(&self, candidate: CandidateId) -> SocketList;

    /// Resolves one socket's world position.
    fn socket_position(&self, candidate: CandidateId, socket: SocketId) -> Option<Vec3> {
        self.sockets(candidate)
            .iter()
            .find(|entry| entry.id == socket)
            .map(|entry| entry.position)
    }

    /// Base capture radius. Scaled by
    /// [`TargetingConfig::capture_radius_scale`] before use.
    fn capture_radius(&self, candidate: CandidateId) -> f32;

    /// Extra distance beyond the effective capture radius the candidate may
    /// retreat to before the lock counts as lost.
    fn lost_offset_radius(&self, candidate: CandidateId) -> f32 {
        let _ = candidate;
        0.0
    }

    /// Overridable per-candidate veto. Returning false skips the candidate
    /// during selection and, while locked, releases it with
    /// [`crate::UnlockReason::CAPTURE_REFUSED`].
    fn can_be_captured(&self, candidate: CandidateId) -> bool {
        let _ = candidate;
        true
    }
}

/// Projection and occlusion queries backed by the host's camera and physics.
pub trait GeometryOracle {
    /// Projects a world point to viewport coordinates. `None` means the
    /// projection is invalid (behind the camera, degenerate view); callers
    /// treat affected checks as failed rather than propagating.
    fn project_to_screen(&self, world: Vec3) -> Option<Vec2>;

    /// Current viewport extents in the same units as projected positions.
    fn viewport_size(&self) -> Vec2;

    /// Whether the segment between two world points is obstructed.
    /// `exclude` lists candidates whose own geometry must be ignored; the
    /// host is expected to also ignore the owner's geometry.
    fn is_obstructed(&self, from: Vec3, to: Vec3, exclude: &[CandidateId]) -> bool;
}

/// Borrow-only aggregate of the oracles required for one pass or probe.
#[derive(Clone, Copy)]
pub struct TargetingEnv<'a> {
    candidates: &'a dyn CandidateOracle,
    geometry: &'a dyn GeometryOracle,
}

impl<'a> TargetingEnv<'a> {
    pub fn new(candidates: &'a dyn CandidateOracle, geometry: &'a dyn GeometryOracle) -> Self {
        Self {
            candidates,
            geometry,
        }
    }

    pub fn candidates(&self) -> &'a dyn CandidateOracle {
        self.candidates
    }

    pub fn geometry(&self) -> &'a dyn GeometryOracle {
        self.geometry
    }

    /// Whether a projected position lies inside the viewport narrowed by
    /// `inset` percent per side. A zero-sized viewport fails the check.
    pub fn is_on_screen(&self, screen: Vec2, inset: Vec2) -> bool {
        let viewport = self.geometry().viewport_size();
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return false;
        }

        let margin = viewport * inset / 100.0;
        screen.x >= margin.x
            && screen.x <= viewport.x - margin.x
            && screen.y >= margin.y
            && screen.y <= viewport.y - margin.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedViewport;

    impl GeometryOracle for FixedViewport {
        fn project_to_screen(&self, _world: Vec3) -> Option<Vec2> {
            None
        }

        fn viewport_size(&self) -> Vec2 {
            Vec2::new(1920.0, 1080.0)
        }

        fn is_obstructed(&self, _from: Vec3, _to: Vec3, _exclude: &[CandidateId]) -> bool {
            false
        }
    }

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

    #[test]
    fn screen_inset_narrows_from_both_sides() {
        let candidates = NoCandidates;
        let geometry = FixedViewport;
        let env = TargetingEnv::new(&candidates, &geometry);
        let inset = Vec2::new(10.0, 10.0);

        assert!(env.is_on_screen(Vec2::new(960.0, 540.0), inset));
        // 10% of 1920 = 192; anything left of that is outside.
        assert!(!env.is_on_screen(Vec2::new(150.0, 540.0), inset));
        assert!(!env.is_on_screen(Vec2::new(1800.0, 540.0), inset));
        assert!(!env.is_on_screen(Vec2::new(960.0, 1000.0), inset));
        // Zero inset accepts the full viewport.
        assert!(env.is_on_screen(Vec2::new(0.0, 0.0), Vec2::ZERO));
    }
}
