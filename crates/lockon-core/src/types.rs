//! Identity and lock-state types shared across the crate.
//!
//! Candidates and sockets are externally owned; the engine only ever holds
//! lightweight ids and resolves them through the oracles in [`crate::env`].

use glam::{EulerRot, Quat, Vec3};

/// Stable identifier of a targetable entity, assigned by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CandidateId(pub u32);

impl CandidateId {
    /// Reserved id marking an empty probe slot. Never registered by hosts.
    pub const NONE: CandidateId = CandidateId(u32::MAX);
}

/// Stable identifier of an attachment point on a candidate.
///
/// Typically an interned socket name; the engine treats it as opaque and
/// only relies on equality and the per-candidate socket ordering reported
/// by the [`crate::env::CandidateOracle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SocketId(pub u32);

impl SocketId {
    /// Reserved id marking an empty probe slot.
    pub const NONE: SocketId = SocketId(u32::MAX);
}

/// A captured (candidate, socket) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetHandle {
    pub candidate: CandidateId,
    pub socket: SocketId,
}

impl TargetHandle {
    pub fn new(candidate: CandidateId, socket: SocketId) -> Self {
        Self { candidate, socket }
    }
}

/// Whether a target is currently captured.
///
/// Transitions only happen through [`crate::TargetHandler`]: a successful
/// find pass locks, a successful switch pass retargets, and explicit or
/// policy-driven releases unlock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LockState {
    #[default]
    Unlocked,
    Locked(TargetHandle),
}

impl LockState {
    pub fn is_locked(&self) -> bool {
        matches!(self, LockState::Locked(_))
    }

    /// Returns the captured pair, if any.
    pub fn target(&self) -> Option<TargetHandle> {
        match *self {
            LockState::Unlocked => None,
            LockState::Locked(handle) => Some(handle),
        }
    }
}

/// Which selection mode a pass runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum PassMode {
    /// No lock held; the angle term references the owner's view direction.
    Find,
    /// Lock held and the player supplied a non-trivial steering vector;
    /// angles are measured in screen space around the captured socket.
    Switch,
}

/// The owner's viewpoint for one pass: camera origin and facing.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OwnerView {
    /// World-space origin distances and traces are measured from.
    pub eye: Vec3,
    /// Normalized view direction.
    pub forward: Vec3,
}

impl OwnerView {
    pub fn new(eye: Vec3, forward: Vec3) -> Self {
        Self { eye, forward }
    }

    /// The find-mode reference direction: `forward` rotated by the configured
    /// view offset (yaw then pitch, degrees). Used to shift the effective
    /// screen center for the finding angle term.
    pub fn reference_forward(&self, yaw_offset_deg: f32, pitch_offset_deg: f32) -> Vec3 {
        if yaw_offset_deg == 0.0 && pitch_offset_deg == 0.0 {
            return self.forward;
        }

        let offset = Quat::from_euler(
            EulerRot::YXZ,
            yaw_offset_deg.to_radians(),
            pitch_offset_deg.to_radians(),
            0.0,
        );
        offset * self.forward
    }
}
