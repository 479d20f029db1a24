//! Lock-on target selection for a player-controlled viewpoint.
//!
//! `lockon-core` picks the single best target out of a set of registered
//! candidates and their attachment sockets, scored by a weighted combination
//! of distance, angular offset, and player steering input, and maintains
//! that lock across time: a line-of-sight monitor can revoke it after a
//! timed occlusion, and the unlock policy decides whether a release
//! immediately re-runs selection.
//!
//! The crate is a pure library driven by a host update loop. World data
//! (candidate positions, projection, occlusion traces) is consumed through
//! the oracle traits in [`env`]; nothing here renders, raycasts, or reads
//! input.
pub mod config;
pub mod context;
pub mod env;
pub mod handler;
pub mod los;
pub mod observer;
pub mod registry;
pub mod score;
pub mod types;
pub mod unlock;

mod selection;

pub use config::{ConfigError, TargetingConfig};
pub use context::{EvalContext, TargetSnapshot};
pub use env::{CandidateOracle, GeometryOracle, Socket, SocketList, TargetingEnv};
pub use handler::TargetHandler;
pub use los::{LineOfSightMonitor, LosExpiry, LosState};
pub use observer::TargetingObserver;
pub use registry::CandidateRegistry;
pub use score::{
    MODIFIER_SENTINEL, TargetScorer, WeightedScorer, angle_between_2d_deg, angle_between_deg,
    effective_capture_radius, normalized_angle, normalized_distance,
};
pub use types::{CandidateId, LockState, OwnerView, PassMode, SocketId, TargetHandle};
pub use unlock::UnlockReason;
