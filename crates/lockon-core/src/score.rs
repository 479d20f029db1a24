//! Modifier computation for (candidate, socket) pairs.
//!
//! The best pair has the least modifier. Scoring follows an explicit
//! three-step contract so the expensive step runs as rarely as possible:
//!
//! - `candidate_check`: per-candidate eligibility gate (capture radius,
//!   screen rectangle or capture cone). Failing skips every socket.
//! - `pre_check`: cheap per-socket predicate (captured-socket exclusion,
//!   switch angle window). Failing skips the socket without a modifier.
//! - `compute_modifier`: the weighted sum of the distance, angle, and
//!   player-input terms.
//! - `post_check`: expensive predicate (line of sight), only evaluated for
//!   a socket that beat the best modifier found so far.
//!
//! All normalization curves are exposed as documented pure functions so
//! hosts can reason about (and test) the exact numbers.

use glam::{Vec2, Vec3};

use crate::config::TargetingConfig;
use crate::context::EvalContext;
use crate::env::TargetingEnv;
use crate::types::{CandidateId, PassMode};

/// Initial best-modifier value; worse than any finite score. A pair is never
/// selected unless its modifier is strictly less than the best so far, so
/// the first eligible pair always wins over the sentinel.
pub const MODIFIER_SENTINEL: f32 = f32::MAX;

// ============================================================================
// Pure scoring functions
// ============================================================================

/// Unsigned angle between two world-space directions, in degrees.
/// Zero-length inputs yield 0.
pub fn angle_between_deg(a: Vec3, b: Vec3) -> f32 {
    let denom = (a.length_squared() * b.length_squared()).sqrt();
    if denom <= f32::EPSILON {
        return 0.0;
    }
    let cos = (a.dot(b) / denom).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Unsigned angle between two screen-space directions, in degrees.
/// Zero-length inputs yield 0.
pub fn angle_between_2d_deg(a: Vec2, b: Vec2) -> f32 {
    let denom = (a.length_squared() * b.length_squared()).sqrt();
    if denom <= f32::EPSILON {
        return 0.0;
    }
    let cos = (a.dot(b) / denom).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Linear angle normalization: degrees mapped onto [0, 1] over the half
/// circle. 0° → 0, 180° → 1.
pub fn normalized_angle(angle_deg: f32) -> f32 {
    (angle_deg / 180.0).clamp(0.0, 1.0)
}

/// Distance normalized by the candidate's effective capture radius, so the
/// term reads as "how deep into the capture range" the socket sits: 0 at the
/// eye, 1 at the capture boundary.
pub fn normalized_distance(distance: f32, effective_radius: f32) -> f32 {
    distance / effective_radius.max(f32::EPSILON)
}

/// Capture radius after the runtime scale multiplier.
pub fn effective_capture_radius(base_radius: f32, scale: f32) -> f32 {
    base_radius * scale
}

// ============================================================================
// Scorer strategy
// ============================================================================

/// Pluggable scoring strategy.
///
/// The default methods implement the weighted-sum scorer; substitute a
/// different implementation to change individual steps while keeping the
/// "cheap check, then expensive check only for the provisional winner"
/// contract intact. Implementations must treat the context as read-only.
pub trait TargetScorer {
    /// Candidate-level eligibility: capture radius, then either the inset
    /// screen rectangle (screen capture) or the capture cone. Failing skips
    /// all of the candidate's sockets without per-socket work.
    fn candidate_check(
        &self,
        candidate: CandidateId,
        root_position: Vec3,
        ctx: &EvalContext,
        env: &TargetingEnv<'_>,
        config: &TargetingConfig,
    ) -> bool {
        let distance = root_position.distance(ctx.view.eye);
        let radius = effective_capture_radius(
            env.candidates().capture_radius(candidate),
            config.capture_radius_scale,
        );
        if distance > radius {
            return false;
        }

        if config.screen_capture {
            // An invalid projection degrades to "not on screen".
            match env.geometry().project_to_screen(root_position) {
                Some(screen) => env.is_on_screen(screen, config.screen_inset(ctx.is_switching())),
                None => false,
            }
        } else {
            let reference = ctx
                .view
                .reference_forward(config.view_yaw_offset_deg, config.view_pitch_offset_deg);
            angle_between_deg(reference, root_position - ctx.view.eye) <= config.capture_angle_deg
        }
    }

    /// Cheap per-socket predicate run before any modifier work.
    fn pre_check(&self, ctx: &EvalContext, config: &TargetingConfig) -> bool {
        if !ctx.is_switching() {
            return true;
        }

        // Switching away from the captured socket, never back onto it.
        if ctx.probe.handle() == ctx.current.handle() {
            return false;
        }

        // Screen-space switch math needs both projections.
        let (Some(current), Some(probe)) = (ctx.current.screen_position, ctx.probe.screen_position)
        else {
            return false;
        };

        // Hard window on both sides of the steering direction.
        angle_between_2d_deg(probe - current, ctx.input) <= config.switch_angle_range_deg
    }

    /// The weighted sum. A weight of exactly zero skips its term entirely,
    /// so a disabled term's inputs can never perturb the total.
    fn compute_modifier(
        &self,
        ctx: &EvalContext,
        env: &TargetingEnv<'_>,
        config: &TargetingConfig,
    ) -> f32 {
        let mut modifier = 0.0;

        if config.distance_weight > 0.0 {
            let radius = effective_capture_radius(
                env.candidates().capture_radius(ctx.probe.candidate),
                config.capture_radius_scale,
            );
            let distance = ctx.probe.world_position.distance(ctx.view.eye);
            modifier += config.distance_weight * normalized_distance(distance, radius);
        }

        match ctx.mode {
            PassMode::Find => {
                // No established target direction: the player-input term is
                // forced to zero regardless of configuration.
                if config.angle_weight_while_finding > 0.0 {
                    let reference = ctx
                        .view
                        .reference_forward(config.view_yaw_offset_deg, config.view_pitch_offset_deg);
                    let angle =
                        angle_between_deg(reference, ctx.probe.world_position - ctx.view.eye);
                    modifier += config.angle_weight_while_finding * normalized_angle(angle);
                }
            }
            PassMode::Switch => {
                if config.angle_weight_while_switching > 0.0 {
                    if let (Some(current), Some(probe)) =
                        (ctx.current.screen_position, ctx.probe.screen_position)
                    {
                        let angle = angle_between_2d_deg(probe - current, ctx.input);
                        modifier += config.angle_weight_while_switching * normalized_angle(angle);
                    }
                }

                if config.player_input_weight > 0.0 {
                    if let Some(probe) = ctx.probe.screen_position {
                        let center = env.geometry().viewport_size() * 0.5;
                        let angle = angle_between_2d_deg(probe - center, ctx.input);
                        modifier += config.player_input_weight * normalized_angle(angle);
                    }
                }
            }
        }

        modifier
    }

    /// Expensive predicate, only run when this socket's modifier beat the
    /// best found so far. The default traces line of sight from the eye to
    /// the socket, ignoring the candidate's own geometry.
    fn post_check(
        &self,
        ctx: &EvalContext,
        env: &TargetingEnv<'_>,
        config: &TargetingConfig,
    ) -> bool {
        if !config.line_of_sight_check {
            return true;
        }

        let exclude = [ctx.probe.candidate];
        !env.geometry()
            .is_obstructed(ctx.view.eye, ctx.probe.world_position, &exclude)
    }
}

/// The default weighted-sum scorer.
#[derive(Clone, Copy, Debug, Default)]
pub struct WeightedScorer;

impl TargetScorer for WeightedScorer {}
