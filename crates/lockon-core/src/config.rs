//! Tunable parameters for target selection and the lock lifecycle.
//!
//! The config is a flat set of named numeric/boolean parameters, loaded once
//! and read-only during a pass. Invariant violations are caught by
//! [`TargetingConfig::validate`] at startup, never at scoring time.

use std::time::Duration;

use glam::Vec2;

use crate::unlock::UnlockReason;

/// Weighting, eligibility, and line-of-sight parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetingConfig {
    /// Reasons that trigger an automatic find pass after the release.
    pub auto_find_flags: UnlockReason,

    /// Capture only candidates that project onto the screen. When false, an
    /// angular cone check against the view direction is used instead.
    pub screen_capture: bool,

    /// Narrows the screen from both sides, in percent per axis, while
    /// finding a new target. Keeps candidates near the borders uncaptured.
    pub finding_screen_inset: Vec2,

    /// Same as `finding_screen_inset`, applied while switching.
    pub switching_screen_inset: Vec2,

    /// Half-angle of the capture cone, in degrees. Only consulted when
    /// `screen_capture` is off.
    pub capture_angle_deg: f32,

    /// Influence of the distance to the socket on the final modifier.
    pub distance_weight: f32,

    /// Influence of the angle to the socket while finding.
    pub angle_weight_while_finding: f32,

    /// Influence of the screen-space angle to the socket while switching.
    pub angle_weight_while_switching: f32,

    /// Influence of the player's steering input while a target is locked.
    /// Forced to zero in find mode regardless of this value.
    pub player_input_weight: f32,

    /// Yaw applied to the view direction before the finding angle term.
    /// Adjusts the effective screen center.
    pub view_yaw_offset_deg: f32,

    /// Pitch applied to the view direction before the finding angle term.
    pub view_pitch_offset_deg: f32,

    /// Hard window while switching: sockets whose screen-space offset from
    /// the input direction exceeds this angle (per side) are not scored.
    pub switch_angle_range_deg: f32,

    /// Whether the captured socket is traced for obstruction. With a
    /// positive `lost_target_delay` the socket is probed regularly; the lock
    /// is released when the occlusion timer expires.
    pub line_of_sight_check: bool,

    /// Occlusion grace period. The timer stops if the socket returns to the
    /// line of sight. With a zero delay the captured socket is not probed
    /// regularly; visibility only matters during find/switch passes.
    pub lost_target_delay: Duration,

    /// Runtime multiplier applied to every candidate's capture radius.
    pub capture_radius_scale: f32,
}

impl TargetingConfig {
    /// Upper bound of sockets per candidate reported by the oracle.
    pub const MAX_SOCKETS: usize = 8;

    /// Squared steering-input length below which a switch pass is not
    /// attempted (no directional intent).
    pub const INPUT_DEADZONE_SQUARED: f32 = 1.0e-4;

    pub fn new() -> Self {
        Self {
            auto_find_flags: UnlockReason::all(),
            screen_capture: true,
            finding_screen_inset: Vec2::new(15.0, 10.0),
            switching_screen_inset: Vec2::new(5.0, 2.5),
            capture_angle_deg: 35.0,
            distance_weight: 1.0,
            angle_weight_while_finding: 0.8,
            angle_weight_while_switching: 0.8,
            player_input_weight: 0.6,
            view_yaw_offset_deg: 0.0,
            view_pitch_offset_deg: 0.0,
            switch_angle_range_deg: 60.0,
            line_of_sight_check: true,
            lost_target_delay: Duration::from_secs(3),
            capture_radius_scale: 1.0,
        }
    }

    /// Checks every parameter against its documented range.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant. Construction through
    /// [`crate::TargetHandler::new`] runs this automatically so a bad config
    /// fails fast instead of skewing scores silently.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("distance_weight", self.distance_weight),
            ("angle_weight_while_finding", self.angle_weight_while_finding),
            (
                "angle_weight_while_switching",
                self.angle_weight_while_switching,
            ),
            ("player_input_weight", self.player_input_weight),
        ];
        for (name, value) in weights {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::WeightOutOfRange { name, value });
            }
        }

        let angles = [
            ("capture_angle_deg", self.capture_angle_deg),
            ("switch_angle_range_deg", self.switch_angle_range_deg),
        ];
        for (name, value) in angles {
            if !(0.0..=180.0).contains(&value) {
                return Err(ConfigError::AngleOutOfRange { name, value });
            }
        }

        let insets = [
            ("finding_screen_inset", self.finding_screen_inset),
            ("switching_screen_inset", self.switching_screen_inset),
        ];
        for (name, value) in insets {
            if !(0.0..=50.0).contains(&value.x) || !(0.0..=50.0).contains(&value.y) {
                return Err(ConfigError::InsetOutOfRange {
                    name,
                    x: value.x,
                    y: value.y,
                });
            }
        }

        if self.capture_radius_scale < 0.0 || !self.capture_radius_scale.is_finite() {
            return Err(ConfigError::InvalidRadiusScale(self.capture_radius_scale));
        }

        Ok(())
    }

    /// The screen inset for the given switching state.
    pub fn screen_inset(&self, switching: bool) -> Vec2 {
        if switching {
            self.switching_screen_inset
        } else {
            self.finding_screen_inset
        }
    }

    /// Whether the captured socket should be probed on a regular cadence.
    pub fn traces_regularly(&self) -> bool {
        self.line_of_sight_check && self.lost_target_delay > Duration::ZERO
    }
}

impl Default for TargetingConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration invariant violation, reported at load time.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("weight `{name}` must be within [0, 1], got {value}")]
    WeightOutOfRange { name: &'static str, value: f32 },

    #[error("angle `{name}` must be within [0, 180] degrees, got {value}")]
    AngleOutOfRange { name: &'static str, value: f32 },

    #[error("screen inset `{name}` must be within [0, 50] percent per side, got ({x}, {y})")]
    InsetOutOfRange { name: &'static str, x: f32, y: f32 },

    #[error("capture radius scale must be finite and non-negative, got {0}")]
    InvalidRadiusScale(f32),

    #[error("unlock reason mask contains unknown bits: {0:#010b}")]
    UnknownUnlockBits(u8),
}
