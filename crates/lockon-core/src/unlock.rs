//! Unlock reasons and the auto-find policy mask.
//!
//! Reasons are independent flags, not mutually exclusive: a single update may
//! raise several of them. The configured auto-find mask decides, per reason,
//! whether releasing the lock immediately triggers a new find pass.

use bitflags::bitflags;

use crate::config::ConfigError;

bitflags! {
    /// Why a captured target was (or should be) released.
    ///
    /// Each bit is independently triggerable. The same type doubles as the
    /// configured auto-find mask: if `mask.intersects(reason)` the handler
    /// re-runs a find pass right after releasing.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct UnlockReason: u8 {
        /// The candidate was unregistered, destroyed, or no longer resolves.
        const TARGET_INVALIDATED   = 1 << 0;
        /// The candidate left the lost distance
        /// (capture radius × runtime scale + per-candidate lost offset).
        const OUT_OF_LOST_DISTANCE = 1 << 1;
        /// The line-of-sight timer expired while the socket stayed occluded.
        const LINE_OF_SIGHT_FAIL   = 1 << 2;
        /// The candidate refused continued capture
        /// ([`crate::env::CandidateOracle::can_be_captured`] returned false).
        const CAPTURE_REFUSED      = 1 << 3;
        /// The captured socket was removed from the candidate.
        const SOCKET_REMOVED       = 1 << 4;
    }
}

impl UnlockReason {
    /// Parses a raw config bitmask, rejecting bits outside the known set.
    ///
    /// Externally edited config carries the mask as a plain integer; an
    /// unknown bit means the config and this enumeration disagree about the
    /// reason set, which must fail at load time rather than surface as a
    /// silently ignored flag during play.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownUnlockBits`] if `bits` contains a bit
    /// not covered by [`UnlockReason::all`].
    pub fn from_config_bits(bits: u8) -> Result<Self, ConfigError> {
        Self::from_bits(bits).ok_or(ConfigError::UnknownUnlockBits(bits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_bits_round_trip() {
        let mask = UnlockReason::TARGET_INVALIDATED | UnlockReason::LINE_OF_SIGHT_FAIL;
        assert_eq!(UnlockReason::from_config_bits(mask.bits()), Ok(mask));
    }

    #[test]
    fn unknown_bits_fail_at_load() {
        let raw = UnlockReason::all().bits() | 1 << 6;
        assert_eq!(
            UnlockReason::from_config_bits(raw),
            Err(ConfigError::UnknownUnlockBits(raw))
        );
    }

    #[test]
    fn mask_intersection_drives_auto_find() {
        let mask = UnlockReason::LINE_OF_SIGHT_FAIL;
        assert!(mask.intersects(UnlockReason::LINE_OF_SIGHT_FAIL));
        assert!(!mask.intersects(UnlockReason::OUT_OF_LOST_DISTANCE));
        // Multiple raised reasons: any overlapping bit triggers the re-find.
        let raised = UnlockReason::OUT_OF_LOST_DISTANCE | UnlockReason::LINE_OF_SIGHT_FAIL;
        assert!(mask.intersects(raised));
    }
}
