//! # Liveness Policy
//!
//! A proposal can be disputed while `now < proposal_time + liveness`. The
//! boundary is exclusive: at exactly the expiry instant the proposal is
//! expired and only settlement is possible.

use thiserror::Error;

use optimist_core::Timestamp;

/// Shortest accepted liveness window, in seconds.
pub const MIN_LIVENESS_SECS: u64 = 1;

/// Longest accepted liveness window: one second short of 5200 weeks.
pub const MAX_LIVENESS_SECS: u64 = 5200 * 7 * 24 * 60 * 60 - 1;

/// A liveness value outside `[MIN_LIVENESS_SECS, MAX_LIVENESS_SECS]`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("liveness {value}s outside [{min}s, {max}s]")]
pub struct InvalidLiveness {
    /// The rejected value in seconds.
    pub value: u64,
    /// Lower bound.
    pub min: u64,
    /// Upper bound.
    pub max: u64,
}

/// Check `secs` against the liveness bounds.
pub fn validate(secs: u64) -> Result<u64, InvalidLiveness> {
    if (MIN_LIVENESS_SECS..=MAX_LIVENESS_SECS).contains(&secs) {
        Ok(secs)
    } else {
        Err(InvalidLiveness {
            value: secs,
            min: MIN_LIVENESS_SECS,
            max: MAX_LIVENESS_SECS,
        })
    }
}

/// `proposal_time + liveness`, or `None` past the representable range.
pub fn expiry(proposal_time: Timestamp, liveness_secs: u64) -> Option<Timestamp> {
    proposal_time.checked_add_secs(liveness_secs)
}

/// Whether a proposal expiring at `expiry` can still be disputed at `now`.
pub fn is_disputable(now: Timestamp, expiry: Timestamp) -> bool {
    now < expiry
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_epoch_secs(secs).unwrap()
    }

    #[test]
    fn expiry_adds_liveness() {
        assert_eq!(expiry(ts(1_000), 7_200), Some(ts(8_200)));
    }

    #[test]
    fn dispute_window_is_exclusive_at_expiry() {
        let exp = expiry(ts(1_000), 100).unwrap();
        assert!(is_disputable(ts(1_099), exp));
        assert!(!is_disputable(ts(1_100), exp));
        assert!(!is_disputable(ts(1_101), exp));
    }

    #[test]
    fn bounds_are_inclusive() {
        assert_eq!(validate(MIN_LIVENESS_SECS), Ok(MIN_LIVENESS_SECS));
        assert_eq!(validate(MAX_LIVENESS_SECS), Ok(MAX_LIVENESS_SECS));
    }

    #[test]
    fn zero_liveness_rejected() {
        let err = validate(0).unwrap_err();
        assert_eq!(err.value, 0);
        assert!(err.to_string().contains("outside"));
    }

    #[test]
    fn five_thousand_two_hundred_weeks_rejected() {
        assert!(validate(MAX_LIVENESS_SECS + 1).is_err());
        assert_eq!(MAX_LIVENESS_SECS + 1, 3_144_960_000);
    }
}
