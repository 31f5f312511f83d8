//! Verdict classification for vegetation-index change.

use crate::model::Verdict;

/// Classify an NDVI delta against a significance threshold.
///
/// Strict inequalities on both sides: a delta of exactly the threshold is
/// `Neutral`.
pub fn classify(delta: f64, threshold: f64) -> Verdict {
    if delta > threshold {
        Verdict::Positive
    } else if delta < -threshold {
        Verdict::Suspicious
    } else {
        Verdict::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: f64 = 0.05;

    #[test]
    fn increase_beyond_threshold_is_positive() {
        assert_eq!(classify(0.051, THRESHOLD), Verdict::Positive);
        assert_eq!(classify(0.10, THRESHOLD), Verdict::Positive);
    }

    #[test]
    fn decrease_beyond_threshold_is_suspicious() {
        assert_eq!(classify(-0.051, THRESHOLD), Verdict::Suspicious);
        assert_eq!(classify(-0.4, THRESHOLD), Verdict::Suspicious);
    }

    #[test]
    fn small_change_is_neutral() {
        assert_eq!(classify(0.0, THRESHOLD), Verdict::Neutral);
        assert_eq!(classify(0.03, THRESHOLD), Verdict::Neutral);
        assert_eq!(classify(-0.03, THRESHOLD), Verdict::Neutral);
    }

    #[test]
    fn exact_boundary_is_neutral() {
        assert_eq!(classify(0.05, THRESHOLD), Verdict::Neutral);
        assert_eq!(classify(-0.05, THRESHOLD), Verdict::Neutral);
    }
}
