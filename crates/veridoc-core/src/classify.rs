//! Threshold classifier: trust score to routing bucket.
//!
//! Pure and total over valid scores. Boundary policy favours the higher
//! bucket: a score exactly at the auto threshold auto-approves, and a score
//! exactly at the rejection threshold still lands in manual review.
//!
//! The manual band is the union of `[reject, manual)` and `[manual, auto)`.
//! The source platform never distinguished the two segments and neither do
//! we; priority tiers within manual review would be a product decision.

use crate::error::CoreError;
use crate::types::{Bucket, ThresholdConfig};

/// Classify a trust score into a routing bucket.
///
/// `score` must be finite and within [0, 100]; anything else is an
/// [`CoreError::InvalidScore`] rather than a silent default. The config's
/// resolved thresholds must be ordered (see [`ThresholdConfig::validate`]).
pub fn classify(score: f64, config: &ThresholdConfig) -> Result<Bucket, CoreError> {
    if !score.is_finite() || !(0.0..=100.0).contains(&score) {
        return Err(CoreError::InvalidScore(score));
    }
    config.validate()?;

    if score >= config.auto() {
        Ok(Bucket::Auto)
    } else if score < config.reject() {
        Ok(Bucket::Reject)
    } else {
        Ok(Bucket::Manual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(reject: f64, manual: f64, auto: f64) -> ThresholdConfig {
        ThresholdConfig::new(reject, manual, auto).unwrap()
    }

    #[test]
    fn defaults_route_the_middle_to_manual() {
        let cfg = ThresholdConfig::default();
        assert_eq!(classify(70.0, &cfg).unwrap(), Bucket::Manual);
        assert_eq!(classify(85.0, &cfg).unwrap(), Bucket::Auto);
        assert_eq!(classify(10.0, &cfg).unwrap(), Bucket::Reject);
    }

    #[test]
    fn boundaries_favour_the_higher_bucket() {
        let cfg = cfg(30.0, 60.0, 80.0);
        assert_eq!(classify(80.0, &cfg).unwrap(), Bucket::Auto);
        assert_eq!(classify(79.0, &cfg).unwrap(), Bucket::Manual);
        // Exactly at the rejection threshold is manual, not reject.
        assert_eq!(classify(30.0, &cfg).unwrap(), Bucket::Manual);
        assert_eq!(classify(29.0, &cfg).unwrap(), Bucket::Reject);
        // The manual-band lower boundary changes nothing: both middle
        // segments route identically.
        assert_eq!(classify(60.0, &cfg).unwrap(), Bucket::Manual);
        assert_eq!(classify(59.0, &cfg).unwrap(), Bucket::Manual);
    }

    #[test]
    fn domain_edges_are_valid() {
        let cfg = ThresholdConfig::default();
        assert_eq!(classify(0.0, &cfg).unwrap(), Bucket::Reject);
        assert_eq!(classify(100.0, &cfg).unwrap(), Bucket::Auto);
    }

    #[test]
    fn invalid_scores_error_instead_of_defaulting() {
        let cfg = ThresholdConfig::default();
        assert!(matches!(
            classify(-0.5, &cfg),
            Err(CoreError::InvalidScore(_))
        ));
        assert!(matches!(
            classify(100.5, &cfg),
            Err(CoreError::InvalidScore(_))
        ));
        assert!(matches!(
            classify(f64::NAN, &cfg),
            Err(CoreError::InvalidScore(_))
        ));
        assert!(matches!(
            classify(f64::INFINITY, &cfg),
            Err(CoreError::InvalidScore(_))
        ));
    }

    #[test]
    fn inconsistent_config_is_rejected() {
        let cfg = ThresholdConfig {
            auto_approval_threshold: Some(20.0),
            ..Default::default()
        };
        assert!(matches!(
            classify(50.0, &cfg),
            Err(CoreError::InvalidThresholds { .. })
        ));
    }

    #[test]
    fn monotone_over_the_score_domain() {
        let configs = [
            cfg(30.0, 60.0, 80.0),
            cfg(0.0, 50.0, 100.0),
            cfg(10.0, 10.0, 90.0),
            cfg(50.0, 50.0, 50.0),
        ];
        for cfg in &configs {
            let mut prev = classify(0.0, cfg).unwrap();
            for s in 1..=100 {
                let next = classify(s as f64, cfg).unwrap();
                assert!(
                    prev <= next,
                    "classification regressed at score {s} with {cfg:?}"
                );
                prev = next;
            }
        }
    }

    #[test]
    fn degenerate_config_splits_at_the_single_threshold() {
        let cfg = cfg(50.0, 50.0, 50.0);
        assert_eq!(classify(49.9, &cfg).unwrap(), Bucket::Reject);
        assert_eq!(classify(50.0, &cfg).unwrap(), Bucket::Auto);
    }
}
