//! Scoring intake and bucket evaluation.
//!
//! Scores arrive from the external AI service; this module validates them
//! on the way into the mirror store and joins them with the insurer's
//! threshold config to produce the routing bucket.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use veridoc_core::{classify, Bucket, CoreError, ScoringRecord, ThresholdConfig};
use veridoc_store::MirrorStore;

use crate::EngineError;

pub struct ScoringService<S> {
    store: Arc<S>,
}

impl<S: MirrorStore> ScoringService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Record the authoritative score for a claim, overwriting any prior
    /// evaluation. Out-of-range scores are refused before touching the
    /// store.
    pub async fn record_score(&self, claim_id: &str, score: f64) -> Result<(), EngineError> {
        if !score.is_finite() || !(0.0..=100.0).contains(&score) {
            return Err(EngineError::Core(CoreError::InvalidScore(score)));
        }
        self.store
            .upsert_score(ScoringRecord {
                claim_id: claim_id.to_string(),
                score,
                evaluated_at: Utc::now(),
            })
            .await?;
        info!(claim_id, score, "scoring record stored");
        Ok(())
    }

    /// The routing bucket for a claim under the given insurer config.
    ///
    /// Claims with no scoring record route to [`Bucket::Unscored`]; a
    /// stored score is classified through the threshold bands.
    pub async fn bucket_for_claim(
        &self,
        claim_id: &str,
        config: &ThresholdConfig,
    ) -> Result<Bucket, EngineError> {
        match self.store.score_for_claim(claim_id).await? {
            None => Ok(Bucket::Unscored),
            Some(record) => Ok(classify(record.score, config)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veridoc_store::MemoryStore;

    fn service() -> ScoringService<MemoryStore> {
        ScoringService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn unscored_claims_route_to_unscored() {
        let service = service();
        let bucket = service
            .bucket_for_claim("clm-1", &ThresholdConfig::default())
            .await
            .unwrap();
        assert_eq!(bucket, Bucket::Unscored);
    }

    #[tokio::test]
    async fn scored_claims_classify_through_the_config() {
        let service = service();
        service.record_score("clm-1", 45.0).await.unwrap();
        let cfg = ThresholdConfig::new(30.0, 60.0, 80.0).unwrap();
        assert_eq!(
            service.bucket_for_claim("clm-1", &cfg).await.unwrap(),
            Bucket::Manual
        );
    }

    #[tokio::test]
    async fn re_evaluation_overwrites() {
        let service = service();
        service.record_score("clm-1", 45.0).await.unwrap();
        service.record_score("clm-1", 95.0).await.unwrap();
        assert_eq!(
            service
                .bucket_for_claim("clm-1", &ThresholdConfig::default())
                .await
                .unwrap(),
            Bucket::Auto
        );
    }

    #[tokio::test]
    async fn out_of_range_scores_are_refused() {
        let service = service();
        assert!(service.record_score("clm-1", 101.0).await.is_err());
        assert!(service.record_score("clm-1", -1.0).await.is_err());
        // Nothing was stored.
        assert_eq!(
            service
                .bucket_for_claim("clm-1", &ThresholdConfig::default())
                .await
                .unwrap(),
            Bucket::Unscored
        );
    }
}
