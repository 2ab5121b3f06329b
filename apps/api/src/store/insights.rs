//! Outcome insights for tracked applications: why a saved résumé likely led to
//! its outcome, stored back on the analysis.

use std::time::Duration;

use thiserror::Error;
use tracing::info;

use super::{AnalysisStore, StoreError};
use crate::inference::{with_timeout, InferenceError, InferenceService, InsightRequest};
use crate::models::analysis::SavedAnalysis;

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("saved analysis has no resume content")]
    MissingResume,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("insight generation failed: {0}")]
    Inference(#[from] InferenceError),
}

/// Generates insights for `analysis` at its current status and persists them.
pub async fn record_insights(
    service: &dyn InferenceService,
    store: &dyn AnalysisStore,
    analysis: &SavedAnalysis,
    timeout: Duration,
) -> Result<SavedAnalysis, InsightError> {
    if analysis.resume_content.trim().is_empty() {
        return Err(InsightError::MissingResume);
    }

    let request = InsightRequest {
        resume_version: &analysis.resume_content,
        job_description: &analysis.job_description,
        outcome: analysis.status,
    };
    let insights = with_timeout(timeout, service.generate_insights(request)).await?;
    info!(
        analysis_id = %analysis.id,
        outcome = %analysis.status,
        recommendations = insights.recommendations.len(),
        "outcome insights generated"
    );

    Ok(store.save_insights(analysis.id, insights).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::fake::{outcome_insights, FakeInference, Op};
    use crate::models::analysis::{ApplicationStatus, NewAnalysis};
    use crate::store::memory::MemoryAnalysisStore;

    const TIMEOUT: Duration = Duration::from_secs(30);

    async fn saved(store: &MemoryAnalysisStore, resume: &str) -> SavedAnalysis {
        let analysis = NewAnalysis {
            job_description: "Senior Go engineer".to_string(),
            resume_content: resume.to_string(),
            match_score: Some(40),
            relevance_highlights: None,
            missing_skills: vec!["Go".to_string()],
            suggestions: None,
            skill_gap_analysis: None,
        };
        let saved = store.save_analysis(analysis).await.unwrap();
        store
            .update_status(saved.id, ApplicationStatus::Rejected)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_insights_are_persisted() {
        let fake = FakeInference::new();
        let store = MemoryAnalysisStore::default();
        let analysis = saved(&store, "Python developer").await;

        let updated = record_insights(&fake, &store, &analysis, TIMEOUT).await.unwrap();

        assert_eq!(updated.insights, Some(outcome_insights()));
        assert_eq!(fake.insight_outcomes(), vec![ApplicationStatus::Rejected]);
        let stored = store.get_analysis(analysis.id).await.unwrap();
        assert_eq!(stored.insights, Some(outcome_insights()));
    }

    #[tokio::test]
    async fn test_failure_leaves_record_untouched() {
        let fake = FakeInference::new();
        fake.set_insights(Err(InferenceError::Upstream("overloaded".to_string())));
        let store = MemoryAnalysisStore::default();
        let analysis = saved(&store, "Python developer").await;

        let err = record_insights(&fake, &store, &analysis, TIMEOUT)
            .await
            .unwrap_err();

        assert!(matches!(err, InsightError::Inference(InferenceError::Upstream(_))));
        assert!(store.get_analysis(analysis.id).await.unwrap().insights.is_none());
    }

    #[tokio::test]
    async fn test_blank_resume_skips_inference() {
        let fake = FakeInference::new();
        let store = MemoryAnalysisStore::default();
        let analysis = saved(&store, "  ").await;

        let err = record_insights(&fake, &store, &analysis, TIMEOUT)
            .await
            .unwrap_err();

        assert!(matches!(err, InsightError::MissingResume));
        assert_eq!(fake.calls(Op::Insights), 0);
    }
}
