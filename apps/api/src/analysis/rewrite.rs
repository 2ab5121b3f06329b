//! Résumé generation. `generate_aligned` rewrites the session's résumé toward the job
//! description, re-scores the result, and diffs it against the original;
//! `generate_fresh` writes one from a career profile when there is no résumé yet.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::analysis::registry::effective_resume_text;
use crate::analysis::snapshot::ResultSnapshot;
use crate::diff::{compute_diff, DiffScript};
use crate::inference::{
    with_timeout, AlignRequest, AlignedResume, FreshResumeProfile, InferenceError,
    InferenceService, OptimizationMode,
};

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("no analysis session has been started")]
    NoSession,

    #[error("the match stage has not succeeded for this session")]
    MatchUnavailable,

    #[error("session has no resume text to rewrite")]
    MissingResume,

    #[error("a job description is required")]
    MissingJobDescription,

    #[error("{0} is required")]
    IncompleteProfile(&'static str),

    #[error("rewrite failed: {0}")]
    Inference(#[from] InferenceError),

    #[error("diff task failed: {0}")]
    DiffTask(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct RewriteReport {
    pub mode: OptimizationMode,
    pub generated_text: String,
    pub improvement_summary: String,
    pub original_score: u8,
    pub new_score: u8,
    pub diff: DiffScript,
}

/// Each backend call is bounded by `timeout` separately.
pub async fn generate_aligned(
    service: &dyn InferenceService,
    snapshot: &ResultSnapshot,
    mode: OptimizationMode,
    timeout: Duration,
) -> Result<RewriteReport, RewriteError> {
    let session = snapshot.session().ok_or(RewriteError::NoSession)?;
    let analysis = snapshot
        .match_analysis()
        .ok_or(RewriteError::MatchUnavailable)?;
    let original =
        effective_resume_text(&session.inputs, snapshot).ok_or(RewriteError::MissingResume)?;
    let job_description = session.inputs.job_description.as_str();

    let request = AlignRequest {
        original_resume: &original,
        job_description,
        missing_skills: &analysis.missing_skills,
        relevance_narrative: &analysis.relevance_narrative,
        mode,
    };
    let aligned = with_timeout(timeout, service.generate_aligned_resume(request)).await?;
    if aligned.generated_text.trim().is_empty() {
        return Err(InferenceError::Malformed("generated resume is empty".to_string()).into());
    }

    let rescored = with_timeout(
        timeout,
        service.score_match(job_description, &aligned.generated_text),
    )
    .await?;

    let generated = aligned.generated_text.clone();
    let diff = tokio::task::spawn_blocking(move || compute_diff(&original, &generated))
        .await
        .map_err(|e| RewriteError::DiffTask(e.to_string()))?;

    info!(
        session_id = %session.id,
        ?mode,
        original_score = analysis.score,
        new_score = rescored.score,
        "aligned resume generated"
    );

    Ok(RewriteReport {
        mode,
        generated_text: aligned.generated_text,
        improvement_summary: aligned.improvement_summary,
        original_score: analysis.score,
        new_score: rescored.score,
        diff,
    })
}

/// Writes a résumé from `profile`, aimed at `job_description`.
pub async fn generate_fresh(
    service: &dyn InferenceService,
    profile: &FreshResumeProfile,
    job_description: &str,
    timeout: Duration,
) -> Result<AlignedResume, RewriteError> {
    if let Some(field) = profile.first_missing_field() {
        return Err(RewriteError::IncompleteProfile(field));
    }
    if job_description.trim().is_empty() {
        return Err(RewriteError::MissingJobDescription);
    }

    let generated = with_timeout(
        timeout,
        service.generate_fresh_resume(profile, job_description),
    )
    .await?;
    if generated.generated_text.trim().is_empty() {
        return Err(InferenceError::Malformed("generated resume is empty".to_string()).into());
    }

    info!(
        target_role = %profile.target_role,
        chars = generated.generated_text.len(),
        "fresh resume generated"
    );
    Ok(generated)
}
