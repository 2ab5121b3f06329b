//! Inference seam — the typed operations the analysis pipeline consumes.
//!
//! `InferenceService` is the only boundary between the orchestrator and the model
//! backend. `AppState` carries it as `Arc<dyn InferenceService>`; tests swap in a
//! scripted fake. `LlmInference` is the production backend.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::models::analysis::ApplicationStatus;

pub mod document;
#[cfg(test)]
pub mod fake;
pub mod llm;
pub mod prompts;

pub use document::DocumentRef;
pub use llm::LlmInference;

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Failure of a single inference operation.
///
/// Carries messages only so it can be cloned into stage records and fakes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error("malformed model output: {0}")]
    Malformed(String),
}

/// Bounds one inference call; elapsing maps to `InferenceError::Timeout`.
pub async fn with_timeout<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, InferenceError>>,
) -> Result<T, InferenceError> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(InferenceError::Timeout { after: limit }))
}

// ────────────────────────────────────────────────────────────────────────────
// Operation outputs
// ────────────────────────────────────────────────────────────────────────────

/// Structured view of an uploaded résumé document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedResume {
    pub skills: Vec<String>,
    pub experience_summary: String,
    pub education_summary: String,
    /// ATS blockers: layout, unusual characters, missing keywords.
    pub formatting_issues: String,
}

impl ParsedResume {
    /// Plain-text stand-in for résumé text when only a document was supplied.
    pub fn as_resume_text(&self) -> String {
        let mut text = String::new();
        if !self.skills.is_empty() {
            text.push_str("Skills: ");
            text.push_str(&self.skills.join(", "));
            text.push('\n');
        }
        if !self.experience_summary.trim().is_empty() {
            text.push_str("Experience: ");
            text.push_str(self.experience_summary.trim());
            text.push('\n');
        }
        if !self.education_summary.trim().is_empty() {
            text.push_str("Education: ");
            text.push_str(self.education_summary.trim());
            text.push('\n');
        }
        text
    }
}

/// Result of scoring a résumé against a job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchAnalysis {
    /// 0 – 100. Fractional or out-of-range model output is rounded and clamped.
    #[serde(deserialize_with = "deserialize_score")]
    pub score: u8,
    pub relevance_narrative: String,
    pub missing_skills: Vec<String>,
}

fn deserialize_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() {
        return Err(D::Error::custom("score must be a finite number"));
    }
    Ok(raw.round().clamp(0.0, 100.0) as u8)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LearningLevel {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningStep {
    pub step: String,
    pub practice_ideas: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillGap {
    pub skill: String,
    pub importance: String,
    pub learning_level: LearningLevel,
    pub learning_steps: Vec<LearningStep>,
}

/// Learning roadmap for missing skills, most important first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillGapAnalysis {
    pub per_skill: Vec<SkillGap>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestions {
    pub suggestion_text: String,
}

/// How far the aligned résumé may move away from the original wording.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationMode {
    Conservative,
    #[default]
    Balanced,
    Aggressive,
}

impl OptimizationMode {
    pub fn guidance(&self) -> &'static str {
        match self {
            OptimizationMode::Conservative => {
                "Make minimal changes. Rephrase a few key bullet points and add missing \
                 keywords only where they fit naturally."
            }
            OptimizationMode::Balanced => {
                "Reorder sections or bullet points so the most relevant experience comes \
                 first. Rewrite several sections to mirror the job description's language."
            }
            OptimizationMode::Aggressive => {
                "Perform a full rewrite. Mirror the job description's language extensively \
                 and shorten less relevant sections."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedResume {
    pub generated_text: String,
    pub improvement_summary: String,
}

/// Inputs for an aligned-résumé generation call.
#[derive(Debug, Clone)]
pub struct AlignRequest<'a> {
    pub original_resume: &'a str,
    pub job_description: &'a str,
    pub missing_skills: &'a [String],
    pub relevance_narrative: &'a str,
    pub mode: OptimizationMode,
}

/// Career details for writing a résumé from scratch. The first four fields are
/// required; the rest may be blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreshResumeProfile {
    pub full_name: String,
    pub target_role: String,
    /// Comma-separated.
    pub skills: String,
    pub education: String,
    pub experience: String,
    pub projects: String,
    pub certifications: String,
}

impl FreshResumeProfile {
    /// Name of the first required field that is blank.
    pub fn first_missing_field(&self) -> Option<&'static str> {
        [
            ("full_name", &self.full_name),
            ("target_role", &self.target_role),
            ("skills", &self.skills),
            ("education", &self.education),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// What likely drove an application outcome, and what to change next time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeInsights {
    pub positive_factors: Vec<String>,
    pub negative_factors: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct InsightRequest<'a> {
    pub resume_version: &'a str,
    pub job_description: &'a str,
    pub outcome: ApplicationStatus,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// The inference backend. Every operation is independent and may take arbitrarily
/// long; callers bound each call with their own timeout.
#[async_trait]
pub trait InferenceService: Send + Sync {
    async fn parse_document(&self, document: &DocumentRef) -> Result<ParsedResume, InferenceError>;

    async fn score_match(
        &self,
        job_description: &str,
        resume_text: &str,
    ) -> Result<MatchAnalysis, InferenceError>;

    async fn analyze_skill_gap(
        &self,
        job_description: &str,
        resume_text: &str,
        missing_skills: &[String],
    ) -> Result<SkillGapAnalysis, InferenceError>;

    async fn suggest_improvements(
        &self,
        job_description: &str,
        resume_text: &str,
    ) -> Result<Suggestions, InferenceError>;

    async fn generate_aligned_resume(
        &self,
        request: AlignRequest<'_>,
    ) -> Result<AlignedResume, InferenceError>;

    async fn generate_fresh_resume(
        &self,
        profile: &FreshResumeProfile,
        job_description: &str,
    ) -> Result<AlignedResume, InferenceError>;

    async fn generate_insights(
        &self,
        request: InsightRequest<'_>,
    ) -> Result<OutcomeInsights, InferenceError>;
}
