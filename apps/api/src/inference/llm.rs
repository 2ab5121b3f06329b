//! Claude-backed `InferenceService`.

use async_trait::async_trait;
use tracing::debug;

use crate::inference::prompts::{
    bullet_list, fill, ALIGN_PROMPT_TEMPLATE, ALIGN_ROLE, FRESH_PROMPT_TEMPLATE, FRESH_ROLE,
    INSIGHTS_PROMPT_TEMPLATE, INSIGHTS_ROLE, MATCH_PROMPT_TEMPLATE, MATCH_ROLE,
    PARSE_PROMPT_TEMPLATE, PARSE_ROLE, SKILL_GAP_PROMPT_TEMPLATE, SKILL_GAP_ROLE,
    SUGGEST_PROMPT_TEMPLATE, SUGGEST_ROLE,
};
use crate::inference::{
    AlignRequest, AlignedResume, DocumentRef, FreshResumeProfile, InferenceError,
    InferenceService, InsightRequest, MatchAnalysis, OutcomeInsights, ParsedResume,
    SkillGapAnalysis, Suggestions,
};
use crate::llm_client::prompts::{json_system, NO_FABRICATION_INSTRUCTION};
use crate::llm_client::{LlmClient, LlmError};

impl From<LlmError> for InferenceError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Parse(e) => InferenceError::Malformed(e.to_string()),
            LlmError::EmptyContent => {
                InferenceError::Malformed("LLM returned empty content".to_string())
            }
            other => InferenceError::Upstream(other.to_string()),
        }
    }
}

pub struct LlmInference {
    llm: LlmClient,
}

impl LlmInference {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl InferenceService for LlmInference {
    async fn parse_document(&self, document: &DocumentRef) -> Result<ParsedResume, InferenceError> {
        let resume_text = document.extract_text().await?;
        debug!(
            "Extracted {} chars from '{}'",
            resume_text.len(),
            document.file_name
        );

        let prompt = fill(PARSE_PROMPT_TEMPLATE, &[("resume_text", resume_text.as_str())]);
        Ok(self.llm.call_json(&prompt, &json_system(PARSE_ROLE)).await?)
    }

    async fn score_match(
        &self,
        job_description: &str,
        resume_text: &str,
    ) -> Result<MatchAnalysis, InferenceError> {
        let prompt = fill(
            MATCH_PROMPT_TEMPLATE,
            &[
                ("job_description", job_description),
                ("resume_text", resume_text),
            ],
        );

        Ok(self.llm.call_json(&prompt, &json_system(MATCH_ROLE)).await?)
    }

    async fn analyze_skill_gap(
        &self,
        job_description: &str,
        resume_text: &str,
        missing_skills: &[String],
    ) -> Result<SkillGapAnalysis, InferenceError> {
        if missing_skills.is_empty() {
            return Err(InferenceError::InvalidInput(
                "skill gap analysis needs at least one missing skill".to_string(),
            ));
        }

        let prompt = fill(
            SKILL_GAP_PROMPT_TEMPLATE,
            &[
                ("job_description", job_description),
                ("resume_text", resume_text),
                ("missing_skills", bullet_list(missing_skills).as_str()),
            ],
        );

        Ok(self
            .llm
            .call_json(&prompt, &json_system(SKILL_GAP_ROLE))
            .await?)
    }

    async fn suggest_improvements(
        &self,
        job_description: &str,
        resume_text: &str,
    ) -> Result<Suggestions, InferenceError> {
        let prompt = fill(
            SUGGEST_PROMPT_TEMPLATE,
            &[
                ("no_fabrication", NO_FABRICATION_INSTRUCTION),
                ("job_description", job_description),
                ("resume_text", resume_text),
            ],
        );

        Ok(self
            .llm
            .call_json(&prompt, &json_system(SUGGEST_ROLE))
            .await?)
    }

    async fn generate_aligned_resume(
        &self,
        request: AlignRequest<'_>,
    ) -> Result<AlignedResume, InferenceError> {
        let mode = format!("{:?}", request.mode);
        let prompt = fill(
            ALIGN_PROMPT_TEMPLATE,
            &[
                ("no_fabrication", NO_FABRICATION_INSTRUCTION),
                ("original_resume", request.original_resume),
                ("job_description", request.job_description),
                ("missing_skills", bullet_list(request.missing_skills).as_str()),
                ("relevance_narrative", request.relevance_narrative),
                ("mode", mode.as_str()),
                ("mode_guidance", request.mode.guidance()),
            ],
        );

        let aligned: AlignedResume = self.llm.call_json(&prompt, &json_system(ALIGN_ROLE)).await?;
        if aligned.generated_text.trim().is_empty() {
            return Err(InferenceError::Malformed(
                "model returned an empty resume".to_string(),
            ));
        }
        Ok(aligned)
    }

    async fn generate_fresh_resume(
        &self,
        profile: &FreshResumeProfile,
        job_description: &str,
    ) -> Result<AlignedResume, InferenceError> {
        let prompt = fill(
            FRESH_PROMPT_TEMPLATE,
            &[
                ("no_fabrication", NO_FABRICATION_INSTRUCTION),
                ("job_description", job_description),
                ("full_name", profile.full_name.as_str()),
                ("target_role", profile.target_role.as_str()),
                ("skills", profile.skills.as_str()),
                ("education", profile.education.as_str()),
                ("experience", or_none(&profile.experience)),
                ("projects", or_none(&profile.projects)),
                ("certifications", or_none(&profile.certifications)),
            ],
        );

        Ok(self.llm.call_json(&prompt, &json_system(FRESH_ROLE)).await?)
    }

    async fn generate_insights(
        &self,
        request: InsightRequest<'_>,
    ) -> Result<OutcomeInsights, InferenceError> {
        let prompt = fill(
            INSIGHTS_PROMPT_TEMPLATE,
            &[
                ("resume_version", request.resume_version),
                ("job_description", request.job_description),
                ("outcome", request.outcome.as_str()),
            ],
        );

        Ok(self
            .llm
            .call_json(&prompt, &json_system(INSIGHTS_ROLE))
            .await?)
    }
}

fn or_none(value: &str) -> &str {
    if value.trim().is_empty() {
        "(none)"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_maps_to_malformed() {
        let json_err = serde_json::from_str::<MatchAnalysis>("not json").unwrap_err();
        let err: InferenceError = LlmError::Parse(json_err).into();
        assert!(matches!(err, InferenceError::Malformed(_)));
    }

    #[test]
    fn test_api_error_maps_to_upstream() {
        let err: InferenceError = LlmError::Api {
            status: 529,
            message: "overloaded".to_string(),
        }
        .into();
        assert_eq!(
            err,
            InferenceError::Upstream("API error (status 529): overloaded".to_string())
        );
    }

    #[test]
    fn test_empty_content_maps_to_malformed() {
        let err: InferenceError = LlmError::EmptyContent.into();
        assert!(matches!(err, InferenceError::Malformed(_)));
    }
}
