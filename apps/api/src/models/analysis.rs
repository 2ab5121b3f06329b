use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::analysis::snapshot::ResultSnapshot;
use crate::inference::{OutcomeInsights, SkillGapAnalysis};

/// Job-application tracking status of a saved analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Analyzed,
    Applied,
    Interviewing,
    Offer,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Analyzed => "analyzed",
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Interviewing => "interviewing",
            ApplicationStatus::Offer => "offer",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Offer and rejection close an application; both trigger outcome insights.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Offer | ApplicationStatus::Rejected)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "analyzed" => Ok(ApplicationStatus::Analyzed),
            "applied" => Ok(ApplicationStatus::Applied),
            "interviewing" => Ok(ApplicationStatus::Interviewing),
            "offer" => Ok(ApplicationStatus::Offer),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(format!("unknown application status '{other}'")),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Saved analyses
// ────────────────────────────────────────────────────────────────────────────

/// Everything needed to persist one analysis. Slots that never produced a
/// result are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnalysis {
    pub job_description: String,
    pub resume_content: String,
    pub match_score: Option<u8>,
    pub relevance_highlights: Option<String>,
    #[serde(default)]
    pub missing_skills: Vec<String>,
    pub suggestions: Option<String>,
    pub skill_gap_analysis: Option<SkillGapAnalysis>,
}

impl NewAnalysis {
    /// Captures the snapshot's session inputs and finished results. `None` when no
    /// session has been started.
    pub fn from_snapshot(snapshot: &ResultSnapshot) -> Option<Self> {
        let session = snapshot.session()?;
        let matched = snapshot.match_analysis();
        Some(Self {
            job_description: session.inputs.job_description.clone(),
            resume_content: crate::analysis::registry::effective_resume_text(
                &session.inputs,
                snapshot,
            )
            .unwrap_or_default(),
            match_score: matched.map(|m| m.score),
            relevance_highlights: matched.map(|m| m.relevance_narrative.clone()),
            missing_skills: matched
                .map(|m| m.missing_skills.clone())
                .unwrap_or_default(),
            suggestions: snapshot.suggestions().map(|s| s.suggestion_text.clone()),
            skill_gap_analysis: snapshot.skill_gap().cloned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedAnalysis {
    pub id: Uuid,
    pub job_description: String,
    pub resume_content: String,
    pub match_score: Option<u8>,
    pub relevance_highlights: Option<String>,
    pub missing_skills: Vec<String>,
    pub suggestions: Option<String>,
    pub skill_gap_analysis: Option<SkillGapAnalysis>,
    pub status: ApplicationStatus,
    /// Set once the application reaches an outcome.
    pub insights: Option<OutcomeInsights>,
    pub created_at: DateTime<Utc>,
}

impl SavedAnalysis {
    pub fn new(id: Uuid, analysis: NewAnalysis, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            job_description: analysis.job_description,
            resume_content: analysis.resume_content,
            match_score: analysis.match_score,
            relevance_highlights: analysis.relevance_highlights,
            missing_skills: analysis.missing_skills,
            suggestions: analysis.suggestions,
            skill_gap_analysis: analysis.skill_gap_analysis,
            status: ApplicationStatus::default(),
            insights: None,
            created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct SavedAnalysisRow {
    pub id: Uuid,
    pub job_description: String,
    pub resume_content: String,
    pub match_score: Option<i16>,
    pub relevance_highlights: Option<String>,
    pub missing_skills: Vec<String>,
    pub suggestions: Option<String>,
    pub skill_gap_analysis: Option<Value>,
    pub status: String,
    pub insights: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<SavedAnalysisRow> for SavedAnalysis {
    type Error = String;

    fn try_from(row: SavedAnalysisRow) -> Result<Self, Self::Error> {
        let match_score = row
            .match_score
            .map(|s| u8::try_from(s).map_err(|_| format!("match_score {s} out of range")))
            .transpose()?;
        let skill_gap_analysis = row
            .skill_gap_analysis
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| format!("skill_gap_analysis: {e}"))?;
        let insights = row
            .insights
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| format!("insights: {e}"))?;

        Ok(SavedAnalysis {
            id: row.id,
            job_description: row.job_description,
            resume_content: row.resume_content,
            match_score,
            relevance_highlights: row.relevance_highlights,
            missing_skills: row.missing_skills,
            suggestions: row.suggestions,
            skill_gap_analysis,
            status: row.status.parse()?,
            insights,
            created_at: row.created_at,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Résumé versions
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewResumeVersion {
    pub name: String,
    pub content: String,
    pub job_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ResumeVersion {
    pub id: Uuid,
    pub name: String,
    pub content: String,
    pub job_description: Option<String>,
    pub created_at: DateTime<Utc>,
}
