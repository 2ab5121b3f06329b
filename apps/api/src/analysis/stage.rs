//! Stage identities, run records, and the typed requests each stage sends to the
//! inference backend.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::session::SessionInputs;
use crate::analysis::snapshot::ResultSnapshot;
use crate::inference::{
    DocumentRef, InferenceError, InferenceService, MatchAnalysis, ParsedResume, SkillGapAnalysis,
    Suggestions,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StageId {
    Parse,
    Match,
    SkillGap,
    Suggest,
}

impl StageId {
    pub const ALL: [StageId; 4] = [
        StageId::Parse,
        StageId::Match,
        StageId::SkillGap,
        StageId::Suggest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::Parse => "parse",
            StageId::Match => "match",
            StageId::SkillGap => "skillGap",
            StageId::Suggest => "suggest",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A static pipeline stage. Predicates are pure functions of the session inputs
/// and the current snapshot.
pub struct Stage {
    pub id: StageId,
    /// Stages whose output this one may consume. Only used to explain why a slot
    /// never became ready.
    pub depends_on: &'static [StageId],
    pub progress_label: &'static str,
    pub ready: fn(&SessionInputs, &ResultSnapshot) -> bool,
    /// When true the stage goes straight to Skipped instead of running.
    pub skip: fn(&SessionInputs, &ResultSnapshot) -> bool,
    /// Builds the inference request. Only called once `ready` holds.
    pub prepare: fn(&SessionInputs, &ResultSnapshot) -> Option<StageRequest>,
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("id", &self.id)
            .field("depends_on", &self.depends_on)
            .finish()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Run records
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    NotStarted,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl StageStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StageStatus::Succeeded | StageStatus::Failed | StageStatus::Skipped
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageErrorKind {
    InvalidInput,
    Timeout,
    Upstream,
    Malformed,
}

/// Error descriptor retained on a Failed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageError {
    pub kind: StageErrorKind,
    pub message: String,
}

impl From<InferenceError> for StageError {
    fn from(err: InferenceError) -> Self {
        let kind = match &err {
            InferenceError::InvalidInput(_) => StageErrorKind::InvalidInput,
            InferenceError::Timeout { .. } => StageErrorKind::Timeout,
            InferenceError::Upstream(_) => StageErrorKind::Upstream,
            InferenceError::Malformed(_) => StageErrorKind::Malformed,
        };
        StageError {
            kind,
            message: err.to_string(),
        }
    }
}

/// Successful output of one stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", content = "result", rename_all = "camelCase")]
pub enum StageOutput {
    Parse(ParsedResume),
    Match(MatchAnalysis),
    SkillGap(SkillGapAnalysis),
    Suggest(Suggestions),
}

impl StageOutput {
    pub fn stage(&self) -> StageId {
        match self {
            StageOutput::Parse(_) => StageId::Parse,
            StageOutput::Match(_) => StageId::Match,
            StageOutput::SkillGap(_) => StageId::SkillGap,
            StageOutput::Suggest(_) => StageId::Suggest,
        }
    }
}

/// Lifecycle of a run. The payload lives on the variant, so a result exists only
/// when Succeeded and an error only when Failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunState {
    NotStarted,
    Running,
    Succeeded { output: StageOutput },
    Failed { error: StageError },
    Skipped,
}

/// One execution of a stage within a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageRun {
    pub stage: StageId,
    #[serde(flatten)]
    pub state: RunState,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl StageRun {
    pub fn new(stage: StageId) -> Self {
        Self {
            stage,
            state: RunState::NotStarted,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn status(&self) -> StageStatus {
        match self.state {
            RunState::NotStarted => StageStatus::NotStarted,
            RunState::Running => StageStatus::Running,
            RunState::Succeeded { .. } => StageStatus::Succeeded,
            RunState::Failed { .. } => StageStatus::Failed,
            RunState::Skipped => StageStatus::Skipped,
        }
    }

    pub fn output(&self) -> Option<&StageOutput> {
        match &self.state {
            RunState::Succeeded { output } => Some(output),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&StageError> {
        match &self.state {
            RunState::Failed { error } => Some(error),
            _ => None,
        }
    }

    pub(crate) fn mark_running(&mut self, now: DateTime<Utc>) {
        debug_assert_eq!(self.status(), StageStatus::NotStarted);
        self.state = RunState::Running;
        self.started_at = Some(now);
    }

    pub(crate) fn mark_skipped(&mut self, now: DateTime<Utc>) {
        debug_assert_eq!(self.status(), StageStatus::NotStarted);
        self.state = RunState::Skipped;
        self.finished_at = Some(now);
    }

    /// Records a terminal result. Returns false, leaving the run untouched, unless
    /// the run is currently Running.
    pub(crate) fn finish(
        &mut self,
        result: Result<StageOutput, StageError>,
        now: DateTime<Utc>,
    ) -> bool {
        if self.status() != StageStatus::Running {
            return false;
        }
        self.state = match result {
            Ok(output) => RunState::Succeeded { output },
            Err(error) => RunState::Failed { error },
        };
        self.finished_at = Some(now);
        true
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Requests
// ────────────────────────────────────────────────────────────────────────────

/// Owned inputs for one inference call, captured at dispatch time so the call
/// never reads orchestrator state while in flight.
#[derive(Debug, Clone)]
pub enum StageRequest {
    Parse {
        document: DocumentRef,
    },
    Match {
        job_description: String,
        resume_text: String,
    },
    SkillGap {
        job_description: String,
        resume_text: String,
        missing_skills: Vec<String>,
    },
    Suggest {
        job_description: String,
        resume_text: String,
    },
}

impl StageRequest {
    pub fn stage(&self) -> StageId {
        match self {
            StageRequest::Parse { .. } => StageId::Parse,
            StageRequest::Match { .. } => StageId::Match,
            StageRequest::SkillGap { .. } => StageId::SkillGap,
            StageRequest::Suggest { .. } => StageId::Suggest,
        }
    }

    /// Invokes the inference operation this stage is bound to.
    pub async fn dispatch(
        &self,
        service: &dyn InferenceService,
    ) -> Result<StageOutput, InferenceError> {
        match self {
            StageRequest::Parse { document } => {
                service.parse_document(document).await.map(StageOutput::Parse)
            }
            StageRequest::Match {
                job_description,
                resume_text,
            } => service
                .score_match(job_description, resume_text)
                .await
                .map(StageOutput::Match),
            StageRequest::SkillGap {
                job_description,
                resume_text,
                missing_skills,
            } => service
                .analyze_skill_gap(job_description, resume_text, missing_skills)
                .await
                .map(StageOutput::SkillGap),
            StageRequest::Suggest {
                job_description,
                resume_text,
            } => service
                .suggest_improvements(job_description, resume_text)
                .await
                .map(StageOutput::Suggest),
        }
    }
}
