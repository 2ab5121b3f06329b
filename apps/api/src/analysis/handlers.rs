use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::orchestrator::Observation;
use crate::analysis::rewrite::{generate_aligned, generate_fresh, RewriteReport};
use crate::analysis::session::{SessionId, SessionInputs};
use crate::analysis::simulation::{SimulationOutcome, SimulationRun};
use crate::analysis::snapshot::{Progress, SlotState};
use crate::analysis::stage::{StageId, StageOutput};
use crate::diff::{compute_diff, DiffScript, DiffStats};
use crate::errors::AppError;
use crate::inference::{AlignedResume, DocumentRef, FreshResumeProfile, OptimizationMode};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DocumentUpload {
    pub file_name: String,
    /// `data:<media type>;base64,<payload>`
    pub data_uri: String,
}

#[derive(Debug, Deserialize)]
pub struct StartAnalysisRequest {
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub resume_text: String,
    pub document: Option<DocumentUpload>,
}

#[derive(Debug, Serialize)]
pub struct StageView {
    pub stage: StageId,
    pub slot: SlotState,
    pub result: Option<StageOutput>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisView {
    pub session_id: Option<SessionId>,
    pub active: bool,
    pub complete: bool,
    pub progress: Progress,
    pub progress_label: &'static str,
    pub stages: Vec<StageView>,
}

impl From<Observation> for AnalysisView {
    fn from(observation: Observation) -> Self {
        let snapshot = &observation.snapshot;
        let stages = StageId::ALL
            .iter()
            .map(|&stage| {
                let run = snapshot.run(stage);
                StageView {
                    stage,
                    slot: snapshot.slot(stage),
                    result: run.output().cloned(),
                    started_at: run.started_at,
                    finished_at: run.finished_at,
                }
            })
            .collect();

        AnalysisView {
            session_id: snapshot.session_id(),
            active: snapshot.is_active(),
            complete: snapshot.is_complete(),
            progress: observation.progress,
            progress_label: observation.progress_label(),
            stages,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    pub candidate_resume: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RewriteRequest {
    #[serde(default)]
    pub mode: OptimizationMode,
}

#[derive(Debug, Deserialize)]
pub struct FreshResumeRequest {
    #[serde(flatten)]
    pub profile: FreshResumeProfile,
    /// Falls back to the current session's job description when blank.
    #[serde(default)]
    pub job_description: String,
}

/// Per side. The diff is quadratic in input length.
pub const MAX_DIFF_CHARS: usize = 100_000;

#[derive(Debug, Deserialize)]
pub struct DiffRequest {
    pub old_text: String,
    pub new_text: String,
}

#[derive(Debug, Serialize)]
pub struct DiffResponse {
    pub ops: DiffScript,
    pub stats: DiffStats,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analysis
pub async fn handle_start_analysis(
    State(state): State<AppState>,
    Json(req): Json<StartAnalysisRequest>,
) -> Result<(StatusCode, Json<AnalysisView>), AppError> {
    let mut inputs = SessionInputs::new(req.job_description, req.resume_text);
    if let Some(upload) = req.document {
        let document = DocumentRef::from_data_uri(&upload.file_name, &upload.data_uri)
            .map_err(|e| AppError::Validation(e.to_string()))?;
        inputs = inputs.with_document(document);
    }
    start(&state, inputs)
}

/// POST /api/v1/analysis/upload
///
/// Multipart fields: `job_description`, `resume_text`, `file`.
pub async fn handle_upload_analysis(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<AnalysisView>), AppError> {
    let mut inputs = SessionInputs::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "job_description" | "resume_text" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Unreadable field '{name}': {e}")))?;
                if name == "job_description" {
                    inputs.job_description = text;
                } else {
                    inputs.resume_text = text;
                }
            }
            "file" => {
                let file_name = field.file_name().unwrap_or("resume").to_string();
                let media_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let content: Bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Unreadable file upload: {e}")))?;
                inputs = inputs.with_document(DocumentRef::new(file_name, media_type, content));
            }
            _ => {}
        }
    }

    start(&state, inputs)
}

fn start(
    state: &AppState,
    inputs: SessionInputs,
) -> Result<(StatusCode, Json<AnalysisView>), AppError> {
    if inputs.is_blank() {
        return Err(AppError::Validation(
            "Provide a job description, resume text, or a resume document".to_string(),
        ));
    }
    state.orchestrator.start(inputs);
    Ok((
        StatusCode::ACCEPTED,
        Json(state.orchestrator.observe().into()),
    ))
}

/// GET /api/v1/analysis
pub async fn handle_get_analysis(State(state): State<AppState>) -> Json<AnalysisView> {
    Json(state.orchestrator.observe().into())
}

/// POST /api/v1/analysis/simulate
pub async fn handle_simulate(
    State(state): State<AppState>,
    Json(req): Json<SimulateRequest>,
) -> Result<Json<SimulationOutcome>, AppError> {
    let snapshot = state.orchestrator.observe().snapshot;
    let outcome = state
        .simulations
        .simulate(&snapshot, &req.candidate_resume)
        .await?;
    Ok(Json(outcome))
}

/// GET /api/v1/analysis/simulation
pub async fn handle_get_simulation(
    State(state): State<AppState>,
) -> Result<Json<SimulationRun>, AppError> {
    state
        .orchestrator
        .observe()
        .snapshot
        .session_id()
        .and_then(|id| state.simulations.latest(id))
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No simulation for the current analysis".to_string()))
}

/// POST /api/v1/analysis/rewrite
pub async fn handle_rewrite(
    State(state): State<AppState>,
    Json(req): Json<RewriteRequest>,
) -> Result<Json<RewriteReport>, AppError> {
    let snapshot = state.orchestrator.observe().snapshot;
    let report = generate_aligned(
        state.inference.as_ref(),
        &snapshot,
        req.mode,
        state.config.simulation_timeout,
    )
    .await?;
    Ok(Json(report))
}

/// POST /api/v1/resume/fresh
pub async fn handle_fresh_resume(
    State(state): State<AppState>,
    Json(req): Json<FreshResumeRequest>,
) -> Result<Json<AlignedResume>, AppError> {
    let job_description = if req.job_description.trim().is_empty() {
        state
            .orchestrator
            .observe()
            .snapshot
            .session()
            .map(|session| session.inputs.job_description.clone())
            .unwrap_or_default()
    } else {
        req.job_description
    };

    let resume = generate_fresh(
        state.inference.as_ref(),
        &req.profile,
        &job_description,
        state.config.simulation_timeout,
    )
    .await?;
    Ok(Json(resume))
}

/// POST /api/v1/diff
pub async fn handle_diff(Json(req): Json<DiffRequest>) -> Result<Json<DiffResponse>, AppError> {
    let old_len = req.old_text.chars().count();
    let new_len = req.new_text.chars().count();
    if old_len.max(new_len) > MAX_DIFF_CHARS {
        return Err(AppError::Validation(format!(
            "Each text may be at most {MAX_DIFF_CHARS} characters"
        )));
    }
    let ops = tokio::task::spawn_blocking(move || compute_diff(&req.old_text, &req.new_text))
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    let stats = ops.stats();
    info!(old_len, new_len, ops = ops.ops().len(), "diff computed");
    Ok(Json(DiffResponse { ops, stats }))
}
