use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::analysis::{
    ApplicationStatus, NewAnalysis, NewResumeVersion, ResumeVersion, SavedAnalysis,
};
use crate::state::AppState;
use crate::store::insights::record_insights;

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ApplicationStatus,
}

/// POST /api/v1/analyses
///
/// Saves the current analysis session, including any slots still empty.
pub async fn handle_save_analysis(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SavedAnalysis>), AppError> {
    let snapshot = state.orchestrator.observe().snapshot;
    let analysis = NewAnalysis::from_snapshot(&snapshot).ok_or_else(|| {
        AppError::PreconditionFailed("No analysis session to save".to_string())
    })?;
    let saved = state.store.save_analysis(analysis).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// GET /api/v1/analyses
pub async fn handle_list_analyses(
    State(state): State<AppState>,
) -> Result<Json<Vec<SavedAnalysis>>, AppError> {
    Ok(Json(state.store.list_analyses().await?))
}

/// GET /api/v1/analyses/:id
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SavedAnalysis>, AppError> {
    Ok(Json(state.store.get_analysis(id).await?))
}

/// PATCH /api/v1/analyses/:id/status
///
/// Moving to an outcome (offer or rejected) also generates insights. The status
/// change stands even when that generation fails.
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<SavedAnalysis>, AppError> {
    let updated = state.store.update_status(id, req.status).await?;
    if !updated.status.is_terminal() {
        return Ok(Json(updated));
    }

    let recorded = record_insights(
        state.inference.as_ref(),
        state.store.as_ref(),
        &updated,
        state.config.simulation_timeout,
    )
    .await;
    match recorded {
        Ok(with_insights) => Ok(Json(with_insights)),
        Err(e) => {
            warn!(analysis_id = %id, status = %updated.status, "insight generation failed: {e}");
            Ok(Json(updated))
        }
    }
}

/// POST /api/v1/analyses/:id/insights
///
/// Regenerates insights for the analysis at its current status.
pub async fn handle_generate_insights(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SavedAnalysis>, AppError> {
    let analysis = state.store.get_analysis(id).await?;
    let updated = record_insights(
        state.inference.as_ref(),
        state.store.as_ref(),
        &analysis,
        state.config.simulation_timeout,
    )
    .await?;
    Ok(Json(updated))
}

/// POST /api/v1/resume-versions
pub async fn handle_save_resume_version(
    State(state): State<AppState>,
    Json(req): Json<NewResumeVersion>,
) -> Result<(StatusCode, Json<ResumeVersion>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    if req.content.trim().is_empty() {
        return Err(AppError::Validation("content is required".to_string()));
    }
    let saved = state.store.save_resume_version(req).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// GET /api/v1/resume-versions
pub async fn handle_list_resume_versions(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResumeVersion>>, AppError> {
    Ok(Json(state.store.list_resume_versions().await?))
}
