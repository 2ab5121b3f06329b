use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{AnalysisStore, StoreError};
use crate::inference::OutcomeInsights;
use crate::models::analysis::{
    ApplicationStatus, NewAnalysis, NewResumeVersion, ResumeVersion, SavedAnalysis,
    SavedAnalysisRow,
};

const ANALYSIS_COLUMNS: &str = "id, job_description, resume_content, match_score, \
     relevance_highlights, missing_skills, suggestions, skill_gap_analysis, status, insights, \
     created_at";

#[derive(Clone)]
pub struct PgAnalysisStore {
    pool: PgPool,
}

impl PgAnalysisStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_saved(row: SavedAnalysisRow) -> Result<SavedAnalysis, StoreError> {
    let id = row.id;
    SavedAnalysis::try_from(row).map_err(|e| StoreError::Corrupt(format!("analysis {id}: {e}")))
}

#[async_trait]
impl AnalysisStore for PgAnalysisStore {
    async fn save_analysis(&self, analysis: NewAnalysis) -> Result<SavedAnalysis, StoreError> {
        let skill_gap = analysis
            .skill_gap_analysis
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| StoreError::Corrupt(format!("skill_gap_analysis: {e}")))?;

        let row: SavedAnalysisRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO saved_analyses
                (id, job_description, resume_content, match_score, relevance_highlights,
                 missing_skills, suggestions, skill_gap_analysis, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ANALYSIS_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&analysis.job_description)
        .bind(&analysis.resume_content)
        .bind(analysis.match_score.map(i16::from))
        .bind(&analysis.relevance_highlights)
        .bind(&analysis.missing_skills)
        .bind(&analysis.suggestions)
        .bind(skill_gap)
        .bind(ApplicationStatus::default().as_str())
        .fetch_one(&self.pool)
        .await?;

        info!(analysis_id = %row.id, "analysis saved");
        to_saved(row)
    }

    async fn get_analysis(&self, id: Uuid) -> Result<SavedAnalysis, StoreError> {
        let row: Option<SavedAnalysisRow> = sqlx::query_as(&format!(
            "SELECT {ANALYSIS_COLUMNS} FROM saved_analyses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        to_saved(row.ok_or(StoreError::NotFound(id))?)
    }

    async fn list_analyses(&self) -> Result<Vec<SavedAnalysis>, StoreError> {
        let rows: Vec<SavedAnalysisRow> = sqlx::query_as(&format!(
            "SELECT {ANALYSIS_COLUMNS} FROM saved_analyses ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(to_saved).collect()
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<SavedAnalysis, StoreError> {
        let row: Option<SavedAnalysisRow> = sqlx::query_as(&format!(
            "UPDATE saved_analyses SET status = $1 WHERE id = $2 RETURNING {ANALYSIS_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or(StoreError::NotFound(id))?;
        info!(analysis_id = %id, %status, "application status updated");
        to_saved(row)
    }

    async fn save_insights(
        &self,
        id: Uuid,
        insights: OutcomeInsights,
    ) -> Result<SavedAnalysis, StoreError> {
        let value = serde_json::to_value(&insights)
            .map_err(|e| StoreError::Corrupt(format!("insights: {e}")))?;

        let row: Option<SavedAnalysisRow> = sqlx::query_as(&format!(
            "UPDATE saved_analyses SET insights = $1 WHERE id = $2 RETURNING {ANALYSIS_COLUMNS}"
        ))
        .bind(value)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or(StoreError::NotFound(id))?;
        info!(analysis_id = %id, "outcome insights saved");
        to_saved(row)
    }

    async fn save_resume_version(
        &self,
        version: NewResumeVersion,
    ) -> Result<ResumeVersion, StoreError> {
        Ok(sqlx::query_as::<_, ResumeVersion>(
            r#"
            INSERT INTO resume_versions (id, name, content, job_description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, content, job_description, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&version.name)
        .bind(&version.content)
        .bind(&version.job_description)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_resume_versions(&self) -> Result<Vec<ResumeVersion>, StoreError> {
        Ok(sqlx::query_as::<_, ResumeVersion>(
            "SELECT id, name, content, job_description, created_at \
             FROM resume_versions ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?)
    }
}
