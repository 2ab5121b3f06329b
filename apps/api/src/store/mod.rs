//! Persistence of saved analyses and résumé versions.
//!
//! Handlers only see `Arc<dyn AnalysisStore>`; `PgAnalysisStore` is the
//! production implementation.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::inference::OutcomeInsights;
use crate::models::analysis::{
    ApplicationStatus, NewAnalysis, NewResumeVersion, ResumeVersion, SavedAnalysis,
};

pub mod handlers;
pub mod insights;
#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgAnalysisStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record {0} not found")]
    NotFound(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn save_analysis(&self, analysis: NewAnalysis) -> Result<SavedAnalysis, StoreError>;

    async fn get_analysis(&self, id: Uuid) -> Result<SavedAnalysis, StoreError>;

    /// Newest first.
    async fn list_analyses(&self) -> Result<Vec<SavedAnalysis>, StoreError>;

    async fn update_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<SavedAnalysis, StoreError>;

    /// Replaces any insights stored earlier.
    async fn save_insights(
        &self,
        id: Uuid,
        insights: OutcomeInsights,
    ) -> Result<SavedAnalysis, StoreError>;

    async fn save_resume_version(
        &self,
        version: NewResumeVersion,
    ) -> Result<ResumeVersion, StoreError>;

    /// Newest first.
    async fn list_resume_versions(&self) -> Result<Vec<ResumeVersion>, StoreError>;
}
