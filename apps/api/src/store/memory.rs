//! In-process `AnalysisStore` for router tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{AnalysisStore, StoreError};
use crate::inference::OutcomeInsights;
use crate::models::analysis::{
    ApplicationStatus, NewAnalysis, NewResumeVersion, ResumeVersion, SavedAnalysis,
};

#[derive(Default)]
pub struct MemoryAnalysisStore {
    analyses: Mutex<Vec<SavedAnalysis>>,
    versions: Mutex<Vec<ResumeVersion>>,
}

#[async_trait]
impl AnalysisStore for MemoryAnalysisStore {
    async fn save_analysis(&self, analysis: NewAnalysis) -> Result<SavedAnalysis, StoreError> {
        let saved = SavedAnalysis::new(Uuid::new_v4(), analysis, Utc::now());
        self.analyses.lock().unwrap().push(saved.clone());
        Ok(saved)
    }

    async fn get_analysis(&self, id: Uuid) -> Result<SavedAnalysis, StoreError> {
        self.analyses
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn list_analyses(&self) -> Result<Vec<SavedAnalysis>, StoreError> {
        Ok(self.analyses.lock().unwrap().iter().rev().cloned().collect())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<SavedAnalysis, StoreError> {
        let mut analyses = self.analyses.lock().unwrap();
        let saved = analyses
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound(id))?;
        saved.status = status;
        Ok(saved.clone())
    }

    async fn save_insights(
        &self,
        id: Uuid,
        insights: OutcomeInsights,
    ) -> Result<SavedAnalysis, StoreError> {
        let mut analyses = self.analyses.lock().unwrap();
        let saved = analyses
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound(id))?;
        saved.insights = Some(insights);
        Ok(saved.clone())
    }

    async fn save_resume_version(
        &self,
        version: NewResumeVersion,
    ) -> Result<ResumeVersion, StoreError> {
        let saved = ResumeVersion {
            id: Uuid::new_v4(),
            name: version.name,
            content: version.content,
            job_description: version.job_description,
            created_at: Utc::now(),
        };
        self.versions.lock().unwrap().push(saved.clone());
        Ok(saved)
    }

    async fn list_resume_versions(&self) -> Result<Vec<ResumeVersion>, StoreError> {
        Ok(self.versions.lock().unwrap().iter().rev().cloned().collect())
    }
}
