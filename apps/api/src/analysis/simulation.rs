//! "What-if" re-scoring of an edited résumé against the current session's job
//! description.
//!
//! Runs outside the stage pipeline. The caller hands over the snapshot it wants
//! compared against; the runner only reads the session inputs and the match
//! score from it. A newer `simulate` call supersedes an older one: the older
//! call returns `SimulationError::Superseded` and its score is never recorded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analysis::session::SessionId;
use crate::analysis::snapshot::ResultSnapshot;
use crate::inference::{with_timeout, InferenceError, InferenceService, MatchAnalysis};

#[derive(Debug, Error)]
pub enum SimulationError {
    /// Called without any analysis session. Caller bug.
    #[error("no analysis session has been started")]
    NoSession,

    #[error("no baseline score yet: the match stage has not succeeded for this session")]
    Precondition,

    #[error("candidate resume is empty")]
    EmptyCandidate,

    #[error("superseded by a newer simulation")]
    Superseded,

    #[error("simulation failed: {0}")]
    Inference(#[from] InferenceError),
}

/// The score a simulation is compared against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchBaseline {
    pub session_id: SessionId,
    pub job_description: String,
    pub score: u8,
}

impl MatchBaseline {
    pub fn from_snapshot(snapshot: &ResultSnapshot) -> Result<Self, SimulationError> {
        let session = snapshot.session().ok_or(SimulationError::NoSession)?;
        let analysis = snapshot
            .match_analysis()
            .ok_or(SimulationError::Precondition)?;
        Ok(Self {
            session_id: session.id,
            job_description: session.inputs.job_description.clone(),
            score: analysis.score,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationStatus {
    Running,
    Succeeded,
    Failed,
}

/// The most recent simulation. Replaced wholesale by each new request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationRun {
    pub session_id: SessionId,
    pub candidate: String,
    pub status: SimulationStatus,
    pub baseline_score: u8,
    pub score: Option<u8>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationOutcome {
    pub baseline_score: u8,
    pub score: u8,
    /// `score - baseline_score`.
    pub delta: i16,
    pub analysis: MatchAnalysis,
}

pub struct SimulationRunner {
    service: Arc<dyn InferenceService>,
    timeout: Duration,
    generation: AtomicU64,
    latest: RwLock<Option<(u64, SimulationRun)>>,
}

impl SimulationRunner {
    pub fn new(service: Arc<dyn InferenceService>, timeout: Duration) -> Self {
        Self {
            service,
            timeout,
            generation: AtomicU64::new(0),
            latest: RwLock::new(None),
        }
    }

    /// Re-scores `candidate` against the snapshot's job description.
    ///
    /// Fails with `Precondition` without calling the backend unless the
    /// snapshot holds a Succeeded match.
    pub async fn simulate(
        &self,
        snapshot: &ResultSnapshot,
        candidate: &str,
    ) -> Result<SimulationOutcome, SimulationError> {
        let baseline = MatchBaseline::from_snapshot(snapshot)?;
        if candidate.trim().is_empty() {
            return Err(SimulationError::EmptyCandidate);
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let session_id = baseline.session_id;
        self.store(
            generation,
            SimulationRun {
                session_id,
                candidate: candidate.to_string(),
                status: SimulationStatus::Running,
                baseline_score: baseline.score,
                score: None,
                error: None,
                started_at: Utc::now(),
                finished_at: None,
            },
        );
        debug!(%session_id, generation, "simulation dispatched");

        let call = self
            .service
            .score_match(&baseline.job_description, candidate);
        let result = with_timeout(self.timeout, call).await;

        let recorded = self.update(generation, |run| {
            run.finished_at = Some(Utc::now());
            match &result {
                Ok(analysis) => {
                    run.status = SimulationStatus::Succeeded;
                    run.score = Some(analysis.score);
                }
                Err(err) => {
                    run.status = SimulationStatus::Failed;
                    run.error = Some(err.to_string());
                }
            }
        });
        if !recorded {
            debug!(%session_id, generation, "discarding superseded simulation");
            return Err(SimulationError::Superseded);
        }

        let analysis = result.inspect_err(|err| {
            warn!(%session_id, error = %err, "simulation failed");
        })?;
        let delta = i16::from(analysis.score) - i16::from(baseline.score);
        info!(
            %session_id,
            baseline = baseline.score,
            score = analysis.score,
            delta,
            "simulation finished"
        );

        Ok(SimulationOutcome {
            baseline_score: baseline.score,
            score: analysis.score,
            delta,
            analysis,
        })
    }

    /// The latest simulation for `session_id`, if any.
    pub fn latest(&self, session_id: SessionId) -> Option<SimulationRun> {
        let latest = self.latest.read().unwrap_or_else(|p| p.into_inner());
        latest
            .as_ref()
            .map(|(_, run)| run)
            .filter(|run| run.session_id == session_id)
            .cloned()
    }

    fn store(&self, generation: u64, run: SimulationRun) {
        let mut latest = self.latest.write().unwrap_or_else(|p| p.into_inner());
        *latest = Some((generation, run));
    }

    /// Applies `f` only if `generation` is still the newest request.
    fn update(&self, generation: u64, f: impl FnOnce(&mut SimulationRun)) -> bool {
        let mut latest = self.latest.write().unwrap_or_else(|p| p.into_inner());
        match latest.as_mut() {
            Some((current, run)) if *current == generation => {
                f(run);
                true
            }
            _ => false,
        }
    }
}
