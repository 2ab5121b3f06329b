//! The merged, externally observable state of one session.
//!
//! Only the orchestrator mutates a snapshot, and only through `advance` and
//! `merge`, each of which applies one complete state transition. Readers receive
//! `Arc<ResultSnapshot>` values that never change after publication.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analysis::registry;
use crate::analysis::session::{Session, SessionId};
use crate::analysis::stage::{
    RunState, StageError, StageId, StageOutput, StageRequest, StageRun, StageStatus,
};
use crate::inference::{MatchAnalysis, ParsedResume, SkillGapAnalysis, Suggestions};

const GENERIC_PROGRESS_LABEL: &str = "Analyzing...";
const IDLE_PROGRESS_LABEL: &str = "Idle";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSnapshot {
    session: Option<Session>,
    runs: BTreeMap<StageId, StageRun>,
}

/// How a consumer should present one stage's slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SlotState {
    /// No session has been started.
    Idle,
    /// Not started yet, but an upstream stage is still working.
    Pending,
    Running,
    Succeeded,
    Failed { error: StageError },
    /// Upstream found nothing for this stage to do.
    Skipped,
    /// Will never run because an upstream stage failed.
    Blocked { upstream: StageId },
    /// Will never run because the session lacks the inputs it needs.
    InputMissing,
}

/// Human-readable progress derived from the running stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Progress {
    Idle,
    Stage(StageId),
    Several(usize),
}

impl Progress {
    pub fn label(&self) -> &'static str {
        match self {
            Progress::Idle => IDLE_PROGRESS_LABEL,
            Progress::Stage(stage) => registry::stage(*stage).progress_label,
            Progress::Several(_) => GENERIC_PROGRESS_LABEL,
        }
    }
}

/// Result of offering a stage completion to the snapshot.
#[derive(Debug)]
pub(crate) enum MergeOutcome {
    /// The completion belongs to a superseded session.
    Stale,
    /// The run was not Running (already terminal); nothing changed.
    Ignored,
    /// Merged; these stages became eligible and are now Running.
    Applied(Vec<StageRequest>),
}

enum Decision {
    Skip(StageId),
    Run(StageRequest),
}

impl Default for ResultSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl ResultSnapshot {
    /// Snapshot with no session: every slot empty.
    pub fn empty() -> Self {
        Self {
            session: None,
            runs: StageId::ALL
                .iter()
                .map(|&stage| (stage, StageRun::new(stage)))
                .collect(),
        }
    }

    /// Fresh snapshot for a new session; all runs NotStarted.
    pub fn for_session(session: Session) -> Self {
        Self {
            session: Some(session),
            ..Self::empty()
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn run(&self, stage: StageId) -> &StageRun {
        &self.runs[&stage]
    }

    pub fn runs(&self) -> impl Iterator<Item = &StageRun> {
        self.runs.values()
    }

    pub fn status(&self, stage: StageId) -> StageStatus {
        self.run(stage).status()
    }

    pub fn is_active(&self) -> bool {
        self.runs.values().any(|r| r.status() == StageStatus::Running)
    }

    /// Every run reached Succeeded, Failed or Skipped.
    pub fn is_complete(&self) -> bool {
        self.session.is_some() && self.runs.values().all(|r| r.status().is_terminal())
    }

    pub fn progress(&self) -> Progress {
        let running: Vec<StageId> = self
            .runs
            .values()
            .filter(|r| r.status() == StageStatus::Running)
            .map(|r| r.stage)
            .collect();
        match running.as_slice() {
            [] => Progress::Idle,
            [only] => Progress::Stage(*only),
            several => Progress::Several(several.len()),
        }
    }

    pub fn parsed_resume(&self) -> Option<&ParsedResume> {
        match self.run(StageId::Parse).output() {
            Some(StageOutput::Parse(parsed)) => Some(parsed),
            _ => None,
        }
    }

    pub fn match_analysis(&self) -> Option<&MatchAnalysis> {
        match self.run(StageId::Match).output() {
            Some(StageOutput::Match(analysis)) => Some(analysis),
            _ => None,
        }
    }

    pub fn skill_gap(&self) -> Option<&SkillGapAnalysis> {
        match self.run(StageId::SkillGap).output() {
            Some(StageOutput::SkillGap(analysis)) => Some(analysis),
            _ => None,
        }
    }

    pub fn suggestions(&self) -> Option<&Suggestions> {
        match self.run(StageId::Suggest).output() {
            Some(StageOutput::Suggest(suggestions)) => Some(suggestions),
            _ => None,
        }
    }

    /// Presentation state of a slot, separating "still coming" from
    /// "blocked upstream" and "missing input".
    pub fn slot(&self, stage: StageId) -> SlotState {
        if self.session.is_none() {
            return SlotState::Idle;
        }
        match &self.run(stage).state {
            RunState::Running => SlotState::Running,
            RunState::Succeeded { .. } => SlotState::Succeeded,
            RunState::Skipped => SlotState::Skipped,
            RunState::Failed { error } => SlotState::Failed {
                error: error.clone(),
            },
            RunState::NotStarted => self.not_started_slot(stage),
        }
    }

    fn not_started_slot(&self, stage: StageId) -> SlotState {
        let depends_on = registry::stage(stage).depends_on;

        for &dep in depends_on {
            match self.status(dep) {
                StageStatus::Failed => return SlotState::Blocked { upstream: dep },
                StageStatus::NotStarted => {
                    if let SlotState::Blocked { upstream } = self.not_started_slot(dep) {
                        return SlotState::Blocked { upstream };
                    }
                }
                _ => {}
            }
        }

        let upstream_pending = depends_on.iter().any(|&dep| match self.status(dep) {
            StageStatus::Running => true,
            StageStatus::NotStarted => self.not_started_slot(dep) == SlotState::Pending,
            _ => false,
        });
        if upstream_pending {
            SlotState::Pending
        } else {
            SlotState::InputMissing
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Transitions (orchestrator only)
    // ────────────────────────────────────────────────────────────────────

    /// Skips or starts every NotStarted stage whose predicate now holds and
    /// returns the requests to dispatch. Repeats until nothing changes, so a skip
    /// that unlocks another stage is handled in the same transition.
    pub(crate) fn advance(&mut self, now: DateTime<Utc>) -> Vec<StageRequest> {
        let mut dispatched = Vec::new();
        loop {
            let decisions = self.decide();
            if decisions.is_empty() {
                break;
            }
            for decision in decisions {
                match decision {
                    Decision::Skip(stage) => self.run_mut(stage).mark_skipped(now),
                    Decision::Run(request) => {
                        self.run_mut(request.stage()).mark_running(now);
                        dispatched.push(request);
                    }
                }
            }
        }
        dispatched
    }

    /// Applies one stage completion and advances dependents, atomically.
    pub(crate) fn merge(
        &mut self,
        session_id: SessionId,
        stage: StageId,
        result: Result<StageOutput, StageError>,
        now: DateTime<Utc>,
    ) -> MergeOutcome {
        if self.session_id() != Some(session_id) {
            return MergeOutcome::Stale;
        }
        if !self.run_mut(stage).finish(result, now) {
            return MergeOutcome::Ignored;
        }
        MergeOutcome::Applied(self.advance(now))
    }

    pub(crate) fn is_current(&self, session_id: SessionId) -> bool {
        self.session_id() == Some(session_id)
    }

    fn decide(&self) -> Vec<Decision> {
        let Some(session) = &self.session else {
            return Vec::new();
        };
        let inputs = &session.inputs;

        registry::stages()
            .iter()
            .filter(|stage| self.status(stage.id) == StageStatus::NotStarted)
            .filter_map(|stage| {
                if (stage.skip)(inputs, self) {
                    Some(Decision::Skip(stage.id))
                } else if (stage.ready)(inputs, self) {
                    (stage.prepare)(inputs, self).map(Decision::Run)
                } else {
                    None
                }
            })
            .collect()
    }

    fn run_mut(&mut self, stage: StageId) -> &mut StageRun {
        self.runs
            .entry(stage)
            .or_insert_with(|| StageRun::new(stage))
    }
}
