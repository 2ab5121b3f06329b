//! Runs a session's stages against the inference backend.
//!
//! The current snapshot lives in a `watch` channel as `Arc<ResultSnapshot>`.
//! Every completion is merged inside one `send_if_modified` call, which also
//! marks newly eligible stages Running, so readers only ever see whole
//! transitions. Each spawned call carries the id of the session that started it;
//! completions for any other session are dropped at merge time.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::analysis::session::{Session, SessionId, SessionInputs};
use crate::analysis::snapshot::{MergeOutcome, Progress, ResultSnapshot};
use crate::analysis::stage::{StageError, StageId, StageOutput, StageRequest};
use crate::inference::{with_timeout, InferenceService};

/// A consistent read of the orchestrator's state.
#[derive(Debug, Clone)]
pub struct Observation {
    pub snapshot: Arc<ResultSnapshot>,
    pub progress: Progress,
}

impl Observation {
    pub fn progress_label(&self) -> &'static str {
        self.progress.label()
    }
}

#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    service: Arc<dyn InferenceService>,
    stage_timeout: Duration,
    snapshot: watch::Sender<Arc<ResultSnapshot>>,
    in_flight: Mutex<InFlight>,
}

#[derive(Default)]
struct InFlight {
    session: Option<SessionId>,
    tasks: Vec<AbortHandle>,
}

impl Orchestrator {
    pub fn new(service: Arc<dyn InferenceService>, stage_timeout: Duration) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(ResultSnapshot::empty()));
        Self {
            inner: Arc::new(Inner {
                service,
                stage_timeout,
                snapshot,
                in_flight: Mutex::new(InFlight::default()),
            }),
        }
    }

    /// Replaces any previous session with a fresh one and dispatches every stage
    /// that is ready on the inputs alone.
    pub fn start(&self, inputs: SessionInputs) -> SessionId {
        let session = Session::new(inputs);
        let session_id = session.id;

        let mut fresh = ResultSnapshot::for_session(session);
        let requests = fresh.advance(Utc::now());
        let stages: Vec<StageId> = requests.iter().map(StageRequest::stage).collect();

        let mut in_flight = self.lock_in_flight();
        let superseded = in_flight.tasks.len();
        for task in in_flight.tasks.drain(..) {
            task.abort();
        }
        in_flight.session = Some(session_id);
        self.inner.snapshot.send_replace(Arc::new(fresh));
        self.spawn_stages(&mut in_flight, session_id, requests);
        drop(in_flight);

        info!(%session_id, ?stages, superseded, "analysis session started");
        session_id
    }

    pub fn observe(&self) -> Observation {
        let snapshot = Arc::clone(&self.inner.snapshot.borrow());
        let progress = snapshot.progress();
        Observation { snapshot, progress }
    }

    pub fn is_active(&self) -> bool {
        self.inner.snapshot.borrow().is_active()
    }

    /// Change notifications; each value is a complete snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ResultSnapshot>> {
        self.inner.snapshot.subscribe()
    }

    /// Resolves with the first snapshot in which no stage is Running.
    pub async fn wait_until_idle(&self) -> Arc<ResultSnapshot> {
        let mut rx = self.subscribe();
        let idle = match rx.wait_for(|snapshot| !snapshot.is_active()).await {
            Ok(snapshot) => Some(Arc::clone(&snapshot)),
            Err(_) => None,
        };
        idle.unwrap_or_else(|| self.observe().snapshot)
    }

    fn spawn_stages(
        &self,
        in_flight: &mut InFlight,
        session_id: SessionId,
        requests: Vec<StageRequest>,
    ) {
        if in_flight.session != Some(session_id) {
            return;
        }
        in_flight.tasks.retain(|task| !task.is_finished());
        for request in requests {
            let this = self.clone();
            let task = tokio::spawn(async move { this.run_stage(session_id, request).await });
            in_flight.tasks.push(task.abort_handle());
        }
    }

    async fn run_stage(&self, session_id: SessionId, request: StageRequest) {
        let stage = request.stage();
        let timeout = self.inner.stage_timeout;
        debug!(%session_id, %stage, "dispatching stage");

        let call = request.dispatch(self.inner.service.as_ref());
        let result = with_timeout(timeout, call).await;

        if let Err(err) = &result {
            warn!(%session_id, %stage, error = %err, "stage failed");
        }
        self.complete(session_id, stage, result.map_err(StageError::from));
    }

    fn complete(
        &self,
        session_id: SessionId,
        stage: StageId,
        result: Result<StageOutput, StageError>,
    ) {
        let mut outcome = MergeOutcome::Stale;
        self.inner.snapshot.send_if_modified(|current| {
            if !current.is_current(session_id) {
                return false;
            }
            outcome = Arc::make_mut(current).merge(session_id, stage, result, Utc::now());
            matches!(outcome, MergeOutcome::Applied(_))
        });

        match outcome {
            MergeOutcome::Stale => {
                debug!(%session_id, %stage, "discarding result from superseded session")
            }
            MergeOutcome::Ignored => debug!(%session_id, %stage, "stage already finished"),
            MergeOutcome::Applied(next) => {
                if !next.is_empty() {
                    debug!(%session_id, %stage, unlocked = next.len(), "dependent stages unlocked");
                }
                let mut in_flight = self.lock_in_flight();
                self.spawn_stages(&mut in_flight, session_id, next);
            }
        }
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, InFlight> {
        // Only abort handles live behind this lock; a poisoned guard is still usable.
        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::snapshot::SlotState;
    use crate::analysis::stage::{StageErrorKind, StageStatus};
    use crate::inference::fake::{match_analysis, FakeInference, Op};
    use crate::inference::{DocumentRef, InferenceError};
    use bytes::Bytes;

    const JD: &str = "Senior Go engineer, gRPC, Kubernetes";
    const RESUME: &str = "5 years backend engineer, Python, Docker";

    fn orchestrator(fake: &Arc<FakeInference>) -> Orchestrator {
        Orchestrator::new(fake.clone(), Duration::from_secs(30))
    }

    fn text_inputs() -> SessionInputs {
        SessionInputs::new(JD, RESUME)
    }

    #[tokio::test]
    async fn test_missing_skills_run_skill_gap() {
        let fake = Arc::new(FakeInference::new());
        let orch = orchestrator(&fake);

        orch.start(text_inputs());
        let snap = orch.wait_until_idle().await;

        assert_eq!(snap.status(StageId::Match), StageStatus::Succeeded);
        assert_eq!(
            snap.match_analysis().unwrap().missing_skills,
            vec!["Go", "gRPC", "Kubernetes"]
        );
        assert_eq!(snap.status(StageId::SkillGap), StageStatus::Succeeded);
        assert_eq!(snap.skill_gap().unwrap().per_skill.len(), 3);
        assert_eq!(snap.status(StageId::Suggest), StageStatus::Succeeded);
        assert_eq!(fake.calls(Op::SkillGap), 1);
        assert_eq!(fake.calls(Op::Parse), 0);
        assert!(!orch.is_active());
    }

    #[tokio::test]
    async fn test_full_overlap_skips_skill_gap() {
        let fake = Arc::new(FakeInference::new());
        fake.set_score(Ok(match_analysis(100, &[])));
        let orch = orchestrator(&fake);

        orch.start(SessionInputs::new(JD, JD));
        let snap = orch.wait_until_idle().await;

        assert_eq!(snap.status(StageId::SkillGap), StageStatus::Skipped);
        assert_eq!(fake.calls(Op::SkillGap), 0);
        assert!(snap.is_complete());
    }

    #[tokio::test]
    async fn test_failed_match_blocks_only_its_dependent() {
        let fake = Arc::new(FakeInference::new());
        fake.set_score(Err(InferenceError::Upstream("model overloaded".to_string())));
        let orch = orchestrator(&fake);

        orch.start(text_inputs());
        let snap = orch.wait_until_idle().await;

        assert_eq!(snap.status(StageId::Match), StageStatus::Failed);
        assert_eq!(snap.status(StageId::SkillGap), StageStatus::NotStarted);
        assert_eq!(
            snap.slot(StageId::SkillGap),
            SlotState::Blocked {
                upstream: StageId::Match
            }
        );
        assert_eq!(snap.status(StageId::Suggest), StageStatus::Succeeded);
        assert_eq!(fake.calls(Op::SkillGap), 0);
        assert!(!snap.is_complete());
    }

    #[tokio::test]
    async fn test_suggest_failure_does_not_touch_match_chain() {
        let fake = Arc::new(FakeInference::new());
        fake.set_suggest(Err(InferenceError::Malformed("not json".to_string())));
        let orch = orchestrator(&fake);

        orch.start(text_inputs());
        let snap = orch.wait_until_idle().await;

        assert_eq!(snap.status(StageId::Suggest), StageStatus::Failed);
        assert_eq!(
            snap.run(StageId::Suggest).error().unwrap().kind,
            StageErrorKind::Malformed
        );
        assert_eq!(snap.status(StageId::Match), StageStatus::Succeeded);
        assert_eq!(snap.status(StageId::SkillGap), StageStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_restart_shows_only_second_session() {
        let fake = Arc::new(FakeInference::new());
        fake.hold(Op::Match);
        fake.hold(Op::Suggest);
        let orch = orchestrator(&fake);

        let first = orch.start(SessionInputs::new("Frontend engineer, React", "Designer"));
        let second = orch.start(text_inputs());
        fake.release(Op::Match, 2);
        fake.release(Op::Suggest, 2);
        let snap = orch.wait_until_idle().await;

        assert_ne!(first, second);
        assert_eq!(snap.session_id(), Some(second));
        assert_eq!(snap.session().unwrap().inputs.job_description, JD);
        assert_eq!(fake.scored_resumes(), vec![RESUME.to_string()]);
        assert_eq!(snap.status(StageId::Match), StageStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_stale_completion_is_discarded() {
        let fake = Arc::new(FakeInference::new());
        fake.hold(Op::Match);
        fake.hold(Op::Suggest);
        let orch = orchestrator(&fake);

        let first = orch.start(text_inputs());
        orch.start(text_inputs());
        let before = orch.observe().snapshot;

        orch.complete(first, StageId::Match, Ok(StageOutput::Match(match_analysis(99, &[]))));

        let after = orch.observe().snapshot;
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.status(StageId::Match), StageStatus::Running);
    }

    #[tokio::test]
    async fn test_concurrent_results_never_lost() {
        let fake = Arc::new(FakeInference::new());
        fake.set_score(Ok(match_analysis(100, &[])));
        fake.hold(Op::Match);
        fake.hold(Op::Suggest);
        let orch = orchestrator(&fake);
        let mut rx = orch.subscribe();

        orch.start(text_inputs());
        fake.release(Op::Suggest, 1);
        fake.release(Op::Match, 1);

        let mut match_done = false;
        let mut suggest_done = false;
        loop {
            let snap = Arc::clone(&rx.borrow_and_update());
            if snap.session().is_some() {
                let m = snap.status(StageId::Match) == StageStatus::Succeeded;
                let s = snap.status(StageId::Suggest) == StageStatus::Succeeded;
                assert!(m || !match_done, "match result disappeared");
                assert!(s || !suggest_done, "suggest result disappeared");
                match_done = m;
                suggest_done = s;
                if !snap.is_active() {
                    break;
                }
            }
            rx.changed().await.unwrap();
        }

        assert!(match_done && suggest_done);
        let snap = orch.observe().snapshot;
        assert!(snap.match_analysis().is_some());
        assert!(snap.suggestions().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fails_stage() {
        let fake = Arc::new(FakeInference::new());
        fake.hold(Op::Suggest);
        let orch = Orchestrator::new(fake.clone(), Duration::from_millis(750));

        orch.start(text_inputs());
        let snap = orch.wait_until_idle().await;

        let error = snap.run(StageId::Suggest).error().unwrap();
        assert_eq!(error.kind, StageErrorKind::Timeout);
        assert_eq!(error.message, "timed out after 750ms");
        assert_eq!(snap.status(StageId::Match), StageStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_single_stage_progress_label() {
        let fake = Arc::new(FakeInference::new());
        fake.hold(Op::Parse);
        let orch = orchestrator(&fake);

        let document = DocumentRef::new("cv.txt", "text/plain", Bytes::from_static(b"Python"));
        orch.start(SessionInputs::new(JD, "").with_document(document));

        let observation = orch.observe();
        assert_eq!(observation.progress, Progress::Stage(StageId::Parse));
        assert_eq!(observation.progress_label(), "Parsing your resume...");

        fake.release(Op::Parse, 1);
        let snap = orch.wait_until_idle().await;

        assert_eq!(snap.status(StageId::Parse), StageStatus::Succeeded);
        assert_eq!(snap.status(StageId::Match), StageStatus::Succeeded);
        assert_eq!(snap.slot(StageId::Suggest), SlotState::InputMissing);
        assert!(fake.scored_resumes()[0].contains("Skills: Python, Docker"));
        assert_eq!(orch.observe().progress, Progress::Idle);
    }

    #[tokio::test]
    async fn test_generic_label_when_several_running() {
        let fake = Arc::new(FakeInference::new());
        fake.hold(Op::Match);
        fake.hold(Op::Suggest);
        let orch = orchestrator(&fake);

        orch.start(text_inputs());
        assert!(orch.is_active());
        assert_eq!(orch.observe().progress_label(), "Analyzing...");

        fake.release(Op::Match, 1);
        fake.release(Op::Suggest, 1);
        orch.wait_until_idle().await;
        assert!(!orch.is_active());
    }

    #[tokio::test]
    async fn test_blank_inputs_stay_idle() {
        let fake = Arc::new(FakeInference::new());
        let orch = orchestrator(&fake);

        orch.start(SessionInputs::default());
        assert!(!orch.is_active());
        let snap = orch.wait_until_idle().await;
        for stage in StageId::ALL {
            assert_eq!(snap.slot(stage), SlotState::InputMissing);
        }
        assert_eq!(fake.calls(Op::Match), 0);
    }
}
