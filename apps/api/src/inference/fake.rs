//! Scripted `InferenceService` for tests.
//!
//! Each operation answers from a queue of canned results (falling back to a
//! default once the queue is empty), counts its calls, and can be gated so calls
//! park until the test releases them.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use super::{
    AlignRequest, AlignedResume, DocumentRef, FreshResumeProfile, InferenceError,
    InferenceService, InsightRequest, LearningLevel, LearningStep, MatchAnalysis,
    OutcomeInsights, ParsedResume, SkillGap, SkillGapAnalysis, Suggestions,
};
use crate::models::analysis::ApplicationStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Parse,
    Match,
    SkillGap,
    Suggest,
    Align,
    Fresh,
    Insights,
}

struct Gate {
    gated: AtomicBool,
    permits: Semaphore,
    calls: AtomicUsize,
}

impl Gate {
    fn new() -> Self {
        Self {
            gated: AtomicBool::new(false),
            permits: Semaphore::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    async fn pass(&self) -> Result<(), InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.gated.load(Ordering::SeqCst) {
            let permit = self
                .permits
                .acquire()
                .await
                .map_err(|_| InferenceError::Upstream("gate closed".to_string()))?;
            permit.forget();
        }
        Ok(())
    }
}

struct Script<T> {
    gate: Gate,
    queued: Mutex<VecDeque<Result<T, InferenceError>>>,
    fallback: Mutex<Result<T, InferenceError>>,
}

impl<T: Clone> Script<T> {
    fn new(fallback: Result<T, InferenceError>) -> Self {
        Self {
            gate: Gate::new(),
            queued: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(fallback),
        }
    }

    async fn respond(&self) -> Result<T, InferenceError> {
        self.gate.pass().await?;
        let next = self.queued.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.lock().unwrap().clone())
    }

    fn set(&self, result: Result<T, InferenceError>) {
        *self.fallback.lock().unwrap() = result;
    }

    fn push(&self, result: Result<T, InferenceError>) {
        self.queued.lock().unwrap().push_back(result);
    }
}

pub struct FakeInference {
    parse: Script<ParsedResume>,
    score: Script<MatchAnalysis>,
    skill_gap: Script<SkillGapAnalysis>,
    suggest: Script<Suggestions>,
    align: Script<AlignedResume>,
    fresh: Script<AlignedResume>,
    insights: Script<OutcomeInsights>,
    scored_resumes: Mutex<Vec<String>>,
    insight_outcomes: Mutex<Vec<ApplicationStatus>>,
}

impl Default for FakeInference {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeInference {
    /// Every operation succeeds; `score_match` reports three missing skills.
    pub fn new() -> Self {
        Self {
            parse: Script::new(Ok(parsed_resume())),
            score: Script::new(Ok(match_analysis(40, &["Go", "gRPC", "Kubernetes"]))),
            skill_gap: Script::new(Ok(skill_gap_analysis(&["Go", "gRPC", "Kubernetes"]))),
            suggest: Script::new(Ok(Suggestions {
                suggestion_text: "Lead with measurable backend impact.".to_string(),
            })),
            align: Script::new(Ok(AlignedResume {
                generated_text: "5 years backend engineer, Go, gRPC, Kubernetes, Python, Docker"
                    .to_string(),
                improvement_summary: "Surfaced Go and Kubernetes experience.".to_string(),
            })),
            fresh: Script::new(Ok(AlignedResume {
                generated_text: "Jane Doe\nBackend Engineer\n\nSkills: Go, PostgreSQL".to_string(),
                improvement_summary: "Led with a summary aimed at the target role.".to_string(),
            })),
            insights: Script::new(Ok(outcome_insights())),
            scored_resumes: Mutex::new(Vec::new()),
            insight_outcomes: Mutex::new(Vec::new()),
        }
    }

    pub fn set_parse(&self, result: Result<ParsedResume, InferenceError>) {
        self.parse.set(result);
    }

    pub fn set_score(&self, result: Result<MatchAnalysis, InferenceError>) {
        self.score.set(result);
    }

    /// Queues a one-shot `score_match` answer ahead of the default.
    pub fn push_score(&self, result: Result<MatchAnalysis, InferenceError>) {
        self.score.push(result);
    }

    pub fn set_skill_gap(&self, result: Result<SkillGapAnalysis, InferenceError>) {
        self.skill_gap.set(result);
    }

    pub fn set_suggest(&self, result: Result<Suggestions, InferenceError>) {
        self.suggest.set(result);
    }

    pub fn set_align(&self, result: Result<AlignedResume, InferenceError>) {
        self.align.set(result);
    }

    pub fn set_insights(&self, result: Result<OutcomeInsights, InferenceError>) {
        self.insights.set(result);
    }

    /// Parks future calls of `op` until `release` hands out permits.
    pub fn hold(&self, op: Op) {
        self.gate(op).gated.store(true, Ordering::SeqCst);
    }

    pub fn release(&self, op: Op, calls: usize) {
        self.gate(op).permits.add_permits(calls);
    }

    pub fn calls(&self, op: Op) -> usize {
        self.gate(op).calls.load(Ordering::SeqCst)
    }

    /// Résumé texts passed to `score_match`, in call order.
    pub fn scored_resumes(&self) -> Vec<String> {
        self.scored_resumes.lock().unwrap().clone()
    }

    /// Outcomes passed to `generate_insights`, in call order.
    pub fn insight_outcomes(&self) -> Vec<ApplicationStatus> {
        self.insight_outcomes.lock().unwrap().clone()
    }

    fn gate(&self, op: Op) -> &Gate {
        match op {
            Op::Parse => &self.parse.gate,
            Op::Match => &self.score.gate,
            Op::SkillGap => &self.skill_gap.gate,
            Op::Suggest => &self.suggest.gate,
            Op::Align => &self.align.gate,
            Op::Fresh => &self.fresh.gate,
            Op::Insights => &self.insights.gate,
        }
    }
}

#[async_trait]
impl InferenceService for FakeInference {
    async fn parse_document(&self, _document: &DocumentRef) -> Result<ParsedResume, InferenceError> {
        self.parse.respond().await
    }

    async fn score_match(
        &self,
        _job_description: &str,
        resume_text: &str,
    ) -> Result<MatchAnalysis, InferenceError> {
        self.scored_resumes
            .lock()
            .unwrap()
            .push(resume_text.to_string());
        self.score.respond().await
    }

    async fn analyze_skill_gap(
        &self,
        _job_description: &str,
        _resume_text: &str,
        _missing_skills: &[String],
    ) -> Result<SkillGapAnalysis, InferenceError> {
        self.skill_gap.respond().await
    }

    async fn suggest_improvements(
        &self,
        _job_description: &str,
        _resume_text: &str,
    ) -> Result<Suggestions, InferenceError> {
        self.suggest.respond().await
    }

    async fn generate_aligned_resume(
        &self,
        _request: AlignRequest<'_>,
    ) -> Result<AlignedResume, InferenceError> {
        self.align.respond().await
    }

    async fn generate_fresh_resume(
        &self,
        _profile: &FreshResumeProfile,
        _job_description: &str,
    ) -> Result<AlignedResume, InferenceError> {
        self.fresh.respond().await
    }

    async fn generate_insights(
        &self,
        request: InsightRequest<'_>,
    ) -> Result<OutcomeInsights, InferenceError> {
        self.insight_outcomes.lock().unwrap().push(request.outcome);
        self.insights.respond().await
    }
}

// ── canned values ───────────────────────────────────────────────────────────

pub fn parsed_resume() -> ParsedResume {
    ParsedResume {
        skills: vec!["Python".to_string(), "Docker".to_string()],
        experience_summary: "5 years backend engineer".to_string(),
        education_summary: "BSc Computer Science".to_string(),
        formatting_issues: "Two-column layout".to_string(),
    }
}

pub fn match_analysis(score: u8, missing: &[&str]) -> MatchAnalysis {
    MatchAnalysis {
        score,
        relevance_narrative: "Solid backend background.".to_string(),
        missing_skills: missing.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn skill_gap_analysis(skills: &[&str]) -> SkillGapAnalysis {
    SkillGapAnalysis {
        per_skill: skills
            .iter()
            .map(|skill| SkillGap {
                skill: skill.to_string(),
                importance: format!("{skill} is listed as a requirement"),
                learning_level: LearningLevel::Beginner,
                learning_steps: vec![LearningStep {
                    step: format!("Build a small project with {skill}"),
                    practice_ideas: "Ship it to a public repo".to_string(),
                }],
            })
            .collect(),
    }
}

pub fn outcome_insights() -> OutcomeInsights {
    OutcomeInsights {
        positive_factors: vec!["Backend experience matched the role".to_string()],
        negative_factors: vec!["No Kubernetes exposure".to_string()],
        recommendations: vec!["Add a deployed side project on Kubernetes".to_string()],
    }
}
