//! The static stage table.
//!
//! Adding a stage means adding one entry here plus its `StageId`,
//! `StageRequest` and `StageOutput` variants. The orchestrator never names a
//! stage directly.

use crate::analysis::session::SessionInputs;
use crate::analysis::snapshot::ResultSnapshot;
use crate::analysis::stage::{Stage, StageId, StageRequest};

static STAGES: [Stage; 4] = [
    Stage {
        id: StageId::Parse,
        depends_on: &[],
        progress_label: "Parsing your resume...",
        ready: parse_ready,
        skip: never,
        prepare: parse_request,
    },
    Stage {
        id: StageId::Match,
        depends_on: &[StageId::Parse],
        progress_label: "Calculating match score...",
        ready: match_ready,
        skip: never,
        prepare: match_request,
    },
    Stage {
        id: StageId::SkillGap,
        depends_on: &[StageId::Match],
        progress_label: "Analyzing skill gap and building roadmap...",
        ready: skill_gap_ready,
        skip: skill_gap_skip,
        prepare: skill_gap_request,
    },
    Stage {
        id: StageId::Suggest,
        depends_on: &[],
        progress_label: "Generating optimization suggestions...",
        ready: suggest_ready,
        skip: never,
        prepare: suggest_request,
    },
];

pub fn stages() -> &'static [Stage] {
    &STAGES
}

pub fn stage(id: StageId) -> &'static Stage {
    match id {
        StageId::Parse => &STAGES[0],
        StageId::Match => &STAGES[1],
        StageId::SkillGap => &STAGES[2],
        StageId::Suggest => &STAGES[3],
    }
}

/// Résumé text the match stage scores: the user's own text when present,
/// otherwise a rendering of the parsed document.
pub fn effective_resume_text(inputs: &SessionInputs, snapshot: &ResultSnapshot) -> Option<String> {
    if inputs.has_resume_text() {
        return Some(inputs.resume_text.clone());
    }
    snapshot
        .parsed_resume()
        .map(|parsed| parsed.as_resume_text())
        .filter(|text| !text.trim().is_empty())
}

fn never(_: &SessionInputs, _: &ResultSnapshot) -> bool {
    false
}

// ── parse ───────────────────────────────────────────────────────────────────

fn parse_ready(inputs: &SessionInputs, _: &ResultSnapshot) -> bool {
    inputs.has_document()
}

fn parse_request(inputs: &SessionInputs, _: &ResultSnapshot) -> Option<StageRequest> {
    inputs
        .document
        .clone()
        .map(|document| StageRequest::Parse { document })
}

// ── match ───────────────────────────────────────────────────────────────────

fn match_ready(inputs: &SessionInputs, snapshot: &ResultSnapshot) -> bool {
    inputs.has_job_description() && effective_resume_text(inputs, snapshot).is_some()
}

fn match_request(inputs: &SessionInputs, snapshot: &ResultSnapshot) -> Option<StageRequest> {
    Some(StageRequest::Match {
        job_description: inputs.job_description.clone(),
        resume_text: effective_resume_text(inputs, snapshot)?,
    })
}

// ── skill gap ───────────────────────────────────────────────────────────────

fn skill_gap_ready(_: &SessionInputs, snapshot: &ResultSnapshot) -> bool {
    snapshot
        .match_analysis()
        .is_some_and(|m| !m.missing_skills.is_empty())
}

fn skill_gap_skip(_: &SessionInputs, snapshot: &ResultSnapshot) -> bool {
    snapshot
        .match_analysis()
        .is_some_and(|m| m.missing_skills.is_empty())
}

fn skill_gap_request(inputs: &SessionInputs, snapshot: &ResultSnapshot) -> Option<StageRequest> {
    let analysis = snapshot.match_analysis()?;
    Some(StageRequest::SkillGap {
        job_description: inputs.job_description.clone(),
        resume_text: effective_resume_text(inputs, snapshot).unwrap_or_default(),
        missing_skills: analysis.missing_skills.clone(),
    })
}

// ── suggest ─────────────────────────────────────────────────────────────────

fn suggest_ready(inputs: &SessionInputs, _: &ResultSnapshot) -> bool {
    inputs.has_job_description() && inputs.has_resume_text()
}

fn suggest_request(inputs: &SessionInputs, _: &ResultSnapshot) -> Option<StageRequest> {
    Some(StageRequest::Suggest {
        job_description: inputs.job_description.clone(),
        resume_text: inputs.resume_text.clone(),
    })
}
