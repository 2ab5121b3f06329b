//! Staged résumé analysis.
//!
//! - `stage` / `registry`: the static stage table and its readiness predicates.
//! - `snapshot`: the merged, read-only result view and its transitions.
//! - `orchestrator`: session lifecycle, concurrent dispatch, atomic merges.
//! - `simulation`: what-if re-scoring against the session's baseline score.
//! - `rewrite`: aligned résumé generation with re-score and diff, and from-scratch
//!   generation from a career profile.

pub mod handlers;
pub mod orchestrator;
pub mod registry;
pub mod rewrite;
pub mod session;
pub mod simulation;
pub mod snapshot;
pub mod stage;

pub use orchestrator::{Observation, Orchestrator};
pub use session::{Session, SessionId, SessionInputs};
pub use simulation::{SimulationError, SimulationRunner};
pub use snapshot::{Progress, ResultSnapshot, SlotState};
pub use stage::{StageId, StageStatus};
