use std::sync::Arc;

use crate::analysis::orchestrator::Orchestrator;
use crate::analysis::simulation::SimulationRunner;
use crate::config::Config;
use crate::inference::InferenceService;
use crate::store::AnalysisStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Model backend. `LlmInference` in production, a scripted fake in tests.
    pub inference: Arc<dyn InferenceService>,
    /// Owns the single current analysis session.
    pub orchestrator: Orchestrator,
    pub simulations: Arc<SimulationRunner>,
    pub store: Arc<dyn AnalysisStore>,
    pub config: Config,
}

impl AppState {
    pub fn new(
        inference: Arc<dyn InferenceService>,
        store: Arc<dyn AnalysisStore>,
        config: Config,
    ) -> Self {
        let orchestrator = Orchestrator::new(inference.clone(), config.stage_timeout);
        let simulations = Arc::new(SimulationRunner::new(
            inference.clone(),
            config.simulation_timeout,
        ));
        Self {
            inference,
            orchestrator,
            simulations,
            store,
            config,
        }
    }
}
