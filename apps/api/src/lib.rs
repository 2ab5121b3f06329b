//! Résumé-versus-job-description analysis service.
//!
//! The library holds the staged analysis core (`analysis`), the character diff
//! engine (`diff`), the inference seam and its LLM backend, persistence, and the
//! axum routes that expose them. `main.rs` only wires configuration to these.

pub mod analysis;
pub mod config;
pub mod db;
pub mod diff;
pub mod errors;
pub mod inference;
pub mod llm_client;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
