//! Financial Decision Orchestrator
//!
//! Deterministically simulates a proposed financial action (save, invest or
//! spend) against a user profile, then runs a two-phase analysis over an
//! injected agent set:
//!
//! SIMULATE → METRICS → PHASE 1 (budgeting ‖ investment ‖ guardrail) → PHASE 2 (validation) → SYNTHESIS
//!
//! Guardrail vetoes are absolute and the simulation never depends on agents.

pub mod agents;
pub mod api;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod gemini;
pub mod guardrails;
pub mod metrics;
pub mod models;
pub mod orchestrator;
pub mod service;
pub mod simulation;

pub use error::Result;

// Re-export common types
pub use config::AppConfig;
pub use models::*;
pub use service::{DecisionService, Evaluation, StreamEvent};
