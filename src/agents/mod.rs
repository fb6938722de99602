//! Analysis agent contract
//!
//! Four async capabilities over a shared, immutable [`AgentContext`].
//! Agent sets are chosen once, at orchestrator construction, and are
//! interchangeable behind [`AnalysisAgents`].

use crate::metrics::HistoricalMetrics;
use crate::models::{FinancialAction, UserProfile};
use crate::simulation::SimulationResult;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod analysis;
pub mod consensus;
pub mod gemini;
pub mod mock;

pub use analysis::*;
pub use gemini::GeminiAgents;
pub use mock::MockAgents;

/// Everything a capability may look at; never mutated during a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentContext {
    pub user: UserProfile,
    pub action: FinancialAction,
    pub simulation_result: SimulationResult,
    pub historical_metrics: HistoricalMetrics,
}

/// Settled outputs of phase 1, handed to validation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Phase1Analyses {
    pub budgeting: BudgetingAnalysis,
    pub investment: InvestmentAnalysis,
    pub guardrail: GuardrailAnalysis,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AgentCapability {
    Budgeting,
    Investment,
    Guardrail,
    Validation,
}

impl AgentCapability {
    /// Capabilities run concurrently in phase 1
    pub const PHASE1: [AgentCapability; 3] = [
        AgentCapability::Budgeting,
        AgentCapability::Investment,
        AgentCapability::Guardrail,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentCapability::Budgeting => "budgeting",
            AgentCapability::Investment => "investment",
            AgentCapability::Guardrail => "guardrail",
            AgentCapability::Validation => "validation",
        }
    }
}

impl fmt::Display for AgentCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait implemented by every agent set (mock or external)
#[async_trait]
pub trait AnalysisAgents: Send + Sync {
    /// Identifies the set in logs
    fn name(&self) -> &str;

    async fn analyze_budgeting(&self, ctx: &AgentContext) -> Result<BudgetingAnalysis>;

    async fn analyze_investment(&self, ctx: &AgentContext) -> Result<InvestmentAnalysis>;

    async fn analyze_guardrail(&self, ctx: &AgentContext) -> Result<GuardrailAnalysis>;

    async fn analyze_validation(
        &self,
        ctx: &AgentContext,
        phase1: &Phase1Analyses,
    ) -> Result<ValidationAnalysis>;
}

/// Marker for agent sets whose capabilities never fail or block.
///
/// Only a total set may be installed as the orchestrator's fallback.
pub trait TotalAnalysisAgents: AnalysisAgents {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_wire_names() {
        for capability in AgentCapability::PHASE1 {
            let wire = serde_json::to_value(capability).unwrap();
            assert_eq!(wire, capability.as_str());
        }
        assert_eq!(AgentCapability::Validation.to_string(), "validation");
    }
}
