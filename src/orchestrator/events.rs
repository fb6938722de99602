//! Typed events of the streaming run
//!
//! Order: status(phase1), one agent_completed per phase-1 capability in
//! completion order, status(phase2), agent_completed(validation), then
//! exactly one terminal event.

use super::OrchestrationResult;
use crate::agents::{AgentAnalysis, AgentCapability};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Simulation,
    Metrics,
    Phase1,
    Phase2,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrchestrationEvent {
    Status {
        run_id: Uuid,
        stage: Stage,
    },
    AgentCompleted {
        run_id: Uuid,
        agent: AgentCapability,
        result: AgentAnalysis,
        /// Milliseconds since the capability was invoked
        elapsed: u64,
    },
    Complete {
        result: Box<OrchestrationResult>,
    },
    Error {
        run_id: Uuid,
        reason: String,
    },
}

impl OrchestrationEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrchestrationEvent::Complete { .. } | OrchestrationEvent::Error { .. }
        )
    }
}
