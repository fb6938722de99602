//! Error types for the financial decision orchestrator

use thiserror::Error;

/// Result type alias for simulation and orchestration operations
pub type Result<T> = std::result::Result<T, DecisionError>;

#[derive(Error, Debug)]
pub enum DecisionError {

    // =============================
    // Simulation Errors
    // =============================

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Degenerate goal state for goal {goal_id}")]
    DegenerateGoalState { goal_id: String },

    // =============================
    // Agent / Orchestration Errors
    // =============================

    #[error("{capability} capability failed: {reason}")]
    AgentCapabilityFailure { capability: String, reason: String },

    #[error("{capability} capability timed out after {timeout_ms} ms")]
    AgentTimeout { capability: String, timeout_ms: u64 },

    #[error("{capability} capability returned malformed output: {reason}")]
    MalformedAgentOutput { capability: String, reason: String },

    #[error("Analysis unavailable: {0}")]
    AnalysisUnavailable(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DecisionError {
    /// True for errors raised by an analysis capability (failure, timeout or
    /// unparseable output). Callers may retry these with the mock agent set.
    pub fn is_capability_failure(&self) -> bool {
        matches!(
            self,
            DecisionError::AgentCapabilityFailure { .. }
                | DecisionError::AgentTimeout { .. }
                | DecisionError::MalformedAgentOutput { .. }
                | DecisionError::LlmError(_)
                | DecisionError::HttpError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_failure_classification() {
        let timeout = DecisionError::AgentTimeout {
            capability: "budgeting".to_string(),
            timeout_ms: 30_000,
        };
        assert!(timeout.is_capability_failure());
        assert_eq!(
            timeout.to_string(),
            "budgeting capability timed out after 30000 ms"
        );

        let invalid = DecisionError::InvalidInput("negative amount".to_string());
        assert!(!invalid.is_capability_failure());
    }
}
