//! Environment-driven application configuration
//!
//! The agent set is chosen here, once, and injected into the orchestrator.

use crate::agents::{AnalysisAgents, GeminiAgents, MockAgents};
use crate::error::DecisionError;
use crate::gemini::DEFAULT_MODEL;
use crate::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::service::DecisionService;
use crate::simulation::{SimulationConfig, SimulationEngine};
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_AGENT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub enum AgentSelection {
    Mock,
    Gemini { api_key: String, model: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub agents: AgentSelection,
    /// Only applied to the real agent set
    pub agent_timeout: Duration,
    pub fallback_to_mock: bool,
    pub port: u16,
    pub simulation: SimulationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            agents: AgentSelection::Mock,
            agent_timeout: Duration::from_secs(DEFAULT_AGENT_TIMEOUT_SECS),
            fallback_to_mock: true,
            port: DEFAULT_PORT,
            simulation: SimulationConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let force_mock = var("USE_MOCK_AGENTS")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1"))
            .unwrap_or(false);

        let agents = match (force_mock, var("GEMINI_API_KEY")) {
            (false, Some(api_key)) => AgentSelection::Gemini {
                api_key,
                model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            },
            (false, None) => {
                warn!("GEMINI_API_KEY not set, using mock agents");
                AgentSelection::Mock
            }
            (true, _) => AgentSelection::Mock,
        };

        let agent_timeout = match var("AGENT_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(v.parse().map_err(|_| {
                DecisionError::Config(format!("AGENT_TIMEOUT_SECS is not a number: {v}"))
            })?),
            None => Duration::from_secs(DEFAULT_AGENT_TIMEOUT_SECS),
        };

        let fallback_to_mock = var("AGENT_FALLBACK_TO_MOCK")
            .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0"))
            .unwrap_or(true);

        let port = match var("PORT").or_else(|| var("API_PORT")) {
            Some(v) => v
                .parse()
                .map_err(|_| DecisionError::Config(format!("invalid port: {v}")))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            agents,
            agent_timeout,
            fallback_to_mock,
            port,
            simulation: SimulationConfig::default(),
        })
    }

    pub fn build_agents(&self) -> Result<Arc<dyn AnalysisAgents>> {
        match &self.agents {
            AgentSelection::Mock => Ok(Arc::new(MockAgents::new())),
            AgentSelection::Gemini { api_key, model } => {
                Ok(Arc::new(GeminiAgents::new(api_key.clone(), model.clone())?))
            }
        }
    }

    pub fn build_orchestrator(&self) -> Result<Orchestrator> {
        let agents = self.build_agents()?;

        let orchestrator = match self.agents {
            AgentSelection::Mock => Orchestrator::new(agents),
            AgentSelection::Gemini { .. } => {
                let config = OrchestratorConfig {
                    capability_timeout: Some(self.agent_timeout),
                };
                let orchestrator = Orchestrator::with_config(agents, config);
                if self.fallback_to_mock {
                    orchestrator.with_fallback(MockAgents::new())
                } else {
                    orchestrator
                }
            }
        };

        info!(agents = orchestrator.agent_set(), "Orchestrator configured");
        Ok(orchestrator)
    }

    pub fn build_service(&self) -> Result<DecisionService> {
        Ok(DecisionService::new(
            SimulationEngine::new(self.simulation.clone()),
            self.build_orchestrator()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_to_mock() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.agents, AgentSelection::Mock);
        assert_eq!(config.port, 8080);
        assert_eq!(config.agent_timeout, Duration::from_secs(30));
        assert!(config.fallback_to_mock);
    }

    #[test]
    fn test_api_key_selects_gemini() {
        let config = config_from(&[("GEMINI_API_KEY", "key"), ("API_PORT", "9000")]).unwrap();

        assert_eq!(
            config.agents,
            AgentSelection::Gemini {
                api_key: "key".to_string(),
                model: DEFAULT_MODEL.to_string(),
            }
        );
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_mock_flag_overrides_key() {
        for flag in ["true", "1", "TRUE"] {
            let config =
                config_from(&[("GEMINI_API_KEY", "key"), ("USE_MOCK_AGENTS", flag)]).unwrap();
            assert_eq!(config.agents, AgentSelection::Mock);
        }

        let config = config_from(&[("GEMINI_API_KEY", "  "), ("USE_MOCK_AGENTS", "false")]).unwrap();
        assert_eq!(config.agents, AgentSelection::Mock);
    }

    #[test]
    fn test_bad_values_are_config_errors() {
        assert!(matches!(
            config_from(&[("PORT", "eighty")]),
            Err(DecisionError::Config(_))
        ));
        assert!(matches!(
            config_from(&[("AGENT_TIMEOUT_SECS", "-3")]),
            Err(DecisionError::Config(_))
        ));
    }

    #[test]
    fn test_gemini_orchestrator_gets_fallback_and_timeout() {
        let config = config_from(&[("GEMINI_API_KEY", "key"), ("AGENT_FALLBACK_TO_MOCK", "0")]).unwrap();
        assert!(!config.fallback_to_mock);

        let orchestrator = config.build_orchestrator().unwrap();
        assert_eq!(orchestrator.agent_set(), "gemini");

        let service = config_from(&[]).unwrap().build_service().unwrap();
        assert_eq!(service.agent_set(), "mock");
    }
}
