//! Decision orchestrator
//!
//! PHASE 1 (budgeting ‖ investment ‖ guardrail) → PHASE 2 (validation) → SYNTHESIS
//!
//! Results are all-or-nothing: a capability that fails (and cannot be
//! recovered on the fallback set) aborts the run with `AnalysisUnavailable`.

pub mod events;
pub mod summary;

pub use events::{OrchestrationEvent, Stage};
pub use summary::{Decision, DecisionTrace, FinalRecommendation, RecommendationSummary};

use crate::agents::{
    AgentAnalysis, AgentCapability, AgentContext, AnalysisAgents, BudgetingAnalysis,
    GuardrailAnalysis, InvestmentAnalysis, OverallConfidence, OverallRecommendation,
    Phase1Analyses, TotalAnalysisAgents, ValidationAnalysis,
};
use crate::error::DecisionError;
use crate::guardrails::{GuardrailEvaluator, GuardrailInput, GuardrailReport};
use crate::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use summary::{synthesize, SynthesisInput};

const EVENT_BUFFER: usize = 32;

#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfig {
    /// Per-capability limit; a timeout counts as a capability failure
    pub capability_timeout: Option<Duration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationResult {
    pub run_id: Uuid,
    pub budgeting: BudgetingAnalysis,
    pub investment: InvestmentAnalysis,
    pub guardrail: GuardrailAnalysis,
    pub validation: ValidationAnalysis,
    pub should_proceed: bool,
    pub overall_confidence: OverallConfidence,
    pub final_recommendation: FinalRecommendation,
    pub simulation_fingerprint: String,
    pub execution_time_ms: u64,
}

struct CapabilityOutcome<T> {
    capability: AgentCapability,
    result: Result<T>,
    used_fallback: bool,
    elapsed_ms: u64,
}

/// Coordinates one analysis run over an injected agent set
pub struct Orchestrator {
    agents: Arc<dyn AnalysisAgents>,
    fallback: Option<Arc<dyn AnalysisAgents>>,
    config: OrchestratorConfig,
    evaluator: GuardrailEvaluator,
}

impl Orchestrator {
    pub fn new(agents: Arc<dyn AnalysisAgents>) -> Self {
        Self::with_config(agents, OrchestratorConfig::default())
    }

    pub fn with_config(agents: Arc<dyn AnalysisAgents>, config: OrchestratorConfig) -> Self {
        Self {
            agents,
            fallback: None,
            config,
            evaluator: GuardrailEvaluator::new(),
        }
    }

    /// Retry failed capabilities once on a set that cannot fail
    pub fn with_fallback<T: TotalAnalysisAgents + 'static>(mut self, fallback: T) -> Self {
        self.fallback = Some(Arc::new(fallback));
        self
    }

    pub fn agent_set(&self) -> &str {
        self.agents.name()
    }

    /// Batch run
    pub async fn run(&self, ctx: &AgentContext) -> Result<OrchestrationResult> {
        self.execute(ctx, Uuid::new_v4(), None).await
    }

    /// Streaming run; the terminal `complete` or `error` event is always last
    pub async fn run_streaming(&self, ctx: &AgentContext, tx: mpsc::Sender<OrchestrationEvent>) {
        let run_id = Uuid::new_v4();

        let terminal = match self.execute(ctx, run_id, Some(&tx)).await {
            Ok(result) => OrchestrationEvent::Complete {
                result: Box::new(result),
            },
            Err(e) => OrchestrationEvent::Error {
                run_id,
                reason: e.to_string(),
            },
        };

        emit(Some(&tx), terminal).await;
    }

    pub fn spawn_streaming(self: Arc<Self>, ctx: AgentContext) -> mpsc::Receiver<OrchestrationEvent> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        tokio::spawn(async move {
            self.run_streaming(&ctx, tx).await;
        });

        rx
    }

    async fn execute(
        &self,
        ctx: &AgentContext,
        run_id: Uuid,
        events: Option<&mpsc::Sender<OrchestrationEvent>>,
    ) -> Result<OrchestrationResult> {
        let start_time = Instant::now();

        info!(
            %run_id,
            agents = self.agents.name(),
            action = %ctx.action.kind(),
            amount = ctx.action.amount(),
            "Orchestrator: starting analysis"
        );

        // === PHASE 1 ===
        emit(events, OrchestrationEvent::Status {
            run_id,
            stage: Stage::Phase1,
        })
        .await;

        let mut pending: FuturesUnordered<_> = AgentCapability::PHASE1
            .into_iter()
            .map(|capability| self.phase1_capability(capability, ctx))
            .collect();

        let mut budgeting = None;
        let mut investment = None;
        let mut guardrail = None;
        let mut fallback_capabilities = Vec::new();
        let mut failure: Option<DecisionError> = None;

        while let Some(outcome) = pending.next().await {
            let capability = outcome.capability;

            let analysis = match outcome.result {
                Ok(analysis) => analysis,
                Err(e) => {
                    error!(%run_id, %capability, error = %e, "Capability failed");
                    if failure.is_none() {
                        failure = Some(e);
                    }
                    continue;
                }
            };

            if outcome.used_fallback {
                fallback_capabilities.push(capability);
            }

            debug!(%run_id, %capability, elapsed_ms = outcome.elapsed_ms, "Capability completed");

            emit(events, OrchestrationEvent::AgentCompleted {
                run_id,
                agent: capability,
                result: analysis.clone(),
                elapsed: outcome.elapsed_ms,
            })
            .await;

            match analysis {
                AgentAnalysis::Budgeting(a) => budgeting = Some(a),
                AgentAnalysis::Investment(a) => investment = Some(a),
                AgentAnalysis::Guardrail(a) => guardrail = Some(a),
                AgentAnalysis::Validation(_) => {}
            }
        }

        if let Some(e) = failure {
            return Err(DecisionError::AnalysisUnavailable(e.to_string()));
        }

        let (Some(budgeting), Some(investment), Some(guardrail)) = (budgeting, investment, guardrail)
        else {
            return Err(DecisionError::AnalysisUnavailable(
                "phase 1 did not produce every analysis".to_string(),
            ));
        };

        let phase1 = Phase1Analyses {
            budgeting,
            investment,
            guardrail,
        };

        info!(
            %run_id,
            budgeting = ?phase1.budgeting.recommendation,
            investment = ?phase1.investment.recommendation,
            can_proceed = phase1.guardrail.can_proceed,
            "Phase 1 complete"
        );

        // === PHASE 2 ===
        emit(events, OrchestrationEvent::Status {
            run_id,
            stage: Stage::Phase2,
        })
        .await;

        let outcome = self.validation_capability(ctx, &phase1).await;
        let validation = outcome.result.map_err(|e| {
            error!(%run_id, capability = %AgentCapability::Validation, error = %e, "Capability failed");
            DecisionError::AnalysisUnavailable(e.to_string())
        })?;
        if outcome.used_fallback {
            fallback_capabilities.push(AgentCapability::Validation);
        }

        emit(events, OrchestrationEvent::AgentCompleted {
            run_id,
            agent: AgentCapability::Validation,
            result: AgentAnalysis::Validation(validation.clone()),
            elapsed: outcome.elapsed_ms,
        })
        .await;

        // === SYNTHESIS ===
        let report = self.deterministic_report(ctx);
        let guardrail_veto = !phase1.guardrail.can_proceed || report.has_critical();

        let (recommendation, confidence) = if guardrail_veto {
            (OverallRecommendation::DoNotProceed, OverallConfidence::High)
        } else {
            (validation.overall_recommendation, validation.overall_confidence)
        };
        let should_proceed = recommendation.is_proceed() && !guardrail_veto;

        let final_recommendation = synthesize(SynthesisInput {
            simulation: &ctx.simulation_result,
            phase1: &phase1,
            validation: &validation,
            recommendation,
            confidence,
            guardrail_veto,
            deterministic_violations: &report.violations,
            guardrails: &ctx.user.preferences.guardrails,
            agent_set: self.agents.name(),
            fallback_capabilities,
        });

        let execution_time_ms = start_time.elapsed().as_millis() as u64;

        info!(
            %run_id,
            recommendation = ?recommendation,
            should_proceed,
            guardrail_veto,
            execution_time_ms,
            "Orchestrator: analysis complete"
        );

        Ok(OrchestrationResult {
            run_id,
            budgeting: phase1.budgeting,
            investment: phase1.investment,
            guardrail: phase1.guardrail,
            validation,
            should_proceed,
            overall_confidence: confidence,
            final_recommendation,
            simulation_fingerprint: ctx.simulation_result.fingerprint(),
            execution_time_ms,
        })
    }

    async fn phase1_capability(
        &self,
        capability: AgentCapability,
        ctx: &AgentContext,
    ) -> CapabilityOutcome<AgentAnalysis> {
        let start = Instant::now();

        let primary = self
            .guarded(capability, phase1_call(self.agents.as_ref(), capability, ctx))
            .await;

        let (result, used_fallback) = match (primary, &self.fallback) {
            (Ok(analysis), _) => (Ok(analysis), false),
            (Err(e), Some(fallback)) => {
                warn!(%capability, error = %e, fallback = fallback.name(), "Retrying capability on fallback agents");
                let retry = phase1_call(fallback.as_ref(), capability, ctx)
                    .await
                    .map_err(|e| normalize(capability, e));
                (retry, true)
            }
            (Err(e), None) => (Err(e), false),
        };

        CapabilityOutcome {
            capability,
            result,
            used_fallback,
            elapsed_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn validation_capability(
        &self,
        ctx: &AgentContext,
        phase1: &Phase1Analyses,
    ) -> CapabilityOutcome<ValidationAnalysis> {
        let capability = AgentCapability::Validation;
        let start = Instant::now();

        let primary = self
            .guarded(capability, self.agents.analyze_validation(ctx, phase1))
            .await;

        let (result, used_fallback) = match (primary, &self.fallback) {
            (Ok(analysis), _) => (Ok(analysis), false),
            (Err(e), Some(fallback)) => {
                warn!(%capability, error = %e, fallback = fallback.name(), "Retrying capability on fallback agents");
                let retry = fallback
                    .analyze_validation(ctx, phase1)
                    .await
                    .map_err(|e| normalize(capability, e));
                (retry, true)
            }
            (Err(e), None) => (Err(e), false),
        };

        CapabilityOutcome {
            capability,
            result,
            used_fallback,
            elapsed_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Apply the optional timeout and normalize errors to capability failures
    async fn guarded<T, F>(&self, capability: AgentCapability, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let result = match self.config.capability_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(DecisionError::AgentTimeout {
                        capability: capability.to_string(),
                        timeout_ms: limit.as_millis() as u64,
                    })
                }
            },
            None => call.await,
        };

        result.map_err(|e| normalize(capability, e))
    }

    fn deterministic_report(&self, ctx: &AgentContext) -> GuardrailReport {
        let input = GuardrailInput {
            accounts_before: &ctx.user.accounts,
            scenario: &ctx.simulation_result.scenario_if_do,
            risk_tolerance: ctx.user.preferences.risk_tolerance,
        };

        self.evaluator
            .evaluate(&input, &ctx.user.preferences.guardrails)
    }
}

async fn phase1_call(
    agents: &dyn AnalysisAgents,
    capability: AgentCapability,
    ctx: &AgentContext,
) -> Result<AgentAnalysis> {
    match capability {
        AgentCapability::Budgeting => agents
            .analyze_budgeting(ctx)
            .await
            .map(AgentAnalysis::Budgeting),
        AgentCapability::Investment => agents
            .analyze_investment(ctx)
            .await
            .map(AgentAnalysis::Investment),
        AgentCapability::Guardrail => agents
            .analyze_guardrail(ctx)
            .await
            .map(AgentAnalysis::Guardrail),
        AgentCapability::Validation => Err(DecisionError::InvalidInput(
            "validation runs in phase 2".to_string(),
        )),
    }
}

fn normalize(capability: AgentCapability, e: DecisionError) -> DecisionError {
    match e {
        DecisionError::AgentCapabilityFailure { .. }
        | DecisionError::AgentTimeout { .. }
        | DecisionError::MalformedAgentOutput { .. } => e,
        other => DecisionError::AgentCapabilityFailure {
            capability: capability.to_string(),
            reason: other.to_string(),
        },
    }
}

async fn emit(events: Option<&mpsc::Sender<OrchestrationEvent>>, event: OrchestrationEvent) {
    if let Some(tx) = events {
        if tx.send(event).await.is_err() {
            debug!("Event receiver dropped");
        }
    }
}
