//! Gemini-backed agent set
//!
//! Each capability prompts the model with the serialized context and parses
//! the JSON reply into the shared analysis records. Guardrail blocks and the
//! consensus table stay deterministic whatever the model answers.

use super::analysis::*;
use super::consensus::decide;
use super::{AgentCapability, AgentContext, AnalysisAgents, Phase1Analyses};
use crate::error::DecisionError;
use crate::gemini::GeminiClient;
use crate::guardrails::{GuardrailEvaluator, GuardrailInput, GuardrailReport};
use crate::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

const BUDGETING_SHAPE: &str = r#"{
  "recommendation": "strongly_approve | approve | approve_with_caution | not_recommended | strongly_oppose | blocked",
  "confidence": 0.0,
  "reasoning": "...",
  "key_findings": ["..."],
  "concerns": ["..."],
  "data_quality": "high | medium | low",
  "alternative_suggestions": ["..."],
  "budgeting_metrics": {
    "months_of_expenses_remaining": 0.0,
    "monthly_expense_average": 0.0,
    "spending_variance_coefficient": 0.0,
    "months_of_historical_data": 0,
    "over_budget_categories": ["..."],
    "budget_utilization_pct": 0.0
  }
}"#;

const INVESTMENT_SHAPE: &str = r#"{
  "recommendation": "strongly_approve | approve | approve_with_caution | not_recommended | strongly_oppose | blocked",
  "confidence": 0.0,
  "reasoning": "...",
  "key_findings": ["..."],
  "concerns": ["..."],
  "data_quality": "high | medium | low",
  "alternative_suggestions": ["..."],
  "investment_metrics": {
    "projected_value_5yr": 0.0,
    "annualized_return_assumption": 0.0,
    "time_to_goal_impact_months": 0,
    "risk_assessment": "low | medium | high | very_high",
    "goal_alignment_score": 0.0,
    "diversification_impact": "..."
  }
}"#;

const GUARDRAIL_SHAPE: &str = r#"{
  "violated": false,
  "can_proceed": true,
  "violations": [{
    "guardrail_id": "...",
    "rule_description": "...",
    "guardrail_type": "min_balance | max_investment_pct | protected_account",
    "severity": "critical | warning | info",
    "current_value": 0.0,
    "threshold_value": 0.0,
    "suggested_adjustment": 0.0
  }],
  "warnings": [],
  "compliance_summary": "..."
}"#;

const VALIDATION_SHAPE: &str = r#"{
  "overall_recommendation": "proceed_confidently | proceed | proceed_with_caution | reconsider | do_not_proceed",
  "overall_confidence": "high | medium | low | very_low",
  "contradictions_found": [{
    "agent_a": "budgeting", "agent_b": "investment", "description": "...", "severity": "major | minor"
  }],
  "uncertainty_sources": [{ "source": "...", "impact": "high | medium | low", "mitigation": "..." }],
  "data_sufficiency": {
    "sufficient": true, "missing_data_types": [], "data_quality_score": 0.0, "recommendation": "..."
  },
  "agent_consensus": {
    "agents_approving": 0, "agents_cautioning": 0, "agents_opposing": 0,
    "consensus_level": "unanimous | strong | moderate | weak | divided"
  },
  "final_summary": "...",
  "decision_tree": { "if_proceed": "...", "if_do_not_proceed": "...", "recommended_path": "..." }
}"#;

pub struct GeminiAgents {
    client: GeminiClient,
    evaluator: GuardrailEvaluator,
}

impl GeminiAgents {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Ok(Self {
            client: GeminiClient::new(api_key, model)?,
            evaluator: GuardrailEvaluator::new(),
        })
    }

    async fn ask<T: DeserializeOwned>(
        &self,
        capability: AgentCapability,
        context_json: &str,
        shape: &str,
    ) -> Result<T> {
        let prompt = build_prompt(capability, context_json, shape);
        let raw = self
            .client
            .generate_json(system_prompt(capability), &prompt)
            .await?;

        debug!(%capability, response_len = raw.len(), "Gemini analysis received");

        parse_analysis(capability, &raw)
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

fn system_prompt(capability: AgentCapability) -> &'static str {
    match capability {
        AgentCapability::Budgeting => {
            "You are a budgeting analyst. Judge whether the proposed action keeps \
             enough liquidity and respects the user's spending budgets."
        }
        AgentCapability::Investment => {
            "You are an investment analyst. Judge the proposed action's growth \
             prospects and its fit with the user's risk tolerance and goals."
        }
        AgentCapability::Guardrail => {
            "You are a compliance checker. Check the projected scenario against \
             every user guardrail and report each violation."
        }
        AgentCapability::Validation => {
            "You are a reviewer. Cross-check the budgeting, investment and \
             guardrail analyses for contradictions and missing data."
        }
    }
}

fn build_prompt(capability: AgentCapability, context_json: &str, shape: &str) -> String {
    format!(
        r#"Analyze the proposed financial action ({capability} analysis).

CONTEXT (user profile, action, simulation result, historical metrics):
{context_json}

Rules:
- Base every number on the simulation result; do not invent balances
- confidence is between 0 and 1
- Return ONLY valid JSON
- No explanation text
- JSON format:

{shape}
"#
    )
}

/// Parse a model reply, tolerating markdown code fences
fn parse_analysis<T: DeserializeOwned>(capability: AgentCapability, response: &str) -> Result<T> {
    let cleaned = response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    serde_json::from_str(cleaned).map_err(|e| DecisionError::MalformedAgentOutput {
        capability: capability.to_string(),
        reason: e.to_string(),
    })
}

/// Deterministic critical violations always block, whatever the model said
fn enforce_guardrail_veto(analysis: &mut GuardrailAnalysis, report: GuardrailReport) {
    if !report.has_critical() {
        return;
    }

    if analysis.can_proceed {
        warn!(
            violations = report.violations.len(),
            "External guardrail verdict overridden by deterministic check"
        );
    }

    for violation in report.violations {
        let known = analysis
            .violations
            .iter()
            .any(|v| v.guardrail_id == violation.guardrail_id);
        if !known {
            analysis.violations.push(violation);
        }
    }

    analysis.violated = true;
    analysis.can_proceed = false;
}

/// Recount votes and re-derive the overall verdict from the fixed table
fn apply_decision_table(validation: &mut ValidationAnalysis, phase1: &Phase1Analyses) {
    let consensus = AgentConsensus::tally(&[
        phase1.budgeting.recommendation,
        phase1.investment.recommendation,
    ]);
    let (recommendation, confidence) = decide(&consensus, phase1.guardrail.can_proceed);

    if validation.overall_recommendation != recommendation {
        debug!(
            external = ?validation.overall_recommendation,
            table = ?recommendation,
            "External validation verdict replaced by decision table"
        );
    }

    validation.agent_consensus = consensus;
    validation.overall_recommendation = recommendation;
    validation.overall_confidence = confidence;
}

#[async_trait]
impl AnalysisAgents for GeminiAgents {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn analyze_budgeting(&self, ctx: &AgentContext) -> Result<BudgetingAnalysis> {
        let context_json = serde_json::to_string(ctx)?;
        self.ask(AgentCapability::Budgeting, &context_json, BUDGETING_SHAPE)
            .await
    }

    async fn analyze_investment(&self, ctx: &AgentContext) -> Result<InvestmentAnalysis> {
        let context_json = serde_json::to_string(ctx)?;
        self.ask(AgentCapability::Investment, &context_json, INVESTMENT_SHAPE)
            .await
    }

    async fn analyze_guardrail(&self, ctx: &AgentContext) -> Result<GuardrailAnalysis> {
        let context_json = serde_json::to_string(ctx)?;
        let mut analysis: GuardrailAnalysis = self
            .ask(AgentCapability::Guardrail, &context_json, GUARDRAIL_SHAPE)
            .await?;

        enforce_guardrail_veto(&mut analysis, self.deterministic_report(ctx));

        Ok(analysis)
    }

    async fn analyze_validation(
        &self,
        ctx: &AgentContext,
        phase1: &Phase1Analyses,
    ) -> Result<ValidationAnalysis> {
        let context_json = serde_json::to_string(&serde_json::json!({
            "context": ctx,
            "analyses": phase1,
        }))?;

        let mut validation: ValidationAnalysis = self
            .ask(AgentCapability::Validation, &context_json, VALIDATION_SHAPE)
            .await?;

        apply_decision_table(&mut validation, phase1);

        info!(
            model = %self.client.model(),
            recommendation = ?validation.overall_recommendation,
            "Gemini validation completed"
        );

        Ok(validation)
    }
}
