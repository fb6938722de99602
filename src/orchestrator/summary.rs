//! Final recommendation synthesis
//!
//! `RecommendationSummary` is safe to show to end users: it carries no agent
//! names or consensus terms. Those live in `DecisionTrace` only.

use crate::agents::{
    AgentCapability, AgentConsensus, OverallConfidence, OverallRecommendation, Phase1Analyses,
    Recommendation, ValidationAnalysis,
};
use crate::guardrails::GuardrailFinding;
use crate::models::{ActionKind, FinancialAction, Guardrail, GuardrailKind};
use crate::simulation::{GrowthProjection, SimulationResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Proceed,
    ProceedWithCaution,
    Reconsider,
    DoNotProceed,
}

impl From<OverallRecommendation> for Decision {
    fn from(recommendation: OverallRecommendation) -> Self {
        match recommendation {
            OverallRecommendation::ProceedConfidently | OverallRecommendation::Proceed => {
                Decision::Proceed
            }
            OverallRecommendation::ProceedWithCaution => Decision::ProceedWithCaution,
            OverallRecommendation::Reconsider => Decision::Reconsider,
            OverallRecommendation::DoNotProceed => Decision::DoNotProceed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoalEffect {
    pub goal_id: String,
    pub goal_name: String,
    pub percentage_change: f64,
    pub months_saved: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockingRule {
    pub guardrail_id: String,
    pub rule: String,
    pub suggested_adjustment: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationSummary {
    pub decision: Decision,
    pub confidence: OverallConfidence,
    pub action: ActionKind,
    pub amount: f64,
    pub checking_after: f64,
    pub goal_effects: Vec<GoalEffect>,
    pub blocked_by: Vec<BlockingRule>,
    /// Largest amount that would clear every blocking rule with an adjustment
    pub suggested_max_amount: Option<f64>,
    pub liquidity_shortfall: Option<f64>,
    pub growth: Option<GrowthProjection>,
}

/// Internal view of how the decision was reached
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionTrace {
    pub agent_set: String,
    pub budgeting: Recommendation,
    pub investment: Recommendation,
    pub consensus: AgentConsensus,
    pub validation_recommendation: OverallRecommendation,
    pub guardrail_veto: bool,
    pub fallback_capabilities: Vec<AgentCapability>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinalRecommendation {
    pub summary: RecommendationSummary,
    pub trace: DecisionTrace,
}

pub(crate) struct SynthesisInput<'a> {
    pub simulation: &'a SimulationResult,
    pub phase1: &'a Phase1Analyses,
    pub validation: &'a ValidationAnalysis,
    pub recommendation: OverallRecommendation,
    pub confidence: OverallConfidence,
    pub guardrail_veto: bool,
    /// Re-evaluated against the user's guardrails; merged by `guardrail_id`
    pub deterministic_violations: &'a [GuardrailFinding],
    pub guardrails: &'a [Guardrail],
    pub agent_set: &'a str,
    pub fallback_capabilities: Vec<AgentCapability>,
}

pub(crate) fn synthesize(input: SynthesisInput<'_>) -> FinalRecommendation {
    let simulation = input.simulation;
    let scenario = &simulation.scenario_if_do;
    let amount = simulation.action.amount();

    let mut violations: Vec<&GuardrailFinding> = input.phase1.guardrail.violations.iter().collect();
    for finding in input.deterministic_violations {
        if !violations.iter().any(|v| v.guardrail_id == finding.guardrail_id) {
            violations.push(finding);
        }
    }

    // Only rules the action amount itself pushes past can be cured by shrinking it
    let suggested_max_amount = violations
        .iter()
        .filter(|v| bounded_by_amount(input.guardrails, &v.guardrail_id, simulation))
        .filter_map(|v| v.suggested_adjustment)
        .fold(None, |max: Option<f64>, adj| Some(max.map_or(adj, |m| m.max(adj))))
        .map(|adjustment| (amount - adjustment).max(0.0));

    let blocked_by: Vec<BlockingRule> = violations
        .iter()
        .map(|v| BlockingRule {
            guardrail_id: v.guardrail_id.clone(),
            rule: v.rule_description.clone(),
            suggested_adjustment: v.suggested_adjustment,
        })
        .collect();

    let summary = RecommendationSummary {
        decision: input.recommendation.into(),
        confidence: input.confidence,
        action: simulation.action.kind(),
        amount,
        checking_after: scenario.accounts_after.checking,
        goal_effects: scenario
            .goal_impacts
            .iter()
            .map(|g| GoalEffect {
                goal_id: g.goal_id.clone(),
                goal_name: g.goal_name.clone(),
                percentage_change: g.percentage_change,
                months_saved: g.months_saved,
            })
            .collect(),
        blocked_by,
        suggested_max_amount,
        liquidity_shortfall: scenario.liquidity_impact.as_ref().map(|l| l.shortfall),
        growth: simulation.growth_projection.clone(),
    };

    let trace = DecisionTrace {
        agent_set: input.agent_set.to_string(),
        budgeting: input.phase1.budgeting.recommendation,
        investment: input.phase1.investment.recommendation,
        consensus: input.validation.agent_consensus,
        validation_recommendation: input.validation.overall_recommendation,
        guardrail_veto: input.guardrail_veto,
        fallback_capabilities: input.fallback_capabilities,
    };

    FinalRecommendation { summary, trace }
}

fn bounded_by_amount(guardrails: &[Guardrail], guardrail_id: &str, simulation: &SimulationResult) -> bool {
    let Some(guardrail) = guardrails.iter().find(|g| g.id == guardrail_id) else {
        return false;
    };

    match &guardrail.kind {
        GuardrailKind::MinBalance { account_id, .. }
        | GuardrailKind::ProtectedAccount { account_id } => drawn_down(simulation, account_id),
        GuardrailKind::MaxInvestmentPct { .. } => {
            matches!(simulation.action, FinancialAction::Invest { .. })
        }
    }
}

fn drawn_down(simulation: &SimulationResult, account_id: &str) -> bool {
    let before = simulation.scenario_if_not_do.accounts_after.balance(account_id);
    let after = simulation.scenario_if_do.accounts_after.balance(account_id);

    matches!((before, after), (Some(before), Some(after)) if after < before)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_collapses_proceed_levels() {
        assert_eq!(
            Decision::from(OverallRecommendation::ProceedConfidently),
            Decision::Proceed
        );
        assert_eq!(Decision::from(OverallRecommendation::Proceed), Decision::Proceed);
        assert_eq!(
            Decision::from(OverallRecommendation::DoNotProceed),
            Decision::DoNotProceed
        );
    }
}
