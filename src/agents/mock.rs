//! Deterministic rule-based agent set
//!
//! No external calls and no blocking; used when no external analysis is
//! configured, as the orchestrator's fallback, and in tests.

use super::analysis::*;
use super::consensus::{contradictions, decide};
use super::{AgentContext, AnalysisAgents, Phase1Analyses, TotalAnalysisAgents};
use crate::guardrails::{GuardrailEvaluator, GuardrailInput};
use crate::metrics::SUFFICIENT_MONTHS;
use crate::models::{FinancialAction, RiskTolerance};
use crate::simulation::projection::future_value;
use crate::Result;
use async_trait::async_trait;
use tracing::debug;

/// Coverage (months of expenses held in checking) below which budgeting opposes
const MIN_COVERAGE_MONTHS: f64 = 1.0;
/// Coverage below which budgeting approves only with caution
const COMFORT_COVERAGE_MONTHS: f64 = 2.0;
/// Investment size above which conservative profiles get a caution
const CONSERVATIVE_INVEST_LIMIT: f64 = 1000.0;

#[derive(Debug, Clone, Default)]
pub struct MockAgents {
    evaluator: GuardrailEvaluator,
}

impl MockAgents {
    pub fn new() -> Self {
        Self {
            evaluator: GuardrailEvaluator::new(),
        }
    }

    pub fn budgeting(&self, ctx: &AgentContext) -> BudgetingAnalysis {
        let user = &ctx.user;
        let metrics = &ctx.historical_metrics;
        let checking_after = ctx.simulation_result.scenario_if_do.accounts_after.checking;
        let expenses = user.monthly_expenses();
        let surplus = user.monthly_surplus();

        let coverage = (expenses > 0.0).then(|| checking_after / expenses);

        let (recommendation, confidence) = match coverage {
            Some(months) if months < MIN_COVERAGE_MONTHS => (Recommendation::NotRecommended, 0.9),
            Some(months) if months < COMFORT_COVERAGE_MONTHS => {
                (Recommendation::ApproveWithCaution, 0.75)
            }
            _ => (Recommendation::Approve, 0.85),
        };

        let thin_buffer = coverage.is_some_and(|m| m < COMFORT_COVERAGE_MONTHS);
        let coverage_text = coverage
            .map(|m| format!("{:.1}", m))
            .unwrap_or_else(|| "unbounded".to_string());

        let mut key_findings = vec![
            format!("checking after action: {:.0}", checking_after),
            format!("months of expenses remaining: {}", coverage_text),
            format!("monthly surplus: {:.0}", surplus),
        ];
        key_findings.push(match ctx.action {
            FinancialAction::Spend { .. } => "spending reduces liquidity".to_string(),
            _ => "liquidity buffer maintained".to_string(),
        });

        let (concerns, alternative_suggestions) = if thin_buffer {
            (
                vec![format!(
                    "low liquidity buffer: {} months of expenses",
                    coverage_text
                )],
                vec![
                    "reduce the amount to keep a two-month expense buffer".to_string(),
                    "build the emergency fund first".to_string(),
                ],
            )
        } else {
            (Vec::new(), Vec::new())
        };

        let over_budget_categories = user
            .spending_categories
            .iter()
            .filter(|c| c.current_spent > c.monthly_budget)
            .map(|c| c.name.clone())
            .collect();

        let budgeted: Vec<f64> = user
            .spending_categories
            .iter()
            .filter(|c| c.monthly_budget > 0.0)
            .map(|c| c.current_spent / c.monthly_budget * 100.0)
            .collect();
        let budget_utilization_pct = if budgeted.is_empty() {
            0.0
        } else {
            budgeted.iter().sum::<f64>() / budgeted.len() as f64
        };

        BudgetingAnalysis {
            recommendation,
            confidence,
            reasoning: format!(
                "{} leaves checking at {:.0}, {} months of expenses",
                ctx.action.kind(),
                checking_after,
                coverage_text
            ),
            key_findings,
            concerns,
            data_quality: if metrics.is_sufficient() {
                DataQuality::High
            } else {
                DataQuality::Medium
            },
            alternative_suggestions,
            budgeting_metrics: BudgetingMetrics {
                months_of_expenses_remaining: coverage,
                monthly_expense_average: expenses,
                spending_variance_coefficient: metrics.spending_variance,
                months_of_historical_data: metrics.months_of_data,
                over_budget_categories,
                budget_utilization_pct,
            },
        }
    }

    pub fn investment(&self, ctx: &AgentContext) -> InvestmentAnalysis {
        let user = &ctx.user;
        let risk = user.preferences.risk_tolerance;
        let sim = &ctx.simulation_result;
        let goal_impact = sim.scenario_if_do.goal_impacts.first();

        let FinancialAction::Invest {
            amount,
            target_account_id,
            ..
        } = &ctx.action
        else {
            let mut key_findings = vec![format!("{} action, not an investment", ctx.action.kind())];
            if let Some(growth) = &sim.growth_projection {
                key_findings.push(format!(
                    "forgone growth over {} years: {:.0}",
                    growth.years, growth.projected_gain
                ));
            }

            return InvestmentAnalysis {
                recommendation: Recommendation::NotRecommended,
                confidence: 0.7,
                reasoning: format!("{} action does not grow invested assets", ctx.action.kind()),
                key_findings,
                concerns: Vec::new(),
                data_quality: DataQuality::High,
                alternative_suggestions: vec!["invest this amount for long-term growth".to_string()],
                investment_metrics: InvestmentMetrics::default(),
            };
        };

        let (recommendation, confidence) =
            if risk == RiskTolerance::Conservative && *amount > CONSERVATIVE_INVEST_LIMIT {
                (Recommendation::ApproveWithCaution, 0.75)
            } else {
                (Recommendation::Approve, 0.85)
            };

        let annual_return = sim.growth_projection.as_ref().map(|g| g.annual_return);
        let projected_value_5yr = annual_return.map(|rate| future_value(*amount, 0.0, rate, 60));

        let mut key_findings = Vec::new();
        if let Some(value) = projected_value_5yr {
            key_findings.push(format!("projected 5-year value: {:.0}", value));
        }
        if let Some(impact) = goal_impact {
            key_findings.push(format!(
                "{} gap closed by {:.1}%, {} months sooner",
                impact.goal_name, impact.percentage_change, impact.months_saved
            ));
        }
        key_findings.push(format!("risk tolerance: {}", risk));

        let concerns = if risk == RiskTolerance::Conservative {
            vec![
                "large investment for a conservative risk tolerance".to_string(),
                "dollar-cost averaging spreads entry risk".to_string(),
            ]
        } else {
            Vec::new()
        };

        InvestmentAnalysis {
            recommendation,
            confidence,
            reasoning: format!("investing {:.0} into {}", amount, target_account_id),
            key_findings,
            concerns,
            data_quality: DataQuality::High,
            alternative_suggestions: vec![
                "split into monthly contributions".to_string(),
                "review asset allocation for diversification".to_string(),
            ],
            investment_metrics: InvestmentMetrics {
                projected_value_5yr,
                annualized_return_assumption: annual_return,
                time_to_goal_impact_months: goal_impact.map(|g| g.months_saved),
                risk_assessment: Some(match risk {
                    RiskTolerance::Conservative => RiskLevel::Low,
                    RiskTolerance::Moderate => RiskLevel::Medium,
                    RiskTolerance::Aggressive => RiskLevel::High,
                }),
                goal_alignment_score: Some(if goal_impact.is_some() { 0.85 } else { 0.6 }),
                diversification_impact: Some("increases exposure to growth assets".to_string()),
            },
        }
    }

    pub fn guardrail(&self, ctx: &AgentContext) -> GuardrailAnalysis {
        let input = GuardrailInput {
            accounts_before: &ctx.user.accounts,
            scenario: &ctx.simulation_result.scenario_if_do,
            risk_tolerance: ctx.user.preferences.risk_tolerance,
        };

        self.evaluator
            .evaluate(&input, &ctx.user.preferences.guardrails)
            .into()
    }

    pub fn validation(&self, ctx: &AgentContext, phase1: &Phase1Analyses) -> ValidationAnalysis {
        let budgeting = phase1.budgeting.recommendation;
        let investment = phase1.investment.recommendation;

        let agent_consensus = AgentConsensus::tally(&[budgeting, investment]);
        let (overall_recommendation, overall_confidence) =
            decide(&agent_consensus, phase1.guardrail.can_proceed);

        let metrics = &ctx.historical_metrics;
        let sufficient = metrics.is_sufficient();

        let uncertainty_sources = if sufficient {
            Vec::new()
        } else {
            vec![UncertaintySource {
                source: "limited historical data".to_string(),
                impact: ImpactLevel::Medium,
                mitigation: Some(format!(
                    "collect at least {} months of transactions",
                    SUFFICIENT_MONTHS
                )),
            }]
        };

        let data_sufficiency = DataSufficiency {
            sufficient,
            missing_data_types: if sufficient {
                Vec::new()
            } else {
                vec!["extended transaction history".to_string()]
            },
            data_quality_score: if sufficient { 0.85 } else { 0.6 },
            recommendation: if sufficient {
                "sufficient data for confident analysis".to_string()
            } else {
                "more history would improve confidence".to_string()
            },
        };

        let final_summary = if overall_recommendation == OverallRecommendation::DoNotProceed {
            format!(
                "guardrails blocked: {}",
                phase1.guardrail.compliance_summary
            )
        } else {
            format!(
                "{:?} consensus; budgeting {:?}, investment {:?}; {}",
                agent_consensus.consensus_level,
                budgeting,
                investment,
                phase1.guardrail.compliance_summary
            )
        };

        let scenario = &ctx.simulation_result.scenario_if_do;
        let goal_effects: Vec<String> = scenario
            .goal_impacts
            .iter()
            .map(|g| format!("{} {:+.1}%", g.goal_name, g.percentage_change))
            .collect();

        let if_do_not_proceed = match &ctx.simulation_result.growth_projection {
            Some(growth) => format!(
                "forgo {:.0} of growth over {} years",
                growth.projected_gain, growth.years
            ),
            None => "current liquidity maintained".to_string(),
        };

        let recommended_path = match overall_recommendation {
            OverallRecommendation::DoNotProceed => "modify the action to satisfy guardrails",
            OverallRecommendation::ProceedWithCaution => "proceed and monitor liquidity",
            OverallRecommendation::Reconsider => "revisit amount or timing",
            _ => "proceed as planned",
        };

        debug!(
            consensus = ?agent_consensus.consensus_level,
            recommendation = ?overall_recommendation,
            "Mock validation completed"
        );

        ValidationAnalysis {
            overall_recommendation,
            overall_confidence,
            contradictions_found: contradictions(budgeting, investment),
            uncertainty_sources,
            data_sufficiency,
            agent_consensus,
            final_summary,
            decision_tree: DecisionTree {
                if_proceed: format!(
                    "checking becomes {:.0}; goals: {}",
                    scenario.accounts_after.checking,
                    if goal_effects.is_empty() {
                        "none".to_string()
                    } else {
                        goal_effects.join(", ")
                    }
                ),
                if_do_not_proceed,
                recommended_path: recommended_path.to_string(),
            },
        }
    }
}

#[async_trait]
impl AnalysisAgents for MockAgents {
    fn name(&self) -> &str {
        "mock"
    }

    async fn analyze_budgeting(&self, ctx: &AgentContext) -> Result<BudgetingAnalysis> {
        Ok(self.budgeting(ctx))
    }

    async fn analyze_investment(&self, ctx: &AgentContext) -> Result<InvestmentAnalysis> {
        Ok(self.investment(ctx))
    }

    async fn analyze_guardrail(&self, ctx: &AgentContext) -> Result<GuardrailAnalysis> {
        Ok(self.guardrail(ctx))
    }

    async fn analyze_validation(
        &self,
        ctx: &AgentContext,
        phase1: &Phase1Analyses,
    ) -> Result<ValidationAnalysis> {
        Ok(self.validation(ctx, phase1))
    }
}

impl TotalAnalysisAgents for MockAgents {}
