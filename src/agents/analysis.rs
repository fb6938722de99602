//! Analysis records produced by every agent set
//!
//! These shapes are shared by the mock and the externally-delegated
//! implementations; only the content differs.

use crate::guardrails::{GuardrailFinding, GuardrailReport};
use serde::{Deserialize, Serialize};

use super::AgentCapability;

/// =============================
/// Recommendation Scales
/// =============================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StronglyApprove,
    Approve,
    ApproveWithCaution,
    NotRecommended,
    StronglyOppose,
    Blocked,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataQuality {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OverallRecommendation {
    ProceedConfidently,
    Proceed,
    ProceedWithCaution,
    Reconsider,
    DoNotProceed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OverallConfidence {
    High,
    Medium,
    Low,
    VeryLow,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusLevel {
    Unanimous,
    Strong,
    Moderate,
    Weak,
    Divided,
}

/// =============================
/// Budgeting
/// =============================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetingMetrics {
    /// Checking after the action over monthly expenses; `None` when the
    /// profile has no expenses, so coverage is unbounded
    pub months_of_expenses_remaining: Option<f64>,
    pub monthly_expense_average: f64,
    pub spending_variance_coefficient: f64,
    pub months_of_historical_data: u32,
    pub over_budget_categories: Vec<String>,
    pub budget_utilization_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetingAnalysis {
    pub recommendation: Recommendation,
    pub confidence: f64,
    pub reasoning: String,
    pub key_findings: Vec<String>,
    pub concerns: Vec<String>,
    pub data_quality: DataQuality,
    #[serde(default)]
    pub alternative_suggestions: Vec<String>,
    pub budgeting_metrics: BudgetingMetrics,
}

/// =============================
/// Investment
/// =============================

/// Empty for actions that are not investments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct InvestmentMetrics {
    #[serde(default)]
    pub projected_value_5yr: Option<f64>,
    #[serde(default)]
    pub annualized_return_assumption: Option<f64>,
    /// Months saved toward the goal; positive means it is reached sooner
    #[serde(default)]
    pub time_to_goal_impact_months: Option<i32>,
    #[serde(default)]
    pub risk_assessment: Option<RiskLevel>,
    #[serde(default)]
    pub goal_alignment_score: Option<f64>,
    #[serde(default)]
    pub diversification_impact: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvestmentAnalysis {
    pub recommendation: Recommendation,
    pub confidence: f64,
    pub reasoning: String,
    pub key_findings: Vec<String>,
    pub concerns: Vec<String>,
    pub data_quality: DataQuality,
    #[serde(default)]
    pub alternative_suggestions: Vec<String>,
    #[serde(default)]
    pub investment_metrics: InvestmentMetrics,
}

/// =============================
/// Guardrail
/// =============================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuardrailAnalysis {
    pub violated: bool,
    pub can_proceed: bool,
    pub violations: Vec<GuardrailFinding>,
    pub warnings: Vec<GuardrailFinding>,
    pub compliance_summary: String,
}

impl From<GuardrailReport> for GuardrailAnalysis {
    fn from(report: GuardrailReport) -> Self {
        let compliance_summary = if report.violations.is_empty() {
            "all guardrails satisfied".to_string()
        } else {
            format!("{} guardrail violation(s)", report.violations.len())
        };

        Self {
            violated: !report.violations.is_empty(),
            can_proceed: report.can_proceed(),
            violations: report.violations,
            warnings: report.warnings,
            compliance_summary,
        }
    }
}

/// =============================
/// Validation
/// =============================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContradictionSeverity {
    Major,
    Minor,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contradiction {
    pub agent_a: AgentCapability,
    pub agent_b: AgentCapability,
    pub description: String,
    pub severity: ContradictionSeverity,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UncertaintySource {
    pub source: String,
    pub impact: ImpactLevel,
    #[serde(default)]
    pub mitigation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataSufficiency {
    pub sufficient: bool,
    pub missing_data_types: Vec<String>,
    pub data_quality_score: f64,
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentConsensus {
    pub agents_approving: u32,
    pub agents_cautioning: u32,
    pub agents_opposing: u32,
    pub consensus_level: ConsensusLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionTree {
    pub if_proceed: String,
    pub if_do_not_proceed: String,
    pub recommended_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationAnalysis {
    pub overall_recommendation: OverallRecommendation,
    pub overall_confidence: OverallConfidence,
    pub contradictions_found: Vec<Contradiction>,
    pub uncertainty_sources: Vec<UncertaintySource>,
    pub data_sufficiency: DataSufficiency,
    pub agent_consensus: AgentConsensus,
    pub final_summary: String,
    pub decision_tree: DecisionTree,
}

/// Any single capability's output, as carried by streaming events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AgentAnalysis {
    Budgeting(BudgetingAnalysis),
    Investment(InvestmentAnalysis),
    Guardrail(GuardrailAnalysis),
    Validation(ValidationAnalysis),
}

impl AgentAnalysis {
    pub fn capability(&self) -> AgentCapability {
        match self {
            AgentAnalysis::Budgeting(_) => AgentCapability::Budgeting,
            AgentAnalysis::Investment(_) => AgentCapability::Investment,
            AgentAnalysis::Guardrail(_) => AgentCapability::Guardrail,
            AgentAnalysis::Validation(_) => AgentCapability::Validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_investment_metrics_accept_empty_object() {
        let analysis: InvestmentAnalysis = serde_json::from_value(serde_json::json!({
            "recommendation": "not_recommended",
            "confidence": 0.7,
            "reasoning": "not an investment",
            "key_findings": ["spend action"],
            "concerns": [],
            "data_quality": "high",
            "investment_metrics": {}
        }))
        .unwrap();

        assert_eq!(analysis.recommendation, Recommendation::NotRecommended);
        assert_eq!(analysis.investment_metrics, InvestmentMetrics::default());
        assert!(analysis.alternative_suggestions.is_empty());
    }

    #[test]
    fn test_empty_report_converts_to_passing_analysis() {
        let analysis = GuardrailAnalysis::from(GuardrailReport::default());
        assert!(analysis.can_proceed);
        assert!(!analysis.violated);
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_value(Recommendation::ApproveWithCaution).unwrap(),
            "approve_with_caution"
        );
        assert_eq!(
            serde_json::to_value(OverallRecommendation::DoNotProceed).unwrap(),
            "do_not_proceed"
        );
        assert_eq!(serde_json::to_value(OverallConfidence::VeryLow).unwrap(), "very_low");
    }
}
