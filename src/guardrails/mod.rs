//! Guardrail evaluator
//!
//! Rules-based checks of a projected scenario against user-declared
//! constraints. Deterministic; reports every finding in declaration order.

use crate::models::{Accounts, Guardrail, GuardrailKind, RiskTolerance};
use crate::simulation::Scenario;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, warn};

/// A balance within this factor above a minimum is reported as a warning
const MIN_BALANCE_WARNING_FACTOR: f64 = 1.1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailType {
    MinBalance,
    MaxInvestmentPct,
    ProtectedAccount,
}

impl From<&GuardrailKind> for GuardrailType {
    fn from(kind: &GuardrailKind) -> Self {
        match kind {
            GuardrailKind::MinBalance { .. } => GuardrailType::MinBalance,
            GuardrailKind::MaxInvestmentPct { .. } => GuardrailType::MaxInvestmentPct,
            GuardrailKind::ProtectedAccount { .. } => GuardrailType::ProtectedAccount,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuardrailFinding {
    pub guardrail_id: String,
    pub rule_description: String,
    pub guardrail_type: GuardrailType,
    pub severity: Severity,
    pub current_value: f64,
    pub threshold_value: f64,
    /// Amount by which the action should shrink to comply, where computable
    pub suggested_adjustment: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GuardrailReport {
    pub violations: Vec<GuardrailFinding>,
    pub warnings: Vec<GuardrailFinding>,
}

impl GuardrailReport {
    pub fn can_proceed(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn has_critical(&self) -> bool {
        self.violations
            .iter()
            .any(|v| v.severity == Severity::Critical)
    }

    pub fn max_severity(&self) -> Option<Severity> {
        self.violations
            .iter()
            .chain(self.warnings.iter())
            .map(|f| f.severity)
            .max()
    }
}

/// Everything a guardrail may look at
pub struct GuardrailInput<'a> {
    pub accounts_before: &'a Accounts,
    pub scenario: &'a Scenario,
    pub risk_tolerance: RiskTolerance,
}

/// Stateless evaluator of user guardrails
#[derive(Debug, Clone, Default)]
pub struct GuardrailEvaluator;

impl GuardrailEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, input: &GuardrailInput<'_>, guardrails: &[Guardrail]) -> GuardrailReport {
        let mut report = GuardrailReport::default();

        for guardrail in guardrails {
            match &guardrail.kind {
                GuardrailKind::MinBalance {
                    account_id,
                    threshold,
                } => self.check_min_balance(input, guardrail, account_id, *threshold, &mut report),
                GuardrailKind::MaxInvestmentPct { threshold } => {
                    self.check_max_investment(input, guardrail, *threshold, &mut report)
                }
                GuardrailKind::ProtectedAccount { account_id } => {
                    self.check_protected(input, guardrail, account_id, &mut report)
                }
            }
        }

        debug!(
            guardrails = guardrails.len(),
            violations = report.violations.len(),
            warnings = report.warnings.len(),
            "Guardrail evaluation completed"
        );

        report
    }

    fn check_min_balance(
        &self,
        input: &GuardrailInput<'_>,
        guardrail: &Guardrail,
        account_id: &str,
        threshold: f64,
        report: &mut GuardrailReport,
    ) {
        let Some(projected) = input.scenario.accounts_after.balance(account_id) else {
            warn!(guardrail_id = %guardrail.id, account_id, "Guardrail references unknown account");
            return;
        };

        if projected < threshold {
            report.violations.push(finding(
                guardrail,
                Severity::Critical,
                projected,
                threshold,
                Some(threshold - projected),
            ));
        } else if projected < threshold * MIN_BALANCE_WARNING_FACTOR {
            report
                .warnings
                .push(finding(guardrail, Severity::Info, projected, threshold, None));
        }
    }

    fn check_max_investment(
        &self,
        input: &GuardrailInput<'_>,
        guardrail: &Guardrail,
        explicit_threshold: Option<f64>,
        report: &mut GuardrailReport,
    ) {
        let Some(threshold) =
            explicit_threshold.or_else(|| max_investment_ratio(input.risk_tolerance))
        else {
            return;
        };

        let accounts = &input.scenario.accounts_after;
        let total = accounts.total();
        if total <= 0.0 {
            return;
        }

        let invested = accounts.invested_total();
        let ratio = invested / total;

        if ratio > threshold {
            report.violations.push(finding(
                guardrail,
                Severity::Critical,
                ratio,
                threshold,
                Some(invested - threshold * total),
            ));
        }
    }

    fn check_protected(
        &self,
        input: &GuardrailInput<'_>,
        guardrail: &Guardrail,
        account_id: &str,
        report: &mut GuardrailReport,
    ) {
        let (Some(before), Some(after)) = (
            input.accounts_before.balance(account_id),
            input.scenario.accounts_after.balance(account_id),
        ) else {
            warn!(guardrail_id = %guardrail.id, account_id, "Guardrail references unknown account");
            return;
        };

        if after < before {
            report.violations.push(finding(
                guardrail,
                Severity::Critical,
                after,
                before,
                Some(before - after),
            ));
        }
    }
}

/// Allocation cap implied by risk tolerance; aggressive is unconstrained
pub fn max_investment_ratio(risk: RiskTolerance) -> Option<f64> {
    match risk {
        RiskTolerance::Conservative => Some(0.30),
        RiskTolerance::Moderate => Some(0.50),
        RiskTolerance::Aggressive => None,
    }
}

fn finding(
    guardrail: &Guardrail,
    severity: Severity,
    current_value: f64,
    threshold_value: f64,
    suggested_adjustment: Option<f64>,
) -> GuardrailFinding {
    GuardrailFinding {
        guardrail_id: guardrail.id.clone(),
        rule_description: guardrail.rule.clone(),
        guardrail_type: GuardrailType::from(&guardrail.kind),
        severity,
        current_value,
        threshold_value,
        suggested_adjustment,
    }
}

//
// ================= Severity Ordering =================
//

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl Severity {
    fn rank(&self) -> u8 {
        match self {
            Severity::Info => 0,
            Severity::Warning => 1,
            Severity::Critical => 2,
        }
    }
}

//
// ================= Tests =================
//
