//! Simulation engine
//!
//! Deterministically projects what happens to accounts, goals and budgets
//! if the user takes a proposed action, and if they don't.
//! No randomness and no wall clock: an optional `as_of` timestamp is the
//! only time input and is carried through unchanged.

pub mod projection;

use crate::error::DecisionError;
use crate::models::{FinancialAction, Goal, RiskTolerance, SpendingCategory, UserProfile};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Write;
use tracing::debug;

use projection::{future_value, months_saved, months_to_goal, percentage_of_gap, years_to_months};

//
// ================= Configuration =================
//

/// Annual return assumptions keyed by risk tolerance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAdjustedReturns {
    pub conservative: f64,
    pub moderate: f64,
    pub aggressive: f64,
}

impl Default for RiskAdjustedReturns {
    fn default() -> Self {
        Self {
            conservative: 0.05,
            moderate: 0.07,
            aggressive: 0.09,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Nominal annual return for investments
    pub investment_return: f64,
    /// Annual yield on savings
    pub savings_return: f64,
    /// Projection horizon when the action carries none
    pub default_horizon_years: u32,
    /// Checking balance under which liquidity is flagged
    pub liquidity_floor: f64,
    /// Share of a category budget at which it is in warning
    pub budget_warning_ratio: f64,
    /// When set, replaces `investment_return` by a per-risk-tolerance rate
    pub risk_adjusted_returns: Option<RiskAdjustedReturns>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            investment_return: 0.07,
            savings_return: 0.04,
            default_horizon_years: 5,
            liquidity_floor: 1000.0,
            budget_warning_ratio: 0.9,
            risk_adjusted_returns: None,
        }
    }
}

impl SimulationConfig {
    pub fn investment_rate(&self, risk: RiskTolerance) -> f64 {
        match &self.risk_adjusted_returns {
            Some(returns) => match risk {
                RiskTolerance::Conservative => returns.conservative,
                RiskTolerance::Moderate => returns.moderate,
                RiskTolerance::Aggressive => returns.aggressive,
            },
            None => self.investment_return,
        }
    }
}

//
// ================= Results =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    Ok,
    Warning,
    Over,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoalImpact {
    pub goal_id: String,
    pub goal_name: String,
    /// Percent of the remaining gap closed (negative when the action diverts money)
    pub percentage_change: f64,
    /// Months gained (positive) or lost (negative)
    pub months_saved: i32,
    pub projected_future_value: Option<f64>,
}

impl GoalImpact {
    fn unchanged(goal: &Goal) -> Self {
        Self {
            goal_id: goal.id.clone(),
            goal_name: goal.name.clone(),
            percentage_change: 0.0,
            months_saved: 0,
            projected_future_value: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetImpact {
    pub category_id: String,
    pub category_name: String,
    pub percent_used: f64,
    pub amount_remaining: f64,
    pub status: BudgetStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityTrigger {
    BelowMinimumBuffer,
    BelowOneMonthExpenses,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiquidityImpact {
    pub checking_after: f64,
    pub threshold: f64,
    pub shortfall: f64,
    pub trigger: LiquidityTrigger,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionBasis {
    /// Growth of the money actually invested
    Realized,
    /// Growth forgone by spending the money instead
    OpportunityCost,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrowthProjection {
    pub principal: f64,
    pub annual_return: f64,
    pub years: u32,
    pub future_value: f64,
    pub projected_gain: f64,
    pub basis: ProjectionBasis,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub accounts_after: crate::models::Accounts,
    pub goal_impacts: Vec<GoalImpact>,
    pub budget_impacts: Vec<BudgetImpact>,
    pub liquidity_impact: Option<LiquidityImpact>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationResult {
    pub action: FinancialAction,
    pub scenario_if_do: Scenario,
    pub scenario_if_not_do: Scenario,
    pub growth_projection: Option<GrowthProjection>,
    pub as_of: Option<DateTime<Utc>>,
}

impl SimulationResult {
    /// SHA-256 of the canonical JSON form; equal results give equal fingerprints
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();

        if serde_json::to_writer(&mut HashWriter(&mut hasher), self).is_err() {
            return String::new();
        }

        hex::encode(hasher.finalize())
    }
}

/// Adapter to allow writing into Sha256 via std::io::Write
struct HashWriter<'a, H: Digest>(&'a mut H);

impl<'a, H: Digest> Write for HashWriter<'a, H> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

//
// ================= Engine =================
//

/// Stateless simulation engine
#[derive(Debug, Clone, Default)]
pub struct SimulationEngine {
    config: SimulationConfig,
}

impl SimulationEngine {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn simulate(&self, user: &UserProfile, action: &FinancialAction) -> Result<SimulationResult> {
        self.simulate_as_of(user, action, None)
    }

    pub fn simulate_save(
        &self,
        user: &UserProfile,
        amount: f64,
        goal_id: Option<String>,
    ) -> Result<SimulationResult> {
        self.simulate(user, &FinancialAction::Save { amount, goal_id })
    }

    pub fn simulate_invest(
        &self,
        user: &UserProfile,
        amount: f64,
        target_account_id: String,
        goal_id: Option<String>,
        time_horizon_years: u32,
    ) -> Result<SimulationResult> {
        self.simulate(
            user,
            &FinancialAction::Invest {
                amount,
                target_account_id,
                goal_id,
                time_horizon_years,
            },
        )
    }

    pub fn simulate_spend(
        &self,
        user: &UserProfile,
        amount: f64,
        category: String,
    ) -> Result<SimulationResult> {
        self.simulate(user, &FinancialAction::Spend { amount, category })
    }

    /// Simulate each action independently against the same profile
    pub fn compare(
        &self,
        user: &UserProfile,
        actions: &[FinancialAction],
    ) -> Result<Vec<SimulationResult>> {
        actions
            .iter()
            .map(|action| self.simulate(user, action))
            .collect()
    }

    pub fn simulate_as_of(
        &self,
        user: &UserProfile,
        action: &FinancialAction,
        as_of: Option<DateTime<Utc>>,
    ) -> Result<SimulationResult> {
        validate_action(user, action)?;

        let amount = action.amount();
        let rate = self.action_rate(user, action);
        let mut accounts_after = user.accounts.clone();

        match action {
            FinancialAction::Save { .. } => {
                accounts_after.checking -= amount;
                accounts_after.savings += amount;
            }
            FinancialAction::Invest {
                target_account_id, ..
            } => {
                accounts_after.checking -= amount;
                if let Some(account) = accounts_after.investments.get_mut(target_account_id) {
                    account.balance += amount;
                }
            }
            FinancialAction::Spend { .. } => {
                accounts_after.checking -= amount;
            }
        }

        let horizon_years = match action {
            FinancialAction::Invest {
                time_horizon_years, ..
            } => *time_horizon_years,
            _ => self.config.default_horizon_years,
        };

        let goals = impacted_goals(user, action);
        let goal_impacts: Vec<GoalImpact> = goals
            .iter()
            .map(|goal| self.goal_impact(user, goal, action, rate, horizon_years, as_of))
            .collect();

        let spend_target = match action {
            FinancialAction::Spend { category, amount } => Some((category.as_str(), *amount)),
            _ => None,
        };
        if let Some((category, _)) = spend_target {
            if user.category(category).is_none() {
                debug!(category = %category, "Spend category not found, budgets unchanged");
            }
        }

        let scenario_if_do = Scenario {
            liquidity_impact: self.liquidity_impact(user, accounts_after.checking),
            accounts_after,
            goal_impacts,
            budget_impacts: self.budget_impacts(user, spend_target),
        };

        let scenario_if_not_do = Scenario {
            accounts_after: user.accounts.clone(),
            goal_impacts: goals.iter().map(|g| GoalImpact::unchanged(g)).collect(),
            budget_impacts: self.budget_impacts(user, None),
            liquidity_impact: self.liquidity_impact(user, user.accounts.checking),
        };

        let growth_projection = self.growth_projection(user, action, horizon_years);

        debug!(
            user_id = %user.id,
            action = %action.kind(),
            amount,
            goals = scenario_if_do.goal_impacts.len(),
            liquidity_flagged = scenario_if_do.liquidity_impact.is_some(),
            "Simulation completed"
        );

        Ok(SimulationResult {
            action: action.clone(),
            scenario_if_do,
            scenario_if_not_do,
            growth_projection,
            as_of,
        })
    }

    fn action_rate(&self, user: &UserProfile, action: &FinancialAction) -> f64 {
        match action {
            FinancialAction::Save { .. } => self.config.savings_return,
            FinancialAction::Invest { .. } => {
                self.config.investment_rate(user.preferences.risk_tolerance)
            }
            FinancialAction::Spend { .. } => 0.0,
        }
    }

    fn goal_impact(
        &self,
        user: &UserProfile,
        goal: &Goal,
        action: &FinancialAction,
        rate: f64,
        horizon_years: u32,
        as_of: Option<DateTime<Utc>>,
    ) -> GoalImpact {
        let amount = action.amount();
        let signed_amount = match action {
            FinancialAction::Spend { .. } => -amount,
            _ => amount,
        };

        let (percentage_change, remaining) = match percentage_of_gap(signed_amount, goal) {
            Ok(pct) => (pct, goal.target_amount - goal.current_amount),
            Err(e) => {
                debug!(goal_id = %goal.id, error = %e, "Goal has no remaining gap, zero impact");
                return GoalImpact::unchanged(goal);
            }
        };

        let months = months_to_goal(remaining, user.monthly_surplus(), rate);

        let projected_future_value = (signed_amount > 0.0).then(|| {
            let horizon_months = as_of
                .and_then(|t| months_until(t, goal.deadline))
                .unwrap_or(horizon_years * 12);
            future_value(amount, 0.0, rate, horizon_months)
        });

        GoalImpact {
            goal_id: goal.id.clone(),
            goal_name: goal.name.clone(),
            percentage_change: (percentage_change * 10.0).round() / 10.0,
            months_saved: months_saved(months, percentage_change),
            projected_future_value,
        }
    }

    fn budget_impacts(&self, user: &UserProfile, spend: Option<(&str, f64)>) -> Vec<BudgetImpact> {
        user.spending_categories
            .iter()
            .map(|category| {
                let added = match spend {
                    Some((key, amount)) if category.matches(key) => amount,
                    _ => 0.0,
                };
                self.budget_impact(category, added)
            })
            .collect()
    }

    fn budget_impact(&self, category: &SpendingCategory, added: f64) -> BudgetImpact {
        let spent = category.current_spent + added;
        let budget = category.monthly_budget;

        let percent_used = if budget > 0.0 {
            spent / budget * 100.0
        } else if spent > 0.0 {
            100.0
        } else {
            0.0
        };

        let status = if spent > budget {
            BudgetStatus::Over
        } else if budget > 0.0 && spent >= budget * self.config.budget_warning_ratio {
            BudgetStatus::Warning
        } else {
            BudgetStatus::Ok
        };

        BudgetImpact {
            category_id: category.id.clone(),
            category_name: category.name.clone(),
            percent_used,
            amount_remaining: budget - spent,
            status,
        }
    }

    fn liquidity_impact(&self, user: &UserProfile, checking_after: f64) -> Option<LiquidityImpact> {
        let monthly_expenses = user.monthly_expenses();

        let (threshold, trigger) = if monthly_expenses > self.config.liquidity_floor {
            (monthly_expenses, LiquidityTrigger::BelowOneMonthExpenses)
        } else {
            (self.config.liquidity_floor, LiquidityTrigger::BelowMinimumBuffer)
        };

        (checking_after < threshold).then(|| LiquidityImpact {
            checking_after,
            threshold,
            shortfall: threshold - checking_after,
            trigger,
        })
    }

    fn growth_projection(
        &self,
        user: &UserProfile,
        action: &FinancialAction,
        horizon_years: u32,
    ) -> Option<GrowthProjection> {
        let basis = match action {
            FinancialAction::Invest { .. } => ProjectionBasis::Realized,
            FinancialAction::Spend { .. } => ProjectionBasis::OpportunityCost,
            FinancialAction::Save { .. } => return None,
        };

        let principal = action.amount();
        let annual_return = self.config.investment_rate(user.preferences.risk_tolerance);
        let future_value = future_value(principal, 0.0, annual_return, horizon_years * 12);

        Some(GrowthProjection {
            principal,
            annual_return,
            years: horizon_years,
            future_value,
            projected_gain: future_value - principal,
            basis,
        })
    }
}

fn validate_action(user: &UserProfile, action: &FinancialAction) -> Result<()> {
    let amount = action.amount();
    if !amount.is_finite() || amount < 0.0 {
        return Err(DecisionError::InvalidInput(format!(
            "action amount must be a non-negative number, got {}",
            amount
        )));
    }

    if let Some(goal_id) = action.goal_id() {
        if user.goal(goal_id).is_none() {
            return Err(DecisionError::InvalidInput(format!(
                "unknown goal id: {}",
                goal_id
            )));
        }
    }

    if let FinancialAction::Invest {
        target_account_id,
        time_horizon_years,
        ..
    } = action
    {
        if !user.accounts.investments.contains_key(target_account_id) {
            return Err(DecisionError::InvalidInput(format!(
                "unknown investment account: {}",
                target_account_id
            )));
        }
        if *time_horizon_years == 0 {
            return Err(DecisionError::InvalidInput(
                "time horizon must be at least one year".to_string(),
            ));
        }
    }

    Ok(())
}

/// Explicit goal, else goals linked to the destination account, else all goals
fn impacted_goals<'a>(user: &'a UserProfile, action: &FinancialAction) -> Vec<&'a Goal> {
    if let Some(goal_id) = action.goal_id() {
        return user.goal(goal_id).into_iter().collect();
    }

    if let Some(account_id) = action.destination_account_id() {
        let linked: Vec<&Goal> = user
            .goals
            .iter()
            .filter(|g| g.is_linked_to(account_id))
            .collect();
        if !linked.is_empty() {
            return linked;
        }
    }

    user.goals.iter().collect()
}

fn months_until(from: DateTime<Utc>, to: DateTime<Utc>) -> Option<u32> {
    let days = (to - from).num_days();
    (days > 0).then(|| years_to_months(days as f64 / 365.25))
}

//
// ================= Tests =================
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{demo_profile, simple_profile};
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn test_save_moves_money_to_savings() {
        let user = simple_profile(1200.0, 1000.0);
        let engine = SimulationEngine::default();

        let result = engine.simulate_save(&user, 50.0, None).unwrap();

        assert_eq!(result.scenario_if_do.accounts_after.checking, 1150.0);
        assert_eq!(result.scenario_if_do.accounts_after.savings, 5050.0);
        assert_eq!(result.scenario_if_not_do.accounts_after, user.accounts);
        assert!(result.growth_projection.is_none());
    }

    #[test]
    fn test_invest_headline_projection() {
        let user = simple_profile(10_000.0, 1000.0);
        let engine = SimulationEngine::default();

        let result = engine
            .simulate_invest(&user, 5000.0, "taxable".to_string(), None, 5)
            .unwrap();

        let projection = result.growth_projection.unwrap();
        assert_eq!(projection.basis, ProjectionBasis::Realized);
        assert_eq!(projection.annual_return, 0.07);
        let expected = 5000.0 * (1.0_f64 + 0.07 / 12.0).powi(60);
        assert!((projection.future_value - expected).abs() < 0.01);
        assert_eq!(
            result.scenario_if_do.accounts_after.balance("taxable"),
            Some(15_000.0)
        );
    }

    #[test]
    fn test_risk_adjusted_returns_opt_in() {
        let user = simple_profile(10_000.0, 1000.0);
        let engine = SimulationEngine::new(SimulationConfig {
            risk_adjusted_returns: Some(RiskAdjustedReturns::default()),
            ..SimulationConfig::default()
        });

        let result = engine
            .simulate_invest(&user, 1000.0, "taxable".to_string(), None, 5)
            .unwrap();

        // simple_profile is moderate
        assert_eq!(result.growth_projection.unwrap().annual_return, 0.07);
    }

    #[test]
    fn test_goal_impact_for_linked_goal() {
        let user = demo_profile();
        let engine = SimulationEngine::default();

        // emergency fund: 15,000 target, 8,000 current, linked to savings
        let result = engine.simulate_save(&user, 700.0, None).unwrap();

        assert_eq!(result.scenario_if_do.goal_impacts.len(), 1);
        let impact = &result.scenario_if_do.goal_impacts[0];
        assert_eq!(impact.goal_id, "emergency-fund");
        assert_eq!(impact.percentage_change, 10.0);
        assert!(impact.months_saved >= 0);
        assert!(impact.projected_future_value.unwrap() > 700.0);

        let untouched = &result.scenario_if_not_do.goal_impacts[0];
        assert_eq!(untouched.percentage_change, 0.0);
        assert_eq!(untouched.months_saved, 0);
    }

    #[test]
    fn test_spend_delays_goals() {
        let mut user = demo_profile();
        user.monthly_income = 3000.0; // surplus of 400/month
        let engine = SimulationEngine::default();

        let result = engine
            .simulate_spend(&user, 3500.0, "dining".to_string())
            .unwrap();

        let emergency = result
            .scenario_if_do
            .goal_impacts
            .iter()
            .find(|g| g.goal_id == "emergency-fund")
            .unwrap();
        assert!(emergency.percentage_change < 0.0);
        assert!(emergency.months_saved < 0);
        assert!(emergency.projected_future_value.is_none());

        assert_eq!(
            result.growth_projection.unwrap().basis,
            ProjectionBasis::OpportunityCost
        );
    }

    #[test]
    fn test_degenerate_goal_reports_zero_impact() {
        let mut user = demo_profile();
        user.goals[0].current_amount = user.goals[0].target_amount;
        let engine = SimulationEngine::default();

        let result = engine
            .simulate_save(&user, 500.0, Some("emergency-fund".to_string()))
            .unwrap();

        let impact = &result.scenario_if_do.goal_impacts[0];
        assert_eq!(impact.percentage_change, 0.0);
        assert_eq!(impact.months_saved, 0);
    }

    #[test]
    fn test_spend_budget_classification() {
        let user = demo_profile();
        let engine = SimulationEngine::default();

        // dining: budget 250, spent 200
        let status_after = |amount: f64| {
            engine
                .simulate_spend(&user, amount, "dining".to_string())
                .unwrap()
                .scenario_if_do
                .budget_impacts
                .into_iter()
                .find(|b| b.category_id == "dining")
                .unwrap()
                .status
        };

        assert_eq!(status_after(10.0), BudgetStatus::Ok);
        assert_eq!(status_after(30.0), BudgetStatus::Warning);
        assert_eq!(status_after(50.0), BudgetStatus::Warning);
        assert_eq!(status_after(60.0), BudgetStatus::Over);
    }

    #[test]
    fn test_liquidity_flag() {
        let user = simple_profile(1200.0, 1000.0);
        let engine = SimulationEngine::default();

        let ok = engine.simulate_save(&user, 100.0, None).unwrap();
        assert!(ok.scenario_if_do.liquidity_impact.is_none());

        let low = engine.simulate_save(&user, 400.0, None).unwrap();
        let impact = low.scenario_if_do.liquidity_impact.unwrap();
        assert_eq!(impact.trigger, LiquidityTrigger::BelowMinimumBuffer);
        assert_eq!(impact.shortfall, 200.0);

        let big_spender = simple_profile(2500.0, 3000.0);
        let flagged = engine.simulate_save(&big_spender, 0.0, None).unwrap();
        assert_eq!(
            flagged.scenario_if_do.liquidity_impact.unwrap().trigger,
            LiquidityTrigger::BelowOneMonthExpenses
        );
    }

    #[test]
    fn test_invalid_input_rejected() {
        let user = simple_profile(1200.0, 1000.0);
        let engine = SimulationEngine::default();

        assert!(matches!(
            engine.simulate_save(&user, -5.0, None),
            Err(DecisionError::InvalidInput(_))
        ));
        assert!(matches!(
            engine.simulate_save(&user, 5.0, Some("missing".to_string())),
            Err(DecisionError::InvalidInput(_))
        ));
        assert!(matches!(
            engine.simulate_invest(&user, 5.0, "brokerage".to_string(), None, 5),
            Err(DecisionError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_compare_preserves_order() {
        let user = demo_profile();
        let engine = SimulationEngine::default();
        let actions = vec![
            FinancialAction::Spend {
                amount: 40.0,
                category: "groceries".to_string(),
            },
            FinancialAction::Save {
                amount: 40.0,
                goal_id: None,
            },
        ];

        let results = engine.compare(&user, &actions).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].action, actions[0]);
        assert_eq!(results[1].action, actions[1]);
    }

    #[test]
    fn test_as_of_is_carried_and_used_for_goal_horizon() {
        let user = demo_profile();
        let engine = SimulationEngine::default();
        let as_of = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();
        let action = FinancialAction::Save {
            amount: 1000.0,
            goal_id: Some("emergency-fund".to_string()),
        };

        let dated = engine.simulate_as_of(&user, &action, Some(as_of)).unwrap();
        let undated = engine.simulate(&user, &action).unwrap();

        assert_eq!(dated.as_of, Some(as_of));
        assert!(undated.as_of.is_none());
        // deadline is closer than the default five-year horizon
        assert!(
            dated.scenario_if_do.goal_impacts[0].projected_future_value
                < undated.scenario_if_do.goal_impacts[0].projected_future_value
        );
    }

    #[test]
    fn test_simulation_is_deterministic() {
        let user = demo_profile();
        let engine = SimulationEngine::default();
        let action = FinancialAction::Invest {
            amount: 2500.0,
            target_account_id: "roth_ira".to_string(),
            goal_id: None,
            time_horizon_years: 10,
        };

        let first = engine.simulate(&user, &action).unwrap();
        let second = engine.simulate(&user, &action).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.fingerprint(), second.fingerprint());
        assert_eq!(first.fingerprint().len(), 64);
    }

    proptest! {
        #[test]
        fn prop_save_conserves_money(checking in 0.0f64..50_000.0, amount in 0.0f64..20_000.0) {
            let user = simple_profile(checking, 1000.0);
            let result = SimulationEngine::default().simulate_save(&user, amount, None).unwrap();

            let before = user.accounts.checking + user.accounts.savings;
            let after = result.scenario_if_do.accounts_after.checking
                + result.scenario_if_do.accounts_after.savings;
            prop_assert!((before - after).abs() < 1e-6);
        }

        #[test]
        fn prop_invest_conserves_money(checking in 0.0f64..50_000.0, amount in 0.0f64..20_000.0) {
            let user = simple_profile(checking, 1000.0);
            let result = SimulationEngine::default()
                .simulate_invest(&user, amount, "taxable".to_string(), None, 5)
                .unwrap();

            let before = user.accounts.checking + user.accounts.balance("taxable").unwrap();
            let accounts = &result.scenario_if_do.accounts_after;
            let after = accounts.checking + accounts.balance("taxable").unwrap();
            prop_assert!((before - after).abs() < 1e-6);
        }

        #[test]
        fn prop_fingerprint_stable(amount in 0.0f64..10_000.0) {
            let user = demo_profile();
            let engine = SimulationEngine::default();
            let a = engine.simulate_spend(&user, amount, "groceries".to_string()).unwrap();
            let b = engine.simulate_spend(&user, amount, "groceries".to_string()).unwrap();
            prop_assert_eq!(a.fingerprint(), b.fingerprint());
        }
    }
}
