//! Core data models: user profile, accounts, goals, guardrails and actions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const CHECKING: &str = "checking";
pub const SAVINGS: &str = "savings";

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Conservative,
    Moderate,
    Aggressive,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LiquidityPreference {
    High,
    Medium,
    Low,
}

/// Coarse goal horizon: short < 2y, medium 2-5y, long 5y+
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimeHorizon {
    Short,
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseFrequency {
    Monthly,
    Annual,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Expense,
    Income,
    Transfer,
}

//
// ================= Accounts =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetAllocation {
    pub stocks: f64,
    pub bonds: f64,
    pub cash: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvestmentAccount {
    pub balance: f64,
    #[serde(default)]
    pub allocation: Option<AssetAllocation>,
}

impl InvestmentAccount {
    pub fn with_balance(balance: f64) -> Self {
        Self {
            balance,
            allocation: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Accounts {
    pub checking: f64,
    pub savings: f64,
    /// Investment sub-accounts keyed by account id (e.g. "taxable", "roth_ira")
    #[serde(default)]
    pub investments: BTreeMap<String, InvestmentAccount>,
}

impl Accounts {
    /// Balance of any account by id; `None` for unknown ids
    pub fn balance(&self, account_id: &str) -> Option<f64> {
        match account_id {
            CHECKING => Some(self.checking),
            SAVINGS => Some(self.savings),
            other => self.investments.get(other).map(|a| a.balance),
        }
    }

    pub fn has_account(&self, account_id: &str) -> bool {
        self.balance(account_id).is_some()
    }

    pub fn invested_total(&self) -> f64 {
        self.investments.values().map(|a| a.balance).sum()
    }

    pub fn liquid_total(&self) -> f64 {
        self.checking + self.savings
    }

    pub fn total(&self) -> f64 {
        self.liquid_total() + self.invested_total()
    }
}

//
// ================= Expenses & Transactions =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedExpense {
    pub id: String,
    pub name: String,
    pub amount: f64,
    pub frequency: ExpenseFrequency,
}

impl FixedExpense {
    pub fn monthly_amount(&self) -> f64 {
        match self.frequency {
            ExpenseFrequency::Monthly => self.amount,
            ExpenseFrequency::Annual => self.amount / 12.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub date: DateTime<Utc>,
    /// Negative amounts are outflows
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub kind: TransactionKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendingCategory {
    pub id: String,
    pub name: String,
    pub monthly_budget: f64,
    pub current_spent: f64,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl SpendingCategory {
    pub fn matches(&self, key: &str) -> bool {
        self.id == key || self.name == key
    }
}

//
// ================= Goals =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub name: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub deadline: DateTime<Utc>,
    /// 1 (highest) to 5
    pub priority: u8,
    pub time_horizon: TimeHorizon,
    #[serde(default)]
    pub linked_account_ids: Vec<String>,
}

impl Goal {
    pub fn is_linked_to(&self, account_id: &str) -> bool {
        self.linked_account_ids.iter().any(|id| id == account_id)
    }
}

//
// ================= Guardrails =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GuardrailKind {
    MinBalance { account_id: String, threshold: f64 },
    /// Threshold is a ratio (0.5 = 50%); `None` derives it from risk tolerance
    MaxInvestmentPct {
        #[serde(default)]
        threshold: Option<f64>,
    },
    ProtectedAccount { account_id: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Guardrail {
    pub id: String,
    /// User-declared rule text, e.g. "Never let checking drop below $1,000"
    pub rule: String,
    #[serde(flatten)]
    pub kind: GuardrailKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    pub risk_tolerance: RiskTolerance,
    pub liquidity_preference: LiquidityPreference,
    #[serde(default)]
    pub guardrails: Vec<Guardrail>,
}

//
// ================= User Profile =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub monthly_income: f64,
    pub accounts: Accounts,
    #[serde(default)]
    pub fixed_expenses: Vec<FixedExpense>,
    #[serde(default)]
    pub spending_categories: Vec<SpendingCategory>,
    #[serde(default)]
    pub goals: Vec<Goal>,
    pub preferences: Preferences,
}

impl UserProfile {
    /// Fixed expenses (normalised to monthly) plus all category budgets
    pub fn monthly_expenses(&self) -> f64 {
        let fixed: f64 = self.fixed_expenses.iter().map(FixedExpense::monthly_amount).sum();
        let variable: f64 = self.spending_categories.iter().map(|c| c.monthly_budget).sum();
        fixed + variable
    }

    pub fn monthly_surplus(&self) -> f64 {
        self.monthly_income - self.monthly_expenses()
    }

    pub fn goal(&self, goal_id: &str) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == goal_id)
    }

    pub fn category(&self, key: &str) -> Option<&SpendingCategory> {
        self.spending_categories.iter().find(|c| c.matches(key))
    }
}

//
// ================= Actions =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Save,
    Invest,
    Spend,
}

fn default_horizon_years() -> u32 {
    5
}

/// A proposed financial operation; immutable once constructed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FinancialAction {
    Save {
        amount: f64,
        #[serde(default)]
        goal_id: Option<String>,
    },
    Invest {
        amount: f64,
        target_account_id: String,
        #[serde(default)]
        goal_id: Option<String>,
        #[serde(default = "default_horizon_years")]
        time_horizon_years: u32,
    },
    Spend {
        amount: f64,
        category: String,
    },
}

impl FinancialAction {
    pub fn amount(&self) -> f64 {
        match self {
            FinancialAction::Save { amount, .. }
            | FinancialAction::Invest { amount, .. }
            | FinancialAction::Spend { amount, .. } => *amount,
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            FinancialAction::Save { .. } => ActionKind::Save,
            FinancialAction::Invest { .. } => ActionKind::Invest,
            FinancialAction::Spend { .. } => ActionKind::Spend,
        }
    }

    pub fn goal_id(&self) -> Option<&str> {
        match self {
            FinancialAction::Save { goal_id, .. } | FinancialAction::Invest { goal_id, .. } => {
                goal_id.as_deref()
            }
            FinancialAction::Spend { .. } => None,
        }
    }

    /// Account receiving the money; spending has none
    pub fn destination_account_id(&self) -> Option<&str> {
        match self {
            FinancialAction::Save { .. } => Some(SAVINGS),
            FinancialAction::Invest {
                target_account_id, ..
            } => Some(target_account_id.as_str()),
            FinancialAction::Spend { .. } => None,
        }
    }
}

impl fmt::Display for RiskTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskTolerance::Conservative => "conservative",
            RiskTolerance::Moderate => "moderate",
            RiskTolerance::Aggressive => "aggressive",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionKind::Save => "save",
            ActionKind::Invest => "invest",
            ActionKind::Spend => "spend",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_wire_format() {
        let action: FinancialAction = serde_json::from_value(serde_json::json!({
            "type": "invest",
            "amount": 500.0,
            "target_account_id": "taxable"
        }))
        .unwrap();

        assert_eq!(action.kind(), ActionKind::Invest);
        assert_eq!(action.destination_account_id(), Some("taxable"));
        assert!(matches!(
            action,
            FinancialAction::Invest {
                time_horizon_years: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_guardrail_wire_format() {
        let guardrail: Guardrail = serde_json::from_value(serde_json::json!({
            "id": "g1",
            "rule": "Keep $1,000 in checking",
            "type": "min_balance",
            "account_id": "checking",
            "threshold": 1000.0
        }))
        .unwrap();

        assert_eq!(
            guardrail.kind,
            GuardrailKind::MinBalance {
                account_id: "checking".to_string(),
                threshold: 1000.0
            }
        );
    }

    #[test]
    fn test_account_lookup() {
        let mut accounts = Accounts {
            checking: 100.0,
            savings: 200.0,
            investments: BTreeMap::new(),
        };
        accounts
            .investments
            .insert("taxable".to_string(), InvestmentAccount::with_balance(700.0));

        assert_eq!(accounts.balance("taxable"), Some(700.0));
        assert_eq!(accounts.balance("brokerage"), None);
        assert_eq!(accounts.total(), 1000.0);
        assert_eq!(accounts.invested_total(), 700.0);
    }
}
