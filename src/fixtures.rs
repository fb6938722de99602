//! Built-in demo profile

use crate::models::{
    Accounts, AssetAllocation, ExpenseFrequency, FixedExpense, Goal, Guardrail, GuardrailKind,
    InvestmentAccount, LiquidityPreference, Preferences, RiskTolerance, SpendingCategory,
    TimeHorizon, Transaction, TransactionKind, UserProfile,
};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

fn expense(id: &str, category: &str, date: DateTime<Utc>, amount: f64) -> Transaction {
    Transaction {
        id: id.to_string(),
        date,
        amount: -amount,
        category: category.to_string(),
        description: String::new(),
        kind: TransactionKind::Expense,
    }
}

/// A moderate-risk profile with three months of history, two goals and a
/// checking floor of $1,000.
pub fn demo_profile() -> UserProfile {
    let mut investments = BTreeMap::new();
    investments.insert(
        "taxable".to_string(),
        InvestmentAccount {
            balance: 12_000.0,
            allocation: Some(AssetAllocation {
                stocks: 80.0,
                bonds: 15.0,
                cash: 5.0,
            }),
        },
    );
    investments.insert("roth_ira".to_string(), InvestmentAccount::with_balance(6_500.0));

    UserProfile {
        id: "demo-user".to_string(),
        name: "Demo User".to_string(),
        monthly_income: 5_000.0,
        accounts: Accounts {
            checking: 3_200.0,
            savings: 8_000.0,
            investments,
        },
        fixed_expenses: vec![
            FixedExpense {
                id: "rent".to_string(),
                name: "Rent".to_string(),
                amount: 1_600.0,
                frequency: ExpenseFrequency::Monthly,
            },
            FixedExpense {
                id: "insurance".to_string(),
                name: "Insurance".to_string(),
                amount: 1_200.0,
                frequency: ExpenseFrequency::Annual,
            },
        ],
        spending_categories: vec![
            SpendingCategory {
                id: "groceries".to_string(),
                name: "Groceries".to_string(),
                monthly_budget: 500.0,
                current_spent: 320.0,
                transactions: vec![
                    expense("t1", "groceries", date(2026, 7, 3), 410.0),
                    expense("t2", "groceries", date(2026, 8, 5), 470.0),
                    expense("t3", "groceries", date(2026, 9, 4), 320.0),
                ],
            },
            SpendingCategory {
                id: "dining".to_string(),
                name: "Dining".to_string(),
                monthly_budget: 250.0,
                current_spent: 200.0,
                transactions: vec![
                    expense("t4", "dining", date(2026, 7, 19), 180.0),
                    expense("t5", "dining", date(2026, 9, 12), 200.0),
                ],
            },
            SpendingCategory {
                id: "entertainment".to_string(),
                name: "Entertainment".to_string(),
                monthly_budget: 150.0,
                current_spent: 40.0,
                transactions: vec![],
            },
        ],
        goals: vec![
            Goal {
                id: "emergency-fund".to_string(),
                name: "Emergency Fund".to_string(),
                target_amount: 15_000.0,
                current_amount: 8_000.0,
                deadline: date(2027, 12, 31),
                priority: 1,
                time_horizon: TimeHorizon::Short,
                linked_account_ids: vec!["savings".to_string()],
            },
            Goal {
                id: "retirement".to_string(),
                name: "Retirement".to_string(),
                target_amount: 500_000.0,
                current_amount: 18_500.0,
                deadline: date(2055, 1, 1),
                priority: 2,
                time_horizon: TimeHorizon::Long,
                linked_account_ids: vec!["taxable".to_string(), "roth_ira".to_string()],
            },
        ],
        preferences: Preferences {
            risk_tolerance: RiskTolerance::Moderate,
            liquidity_preference: LiquidityPreference::Medium,
            guardrails: vec![Guardrail {
                id: "checking-floor".to_string(),
                rule: "Never let checking drop below $1,000".to_string(),
                kind: GuardrailKind::MinBalance {
                    account_id: "checking".to_string(),
                    threshold: 1_000.0,
                },
            }],
        },
    }
}

/// Minimal profile: `monthly_expenses` as a single fixed expense, no
/// categories, goals or guardrails; savings 5,000 and taxable 10,000.
#[cfg(test)]
pub fn simple_profile(checking: f64, monthly_expenses: f64) -> UserProfile {
    let mut investments = BTreeMap::new();
    investments.insert("taxable".to_string(), InvestmentAccount::with_balance(10_000.0));

    UserProfile {
        id: "test-user".to_string(),
        name: "Test User".to_string(),
        monthly_income: 4_000.0,
        accounts: Accounts {
            checking,
            savings: 5_000.0,
            investments,
        },
        fixed_expenses: vec![FixedExpense {
            id: "living".to_string(),
            name: "Living costs".to_string(),
            amount: monthly_expenses,
            frequency: ExpenseFrequency::Monthly,
        }],
        spending_categories: vec![],
        goals: vec![],
        preferences: Preferences {
            risk_tolerance: RiskTolerance::Moderate,
            liquidity_preference: LiquidityPreference::Medium,
            guardrails: vec![],
        },
    }
}

#[cfg(test)]
pub fn transaction_on(category: &str, year: i32, month: u32, day: u32, amount: f64) -> Transaction {
    expense(&format!("{}-{}-{}", year, month, day), category, date(year, month, day), amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_profile_expenses() {
        let user = demo_profile();
        // 1,600 rent + 100 insurance + 900 budgets
        assert_eq!(user.monthly_expenses(), 2_600.0);
        assert_eq!(user.monthly_surplus(), 2_400.0);
    }
}
