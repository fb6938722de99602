//! Historical metrics calculator
//!
//! Derives data-sufficiency and spending-variance signals from the
//! transaction history attached to a profile's spending categories.

use crate::models::{Transaction, UserProfile};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Months of history needed before analysis is considered data-sufficient
pub const SUFFICIENT_MONTHS: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct HistoricalMetrics {
    /// Distinct calendar months represented in the history
    pub months_of_data: u32,
    /// Coefficient of variation of monthly spending, in [0, 1]
    pub spending_variance: f64,
    pub avg_monthly_spending: f64,
    pub transaction_count: usize,
    pub category_breakdown: BTreeMap<String, f64>,
}

impl HistoricalMetrics {
    pub fn is_sufficient(&self) -> bool {
        self.months_of_data >= SUFFICIENT_MONTHS
    }
}

pub fn calculate(user: &UserProfile) -> HistoricalMetrics {
    let transactions: Vec<&Transaction> = user
        .spending_categories
        .iter()
        .flat_map(|c| c.transactions.iter())
        .collect();

    if transactions.is_empty() {
        return HistoricalMetrics::default();
    }

    let months: BTreeSet<(i32, u32)> = transactions
        .iter()
        .map(|t| (t.date.year(), t.date.month()))
        .collect();

    let mut spending_by_month: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    let mut category_breakdown: BTreeMap<String, f64> = BTreeMap::new();

    for t in &transactions {
        *category_breakdown.entry(t.category.clone()).or_insert(0.0) += t.amount.abs();

        if t.amount < 0.0 {
            *spending_by_month
                .entry((t.date.year(), t.date.month()))
                .or_insert(0.0) += t.amount.abs();
        }
    }

    let months_of_data = months.len() as u32;
    let total_spending: f64 = spending_by_month.values().sum();

    HistoricalMetrics {
        months_of_data,
        spending_variance: variance_coefficient(spending_by_month.values().copied()),
        avg_monthly_spending: total_spending / months_of_data as f64,
        transaction_count: transactions.len(),
        category_breakdown,
    }
}

/// Population standard deviation over mean; 0 for fewer than two samples
fn variance_coefficient(values: impl Iterator<Item = f64>) -> f64 {
    let values: Vec<f64> = values.collect();
    if values.len() < 2 {
        return 0.0;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return 0.0;
    }

    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    (variance.sqrt() / mean).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{demo_profile, simple_profile, transaction_on};

    #[test]
    fn test_empty_history() {
        let metrics = calculate(&simple_profile(1000.0, 1000.0));
        assert_eq!(metrics, HistoricalMetrics::default());
        assert!(!metrics.is_sufficient());
    }

    #[test]
    fn test_demo_history() {
        let metrics = calculate(&demo_profile());

        assert_eq!(metrics.months_of_data, 3);
        assert_eq!(metrics.transaction_count, 5);
        assert!(metrics.is_sufficient());
        // monthly totals 590 / 470 / 520
        assert!((metrics.avg_monthly_spending - 526.666).abs() < 0.01);
        assert!(metrics.spending_variance > 0.0 && metrics.spending_variance < 0.2);
        assert_eq!(metrics.category_breakdown.get("dining"), Some(&380.0));
    }

    #[test]
    fn test_single_month_has_zero_variance() {
        let mut user = simple_profile(1000.0, 1000.0);
        user.spending_categories.push(crate::models::SpendingCategory {
            id: "groceries".to_string(),
            name: "Groceries".to_string(),
            monthly_budget: 400.0,
            current_spent: 0.0,
            transactions: vec![
                transaction_on("groceries", 2026, 3, 1, 100.0),
                transaction_on("groceries", 2026, 3, 20, 900.0),
            ],
        });

        let metrics = calculate(&user);
        assert_eq!(metrics.months_of_data, 1);
        assert_eq!(metrics.spending_variance, 0.0);
        assert_eq!(metrics.avg_monthly_spending, 1000.0);
    }

    #[test]
    fn test_variance_is_capped() {
        let cv = variance_coefficient([1.0, 1.0, 1.0, 10_000.0].into_iter());
        assert_eq!(cv, 1.0);
    }
}
