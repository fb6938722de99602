//! Financial projection primitives
//!
//! Pure functions: compound growth, goal progress and months-to-goal.

use crate::error::DecisionError;
use crate::models::Goal;
use crate::Result;

/// Cap for month-by-month goal projection (100 years)
pub const MAX_PROJECTION_MONTHS: u32 = 1200;

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Future value with monthly compounding:
/// `balance = balance * (1 + annual_rate / 12) + monthly_contribution`, `months` times.
pub fn future_value(
    principal: f64,
    monthly_contribution: f64,
    annual_rate: f64,
    months: u32,
) -> f64 {
    let monthly_rate = annual_rate / 12.0;

    let value = (0..months).fold(principal, |balance, _| {
        balance * (1.0 + monthly_rate) + monthly_contribution
    });

    round_cents(value)
}

pub fn years_to_months(years: f64) -> u32 {
    if years <= 0.0 || !years.is_finite() {
        return 0;
    }
    (years * 12.0).round() as u32
}

/// Remaining amount to reach a goal.
///
/// Errors with `DegenerateGoalState` when nothing remains (or the goal data is
/// not finite), which callers treat as "no further impact".
pub fn goal_gap(goal: &Goal) -> Result<f64> {
    let gap = goal.target_amount - goal.current_amount;
    if !gap.is_finite() || gap <= 0.0 {
        return Err(DecisionError::DegenerateGoalState {
            goal_id: goal.id.clone(),
        });
    }
    Ok(gap)
}

/// Share of the remaining gap closed by `amount`, in percent
pub fn percentage_of_gap(amount: f64, goal: &Goal) -> Result<f64> {
    let gap = goal_gap(goal)?;
    Ok(amount / gap * 100.0)
}

/// Progress toward target in percent; may exceed 100
pub fn progress_pct(goal: &Goal) -> f64 {
    if goal.target_amount <= 0.0 {
        return if goal.current_amount > 0.0 { 100.0 } else { 0.0 };
    }
    goal.current_amount / goal.target_amount * 100.0
}

/// Months until `remaining` is covered by contributions growing at `annual_rate`.
///
/// `Some(0)` when nothing remains, `None` when the goal is never reached
/// within [`MAX_PROJECTION_MONTHS`].
pub fn months_to_goal(remaining: f64, monthly_contribution: f64, annual_rate: f64) -> Option<u32> {
    if remaining <= 0.0 {
        return Some(0);
    }
    if monthly_contribution <= 0.0 {
        return None;
    }

    if annual_rate == 0.0 {
        let months = (remaining / monthly_contribution).ceil();
        return (months <= MAX_PROJECTION_MONTHS as f64).then_some(months as u32);
    }

    let monthly_rate = annual_rate / 12.0;
    let mut balance = 0.0;
    let mut months = 0;

    while balance < remaining && months < MAX_PROJECTION_MONTHS {
        balance = balance * (1.0 + monthly_rate) + monthly_contribution;
        months += 1;
    }

    (balance >= remaining).then_some(months)
}

/// Linear approximation of months gained (positive) or lost (negative)
pub fn months_saved(months_to_goal: Option<u32>, percentage_change: f64) -> i32 {
    let Some(months) = months_to_goal else {
        return 0;
    };

    let magnitude = (months as f64 * (percentage_change.abs() / 100.0)).floor() as i32;

    if percentage_change < 0.0 {
        -magnitude
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeHorizon;
    use chrono::{TimeZone, Utc};

    fn goal(target: f64, current: f64) -> Goal {
        Goal {
            id: "g".to_string(),
            name: "Emergency fund".to_string(),
            target_amount: target,
            current_amount: current,
            deadline: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
            priority: 1,
            time_horizon: TimeHorizon::Short,
            linked_account_ids: vec![],
        }
    }

    #[test]
    fn test_future_value_monthly_compounding() {
        let fv = future_value(5000.0, 0.0, 0.07, 60);
        let expected = 5000.0 * (1.0_f64 + 0.07 / 12.0).powi(60);
        assert!((fv - expected).abs() < 0.01, "fv = {}", fv);
        assert!(fv > 7080.0 && fv < 7095.0);
    }

    #[test]
    fn test_future_value_with_contributions() {
        assert_eq!(future_value(0.0, 100.0, 0.0, 12), 1200.0);
        assert_eq!(future_value(1000.0, 0.0, 0.07, 0), 1000.0);
    }

    #[test]
    fn test_degenerate_goal_gap() {
        let reached = goal(1000.0, 1000.0);
        assert!(matches!(
            goal_gap(&reached),
            Err(DecisionError::DegenerateGoalState { .. })
        ));

        let over = goal(1000.0, 1500.0);
        assert!(percentage_of_gap(100.0, &over).is_err());
        assert_eq!(progress_pct(&over), 150.0);
    }

    #[test]
    fn test_percentage_of_gap() {
        let g = goal(10_000.0, 6_000.0);
        assert_eq!(percentage_of_gap(1_000.0, &g).unwrap(), 25.0);
    }

    #[test]
    fn test_months_to_goal() {
        assert_eq!(months_to_goal(0.0, 100.0, 0.0), Some(0));
        assert_eq!(months_to_goal(1000.0, 0.0, 0.0), None);
        assert_eq!(months_to_goal(1000.0, 300.0, 0.0), Some(4));

        // growth makes it no slower than the linear case
        let compounded = months_to_goal(10_000.0, 200.0, 0.07).unwrap();
        assert!(compounded <= 50);
    }

    #[test]
    fn test_months_saved_sign() {
        assert_eq!(months_saved(Some(40), 25.0), 10);
        assert_eq!(months_saved(Some(40), -25.0), -10);
        assert_eq!(months_saved(Some(3), 10.0), 0);
        assert_eq!(months_saved(None, 50.0), 0);
    }
}
