use tracing::debug;

use super::error::{ProjectionError, ProjectionResult, ensure_finite};
use super::growth::grow;
use super::types::TargetQuery;

pub fn time_to_target(query: &TargetQuery) -> ProjectionResult<f64> {
    ensure_finite("target", query.target)?;
    ensure_finite("initialBalance", query.initial_balance)?;
    ensure_finite("monthlyDeposit", query.monthly_deposit)?;
    ensure_finite("annualRate", query.annual_rate)?;
    ensure_finite("targetRate", query.target_rate)?;
    if query.annual_rate == 0.0 {
        return Err(ProjectionError::DivisionUndefined {
            context: "time to target balance growth".to_string(),
        });
    }

    if query.target_rate == 0.0 {
        Ok(solve_analytically(query))
    } else {
        solve_by_simulation(query)
    }
}

fn solve_analytically(query: &TargetQuery) -> f64 {
    let stationary = 12.0 * query.monthly_deposit / query.annual_rate;
    let a = query.initial_balance + stationary;
    let numerator = query.target + stationary;

    let already_reached = query.initial_balance >= query.target;

    // Balance sits on its fixed point and never moves.
    if a == 0.0 {
        return if numerator == 0.0 || already_reached {
            0.0
        } else {
            f64::INFINITY
        };
    }

    let ratio = numerator / a;
    if ratio <= 0.0 {
        return if already_reached { 0.0 } else { f64::INFINITY };
    }
    ratio.ln() / query.annual_rate
}

fn solve_by_simulation(query: &TargetQuery) -> ProjectionResult<f64> {
    let mut balance = query.initial_balance;
    let mut target = query.target;
    for year in 0..query.max_iterations {
        if balance >= target {
            debug!(year, balance, target, "target reached");
            return Ok(f64::from(year));
        }
        balance = grow(balance, query.monthly_deposit, query.annual_rate, 1.0)?;
        target = grow(target, 0.0, query.target_rate, 1.0)?;
    }
    debug!(
        max_iterations = query.max_iterations,
        balance, target, "target not reached"
    );
    Ok(f64::INFINITY)
}
