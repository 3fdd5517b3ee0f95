use tracing::debug;

use super::error::{ProjectionError, ProjectionResult, ensure_finite};
use super::types::{GrowthBreakdown, GrowthParameters};

/// Balance after `years` of constant monthly deposits and continuous growth.
///
/// Continuum limit of `x(t+dt) = x(t) + deposit*dt + rate*x(t)*dt`:
///
/// ```text
/// A = x0 + 12*deposit/rate
/// x(T) = A*e^(rate*T) - 12*deposit/rate
/// ```
pub fn project(
    initial_balance: f64,
    monthly_deposit: f64,
    annual_rate: f64,
    years: f64,
) -> ProjectionResult<f64> {
    ensure_finite("initialBalance", initial_balance)?;
    ensure_finite("monthlyDeposit", monthly_deposit)?;
    ensure_finite("annualRate", annual_rate)?;
    ensure_finite("years", years)?;
    if years < 0.0 {
        return Err(ProjectionError::invalid("years", "must not be negative"));
    }
    grow(initial_balance, monthly_deposit, annual_rate, years)
}

// Unchecked step shared by the solvers, whose intermediate balances may overflow.
pub(crate) fn grow(
    initial_balance: f64,
    monthly_deposit: f64,
    annual_rate: f64,
    years: f64,
) -> ProjectionResult<f64> {
    if annual_rate == 0.0 {
        return Err(ProjectionError::DivisionUndefined {
            context: "balance projection".to_string(),
        });
    }
    let stationary = 12.0 * monthly_deposit / annual_rate;
    let a = initial_balance + stationary;
    Ok(a * (annual_rate * years).exp() - stationary)
}

pub fn project_with_breakdown(params: &GrowthParameters) -> ProjectionResult<GrowthBreakdown> {
    let final_balance = project(
        params.initial_balance,
        params.monthly_deposit,
        params.annual_rate,
        params.years,
    )?;
    let total_deposits = 12.0 * params.monthly_deposit * params.years;
    let total_return = final_balance - params.initial_balance - total_deposits;
    debug!(
        years = params.years,
        "deposits: {total_deposits:.0}, total return: {total_return:.0}"
    );
    Ok(GrowthBreakdown {
        final_balance,
        total_deposits,
        total_return,
    })
}
