use tracing::{debug, info, warn};

use super::error::{ProjectionError, ProjectionResult, ensure_finite};
use super::growth::grow;
use super::solver::time_to_target;
use super::types::{
    Advisory, CareerTimeline, Estimate, HousingComparison, HousingParameters, PayoutDivisor,
    PensionEstimate, PensionParameters, STATUTORY_RETIREMENT_AGES, SegmentProjection,
    TargetQuery,
};

pub fn estimate_pension(params: &PensionParameters) -> ProjectionResult<Estimate<PensionEstimate>> {
    let mut warnings = Vec::new();
    if !params.acknowledge_risks {
        warnings.push(Advisory::PensionDisclaimer);
    }

    let assumptions = &params.assumptions;
    ensure_finite("initialSum", params.initial_sum)?;
    for (field, value) in [
        ("workerPercent", assumptions.contributions.worker_percent),
        ("employerPercent", assumptions.contributions.employer_percent),
        ("severancePercent", assumptions.contributions.severance_percent),
        ("depositFrictionPercent", assumptions.deposit_friction_percent),
        ("annualCostPercent", assumptions.annual_cost_percent),
        ("grossReturnPercent", assumptions.gross_return_percent),
    ] {
        ensure_finite(field, value)?;
    }

    let retirement_age = validate_timeline(&params.timeline)?;
    if !STATUTORY_RETIREMENT_AGES.contains(&retirement_age) {
        warnings.push(Advisory::UnconventionalRetirementAge {
            age: retirement_age,
        });
    }

    let payout_months = resolve_payout_months(assumptions.payout, retirement_age)?;
    debug!("months factor calculated for payments: {payout_months:.0}");

    let net_annual_rate =
        (assumptions.gross_return_percent - assumptions.annual_cost_percent) / 100.0;
    let contribution_share = assumptions.contributions.total_percent() / 100.0;
    let friction_share = 1.0 - assumptions.deposit_friction_percent / 100.0;

    let mut balance = params.initial_sum;
    let mut segments = Vec::with_capacity(params.timeline.salaries.len());
    for segment in params.timeline.segments() {
        debug!(
            "ages {}-{} salary: {:.0}",
            segment.start_age, segment.end_age, segment.monthly_salary
        );
        let monthly_deposit = segment.monthly_salary * contribution_share * friction_share;
        let years = f64::from(segment.end_age - segment.start_age);
        let end_balance = grow(balance, monthly_deposit, net_annual_rate, years)?;
        segments.push(SegmentProjection {
            start_age: segment.start_age,
            end_age: segment.end_age,
            monthly_salary: segment.monthly_salary,
            monthly_deposit,
            start_balance: balance,
            end_balance,
        });
        balance = end_balance;
    }

    let monthly_payment = balance / payout_months;
    info!("estimated monthly payment at retirement: {monthly_payment:.0}");
    log_advisories(&warnings);

    Ok(Estimate {
        result: PensionEstimate {
            monthly_payment,
            final_balance: balance,
            payout_months,
            net_annual_rate,
            segments,
        },
        warnings,
    })
}

pub fn compare_housing_paths(
    params: &HousingParameters,
) -> ProjectionResult<Estimate<HousingComparison>> {
    let mut warnings = Vec::new();
    if !params.acknowledge_risks {
        warnings.push(Advisory::HousingDisclaimer);
    }

    let assumptions = &params.assumptions;
    for (field, value) in [
        ("housePrice", params.house_price),
        ("initialSum", params.initial_sum),
        ("monthlySavingAfterRent", params.monthly_saving_after_rent),
        ("monthlyRentCost", params.monthly_rent_cost),
        ("annualReturnPercent", assumptions.annual_return_percent),
        ("mortgageCostPercent", assumptions.mortgage_cost_percent),
        ("priceAppreciationPercent", assumptions.price_appreciation_percent),
        ("taxRatePercent", assumptions.tax_rate_percent),
    ] {
        ensure_finite(field, value)?;
    }

    let suspicious: Vec<String> = [
        ("annualReturnPercent", assumptions.annual_return_percent),
        ("mortgageCostPercent", assumptions.mortgage_cost_percent),
        (
            "priceAppreciationPercent",
            assumptions.price_appreciation_percent,
        ),
        ("taxRatePercent", assumptions.tax_rate_percent),
    ]
    .into_iter()
    .filter(|&(_, value)| 0.0 < value && value < 1.0)
    .map(|(name, _)| name.to_string())
    .collect();
    if !suspicious.is_empty() {
        warnings.push(Advisory::PercentUnitsSuspected { fields: suspicious });
    }

    let after_tax_return_rate =
        (1.0 - assumptions.tax_rate_percent / 100.0) * assumptions.annual_return_percent / 100.0;
    let mortgage_rate = assumptions.mortgage_cost_percent / 100.0;
    let price_growth_rate = assumptions.price_appreciation_percent / 100.0;

    // The house price is the moving target of the savings.
    let years_rent_and_invest = time_to_target(&TargetQuery {
        target: params.house_price,
        initial_balance: params.initial_sum,
        monthly_deposit: params.monthly_saving_after_rent,
        annual_rate: after_tax_return_rate,
        target_rate: price_growth_rate,
        max_iterations: assumptions.max_iterations,
    })?;

    // Debt accrues at the mortgage cost; the rent no longer paid goes into repayment.
    let years_mortgage = time_to_target(&TargetQuery {
        target: 0.0,
        initial_balance: params.initial_sum - params.house_price,
        monthly_deposit: params.monthly_saving_after_rent + params.monthly_rent_cost,
        annual_rate: mortgage_rate,
        target_rate: price_growth_rate,
        max_iterations: assumptions.max_iterations,
    })?;

    info!(
        "time required to have a {:.2}M-house without debts: rent-and-invest {years_rent_and_invest:.0} years, mortgage {years_mortgage:.0} years",
        params.house_price / 1e6
    );
    log_advisories(&warnings);

    Ok(Estimate {
        result: HousingComparison {
            years_rent_and_invest,
            years_mortgage,
            after_tax_return_rate,
            mortgage_rate,
            price_growth_rate,
        },
        warnings,
    })
}

fn validate_timeline(timeline: &CareerTimeline) -> ProjectionResult<u32> {
    let Some(retirement_age) = timeline.retirement_age() else {
        return Err(ProjectionError::invalid(
            "ages",
            "at least the retirement age is required",
        ));
    };
    if timeline.salaries.len() + 1 != timeline.ages.len() {
        return Err(ProjectionError::ShapeMismatch {
            ages: timeline.ages.len(),
            salaries: timeline.salaries.len(),
        });
    }
    if timeline.ages.windows(2).any(|pair| pair[1] <= pair[0]) {
        return Err(ProjectionError::invalid(
            "ages",
            "ages must be strictly increasing",
        ));
    }
    if let Some(salary) = timeline
        .salaries
        .iter()
        .find(|salary| !salary.is_finite() || **salary < 0.0)
    {
        return Err(ProjectionError::invalid(
            "salaries",
            format!("salary must be a finite non-negative amount, got {salary}"),
        ));
    }
    Ok(retirement_age)
}

fn resolve_payout_months(payout: PayoutDivisor, retirement_age: u32) -> ProjectionResult<f64> {
    match payout {
        PayoutDivisor::ExplicitMonths(months) => {
            if !months.is_finite() || months <= 0.0 {
                return Err(ProjectionError::invalid(
                    "payoutMonths",
                    format!("must be a positive number of months, got {months}"),
                ));
            }
            Ok(months)
        }
        PayoutDivisor::AssumedDeathAge(death_age) => {
            let months = 12.0 * (death_age - f64::from(retirement_age));
            if !months.is_finite() || months <= 0.0 {
                return Err(ProjectionError::invalid(
                    "deathAge",
                    format!("must be above the retirement age {retirement_age}, got {death_age}"),
                ));
            }
            Ok(months)
        }
    }
}

fn log_advisories(warnings: &[Advisory]) {
    for advisory in warnings {
        warn!(advisory = ?advisory, "{}", advisory.message());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{HousingAssumptions, PensionAssumptions};
    use proptest::prelude::{prop_assert, proptest};

    fn assert_rel(actual: f64, expected: f64, rel: f64) {
        assert!(
            (actual - expected).abs() <= rel * expected.abs().max(1.0),
            "expected {expected}, got {actual}, relative tolerance {rel}"
        );
    }

    fn sample_pension() -> PensionParameters {
        PensionParameters {
            initial_sum: 30_000.0,
            timeline: CareerTimeline::new(vec![25, 30, 35, 67], vec![7_000.0, 8_000.0, 10_000.0]),
            assumptions: PensionAssumptions::default(),
            acknowledge_risks: false,
        }
    }

    fn sample_housing() -> HousingParameters {
        HousingParameters {
            house_price: 1_000_000.0,
            initial_sum: 100_000.0,
            monthly_saving_after_rent: 3_000.0,
            monthly_rent_cost: 2_000.0,
            assumptions: HousingAssumptions::default(),
            acknowledge_risks: false,
        }
    }

    #[test]
    fn pension_scenario_matches_segment_walk_by_hand() {
        let estimate = estimate_pension(&sample_pension()).expect("valid pension inputs");
        let pension = &estimate.result;

        // Per segment: salary * 18.5% * (1 - 1.5%), rate (4 - 0.01)/100, death age 85.
        let rate = 0.0399;
        let closed_form = |x0: f64, salary: f64, years: f64| {
            let d = 12.0 * salary * 0.185 * 0.985;
            (x0 + d / rate) * (rate * years).exp() - d / rate
        };
        let s = closed_form(30_000.0, 7_000.0, 5.0);
        let s = closed_form(s, 8_000.0, 5.0);
        let s = closed_form(s, 10_000.0, 32.0);
        let months = 12.0 * (85.0 - 67.0);

        assert_rel(pension.payout_months, months, 1e-12);
        assert_rel(pension.final_balance, s, 1e-9);
        assert_rel(pension.monthly_payment, s / months, 1e-3);
        assert!(pension.monthly_payment.is_finite() && pension.monthly_payment > 0.0);
        assert_rel(pension.net_annual_rate, rate, 1e-12);
    }

    #[test]
    fn pension_segments_chain_balances() {
        let estimate = estimate_pension(&sample_pension()).expect("valid pension inputs");
        let segments = &estimate.result.segments;
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].start_balance, 30_000.0);
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end_balance, pair[1].start_balance);
            assert_eq!(pair[0].end_age, pair[1].start_age);
        }
        assert_eq!(segments[2].end_balance, estimate.result.final_balance);
        assert_rel(segments[0].monthly_deposit, 7_000.0 * 0.185 * 0.985, 1e-12);
    }

    #[test]
    fn pension_rejects_mismatched_timeline() {
        let mut params = sample_pension();
        params.timeline = CareerTimeline::new(vec![30, 40, 67], vec![5_000.0]);

        let err = estimate_pension(&params).expect_err("must reject shape mismatch");
        assert_eq!(
            err,
            ProjectionError::ShapeMismatch {
                ages: 3,
                salaries: 1
            }
        );
        assert_eq!(
            err.to_string(),
            "For 3 ages there must be exactly 2 salaries, not 1"
        );
    }

    #[test]
    fn pension_rejects_too_many_salaries() {
        let mut params = sample_pension();
        params.timeline = CareerTimeline::new(vec![30, 67], vec![5_000.0, 6_000.0]);
        let err = estimate_pension(&params).expect_err("must reject shape mismatch");
        assert!(matches!(err, ProjectionError::ShapeMismatch { .. }));
    }

    #[test]
    fn pension_rejects_empty_and_unordered_ages() {
        let mut params = sample_pension();
        params.timeline = CareerTimeline::new(vec![], vec![]);
        assert!(matches!(
            estimate_pension(&params),
            Err(ProjectionError::InvalidInput { .. })
        ));

        params.timeline = CareerTimeline::new(vec![40, 30, 67], vec![1.0, 2.0]);
        assert!(matches!(
            estimate_pension(&params),
            Err(ProjectionError::InvalidInput { .. })
        ));
    }

    #[test]
    fn pension_rejects_death_age_before_retirement() {
        let mut params = sample_pension();
        params.assumptions.payout = PayoutDivisor::AssumedDeathAge(60.0);
        let err = estimate_pension(&params).expect_err("must reject");
        assert!(err.to_string().contains("deathAge"));
    }

    #[test]
    fn pension_with_zero_net_return_is_undefined() {
        let mut params = sample_pension();
        params.assumptions.gross_return_percent = 1.0;
        params.assumptions.annual_cost_percent = 1.0;
        let err = estimate_pension(&params).expect_err("zero net rate");
        assert!(matches!(err, ProjectionError::DivisionUndefined { .. }));
    }

    #[test]
    fn explicit_payout_months_divide_the_final_balance() {
        let mut params = sample_pension();
        params.assumptions.payout = PayoutDivisor::ExplicitMonths(200.0);
        let estimate = estimate_pension(&params).expect("valid");
        assert_rel(
            estimate.result.monthly_payment,
            estimate.result.final_balance / 200.0,
            1e-12,
        );
    }

    #[test]
    fn legacy_factor_threshold_picks_the_divisor_kind() {
        assert_eq!(
            PayoutDivisor::from_legacy_factor(85.0),
            PayoutDivisor::AssumedDeathAge(85.0)
        );
        assert_eq!(
            PayoutDivisor::from_legacy_factor(120.0),
            PayoutDivisor::ExplicitMonths(120.0)
        );
        assert_eq!(
            PayoutDivisor::from_legacy_factor(216.0),
            PayoutDivisor::ExplicitMonths(216.0)
        );
    }

    #[test]
    fn pension_advisories_follow_age_and_acknowledgement() {
        let estimate = estimate_pension(&sample_pension()).expect("valid");
        assert_eq!(estimate.warnings, vec![Advisory::PensionDisclaimer]);

        let mut params = sample_pension();
        params.acknowledge_risks = true;
        params.timeline = CareerTimeline::new(vec![25, 30, 35, 65], vec![7_000.0, 8_000.0, 10_000.0]);
        let estimate = estimate_pension(&params).expect("valid");
        assert_eq!(
            estimate.warnings,
            vec![Advisory::UnconventionalRetirementAge { age: 65 }]
        );

        let baseline = {
            let mut quiet = params.clone();
            quiet.timeline = CareerTimeline::new(vec![25, 30, 35, 67], vec![7_000.0, 8_000.0, 10_000.0]);
            estimate_pension(&quiet).expect("valid")
        };
        assert!(baseline.warnings.is_empty());
    }

    #[test]
    fn high_return_preset_pays_more() {
        let base = estimate_pension(&sample_pension()).expect("valid");
        let mut params = sample_pension();
        params.assumptions = PensionAssumptions::high_return();
        let high = estimate_pension(&params).expect("valid");
        assert!(high.result.monthly_payment > base.result.monthly_payment);
    }

    #[test]
    fn retirement_only_timeline_pays_out_the_initial_sum() {
        let mut params = sample_pension();
        params.timeline = CareerTimeline::new(vec![67], vec![]);
        let estimate = estimate_pension(&params).expect("valid");
        assert!(estimate.result.segments.is_empty());
        assert_rel(estimate.result.monthly_payment, 30_000.0 / 216.0, 1e-12);
    }

    #[test]
    fn housing_scenario_gives_finite_positive_years() {
        let estimate = compare_housing_paths(&sample_housing()).expect("valid housing inputs");
        let housing = estimate.result;

        assert!(housing.years_rent_and_invest.is_finite() && housing.years_rent_and_invest > 0.0);
        assert!(housing.years_mortgage.is_finite() && housing.years_mortgage > 0.0);
        assert_rel(housing.after_tax_return_rate, 0.0375, 1e-12);
        assert_rel(housing.mortgage_rate, 0.03, 1e-12);
        assert_rel(housing.price_growth_rate, 0.03, 1e-12);
        assert_eq!(estimate.warnings, vec![Advisory::HousingDisclaimer]);
    }

    #[test]
    fn housing_paths_match_direct_solver_calls() {
        let params = sample_housing();
        let estimate = compare_housing_paths(&params).expect("valid");

        let rent = time_to_target(&TargetQuery {
            target: 1_000_000.0,
            initial_balance: 100_000.0,
            monthly_deposit: 3_000.0,
            annual_rate: 0.75 * 0.05,
            target_rate: 0.03,
            max_iterations: 1000,
        })
        .expect("solve");
        let mortgage = time_to_target(&TargetQuery {
            target: 0.0,
            initial_balance: -900_000.0,
            monthly_deposit: 5_000.0,
            annual_rate: 0.03,
            target_rate: 0.03,
            max_iterations: 1000,
        })
        .expect("solve");

        assert_eq!(estimate.result.years_rent_and_invest, rent);
        assert_eq!(estimate.result.years_mortgage, mortgage);
    }

    #[test]
    fn housing_flags_rates_that_look_like_fractions() {
        let mut params = sample_housing();
        params.acknowledge_risks = true;
        params.assumptions.annual_return_percent = 0.05;
        params.assumptions.tax_rate_percent = 0.25;

        let estimate = compare_housing_paths(&params).expect("still computes");
        assert_eq!(
            estimate.warnings,
            vec![Advisory::PercentUnitsSuspected {
                fields: vec![
                    "annualReturnPercent".to_string(),
                    "taxRatePercent".to_string()
                ]
            }]
        );
        assert!(estimate.warnings[0].message().contains("percent"));
    }

    #[test]
    fn pension_rejects_non_finite_amounts() {
        let mut params = sample_pension();
        params.initial_sum = f64::NAN;
        let err = estimate_pension(&params).expect_err("NaN initial sum");
        assert!(matches!(err, ProjectionError::InvalidInput { ref field, .. } if field == "initialSum"));

        let mut params = sample_pension();
        params.assumptions.gross_return_percent = f64::INFINITY;
        let err = estimate_pension(&params).expect_err("infinite return");
        assert!(
            matches!(err, ProjectionError::InvalidInput { ref field, .. } if field == "grossReturnPercent")
        );
    }

    #[test]
    fn housing_rejects_non_finite_amounts() {
        let mut params = sample_housing();
        params.assumptions.annual_return_percent = f64::NAN;
        let err = compare_housing_paths(&params).expect_err("NaN return");
        assert!(
            matches!(err, ProjectionError::InvalidInput { ref field, .. } if field == "annualReturnPercent")
        );

        let mut params = sample_housing();
        params.house_price = f64::INFINITY;
        let err = compare_housing_paths(&params).expect_err("infinite price");
        assert!(matches!(err, ProjectionError::InvalidInput { ref field, .. } if field == "housePrice"));
    }

    #[test]
    fn housing_mortgage_is_immediate_when_equity_covers_the_price() {
        let params = HousingParameters {
            house_price: 1_000_000.0,
            initial_sum: 1_200_000.0,
            monthly_saving_after_rent: 0.0,
            monthly_rent_cost: 0.0,
            assumptions: HousingAssumptions {
                price_appreciation_percent: 0.0,
                ..HousingAssumptions::default()
            },
            acknowledge_risks: true,
        };
        let estimate = compare_housing_paths(&params).expect("valid");
        assert_eq!(estimate.result.years_mortgage, 0.0);
        assert!(estimate.result.years_rent_and_invest <= 0.0);
    }

    #[test]
    fn housing_zero_mortgage_cost_is_undefined() {
        let mut params = sample_housing();
        params.assumptions.mortgage_cost_percent = 0.0;
        let err = compare_housing_paths(&params).expect_err("zero mortgage rate");
        assert!(matches!(err, ProjectionError::DivisionUndefined { .. }));
    }

    #[test]
    fn housing_static_price_uses_analytic_years() {
        let mut params = sample_housing();
        params.assumptions.price_appreciation_percent = 0.0;
        let estimate = compare_housing_paths(&params).expect("valid");
        assert!(estimate.result.years_rent_and_invest.fract() != 0.0);
        assert!(estimate.result.years_mortgage > 0.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(24))]

        #[test]
        fn prop_more_equity_never_takes_longer(
            equity in 0u32..800_000,
            extra in 1_000u32..150_000
        ) {
            let mut less = sample_housing();
            less.initial_sum = equity as f64;
            let mut more = sample_housing();
            more.initial_sum = (equity + extra) as f64;

            let less = compare_housing_paths(&less).expect("valid").result;
            let more = compare_housing_paths(&more).expect("valid").result;
            prop_assert!(more.years_mortgage <= less.years_mortgage);
            prop_assert!(more.years_rent_and_invest <= less.years_rent_and_invest);
        }

        #[test]
        fn prop_pension_payment_scales_with_salary(
            salary in 1_000u32..40_000,
            bump in 1u32..10_000
        ) {
            let mut low = sample_pension();
            low.timeline = CareerTimeline::new(vec![30, 67], vec![salary as f64]);
            let mut high = low.clone();
            high.timeline = CareerTimeline::new(vec![30, 67], vec![(salary + bump) as f64]);

            let low = estimate_pension(&low).expect("valid").result.monthly_payment;
            let high = estimate_pension(&high).expect("valid").result.monthly_payment;
            prop_assert!(high > low);
        }
    }
}
