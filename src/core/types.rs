use serde::Serialize;

pub const STATUTORY_RETIREMENT_AGES: [u32; 2] = [62, 67];

pub const LEGACY_DEATH_AGE_THRESHOLD: f64 = 120.0;

pub const DEFAULT_GROWTH_RATE: f64 = 0.04;
pub const DEFAULT_MAX_ITERATIONS: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthParameters {
    pub initial_balance: f64,
    // Monthly; negative means withdrawal.
    pub monthly_deposit: f64,
    pub annual_rate: f64,
    pub years: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthBreakdown {
    pub final_balance: f64,
    pub total_deposits: f64,
    pub total_return: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetQuery {
    pub target: f64,
    pub initial_balance: f64,
    pub monthly_deposit: f64,
    pub annual_rate: f64,
    pub target_rate: f64,
    pub max_iterations: u32,
}

impl TargetQuery {
    pub fn new(target: f64, initial_balance: f64, monthly_deposit: f64) -> Self {
        Self {
            target,
            initial_balance,
            monthly_deposit,
            annual_rate: DEFAULT_GROWTH_RATE,
            target_rate: 0.0,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerSegment {
    pub start_age: u32,
    pub end_age: u32,
    pub monthly_salary: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CareerTimeline {
    pub ages: Vec<u32>,
    pub salaries: Vec<f64>,
}

impl CareerTimeline {
    pub fn new(ages: Vec<u32>, salaries: Vec<f64>) -> Self {
        Self { ages, salaries }
    }

    pub fn retirement_age(&self) -> Option<u32> {
        self.ages.last().copied()
    }

    pub fn segments(&self) -> impl Iterator<Item = CareerSegment> + '_ {
        self.ages
            .windows(2)
            .zip(&self.salaries)
            .map(|(pair, &monthly_salary)| CareerSegment {
                start_age: pair[0],
                end_age: pair[1],
                monthly_salary,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PayoutDivisor {
    ExplicitMonths(f64),
    AssumedDeathAge(f64),
}

impl PayoutDivisor {
    // Single-number form: below 120 it is a death age, otherwise a month count.
    pub fn from_legacy_factor(factor: f64) -> Self {
        if factor < LEGACY_DEATH_AGE_THRESHOLD {
            PayoutDivisor::AssumedDeathAge(factor)
        } else {
            PayoutDivisor::ExplicitMonths(factor)
        }
    }
}

impl Default for PayoutDivisor {
    fn default() -> Self {
        PayoutDivisor::AssumedDeathAge(85.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionRates {
    pub worker_percent: f64,
    pub employer_percent: f64,
    pub severance_percent: f64,
}

impl ContributionRates {
    pub fn total_percent(self) -> f64 {
        self.worker_percent + self.employer_percent + self.severance_percent
    }
}

impl Default for ContributionRates {
    fn default() -> Self {
        Self {
            worker_percent: 6.0,
            employer_percent: 6.5,
            severance_percent: 6.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PensionAssumptions {
    pub contributions: ContributionRates,
    pub deposit_friction_percent: f64,
    pub annual_cost_percent: f64,
    pub gross_return_percent: f64,
    pub payout: PayoutDivisor,
}

impl PensionAssumptions {
    pub fn default_fund() -> Self {
        Self {
            contributions: ContributionRates::default(),
            deposit_friction_percent: 1.5,
            annual_cost_percent: 0.01,
            gross_return_percent: 4.0,
            payout: PayoutDivisor::default(),
        }
    }

    pub fn high_return() -> Self {
        Self {
            deposit_friction_percent: 1.31,
            gross_return_percent: 6.0,
            ..Self::default_fund()
        }
    }
}

impl Default for PensionAssumptions {
    fn default() -> Self {
        Self::default_fund()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PensionParameters {
    pub initial_sum: f64,
    pub timeline: CareerTimeline,
    pub assumptions: PensionAssumptions,
    pub acknowledge_risks: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentProjection {
    pub start_age: u32,
    pub end_age: u32,
    pub monthly_salary: f64,
    pub monthly_deposit: f64,
    pub start_balance: f64,
    pub end_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PensionEstimate {
    pub monthly_payment: f64,
    pub final_balance: f64,
    pub payout_months: f64,
    pub net_annual_rate: f64,
    pub segments: Vec<SegmentProjection>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HousingAssumptions {
    pub annual_return_percent: f64,
    pub mortgage_cost_percent: f64,
    pub price_appreciation_percent: f64,
    pub tax_rate_percent: f64,
    pub max_iterations: u32,
}

impl Default for HousingAssumptions {
    fn default() -> Self {
        Self {
            annual_return_percent: 5.0,
            mortgage_cost_percent: 3.0,
            price_appreciation_percent: 3.0,
            tax_rate_percent: 25.0,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HousingParameters {
    pub house_price: f64,
    pub initial_sum: f64,
    pub monthly_saving_after_rent: f64,
    pub monthly_rent_cost: f64,
    pub assumptions: HousingAssumptions,
    pub acknowledge_risks: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HousingComparison {
    pub years_rent_and_invest: f64,
    pub years_mortgage: f64,
    pub after_tax_return_rate: f64,
    pub mortgage_rate: f64,
    pub price_growth_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Advisory {
    PensionDisclaimer,
    HousingDisclaimer,
    UnconventionalRetirementAge { age: u32 },
    PercentUnitsSuspected { fields: Vec<String> },
}

impl Advisory {
    pub fn message(&self) -> String {
        match self {
            Advisory::PensionDisclaimer => "The result may be very sensitive to the input parameters. \
                 Actuarial risks are not taken into account. The result is gross of \
                 post-retirement taxes. The simulation is nominal; pass real returns to \
                 neutralise inflation."
                .to_string(),
            Advisory::HousingDisclaimer => "Results are extremely sensitive to input values. \
                 Mortgage feasibility (e.g. minimum own-equity criterion) is not checked."
                .to_string(),
            Advisory::UnconventionalRetirementAge { age } => {
                format!("Retirement age was set to {age} rather than 62 or 67.")
            }
            Advisory::PercentUnitsSuspected { fields } => format!(
                "Some numeric parameters satisfy 0% < x < 1% ({}); note the units are percent.",
                fields.join(", ")
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Estimate<T> {
    pub result: T,
    pub warnings: Vec<Advisory>,
}
