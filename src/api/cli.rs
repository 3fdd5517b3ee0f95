use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::core::{
    CareerTimeline, ContributionRates, GrowthParameters, HousingAssumptions, HousingParameters,
    PayoutDivisor, PensionAssumptions, PensionParameters, TargetQuery, compare_housing_paths,
    estimate_pension, project_with_breakdown, time_to_target,
};

use super::{HousingResponse, PensionResponse, ProjectResponse, TargetResponse};

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    about = "Nominal long-term savings estimates: pension payment at retirement and years to own a home"
)]
pub struct Cli {
    #[arg(long, short, global = true, help = "Emit diagnostic progress lines")]
    pub verbose: bool,
    #[arg(long, global = true, help = "Print results as JSON")]
    pub json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Balance after a period of monthly deposits and continuous growth
    Project(ProjectArgs),
    /// Years until savings reach a (possibly growing) target
    Target(TargetArgs),
    /// Monthly pension payment at retirement
    Pension(PensionArgs),
    /// Years to own a house outright: rent-and-invest versus mortgage
    Housing(HousingArgs),
    /// Serve the JSON API
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub initial_balance: f64,
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true, help = "Negative means withdrawal")]
    pub monthly_deposit: f64,
    #[arg(
        long,
        default_value_t = 4.0,
        allow_hyphen_values = true,
        help = "Continuous annual growth rate in percent"
    )]
    pub growth_rate: f64,
    #[arg(long)]
    pub years: f64,
}

#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    #[arg(long)]
    pub target: f64,
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub initial_balance: f64,
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub monthly_deposit: f64,
    #[arg(
        long,
        default_value_t = 4.0,
        allow_hyphen_values = true,
        help = "Continuous annual growth rate of the savings in percent"
    )]
    pub growth_rate: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        allow_hyphen_values = true,
        help = "Annual growth rate of the target itself in percent; 0 keeps it fixed"
    )]
    pub target_growth_rate: f64,
    #[arg(long, default_value_t = 1000, help = "Years simulated when the target grows")]
    pub max_iterations: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliPensionPreset {
    DefaultFund,
    HighReturn,
}

impl From<CliPensionPreset> for PensionAssumptions {
    fn from(value: CliPensionPreset) -> Self {
        match value {
            CliPensionPreset::DefaultFund => PensionAssumptions::default_fund(),
            CliPensionPreset::HighReturn => PensionAssumptions::high_return(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct PensionArgs {
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub initial_sum: f64,
    #[arg(
        long,
        value_delimiter = ',',
        required = true,
        help = "Ages at which the salary changes, ending with the retirement age, e.g. 25,30,35,67"
    )]
    pub ages: Vec<u32>,
    #[arg(
        long,
        value_delimiter = ',',
        help = "Monthly salary for each gap between consecutive ages"
    )]
    pub salaries: Vec<f64>,
    #[arg(
        long,
        value_enum,
        default_value_t = CliPensionPreset::DefaultFund,
        help = "Fund assumptions used for any option not given explicitly"
    )]
    pub preset: CliPensionPreset,
    #[arg(long, conflicts_with = "payout_months", help = "Expected death age [default: 85]")]
    pub death_age: Option<f64>,
    #[arg(long, help = "Number of monthly payments the balance is spread over")]
    pub payout_months: Option<f64>,
    #[arg(long, help = "Worker contribution in percent of salary")]
    pub worker_percent: Option<f64>,
    #[arg(long, help = "Employer contribution in percent of salary")]
    pub employer_percent: Option<f64>,
    #[arg(long, help = "Severance compensation contribution in percent of salary")]
    pub severance_percent: Option<f64>,
    #[arg(long, help = "Fee taken off each deposit in percent")]
    pub deposit_friction_percent: Option<f64>,
    #[arg(long, help = "Annual management cost in percent of the balance")]
    pub annual_cost_percent: Option<f64>,
    #[arg(long, allow_hyphen_values = true, help = "Gross annual return in percent")]
    pub gross_return_percent: Option<f64>,
    #[arg(long, help = "Skip the disclaimer")]
    pub acknowledge_risks: bool,
}

#[derive(Args, Debug, Clone)]
pub struct HousingArgs {
    #[arg(long)]
    pub price: f64,
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub initial_sum: f64,
    #[arg(long, help = "Monthly saving left after paying rent")]
    pub monthly_saving: f64,
    #[arg(long)]
    pub rent_cost: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        allow_hyphen_values = true,
        help = "Annual investment return in percent, before tax"
    )]
    pub annual_return: f64,
    #[arg(long, default_value_t = 3.0, help = "Annual mortgage cost in percent")]
    pub mortgage_cost: f64,
    #[arg(
        long,
        default_value_t = 3.0,
        allow_hyphen_values = true,
        help = "Annual house price increase in percent"
    )]
    pub price_increase: f64,
    #[arg(long, default_value_t = 25.0, help = "Tax on investment returns in percent")]
    pub tax: f64,
    #[arg(long, default_value_t = 1000)]
    pub max_iterations: u32,
    #[arg(long, help = "Skip the disclaimer")]
    pub acknowledge_risks: bool,
}

pub(crate) fn default_pension_args() -> PensionArgs {
    PensionArgs {
        initial_sum: 0.0,
        ages: Vec::new(),
        salaries: Vec::new(),
        preset: CliPensionPreset::DefaultFund,
        death_age: None,
        payout_months: None,
        worker_percent: None,
        employer_percent: None,
        severance_percent: None,
        deposit_friction_percent: None,
        annual_cost_percent: None,
        gross_return_percent: None,
        acknowledge_risks: false,
    }
}

pub(crate) fn default_housing_args() -> HousingArgs {
    let defaults = HousingAssumptions::default();
    HousingArgs {
        price: 0.0,
        initial_sum: 0.0,
        monthly_saving: 0.0,
        rent_cost: 0.0,
        annual_return: defaults.annual_return_percent,
        mortgage_cost: defaults.mortgage_cost_percent,
        price_increase: defaults.price_appreciation_percent,
        tax: defaults.tax_rate_percent,
        max_iterations: defaults.max_iterations,
        acknowledge_risks: false,
    }
}

pub(crate) fn build_growth_parameters(args: &ProjectArgs) -> Result<GrowthParameters, String> {
    for (name, value) in [
        ("--initial-balance", args.initial_balance),
        ("--monthly-deposit", args.monthly_deposit),
        ("--growth-rate", args.growth_rate),
        ("--years", args.years),
    ] {
        if !value.is_finite() {
            return Err(format!("{name} must be a finite number"));
        }
    }
    if args.years < 0.0 {
        return Err("--years must be >= 0".to_string());
    }

    Ok(GrowthParameters {
        initial_balance: args.initial_balance,
        monthly_deposit: args.monthly_deposit,
        annual_rate: args.growth_rate / 100.0,
        years: args.years,
    })
}

pub(crate) fn build_target_query(args: &TargetArgs) -> Result<TargetQuery, String> {
    for (name, value) in [
        ("--target", args.target),
        ("--initial-balance", args.initial_balance),
        ("--monthly-deposit", args.monthly_deposit),
        ("--growth-rate", args.growth_rate),
        ("--target-growth-rate", args.target_growth_rate),
    ] {
        if !value.is_finite() {
            return Err(format!("{name} must be a finite number"));
        }
    }
    if args.max_iterations == 0 {
        return Err("--max-iterations must be > 0".to_string());
    }

    Ok(TargetQuery {
        target: args.target,
        initial_balance: args.initial_balance,
        monthly_deposit: args.monthly_deposit,
        annual_rate: args.growth_rate / 100.0,
        target_rate: args.target_growth_rate / 100.0,
        max_iterations: args.max_iterations,
    })
}

pub(crate) fn build_pension_parameters(args: PensionArgs) -> Result<PensionParameters, String> {
    if !args.initial_sum.is_finite() {
        return Err("--initial-sum must be a finite number".to_string());
    }
    if args.ages.is_empty() {
        return Err("--ages must list at least the retirement age".to_string());
    }
    if args.death_age.is_some() && args.payout_months.is_some() {
        return Err("--death-age and --payout-months are mutually exclusive".to_string());
    }

    let preset: PensionAssumptions = args.preset.into();
    let contributions = ContributionRates {
        worker_percent: args
            .worker_percent
            .unwrap_or(preset.contributions.worker_percent),
        employer_percent: args
            .employer_percent
            .unwrap_or(preset.contributions.employer_percent),
        severance_percent: args
            .severance_percent
            .unwrap_or(preset.contributions.severance_percent),
    };
    let assumptions = PensionAssumptions {
        contributions,
        deposit_friction_percent: args
            .deposit_friction_percent
            .unwrap_or(preset.deposit_friction_percent),
        annual_cost_percent: args
            .annual_cost_percent
            .unwrap_or(preset.annual_cost_percent),
        gross_return_percent: args
            .gross_return_percent
            .unwrap_or(preset.gross_return_percent),
        payout: match (args.payout_months, args.death_age) {
            (Some(months), _) => PayoutDivisor::ExplicitMonths(months),
            (None, Some(age)) => PayoutDivisor::AssumedDeathAge(age),
            (None, None) => preset.payout,
        },
    };

    for (name, value) in [
        ("--worker-percent", contributions.worker_percent),
        ("--employer-percent", contributions.employer_percent),
        ("--severance-percent", contributions.severance_percent),
        ("--deposit-friction-percent", assumptions.deposit_friction_percent),
        ("--annual-cost-percent", assumptions.annual_cost_percent),
    ] {
        if !(0.0..=100.0).contains(&value) {
            return Err(format!("{name} must be between 0 and 100"));
        }
    }
    if !assumptions.gross_return_percent.is_finite() || assumptions.gross_return_percent <= -100.0
    {
        return Err("--gross-return-percent must be > -100".to_string());
    }

    Ok(PensionParameters {
        initial_sum: args.initial_sum,
        timeline: CareerTimeline::new(args.ages, args.salaries),
        assumptions,
        acknowledge_risks: args.acknowledge_risks,
    })
}

pub(crate) fn build_housing_parameters(args: &HousingArgs) -> Result<HousingParameters, String> {
    if !args.price.is_finite() || args.price <= 0.0 {
        return Err("--price must be > 0".to_string());
    }
    for (name, value) in [
        ("--initial-sum", args.initial_sum),
        ("--monthly-saving", args.monthly_saving),
        ("--annual-return", args.annual_return),
        ("--price-increase", args.price_increase),
    ] {
        if !value.is_finite() {
            return Err(format!("{name} must be a finite number"));
        }
    }
    if !args.rent_cost.is_finite() || args.rent_cost < 0.0 {
        return Err("--rent-cost must be >= 0".to_string());
    }
    if !args.mortgage_cost.is_finite() || args.mortgage_cost < 0.0 {
        return Err("--mortgage-cost must be >= 0".to_string());
    }
    if !(0.0..=100.0).contains(&args.tax) {
        return Err("--tax must be between 0 and 100".to_string());
    }
    if args.max_iterations == 0 {
        return Err("--max-iterations must be > 0".to_string());
    }

    Ok(HousingParameters {
        house_price: args.price,
        initial_sum: args.initial_sum,
        monthly_saving_after_rent: args.monthly_saving,
        monthly_rent_cost: args.rent_cost,
        assumptions: HousingAssumptions {
            annual_return_percent: args.annual_return,
            mortgage_cost_percent: args.mortgage_cost,
            price_appreciation_percent: args.price_increase,
            tax_rate_percent: args.tax,
            max_iterations: args.max_iterations,
        },
        acknowledge_risks: args.acknowledge_risks,
    })
}

pub fn execute(command: Command, json: bool) -> Result<(), String> {
    match command {
        Command::Project(args) => {
            let params = build_growth_parameters(&args)?;
            let breakdown = project_with_breakdown(&params).map_err(|e| e.to_string())?;
            let response = ProjectResponse::from(breakdown);
            if json {
                return print_json(&response);
            }
            println!("Final balance: {:.0}", response.final_balance);
            println!("Deposits: {:.0}", response.total_deposits);
            println!("Total return: {:.0}", response.total_return);
        }
        Command::Target(args) => {
            let query = build_target_query(&args)?;
            let years = time_to_target(&query).map_err(|e| e.to_string())?;
            if json {
                return print_json(&TargetResponse::from_years(years));
            }
            println!("Years to target: {}", format_years(years));
        }
        Command::Pension(args) => {
            let params = build_pension_parameters(args)?;
            let estimate = estimate_pension(&params).map_err(|e| e.to_string())?;
            let response = PensionResponse::from(estimate);
            if json {
                return print_json(&response);
            }
            println!(
                "Months factor calculated for payments: {:.0}\n",
                response.estimate.payout_months
            );
            for segment in &response.estimate.segments {
                println!(
                    "Ages {}-{} salary: {:.0}",
                    segment.start_age, segment.end_age, segment.monthly_salary
                );
            }
            println!(
                "\nEstimated monthly payment at retirement: {:.0}",
                response.estimate.monthly_payment
            );
        }
        Command::Housing(args) => {
            let params = build_housing_parameters(&args)?;
            let estimate = compare_housing_paths(&params).map_err(|e| e.to_string())?;
            let response = HousingResponse::from(estimate);
            if json {
                return print_json(&response);
            }
            println!(
                "Time required to have a {:.2}M-house without debts:",
                params.house_price / 1e6
            );
            println!(
                "Rent-and-invest: {}",
                format_years(response.years_rent_and_invest.unwrap_or(f64::INFINITY))
            );
            println!(
                "Mortgage: {}",
                format_years(response.years_mortgage.unwrap_or(f64::INFINITY))
            );
        }
        Command::Serve { .. } => {
            return Err("serve runs the HTTP server and is not a calculation".to_string());
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}

fn format_years(years: f64) -> String {
    if years.is_finite() {
        format!("{years:.0} years")
    } else {
        "never".to_string()
    }
}
