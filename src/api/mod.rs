pub mod cli;

use std::net::SocketAddr;
use std::str::FromStr;

use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::info;

use crate::core::{
    Advisory, Estimate, GrowthBreakdown, HousingComparison, PensionEstimate, ProjectionError,
    compare_housing_paths, estimate_pension, project_with_breakdown, time_to_target,
};

use cli::{
    CliPensionPreset, HousingArgs, PensionArgs, ProjectArgs, TargetArgs, build_growth_parameters,
    build_housing_parameters, build_pension_parameters, build_target_query, default_housing_args,
    default_pension_args,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiPensionPreset {
    #[serde(alias = "defaultFund", alias = "default_fund", alias = "default")]
    DefaultFund,
    #[serde(alias = "highReturn", alias = "high_return")]
    HighReturn,
}

impl From<ApiPensionPreset> for CliPensionPreset {
    fn from(value: ApiPensionPreset) -> Self {
        match value {
            ApiPensionPreset::DefaultFund => CliPensionPreset::DefaultFund,
            ApiPensionPreset::HighReturn => CliPensionPreset::HighReturn,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ListInput<T> {
    Items(Vec<T>),
    Joined(String),
}

impl<T: FromStr> ListInput<T> {
    fn into_vec(self, field: &str) -> Result<Vec<T>, String> {
        match self {
            ListInput::Items(items) => Ok(items),
            ListInput::Joined(text) => text
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| {
                    item.parse::<T>()
                        .map_err(|_| format!("{field}: '{item}' is not a valid number"))
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    initial_balance: Option<f64>,
    monthly_deposit: Option<f64>,
    growth_rate: Option<f64>,
    years: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TargetPayload {
    target: Option<f64>,
    initial_balance: Option<f64>,
    monthly_deposit: Option<f64>,
    growth_rate: Option<f64>,
    target_growth_rate: Option<f64>,
    max_iterations: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PensionPayload {
    initial_sum: Option<f64>,
    ages: Option<ListInput<u32>>,
    salaries: Option<ListInput<f64>>,
    preset: Option<ApiPensionPreset>,
    death_age: Option<f64>,
    payout_months: Option<f64>,
    worker_percent: Option<f64>,
    employer_percent: Option<f64>,
    severance_percent: Option<f64>,
    deposit_friction_percent: Option<f64>,
    annual_cost_percent: Option<f64>,
    gross_return_percent: Option<f64>,
    acknowledge_risks: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct HousingPayload {
    price: Option<f64>,
    initial_sum: Option<f64>,
    monthly_saving: Option<f64>,
    rent_cost: Option<f64>,
    annual_return: Option<f64>,
    mortgage_cost: Option<f64>,
    price_increase: Option<f64>,
    tax: Option<f64>,
    max_iterations: Option<u32>,
    acknowledge_risks: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    final_balance: f64,
    total_deposits: f64,
    total_return: f64,
}

impl From<GrowthBreakdown> for ProjectResponse {
    fn from(value: GrowthBreakdown) -> Self {
        Self {
            final_balance: value.final_balance,
            total_deposits: value.total_deposits,
            total_return: value.total_return,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TargetResponse {
    years: Option<f64>,
    reachable: bool,
}

impl TargetResponse {
    fn from_years(years: f64) -> Self {
        let years = finite(years);
        Self {
            years,
            reachable: years.is_some(),
        }
    }
}

#[derive(Debug, Serialize)]
struct WarningResponse {
    advisory: Advisory,
    message: String,
}

impl From<Advisory> for WarningResponse {
    fn from(advisory: Advisory) -> Self {
        let message = advisory.message();
        Self { advisory, message }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PensionResponse {
    #[serde(flatten)]
    estimate: PensionEstimate,
    warnings: Vec<WarningResponse>,
}

impl From<Estimate<PensionEstimate>> for PensionResponse {
    fn from(value: Estimate<PensionEstimate>) -> Self {
        Self {
            estimate: value.result,
            warnings: value.warnings.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HousingResponse {
    years_rent_and_invest: Option<f64>,
    years_mortgage: Option<f64>,
    after_tax_return_rate: f64,
    mortgage_rate: f64,
    price_growth_rate: f64,
    warnings: Vec<WarningResponse>,
}

impl From<Estimate<HousingComparison>> for HousingResponse {
    fn from(value: Estimate<HousingComparison>) -> Self {
        let result = value.result;
        Self {
            years_rent_and_invest: finite(result.years_rent_and_invest),
            years_mortgage: finite(result.years_mortgage),
            after_tax_return_rate: result.after_tax_return_rate,
            mortgage_rate: result.mortgage_rate,
            price_growth_rate: result.price_growth_rate,
            warnings: value.warnings.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("nestegg HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/api/pension");
    axum::serve(listener, router()).await
}

fn router() -> Router {
    Router::new()
        .route("/api/project", get(project_get_handler).post(project_post_handler))
        .route(
            "/api/time-to-target",
            get(target_get_handler).post(target_post_handler),
        )
        .route("/api/pension", get(pension_get_handler).post(pension_post_handler))
        .route("/api/housing", get(housing_get_handler).post(housing_post_handler))
        .fallback(not_found_handler)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    project_handler_impl(payload)
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    project_handler_impl(payload)
}

async fn target_get_handler(Query(payload): Query<TargetPayload>) -> Response {
    target_handler_impl(payload)
}

async fn target_post_handler(Json(payload): Json<TargetPayload>) -> Response {
    target_handler_impl(payload)
}

async fn pension_get_handler(Query(payload): Query<PensionPayload>) -> Response {
    pension_handler_impl(payload)
}

async fn pension_post_handler(Json(payload): Json<PensionPayload>) -> Response {
    pension_handler_impl(payload)
}

async fn housing_get_handler(Query(payload): Query<HousingPayload>) -> Response {
    housing_handler_impl(payload)
}

async fn housing_post_handler(Json(payload): Json<HousingPayload>) -> Response {
    housing_handler_impl(payload)
}

fn project_handler_impl(payload: ProjectPayload) -> Response {
    let args = match project_args_from_payload(payload) {
        Ok(args) => args,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let result = build_growth_parameters(&args)
        .and_then(|params| project_with_breakdown(&params).map_err(model_error));
    match result {
        Ok(breakdown) => json_response(StatusCode::OK, ProjectResponse::from(breakdown)),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

fn target_handler_impl(payload: TargetPayload) -> Response {
    let args = match target_args_from_payload(payload) {
        Ok(args) => args,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let result = build_target_query(&args)
        .and_then(|query| time_to_target(&query).map_err(model_error));
    match result {
        Ok(years) => json_response(StatusCode::OK, TargetResponse::from_years(years)),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

fn pension_handler_impl(payload: PensionPayload) -> Response {
    let result = pension_args_from_payload(payload)
        .and_then(build_pension_parameters)
        .and_then(|params| estimate_pension(&params).map_err(model_error));
    match result {
        Ok(estimate) => json_response(StatusCode::OK, PensionResponse::from(estimate)),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

fn housing_handler_impl(payload: HousingPayload) -> Response {
    let args = match housing_args_from_payload(payload) {
        Ok(args) => args,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let result = build_housing_parameters(&args)
        .and_then(|params| compare_housing_paths(&params).map_err(model_error));
    match result {
        Ok(estimate) => json_response(StatusCode::OK, HousingResponse::from(estimate)),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

fn model_error(error: ProjectionError) -> String {
    error.to_string()
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn project_args_from_payload(payload: ProjectPayload) -> Result<ProjectArgs, String> {
    let Some(years) = payload.years else {
        return Err("years is required".to_string());
    };
    Ok(ProjectArgs {
        initial_balance: payload.initial_balance.unwrap_or(0.0),
        monthly_deposit: payload.monthly_deposit.unwrap_or(0.0),
        growth_rate: payload.growth_rate.unwrap_or(4.0),
        years,
    })
}

fn target_args_from_payload(payload: TargetPayload) -> Result<TargetArgs, String> {
    let Some(target) = payload.target else {
        return Err("target is required".to_string());
    };
    Ok(TargetArgs {
        target,
        initial_balance: payload.initial_balance.unwrap_or(0.0),
        monthly_deposit: payload.monthly_deposit.unwrap_or(0.0),
        growth_rate: payload.growth_rate.unwrap_or(4.0),
        target_growth_rate: payload.target_growth_rate.unwrap_or(0.0),
        max_iterations: payload.max_iterations.unwrap_or(1000),
    })
}

fn pension_args_from_payload(payload: PensionPayload) -> Result<PensionArgs, String> {
    let mut args = default_pension_args();

    if let Some(v) = payload.initial_sum {
        args.initial_sum = v;
    }
    if let Some(v) = payload.ages {
        args.ages = v.into_vec("ages")?;
    }
    if let Some(v) = payload.salaries {
        args.salaries = v.into_vec("salaries")?;
    }
    if let Some(v) = payload.preset {
        args.preset = v.into();
    }
    args.death_age = payload.death_age;
    args.payout_months = payload.payout_months;
    args.worker_percent = payload.worker_percent;
    args.employer_percent = payload.employer_percent;
    args.severance_percent = payload.severance_percent;
    args.deposit_friction_percent = payload.deposit_friction_percent;
    args.annual_cost_percent = payload.annual_cost_percent;
    args.gross_return_percent = payload.gross_return_percent;
    if let Some(v) = payload.acknowledge_risks {
        args.acknowledge_risks = v;
    }

    Ok(args)
}

fn housing_args_from_payload(payload: HousingPayload) -> Result<HousingArgs, String> {
    let mut args = default_housing_args();

    let Some(price) = payload.price else {
        return Err("price is required".to_string());
    };
    args.price = price;
    if let Some(v) = payload.initial_sum {
        args.initial_sum = v;
    }
    if let Some(v) = payload.monthly_saving {
        args.monthly_saving = v;
    }
    if let Some(v) = payload.rent_cost {
        args.rent_cost = v;
    }
    if let Some(v) = payload.annual_return {
        args.annual_return = v;
    }
    if let Some(v) = payload.mortgage_cost {
        args.mortgage_cost = v;
    }
    if let Some(v) = payload.price_increase {
        args.price_increase = v;
    }
    if let Some(v) = payload.tax {
        args.tax = v;
    }
    if let Some(v) = payload.max_iterations {
        args.max_iterations = v;
    }
    if let Some(v) = payload.acknowledge_risks {
        args.acknowledge_risks = v;
    }

    Ok(args)
}
