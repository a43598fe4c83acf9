use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::EngineConfig;
use crate::core::{
    Debt, Mix, PortfolioEngine, PortfolioInputs, RiskPref, amortize, compare_pay_down_vs_invest,
};
use crate::store::{MemoryStore, ProfileRepository};

pub const PROFILE_KEY: &str = "planner.profile";
const MAX_HORIZON_YEARS: f64 = 100.0;

#[derive(Clone)]
pub struct AppState {
    engine: Arc<Mutex<PortfolioEngine>>,
    profiles: Arc<Mutex<ProfileRepository<MemoryStore>>>,
}

impl AppState {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            engine: Arc::new(Mutex::new(PortfolioEngine::new(config))),
            profiles: Arc::new(Mutex::new(ProfileRepository::new(
                MemoryStore::default(),
                PROFILE_KEY,
            ))),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PortfolioPayload {
    lump_sum_eur: Option<f64>,
    #[serde(alias = "monthlyVklad")]
    monthly_contribution: Option<f64>,
    horizon_years: Option<f64>,
    reserve_eur: Option<f64>,
    reserve_months: Option<f64>,
    risk_pref: Option<RiskPref>,
    base_mix: Option<Mix>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AmortizePayload {
    debt: Debt,
    #[serde(default)]
    extra_monthly: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComparePayload {
    debt: Debt,
    #[serde(default)]
    extra_monthly: f64,
    horizon_years: f64,
    #[serde(alias = "expectedReturn", alias = "expected_return_pa")]
    expected_return_pa: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AmortizeResponse {
    months: u32,
    total_interest: f64,
    converges: bool,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/portfolio",
            get(portfolio_get_handler).post(portfolio_post_handler),
        )
        .route(
            "/api/profile",
            get(profile_get_handler).put(profile_put_handler),
        )
        .route("/api/debt/amortize", post(amortize_handler))
        .route("/api/debt/compare", post(compare_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(port: u16, config: EngineConfig) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(AppState::new(config));

    let listener = TcpListener::bind(addr).await?;
    info!("portfolio planner API listening on http://{addr}");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn portfolio_get_handler(
    State(state): State<AppState>,
    Query(payload): Query<PortfolioPayload>,
) -> Response {
    portfolio_handler_impl(&state, payload)
}

async fn portfolio_post_handler(
    State(state): State<AppState>,
    Json(payload): Json<PortfolioPayload>,
) -> Response {
    portfolio_handler_impl(&state, payload)
}

fn portfolio_handler_impl(state: &AppState, payload: PortfolioPayload) -> Response {
    let stored = lock(&state.profiles).load();
    let inputs = match inputs_from_payload(payload, stored.inputs) {
        Ok(inputs) => inputs,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let output = lock(&state.engine).compute(&inputs);
    json_response(StatusCode::OK, output)
}

async fn profile_get_handler(State(state): State<AppState>) -> Response {
    json_response(StatusCode::OK, lock(&state.profiles).load())
}

async fn profile_put_handler(State(state): State<AppState>, Json(patch): Json<Value>) -> Response {
    match lock(&state.profiles).save_patch(patch) {
        Ok(profile) => json_response(StatusCode::OK, profile),
        Err(err) => error_response(StatusCode::BAD_REQUEST, &err.to_string()),
    }
}

async fn amortize_handler(Json(payload): Json<AmortizePayload>) -> Response {
    if let Err(msg) = validate_debt(&payload.debt, payload.extra_monthly) {
        return error_response(StatusCode::BAD_REQUEST, &msg);
    }
    let result = amortize(&payload.debt, payload.extra_monthly);
    json_response(
        StatusCode::OK,
        AmortizeResponse {
            months: result.months,
            total_interest: result.total_interest,
            converges: result.converges(),
        },
    )
}

async fn compare_handler(Json(payload): Json<ComparePayload>) -> Response {
    if let Err(msg) = validate_debt(&payload.debt, payload.extra_monthly) {
        return error_response(StatusCode::BAD_REQUEST, &msg);
    }
    if !(0.0..=MAX_HORIZON_YEARS).contains(&payload.horizon_years) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "horizonYears must be between 0 and 100",
        );
    }
    if !(-1.0..=1.0).contains(&payload.expected_return_pa) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "expectedReturnPa must be a fraction between -1 and 1",
        );
    }

    json_response(
        StatusCode::OK,
        compare_pay_down_vs_invest(
            &payload.debt,
            payload.extra_monthly,
            payload.horizon_years,
            payload.expected_return_pa,
        ),
    )
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

fn inputs_from_payload(
    payload: PortfolioPayload,
    base: PortfolioInputs,
) -> Result<PortfolioInputs, String> {
    let mut inputs = base;

    if let Some(v) = payload.lump_sum_eur {
        inputs.lump_sum_eur = v;
    }
    if let Some(v) = payload.monthly_contribution {
        inputs.monthly_contribution = v;
    }
    if let Some(v) = payload.horizon_years {
        inputs.horizon_years = v;
    }
    if let Some(v) = payload.reserve_eur {
        inputs.reserve_eur = v;
    }
    if let Some(v) = payload.reserve_months {
        inputs.reserve_months = v;
    }
    if let Some(v) = payload.risk_pref {
        inputs.risk_pref = v;
    }
    if let Some(v) = payload.base_mix {
        inputs.base_mix = Some(v);
    }

    for (name, value) in [
        ("lumpSumEur", inputs.lump_sum_eur),
        ("monthlyVklad", inputs.monthly_contribution),
        ("reserveEur", inputs.reserve_eur),
        ("reserveMonths", inputs.reserve_months),
    ] {
        if value < 0.0 {
            return Err(format!("{name} must be >= 0"));
        }
    }

    if !(0.0..=MAX_HORIZON_YEARS).contains(&inputs.horizon_years) {
        return Err("horizonYears must be between 0 and 100".to_string());
    }

    Ok(inputs)
}

fn validate_debt(debt: &Debt, extra_monthly: f64) -> Result<(), String> {
    if debt.balance < 0.0 {
        return Err("debt.balance must be >= 0".to_string());
    }
    if debt.rate_pa < 0.0 {
        return Err("debt.ratePa must be >= 0".to_string());
    }
    if debt.monthly_payment < 0.0 {
        return Err("debt.monthlyPayment must be >= 0".to_string());
    }
    if extra_monthly < 0.0 {
        return Err("extraMonthly must be >= 0".to_string());
    }
    Ok(())
}

#[cfg(test)]
fn portfolio_payload_from_json(json: &str) -> Result<PortfolioPayload, String> {
    serde_json::from_str::<PortfolioPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))
}
