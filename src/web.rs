// Web calculator - REST API with Axum
// Stateless: every request prices against the shared fee table, nothing is recorded

use crate::calculator::{FeeInverter, GrossResult};
use crate::error::FeeError;
use crate::fees::{FeeEntry, FeeKey, FeeTable};
use crate::format::format_brl;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::warn;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inverter: Arc<FeeInverter>,
}

impl AppState {
    pub fn new(table: FeeTable) -> Self {
        AppState {
            inverter: Arc::new(FeeInverter::new(table)),
        }
    }
}

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    pub desired_net: f64,
    /// Table key: `debit-now`, `credit-now` or `credit-installments-N`
    pub option: String,
}

/// Calculation response with display strings ready for the page
#[derive(Serialize)]
pub struct CalculationResponse {
    #[serde(flatten)]
    result: GrossResult,
    label: String,
    gross_display: String,
    desired_display: String,
    per_installment_display: String,
    nothing_to_charge: bool,
}

impl From<GrossResult> for CalculationResponse {
    fn from(result: GrossResult) -> Self {
        Self {
            label: result.label(),
            gross_display: format_brl(result.gross),
            desired_display: format_brl(result.desired_net),
            per_installment_display: format_brl(result.per_installment),
            nothing_to_charge: result.desired_net == 0.0,
            result,
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/fees - All table entries in display order
async fn list_fees(State(state): State<AppState>) -> Json<ApiResponse<Vec<FeeEntry>>> {
    Json(ApiResponse::ok(state.inverter.table().entries()))
}

/// POST /api/calculate - Price one amount
async fn calculate(
    State(state): State<AppState>,
    payload: Result<Json<CalculateRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "malformed calculation request");
            let message = format!("Requisição inválida: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<CalculationResponse>::err(message)),
            )
                .into_response();
        }
    };

    let outcome = request
        .option
        .parse::<FeeKey>()
        .and_then(|key| state.inverter.compute_key(request.desired_net, key));

    match outcome {
        Ok(result) => {
            let body: CalculationResponse = result.into();
            (StatusCode::OK, Json(ApiResponse::ok(body))).into_response()
        }
        Err(e) => {
            warn!(option = %request.option, desired_net = request.desired_net, error = %e, "calculation rejected");
            let status = match e {
                FeeError::DivisionByZero => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            };
            (status, Json(ApiResponse::<CalculationResponse>::err(e.to_string()))).into_response()
        }
    }
}

/// GET / - Serve the calculator page
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

/// Build the full router: page plus `/api`
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/fees", get(list_fees))
        .route("/calculate", post(calculate))
        .with_state(state);

    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}
