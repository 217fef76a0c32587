//! HTTP API for regression, forecasting, health checks and Prometheus metrics

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use forecast_lib::{
    regression::{MAX_POLYNOMIAL_DEGREE, MIN_POLYNOMIAL_DEGREE},
    validation::whole_number,
    DatedValue, EngineError, EngineResult, EngineService, ModelRegistry, Observation,
    RegressionMethod, MAX_HORIZON,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: EngineService,
    pub registry: ModelRegistry,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(service: EngineService, registry: ModelRegistry, request_timeout: Duration) -> Self {
        Self {
            service,
            registry,
            request_timeout,
        }
    }
}

/// Error returned by API handlers, rendered as `{success, error, details}`
#[derive(Debug)]
pub enum ApiError {
    Engine(EngineError),
    BadRequest(String),
    Timeout(Duration),
    Internal(String),
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        Self::Engine(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, details) = match self {
            ApiError::Engine(e) => {
                let status = match &e {
                    EngineError::InvalidInput(_) | EngineError::InsufficientHistory { .. } => {
                        StatusCode::BAD_REQUEST
                    }
                    EngineError::NumericalFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    EngineError::PredictorFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.kind(), e.to_string())
            }
            ApiError::BadRequest(details) => (StatusCode::BAD_REQUEST, "invalid_input", details),
            ApiError::Timeout(limit) => (
                StatusCode::GATEWAY_TIMEOUT,
                "timeout",
                format!("request exceeded {}ms", limit.as_millis()),
            ),
            ApiError::Internal(details) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", details)
            }
        };

        (
            status,
            Json(json!({ "success": false, "error": kind, "details": details })),
        )
            .into_response()
    }
}

/// Run an engine call on the blocking pool under the request deadline
async fn run_blocking<T, F>(timeout: Duration, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> EngineResult<T> + Send + 'static,
{
    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(f)).await {
        Ok(Ok(result)) => result.map_err(ApiError::from),
        Ok(Err(join_error)) => {
            error!(error = %join_error, "Engine task failed");
            Err(ApiError::Internal("engine task failed".to_string()))
        }
        Err(_) => Err(ApiError::Timeout(timeout)),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Deserialize)]
pub struct RegressionRequest {
    pub data: Vec<Observation>,
    #[serde(rename = "type")]
    pub method: String,
    pub degree: Option<f64>,
    pub window: Option<f64>,
}

impl RegressionRequest {
    fn method(&self) -> EngineResult<RegressionMethod> {
        // Placeholder parameter: only the variant matters here
        let parameter = match RegressionMethod::from_name(&self.method, Some(0))? {
            RegressionMethod::Polynomial { .. } => self
                .degree
                .map(|degree| whole_number(degree, "degree"))
                .transpose()?,
            RegressionMethod::MovingAverage { .. } => self
                .window
                .map(|window| whole_number(window, "window"))
                .transpose()?,
            _ => None,
        };
        RegressionMethod::from_name(&self.method, parameter)
    }
}

async fn fit_regression(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegressionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let method = request.method()?;
    let service = state.service.clone();
    let data = request.data;

    let model = run_blocking(state.request_timeout, move || service.fit(&data, method)).await?;
    Ok(Json(model).into_response())
}

async fn describe_regression() -> impl IntoResponse {
    Json(json!({
        "endpoint": "/api/regression",
        "method": "POST",
        "description": "Fit a regression model to X-Y data",
        "request": {
            "data": "Array of {x, y} objects (at least 2)",
            "type": RegressionMethod::NAMES.join(" | "),
            "degree": format!(
                "Polynomial degree ({}-{}, default: 2)",
                MIN_POLYNOMIAL_DEGREE, MAX_POLYNOMIAL_DEGREE
            ),
            "window": "Moving-average window (required for moving-average)"
        },
        "response": {
            "type": "Regression type used",
            "formula": "Formula string",
            "coefficients": "Fitted coefficients",
            "r2": "Coefficient of determination (null when undefined)",
            "mae": "Mean absolute error",
            "rmse": "Root mean squared error",
            "predictions": "Predicted y for each x (null before a full moving-average window)"
        }
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictRequest {
    pub model: String,
    pub horizon: f64,
    pub historical_data: Vec<DatedValue>,
}

#[derive(Debug, Serialize)]
pub struct ModelSummary {
    #[serde(rename = "type")]
    pub key: String,
    pub name: String,
    pub mae: Option<f64>,
    pub rmse: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictResponse {
    pub success: bool,
    pub model: ModelSummary,
    pub horizon: usize,
    pub predictions: Vec<DatedValue>,
    pub historical_summary: forecast_lib::HistorySummary,
}

async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(request) = payload?;
    let horizon = whole_number(request.horizon, "horizon")?;

    let (entry, predictor) = match (
        state.registry.entry(&request.model),
        state.registry.get(&request.model),
    ) {
        (Some(entry), Some(predictor)) => (entry.clone(), predictor),
        _ => {
            return Err(EngineError::invalid(format!(
                "unknown model '{}', available: {}",
                request.model,
                state.registry.keys().join(", ")
            ))
            .into())
        }
    };

    let service = state.service.clone();
    let history = request.historical_data;
    let result = run_blocking(state.request_timeout, move || {
        service.forecast_dated(&history, predictor.as_ref(), horizon)
    })
    .await?;

    Ok(Json(PredictResponse {
        success: true,
        model: ModelSummary {
            key: entry.key,
            name: entry.name,
            mae: entry.mae,
            rmse: entry.rmse,
        },
        horizon,
        predictions: result
            .points
            .into_iter()
            .map(|p| DatedValue::new(p.date, round2(p.value)))
            .collect(),
        historical_summary: result.history,
    }))
}

async fn describe_predict(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "endpoint": "/api/predict",
        "method": "POST",
        "description": "Recursive multi-step forecasting",
        "availableModels": state.registry.entries(),
        "request": {
            "model": state.registry.keys().join(" | "),
            "horizon": format!("Forecast horizon: 0-{} steps", MAX_HORIZON),
            "historicalData": "Array of { date: \"YYYY-MM-DD\", value: number }"
        },
        "response": {
            "success": "boolean",
            "model": "Selected model with published MAE/RMSE",
            "horizon": "Number of steps predicted",
            "predictions": "Array of { date, value } for each step",
            "historicalSummary": "count, startDate and endDate of the history"
        }
    }))
}

/// Health check response
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "status": "healthy", "models": state.registry.len() })),
    )
}

/// Prometheus metrics endpoint
async fn metrics() -> Result<impl IntoResponse, ApiError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    ))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/regression", get(describe_regression).post(fit_regression))
        .route("/api/predict", get(describe_predict).post(predict))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(4.428571), 4.43);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_regression_request_parameters() {
        let request: RegressionRequest =
            serde_json::from_str(r#"{"data": [], "type": "polynomial", "degree": 3}"#).unwrap();
        assert_eq!(
            request.method().unwrap(),
            RegressionMethod::Polynomial { degree: 3 }
        );

        let request: RegressionRequest =
            serde_json::from_str(r#"{"data": [], "type": "polynomial", "degree": 2.5}"#).unwrap();
        assert!(matches!(request.method(), Err(EngineError::InvalidInput(_))));

        let request: RegressionRequest =
            serde_json::from_str(r#"{"data": [], "type": "moving-average", "window": 3}"#).unwrap();
        assert_eq!(
            request.method().unwrap(),
            RegressionMethod::MovingAverage { window: 3 }
        );
    }
}
