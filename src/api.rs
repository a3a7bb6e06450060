//! HTTP surface: routes, JSON error envelope and metrics text.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::error::ResolveError;
use crate::health::HealthReport;
use crate::resolver::format_uptime;
use crate::service::StatusService;
use crate::types::{CommitmentStatus, TransactionStatus};

/// Body returned for every failed request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    pub message: String,
}

/// A resolver failure on its way out as an HTTP response
#[derive(Debug)]
pub struct ApiError {
    title: &'static str,
    source: ResolveError,
}

impl ApiError {
    fn new(title: &'static str, source: ResolveError) -> Self {
        Self { title, source }
    }
}

/// HTTP status for each failure class
pub fn status_code(err: &ResolveError) -> StatusCode {
    match err {
        ResolveError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ResolveError::NotFound(_) => StatusCode::NOT_FOUND,
        ResolveError::Connectivity { .. }
        | ResolveError::OracleQuery(_)
        | ResolveError::Revert(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_code(&self.source);
        let body = ErrorResponse {
            error: self.title.to_string(),
            code: status.as_u16(),
            message: self.source.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the application router
pub fn router(service: StatusService) -> Router {
    // CORS configuration for cross-origin requests from frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/status", get(commitment_status))
        .route("/api/commitment/status", get(commitment_status))
        .route("/tx/{tx_hash}", get(transaction_status))
        .route("/api/transaction/{tx_hash}", get(transaction_status))
        .route("/metrics", get(metrics))
        .layer(cors)
        .with_state(service)
}

async fn root(State(service): State<StatusService>) -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "commitment-status",
        "version": env!("CARGO_PKG_VERSION"),
        "oracle": format!("{:?}", service.resolver().oracle().address),
        "endpoints": {
            "health": "/health",
            "commitment_status": "/status",
            "transaction_status": "/tx/{txHash}",
            "metrics": "/metrics"
        },
        "uptime": format_uptime(service.uptime())
    }))
}

async fn health(State(service): State<StatusService>) -> Json<HealthReport> {
    let report = service.health_report().await;
    if !report.is_healthy() {
        tracing::warn!(services = ?report.services, "Upstream health probe failed");
    }
    Json(report)
}

async fn commitment_status(
    State(service): State<StatusService>,
) -> Result<Json<CommitmentStatus>, ApiError> {
    service.commitment_status().await.map(Json).map_err(|e| {
        tracing::warn!(error = %e, "Commitment status request failed");
        ApiError::new("Failed to get commitment status", e)
    })
}

async fn transaction_status(
    State(service): State<StatusService>,
    Path(tx_hash): Path<String>,
) -> Result<Json<TransactionStatus>, ApiError> {
    service
        .transaction_status(&tx_hash)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::warn!(tx_hash = %tx_hash, error = %e, "Transaction status request failed");
            ApiError::new("Failed to get transaction status", e)
        })
}

async fn metrics(State(service): State<StatusService>) -> impl IntoResponse {
    // A resolved status already carries the health check
    let (healthy, total) = match service.commitment_status().await {
        Ok(status) => (status.is_service_healthy, Some(status.total_commitments)),
        Err(_) => (service.is_healthy().await, None),
    };

    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        render_metrics(service.uptime(), healthy, total),
    )
}

/// Prometheus text exposition of the service gauges.
///
/// `total_commitments` is left out when the oracle could not be read.
pub fn render_metrics(uptime: Duration, healthy: bool, total_commitments: Option<u64>) -> String {
    let mut out = format!(
        "# HELP commitment_service_uptime_seconds Total uptime in seconds\n\
         # TYPE commitment_service_uptime_seconds counter\n\
         commitment_service_uptime_seconds {:.3}\n\
         \n\
         # HELP commitment_service_health_status Service health status (1=healthy, 0=unhealthy)\n\
         # TYPE commitment_service_health_status gauge\n\
         commitment_service_health_status {}\n",
        uptime.as_secs_f64(),
        u8::from(healthy),
    );

    if let Some(total) = total_commitments {
        out.push_str(&format!(
            "\n\
             # HELP commitment_service_total_commitments Total number of commitments\n\
             # TYPE commitment_service_total_commitments gauge\n\
             commitment_service_total_commitments {total}\n"
        ));
    }
    out
}
