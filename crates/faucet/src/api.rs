//! HTTP API for faucet service

use super::error::{FaucetError, FaucetResult};
use super::service::{DispenseResult, FaucetService, FaucetStatus};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Dispense request
#[derive(Debug, Deserialize)]
pub struct DispenseRequest {
    #[serde(default)]
    pub address: String,
}

/// Success response
#[derive(Debug, Serialize)]
pub struct DispenseResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: DispenseResult,
}

/// All faucet routes
pub fn router(service: Arc<FaucetService>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/faucet", get(status_handler).post(dispense_handler))
        .with_state(service)
}

/// Dispense handler
pub async fn dispense_handler(
    State(service): State<Arc<FaucetService>>,
    payload: Result<Json<DispenseRequest>, JsonRejection>,
) -> impl IntoResponse {
    // Malformed bodies still get the structured error envelope
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let err = FaucetError::InvalidAddress(rejection.body_text());
            service.metrics().record_outcome(err.code());
            return err.into_response();
        }
    };
    info!("Faucet request: address={}", request.address);

    match service.dispense(&request.address).await {
        Ok(result) => Json(DispenseResponse {
            success: true,
            result,
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Status handler
pub async fn status_handler(
    State(service): State<Arc<FaucetService>>,
) -> FaucetResult<Json<FaucetStatus>> {
    let status = service.get_status().await?;
    Ok(Json(status))
}

/// Prometheus scrape endpoint
pub async fn metrics_handler(State(service): State<Arc<FaucetService>>) -> impl IntoResponse {
    match service.metrics().gather() {
        Ok(text) => (StatusCode::OK, text).into_response(),
        Err(err) => {
            error!("Failed to gather metrics: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Root handler with info
pub async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "Capsule Network Faucet",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Testnet token faucet for Capsule Network",
        "endpoints": {
            "POST /api/faucet": "Request tokens",
            "GET /api/faucet": "Get faucet status",
            "GET /health": "Health check",
            "GET /metrics": "Prometheus metrics"
        }
    }))
}
