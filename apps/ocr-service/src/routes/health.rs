//! Health check endpoints

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct KeepAliveResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "ocr-service",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    })
}

/// Target of the keep-alive pinger
pub async fn keep_alive() -> Json<KeepAliveResponse> {
    Json(KeepAliveResponse {
        status: "awake",
        timestamp: Utc::now(),
    })
}
