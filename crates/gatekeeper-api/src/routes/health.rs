//! 헬스 체크 endpoint.
//!
//! `/health`는 프로세스 생존 여부만, `/health/ready`는 저장소 연결까지 확인합니다.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// 서비스 전체 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Unhealthy,
}

/// 의존 컴포넌트 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Up,
    Down,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ServiceStatus,
    pub version: String,
    pub uptime_secs: i64,
    /// RFC 3339, 상태의 시계 기준
    pub timestamp: String,
    pub store: ComponentStatus,
}

impl HealthResponse {
    fn from_state(state: &AppState, store: ComponentStatus) -> Self {
        let status = match store {
            ComponentStatus::Up => ServiceStatus::Healthy,
            ComponentStatus::Down => ServiceStatus::Unhealthy,
        };
        Self {
            status,
            version: state.version.clone(),
            uptime_secs: state.uptime_secs(),
            timestamp: state.clock.now().to_rfc3339(),
            store,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self.status {
            ServiceStatus::Healthy => StatusCode::OK,
            ServiceStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /health/ready
///
/// 저장소가 응답하지 않으면 503.
pub async fn health_ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = if state.is_store_healthy().await {
        ComponentStatus::Up
    } else {
        ComponentStatus::Down
    };

    let response = HealthResponse::from_state(&state, store);
    if response.status == ServiceStatus::Unhealthy {
        tracing::warn!("Readiness check failed: credential store is down");
    }
    (response.status_code(), Json(response))
}
