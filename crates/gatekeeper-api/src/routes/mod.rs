//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `POST /users/signup`, `POST /users/login` - 공개
//! - `GET /users/{user_id}`, `GET /api-1`, `GET /api-2` - 토큰 필요
//! - `GET /users` - 토큰 + ADMIN 역할 필요

pub mod health;
pub mod samples;
pub mod users;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use gatekeeper_core::Role;

use crate::auth::authorization_gate;
use crate::state::AppState;

pub use health::{health_check, health_ready, HealthResponse};
pub use samples::{api_1, api_2};
pub use users::{
    get_user, list_users, login, signup, ListUsersQuery, LoginRequest, SignupRequest,
    SignupResponse, LOGIN_FAILED,
};

/// API 라우터 생성.
///
/// 게이트 체인은 `state`의 검증기와 토큰 헤더 설정으로 구성됩니다.
pub fn create_api_router(state: &AppState) -> Router<Arc<AppState>> {
    let public = Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(health_ready))
        .route("/users/signup", post(signup))
        .route("/users/login", post(login));

    let authenticated = Router::new()
        .route("/users/{user_id}", get(get_user))
        .route("/api-1", get(api_1))
        .route("/api-2", get(api_2))
        .route_layer(middleware::from_fn_with_state(
            state.authenticated_chain(),
            authorization_gate,
        ));

    let admin_only = Router::new()
        .route("/users", get(list_users))
        .route_layer(middleware::from_fn_with_state(
            state.role_chain(Role::Admin),
            authorization_gate,
        ));

    public.merge(authenticated).merge(admin_only)
}
