//! 사용자 가입/로그인/조회 endpoint.
//!
//! - `POST /users/signup` - 가입 (공개)
//! - `POST /users/login` - 로그인 (공개)
//! - `GET /users` - 사용자 목록 (ADMIN)
//! - `GET /users/{user_id}` - 사용자 조회 (본인 또는 ADMIN)

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use gatekeeper_core::{
    Identity, IdentityView, NewIdentity, PageRequest, Role, TokenSubject, UserPage,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use validator::{Validate, ValidationError};

use crate::auth::{require_self_or_role, Authenticated};
use crate::error::{ApiError, ApiResult};
use crate::metrics::record_auth_event;
use crate::repository::StoreError;
use crate::state::AppState;

/// 로그인 실패 메시지. 이메일 존재 여부를 드러내지 않습니다.
pub const LOGIN_FAILED: &str = "email or password is incorrect";

// ==================== 요청/응답 타입 ====================

/// `user_type` 검증 (ADMIN | USER, 대소문자 구분)
fn validate_user_type(value: &str) -> Result<(), ValidationError> {
    if Role::parse(value).is_none() {
        return Err(ValidationError::new("invalid_user_type")
            .with_message("user_type must be ADMIN or USER".into()));
    }
    Ok(())
}

/// 가입 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 2, max = 100, message = "first_name must be 2-100 characters"))]
    pub first_name: String,
    #[validate(length(min = 2, max = 100, message = "last_name must be 2-100 characters"))]
    pub last_name: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    #[validate(custom(function = "validate_user_type"))]
    pub user_type: String,
}

/// 가입 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub inserted_id: String,
}

/// 로그인 요청.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 사용자 목록 쿼리.
///
/// 숫자로 해석되지 않는 값은 없는 것으로 취급해 기본값을 씁니다.
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    #[serde(rename = "recordPerPage")]
    pub record_per_page: Option<String>,
    pub page: Option<String>,
    #[serde(rename = "startIndex")]
    pub start_index: Option<String>,
}

impl ListUsersQuery {
    fn page_request(&self) -> PageRequest {
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<i64>().ok());
        PageRequest::from_query(
            parse(&self.record_per_page),
            parse(&self.page),
            parse(&self.start_index),
        )
    }
}

// ==================== 헬퍼 ====================

/// 저장소 호출에 타임아웃 적용.
async fn bounded<T, F>(timeout: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| StoreError::Timeout)?
}

// ==================== 핸들러 ====================

/// 가입.
///
/// POST /users/signup
///
/// 중복 검사는 해싱과 토큰 발급 전에 수행됩니다.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<Json<SignupResponse>> {
    let Json(request) = payload?;
    request.validate()?;

    let role = Role::parse(&request.user_type)
        .ok_or_else(|| ApiError::Validation("user_type must be ADMIN or USER".to_string()))?;

    let store = state.store.as_ref();
    let timeout = state.request_timeout;

    if bounded(timeout, store.email_exists(&request.email)).await? {
        record_auth_event("signup", "conflict");
        return Err(StoreError::DuplicateEmail.into());
    }
    if bounded(timeout, store.phone_exists(&request.phone)).await? {
        record_auth_event("signup", "conflict");
        return Err(StoreError::DuplicatePhone.into());
    }

    let password_hash = state.hasher.hash_blocking(request.password).await?;

    let mut identity = Identity::new(
        NewIdentity {
            email: request.email,
            first_name: request.first_name,
            last_name: request.last_name,
            phone: request.phone,
            role,
        },
        password_hash,
        state.clock.now(),
    );

    let pair = state.issuer.issue(&TokenSubject::from(&identity))?;
    identity.token = Some(pair.access_token);
    identity.refresh_token = Some(pair.refresh_token);

    let inserted_id = bounded(timeout, store.insert(identity)).await?;

    record_auth_event("signup", "accepted");
    info!(user_id = %inserted_id, role = %role, "User signed up");

    Ok(Json(SignupResponse { inserted_id }))
}

/// 로그인.
///
/// POST /users/login
///
/// 성공 시 새 토큰 쌍을 저장하고 access token이 포함된 사용자 뷰를 반환합니다.
/// 응답에는 비밀번호 해시와 refresh token이 없습니다.
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<IdentityView>> {
    let Json(request) = payload?;
    let store = state.store.as_ref();
    let timeout = state.request_timeout;

    let Some(found) = bounded(timeout, store.find_by_email(&request.email)).await? else {
        state.hasher.verify_absent_blocking(request.password).await;
        record_auth_event("login", "rejected");
        debug!(reason = "unknown_email", "Login rejected");
        return Err(ApiError::Authentication(LOGIN_FAILED.to_string()));
    };

    let verified = state
        .hasher
        .verify_blocking(found.password_hash.clone(), request.password)
        .await;
    if !verified {
        record_auth_event("login", "rejected");
        warn!(user_id = %found.user_id, reason = "password_mismatch", "Login rejected");
        return Err(ApiError::Authentication(LOGIN_FAILED.to_string()));
    }

    let pair = state.issuer.issue(&TokenSubject::from(&found))?;
    state
        .issuer
        .refresh(store, &found.user_id, &pair, state.token_update_timeout)
        .await?;

    let reloaded = bounded(timeout, store.find_by_id(&found.user_id))
        .await?
        .ok_or(StoreError::NotFound)?;

    record_auth_event("login", "accepted");
    info!(user_id = %reloaded.user_id, "User logged in");

    Ok(Json(reloaded.view()))
}

/// 사용자 목록 (ADMIN 전용, 라우터의 역할 가드로 보호).
///
/// GET /users?recordPerPage=10&page=1&startIndex=0
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    query: Result<Query<ListUsersQuery>, QueryRejection>,
) -> ApiResult<Json<UserPage>> {
    let Query(query) = query?;
    let page = query.page_request();

    let result = bounded(state.request_timeout, state.store.list(page)).await?;

    debug!(
        caller = %identity.uid,
        start_index = page.start_index,
        limit = page.limit,
        returned = result.user_items.len(),
        "Users listed"
    );

    Ok(Json(result))
}

/// 사용자 조회.
///
/// GET /users/{user_id}
///
/// USER는 본인만, ADMIN은 누구든 조회할 수 있습니다.
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    Path(user_id): Path<String>,
) -> ApiResult<Json<IdentityView>> {
    if let Err(e) = require_self_or_role(&identity, &user_id, Role::Admin) {
        record_auth_event("authorize", "rejected");
        debug!(caller = %identity.uid, target = %user_id, "Ownership check failed");
        return Err(e.into());
    }

    let found = bounded(state.request_timeout, state.store.find_by_id(&user_id))
        .await?
        .ok_or(StoreError::NotFound)?;

    Ok(Json(found.view().without_token()))
}
