//! 요청 단위 인가 게이트.
//!
//! 게이트는 순서가 있는 [`Guard`] 목록([`GuardChain`])을 실행합니다. 각 가드는
//! "갱신된 신원으로 계속" 또는 "에러로 거부" 중 하나를 반환합니다.
//! 모든 가드를 통과하면 [`RequestIdentity`]가 request extensions에 들어가고
//! 핸들러는 [`Authenticated`] 추출기로 꺼내 씁니다.
//!
//! ```rust,ignore
//! let chain = GuardChain::new().then(TokenGuard::new("token", validator));
//! let protected = Router::new()
//!     .route("/users/{user_id}", get(get_user))
//!     .route_layer(middleware::from_fn_with_state(chain, authorization_gate));
//!
//! async fn get_user(Authenticated(identity): Authenticated) -> impl IntoResponse { ... }
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderName, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use gatekeeper_core::{RequestIdentity, Role};
use serde_json::json;
use tracing::debug;

use super::guards::{require_role, AuthzError};
use super::validator::{TokenError, TokenValidator};
use crate::metrics::record_auth_event;

/// 게이트 거부 사유.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("no authorization header provided")]
    MissingToken,
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Forbidden(#[from] AuthzError),
}

impl GateError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            GateError::MissingToken => (StatusCode::UNAUTHORIZED, "MISSING_TOKEN"),
            GateError::Token(TokenError::Expired) => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            GateError::Token(TokenError::Codec(_)) => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            GateError::Forbidden(_) => (StatusCode::FORBIDDEN, "UNAUTHORISED"),
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string()
            }
        }));

        (status, body).into_response()
    }
}

/// 가드 실행 결과.
#[derive(Debug)]
pub enum GuardOutcome {
    /// 다음 가드로 진행 (현재까지 확인된 신원 포함)
    Continue(Option<RequestIdentity>),
    /// 요청 거부
    Reject(GateError),
}

/// 게이트를 구성하는 단일 검사 단계.
pub trait Guard: Send + Sync {
    fn check(&self, parts: &Parts, identity: Option<RequestIdentity>) -> GuardOutcome;
}

/// 헤더에서 토큰을 읽어 검증하는 가드.
pub struct TokenGuard {
    header: HeaderName,
    validator: TokenValidator,
}

impl TokenGuard {
    pub fn new(header: HeaderName, validator: TokenValidator) -> Self {
        Self { header, validator }
    }
}

impl Guard for TokenGuard {
    fn check(&self, parts: &Parts, _identity: Option<RequestIdentity>) -> GuardOutcome {
        let Some(token) = parts
            .headers
            .get(&self.header)
            .and_then(|h| h.to_str().ok())
            .filter(|t| !t.is_empty())
        else {
            return GuardOutcome::Reject(GateError::MissingToken);
        };

        match self.validator.validate(token) {
            Ok(claims) => GuardOutcome::Continue(Some(claims.request_identity())),
            Err(e) => GuardOutcome::Reject(e.into()),
        }
    }
}

/// 특정 역할을 요구하는 가드. [`TokenGuard`] 뒤에 둡니다.
pub struct RoleGuard {
    role: Role,
}

impl RoleGuard {
    pub fn new(role: Role) -> Self {
        Self { role }
    }
}

impl Guard for RoleGuard {
    fn check(&self, _parts: &Parts, identity: Option<RequestIdentity>) -> GuardOutcome {
        match identity {
            Some(identity) => match require_role(&identity, self.role) {
                Ok(()) => GuardOutcome::Continue(Some(identity)),
                Err(e) => GuardOutcome::Reject(e.into()),
            },
            None => GuardOutcome::Reject(GateError::MissingToken),
        }
    }
}

/// 순서가 있는 가드 목록.
#[derive(Clone, Default)]
pub struct GuardChain {
    guards: Vec<Arc<dyn Guard>>,
}

impl GuardChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// 가드를 끝에 추가.
    #[must_use]
    pub fn then(mut self, guard: impl Guard + 'static) -> Self {
        self.guards.push(Arc::new(guard));
        self
    }

    /// 가드를 순서대로 실행. 첫 거부에서 멈춥니다.
    pub fn run(&self, parts: &Parts) -> Result<Option<RequestIdentity>, GateError> {
        let mut identity = None;
        for guard in &self.guards {
            match guard.check(parts, identity) {
                GuardOutcome::Continue(next) => identity = next,
                GuardOutcome::Reject(e) => return Err(e),
            }
        }
        Ok(identity)
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

/// 게이트 미들웨어.
///
/// 거부되면 핸들러는 호출되지 않습니다.
pub async fn authorization_gate(
    State(chain): State<GuardChain>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();

    match chain.run(&parts) {
        Ok(identity) => {
            record_auth_event("gate", "accepted");
            let mut request = Request::from_parts(parts, body);
            if let Some(identity) = identity {
                request.extensions_mut().insert(identity);
            }
            next.run(request).await
        }
        Err(e) => {
            record_auth_event("gate", "rejected");
            debug!(path = %parts.uri.path(), reason = %e, "Request rejected by gate");
            e.into_response()
        }
    }
}

/// 게이트를 통과한 요청의 신원 추출기.
///
/// 게이트가 적용되지 않은 라우트에서 사용하면 `MissingToken`으로 거부됩니다.
#[derive(Debug, Clone)]
pub struct Authenticated(pub RequestIdentity);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestIdentity>()
            .cloned()
            .map(Authenticated)
            .ok_or(GateError::MissingToken)
    }
}
