//! 통합 API 에러 타입.
//!
//! 모든 핸들러는 [`ApiResult`]를 반환하고, 에러는 다음 형식으로 응답됩니다.
//!
//! ```json
//! {
//!   "error": {
//!     "code": "CONFLICT",
//!     "message": "email already exists"
//!   }
//! }
//! ```

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;
use validator::ValidationErrors;

use crate::auth::{AuthzError, CodecError, PasswordError};
use crate::repository::StoreError;

/// API 에러.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 요청 본문/파라미터 오류 (400)
    #[error("{0}")]
    Validation(String),

    /// 중복 (409)
    #[error("{0}")]
    Conflict(String),

    /// 인증 실패 (401)
    #[error("{0}")]
    Authentication(String),

    /// 권한 없음 (403)
    #[error(transparent)]
    Authorization(#[from] AuthzError),

    /// 리소스 없음 (404)
    #[error("{0}")]
    NotFound(String),

    /// 내부 오류 (500)
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP 상태 코드.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 에러 코드.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Authentication(_) => "AUTHENTICATION_FAILED",
            ApiError::Authorization(_) => "UNAUTHORISED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string()
            }
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail | StoreError::DuplicatePhone => {
                ApiError::Conflict(e.to_string())
            }
            StoreError::NotFound => ApiError::NotFound(e.to_string()),
            StoreError::Timeout | StoreError::Database(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(e: PasswordError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<CodecError> for ApiError {
    fn from(e: CodecError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{}: invalid value", field))
                })
            })
            .collect::<Vec<_>>();
        // 필드 순서가 HashMap 순회에 의존하지 않도록 정렬
        messages.sort();
        ApiError::Validation(messages.join("; "))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, ApiError>;
