//! 토큰 인증 REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 가입/로그인/사용자 조회 API
//! - Argon2id 비밀번호 해싱, HS256 토큰 발급/검증
//! - 가드 체인 기반 인가 게이트와 역할/소유권 검사
//! - PostgreSQL 및 인메모리 자격증명 저장소
//! - Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: 인증 및 권한 관리
//! - [`repository`]: 자격증명 저장소
//! - [`metrics`]: Prometheus 메트릭 수집
//! - [`middleware`]: HTTP 미들웨어

pub mod auth;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod repository;
pub mod routes;
pub mod state;

pub use auth::{
    authorization_gate, require_role, require_self_or_role, Authenticated, AuthzError,
    GateError, GuardChain, PasswordHasher, TokenCodec, TokenIssuer, TokenValidator,
};
pub use error::{ApiError, ApiResult};
pub use metrics::setup_metrics_recorder;
pub use middleware::metrics_layer;
pub use repository::{CredentialStore, InMemoryCredentialStore, PgCredentialStore, StoreError};
pub use routes::create_api_router;
pub use state::AppState;
