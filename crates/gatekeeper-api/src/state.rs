//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 Arc로 래핑되어 여러 요청 간에 공유됩니다.
//! 비밀키와 만료 정책은 생성 시 주입되며 이후 읽기 전용입니다.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header::InvalidHeaderName, HeaderName};
use gatekeeper_core::{AuthConfig, Role, SharedClock, StoreConfig, SystemClock};

use crate::auth::{
    GuardChain, PasswordHasher, RoleGuard, TokenCodec, TokenGuard, TokenIssuer, TokenValidator,
};
use crate::repository::{CredentialStore, InMemoryCredentialStore};

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 자격증명 저장소 (PostgreSQL 또는 인메모리)
    pub store: Arc<dyn CredentialStore>,

    /// 비밀번호 해셔 (Argon2id)
    pub hasher: PasswordHasher,

    /// 토큰 쌍 발급기
    pub issuer: TokenIssuer,

    /// 토큰 검증기 (게이트에서 사용)
    pub validator: TokenValidator,

    /// 현재 시각 공급원
    pub clock: SharedClock,

    /// 토큰을 읽을 요청 헤더 이름
    pub token_header: HeaderName,

    /// 핸들러 저장소 호출 타임아웃
    pub request_timeout: Duration,

    /// 토큰 갱신 저장 타임아웃
    pub token_update_timeout: Duration,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 인증 설정과 저장소로 상태 생성.
    ///
    /// 시계는 시스템 시계, 해셔는 기본 Argon2id 파라미터를 사용합니다.
    /// 토큰 헤더 이름이 HTTP 헤더로 쓸 수 없는 값이면 실패합니다.
    pub fn new(
        auth: &AuthConfig,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, InvalidHeaderName> {
        let token_header = HeaderName::from_bytes(auth.token_header.as_bytes())?;
        let clock = SystemClock::shared();
        let codec = TokenCodec::new(&auth.secret);
        let store_defaults = StoreConfig::default();

        Ok(Self {
            store,
            hasher: PasswordHasher::new(),
            issuer: TokenIssuer::from_config(codec.clone(), clock.clone(), auth),
            validator: TokenValidator::new(codec, clock.clone()),
            clock,
            token_header,
            request_timeout: Duration::from_secs(store_defaults.request_timeout_secs),
            token_update_timeout: Duration::from_secs(store_defaults.token_update_timeout_secs),
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// 인메모리 저장소로 상태 생성.
    pub fn in_memory(auth: &AuthConfig) -> Result<Self, InvalidHeaderName> {
        Self::new(auth, Arc::new(InMemoryCredentialStore::new()))
    }

    /// 시계 교체. 발급기와 검증기도 같은 시계를 쓰도록 다시 만듭니다.
    pub fn with_clock(mut self, auth: &AuthConfig, clock: SharedClock) -> Self {
        let codec = TokenCodec::new(&auth.secret);
        self.issuer = TokenIssuer::from_config(codec.clone(), clock.clone(), auth);
        self.validator = TokenValidator::new(codec, clock.clone());
        self.clock = clock;
        self
    }

    /// 비밀번호 해셔 설정.
    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// 저장소 타임아웃 설정.
    pub fn with_store_timeouts(mut self, config: &StoreConfig) -> Self {
        self.request_timeout = Duration::from_secs(config.request_timeout_secs);
        self.token_update_timeout = Duration::from_secs(config.token_update_timeout_secs);
        self
    }

    /// 토큰 검증만 하는 게이트 체인.
    pub fn authenticated_chain(&self) -> GuardChain {
        GuardChain::new().then(TokenGuard::new(
            self.token_header.clone(),
            self.validator.clone(),
        ))
    }

    /// 토큰 검증 후 정확한 역할을 요구하는 게이트 체인.
    pub fn role_chain(&self, role: Role) -> GuardChain {
        self.authenticated_chain().then(RoleGuard::new(role))
    }

    /// 서버 업타임(초) 반환.
    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }

    /// 저장소 연결 상태 확인.
    pub async fn is_store_healthy(&self) -> bool {
        self.store.is_healthy().await
    }
}

/// 테스트용 AppState 생성 헬퍼.
///
/// 인메모리 저장소, 고정 시계, 저비용 해셔를 사용합니다.
#[cfg(test)]
pub fn create_test_state() -> (AppState, Arc<gatekeeper_core::FixedClock>) {
    let auth = AuthConfig::with_secret("test-state-secret");
    let clock = Arc::new(gatekeeper_core::FixedClock::at_now());
    let state = AppState::in_memory(&auth)
        .expect("default token header is valid")
        .with_clock(&auth, clock.clone())
        .with_hasher(crate::auth::fast_hasher());
    (state, clock)
}
