//! 자격증명 저장소.
//!
//! 핸들러는 [`CredentialStore`] trait만 알고, 실제 구현은 시작 시 선택됩니다.
//! - [`PgCredentialStore`]: PostgreSQL (운영)
//! - [`InMemoryCredentialStore`]: 프로세스 메모리 (DB 미설정 시, 테스트)
//!
//! 두 구현 모두 이메일과 전화번호 유일성을 저장 시점에 강제합니다.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatekeeper_core::{Identity, PageRequest, UserPage};

pub use memory::InMemoryCredentialStore;
pub use postgres::PgCredentialStore;

/// 저장소 에러.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already exists")]
    DuplicateEmail,
    #[error("phone number already exists")]
    DuplicatePhone,
    #[error("user not found")]
    NotFound,
    #[error("store operation timed out")]
    Timeout,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// 토큰 갱신 레코드 (user_id 기준 upsert).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenUpdate {
    pub token: String,
    pub refresh_token: String,
    pub updated_at: DateTime<Utc>,
}

/// 사용자별로 마지막에 저장된 토큰 쌍.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTokens {
    pub token: String,
    pub refresh_token: String,
    pub updated_at: DateTime<Utc>,
}

impl From<TokenUpdate> for StoredTokens {
    fn from(update: TokenUpdate) -> Self {
        Self {
            token: update.token,
            refresh_token: update.refresh_token,
            updated_at: update.updated_at,
        }
    }
}

/// 신원 저장소 추상화.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// 이메일 사용 여부.
    async fn email_exists(&self, email: &str) -> Result<bool, StoreError>;

    /// 전화번호 사용 여부.
    async fn phone_exists(&self, phone: &str) -> Result<bool, StoreError>;

    /// 신원 저장 후 사용자 ID 반환.
    ///
    /// 동시 가입으로 사전 검사를 통과한 중복은 여기서 `DuplicateEmail`/`DuplicatePhone`으로 실패합니다.
    /// `identity.token`/`refresh_token`이 있으면 토큰 레코드도 함께 저장됩니다.
    async fn insert(&self, identity: Identity) -> Result<String, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError>;

    async fn find_by_id(&self, user_id: &str) -> Result<Option<Identity>, StoreError>;

    /// 토큰 쌍 upsert. 마지막 쓰기가 이깁니다.
    async fn update_tokens(&self, user_id: &str, update: TokenUpdate) -> Result<(), StoreError>;

    /// 생성 순서대로 한 페이지 조회.
    async fn list(&self, page: PageRequest) -> Result<UserPage, StoreError>;

    /// 저장소 연결 상태. 메모리 저장소는 항상 정상입니다.
    async fn is_healthy(&self) -> bool {
        true
    }
}
