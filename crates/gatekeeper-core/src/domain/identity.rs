//! 사용자 신원 모델.
//!
//! 저장소에 보관되는 [`Identity`]와 외부로 노출되는 [`IdentityView`]를 분리합니다.
//! 비밀번호 해시와 리프레시 토큰은 `IdentityView`에 필드 자체가 없으므로
//! 어떤 응답에도 포함될 수 없습니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// 저장된 사용자 신원.
///
/// `Serialize`를 구현하지 않습니다. 외부 표현은 항상 [`IdentityView`]를 거칩니다.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    /// 사용자 고유 ID
    pub user_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub role: Role,
    /// PHC 형식 비밀번호 해시
    pub password_hash: String,
    /// 마지막으로 발급된 access token
    pub token: Option<String>,
    /// 마지막으로 발급된 refresh token
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// 가입 요청으로부터 새 신원 생성.
    ///
    /// 사용자 ID는 새로 생성되며 생성/수정 시각은 `now`로 설정됩니다.
    pub fn new(registration: NewIdentity, password_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            user_id: Uuid::new_v4().simple().to_string(),
            email: registration.email,
            first_name: registration.first_name,
            last_name: registration.last_name,
            phone: registration.phone,
            role: registration.role,
            password_hash,
            token: None,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 외부 노출용 뷰로 변환.
    pub fn view(&self) -> IdentityView {
        IdentityView::from(self)
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("phone", &self.phone)
            .field("role", &self.role)
            .field("password_hash", &"[REDACTED]")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// 가입 시 입력되는 신원 속성 (해싱 전).
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub role: Role,
}

/// 외부 노출용 사용자 표현.
///
/// 로그인 응답, 사용자 조회 응답, 사용자 목록 항목에 사용됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityView {
    pub user_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub user_type: Role,
    /// access token (로그인 응답에서만 채워짐)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Identity> for IdentityView {
    fn from(identity: &Identity) -> Self {
        Self {
            user_id: identity.user_id.clone(),
            email: identity.email.clone(),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            phone: identity.phone.clone(),
            user_type: identity.role,
            token: identity.token.clone(),
            created_at: identity.created_at,
            updated_at: identity.updated_at,
        }
    }
}

impl IdentityView {
    /// access token을 제거한 뷰 (목록/조회용).
    #[must_use]
    pub fn without_token(mut self) -> Self {
        self.token = None;
        self
    }
}

/// 요청 범위 신원.
///
/// 검증된 토큰에서 추출되어 한 요청 동안만 존재합니다. 저장되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    pub uid: String,
    pub role: Role,
}

impl RequestIdentity {
    pub fn new(uid: impl Into<String>, role: Role) -> Self {
        Self {
            uid: uid.into(),
            role,
        }
    }
}
