//! 토큰 페이로드.
//!
//! Access Token과 Refresh Token은 같은 [`Claims`] 구조를 서로 다른 만료 시각으로 서명합니다.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::{Identity, RequestIdentity, Role};

/// 토큰 발급 대상 신원 속성.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub uid: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl From<&Identity> for TokenSubject {
    fn from(identity: &Identity) -> Self {
        Self {
            uid: identity.user_id.clone(),
            email: identity.email.clone(),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            role: identity.role,
        }
    }
}

/// 서명된 토큰의 페이로드.
///
/// 와이어 형식: `{email, first_name, last_name, uid, user_type, exp}`.
/// `exp`가 없는 토큰도 디코딩은 되지만 검증 단계에서 만료로 처리됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub uid: String,
    pub user_type: Role,
    /// Expiration (Unix timestamp, 초)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl Claims {
    /// 만료 시각을 지정해 Claims 생성.
    pub fn new(subject: &TokenSubject, expires_at: DateTime<Utc>) -> Self {
        Self {
            email: subject.email.clone(),
            first_name: subject.first_name.clone(),
            last_name: subject.last_name.clone(),
            uid: subject.uid.clone(),
            user_type: subject.role,
            exp: Some(expires_at.timestamp()),
        }
    }

    /// 만료 시각.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single())
    }

    /// `now` 기준 만료 여부. 만료 시각이 없으면 만료로 간주합니다.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at() {
            Some(expires_at) => expires_at < now,
            None => true,
        }
    }

    /// 요청 범위 신원 추출.
    pub fn request_identity(&self) -> RequestIdentity {
        RequestIdentity::new(self.uid.clone(), self.user_type)
    }
}

/// Access Token + Refresh Token 페어.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}
