//! 핵심 에러 타입.
//!
//! 설정 에러는 시작 단계에서 치명적입니다. 서명 비밀키 없이 서버가 뜨는 일은 없어야 합니다.

use thiserror::Error;

/// 설정 로드/검증 에러.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 서명 비밀키 누락 또는 빈 값
    #[error("signing secret is missing: set SECRET_KEY or GATEKEEPER__AUTH__SECRET")]
    MissingSecret,

    /// 토큰 만료 정책 위반
    #[error("invalid token lifetimes: need 0 < access {access_hours}h < refresh {refresh_hours}h <= 876000h")]
    InvalidTokenLifetimes { access_hours: i64, refresh_hours: i64 },

    /// 설정 소스 에러
    #[error("설정 에러: {0}")]
    Source(#[from] config::ConfigError),
}
