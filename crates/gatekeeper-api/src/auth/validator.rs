//! 토큰 검증.
//!
//! 서명을 먼저 확인하고 만료를 나중에 확인합니다. 변조된 토큰은 만료 여부와 관계없이
//! 서명 에러로 실패해야 하므로 이 순서는 바뀌면 안 됩니다.

use gatekeeper_core::{Claims, SharedClock};

use super::codec::{CodecError, TokenCodec};

/// 토큰 검증 에러.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// 서명/디코딩 실패 (코덱 메시지 그대로)
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("token is expired")]
    Expired,
}

/// 토큰 검증기.
#[derive(Clone)]
pub struct TokenValidator {
    codec: TokenCodec,
    clock: SharedClock,
}

impl TokenValidator {
    pub fn new(codec: TokenCodec, clock: SharedClock) -> Self {
        Self { codec, clock }
    }

    /// 서명 → 만료 순으로 검증하고 Claims를 반환합니다.
    ///
    /// `exp`가 없거나 현재 시각 이전이면 [`TokenError::Expired`].
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.codec.parse_and_verify(token)?;

        if claims.is_expired_at(self.clock.now()) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    use chrono::{Duration, Utc};
    use gatekeeper_core::{Clock, FixedClock, Role, SigningSecret, TokenSubject};
    use std::sync::Arc;

    const SECRET: &str = "validator-test-secret";

    fn subject(role: Role) -> TokenSubject {
        TokenSubject {
            uid: "42".to_string(),
            email: "a@x.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            role,
        }
    }

    fn setup() -> (TokenCodec, Arc<FixedClock>, TokenValidator) {
        let codec = TokenCodec::new(&SigningSecret::new(SECRET));
        let clock = Arc::new(FixedClock::at_now());
        let validator = TokenValidator::new(codec.clone(), clock.clone());
        (codec, clock, validator)
    }

    #[test]
    fn test_valid_token() {
        let (codec, clock, validator) = setup();
        let claims = Claims::new(&subject(Role::User), clock.now() + Duration::hours(24));
        let token = codec.sign(&claims).unwrap();

        assert_eq!(validator.validate(&token).unwrap(), claims);
    }

    #[test]
    fn test_expired_token_with_valid_signature() {
        let (codec, clock, validator) = setup();
        let claims = Claims::new(&subject(Role::User), clock.now() + Duration::hours(24));
        let token = codec.sign(&claims).unwrap();

        clock.advance(Duration::hours(25));
        assert_eq!(validator.validate(&token), Err(TokenError::Expired));
        assert_eq!(TokenError::Expired.to_string(), "token is expired");
    }

    #[test]
    fn test_missing_exp_is_expired() {
        let (codec, clock, validator) = setup();
        let mut claims = Claims::new(&subject(Role::User), clock.now());
        claims.exp = None;
        let token = codec.sign(&claims).unwrap();

        assert_eq!(validator.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_wrong_secret_fails_with_signature_error() {
        let (_, clock, validator) = setup();
        let other = TokenCodec::new(&SigningSecret::new("some-other-secret"));
        let token = other
            .sign(&Claims::new(&subject(Role::User), clock.now() + Duration::hours(1)))
            .unwrap();

        assert_eq!(
            validator.validate(&token),
            Err(TokenError::Codec(CodecError::InvalidSignature))
        );
    }

    #[test]
    fn test_tampered_expired_token_reports_signature_first() {
        let (codec, clock, validator) = setup();
        let claims = Claims::new(&subject(Role::User), clock.now() - Duration::hours(1));
        let token = codec.sign(&claims).unwrap();

        // 역할을 ADMIN으로 바꾼 페이로드로 교체 (서명은 그대로)
        let mut forged = claims.clone();
        forged.user_type = Role::Admin;
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let parts: Vec<&str> = token.split('.').collect();
        let tampered = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert_eq!(
            validator.validate(&tampered),
            Err(TokenError::Codec(CodecError::InvalidSignature))
        );
    }

    #[test]
    fn test_tampered_unexpired_token_is_signature_error() {
        let (codec, _clock, validator) = setup();
        let claims = Claims::new(&subject(Role::User), Utc::now() + Duration::hours(1));
        let token = codec.sign(&claims).unwrap();

        let mut forged = claims.clone();
        forged.uid = "99".to_string();
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let parts: Vec<&str> = token.split('.').collect();
        let tampered = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        let err = validator.validate(&tampered).unwrap_err();
        assert_eq!(err, TokenError::Codec(CodecError::InvalidSignature));
        assert_eq!(err.to_string(), "token signature is invalid");
    }
}
