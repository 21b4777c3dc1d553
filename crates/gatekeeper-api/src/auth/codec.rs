//! 토큰 서명/파싱.
//!
//! HS256으로 [`Claims`]를 서명하고, 서명을 검증해 다시 [`Claims`]로 디코딩합니다.
//! 만료 검사는 하지 않습니다. 현재 시각은 [`TokenValidator`](super::TokenValidator)가 다룹니다.

use std::collections::HashSet;

use gatekeeper_core::{Claims, SigningSecret};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};

/// 토큰 코덱 에러.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("failed to sign token: {0}")]
    Signing(String),
    #[error("token expiry is out of range")]
    ExpiryOutOfRange,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token is invalid")]
    Invalid,
    /// 라이브러리 메시지를 그대로 전달
    #[error("{0}")]
    Malformed(String),
}

impl From<jsonwebtoken::errors::Error> for CodecError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature => CodecError::InvalidSignature,
            ErrorKind::Json(_) | ErrorKind::MissingRequiredClaim(_) => CodecError::Invalid,
            _ => CodecError::Malformed(e.to_string()),
        }
    }
}

/// HS256 토큰 코덱.
///
/// 비밀키는 생성 시 주입되며 이후 읽기 전용입니다.
/// 상태가 없으므로 여러 요청에서 동기화 없이 공유할 수 있습니다.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &Algorithm::HS256)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &SigningSecret) -> Self {
        let bytes = secret.expose().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        // 만료는 검증기에서 확인
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();

        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
            validation,
        }
    }

    /// Claims 서명.
    ///
    /// 만료 시각은 `claims.exp`에 이미 들어 있어야 합니다.
    pub fn sign(&self, claims: &Claims) -> Result<String, CodecError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| CodecError::Signing(e.to_string()))
    }

    /// 서명 검증 후 Claims 디코딩.
    pub fn parse_and_verify(&self, token: &str) -> Result<Claims, CodecError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}
