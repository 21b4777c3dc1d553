//! 토큰 쌍 발급 및 저장.

use std::time::Duration as StdDuration;

use chrono::Duration;
use gatekeeper_core::{AuthConfig, Claims, SharedClock, TokenPair, TokenSubject};
use tracing::debug;

use super::codec::{CodecError, TokenCodec};
use crate::repository::{CredentialStore, StoreError, TokenUpdate};

/// Access/Refresh 토큰 쌍 발급기.
#[derive(Clone)]
pub struct TokenIssuer {
    codec: TokenCodec,
    clock: SharedClock,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(
        codec: TokenCodec,
        clock: SharedClock,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            codec,
            clock,
            access_ttl,
            refresh_ttl,
        }
    }

    /// 인증 설정의 만료 정책으로 발급기 생성.
    ///
    /// 표현할 수 없는 시간은 최대값으로 고정되며, 발급 시 [`CodecError::ExpiryOutOfRange`]가 됩니다.
    pub fn from_config(codec: TokenCodec, clock: SharedClock, config: &AuthConfig) -> Self {
        let ttl = |hours: i64| Duration::try_hours(hours).unwrap_or(Duration::MAX);
        Self::new(
            codec,
            clock,
            ttl(config.access_token_hours),
            ttl(config.refresh_token_hours),
        )
    }

    /// 같은 신원 속성으로 Access/Refresh Claims를 만들어 각각 서명합니다.
    pub fn issue(&self, subject: &TokenSubject) -> Result<TokenPair, CodecError> {
        let now = self.clock.now();
        let expires_after = |ttl: Duration| {
            now.checked_add_signed(ttl)
                .ok_or(CodecError::ExpiryOutOfRange)
        };
        let access_expires_at = expires_after(self.access_ttl)?;
        let refresh_expires_at = expires_after(self.refresh_ttl)?;

        let access_token = self.codec.sign(&Claims::new(subject, access_expires_at))?;
        let refresh_token = self.codec.sign(&Claims::new(subject, refresh_expires_at))?;

        debug!(user_id = %subject.uid, %access_expires_at, "Token pair issued");

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
        })
    }

    /// 새 토큰 쌍을 사용자 ID 기준으로 저장합니다 (upsert, last-write-wins).
    ///
    /// 저장 호출은 `timeout` 안에 끝나야 하며 초과 시 [`StoreError::Timeout`]을 반환합니다.
    pub async fn refresh(
        &self,
        store: &dyn CredentialStore,
        user_id: &str,
        pair: &TokenPair,
        timeout: StdDuration,
    ) -> Result<(), StoreError> {
        let update = TokenUpdate {
            token: pair.access_token.clone(),
            refresh_token: pair.refresh_token.clone(),
            updated_at: self.clock.now(),
        };

        tokio::time::timeout(timeout, store.update_tokens(user_id, update))
            .await
            .map_err(|_| StoreError::Timeout)?
    }
}
