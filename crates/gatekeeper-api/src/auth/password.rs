//! 비밀번호 해싱.
//!
//! Argon2id 기반 비밀번호 해싱 및 검증. 작업 비용은 고정값이며
//! 해싱 한 번에 수십~수백 ms가 걸리므로 async 핸들러에서는
//! [`PasswordHasher::hash_blocking`] / [`PasswordHasher::verify_blocking`]을 사용해
//! blocking thread pool에서 실행합니다.

use std::sync::{Arc, OnceLock};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// 메모리 비용 (KiB).
pub const MEMORY_COST_KIB: u32 = 64 * 1024;
/// 반복 횟수.
pub const TIME_COST: u32 = 3;
/// 병렬도.
pub const PARALLELISM: u32 = 1;

/// 없는 계정 로그인 시 검증 비용을 맞추기 위한 기준 해시의 평문.
const ABSENT_ACCOUNT_PASSWORD: &str = "absent-account-reference";

/// 비밀번호 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("비밀번호 해싱 실패: {0}")]
    Hashing(String),
    #[error("잘못된 해싱 파라미터: {0}")]
    InvalidParams(String),
}

/// 비밀번호 해셔.
///
/// 생성 후에는 불변이며 `Clone`이 저렴합니다.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    /// 같은 파라미터로 만든 기준 해시. 처음 필요할 때 한 번 계산됩니다.
    absent_reference: Arc<OnceLock<Option<String>>>,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("params", self.argon2.params())
            .finish()
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)
            .unwrap_or_else(|_| Params::default());
        Self::from_params(params)
    }
}

impl PasswordHasher {
    /// 운영용 고정 비용 해셔.
    pub fn new() -> Self {
        Self::default()
    }

    /// 비용 파라미터를 지정한 해셔.
    ///
    /// 테스트에서 해싱 비용을 낮출 때 사용합니다.
    pub fn with_params(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        Ok(Self::from_params(params))
    }

    fn from_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            absent_reference: Arc::new(OnceLock::new()),
        }
    }

    /// 비밀번호 해싱.
    ///
    /// 솔트는 매번 OS 난수로 생성되며, 결과는 PHC 형식 문자열입니다.
    ///
    /// ```rust,ignore
    /// let hash = PasswordHasher::new().hash("my_secure_password")?;
    /// // "$argon2id$v=19$m=65536,t=3,p=1$..."
    /// ```
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hashing(e.to_string()))?;

        Ok(hash.to_string())
    }

    /// 비밀번호 검증.
    ///
    /// 불일치와 잘못된 해시 형식 모두 `false`를 반환합니다.
    /// 비교는 argon2 자체 검증 루틴(상수 시간)을 사용합니다.
    pub fn verify(&self, stored_hash: &str, candidate: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            return false;
        };

        self.argon2
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    }

    /// blocking thread pool에서 해싱.
    pub async fn hash_blocking(&self, plaintext: String) -> Result<String, PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| PasswordError::Hashing(e.to_string()))?
    }

    /// blocking thread pool에서 검증.
    pub async fn verify_blocking(&self, stored_hash: String, candidate: String) -> bool {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&stored_hash, &candidate))
            .await
            .unwrap_or(false)
    }

    /// 저장된 해시가 없는 계정에 대해 실제 검증과 같은 비용을 소모하고 `false`를 반환합니다.
    ///
    /// 로그인 응답 시간으로 이메일 존재 여부가 드러나지 않게 합니다.
    pub async fn verify_absent_blocking(&self, candidate: String) -> bool {
        let hasher = self.clone();
        let _ = tokio::task::spawn_blocking(move || {
            let reference = hasher
                .absent_reference
                .get_or_init(|| hasher.hash(ABSENT_ACCOUNT_PASSWORD).ok());
            if let Some(reference) = reference {
                hasher.verify(reference, &candidate);
            }
        })
        .await;
        false
    }

    #[cfg(test)]
    pub(crate) fn has_absent_reference(&self) -> bool {
        matches!(self.absent_reference.get(), Some(Some(_)))
    }
}

#[cfg(test)]
pub(crate) fn fast_hasher() -> PasswordHasher {
    PasswordHasher::with_params(8, 1, 1).expect("valid test params")
}
