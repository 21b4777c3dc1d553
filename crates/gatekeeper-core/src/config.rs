//! 설정 관리.
//!
//! 기본값 → 설정 파일(선택) → `GATEKEEPER__*` 환경 변수 → `SECRET_KEY` 순으로 덮어씁니다.
//! 서명 비밀키가 비어 있으면 로드 자체가 실패합니다.

use std::path::Path;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;

/// 서명 비밀키를 담는 환경 변수.
pub const SECRET_KEY_ENV: &str = "SECRET_KEY";

/// 토큰 유효 시간 상한 (100년). 만료 시각 계산이 넘치지 않는 범위입니다.
pub const MAX_TOKEN_LIFETIME_HOURS: i64 = 24 * 365 * 100;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct GatekeeperConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 토큰/인증 설정
    pub auth: AuthConfig,
    /// 자격증명 저장소 설정
    pub store: StoreConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// CORS 허용 origin. 비어 있으면 모든 origin 허용 (개발용)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: Vec::new(),
        }
    }
}

/// 토큰 서명 비밀키.
///
/// `Debug` 출력에 값이 노출되지 않습니다.
#[derive(Clone)]
pub struct SigningSecret(Arc<SecretString>);

impl SigningSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Arc::new(SecretString::from(secret.into())))
    }

    /// 비밀키 바이트.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

impl Default for SigningSecret {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningSecret([REDACTED])")
    }
}

impl<'de> Deserialize<'de> for SigningSecret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SigningSecret::new)
    }
}

/// 토큰/인증 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 서명 비밀키
    #[serde(default)]
    pub secret: SigningSecret,
    /// Access Token 유효 시간 (시간)
    pub access_token_hours: i64,
    /// Refresh Token 유효 시간 (시간)
    pub refresh_token_hours: i64,
    /// 토큰을 담는 요청 헤더 이름
    pub token_header: String,
}

impl AuthConfig {
    /// 주어진 비밀키와 기본 만료 정책(24h / 168h)으로 설정 생성.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: SigningSecret::new(secret),
            access_token_hours: 24,
            refresh_token_hours: 168,
            token_header: "token".to_string(),
        }
    }

    /// 비밀키 존재 및 만료 정책 검증.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if self.access_token_hours <= 0
            || self.access_token_hours >= self.refresh_token_hours
            || self.refresh_token_hours > MAX_TOKEN_LIFETIME_HOURS
        {
            return Err(ConfigError::InvalidTokenLifetimes {
                access_hours: self.access_token_hours,
                refresh_hours: self.refresh_token_hours,
            });
        }
        Ok(())
    }
}

/// 자격증명 저장소 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// PostgreSQL 연결 URL (없으면 인메모리 저장소 사용)
    #[serde(default)]
    pub database_url: Option<String>,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 핸들러 저장소 호출 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 토큰 갱신 저장 타임아웃 (초)
    pub token_update_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 10,
            request_timeout_secs: 100,
            token_update_timeout_secs: 5,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl GatekeeperConfig {
    /// 파일(선택)과 환경 변수에서 설정을 로드합니다.
    ///
    /// `SECRET_KEY` 환경 변수가 있으면 `auth.secret`을 덮어씁니다.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, std::env::var(SECRET_KEY_ENV).ok())
    }

    /// 기본 경로(`config/default.toml`, 없어도 됨)에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(Some(Path::new("config/default.toml")))
    }

    /// 비밀키 오버라이드를 명시적으로 받아 설정을 로드합니다.
    pub fn load_with(
        path: Option<&Path>,
        secret_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        Self::load_from(path, secret_override, None)
    }

    /// `env_vars`가 있으면 프로세스 환경 대신 그 맵을 `GATEKEEPER__*` 소스로 씁니다.
    fn load_from(
        path: Option<&Path>,
        secret_override: Option<String>,
        env_vars: Option<config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            // 기본값으로 시작
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("auth.access_token_hours", 24)?
            .set_default("auth.refresh_token_hours", 168)?
            .set_default("auth.token_header", "token")?
            .set_default("store.max_connections", 10)?
            .set_default("store.request_timeout_secs", 100)?
            .set_default("store.token_update_timeout_secs", 5)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let builder = builder
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("GATEKEEPER")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true)
                    .source(env_vars),
            )
            .set_override_option("auth.secret", secret_override)?;

        let config: Self = builder.build()?.try_deserialize()?;
        config.auth.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 프로세스 환경 변수와 무관하게 로드.
    fn load_isolated(
        path: Option<&Path>,
        secret: Option<&str>,
    ) -> Result<GatekeeperConfig, ConfigError> {
        GatekeeperConfig::load_from(path, secret.map(str::to_string), Some(config::Map::new()))
    }

    #[test]
    fn test_load_without_secret_fails() {
        let result = load_isolated(None, None);
        assert!(matches!(result, Err(ConfigError::MissingSecret)));
    }

    #[test]
    fn test_load_with_blank_secret_fails() {
        let result = load_isolated(None, Some("   "));
        assert!(matches!(result, Err(ConfigError::MissingSecret)));
    }

    #[test]
    fn test_load_defaults_with_secret() {
        let config = load_isolated(None, Some("unit-test-secret")).unwrap();

        assert_eq!(config.auth.secret.expose(), "unit-test-secret");
        assert_eq!(config.auth.access_token_hours, 24);
        assert_eq!(config.auth.refresh_token_hours, 168);
        assert_eq!(config.auth.token_header, "token");
        assert_eq!(config.server.port, 8000);
        assert!(config.server.cors_origins.is_empty());
        assert_eq!(config.store.request_timeout_secs, 100);
        assert_eq!(config.store.token_update_timeout_secs, 5);
    }

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let auth = AuthConfig::with_secret("super-secret-value");
        let debug = format!("{:?}", auth);
        assert!(!debug.contains("super-secret-value"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_access_must_be_shorter_than_refresh() {
        let mut auth = AuthConfig::with_secret("s");
        auth.access_token_hours = 200;
        assert!(matches!(
            auth.validate(),
            Err(ConfigError::InvalidTokenLifetimes { .. })
        ));

        auth.access_token_hours = 24;
        assert!(auth.validate().is_ok());
    }

    #[test]
    fn test_oversized_lifetime_is_rejected() {
        let mut auth = AuthConfig::with_secret("s");
        auth.refresh_token_hours = 10_000_000_000;
        assert!(matches!(
            auth.validate(),
            Err(ConfigError::InvalidTokenLifetimes { .. })
        ));

        auth.refresh_token_hours = i64::MAX;
        assert!(auth.validate().is_err());

        auth.refresh_token_hours = MAX_TOKEN_LIFETIME_HOURS;
        assert!(auth.validate().is_ok());
    }

    #[test]
    fn test_load_rejects_oversized_refresh_lifetime() {
        let dir = std::env::temp_dir().join(format!("gatekeeper-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("oversized.toml");
        std::fs::write(&path, "[auth]\nrefresh_token_hours = 10000000000\n").unwrap();

        let result = load_isolated(Some(&path), Some("s"));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidTokenLifetimes { .. })
        ));
    }

    #[test]
    fn test_environment_overrides_file_defaults() {
        let mut env = config::Map::new();
        env.insert("GATEKEEPER__AUTH__SECRET".to_string(), "from-env".to_string());
        env.insert("GATEKEEPER__SERVER__PORT".to_string(), "9100".to_string());
        env.insert(
            "GATEKEEPER__SERVER__CORS_ORIGINS".to_string(),
            "http://a.test,http://b.test".to_string(),
        );

        let config = GatekeeperConfig::load_from(None, None, Some(env)).unwrap();
        assert_eq!(config.auth.secret.expose(), "from-env");
        assert_eq!(config.server.port, 9100);
        assert_eq!(
            config.server.cors_origins,
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn test_secret_override_wins_over_environment() {
        let mut env = config::Map::new();
        env.insert("GATEKEEPER__AUTH__SECRET".to_string(), "from-env".to_string());

        let config =
            GatekeeperConfig::load_from(None, Some("from-secret-key".to_string()), Some(env))
                .unwrap();
        assert_eq!(config.auth.secret.expose(), "from-secret-key");
    }
}
