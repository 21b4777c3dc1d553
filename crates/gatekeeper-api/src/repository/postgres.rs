//! PostgreSQL 자격증명 저장소.
//!
//! 사용자 레코드는 `users`, 토큰 쌍은 `user_tokens` 테이블에 보관합니다.
//! 이메일/전화번호 유일성은 유니크 인덱스로 강제되며, 위반은
//! [`StoreError::DuplicateEmail`] / [`StoreError::DuplicatePhone`]으로 변환됩니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatekeeper_core::{Identity, PageRequest, Role, StoreConfig, UserPage};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use super::{CredentialStore, StoreError, TokenUpdate};

const EMAIL_INDEX: &str = "users_email_unique_idx";
const PHONE_INDEX: &str = "users_phone_unique_idx";

const USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        user_id       TEXT PRIMARY KEY,
        email         TEXT NOT NULL,
        first_name    TEXT NOT NULL,
        last_name     TEXT NOT NULL,
        phone         TEXT NOT NULL,
        user_type     TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        created_at    TIMESTAMPTZ NOT NULL,
        updated_at    TIMESTAMPTZ NOT NULL
    )
"#;

const USER_TOKENS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS user_tokens (
        user_id       TEXT PRIMARY KEY,
        token         TEXT NOT NULL,
        refresh_token TEXT NOT NULL,
        updated_at    TIMESTAMPTZ NOT NULL
    )
"#;

/// (인덱스 이름, 컬럼). 위반 시 제약 이름으로 중복 종류를 판별합니다.
const UNIQUE_INDEXES: [(&str, &str); 2] = [(EMAIL_INDEX, "email"), (PHONE_INDEX, "phone")];

/// 실행 순서대로 정렬된 스키마 DDL.
fn schema_statements() -> Vec<String> {
    let mut statements = vec![USERS_TABLE.to_string()];
    statements.extend(UNIQUE_INDEXES.iter().map(|(name, column)| {
        format!("CREATE UNIQUE INDEX IF NOT EXISTS {name} ON users ({column})")
    }));
    statements.push(USER_TOKENS_TABLE.to_string());
    statements
}

/// 토큰 테이블을 합친 조회 컬럼. 토큰 갱신 시각이 있으면 그것이 `updated_at`.
const SELECT_IDENTITY: &str = r#"
    SELECT
        u.user_id, u.email, u.first_name, u.last_name, u.phone, u.user_type,
        u.password_hash, t.token, t.refresh_token, u.created_at,
        COALESCE(t.updated_at, u.updated_at) AS updated_at
    FROM users u
    LEFT JOIN user_tokens t ON t.user_id = u.user_id
"#;

#[derive(sqlx::FromRow)]
struct IdentityRow {
    user_id: String,
    email: String,
    first_name: String,
    last_name: String,
    phone: String,
    user_type: String,
    password_hash: String,
    token: Option<String>,
    refresh_token: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<IdentityRow> for Identity {
    type Error = StoreError;

    fn try_from(row: IdentityRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .user_type
            .parse()
            .map_err(|e: String| StoreError::Database(sqlx::Error::Decode(e.into())))?;

        Ok(Identity {
            user_id: row.user_id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            role,
            password_hash: row.password_hash,
            token: row.token,
            refresh_token: row.refresh_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// 유니크 인덱스 위반을 중복 에러로 변환.
fn map_unique_violation(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            match db.constraint() {
                Some(EMAIL_INDEX) => return StoreError::DuplicateEmail,
                Some(PHONE_INDEX) => return StoreError::DuplicatePhone,
                _ => {}
            }
        }
    }
    StoreError::Database(e)
}

/// PostgreSQL 저장소.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 연결 풀을 만들고 스키마를 준비합니다.
    pub async fn connect(database_url: &str, config: &StoreConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(database_url)
            .await?;

        let store = Self::new(pool);
        store.ensure_schema().await?;
        info!(max_connections = config.max_connections, "Credential store connected");
        Ok(store)
    }

    /// 테이블과 유니크 인덱스 생성 (이미 있으면 무시).
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in schema_statements() {
            sqlx::query(&statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<Identity>, StoreError> {
        let sql = format!("{SELECT_IDENTITY} WHERE u.{column} = $1");
        let row = sqlx::query_as::<_, IdentityRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Identity::try_from).transpose()
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn phone_exists(&self, phone: &str) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE phone = $1)")
            .bind(phone)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn insert(&self, identity: Identity) -> Result<String, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (
                user_id, email, first_name, last_name, phone, user_type,
                password_hash, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&identity.user_id)
        .bind(&identity.email)
        .bind(&identity.first_name)
        .bind(&identity.last_name)
        .bind(&identity.phone)
        .bind(identity.role.as_str())
        .bind(&identity.password_hash)
        .bind(identity.created_at)
        .bind(identity.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        if let (Some(token), Some(refresh_token)) = (&identity.token, &identity.refresh_token) {
            sqlx::query(
                r#"
                INSERT INTO user_tokens (user_id, token, refresh_token, updated_at)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(&identity.user_id)
            .bind(token)
            .bind(refresh_token)
            .bind(identity.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(identity.user_id)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        self.find_one("email", email).await
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<Identity>, StoreError> {
        self.find_one("user_id", user_id).await
    }

    async fn update_tokens(&self, user_id: &str, update: TokenUpdate) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO user_tokens (user_id, token, refresh_token, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
            SET token = EXCLUDED.token,
                refresh_token = EXCLUDED.refresh_token,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user_id)
        .bind(&update.token)
        .bind(&update.refresh_token)
        .bind(update.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self, page: PageRequest) -> Result<UserPage, StoreError> {
        let total_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let sql = format!("{SELECT_IDENTITY} ORDER BY u.created_at, u.user_id OFFSET $1 LIMIT $2");
        let rows = sqlx::query_as::<_, IdentityRow>(&sql)
            .bind(page.start_index as i64)
            .bind(page.limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let user_items = rows
            .into_iter()
            .map(|row| Identity::try_from(row).map(|identity| identity.view().without_token()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(UserPage {
            total_count: total_count.max(0) as u64,
            user_items,
        })
    }

    async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }
}
