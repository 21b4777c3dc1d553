//! 인증 및 권한 부여.
//!
//! 비밀번호 해싱, 토큰 발급/검증, 요청 게이트, 역할/소유권 검사를 제공합니다.
//!
//! # 구성 요소
//!
//! - [`PasswordHasher`]: Argon2id 비밀번호 해싱
//! - [`TokenCodec`]: HS256 서명/파싱 (만료 검사 없음)
//! - [`TokenIssuer`]: Access/Refresh 토큰 쌍 발급 및 저장
//! - [`TokenValidator`]: 서명 → 만료 순 검증
//! - [`GuardChain`] / [`authorization_gate`]: 보호 라우트용 미들웨어
//! - [`require_role`], [`require_self_or_role`]: 핸들러용 인가 술어
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! async fn protected_handler(
//!     Authenticated(identity): Authenticated,
//!     Path(user_id): Path<String>,
//! ) -> ApiResult<Json<IdentityView>> {
//!     require_self_or_role(&identity, &user_id, Role::Admin)?;
//!     // ...
//! }
//! ```

mod codec;
mod gate;
mod guards;
mod issuer;
mod password;
mod validator;

pub use codec::{CodecError, TokenCodec};
pub use gate::{
    authorization_gate, Authenticated, GateError, Guard, GuardChain, GuardOutcome, RoleGuard,
    TokenGuard,
};
pub use guards::{require_role, require_self_or_role, AuthzError};
pub use issuer::TokenIssuer;
pub use password::{PasswordError, PasswordHasher};
pub use validator::{TokenError, TokenValidator};

#[cfg(test)]
pub(crate) use password::fast_hasher;
