//! 핸들러용 인가 술어.
//!
//! 게이트를 통과한 요청의 [`RequestIdentity`]를 받아 역할/소유권 정책을 확인합니다.

use gatekeeper_core::{RequestIdentity, Role};

/// 인가 실패.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unauthorised to access this resource")]
pub struct AuthzError;

/// 호출자의 역할이 정확히 `role`인지 확인합니다.
pub fn require_role(identity: &RequestIdentity, role: Role) -> Result<(), AuthzError> {
    if identity.role == role {
        Ok(())
    } else {
        Err(AuthzError)
    }
}

/// 본인 리소스이거나 특권 역할일 때만 허용합니다.
///
/// 특권 역할이 아니면서 대상 ID가 본인 ID와 다르면 거부하고,
/// 그 외에는 호출자 자신의 역할로 [`require_role`]을 거칩니다.
pub fn require_self_or_role(
    identity: &RequestIdentity,
    target_user_id: &str,
    privileged_role: Role,
) -> Result<(), AuthzError> {
    if identity.role != privileged_role && identity.uid != target_user_id {
        return Err(AuthzError);
    }
    require_role(identity, identity.role)
}
