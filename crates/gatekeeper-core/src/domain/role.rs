//! 역할 기반 접근 제어 (RBAC).
//!
//! 사용자 역할 정의. 역할 집합은 닫혀 있으며 와이어 표현은
//! 대소문자를 구분하는 정확한 문자열(`"ADMIN"`, `"USER"`)입니다.

use serde::{Deserialize, Serialize};

/// 사용자 역할.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// 관리자 - 모든 사용자 조회 가능
    Admin,
    /// 일반 사용자 - 본인 리소스만 접근 가능
    User,
}

impl Role {
    /// 전체 역할 목록.
    pub const ALL: [Role; 2] = [Role::Admin, Role::User];

    /// 와이어 문자열 표현.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }

    /// 문자열에서 역할 파싱 (대소문자 구분).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ADMIN" => Some(Role::Admin),
            "USER" => Some(Role::User),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown role: {}", s))
    }
}
