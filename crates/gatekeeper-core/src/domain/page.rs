//! 사용자 목록 페이지네이션.

use serde::{Deserialize, Serialize};

use super::IdentityView;

/// 기본 페이지 크기.
pub const DEFAULT_RECORDS_PER_PAGE: usize = 10;

/// 목록 조회 범위.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 건너뛸 레코드 수
    pub start_index: usize,
    /// 최대 반환 레코드 수
    pub limit: usize,
}

impl PageRequest {
    /// 쿼리 파라미터 원본값으로부터 범위 계산.
    ///
    /// - `record_per_page`: 없거나 1 미만이면 10
    /// - `page`: 없거나 1 미만이면 1
    /// - `start_index`: 없으면 `(page - 1) * record_per_page`
    pub fn from_query(
        record_per_page: Option<i64>,
        page: Option<i64>,
        start_index: Option<i64>,
    ) -> Self {
        let limit = match record_per_page {
            Some(n) if n >= 1 => n as usize,
            _ => DEFAULT_RECORDS_PER_PAGE,
        };
        let page = match page {
            Some(p) if p >= 1 => p as usize,
            _ => 1,
        };
        let start_index = match start_index {
            Some(s) if s >= 0 => s as usize,
            _ => (page - 1).saturating_mul(limit),
        };

        Self { start_index, limit }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::from_query(None, None, None)
    }
}

/// 사용자 목록 응답.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPage {
    /// 전체 사용자 수
    pub total_count: u64,
    /// 현재 페이지 항목
    pub user_items: Vec<IdentityView>,
}
