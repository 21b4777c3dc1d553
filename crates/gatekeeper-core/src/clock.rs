//! 시계 추상화.
//!
//! 토큰 만료 시각은 발급 시점의 벽시계에 의존합니다.
//! 발급기와 검증기는 [`Clock`]을 주입받아 현재 시각을 얻으므로
//! 테스트에서는 [`FixedClock`]으로 시간을 고정하거나 앞으로 이동시킬 수 있습니다.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};

/// 현재 시각 제공자.
pub trait Clock: Send + Sync {
    /// 현재 UTC 시각.
    fn now(&self) -> DateTime<Utc>;
}

/// 공유 가능한 시계 핸들.
pub type SharedClock = Arc<dyn Clock>;

/// 시스템 벽시계.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl SystemClock {
    /// `Arc`로 감싼 시스템 시계.
    pub fn shared() -> SharedClock {
        Arc::new(SystemClock)
    }
}

/// 고정 시계 (테스트용).
///
/// `advance`로 시간을 앞으로 이동시킬 수 있습니다.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    /// 주어진 시각으로 고정된 시계 생성.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// 현재 시각으로 고정된 시계 생성.
    pub fn at_now() -> Self {
        Self::new(Utc::now())
    }

    /// 시각을 `by`만큼 앞으로 이동.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}
