//! # Gatekeeper Core
//!
//! 인증/인가 서비스의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 API 크레이트 전반에서 사용되는 기본 타입을 제공합니다:
//! - 사용자 신원 및 외부 노출용 뷰
//! - 역할(Role) 정의
//! - 토큰 Claims 및 토큰 쌍
//! - 요청 범위 신원 (RequestIdentity)
//! - 시계 추상화 (테스트용 고정 시계 포함)
//! - 설정 관리
//! - 로깅 인프라

pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use clock::{Clock, FixedClock, SharedClock, SystemClock};
pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
