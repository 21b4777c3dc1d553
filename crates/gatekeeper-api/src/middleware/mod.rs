//! API 서버용 HTTP middleware.
//!
//! 인가 게이트는 [`crate::auth`]에 있습니다.

mod metrics;

pub use metrics::metrics_layer;
