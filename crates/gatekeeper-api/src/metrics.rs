//! Prometheus 메트릭 설정 및 유틸리티.
//!
//! HTTP 요청 메트릭과 인증 이벤트 메트릭을 수집하고 `/metrics` 엔드포인트로 노출합니다.

use std::time::Duration;

use metrics::{counter, histogram, Label};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

/// Prometheus 메트릭 레코더를 설정하고 핸들을 반환합니다.
///
/// 프로세스당 한 번만 설치할 수 있으며, 이미 설치되어 있으면 에러를 반환합니다.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new()
        // 비밀번호 해싱이 포함된 요청은 수백 ms가 걸리므로 상단 버킷을 넉넉히 둔다
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        )?
        .install_recorder()
}

/// 요청 시작 시 `http_requests_total`을 증가시킵니다.
pub fn record_http_request(method: &str, path: &str) {
    counter!("http_requests_total", http_labels(method, path)).increment(1);
}

/// 응답 완료 시 상태 코드별 카운터와 처리 시간 히스토그램을 함께 기록합니다.
pub fn record_http_completion(method: &str, path: &str, status: u16, elapsed: Duration) {
    let labels = http_labels(method, path);
    histogram!("http_request_duration_seconds", labels.clone()).record(elapsed.as_secs_f64());

    let mut labels = labels;
    labels.push(Label::new("status", status.to_string()));
    counter!("http_responses_total", labels).increment(1);
}

fn http_labels(method: &str, path: &str) -> Vec<Label> {
    vec![
        Label::new("method", method.to_string()),
        Label::new("path", path.to_string()),
    ]
}

// ============================================================================
// 인증 메트릭 헬퍼 함수
// ============================================================================

/// 인증 이벤트 카운터 증가.
///
/// * `stage` - "gate" | "login" | "signup" | "authorize"
/// * `outcome` - "accepted" | "rejected" 등
pub fn record_auth_event(stage: &'static str, outcome: &'static str) {
    counter!(
        "gatekeeper_auth_events_total",
        "stage" => stage,
        "outcome" => outcome
    )
    .increment(1);
}

// ============================================================================
// 경로 정규화 유틸리티
// ============================================================================

/// 경로에서 사용자 ID 같은 동적 세그먼트를 `{id}`로 정규화합니다.
///
/// 예: `/users/0f8c4e2a9b7d4c1e8a6f5b3d2c1e0a9f` → `/users/{id}`
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| if is_dynamic_segment(segment) { "{id}" } else { segment })
        .collect::<Vec<_>>()
        .join("/")
}

fn is_dynamic_segment(segment: &str) -> bool {
    if segment.is_empty() {
        return false;
    }

    let is_hyphenated_uuid =
        segment.len() == 36 && segment.chars().filter(|c| *c == '-').count() == 4;
    let is_simple_uuid = segment.len() == 32 && segment.chars().all(|c| c.is_ascii_hexdigit());
    let is_numeric = segment.chars().all(|c| c.is_ascii_digit());

    is_hyphenated_uuid || is_simple_uuid || is_numeric
}
