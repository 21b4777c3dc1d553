//! HTTP 요청 metrics middleware.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};

use crate::metrics::{normalize_path, record_http_completion, record_http_request};

/// 요청/응답 카운터와 처리 시간 히스토그램을 기록합니다.
///
/// 라우터가 매칭한 경로 템플릿(`/users/{user_id}`)이 있으면 그대로 라벨로 쓰고,
/// 없으면 (404 등) 원본 경로를 정규화해 씁니다.
pub async fn metrics_layer(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().to_string();
    let path = match request.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_string(),
        None => normalize_path(request.uri().path()),
    };

    record_http_request(&method, &path);

    let response = next.run(request).await;

    record_http_completion(&method, &path, response.status().as_u16(), start.elapsed());

    response
}
