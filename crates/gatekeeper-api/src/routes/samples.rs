//! 인증만 요구하는 샘플 endpoint.

use axum::Json;
use serde_json::{json, Value};

/// GET /api-1
pub async fn api_1() -> Json<Value> {
    Json(json!({ "success": "Access granted for api-1" }))
}

/// GET /api-2
pub async fn api_2() -> Json<Value> {
    Json(json!({ "success": "Access granted for api-2" }))
}
