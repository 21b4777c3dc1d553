//! 가입 → 로그인 → 보호 라우트 통합 테스트
//!
//! 인메모리 저장소와 고정 시계로 전체 라우터를 구동합니다.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use chrono::Duration;
use gatekeeper_api::{create_api_router, AppState, InMemoryCredentialStore, PasswordHasher};
use gatekeeper_core::{AuthConfig, FixedClock};
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    store: Arc<InMemoryCredentialStore>,
    clock: Arc<FixedClock>,
}

impl TestApp {
    fn new() -> Self {
        Self::sharing(
            Arc::new(InMemoryCredentialStore::new()),
            AuthConfig::with_secret("integration-test-secret"),
        )
    }

    /// 같은 저장소를 쓰되 다른 인증 설정으로 구동.
    fn sharing(store: Arc<InMemoryCredentialStore>, auth: AuthConfig) -> Self {
        let clock = Arc::new(FixedClock::at_now());

        let state = AppState::new(&auth, store.clone())
            .unwrap()
            .with_clock(&auth, clock.clone())
            .with_hasher(PasswordHasher::with_params(8, 1, 1).unwrap());
        let router = create_api_router(&state).with_state(Arc::new(state));

        Self {
            router,
            store,
            clock,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, body_json(response).await)
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header("token", token);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// 가입 후 사용자 ID 반환.
    async fn signup(&self, email: &str, phone: &str, user_type: &str) -> String {
        let (status, body) = self
            .post(
                "/users/signup",
                json!({
                    "first_name": "Test",
                    "last_name": "User",
                    "password": "password1",
                    "email": email,
                    "phone": phone,
                    "user_type": user_type
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["inserted_id"].as_str().unwrap().to_string()
    }

    /// 로그인 후 access token 반환.
    async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .post(
                "/users/login",
                json!({ "email": email, "password": "password1" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    }
}

#[tokio::test]
async fn duplicate_email_or_phone_is_conflict_and_not_stored() {
    let app = TestApp::new();
    let first = app.signup("a@x.com", "010-0001", "USER").await;
    let tokens_before = app.store.tokens_for(&first).await.unwrap();

    let (status, body) = app
        .post(
            "/users/signup",
            json!({
                "first_name": "Other",
                "last_name": "User",
                "password": "password2",
                "email": "a@x.com",
                "phone": "010-9999",
                "user_type": "USER"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["message"], "email already exists");

    let (status, body) = app
        .post(
            "/users/signup",
            json!({
                "first_name": "Other",
                "last_name": "User",
                "password": "password2",
                "email": "b@x.com",
                "phone": "010-0001",
                "user_type": "USER"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["message"], "phone number already exists");

    assert_eq!(app.store.len().await, 1);
    assert_eq!(app.store.tokens_for(&first).await.unwrap(), tokens_before);
}

#[tokio::test]
async fn conflict_is_reported_before_token_issuance() {
    let app = TestApp::new();
    app.signup("a@x.com", "010-0001", "USER").await;

    // 이 설정의 발급기는 항상 실패한다 (만료 시각 계산 불가)
    let mut unissuable = AuthConfig::with_secret("integration-test-secret");
    unissuable.refresh_token_hours = i64::MAX;
    let broken = TestApp::sharing(app.store.clone(), unissuable);

    let request = |email: &str, phone: &str| {
        json!({
            "first_name": "Other",
            "last_name": "User",
            "password": "password2",
            "email": email,
            "phone": phone,
            "user_type": "USER"
        })
    };

    let (status, _) = broken.post("/users/signup", request("a@x.com", "010-9999")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = broken.post("/users/signup", request("b@x.com", "010-0001")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // 중복이 아니면 발급 단계까지 가서 실패
    let (status, body) = broken.post("/users/signup", request("c@x.com", "010-0003")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["message"], "token expiry is out of range");
    assert_eq!(app.store.len().await, 1);
}

#[tokio::test]
async fn wrong_password_is_generic_and_stores_no_token() {
    let app = TestApp::new();
    let user_id = app.signup("a@x.com", "010-0001", "USER").await;
    let tokens_before = app.store.tokens_for(&user_id).await.unwrap();
    app.clock.advance(Duration::seconds(30));

    let (status, wrong_password) = app
        .post(
            "/users/login",
            json!({ "email": "a@x.com", "password": "not-the-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown_email) = app
        .post(
            "/users/login",
            json!({ "email": "nobody@x.com", "password": "password1" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // 두 실패는 구분되지 않음
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(
        wrong_password["error"]["message"],
        "email or password is incorrect"
    );
    assert_eq!(app.store.tokens_for(&user_id).await.unwrap(), tokens_before);
}

#[tokio::test]
async fn login_rotates_stored_tokens() {
    let app = TestApp::new();
    let user_id = app.signup("a@x.com", "010-0001", "USER").await;
    let tokens_before = app.store.tokens_for(&user_id).await.unwrap();
    app.clock.advance(Duration::seconds(30));

    let token = app.login("a@x.com").await;

    let tokens_after = app.store.tokens_for(&user_id).await.unwrap();
    assert_eq!(tokens_after.token, token);
    assert_ne!(tokens_after.refresh_token, tokens_before.refresh_token);
}

#[tokio::test]
async fn user_can_read_own_record_but_not_others() {
    let app = TestApp::new();
    let me = app.signup("me@x.com", "010-0001", "USER").await;
    let other = app.signup("other@x.com", "010-0002", "USER").await;
    let token = app.login("me@x.com").await;

    let (status, body) = app.get(&format!("/users/{other}"), Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["message"], "unauthorised to access this resource");

    let (status, body) = app.get(&format!("/users/{me}"), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], me.as_str());
    assert_eq!(body["user_type"], "USER");

    let object = body.as_object().unwrap();
    assert!(!object.contains_key("password"));
    assert!(!object.contains_key("password_hash"));
    assert!(!object.contains_key("refresh_token"));
}

#[tokio::test]
async fn admin_can_read_any_record() {
    let app = TestApp::new();
    let user = app.signup("user@x.com", "010-0001", "USER").await;
    app.signup("admin@x.com", "010-0002", "ADMIN").await;
    let token = app.login("admin@x.com").await;

    let (status, body) = app.get(&format!("/users/{user}"), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "user@x.com");

    let (status, _) = app.get("/users/does-not-exist", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn protected_routes_require_token_header() {
    let app = TestApp::new();

    let (status, body) = app.get("/api-1", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "no authorization header provided");

    let (status, _) = app.get("/api-1", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    app.signup("a@x.com", "010-0001", "USER").await;
    let token = app.login("a@x.com").await;
    let (status, body) = app.get("/api-1", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": "Access granted for api-1" }));
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let app = TestApp::new();
    app.signup("a@x.com", "010-0001", "USER").await;
    let token = app.login("a@x.com").await;

    app.clock.advance(Duration::hours(25));

    let (status, body) = app.get("/api-2", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "token is expired");
}

#[tokio::test]
async fn admin_list_rejects_user_and_paginates_for_admin() {
    let app = TestApp::new();
    app.signup("admin@x.com", "010-0000", "ADMIN").await;
    for n in 1..=4 {
        app.signup(&format!("user{n}@x.com"), &format!("010-000{n}"), "USER")
            .await;
    }

    let user_token = app.login("user1@x.com").await;
    let (status, _) = app.get("/users", Some(&user_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin_token = app.login("admin@x.com").await;

    let (status, body) = app.get("/users", Some(&admin_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 5);
    assert_eq!(body["user_items"].as_array().unwrap().len(), 5);

    let (status, body) = app
        .get("/users?recordPerPage=2&page=2", Some(&admin_token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 5);
    let items = body["user_items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["email"], "user2@x.com");
    assert_eq!(items[1]["email"], "user3@x.com");
    for item in items {
        assert!(item.get("token").is_none());
        assert!(item.get("refresh_token").is_none());
    }

    // 잘못된 숫자는 기본값
    let (status, body) = app
        .get("/users?recordPerPage=abc&page=-1", Some(&admin_token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_items"].as_array().unwrap().len(), 5);
}
