//! 인증 API 서버.
//!
//! 설정을 로드하고 저장소를 연결한 뒤 Axum 서버를 시작합니다.
//! 비밀키가 없으면 서버는 시작하지 않습니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware,
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use gatekeeper_api::metrics::setup_metrics_recorder;
use gatekeeper_api::middleware::metrics_layer;
use gatekeeper_api::repository::{CredentialStore, InMemoryCredentialStore, PgCredentialStore};
use gatekeeper_api::routes::create_api_router;
use gatekeeper_api::state::AppState;
use gatekeeper_core::{init_logging, GatekeeperConfig, LogConfig, ServerConfig};

/// `server.cors_origins`로 CORS 레이어 구성.
///
/// 토큰은 커스텀 헤더로 전달되므로 해당 헤더를 허용 목록에 넣어야 합니다.
fn cors_layer(server: &ServerConfig, token_header: HeaderName) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin.trim()).ok())
        .collect();

    let allow_origin = if origins.is_empty() {
        warn!("No valid server.cors_origins configured, allowing any origin");
        AllowOrigin::any()
    } else {
        info!(count = origins.len(), "CORS origins restricted");
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, token_header])
        .max_age(Duration::from_secs(60 * 60))
}

/// /metrics 엔드포인트 핸들러.
async fn metrics_handler(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}

/// 설정에 따라 저장소 선택.
async fn create_store(config: &GatekeeperConfig) -> anyhow::Result<Arc<dyn CredentialStore>> {
    match config.store.database_url.as_deref() {
        Some(url) => {
            let store = PgCredentialStore::connect(url, &config.store)
                .await
                .context("failed to connect credential store")?;
            Ok(Arc::new(store))
        }
        None => {
            warn!("store.database_url not set, using in-memory credential store");
            Ok(Arc::new(InMemoryCredentialStore::new()))
        }
    }
}

/// 전체 라우터 생성.
fn create_router(
    state: Arc<AppState>,
    server: &ServerConfig,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    let api_router = create_api_router(&state).with_state(state.clone());

    // 핸들러 타임아웃보다 약간 길게 둬서 저장소 타임아웃이 먼저 500으로 응답되게 한다
    let request_timeout = state.request_timeout + Duration::from_secs(5);

    Router::new()
        .merge(metrics_router)
        .merge(api_router)
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(cors_layer(server, state.token_header.clone()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    // 비밀키 없이 시작하지 않음
    let config = GatekeeperConfig::load_default().context("failed to load configuration")?;

    init_logging(LogConfig::from(&config.logging))
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    info!("Starting Gatekeeper API server...");

    let metrics_handle =
        setup_metrics_recorder().context("failed to install Prometheus recorder")?;
    info!("Prometheus metrics recorder initialized");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "invalid server address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    let store = create_store(&config).await?;
    let state = Arc::new(
        AppState::new(&config.auth, store)
            .context("invalid auth.token_header")?
            .with_store_timeouts(&config.store),
    );

    info!(
        version = %state.version,
        token_header = %state.token_header,
        access_token_hours = config.auth.access_token_hours,
        refresh_token_hours = config.auth.refresh_token_hours,
        "Application state initialized"
    );

    let app = create_router(state, &config.server, metrics_handle);

    info!(%addr, "API server listening");
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let shutdown_token = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown_token.clone()));

    let drained = shutdown_token.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { drained.cancelled().await })
        .await?;

    info!("Server stopped gracefully");

    Ok(())
}

/// Ctrl+C 또는 SIGTERM을 받으면 `shutdown_token`을 취소합니다.
///
/// 시그널 핸들러 설치에 실패한 쪽은 영원히 대기하므로 다른 쪽 시그널로만 종료됩니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let interrupt = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                warn!(error = %e, "Ctrl+C handler unavailable");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                "SIGTERM"
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    let received = tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    };

    warn!(signal = received, "Shutting down, draining in-flight requests");
    shutdown_token.cancel();
}
