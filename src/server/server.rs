use anyhow::Result;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tracing::info;

use crate::cache::token_cache::TokenCache;
use crate::config::settings::{MetricsConfig, Settings};
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::utils::constants::{GET_TOKEN_PATH, TOKEN_ERROR_MESSAGE};

static OK_STATUS: &'static str = "200";
static ERROR_STATUS: &'static str = "500";

#[derive(Clone)]
pub struct AppState {
    pub token_cache: TokenCache,
    pub metrics_state: MetricsState,
}

impl AppState {
    pub fn new(token_cache: TokenCache, metrics: &Metrics) -> Self {
        Self {
            token_cache,
            metrics_state: MetricsState::new(metrics.registry.clone()),
        }
    }
}

/// Build the full route set: the token endpoint plus the metrics scrape,
/// everything stamped with the permissive CORS headers.
pub fn router(metrics_config: &MetricsConfig, state: AppState) -> Router {
    Router::new()
        .route(GET_TOKEN_PATH, get(get_token).options(preflight))
        .merge(state.metrics_state.router(metrics_config))
        .layer(middleware::from_fn(cors_headers))
        .with_state(state)
}

/// Bind and serve until the process dies. No drain logic: the hosting
/// environment owns restarts.
pub async fn start(settings: &Settings, token_cache: TokenCache) -> Result<()> {
    let metrics = get_metrics().await;
    let state = AppState::new(token_cache, metrics);
    let app = router(&settings.metrics, state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", settings.port)).await?;
    info!("Server listening on port {}", settings.port);
    metrics.up.set(1);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Thin adapter over the token cache: 200 with the token when one is valid,
/// otherwise the fixed public error body.
async fn get_token(State(state): State<AppState>) -> Response {
    let metrics = get_metrics().await;

    match state.token_cache.ensure_valid_token().await {
        Some(token) => {
            metrics.token_requests.with_label_values(&[OK_STATUS]).inc();
            (StatusCode::OK, Json(json!({ "token": token.value }))).into_response()
        }
        None => {
            metrics.token_requests.with_label_values(&[ERROR_STATUS]).inc();
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": TOKEN_ERROR_MESSAGE })),
            )
                .into_response()
        }
    }
}

/// Browsers send OPTIONS before reading cross-origin responses; the CORS
/// stamp on this empty reply is all they are after.
async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Every response carries the public-CORS posture: any origin may read it.
async fn cors_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );

    response
}
