mod config;
mod rate_limit;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Json, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Router};
use cresta_agents::ChatAgent;
use cresta_core::{ChatInput, WELCOME_MESSAGE};
use cresta_narrator::Narrator;
use cresta_observability::{AppMetrics, MetricsSnapshot};
use cresta_storage::SqliteWarehouse;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use crate::config::ApiConfig;
pub use crate::rate_limit::{ClientRateLimiter, RateDecision};

pub const QUERY_FAILED_MESSAGE: &str =
    "I'm sorry, I ran into a problem retrieving that information. Please try again in a moment.";

const BROWSE_LIMIT: u32 = 100;

pub type Agent = ChatAgent<SqliteWarehouse, Narrator>;

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<Agent>,
    pub metrics: Arc<AppMetrics>,
    pub api_key: Option<String>,
    pub limiter: ClientRateLimiter,
    pub allowed_origins: Arc<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct MessageRequest {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct HealthCapabilities {
    warehouse: bool,
    narrative: bool,
    api_key_required: bool,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    metrics: MetricsSnapshot,
    capabilities: HealthCapabilities,
}

pub async fn build_app(config: &ApiConfig) -> Result<Router> {
    let warehouse = SqliteWarehouse::connect(&config.database_url, config.db_max_connections)
        .await
        .context("failed to open warehouse")?;
    let narrator = Narrator::from_env().context("failed to build text generation client")?;

    Ok(build_app_with(config, warehouse, narrator))
}

pub fn build_app_with(config: &ApiConfig, warehouse: SqliteWarehouse, narrator: Narrator) -> Router {
    let metrics = AppMetrics::shared();
    let agent = ChatAgent::new(Arc::new(warehouse), Arc::new(narrator), metrics.clone())
        .with_narrative_timeout(config.narrative_timeout);

    let state = ApiState {
        agent: Arc::new(agent),
        metrics,
        api_key: config.api_key.clone(),
        limiter: ClientRateLimiter::new(config.rate_limit_window, config.rate_limit_max),
        allowed_origins: Arc::new(config.allowed_origins.clone()),
    };

    build_router(state)
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/welcome", get(welcome))
        .route("/api/chat", post(chat))
        .route("/api/resolve", post(resolve))
        .route("/api/properties", get(properties))
        .route("/api/leases", get(leases))
        .route("/api/cities", get(cities))
        .route("/api/columns", get(columns))
        .route("/api/tables", get(tables))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_key_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(build_cors_layer(&state.allowed_origins))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
        capabilities: HealthCapabilities {
            warehouse: state.agent.property_columns().await.is_ok(),
            narrative: state.agent.narrative_enabled(),
            api_key_required: state.api_key.is_some(),
        },
    };
    (StatusCode::OK, Json(payload))
}

async fn welcome() -> impl IntoResponse {
    Json(serde_json::json!({ "message": WELCOME_MESSAGE }))
}

async fn chat(State(state): State<ApiState>, Json(request): Json<MessageRequest>) -> Response {
    let Some(message) = required_message(request) else {
        return message_required();
    };

    match state.agent.handle_chat(ChatInput { message }).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(error) => {
            warn!(error = %format!("{error:#}"), "chat request failed");
            query_failed()
        }
    }
}

async fn resolve(State(state): State<ApiState>, Json(request): Json<MessageRequest>) -> Response {
    let Some(message) = required_message(request) else {
        return message_required();
    };

    (StatusCode::OK, Json(state.agent.resolve(&message))).into_response()
}

async fn properties(State(state): State<ApiState>) -> Response {
    rows_response(state.agent.list_properties(BROWSE_LIMIT).await)
}

async fn leases(State(state): State<ApiState>) -> Response {
    rows_response(state.agent.list_leases(BROWSE_LIMIT).await)
}

async fn cities(State(state): State<ApiState>) -> Response {
    rows_response(state.agent.list_cities().await)
}

async fn columns(State(state): State<ApiState>) -> Response {
    match state.agent.property_columns().await {
        Ok(columns) => {
            (StatusCode::OK, Json(serde_json::json!({ "columns": columns }))).into_response()
        }
        Err(error) => {
            warn!(error = %format!("{error:#}"), "column listing failed");
            query_failed()
        }
    }
}

async fn tables(State(state): State<ApiState>) -> Response {
    match state.agent.list_tables().await {
        Ok(tables) => {
            (StatusCode::OK, Json(serde_json::json!({ "tables": tables }))).into_response()
        }
        Err(error) => {
            warn!(error = %format!("{error:#}"), "table listing failed");
            query_failed()
        }
    }
}

fn rows_response<T: Serialize>(result: Result<Vec<T>>) -> Response {
    match result {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(error) => {
            warn!(error = %format!("{error:#}"), "browse request failed");
            query_failed()
        }
    }
}

fn required_message(request: MessageRequest) -> Option<String> {
    request
        .message
        .filter(|message| !message.trim().is_empty())
}

fn message_required() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": "Message is required" })),
    )
        .into_response()
}

fn query_failed() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "error": "query_failed",
            "response": QUERY_FAILED_MESSAGE
        })),
    )
        .into_response()
}

fn is_public_endpoint(path: &str) -> bool {
    matches!(path, "/api/health" | "/api/welcome")
}

async fn api_key_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.api_key.as_deref() else {
        return next.run(request).await;
    };
    if request.method() == Method::OPTIONS || is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let provided = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if provided != expected {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "unauthorized",
                "message": "missing or invalid x-api-key"
            })),
        )
            .into_response();
    }

    next.run(request).await
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || request.uri().path() == "/api/health" {
        return next.run(request).await;
    }

    let ip = request_ip(&request);
    if let RateDecision::Limited { retry_after } = state.limiter.check(&ip) {
        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "error": "rate_limited",
                "message": "rate limit exceeded for this client"
            })),
        )
            .into_response();
        if let Ok(value) = HeaderValue::from_str(&retry_after.as_secs().max(1).to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        return response;
    }

    next.run(request).await
}

fn request_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(',')
                .next()
                .unwrap_or("unknown")
                .trim()
                .to_string()
        })
        .unwrap_or_else(|| "local".to_string())
}

async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    response.headers_mut().insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response.headers_mut().insert(
        header::X_FRAME_OPTIONS,
        HeaderValue::from_static("DENY"),
    );
    response.headers_mut().insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    response
}

fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-api-key"),
        ]);

    if allowed_origins.iter().any(|origin| origin == "*") {
        return base.allow_origin(Any);
    }

    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();
    base.allow_origin(AllowOrigin::list(origins))
}
