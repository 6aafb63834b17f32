//! HTTP gateway for Candor.
//!
//! Exposes the streaming proxy endpoint plus status, version, and memory
//! routes, with bearer-token authentication in front of all /v1 routes.
//!
//! Built on Axum for high performance async HTTP.

pub mod api;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    middleware::{self, Next},
    response::Json,
    routing::{get, post},
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use candor_config::AppConfig;
use candor_core::identity::{Authenticator, UserId};
use candor_core::memory::MemoryStore;
use candor_core::provider::Generator;
use candor_enrich::ContextRetriever;
use candor_stream::{PatternTable, RewriteConfig, Rewriter};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub generator: Arc<dyn Generator>,
    /// `None` when retrieval is disabled in config.
    pub retriever: Option<ContextRetriever>,
    pub rewriter: Arc<Rewriter>,
    pub memory: Arc<dyn MemoryStore>,
    pub auth: Arc<dyn Authenticator>,
    pub provider_name: String,
    pub default_model: String,
    pub default_temperature: f32,
    pub default_max_tokens: u32,
    pub auto_save: bool,
    pub start_time: chrono::DateTime<chrono::Utc>,
}

pub type SharedState = Arc<GatewayState>;

/// Static bearer-token table from config.
///
/// An empty table means open access: every caller is admitted as the
/// anonymous user (local single-user mode).
pub struct TokenTable {
    tokens: HashMap<String, String>,
}

impl TokenTable {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }
}

impl Authenticator for TokenTable {
    fn resolve(&self, bearer_token: &str) -> Option<UserId> {
        self.tokens.get(bearer_token).map(|user| UserId::from(user.as_str()))
    }

    fn allows_anonymous(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Build the full router.
///
/// Security layers applied:
/// - Bearer token authentication on all /v1 routes
/// - CORS restricted to GET/POST with content-type/authorization headers
/// - Request body size limit (1 MB)
/// - HTTP trace logging
///
/// The /health endpoint stays outside the auth layer so monitoring can
/// poll it freely.
pub fn build_router(state: SharedState) -> Router {
    let v1 = Router::new()
        .route("/chat/stream", post(api::chat_stream_handler))
        .route("/status", get(api::status_handler))
        .route("/version", get(api::version_handler))
        .route("/memory", post(api::create_memory_handler))
        .route("/memory", get(api::search_memory_handler))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state);

    let cors = tower_http::cors::CorsLayer::new()
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/v1", v1)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let state = build_state(&config)?;

    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build shared state from config: provider, retriever, rewriter, memory,
/// and the auth table.
pub fn build_state(config: &AppConfig) -> anyhow::Result<SharedState> {
    let provider = Arc::new(candor_providers::from_config(config)?);
    let generator: Arc<dyn Generator> = provider.clone();

    let retriever = config.retrieval.enabled.then(|| {
        ContextRetriever::new(provider)
            .with_timeout(Duration::from_secs(config.retrieval.timeout_secs))
    });
    if retriever.is_none() {
        info!("retrieval disabled, requests pass through unenriched");
    }

    let mut rewrite_config = RewriteConfig::new(config.rewrite.aggressiveness);
    rewrite_config.inject_probability = config.rewrite.inject_probability;
    rewrite_config.challenge_divisor = config.rewrite.challenge_divisor;
    let rewriter = Arc::new(Rewriter::new(PatternTable::standard()?, rewrite_config));

    let memory = candor_memory::from_config(&config.memory);

    Ok(Arc::new(GatewayState {
        generator,
        retriever,
        rewriter,
        memory,
        auth: Arc::new(TokenTable::new(config.gateway.bearer_tokens.clone())),
        provider_name: config.default_provider.clone(),
        default_model: config.default_model.clone(),
        default_temperature: config.default_temperature,
        default_max_tokens: config.default_max_tokens,
        auto_save: config.memory.auto_save,
        start_time: chrono::Utc::now(),
    }))
}

/// Authentication middleware for the /v1 API.
///
/// Resolves `Authorization: Bearer <token>` to a user identity and stores
/// it in request extensions. With an empty token table every caller is the
/// anonymous user.
async fn auth_middleware(
    State(state): State<SharedState>,
    mut req: axum::extract::Request,
    next: Next,
) -> Result<axum::response::Response, StatusCode> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let user = match bearer.and_then(|token| state.auth.resolve(token)) {
        Some(user) => user,
        None if state.auth.allows_anonymous() => UserId::anonymous(),
        None => {
            warn!("unauthorized request to /v1 — missing or invalid bearer token");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
