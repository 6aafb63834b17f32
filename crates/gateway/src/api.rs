//! /v1 API handlers.
//!
//! Endpoints:
//!
//! - `POST /v1/chat/stream` — proxy a streaming completion through the
//!   enrichment and rewrite pipeline
//! - `GET  /v1/status`      — runtime status snapshot
//! - `GET  /v1/version`     — build version
//! - `POST /v1/memory`      — store a note
//! - `GET  /v1/memory`      — search the caller's records

use axum::{
    Extension,
    body::Body,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use candor_core::error::{MemoryError, ProviderError};
use candor_core::identity::UserId;
use candor_core::memory::{MemoryQuery, MemoryRecord, RecordKind};
use candor_core::message::{Message, last_user_message};
use candor_core::provider::GenerationRequest;
use candor_stream::{Frame, StreamTransform, pump};

use crate::SharedState;

#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    error: String,
}

// ── Chat streaming ────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(crate) struct ChatStreamRequest {
    messages: Vec<Message>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    temperature: Option<f32>,
    #[serde(default)]
    max_tokens: Option<u32>,
}

/// `POST /v1/chat/stream` — the proxy pipeline.
///
/// Enriches the conversation when the latest user turn triggers retrieval,
/// opens the upstream stream, and pumps it through the rewrite transform.
/// The response body is the raw transformed wire protocol, not re-framed
/// by any SSE helper.
pub(crate) async fn chat_stream_handler(
    State(state): State<SharedState>,
    Extension(user): Extension<UserId>,
    Json(payload): Json<ChatStreamRequest>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    if payload.messages.is_empty() {
        return Err(bad_request("messages must not be empty"));
    }

    let model = payload
        .model
        .unwrap_or_else(|| state.default_model.clone());
    info!(user = %user, model = %model, "chat stream request");

    if state.auto_save
        && let Some(turn) = last_user_message(&payload.messages)
    {
        let record = MemoryRecord::new(user.clone(), RecordKind::UserTurn, turn.content.clone());
        if let Err(e) = state.memory.create(record).await {
            warn!(error = %e, "failed to save user turn");
        }
    }

    let messages = match &state.retriever {
        Some(retriever) => candor_enrich::prepare(&payload.messages, retriever).await,
        None => payload.messages,
    };

    let request = GenerationRequest {
        model,
        messages,
        temperature: payload.temperature.unwrap_or(state.default_temperature),
        max_tokens: payload.max_tokens.or(Some(state.default_max_tokens)),
    };

    let upstream = state
        .generator
        .stream_bytes(request)
        .await
        .map_err(provider_error_response)?;

    let transform = StreamTransform::new(state.rewriter.clone());
    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(pump(upstream, transform, tx));

    // Tee the transformed lines so the assistant turn (as the client saw
    // it) can be saved once the stream ends.
    let (out_tx, out_rx) = mpsc::channel(64);
    let memory = state.memory.clone();
    let auto_save = state.auto_save;
    tokio::spawn(async move {
        let mut rx = rx;
        let mut assistant = String::new();
        while let Some(item) = rx.recv().await {
            if auto_save
                && let Ok(bytes) = &item
                && let Ok(text) = std::str::from_utf8(bytes)
                && let Frame::Data(payload) = Frame::parse(text.trim_end_matches('\n'))
                && let Some(delta) = delta_text(&payload)
            {
                assistant.push_str(&delta);
            }
            if out_tx.send(item).await.is_err() {
                return;
            }
        }
        if auto_save && !assistant.trim().is_empty() {
            let record = MemoryRecord::new(user, RecordKind::AssistantTurn, assistant);
            if let Err(e) = memory.create(record).await {
                warn!(error = %e, "failed to save assistant turn");
            }
        }
    });

    let body = Body::from_stream(ReceiverStream::new(out_rx));
    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response())
}

/// Extract the delta text from one data-frame payload, if it is a
/// completion chunk. Anything unparsable is simply not memorable.
fn delta_text(payload: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(payload).ok()?;
    value["choices"][0]["delta"]["content"]
        .as_str()
        .map(str::to_string)
}

// ── Status / Version ──────────────────────────────────────────────────────

#[derive(Serialize)]
pub(crate) struct StatusResponse {
    status: &'static str,
    provider: String,
    provider_healthy: bool,
    model: String,
    uptime_secs: i64,
    retrieval_enabled: bool,
    rewrite_aggressiveness: u8,
    memory_backend: String,
    memory_records: usize,
}

pub(crate) async fn status_handler(
    State(state): State<SharedState>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<ErrorResponse>)> {
    let memory_records = state.memory.count().await.map_err(memory_error_response)?;
    let provider_healthy = state.generator.health_check().await.unwrap_or(false);

    Ok(Json(StatusResponse {
        status: "ok",
        provider: state.provider_name.clone(),
        provider_healthy,
        model: state.default_model.clone(),
        uptime_secs: (chrono::Utc::now() - state.start_time).num_seconds(),
        retrieval_enabled: state.retriever.is_some(),
        rewrite_aggressiveness: state.rewriter.config().aggressiveness,
        memory_backend: state.memory.name().to_string(),
        memory_records,
    }))
}

#[derive(Serialize)]
pub(crate) struct VersionResponse {
    name: &'static str,
    version: &'static str,
}

pub(crate) async fn version_handler() -> Json<VersionResponse> {
    Json(VersionResponse {
        name: "candor",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ── Memory ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(crate) struct CreateMemoryRequest {
    content: String,
}

#[derive(Serialize)]
pub(crate) struct CreateMemoryResponse {
    id: String,
    created_at: String,
}

pub(crate) async fn create_memory_handler(
    State(state): State<SharedState>,
    Extension(user): Extension<UserId>,
    Json(req): Json<CreateMemoryRequest>,
) -> Result<(StatusCode, Json<CreateMemoryResponse>), (StatusCode, Json<ErrorResponse>)> {
    if req.content.trim().is_empty() {
        return Err(bad_request("content must not be empty"));
    }

    let record = MemoryRecord::new(user, RecordKind::Note, req.content);
    let created_at = record.created_at.to_rfc3339();
    let id = state
        .memory
        .create(record)
        .await
        .map_err(memory_error_response)?;

    Ok((
        StatusCode::CREATED,
        Json(CreateMemoryResponse { id, created_at }),
    ))
}

#[derive(Deserialize)]
pub(crate) struct MemorySearchParams {
    #[serde(default)]
    q: String,
    #[serde(default = "default_search_limit")]
    limit: usize,
}

fn default_search_limit() -> usize {
    20
}

#[derive(Serialize)]
pub(crate) struct MemoryListResponse {
    records: Vec<MemoryRecord>,
    count: usize,
}

pub(crate) async fn search_memory_handler(
    State(state): State<SharedState>,
    Extension(user): Extension<UserId>,
    Query(params): Query<MemorySearchParams>,
) -> Result<Json<MemoryListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let records = state
        .memory
        .search(MemoryQuery {
            user_id: user,
            text: params.q,
            limit: params.limit,
        })
        .await
        .map_err(memory_error_response)?;

    let count = records.len();
    Ok(Json(MemoryListResponse { records, count }))
}

// ── Error mapping ─────────────────────────────────────────────────────────

fn bad_request(msg: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse { error: msg.into() }),
    )
}

fn provider_error_response(e: ProviderError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &e {
        ProviderError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        ProviderError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        ProviderError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_GATEWAY,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

fn memory_error_response(e: MemoryError) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}
