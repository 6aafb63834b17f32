//! End-to-end gateway tests with a scripted upstream.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use bytes::Bytes;
use http_body_util::BodyExt;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

use candor_core::error::ProviderError;
use candor_core::provider::{ByteStream, GenerationRequest, Generator};
use candor_gateway::{GatewayState, SharedState, TokenTable, build_router};
use candor_memory::InMemoryStore;
use candor_stream::{PatternTable, RewriteConfig, Rewriter};

/// Replays a fixed script of byte chunks as the upstream response.
struct ScriptedGenerator {
    chunks: Vec<Bytes>,
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream_bytes(
        &self,
        _request: GenerationRequest,
    ) -> Result<ByteStream, ProviderError> {
        let (tx, rx) = tokio::sync::mpsc::channel(8);
        let chunks = self.chunks.clone();
        tokio::spawn(async move {
            for chunk in chunks {
                if tx.send(Ok(chunk)).await.is_err() {
                    return;
                }
            }
        });
        Ok(rx)
    }
}

fn state_with(
    chunks: Vec<Bytes>,
    aggressiveness: i64,
    tokens: HashMap<String, String>,
) -> SharedState {
    Arc::new(GatewayState {
        generator: Arc::new(ScriptedGenerator { chunks }),
        retriever: None,
        rewriter: Arc::new(Rewriter::new(
            PatternTable::standard().unwrap(),
            RewriteConfig::new(aggressiveness),
        )),
        memory: Arc::new(InMemoryStore::new()),
        auth: Arc::new(TokenTable::new(tokens)),
        provider_name: "scripted".into(),
        default_model: "test-model".into(),
        default_temperature: 0.7,
        default_max_tokens: 1024,
        auto_save: true,
        start_time: chrono::Utc::now(),
    })
}

fn chat_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/chat/stream")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_string(body: Body) -> String {
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn health_is_open() {
    let mut tokens = HashMap::new();
    tokens.insert("tok".to_string(), "alice".to_string());
    let app = build_router(state_with(vec![], 0, tokens));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn stream_passthrough_at_zero_aggressiveness() {
    let upstream = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\" world\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    // Chunk boundaries deliberately mid-line.
    let chunks = vec![
        Bytes::copy_from_slice(&upstream.as_bytes()[..17]),
        Bytes::copy_from_slice(&upstream.as_bytes()[17..60]),
        Bytes::copy_from_slice(&upstream.as_bytes()[60..]),
    ];
    let app = build_router(state_with(chunks, 0, HashMap::new()));

    let response = app
        .oneshot(chat_request(
            r#"{"messages":[{"role":"user","content":"Say hello"}]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );
    assert_eq!(body_string(response.into_body()).await, upstream);
}

#[tokio::test]
async fn sentinel_survives_max_aggressiveness() {
    let chunks = vec![Bytes::from_static(b"data: [DONE]\n\n")];
    let app = build_router(state_with(chunks, 10, HashMap::new()));

    let response = app
        .oneshot(chat_request(
            r#"{"messages":[{"role":"user","content":"hi there"}]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(body_string(response.into_body()).await, "data: [DONE]\n\n");
}

#[tokio::test]
async fn empty_messages_rejected() {
    let app = build_router(state_with(vec![], 0, HashMap::new()));

    let response = app
        .oneshot(chat_request(r#"{"messages":[]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn v1_requires_token_when_table_configured() {
    let mut tokens = HashMap::new();
    tokens.insert("tok-abc".to_string(), "alice".to_string());
    let app = build_router(state_with(vec![], 0, tokens.clone()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let app = build_router(state_with(vec![], 0, tokens));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/status")
                .header(header::AUTHORIZATION, "Bearer tok-abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn status_reports_runtime_snapshot() {
    let app = build_router(state_with(vec![], 7, HashMap::new()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value =
        serde_json::from_str(&body_string(response.into_body()).await).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["provider"], "scripted");
    assert_eq!(body["provider_healthy"], true);
    assert_eq!(body["rewrite_aggressiveness"], 7);
    assert_eq!(body["memory_backend"], "in_memory");
    assert_eq!(body["retrieval_enabled"], false);
}

#[tokio::test]
async fn memory_roundtrip_scoped_to_anonymous() {
    let state = state_with(vec![], 0, HashMap::new());
    let app = build_router(state.clone());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/memory")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"content":"prefers terse answers"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let app = build_router(state);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/memory?q=terse")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value =
        serde_json::from_str(&body_string(response.into_body()).await).unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["records"][0]["content"], "prefers terse answers");
    assert_eq!(body["records"][0]["user_id"], "anonymous");
}

#[tokio::test]
async fn chat_auto_saves_both_turns() {
    let upstream = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"It depends\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    let state = state_with(vec![Bytes::from(upstream)], 0, HashMap::new());
    let app = build_router(state.clone());

    let response = app
        .oneshot(chat_request(
            r#"{"messages":[{"role":"user","content":"Is tabs or spaces better?"}]}"#,
        ))
        .await
        .unwrap();
    // Drain the body, then wait for the tee task to finish its save.
    let _ = body_string(response.into_body()).await;
    let mut count = 0;
    for _ in 0..50 {
        count = state.memory.count().await.unwrap();
        if count == 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(count, 2);
}
