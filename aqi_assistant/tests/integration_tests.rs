/// Endpoint tests for the assistant, with a scripted chat model.
///
/// Run with: cargo test -p aqi_assistant --test integration_tests -- --nocapture

use aqi_assistant::api::{router, AppState};
use aqi_assistant::config::AssistantConfig;
use aqi_assistant::llm::{ChatModel, CompletionRequest, LlmError};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use futures::future::BoxFuture;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Records every request and answers with a canned reply, or fails.
struct Scripted {
    reply: Result<String, String>,
    seen: Mutex<Vec<CompletionRequest>>,
}

impl Scripted {
    fn ok(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn last(&self) -> CompletionRequest {
        self.seen.lock().unwrap().last().cloned().expect("no request recorded")
    }
}

impl ChatModel for Scripted {
    fn complete(&self, req: CompletionRequest) -> BoxFuture<'_, Result<String, LlmError>> {
        self.seen.lock().unwrap().push(req);
        let out = self.reply.clone().map_err(|message| LlmError::Status {
            status: 529,
            message,
        });
        Box::pin(async move { out })
    }
}

fn app(llm: Arc<Scripted>) -> Router {
    router(AppState::new(llm, AssistantConfig::default()))
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let req = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => req
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_chat_forwards_message_with_readings() {
    println!("\n=== Test: Chat ===");
    let llm = Scripted::ok("Air is fine, open a window.");
    let app = app(llm.clone());

    let (status, v) = call(
        &app,
        "POST",
        "/chat",
        Some(json!({
            "message": "Should I ventilate?",
            "aqi": 72,
            "temperature": 23.0,
            "humidity": 51.0,
            "pm25": 18.0,
            "gas": 380.0,
            "trend": "decreasing"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {v}");
    assert_eq!(v["response"], "Air is fine, open a window.");
    assert_eq!(v["agent_id"], "airlume-masumi-001");

    let sent = llm.last();
    assert_eq!(sent.user, "Should I ventilate?");
    assert_eq!(sent.max_tokens, 512);
    let system = sent.system.expect("chat sends a system prompt");
    assert!(system.contains("AQI: 72 (Moderate)"), "{system}");
    assert!(system.contains("Trend: decreasing"));
    println!("✓ Chat forwarded with system prompt");
}

#[tokio::test]
async fn test_chat_only_message_required() {
    println!("\n=== Test: Chat Minimal ===");
    let llm = Scripted::ok("ok");
    let app = app(llm.clone());

    let (status, _) = call(&app, "POST", "/chat", Some(json!({ "message": "hi" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(llm.last().system.unwrap().contains("Trend: unknown"));

    let (status, v) = call(&app, "POST", "/chat", Some(json!({ "aqi": 10 }))).await;
    assert!(status.is_client_error(), "got {status}");
    assert!(v["detail"].as_str().unwrap().contains("message"));
    println!("✓ Missing message rejected");
}

#[tokio::test]
async fn test_chat_upstream_failure_is_server_error() {
    println!("\n=== Test: Chat Upstream Failure ===");
    let app = app(Scripted::failing("overloaded"));

    let (status, v) = call(&app, "POST", "/chat", Some(json!({ "message": "hi" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(v["detail"].as_str().unwrap().contains("overloaded"), "{v}");
    println!("✓ Upstream text surfaced: {}", v["detail"]);
}

#[tokio::test]
async fn test_analyze_passes_blob_through() {
    println!("\n=== Test: Analyze ===");
    let llm = Scripted::ok("PM2.5 spikes every evening.");
    let app = app(llm.clone());

    let blob = json!({ "samples": [{ "pm25": 12 }, { "pm25": 64 }], "unit": "ugm3" });
    let (status, v) = call(&app, "POST", "/analyze", Some(blob)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["analysis"], "PM2.5 spikes every evening.");

    let sent = llm.last();
    assert!(sent.system.is_none());
    assert_eq!(sent.max_tokens, 1024);
    assert!(sent.user.contains("\"unit\": \"ugm3\""), "{}", sent.user);
    println!("✓ Blob embedded in analysis prompt");
}

#[tokio::test]
async fn test_analyze_upstream_failure() {
    println!("\n=== Test: Analyze Upstream Failure ===");
    let app = app(Scripted::failing("invalid x-api-key"));

    let (status, v) = call(&app, "POST", "/analyze", Some(json!([1, 2]))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(v["detail"].as_str().unwrap().contains("invalid x-api-key"));
    println!("✓ Analyze failure surfaced");
}

#[tokio::test]
async fn test_discovery_endpoints() {
    println!("\n=== Test: Discovery ===");
    let app = app(Scripted::ok("unused"));

    let (status, v) = call(&app, "GET", "/input_schema", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["required"], json!(["message"]));
    assert_eq!(v["properties"]["aqi"]["type"], "integer");

    let (_, v) = call(&app, "GET", "/availability", None).await;
    assert_eq!(v, json!({ "available": true, "status": "ready" }));

    let (_, v) = call(&app, "GET", "/", None).await;
    assert_eq!(v["status"], "operational");
    assert_eq!(v["service"], "AIRLUME Masumi AI Agent");
    assert_eq!(v["version"], "1.0.0");
    println!("✓ Discovery endpoints static");
}
