use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::AssistantConfig;
use crate::error::ApiError;
use crate::llm::{ChatModel, CompletionRequest};
use crate::prompt;
use crate::types::{AnalyzeResponse, Availability, ChatRequest, ChatResponse, ServiceInfo};

#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn ChatModel>,
    pub cfg: Arc<AssistantConfig>,
}

impl AppState {
    pub fn new(llm: Arc<dyn ChatModel>, cfg: AssistantConfig) -> Self {
        Self {
            llm,
            cfg: Arc::new(cfg),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.cfg.cors_origins);
    Router::new()
        .route("/", get(root))
        .route("/input_schema", get(input_schema))
        .route("/availability", get(availability))
        .route("/chat", post(chat))
        .route("/analyze", post(analyze))
        .with_state(state)
        .layer(cors)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

async fn root(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: state.cfg.agent_name.clone(),
        version: state.cfg.agent_version.clone(),
        status: "operational",
    })
}

/// Schema of the chat request, for agent-discovery tooling.
async fn input_schema() -> Json<Value> {
    Json(json!({
        "type": "object",
        "properties": {
            "message": { "type": "string", "description": "User question about air quality" },
            "aqi": { "type": "integer", "description": "Current Air Quality Index" },
            "temperature": { "type": "number", "description": "Temperature in Celsius" },
            "humidity": { "type": "number", "description": "Relative humidity percentage" },
            "pm25": { "type": "number", "description": "PM2.5 in µg/m³" },
            "gas": { "type": "number", "description": "Gas sensor reading" },
            "trend": { "type": "string", "description": "Air quality trend" }
        },
        "required": ["message"]
    }))
}

async fn availability() -> Json<Availability> {
    Json(Availability {
        available: true,
        status: "ready",
    })
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    tracing::info!(aqi = req.aqi, trend = %req.trend, "chat request");

    let response = state
        .llm
        .complete(CompletionRequest {
            system: Some(prompt::system_prompt(&state.cfg.persona, &req)),
            user: req.message,
            max_tokens: state.cfg.llm.chat_max_tokens,
        })
        .await
        .inspect_err(|e| tracing::error!("chat completion failed: {e}"))?;

    Ok(Json(ChatResponse {
        response,
        agent_id: state.cfg.agent_id.clone(),
    }))
}

/// Free-form analysis of whatever JSON the caller sends.
async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(data) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let analysis = state
        .llm
        .complete(CompletionRequest {
            system: None,
            user: prompt::analysis_prompt(&data),
            max_tokens: state.cfg.llm.analyze_max_tokens,
        })
        .await
        .inspect_err(|e| tracing::error!("analysis completion failed: {e}"))?;

    Ok(Json(AnalyzeResponse { analysis }))
}
