use serde::{Deserialize, Serialize};

/// `POST /chat`. Only the message is required; readings the client did not
/// send show up as zeros in the prompt.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub aqi: i64,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub humidity: f64,
    #[serde(default)]
    pub pm25: f64,
    #[serde(default)]
    pub gas: f64,
    #[serde(default = "unknown_trend")]
    pub trend: String,
}

fn unknown_trend() -> String {
    "unknown".to_string()
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub agent_id: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub analysis: String,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Availability {
    pub available: bool,
    pub status: &'static str,
}
