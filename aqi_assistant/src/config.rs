use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Settings for the assistant service, read from `config/aqi_assistant.toml`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AssistantConfig {
    pub bind_addr: String,
    pub log_level: String,
    /// Browser origins allowed to call the service.
    pub cors_origins: Vec<String>,
    /// Identifier returned with every chat reply.
    pub agent_id: String,
    /// Name and version reported by `GET /`.
    pub agent_name: String,
    pub agent_version: String,
    /// Who the assistant introduces itself as in the chat system prompt.
    pub persona: String,
    pub llm: LlmConfig,
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_version: String,
    pub chat_max_tokens: u32,
    pub analyze_max_tokens: u32,
    /// Transport timeout for one completion call.
    pub timeout_secs: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            log_level: "info".to_string(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
            agent_id: "airlume-masumi-001".to_string(),
            agent_name: "AIRLUME Masumi AI Agent".to_string(),
            agent_version: "1.0.0".to_string(),
            persona: "Masumi AI, an intelligent air quality monitoring assistant for AIRLUME"
                .to_string(),
            llm: LlmConfig::default(),
            source: None,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            api_version: "2023-06-01".to_string(),
            chat_max_tokens: 512,
            analyze_max_tokens: 1024,
            timeout_secs: 60,
        }
    }
}

impl AssistantConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut cfg: AssistantConfig = toml::from_str(&data)
            .with_context(|| format!("invalid config {}", path.display()))?;
        cfg.source = Some(path.to_path_buf());
        Ok(cfg)
    }

    pub fn load_or_default() -> anyhow::Result<Self> {
        let candidates = [
            PathBuf::from("config").join("aqi_assistant.toml"),
            PathBuf::from("..").join("config").join("aqi_assistant.toml"),
        ];
        for c in &candidates {
            if c.exists() {
                return Self::load(c);
            }
        }
        Ok(Self::default())
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|k| std::env::var(k).ok());
    }

    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = var("BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(port) = var("PORT").and_then(|p| p.parse::<u16>().ok()) {
            let host = self
                .bind_addr
                .rsplit_once(':')
                .map(|(h, _)| h)
                .unwrap_or("0.0.0.0");
            self.bind_addr = format!("{host}:{port}");
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(url) = var("ANTHROPIC_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = var("LLM_MODEL") {
            self.llm.model = model;
        }
    }
}
