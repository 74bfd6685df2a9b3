//! Runtime configuration for the ingest service.
//!
//! Read from `config/aqi_backend.toml` when present, otherwise built-in
//! defaults. Environment variables override either source.

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    pub bind_addr: String,
    pub log_level: String,
    pub models: ModelPaths,
    /// File the config was read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ModelPaths {
    pub indoor: PathBuf,
    pub outdoor: PathBuf,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            log_level: "info".to_string(),
            models: ModelPaths::default(),
            source: None,
        }
    }
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self {
            indoor: PathBuf::from("models/aqi_model_indoor.json"),
            outdoor: PathBuf::from("models/aqi_model_outdoor.json"),
        }
    }
}

impl BackendConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut cfg: BackendConfig = toml::from_str(&data)
            .with_context(|| format!("invalid config {}", path.display()))?;
        cfg.source = Some(path.to_path_buf());
        Ok(cfg)
    }

    /// First config file found wins; none found means defaults.
    pub fn load_or_default() -> anyhow::Result<Self> {
        let candidates = [
            PathBuf::from("config").join("aqi_backend.toml"),
            PathBuf::from("..").join("config").join("aqi_backend.toml"),
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

    /// `BIND_ADDR` replaces the whole address, `PORT` only the port.
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
        if let Some(p) = var("INDOOR_MODEL_PATH") {
            self.models.indoor = PathBuf::from(p);
        }
        if let Some(p) = var("OUTDOOR_MODEL_PATH") {
            self.models.outdoor = PathBuf::from(p);
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.log_level = level;
        }
    }
}
