use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::aqi::{round_aqi, Trend};
use crate::error::ApiError;
use crate::features::FeatureVector;
use crate::model::Models;
use crate::store::{Location, ReadingStore};
use crate::types::{
    ChainStatus, Environment, HealthResponse, IngestResponse, LiveResponse, PredictRequest,
    PredictResponse, SensorReport,
};

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    pub store: ReadingStore,
    pub models: Arc<Models>,
}

impl AppState {
    pub fn new(store: ReadingStore, models: Models) -> Self {
        Self {
            store,
            models: Arc::new(models),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/sensor-data", post(ingest))
        .route("/api/live", get(live))
        .route("/api/predict", post(predict))
        .route("/api/health", get(health))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

// ---------- Handlers ----------

/// Device push: overwrite the latest reading and resolve its AQI.
async fn ingest(
    State(state): State<AppState>,
    payload: Result<Json<SensorReport>, JsonRejection>,
) -> Result<Json<IngestResponse>, ApiError> {
    let Json(report) = payload.map_err(|e| {
        tracing::warn!("rejected device report: {}", e.body_text());
        ApiError::BadRequest(e.body_text())
    })?;

    // One write scope covers the overwrite, the inference and the resolve.
    // A failed inference leaves the new fields in place with the old AQI.
    let out = state.store.update(|reading| -> Result<IngestResponse, ApiError> {
        report.apply_to(reading, Utc::now());

        let aqi_ml = match state.models.for_location(reading.location) {
            Some(est) => {
                let raw = est
                    .predict(&FeatureVector::from_reading(reading))
                    .map_err(|e| ApiError::BadRequest(format!("prediction failed: {e}")))?;
                Some(round_aqi(raw))
            }
            None => None,
        };
        reading.aqi = aqi_ml.unwrap_or(reading.aqi_device);

        tracing::info!(
            temperature = reading.temperature,
            humidity = reading.humidity,
            pressure = reading.pressure,
            pm25 = reading.pm25,
            gas = reading.gas,
            location = %reading.location,
            aqi_device = reading.aqi_device,
            aqi_ml = ?aqi_ml,
            aqi = reading.aqi,
            trend = Trend::from_pm25(reading.pm25).as_str(),
            "device report applied"
        );

        Ok(IngestResponse {
            status: "success",
            message: "Data received and processed",
            aqi: reading.aqi,
            aqi_ml,
            aqi_device: reading.aqi_device,
            timestamp: reading.timestamp,
        })
    });

    out.map(Json).inspect_err(|e| tracing::warn!("device report failed: {e}"))
}

/// Client poll: snapshot plus derived category and trend.
async fn live(State(state): State<AppState>) -> Json<LiveResponse> {
    let reading = state.store.snapshot();
    Json(LiveResponse {
        environment: Environment::from(&reading),
        blockchain: ChainStatus::placeholder(reading.connected),
    })
}

/// Stateless inference on an explicit feature payload.
async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    if !state.models.any_loaded() {
        return Err(ApiError::ModelsUnavailable);
    }

    let Json(body) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let req = PredictRequest::from_value(body)?;

    let est = state
        .models
        .for_location(req.location)
        .ok_or(ApiError::EstimatorUnavailable(req.location))?;
    let raw = est.predict(&req.features())?;

    tracing::debug!(location = %req.location, raw, "explicit prediction");

    Ok(Json(PredictResponse {
        predicted_aqi: round_aqi(raw),
        raw_prediction: raw,
        location: req.location,
        status: "success",
    }))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let reading = state.store.snapshot();
    Json(HealthResponse {
        status: "running",
        models_loaded: state.models.all_loaded(),
        indoor_model: state.models.is_loaded(Location::Indoor),
        outdoor_model: state.models.is_loaded(Location::Outdoor),
        last_update: reading.timestamp,
        device_connected: reading.connected,
        current_aqi: reading.aqi,
    })
}
