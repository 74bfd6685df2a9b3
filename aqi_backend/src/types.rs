use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::aqi::{Category, Trend};
use crate::error::ApiError;
use crate::features::FeatureVector;
use crate::store::{Location, Reading};

// ---------- Device ingest ----------

/// Body of `POST /api/sensor-data`. Missing fields fall back to the
/// baseline values.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SensorReport {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub pm25: Option<f64>,
    pub gas: Option<f64>,
    pub location: Option<Location>,
    /// Firmware may send this as an integer or a float.
    #[serde(deserialize_with = "device_aqi")]
    pub aqi_calculated: Option<i64>,
    pub voltage: Option<f64>,
}

impl SensorReport {
    /// Overwrite every field of `r`, marking the device connected.
    pub fn apply_to(&self, r: &mut Reading, now: DateTime<Utc>) {
        r.timestamp = now;
        r.temperature = self.temperature.unwrap_or(Reading::BASE_TEMPERATURE);
        r.humidity = self.humidity.unwrap_or(Reading::BASE_HUMIDITY);
        r.pressure = self.pressure.unwrap_or(Reading::BASE_PRESSURE);
        r.pm25 = self.pm25.unwrap_or(Reading::BASE_PM25);
        r.gas = self.gas.unwrap_or(Reading::BASE_GAS);
        r.location = self.location.unwrap_or_default();
        r.aqi_device = self.aqi_calculated.unwrap_or(Reading::BASE_AQI);
        r.voltage = self.voltage.unwrap_or(Reading::BASE_VOLTAGE);
        r.connected = true;
    }
}

/// Any JSON number, truncated toward zero.
fn device_aqi<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    match Option::<f64>::deserialize(d)? {
        Some(v) if !v.is_finite() => Err(de::Error::custom("aqi_calculated must be finite")),
        Some(v) => Ok(Some(v.trunc() as i64)),
        None => Ok(None),
    }
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub aqi: i64,
    pub aqi_ml: Option<i64>,
    pub aqi_device: i64,
    pub timestamp: DateTime<Utc>,
}

// ---------- Client poll ----------

#[derive(Debug, Serialize)]
pub struct LiveResponse {
    pub environment: Environment,
    pub blockchain: ChainStatus,
}

#[derive(Debug, Serialize)]
pub struct Environment {
    pub aqi: i64,
    pub aqi_device: i64,
    pub category: Category,
    pub color: &'static str,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub pm25: f64,
    pub gas: f64,
    pub location: Location,
    pub trend: Trend,
    pub timestamp: DateTime<Utc>,
    pub connected: bool,
    pub voltage: f64,
}

impl From<&Reading> for Environment {
    fn from(r: &Reading) -> Self {
        let category = Category::from_aqi(r.aqi);
        Self {
            aqi: r.aqi,
            aqi_device: r.aqi_device,
            category,
            color: category.color(),
            temperature: r.temperature,
            humidity: r.humidity,
            pressure: r.pressure,
            pm25: r.pm25,
            gas: r.gas,
            location: r.location,
            trend: Trend::from_pm25(r.pm25),
            timestamp: r.timestamp,
            connected: r.connected,
            voltage: r.voltage,
        }
    }
}

/// Placeholder chain metrics for the dashboard panel. Only the network
/// status reflects real state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainStatus {
    pub last_block: &'static str,
    pub tx_count: u64,
    pub network_status: &'static str,
    pub gas_price: &'static str,
}

impl ChainStatus {
    pub fn placeholder(connected: bool) -> Self {
        Self {
            last_block: "0x7a3f2b",
            tx_count: 1247,
            network_status: if connected { "healthy" } else { "offline" },
            gas_price: "0.05",
        }
    }
}

// ---------- Explicit prediction ----------

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub temp_c: f64,
    pub hum_pct: f64,
    pub pm25_ugm3: f64,
    pub mq_raw: f64,
    pub rolling_avg_pm25: Option<f64>,
    pub pm25_change: Option<f64>,
    #[serde(default)]
    pub location: Location,
}

impl PredictRequest {
    pub const REQUIRED: [&'static str; 4] = ["temp_c", "hum_pct", "pm25_ugm3", "mq_raw"];

    /// Parse a raw body, naming every absent required field at once.
    pub fn from_value(body: Value) -> Result<Self, ApiError> {
        let Some(obj) = body.as_object() else {
            return Err(ApiError::BadRequest("request body must be a JSON object".into()));
        };
        let missing: Vec<String> = Self::REQUIRED
            .iter()
            .filter(|f| !obj.contains_key(**f))
            .map(|f| f.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ApiError::MissingFields(missing));
        }
        serde_json::from_value(body).map_err(|e| ApiError::BadRequest(e.to_string()))
    }

    pub fn features(&self) -> FeatureVector {
        FeatureVector::new(
            self.temp_c,
            self.hum_pct,
            self.pm25_ugm3,
            self.mq_raw,
            self.rolling_avg_pm25.unwrap_or(self.pm25_ugm3),
            self.pm25_change.unwrap_or(0.0),
        )
    }
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub predicted_aqi: i64,
    pub raw_prediction: f64,
    pub location: Location,
    pub status: &'static str,
}

// ---------- Health ----------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub models_loaded: bool,
    pub indoor_model: bool,
    pub outdoor_model: bool,
    pub last_update: DateTime<Utc>,
    pub device_connected: bool,
    pub current_aqi: i64,
}
