use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// Where the device is mounted; selects which estimator runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    #[default]
    Indoor,
    Outdoor,
}

impl Location {
    pub fn as_str(self) -> &'static str {
        match self {
            Location::Indoor => "indoor",
            Location::Outdoor => "outdoor",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Most recent device reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    /// °C
    pub temperature: f64,
    /// relative humidity, %
    pub humidity: f64,
    /// hPa
    pub pressure: f64,
    /// µg/m³
    pub pm25: f64,
    /// raw gas sensor units
    pub gas: f64,
    /// AQI shown to clients: model result when available, else `aqi_device`
    pub aqi: i64,
    /// AQI computed on the device
    pub aqi_device: i64,
    pub location: Location,
    pub connected: bool,
    pub voltage: f64,
}

impl Reading {
    pub const BASE_TEMPERATURE: f64 = 25.0;
    pub const BASE_HUMIDITY: f64 = 60.0;
    pub const BASE_PRESSURE: f64 = 1013.25;
    pub const BASE_PM25: f64 = 35.0;
    pub const BASE_GAS: f64 = 400.0;
    pub const BASE_AQI: i64 = 50;
    pub const BASE_VOLTAGE: f64 = 0.0;

    /// Values served before the first device report arrives.
    pub fn baseline(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            temperature: Self::BASE_TEMPERATURE,
            humidity: Self::BASE_HUMIDITY,
            pressure: Self::BASE_PRESSURE,
            pm25: Self::BASE_PM25,
            gas: Self::BASE_GAS,
            aqi: Self::BASE_AQI,
            aqi_device: Self::BASE_AQI,
            location: Location::Indoor,
            connected: false,
            voltage: Self::BASE_VOLTAGE,
        }
    }
}

/// Process-wide holder of the latest reading. Cloning shares the record.
///
/// Writers go through [`ReadingStore::update`], which holds the write lock
/// for the whole closure, so one report never interleaves with another.
#[derive(Debug, Clone)]
pub struct ReadingStore {
    inner: Arc<RwLock<Reading>>,
}

impl ReadingStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Reading::baseline(Utc::now()))),
        }
    }

    pub fn snapshot(&self) -> Reading {
        self.inner.read().clone()
    }

    /// Run `f` against the record under a single write acquisition.
    pub fn update<R>(&self, f: impl FnOnce(&mut Reading) -> R) -> R {
        let mut guard = self.inner.write();
        f(&mut guard)
    }
}

impl Default for ReadingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_from_baseline() {
        let store = ReadingStore::new();
        let r = store.snapshot();
        assert_eq!(r.temperature, 25.0);
        assert_eq!(r.humidity, 60.0);
        assert_eq!(r.pressure, 1013.25);
        assert_eq!(r.pm25, 35.0);
        assert_eq!(r.gas, 400.0);
        assert_eq!(r.aqi, 50);
        assert_eq!(r.aqi_device, 50);
        assert_eq!(r.location, Location::Indoor);
        assert!(!r.connected);
    }

    #[test]
    fn clones_share_one_record() {
        let store = ReadingStore::new();
        let handle = store.clone();
        handle.update(|r| {
            r.pm25 = 80.0;
            r.connected = true;
        });
        let r = store.snapshot();
        assert_eq!(r.pm25, 80.0);
        assert!(r.connected);
    }

    #[test]
    fn update_returns_closure_value() {
        let store = ReadingStore::new();
        let aqi = store.update(|r| {
            r.aqi = 140;
            r.aqi
        });
        assert_eq!(aqi, 140);
    }

    #[test]
    fn location_wire_names() {
        assert_eq!(
            serde_json::from_str::<Location>("\"outdoor\"").unwrap(),
            Location::Outdoor
        );
        assert!(serde_json::from_str::<Location>("\"garage\"").is_err());
        assert_eq!(Location::default().to_string(), "indoor");
    }
}
