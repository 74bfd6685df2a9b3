//! AQI banding and the pm2.5 trend snapshot.

use serde::Serialize;
use std::fmt;

/// Health category for an AQI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    #[serde(rename = "Good")]
    Good,
    #[serde(rename = "Moderate")]
    Moderate,
    #[serde(rename = "Unhealthy for Sensitive Groups")]
    UnhealthyForSensitiveGroups,
    #[serde(rename = "Unhealthy")]
    Unhealthy,
    #[serde(rename = "Very Unhealthy")]
    VeryUnhealthy,
    #[serde(rename = "Hazardous")]
    Hazardous,
}

impl Category {
    /// Bands are inclusive on their upper bound. Anything at or below 50,
    /// negatives included, is `Good`.
    pub fn from_aqi(aqi: i64) -> Self {
        match aqi {
            i64::MIN..=50 => Category::Good,
            51..=100 => Category::Moderate,
            101..=150 => Category::UnhealthyForSensitiveGroups,
            151..=200 => Category::Unhealthy,
            201..=300 => Category::VeryUnhealthy,
            _ => Category::Hazardous,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Good => "Good",
            Category::Moderate => "Moderate",
            Category::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            Category::Unhealthy => "Unhealthy",
            Category::VeryUnhealthy => "Very Unhealthy",
            Category::Hazardous => "Hazardous",
        }
    }

    /// Display color used by the dashboard.
    pub fn color(self) -> &'static str {
        match self {
            Category::Good => "#10b981",
            Category::Moderate => "#f59e0b",
            Category::UnhealthyForSensitiveGroups => "#ef4444",
            Category::Unhealthy => "#dc2626",
            Category::VeryUnhealthy => "#991b1b",
            Category::Hazardous => "#7f1d1d",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Direction hint derived from the current pm2.5 value alone.
///
/// There is no history behind this: it is a threshold on one reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    pub fn from_pm25(pm25: f64) -> Self {
        if pm25 > 50.0 {
            Trend::Increasing
        } else if pm25 < 20.0 {
            Trend::Decreasing
        } else {
            Trend::Stable
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
        }
    }
}

/// Round a raw estimator output to a display AQI (ties to even).
pub fn round_aqi(raw: f64) -> i64 {
    raw.round_ties_even() as i64
}
