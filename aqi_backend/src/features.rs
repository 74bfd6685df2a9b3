use crate::store::Reading;

/// Width of the estimator input.
pub const FEATURE_COUNT: usize = 7;

/// Column order the estimators were trained on.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "temp_c",
    "hum_pct",
    "pm25_ugm3",
    "mq_raw",
    "rolling_avg_pm25",
    "pm25_change",
    "temp_x_hum",
];

/// Ordered estimator input: temperature, humidity, pm2.5, gas,
/// rolling pm2.5 average, pm2.5 delta, temperature × humidity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(
        temperature: f64,
        humidity: f64,
        pm25: f64,
        gas: f64,
        rolling_avg_pm25: f64,
        pm25_change: f64,
    ) -> Self {
        Self([
            temperature,
            humidity,
            pm25,
            gas,
            rolling_avg_pm25,
            pm25_change,
            temperature * humidity,
        ])
    }

    /// A stored reading carries no history, so the rolling average is the
    /// current pm2.5 and the delta is zero.
    pub fn from_reading(r: &Reading) -> Self {
        Self::new(r.temperature, r.humidity, r.pm25, r.gas, r.pm25, 0.0)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}
