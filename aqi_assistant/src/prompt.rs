use aqi_backend::Category;
use serde_json::Value;

use crate::types::ChatRequest;

/// System prompt introducing `persona` and carrying the caller's current
/// readings.
pub fn system_prompt(persona: &str, req: &ChatRequest) -> String {
    let category = Category::from_aqi(req.aqi);
    format!(
        "You are {persona}.

Current sensor readings:
- AQI: {aqi} ({category})
- Temperature: {temperature}°C
- Humidity: {humidity}%
- PM2.5: {pm25} µg/m³
- Gas sensor: {gas} ppb
- Trend: {trend}

Help the user with:
- health impacts of the current air quality
- recommendations based on these readings
- what the sensor values mean
- safety guidelines
- where the readings are likely heading

Keep answers concise and focused on actionable advice.",
        persona = persona.trim_end_matches('.'),
        aqi = req.aqi,
        temperature = req.temperature,
        humidity = req.humidity,
        pm25 = req.pm25,
        gas = req.gas,
        trend = req.trend,
    )
}

/// User prompt wrapping an arbitrary data blob for free-form analysis.
pub fn analysis_prompt(data: &Value) -> String {
    let rendered = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
    format!(
        "Analyze this air quality data and provide insights:

{rendered}

Identify:
1. Patterns and trends
2. Likely causes of changes
3. Health recommendations
4. Preventive actions"
    )
}
