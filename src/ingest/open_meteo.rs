/// Open-Meteo Forecast API Client
///
/// Retrieves current temperature, wind and rainfall for a location from the
/// free Open-Meteo forecast API. Only the first hourly sample and the first
/// daily rain sum are used; that is what the fire and flood composite
/// scores need.
///
/// API Documentation: https://open-meteo.com/en/docs

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use crate::model::{DailyTemperature, WeatherSnapshot};

const OPEN_METEO_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const HOURLY_FIELDS: &str = "temperature_2m,rain,wind_speed_10m";
const DAILY_FIELDS: &str = "rain_sum,temperature_2m_max";

// ============================================================================
// Open-Meteo API Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub hourly: Option<HourlyBlock>,
    pub daily: Option<DailyBlock>,
}

#[derive(Debug, Deserialize)]
pub struct HourlyBlock {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(rename = "temperature_2m", default)]
    pub temperature_c: Vec<Option<f64>>,
    #[serde(rename = "rain", default)]
    pub rain_mm: Vec<Option<f64>>,
    #[serde(rename = "wind_speed_10m", default)]
    pub wind_speed_kmh: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct DailyBlock {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(rename = "rain_sum", default)]
    pub rain_sum_mm: Vec<Option<f64>>,
    #[serde(rename = "temperature_2m_max", default)]
    pub temperature_max_c: Vec<Option<f64>>,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, PartialEq)]
pub enum WeatherError {
    /// Non-2xx HTTP response from the provider.
    HttpError(u16),
    /// The request never produced a response (DNS, TLS, timeout).
    RequestFailed(String),
    /// The response body could not be deserialized.
    ParseError(String),
    /// The response parsed but carried no usable samples.
    NoDataAvailable,
}

impl fmt::Display for WeatherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeatherError::HttpError(code) => write!(f, "HTTP error: {}", code),
            WeatherError::RequestFailed(msg) => write!(f, "Request failed: {}", msg),
            WeatherError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            WeatherError::NoDataAvailable => write!(f, "No data in provider response"),
        }
    }
}

impl std::error::Error for WeatherError {}

// ============================================================================
// Weather source seam
// ============================================================================

/// Anything that can report conditions for a coordinate.
pub trait WeatherSource {
    fn current(&self, latitude: f64, longitude: f64) -> Result<WeatherSnapshot, WeatherError>;

    /// Forecast daily maxima, earliest day first.
    fn daily_max_temperatures(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<DailyTemperature>, WeatherError>;
}

// ============================================================================
// URL construction and parsing
// ============================================================================

/// Builds the forecast URL for one coordinate.
pub fn build_forecast_url(latitude: f64, longitude: f64) -> String {
    format!(
        "{}?latitude={}&longitude={}&hourly={}&daily={}&timezone=auto",
        OPEN_METEO_BASE_URL, latitude, longitude, HOURLY_FIELDS, DAILY_FIELDS
    )
}

fn first(values: &[Option<f64>]) -> Option<f64> {
    values.first().copied().flatten()
}

/// Parses a forecast response body into a snapshot stamped `fetched_at`.
pub fn parse_forecast_response(
    body: &str,
    fetched_at: DateTime<Utc>,
) -> Result<WeatherSnapshot, WeatherError> {
    let response: ForecastResponse =
        serde_json::from_str(body).map_err(|e| WeatherError::ParseError(e.to_string()))?;
    snapshot_from_response(&response, fetched_at)
}

/// Takes the first hourly sample and first daily rain sum.
///
/// Individual nulls become `None` fields. A response with no samples at all
/// is `NoDataAvailable`.
pub fn snapshot_from_response(
    response: &ForecastResponse,
    fetched_at: DateTime<Utc>,
) -> Result<WeatherSnapshot, WeatherError> {
    let (temperature, rainfall, wind_speed) = match &response.hourly {
        Some(h) => (first(&h.temperature_c), first(&h.rain_mm), first(&h.wind_speed_kmh)),
        None => (None, None, None),
    };
    let daily_rain = response.daily.as_ref().and_then(|d| first(&d.rain_sum_mm));

    if temperature.is_none()
        && rainfall.is_none()
        && wind_speed.is_none()
        && daily_rain.is_none()
    {
        return Err(WeatherError::NoDataAvailable);
    }

    Ok(WeatherSnapshot {
        temperature,
        wind_speed,
        daily_rain,
        rainfall,
        observed_at: Some(fetched_at),
    })
}

/// Pairs each daily date with its maximum temperature. Days whose maximum
/// is null are skipped.
pub fn daily_max_temperatures(response: &ForecastResponse) -> Vec<DailyTemperature> {
    let Some(daily) = &response.daily else {
        return Vec::new();
    };
    daily
        .time
        .iter()
        .zip(&daily.temperature_max_c)
        .filter_map(|(date, max)| {
            max.map(|max_temperature| DailyTemperature {
                date: date.clone(),
                max_temperature,
            })
        })
        .collect()
}

// ============================================================================
// API Client
// ============================================================================

pub struct OpenMeteoClient {
    client: reqwest::blocking::Client,
}

impl OpenMeteoClient {
    pub fn new() -> Result<Self, WeatherError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| WeatherError::RequestFailed(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }

    fn fetch(&self, latitude: f64, longitude: f64) -> Result<ForecastResponse, WeatherError> {
        let url = build_forecast_url(latitude, longitude);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .map_err(|e| WeatherError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(WeatherError::HttpError(response.status().as_u16()));
        }

        response
            .json::<ForecastResponse>()
            .map_err(|e| WeatherError::ParseError(e.to_string()))
    }
}

impl WeatherSource for OpenMeteoClient {
    fn current(&self, latitude: f64, longitude: f64) -> Result<WeatherSnapshot, WeatherError> {
        let forecast = self.fetch(latitude, longitude)?;
        snapshot_from_response(&forecast, Utc::now())
    }

    fn daily_max_temperatures(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<DailyTemperature>, WeatherError> {
        let days = daily_max_temperatures(&self.fetch(latitude, longitude)?);
        if days.is_empty() {
            return Err(WeatherError::NoDataAvailable);
        }
        Ok(days)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fetched() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    const SAMPLE: &str = r#"{
        "latitude": 22.75,
        "longitude": 75.875,
        "timezone": "Asia/Kolkata",
        "hourly": {
            "time": ["2024-05-01T00:00", "2024-05-01T01:00"],
            "temperature_2m": [36.4, 35.9],
            "rain": [1.2, 0.0],
            "wind_speed_10m": [22.3, 18.0]
        },
        "daily": {
            "time": ["2024-05-01"],
            "rain_sum": [42.0],
            "temperature_2m_max": [41.2]
        }
    }"#;

    #[test]
    fn test_url_contains_coordinates_and_fields() {
        let url = build_forecast_url(22.7196, 75.8577);
        assert!(url.starts_with("https://api.open-meteo.com/v1/forecast?"));
        assert!(url.contains("latitude=22.7196"));
        assert!(url.contains("longitude=75.8577"));
        assert!(url.contains("wind_speed_10m"));
        assert!(url.contains("daily=rain_sum"));
    }

    #[test]
    fn test_parse_takes_first_samples() {
        let snapshot = parse_forecast_response(SAMPLE, fetched()).expect("sample should parse");
        assert_eq!(snapshot.temperature, Some(36.4));
        assert_eq!(snapshot.wind_speed, Some(22.3));
        assert_eq!(snapshot.rainfall, Some(1.2));
        assert_eq!(snapshot.daily_rain, Some(42.0));
        assert_eq!(snapshot.observed_at, Some(fetched()));
    }

    #[test]
    fn test_nulls_become_missing_fields() {
        let body = r#"{
            "hourly": {
                "time": ["t"],
                "temperature_2m": [null],
                "rain": [0.4],
                "wind_speed_10m": [null]
            },
            "daily": {"time": ["d"], "rain_sum": [null]}
        }"#;
        let snapshot = parse_forecast_response(body, fetched()).unwrap();
        assert_eq!(snapshot.temperature, None);
        assert_eq!(snapshot.wind_speed, None);
        assert_eq!(snapshot.daily_rain, None);
        assert_eq!(snapshot.rainfall, Some(0.4));
    }

    #[test]
    fn test_client_path_decodes_struct_then_snapshots() {
        let response: ForecastResponse = serde_json::from_str(SAMPLE).unwrap();
        let snapshot = snapshot_from_response(&response, fetched()).unwrap();
        assert_eq!(snapshot, parse_forecast_response(SAMPLE, fetched()).unwrap());
    }

    #[test]
    fn test_daily_maxima_pair_with_dates() {
        let body = r#"{"daily": {
            "time": ["2024-05-01", "2024-05-02", "2024-05-03"],
            "rain_sum": [0.0, 0.0, 0.0],
            "temperature_2m_max": [41.2, null, 45.3]
        }}"#;
        let response: ForecastResponse = serde_json::from_str(body).unwrap();
        let days = daily_max_temperatures(&response);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, "2024-05-01");
        assert_eq!(days[0].max_temperature, 41.2);
        assert_eq!(days[1].date, "2024-05-03");

        let outlook = crate::analysis::heat::predict_heat_wave(&days);
        assert_eq!(outlook.days.len(), 2);
    }

    #[test]
    fn test_no_daily_block_yields_no_maxima() {
        let body = r#"{"hourly": {"time": []}}"#;
        let response: ForecastResponse = serde_json::from_str(body).unwrap();
        assert!(daily_max_temperatures(&response).is_empty());
    }

    #[test]
    fn test_missing_blocks_is_no_data() {
        let result = parse_forecast_response(r#"{"latitude": 1.0}"#, fetched());
        assert_eq!(result, Err(WeatherError::NoDataAvailable));
    }

    #[test]
    fn test_empty_arrays_is_no_data() {
        let body = r#"{"hourly": {"time": []}, "daily": {"time": [], "rain_sum": []}}"#;
        assert_eq!(parse_forecast_response(body, fetched()), Err(WeatherError::NoDataAvailable));
    }

    #[test]
    fn test_malformed_body_is_parse_error() {
        let result = parse_forecast_response("<html>rate limited</html>", fetched());
        assert!(matches!(result, Err(WeatherError::ParseError(_))));
    }

    #[test]
    fn test_error_messages_classify_for_logging() {
        use crate::logging::{classify_weather_failure, FailureType};
        assert_eq!(
            classify_weather_failure(&WeatherError::HttpError(503).to_string()),
            FailureType::Unexpected
        );
        assert_eq!(
            classify_weather_failure(&WeatherError::NoDataAvailable.to_string()),
            FailureType::Expected
        );
    }

    #[test]
    #[ignore] // Depends on the live Open-Meteo API
    fn live_forecast_for_default_location() {
        let client = OpenMeteoClient::new().expect("client should build");
        let snapshot = client.current(22.7196, 75.8577).expect("live API should respond");
        assert!(snapshot.temperature.is_some() || snapshot.daily_rain.is_some());
    }
}
