/// Hazard, SensorReading, WeatherSnapshot, Prediction, AlertRecord
/// core data structures and the input-domain error.
///
/// Core data types for the hazard monitoring service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O; the only logic here is domain clamping and checking
/// of raw sensor values, since the declared domains are part of the data
/// model itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Hazard types
// ---------------------------------------------------------------------------

/// One of the three independently monitored disaster signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hazard {
    Earthquake,
    Flood,
    Fire,
}

impl Hazard {
    /// All hazards, in the order the scorer reports them.
    pub const ALL: [Hazard; 3] = [Hazard::Earthquake, Hazard::Flood, Hazard::Fire];

    /// Lowercase identifier used in storage and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Hazard::Earthquake => "earthquake",
            Hazard::Flood => "flood",
            Hazard::Fire => "fire",
        }
    }

    /// Capitalized name used in alert messages.
    pub fn label(&self) -> &'static str {
        match self {
            Hazard::Earthquake => "Earthquake",
            Hazard::Flood => "Flood",
            Hazard::Fire => "Fire",
        }
    }

    /// Upper bound of the sensor domain. Magnitude for earthquakes,
    /// percent for flood level and fire risk.
    pub fn domain_max(&self) -> f64 {
        match self {
            Hazard::Earthquake => 10.0,
            Hazard::Flood | Hazard::Fire => 100.0,
        }
    }

    /// Parses the lowercase identifier. Returns `None` for anything else.
    pub fn parse(s: &str) -> Option<Hazard> {
        match s {
            "earthquake" => Some(Hazard::Earthquake),
            "flood" => Some(Hazard::Flood),
            "fire" => Some(Hazard::Fire),
            _ => None,
        }
    }
}

impl fmt::Display for Hazard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// A snapshot of the three hazard signals at a point in time.
///
/// Readings are immutable values: a new reading replaces the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Magnitude, domain [0, 10].
    pub earthquake: f64,
    /// Water level / saturation percent, domain [0, 100].
    pub flood: f64,
    /// Fire risk percent, domain [0, 100].
    pub fire: f64,
    pub observed_at: DateTime<Utc>,
}

impl SensorReading {
    pub fn new(earthquake: f64, flood: f64, fire: f64, observed_at: DateTime<Utc>) -> Self {
        Self { earthquake, flood, fire, observed_at }
    }

    /// The raw value for one hazard.
    pub fn get(&self, hazard: Hazard) -> f64 {
        match hazard {
            Hazard::Earthquake => self.earthquake,
            Hazard::Flood => self.flood,
            Hazard::Fire => self.fire,
        }
    }

    /// Returns a copy with every value clamped into its declared domain.
    /// NaN collapses to 0.
    pub fn clamped(&self) -> SensorReading {
        SensorReading {
            earthquake: clamp_to_domain(Hazard::Earthquake, self.earthquake),
            flood: clamp_to_domain(Hazard::Flood, self.flood),
            fire: clamp_to_domain(Hazard::Fire, self.fire),
            observed_at: self.observed_at,
        }
    }

    /// Returns the reading unchanged if every value is inside its domain,
    /// otherwise the first offending hazard.
    pub fn checked(self) -> Result<SensorReading, DomainError> {
        for hazard in Hazard::ALL {
            let value = self.get(hazard);
            if !(0.0..=hazard.domain_max()).contains(&value) {
                return Err(DomainError::InvalidInputDomain { hazard, value });
            }
        }
        Ok(self)
    }
}

/// Clamps a raw value into the hazard's domain. NaN maps to 0.
pub fn clamp_to_domain(hazard: Hazard, value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, hazard.domain_max())
}

/// Current weather conditions used to augment the flood and fire scores.
///
/// Every field is optional. A missing field never fails scoring; it only
/// drops the term it would have contributed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Air temperature, °C.
    pub temperature: Option<f64>,
    /// Wind speed, km/h.
    pub wind_speed: Option<f64>,
    /// Rain accumulated over the current day, mm.
    pub daily_rain: Option<f64>,
    /// Rain over the last hour, mm. Display only.
    pub rainfall: Option<f64>,
    pub observed_at: Option<DateTime<Utc>>,
}

/// One day of a temperature forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTemperature {
    /// Provider's local date, e.g. `"2024-05-01"`.
    pub date: String,
    /// Forecast maximum, °C.
    pub max_temperature: f64,
}

// ---------------------------------------------------------------------------
// Classification types
// ---------------------------------------------------------------------------

/// Severity tiers, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }

    pub fn parse(s: &str) -> Option<Severity> {
        match s.to_ascii_uppercase().as_str() {
            "LOW" => Some(Severity::Low),
            "MEDIUM" => Some(Severity::Medium),
            "HIGH" => Some(Severity::High),
            "CRITICAL" => Some(Severity::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Simple per-hazard breach status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HazardStatus {
    Normal,
    Alert,
}

/// Status of all three hazards for one reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub earthquake: HazardStatus,
    pub flood: HazardStatus,
    pub fire: HazardStatus,
}

impl StatusReport {
    pub fn get(&self, hazard: Hazard) -> HazardStatus {
        match hazard {
            Hazard::Earthquake => self.earthquake,
            Hazard::Flood => self.flood,
            Hazard::Fire => self.fire,
        }
    }

    pub fn any_alert(&self) -> bool {
        Hazard::ALL.iter().any(|h| self.get(*h) == HazardStatus::Alert)
    }
}

/// Estimated time until impact, bucketed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1-6 hours")]
    OneToSixHours,
    #[serde(rename = "24-48 hours")]
    OneToTwoDays,
    #[serde(rename = "2-4 hours")]
    TwoToFourHours,
    #[serde(rename = "6-12 hours")]
    SixToTwelveHours,
    #[serde(rename = "30 minutes - 2 hours")]
    HalfHourToTwoHours,
    #[serde(rename = "2-6 hours")]
    TwoToSixHours,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::OneToSixHours => "1-6 hours",
            Timeframe::OneToTwoDays => "24-48 hours",
            Timeframe::TwoToFourHours => "2-4 hours",
            Timeframe::SixToTwelveHours => "6-12 hours",
            Timeframe::HalfHourToTwoHours => "30 minutes - 2 hours",
            Timeframe::TwoToSixHours => "2-6 hours",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A derived, ephemeral hazard prediction. Never persisted by the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "type")]
    pub hazard: Hazard,
    /// Percent, 0–100, capped per hazard.
    pub probability: f64,
    pub severity: Severity,
    pub timeframe: Timeframe,
    /// 0–1.
    pub confidence: f64,
}

// ---------------------------------------------------------------------------
// Alert records
// ---------------------------------------------------------------------------

/// Location attached to alerts raised by the sensor network.
pub const SENSOR_NETWORK_LOCATION: &str = "IoT Sensor Network";

/// An alert the gate has decided to create, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlert {
    pub hazard: Hazard,
    pub severity: Severity,
    pub message: String,
    pub location: String,
}

impl NewAlert {
    /// Builds the standard threshold-breach alert for a sensor value,
    /// e.g. `"Fire threshold breached: 85.0"`.
    pub fn threshold_breach(hazard: Hazard, value: f64, severity: Severity) -> Self {
        Self {
            hazard,
            severity,
            message: format!("{} threshold breached: {:.1}", hazard.label(), value),
            location: SENSOR_NETWORK_LOCATION.to_string(),
        }
    }
}

/// An alert as stored. Approved or declined only by a human operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: i64,
    #[serde(rename = "type")]
    pub hazard: Hazard,
    pub severity: Severity,
    pub message: String,
    pub location: String,
    pub approved: bool,
    pub declined: bool,
    pub created_at: DateTime<Utc>,
}

impl AlertRecord {
    /// Pending means neither approved nor declined yet.
    pub fn is_pending(&self) -> bool {
        !self.approved && !self.declined
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// The only error class of the scoring core. Callers are expected to clamp
/// before scoring; `SensorReading::checked` exists for callers that would
/// rather reject.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    InvalidInputDomain { hazard: Hazard, value: f64 },
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::InvalidInputDomain { hazard, value } => write!(
                f,
                "{} reading {} outside domain [0, {}]",
                hazard,
                value,
                hazard.domain_max()
            ),
        }
    }
}

impl std::error::Error for DomainError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
