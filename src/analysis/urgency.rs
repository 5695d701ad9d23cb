//! Sensor-driven urgency: the rainfall flood-risk bucket, the "any sensor
//! over its threshold" check used for escalation, and the overall severity
//! of an SOS request.
//!
//! All comparisons here are strict (`>`), unlike breach status (`>=`).

use serde::{Deserialize, Serialize};

use crate::hazards::HazardThresholds;
use crate::model::{Hazard, SensorReading, Severity};

const RAIN_HIGH_ABOVE_MM: f64 = 50.0;
const RAIN_MEDIUM_ABOVE_MM: f64 = 20.0;

/// Flood risk implied by the day's rainfall alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RainfallRisk {
    Low,
    Medium,
    High,
}

/// Daily rain > 50 mm is HIGH, > 20 mm MEDIUM, anything else (including
/// unknown) LOW.
pub fn rainfall_risk(daily_rain_mm: Option<f64>) -> RainfallRisk {
    match daily_rain_mm {
        Some(mm) if mm > RAIN_HIGH_ABOVE_MM => RainfallRisk::High,
        Some(mm) if mm > RAIN_MEDIUM_ABOVE_MM => RainfallRisk::Medium,
        _ => RainfallRisk::Low,
    }
}

/// Hazards whose reading is strictly above the shared threshold.
pub fn hazards_over_threshold(
    reading: &SensorReading,
    thresholds: &HazardThresholds,
) -> Vec<Hazard> {
    Hazard::ALL
        .into_iter()
        .filter(|h| thresholds.exceeds(*h, reading.get(*h)))
        .collect()
}

/// True when any sensor is strictly above its threshold
/// (earthquake > 5, flood > 70, fire > 80 with the defaults).
pub fn has_sensor_alert(reading: &SensorReading, thresholds: &HazardThresholds) -> bool {
    Hazard::ALL
        .iter()
        .any(|h| thresholds.exceeds(*h, reading.get(*h)))
}

/// Severity attached to an SOS request:
///   any reading above its emergency cutoff  →  CRITICAL
///   any reading above its threshold         →  HIGH
///   rainfall flood risk HIGH                →  MEDIUM
///   otherwise                               →  LOW
pub fn emergency_severity(
    reading: &SensorReading,
    rainfall: RainfallRisk,
    thresholds: &HazardThresholds,
) -> Severity {
    if Hazard::ALL
        .iter()
        .any(|h| thresholds.exceeds_emergency_critical(*h, reading.get(*h)))
    {
        Severity::Critical
    } else if has_sensor_alert(reading, thresholds) {
        Severity::High
    } else if rainfall == RainfallRisk::High {
        Severity::Medium
    } else {
        Severity::Low
    }
}
