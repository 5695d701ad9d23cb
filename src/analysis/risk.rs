//! Multi-sensor risk scoring.
//!
//! Turns one `SensorReading` (and optionally the current weather) into a
//! per-hazard breach status and a list of predictions. Scoring is a pure
//! function: no I/O, no clock, and the only non-determinism is the
//! earthquake probability jitter, which comes from an injected
//! `JitterSource` so tests can pin it.
//!
//! # Composite scores
//! - flood: `daily_rain + flood`
//! - fire:  `fire + 20 (temperature > 35 °C) + 15 (wind > 20 km/h)`
//!
//! Missing weather fields contribute nothing: daily rain counts as 0 and the
//! temperature/wind comparisons evaluate false.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::hazards::HazardThresholds;
use crate::model::{
    Hazard, HazardStatus, Prediction, SensorReading, Severity, StatusReport, Timeframe,
    WeatherSnapshot,
};

// ---------------------------------------------------------------------------
// Scoring constants
// ---------------------------------------------------------------------------

const EARTHQUAKE_EMIT_ABOVE: f64 = 3.0;
const EARTHQUAKE_HIGH_ABOVE: f64 = 5.0;
const EARTHQUAKE_CRITICAL_ABOVE: f64 = 6.0;
const EARTHQUAKE_PROBABILITY_SCALE: f64 = 15.0;
const EARTHQUAKE_PROBABILITY_CAP: f64 = 95.0;
/// Jitter is drawn from [0, JITTER_SPAN).
pub const JITTER_SPAN: f64 = 10.0;

const FLOOD_EMIT_ABOVE: f64 = 60.0;
const FLOOD_HIGH_ABOVE: f64 = 90.0;
const FLOOD_CRITICAL_ABOVE: f64 = 120.0;
const FLOOD_PROBABILITY_SCALE: f64 = 0.8;
const FLOOD_PROBABILITY_CAP: f64 = 90.0;
const FLOOD_CONFIDENT_RAIN_ABOVE: f64 = 30.0;

const FIRE_EMIT_ABOVE: f64 = 70.0;
const FIRE_HIGH_ABOVE: f64 = 85.0;
const FIRE_CRITICAL_ABOVE: f64 = 100.0;
const FIRE_PROBABILITY_SCALE: f64 = 1.1;
const FIRE_PROBABILITY_CAP: f64 = 95.0;
const FIRE_CONFIDENT_SENSOR_ABOVE: f64 = 80.0;
const FIRE_HOT_ABOVE_C: f64 = 35.0;
const FIRE_HOT_BONUS: f64 = 20.0;
const FIRE_WINDY_ABOVE_KMH: f64 = 20.0;
const FIRE_WINDY_BONUS: f64 = 15.0;

/// Highest probability the scorer may report for a hazard.
pub fn probability_cap(hazard: Hazard) -> f64 {
    match hazard {
        Hazard::Earthquake => EARTHQUAKE_PROBABILITY_CAP,
        Hazard::Flood => FLOOD_PROBABILITY_CAP,
        Hazard::Fire => FIRE_PROBABILITY_CAP,
    }
}

// ---------------------------------------------------------------------------
// Jitter
// ---------------------------------------------------------------------------

/// Source of the earthquake probability jitter.
pub trait JitterSource {
    /// A value in [0, 1). Scaled by `JITTER_SPAN` before use.
    fn unit(&mut self) -> f64;
}

/// Jitter drawn from a random number generator.
pub struct RandomJitter<R>(pub R);

impl RandomJitter<StdRng> {
    /// Reproducible jitter for tests and replays.
    pub fn seeded(seed: u64) -> Self {
        RandomJitter(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        RandomJitter(StdRng::from_entropy())
    }
}

impl<R: Rng> JitterSource for RandomJitter<R> {
    fn unit(&mut self) -> f64 {
        self.0.gen_range(0.0..1.0)
    }
}

/// No jitter at all: earthquake probability is exactly `magnitude * 15`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl JitterSource for NoJitter {
    fn unit(&mut self) -> f64 {
        0.0
    }
}

/// A constant jitter fraction. Values outside [0, 1) are clamped when used.
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(pub f64);

impl JitterSource for FixedJitter {
    fn unit(&mut self) -> f64 {
        self.0
    }
}

fn draw_jitter(source: &mut dyn JitterSource) -> f64 {
    let unit = source.unit();
    if unit.is_nan() {
        return 0.0;
    }
    // The upper bound stays exclusive in spirit; 1.0 only shifts the
    // pre-cap value and the cap still holds.
    unit.clamp(0.0, 1.0) * JITTER_SPAN
}

// ---------------------------------------------------------------------------
// Assessment
// ---------------------------------------------------------------------------

/// The scorer's output for one reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub status: StatusReport,
    /// Empty, never absent, when nothing crosses its emission threshold.
    pub predictions: Vec<Prediction>,
}

impl RiskAssessment {
    pub fn prediction(&self, hazard: Hazard) -> Option<&Prediction> {
        self.predictions.iter().find(|p| p.hazard == hazard)
    }

    pub fn is_all_clear(&self) -> bool {
        self.predictions.is_empty() && !self.status.any_alert()
    }
}

/// `ALERT` when `reading[hazard] >= threshold[hazard]`, else `NORMAL`.
pub fn hazard_status(reading: &SensorReading, thresholds: &HazardThresholds) -> StatusReport {
    let status = |hazard: Hazard| {
        if thresholds.is_breach(hazard, reading.get(hazard)) {
            HazardStatus::Alert
        } else {
            HazardStatus::Normal
        }
    };
    StatusReport {
        earthquake: status(Hazard::Earthquake),
        flood: status(Hazard::Flood),
        fire: status(Hazard::Fire),
    }
}

/// Scores a reading. Predictions are ordered earthquake, flood, fire.
pub fn score(
    reading: &SensorReading,
    weather: Option<&WeatherSnapshot>,
    thresholds: &HazardThresholds,
    jitter: &mut dyn JitterSource,
) -> RiskAssessment {
    let predictions = [
        predict_earthquake(reading.earthquake, jitter),
        predict_flood(reading.flood, weather),
        predict_fire(reading.fire, weather),
    ]
    .into_iter()
    .flatten()
    .collect();

    RiskAssessment {
        status: hazard_status(reading, thresholds),
        predictions,
    }
}

/// Scores with the default thresholds and entropy-seeded jitter.
pub fn score_risk(reading: &SensorReading, weather: Option<&WeatherSnapshot>) -> RiskAssessment {
    score(
        reading,
        weather,
        &HazardThresholds::default(),
        &mut RandomJitter::from_entropy(),
    )
}

fn bounded(value: f64, cap: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, cap)
}

// ---------------------------------------------------------------------------
// Per-hazard predictors
// ---------------------------------------------------------------------------

/// Emitted only above magnitude 3.0.
pub fn predict_earthquake(magnitude: f64, jitter: &mut dyn JitterSource) -> Option<Prediction> {
    if !(magnitude > EARTHQUAKE_EMIT_ABOVE) {
        return None;
    }

    let raw = magnitude * EARTHQUAKE_PROBABILITY_SCALE + draw_jitter(jitter);
    // Whole percents only; the jitter already blurs anything finer.
    let probability = bounded(
        raw.min(EARTHQUAKE_PROBABILITY_CAP).round(),
        EARTHQUAKE_PROBABILITY_CAP,
    );

    let severity = if magnitude > EARTHQUAKE_CRITICAL_ABOVE {
        Severity::Critical
    } else if magnitude > EARTHQUAKE_HIGH_ABOVE {
        Severity::High
    } else {
        Severity::Medium
    };

    Some(Prediction {
        hazard: Hazard::Earthquake,
        probability,
        severity,
        timeframe: if magnitude > EARTHQUAKE_CRITICAL_ABOVE {
            Timeframe::OneToSixHours
        } else {
            Timeframe::OneToTwoDays
        },
        confidence: if magnitude > EARTHQUAKE_HIGH_ABOVE { 0.9 } else { 0.7 },
    })
}

/// `daily_rain + flood`, with missing daily rain counted as 0.
pub fn flood_composite(flood: f64, weather: Option<&WeatherSnapshot>) -> f64 {
    daily_rain(weather) + flood
}

fn daily_rain(weather: Option<&WeatherSnapshot>) -> f64 {
    weather.and_then(|w| w.daily_rain).unwrap_or(0.0)
}

/// Emitted only when the composite exceeds 60.
pub fn predict_flood(flood: f64, weather: Option<&WeatherSnapshot>) -> Option<Prediction> {
    let composite = flood_composite(flood, weather);
    if !(composite > FLOOD_EMIT_ABOVE) {
        return None;
    }

    let severity = if composite > FLOOD_CRITICAL_ABOVE {
        Severity::Critical
    } else if composite > FLOOD_HIGH_ABOVE {
        Severity::High
    } else {
        Severity::Medium
    };

    Some(Prediction {
        hazard: Hazard::Flood,
        probability: bounded(composite * FLOOD_PROBABILITY_SCALE, FLOOD_PROBABILITY_CAP),
        severity,
        timeframe: if composite > FLOOD_CRITICAL_ABOVE {
            Timeframe::TwoToFourHours
        } else {
            Timeframe::SixToTwelveHours
        },
        confidence: if daily_rain(weather) > FLOOD_CONFIDENT_RAIN_ABOVE { 0.85 } else { 0.6 },
    })
}

/// `fire + 20 (hot) + 15 (windy)`. Absent temperature or wind adds nothing.
pub fn fire_composite(fire: f64, weather: Option<&WeatherSnapshot>) -> f64 {
    let hot = weather
        .and_then(|w| w.temperature)
        .is_some_and(|t| t > FIRE_HOT_ABOVE_C);
    let windy = weather
        .and_then(|w| w.wind_speed)
        .is_some_and(|v| v > FIRE_WINDY_ABOVE_KMH);

    fire + if hot { FIRE_HOT_BONUS } else { 0.0 } + if windy { FIRE_WINDY_BONUS } else { 0.0 }
}

/// Emitted only when the composite exceeds 70.
pub fn predict_fire(fire: f64, weather: Option<&WeatherSnapshot>) -> Option<Prediction> {
    let composite = fire_composite(fire, weather);
    if !(composite > FIRE_EMIT_ABOVE) {
        return None;
    }

    let severity = if composite > FIRE_CRITICAL_ABOVE {
        Severity::Critical
    } else if composite > FIRE_HIGH_ABOVE {
        Severity::High
    } else {
        Severity::Medium
    };

    Some(Prediction {
        hazard: Hazard::Fire,
        probability: bounded(composite * FIRE_PROBABILITY_SCALE, FIRE_PROBABILITY_CAP),
        severity,
        timeframe: if composite > FIRE_CRITICAL_ABOVE {
            Timeframe::HalfHourToTwoHours
        } else {
            Timeframe::TwoToSixHours
        },
        confidence: if fire > FIRE_CONFIDENT_SENSOR_ABOVE { 0.9 } else { 0.7 },
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
