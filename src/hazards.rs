/// Hazard threshold registry for the monitoring service.
///
/// Defines the breach threshold and emergency cutoff for every monitored
/// hazard, plus the multiplier that separates HIGH from CRITICAL alerts.
/// This is the single source of truth for threshold values: the risk
/// scorer, the alert gate, urgency escalation and emergency severity all
/// take a `&HazardThresholds` rather than hardcoding numbers.

use serde::{Deserialize, Serialize};

use crate::model::Hazard;

// ---------------------------------------------------------------------------
// Threshold metadata
// ---------------------------------------------------------------------------

/// Threshold levels for a single hazard, in sensor units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazardLimit {
    /// A reading at or above this value is a breach.
    pub threshold: f64,
    /// A reading strictly above this value makes an SOS context CRITICAL.
    pub emergency_critical: f64,
}

/// Thresholds for all three hazards. Loaded once, never mutated.
///
/// Any hazard or the multiplier may be omitted when deserializing; missing
/// entries take the built-in values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardThresholds {
    pub earthquake: HazardLimit,
    pub flood: HazardLimit,
    pub fire: HazardLimit,
    /// `threshold * critical_multiplier` is the CRITICAL alert level.
    pub critical_multiplier: f64,
}

/// Gauge display bands start at this fraction of the threshold.
pub const WATCH_FRACTION: f64 = 0.8;

fn default_critical_multiplier() -> f64 {
    1.2
}

impl Default for HazardThresholds {
    fn default() -> Self {
        Self {
            earthquake: HazardLimit {
                threshold: 5.0,
                emergency_critical: 6.0,
            },
            flood: HazardLimit {
                threshold: 70.0,
                emergency_critical: 80.0,
            },
            fire: HazardLimit {
                threshold: 80.0,
                emergency_critical: 90.0,
            },
            critical_multiplier: default_critical_multiplier(),
        }
    }
}

impl HazardThresholds {
    pub fn limit(&self, hazard: Hazard) -> &HazardLimit {
        match hazard {
            Hazard::Earthquake => &self.earthquake,
            Hazard::Flood => &self.flood,
            Hazard::Fire => &self.fire,
        }
    }

    pub fn threshold(&self, hazard: Hazard) -> f64 {
        self.limit(hazard).threshold
    }

    /// Level at or above which a breach is CRITICAL rather than HIGH.
    pub fn critical_level(&self, hazard: Hazard) -> f64 {
        self.threshold(hazard) * self.critical_multiplier
    }

    /// `value >= threshold`. Drives per-hazard status and the alert gate.
    pub fn is_breach(&self, hazard: Hazard, value: f64) -> bool {
        value >= self.threshold(hazard)
    }

    /// `value > threshold`. Drives urgency escalation and emergency severity,
    /// which compare strictly.
    pub fn exceeds(&self, hazard: Hazard, value: f64) -> bool {
        value > self.threshold(hazard)
    }

    pub fn is_critical(&self, hazard: Hazard, value: f64) -> bool {
        value >= self.critical_level(hazard)
    }

    pub fn exceeds_emergency_critical(&self, hazard: Hazard, value: f64) -> bool {
        value > self.limit(hazard).emergency_critical
    }

    /// Checks the thresholds are usable: positive, inside the sensor domain,
    /// emergency cutoff not below the threshold, multiplier at least 1.
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.critical_multiplier >= 1.0) {
            return Err(format!(
                "critical_multiplier must be >= 1, got {}",
                self.critical_multiplier
            ));
        }
        for hazard in Hazard::ALL {
            let limit = self.limit(hazard);
            if !(limit.threshold > 0.0 && limit.threshold <= hazard.domain_max()) {
                return Err(format!(
                    "{} threshold {} must be in (0, {}]",
                    hazard,
                    limit.threshold,
                    hazard.domain_max()
                ));
            }
            if !(limit.emergency_critical >= limit.threshold) {
                return Err(format!(
                    "{} emergency_critical {} must not be below threshold {}",
                    hazard, limit.emergency_critical, limit.threshold
                ));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Gauge bands
// ---------------------------------------------------------------------------

/// Display band of a gauge relative to its hazard threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GaugeBand {
    Normal,
    Watch,
    Alert,
    Critical,
}

/// Classifies a reading into its gauge band:
///   value >= threshold * multiplier  →  Critical
///   value >= threshold               →  Alert
///   value >= threshold * 0.8         →  Watch
///   otherwise                        →  Normal
pub fn gauge_band(thresholds: &HazardThresholds, hazard: Hazard, value: f64) -> GaugeBand {
    let threshold = thresholds.threshold(hazard);
    if thresholds.is_critical(hazard, value) {
        GaugeBand::Critical
    } else if value >= threshold {
        GaugeBand::Alert
    } else if value >= threshold * WATCH_FRACTION {
        GaugeBand::Watch
    } else {
        GaugeBand::Normal
    }
}

// ---------------------------------------------------------------------------
// Safety guidance
// ---------------------------------------------------------------------------

/// Short safety guidance shown next to a prediction for this hazard.
pub fn recommendation(hazard: Hazard) -> &'static str {
    match hazard {
        Hazard::Earthquake => "• Stay outdoors, avoid buildings\n• Drop, Cover, Hold if indoors",
        Hazard::Flood => {
            "• Move to higher ground immediately\n• Avoid walking/driving through water"
        }
        Hazard::Fire => "• Evacuate the area\n• Stay low, cover nose/mouth",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
