//! Heat wave outlook from a daily maximum temperature forecast.
//!
//! A day at or above 40 °C is a heat wave day (HIGH risk); at or above
//! 45 °C it is a severe heat wave day (EXTREME risk). The safety advice
//! depends only on how many such days the forecast holds.

use serde::{Deserialize, Serialize};

use crate::model::DailyTemperature;

pub const HEAT_WAVE_TEMP_C: f64 = 40.0;
pub const SEVERE_HEAT_WAVE_TEMP_C: f64 = 45.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HeatLevel {
    HeatWave,
    SevereHeatWave,
}

impl HeatLevel {
    pub fn label(&self) -> &'static str {
        match self {
            HeatLevel::HeatWave => "HEAT WAVE",
            HeatLevel::SevereHeatWave => "SEVERE HEAT WAVE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HeatRisk {
    High,
    Extreme,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatWaveDay {
    pub date: String,
    pub temperature: f64,
    pub level: HeatLevel,
    pub risk: HeatRisk,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatWaveOutlook {
    pub days: Vec<HeatWaveDay>,
    /// One line per flagged day, in forecast order.
    pub warnings: Vec<String>,
    pub advice: String,
}

impl HeatWaveOutlook {
    pub fn is_clear(&self) -> bool {
        self.days.is_empty()
    }

    pub fn worst(&self) -> Option<HeatLevel> {
        self.days.iter().map(|d| d.level).max()
    }
}

/// `None` below 40 °C, and for NaN.
pub fn classify_heat(temperature: f64) -> Option<HeatLevel> {
    if temperature >= SEVERE_HEAT_WAVE_TEMP_C {
        Some(HeatLevel::SevereHeatWave)
    } else if temperature >= HEAT_WAVE_TEMP_C {
        Some(HeatLevel::HeatWave)
    } else {
        None
    }
}

/// Advice by number of flagged days: none, one or two, three or more.
pub fn heat_wave_advice(flagged_days: usize) -> &'static str {
    match flagged_days {
        0 => "No heat wave predicted. Stay hydrated and avoid peak sun hours.",
        1..=2 => {
            "Heat wave conditions expected. Stay indoors 12-3 PM, drink water frequently, \
             wear light clothes."
        }
        _ => {
            "SEVERE heat wave conditions! Avoid outdoor activities, stay in AC/cooled areas, \
             drink ORS, watch for heat stroke symptoms."
        }
    }
}

pub fn predict_heat_wave(forecast: &[DailyTemperature]) -> HeatWaveOutlook {
    let mut days = Vec::new();
    let mut warnings = Vec::new();

    for day in forecast {
        let Some(level) = classify_heat(day.max_temperature) else {
            continue;
        };
        let (risk, warning) = match level {
            HeatLevel::SevereHeatWave => (
                HeatRisk::Extreme,
                format!("SEVERE HEAT WAVE WARNING: {:.1}°C on {}", day.max_temperature, day.date),
            ),
            HeatLevel::HeatWave => (
                HeatRisk::High,
                format!("Heat Wave Alert: {:.1}°C on {}", day.max_temperature, day.date),
            ),
        };
        warnings.push(warning);
        days.push(HeatWaveDay {
            date: day.date.clone(),
            temperature: day.max_temperature,
            level,
            risk,
        });
    }

    HeatWaveOutlook {
        advice: heat_wave_advice(days.len()).to_string(),
        days,
        warnings,
    }
}
