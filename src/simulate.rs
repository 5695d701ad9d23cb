/// Development mode sensor simulation
///
/// When no physical sensor network is attached, use this module to produce
/// a plausible stream of readings: a bounded random walk per hazard, with
/// manual nudges for exercising thresholds by hand.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::{clamp_to_domain, Hazard, SensorReading};

/// Full width of one random-walk step per hazard; each step moves a value
/// by up to half of this in either direction.
fn step_span(hazard: Hazard) -> f64 {
    match hazard {
        Hazard::Earthquake => 0.5,
        Hazard::Flood => 5.0,
        Hazard::Fire => 8.0,
    }
}

/// Random-walk sensor simulator
pub struct SensorSimulator {
    current: SensorReading,
    rng: StdRng,
    /// Simulated time between readings (default: 2 seconds)
    pub update_interval: Duration,
}

impl SensorSimulator {
    /// Create a simulator starting from `start`
    ///
    /// # Arguments
    /// * `start` - first reading; clamped into the sensor domains
    /// * `seed` - RNG seed, so runs can be replayed
    pub fn new(start: SensorReading, seed: u64) -> Self {
        Self {
            current: start.clamped(),
            rng: StdRng::seed_from_u64(seed),
            update_interval: Duration::seconds(2),
        }
    }

    /// Quiet starting conditions at `now`
    pub fn calm(now: DateTime<Utc>, seed: u64) -> Self {
        Self::new(SensorReading::new(2.0, 30.0, 20.0, now), seed)
    }

    pub fn current(&self) -> &SensorReading {
        &self.current
    }

    /// Advance one interval and return the new reading
    pub fn step(&mut self) -> SensorReading {
        let mut next = self.current.clone();
        for hazard in Hazard::ALL {
            let delta = (self.rng.gen_range(0.0..1.0) - 0.5) * step_span(hazard);
            set(&mut next, hazard, self.current.get(hazard) + delta);
        }
        next.observed_at = self.current.observed_at + self.update_interval;
        self.current = next.clone();
        next
    }

    /// Manually nudge one sensor, clamped to its domain. Time does not advance.
    pub fn adjust(&mut self, hazard: Hazard, delta: f64) -> SensorReading {
        let value = self.current.get(hazard) + delta;
        set(&mut self.current, hazard, value);
        self.current.clone()
    }
}

fn set(reading: &mut SensorReading, hazard: Hazard, value: f64) {
    let value = clamp_to_domain(hazard, value);
    match hazard {
        Hazard::Earthquake => reading.earthquake = value,
        Hazard::Flood => reading.flood = value,
        Hazard::Fire => reading.fire = value,
    }
}
