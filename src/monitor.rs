//! Polling-loop owner: reading → scorer → gate → store.
//!
//! `Monitor::tick` is called once per sensor reading by whatever drives the
//! schedule (the daemon's sleep loop, or a test). It owns the gate state, so
//! suppression is explicit per-monitor state rather than anything global.
//!
//! Store queries are skipped while the gate already tracks a pending alert
//! for the hazard. The store's conditional insert stays authoritative: if
//! another writer got there first, the gate is marked suppressed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::alert::gate::AlertGate;
use crate::alert::ordering::{fresh_weather, is_out_of_order};
use crate::analysis::risk::{score, JitterSource, RiskAssessment};
use crate::hazards::{gauge_band, GaugeBand, HazardThresholds};
use crate::logging::{self, Component};
use crate::model::{AlertRecord, Hazard, NewAlert, SensorReading, WeatherSnapshot};
use crate::store::{AlertStore, InsertOutcome, StoreError};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What happened to one hazard on one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum HazardOutcome {
    BelowThreshold,
    Created { alert: AlertRecord },
    /// An unapproved alert already covers the breach.
    Suppressed,
    /// The gate asked for an alert but the store already had one pending.
    LostRace,
    /// The store failed; nothing was created this tick.
    StoreFailed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    /// The reading as scored, after clamping.
    pub reading: SensorReading,
    pub assessment: RiskAssessment,
    /// Whether a fresh weather snapshot contributed to scoring.
    pub weather_used: bool,
    /// Display band per hazard, earthquake first.
    pub bands: Vec<(Hazard, GaugeBand)>,
    pub outcomes: Vec<(Hazard, HazardOutcome)>,
}

impl TickReport {
    pub fn outcome(&self, hazard: Hazard) -> Option<&HazardOutcome> {
        self.outcomes.iter().find(|(h, _)| *h == hazard).map(|(_, o)| o)
    }

    pub fn created(&self) -> impl Iterator<Item = &AlertRecord> {
        self.outcomes.iter().filter_map(|(_, o)| match o {
            HazardOutcome::Created { alert } => Some(alert),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonitorStats {
    pub ticks: usize,
    pub rejected: usize,
    pub alerts_created: usize,
    pub store_failures: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MonitorError {
    /// The reading is older than one already processed.
    OutOfOrder {
        last: DateTime<Utc>,
        got: DateTime<Utc>,
    },
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::OutOfOrder { last, got } => write!(
                f,
                "Reading at {} is older than last accepted reading at {}",
                got.to_rfc3339(),
                last.to_rfc3339()
            ),
        }
    }
}

impl std::error::Error for MonitorError {}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

pub struct Monitor<S: AlertStore> {
    thresholds: HazardThresholds,
    gate: AlertGate,
    store: S,
    jitter: Box<dyn JitterSource>,
    max_weather_age_minutes: u64,
    last_observed: Option<DateTime<Utc>>,
    stats: MonitorStats,
}

impl<S: AlertStore> Monitor<S> {
    pub fn new(
        thresholds: HazardThresholds,
        store: S,
        jitter: Box<dyn JitterSource>,
        max_weather_age_minutes: u64,
    ) -> Self {
        Self {
            gate: AlertGate::new(thresholds.clone()),
            thresholds,
            store,
            jitter,
            max_weather_age_minutes,
            last_observed: None,
            stats: MonitorStats::default(),
        }
    }

    pub fn gate(&self) -> &AlertGate {
        &self.gate
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Operator actions (approve/decline) go through here.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    /// Processes one reading to completion.
    pub fn tick(
        &mut self,
        reading: &SensorReading,
        weather: Option<WeatherSnapshot>,
    ) -> Result<TickReport, MonitorError> {
        if is_out_of_order(self.last_observed, reading.observed_at) {
            self.stats.rejected += 1;
            let err = MonitorError::OutOfOrder {
                last: self.last_observed.unwrap_or(reading.observed_at),
                got: reading.observed_at,
            };
            logging::warn(Component::Monitor, None, &err.to_string());
            return Err(err);
        }
        self.last_observed = Some(reading.observed_at);
        self.stats.ticks += 1;

        let reading = reading.clamped();
        let weather = fresh_weather(weather, self.max_weather_age_minutes, reading.observed_at);
        let assessment = score(&reading, weather.as_ref(), &self.thresholds, self.jitter.as_mut());
        logging::debug(
            Component::Scorer,
            None,
            &format!(
                "eq={:.2} flood={:.1} fire={:.1} -> {} prediction(s)",
                reading.earthquake,
                reading.flood,
                reading.fire,
                assessment.predictions.len()
            ),
        );

        let bands = Hazard::ALL
            .into_iter()
            .map(|hazard| (hazard, gauge_band(&self.thresholds, hazard, reading.get(hazard))))
            .collect();

        let outcomes = Hazard::ALL
            .into_iter()
            .map(|hazard| (hazard, self.gate_hazard(hazard, reading.get(hazard))))
            .collect();

        Ok(TickReport {
            reading,
            assessment,
            weather_used: weather.is_some(),
            bands,
            outcomes,
        })
    }

    fn gate_hazard(&mut self, hazard: Hazard, value: f64) -> HazardOutcome {
        let has_pending = if !self.thresholds.is_breach(hazard, value) {
            false
        } else if self.gate.tracks_pending(hazard) {
            true
        } else {
            match self.store.has_pending(hazard) {
                Ok(pending) => pending,
                Err(e) => return self.store_failed(hazard, "pending query", e),
            }
        };

        let decision = self.gate.evaluate(hazard, value, has_pending);
        let severity = match decision.severity {
            Some(severity) if decision.create => severity,
            _ if has_pending => {
                logging::debug(Component::Gate, Some(hazard), "breach covered by pending alert");
                return HazardOutcome::Suppressed;
            }
            _ => return HazardOutcome::BelowThreshold,
        };

        match self.store.insert_pending(NewAlert::threshold_breach(hazard, value, severity)) {
            Ok(InsertOutcome::Created(alert)) => {
                self.stats.alerts_created += 1;
                logging::info(
                    Component::Gate,
                    Some(hazard),
                    &format!("{} alert #{}: {}", alert.severity, alert.id, alert.message),
                );
                HazardOutcome::Created { alert }
            }
            Ok(InsertOutcome::AlreadyPending) => {
                self.gate.mark_suppressed(hazard);
                logging::debug(
                    Component::Store,
                    Some(hazard),
                    "alert already pending from another writer",
                );
                HazardOutcome::LostRace
            }
            Err(e) => {
                // Nothing was written; let the next tick try again.
                self.gate.reset(hazard);
                self.store_failed(hazard, "alert insert", e)
            }
        }
    }

    fn store_failed(&mut self, hazard: Hazard, operation: &str, err: StoreError) -> HazardOutcome {
        self.stats.store_failures += 1;
        logging::log_store_failure(hazard, operation, &err);
        HazardOutcome::StoreFailed { error: err.to_string() }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::gate::GateState;
    use crate::analysis::risk::NoJitter;
    use crate::model::{NewAlert, Severity};
    use crate::store::MemoryAlertStore;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    fn at(secs: i64, earthquake: f64, flood: f64, fire: f64) -> SensorReading {
        SensorReading::new(earthquake, flood, fire, t0() + Duration::seconds(secs))
    }

    fn monitor() -> Monitor<MemoryAlertStore> {
        Monitor::new(HazardThresholds::default(), MemoryAlertStore::new(), Box::new(NoJitter), 60)
    }

    /// A store whose every call fails, as if the database went away.
    struct DownStore;

    impl AlertStore for DownStore {
        fn has_pending(&mut self, _: Hazard) -> Result<bool, StoreError> {
            Err(StoreError::Connection("connection refused".to_string()))
        }
        fn insert_pending(&mut self, _: NewAlert) -> Result<InsertOutcome, StoreError> {
            Err(StoreError::Connection("connection refused".to_string()))
        }
        fn approve(&mut self, id: i64) -> Result<AlertRecord, StoreError> {
            Err(StoreError::NotPending(id))
        }
        fn decline(&mut self, id: i64) -> Result<AlertRecord, StoreError> {
            Err(StoreError::NotPending(id))
        }
        fn pending(&mut self) -> Result<Vec<AlertRecord>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_breach_creates_one_alert_with_severity() {
        let mut m = monitor();
        let report = m.tick(&at(0, 1.0, 20.0, 97.0), None).unwrap();
        match report.outcome(Hazard::Fire) {
            Some(HazardOutcome::Created { alert }) => {
                assert_eq!(alert.severity, Severity::Critical, "97 >= 80 * 1.2");
                assert_eq!(alert.message, "Fire threshold breached: 97.0");
            }
            other => panic!("expected Created, got {:?}", other),
        }
        assert_eq!(report.outcome(Hazard::Flood), Some(&HazardOutcome::BelowThreshold));
        assert_eq!(m.gate().state(Hazard::Fire), GateState::Pending);
        assert_eq!(
            report.bands,
            vec![
                (Hazard::Earthquake, GaugeBand::Normal),
                (Hazard::Flood, GaugeBand::Normal),
                (Hazard::Fire, GaugeBand::Critical),
            ]
        );
    }

    #[test]
    fn test_sustained_breach_is_suppressed() {
        let mut m = monitor();
        m.tick(&at(0, 0.0, 75.0, 0.0), None).unwrap();
        for i in 1..10 {
            let report = m.tick(&at(i * 2, 0.0, 76.0, 0.0), None).unwrap();
            assert_eq!(report.outcome(Hazard::Flood), Some(&HazardOutcome::Suppressed));
        }
        assert_eq!(m.store().all().len(), 1);
        assert_eq!(m.gate().state(Hazard::Flood), GateState::Suppressed);
        assert_eq!(m.stats().alerts_created, 1);
    }

    #[test]
    fn test_recovery_rearms_after_operator_resolves() {
        let mut m = monitor();
        m.tick(&at(0, 5.5, 0.0, 0.0), None).unwrap();
        m.store_mut().approve(1).unwrap();
        m.tick(&at(2, 4.0, 0.0, 0.0), None).unwrap();
        assert_eq!(m.gate().state(Hazard::Earthquake), GateState::Normal);

        let report = m.tick(&at(4, 5.2, 0.0, 0.0), None).unwrap();
        assert!(matches!(report.outcome(Hazard::Earthquake), Some(HazardOutcome::Created { .. })));
        assert_eq!(m.store().all().len(), 2);
    }

    #[test]
    fn test_recovery_with_alert_still_pending_stays_suppressed() {
        let mut m = monitor();
        m.tick(&at(0, 0.0, 0.0, 85.0), None).unwrap();
        m.tick(&at(2, 0.0, 0.0, 50.0), None).unwrap();
        let report = m.tick(&at(4, 0.0, 0.0, 85.0), None).unwrap();
        assert_eq!(
            report.outcome(Hazard::Fire),
            Some(&HazardOutcome::Suppressed),
            "the store still holds the first, unapproved alert"
        );
    }

    #[test]
    fn test_other_writer_pending_alert_suppresses() {
        let mut store = MemoryAlertStore::new();
        store
            .insert_pending(NewAlert::threshold_breach(Hazard::Flood, 72.0, Severity::High))
            .unwrap();
        let mut m = Monitor::new(HazardThresholds::default(), store, Box::new(NoJitter), 60);
        let report = m.tick(&at(0, 0.0, 90.0, 0.0), None).unwrap();
        assert_eq!(report.outcome(Hazard::Flood), Some(&HazardOutcome::Suppressed));
        assert_eq!(m.store().all().len(), 1);
    }

    #[test]
    fn test_out_of_order_reading_is_rejected() {
        let mut m = monitor();
        m.tick(&at(10, 0.0, 0.0, 0.0), None).unwrap();
        let err = m.tick(&at(5, 0.0, 0.0, 0.0), None).expect_err("older reading");
        assert!(matches!(err, MonitorError::OutOfOrder { .. }));
        assert_eq!(m.stats().rejected, 1);
        assert_eq!(m.stats().ticks, 1);
    }

    #[test]
    fn test_out_of_domain_values_are_clamped_before_gating() {
        let mut m = monitor();
        let report = m.tick(&at(0, 42.0, -3.0, f64::NAN), None).unwrap();
        assert_eq!(report.reading.earthquake, 10.0);
        assert_eq!(report.reading.flood, 0.0);
        assert_eq!(report.reading.fire, 0.0);
        match report.outcome(Hazard::Earthquake) {
            Some(HazardOutcome::Created { alert }) => {
                assert_eq!(alert.message, "Earthquake threshold breached: 10.0")
            }
            other => panic!("expected Created, got {:?}", other),
        }
    }

    #[test]
    fn test_stale_weather_is_ignored() {
        let mut m = monitor();
        let reading = at(0, 0.0, 50.0, 0.0);
        let stale = WeatherSnapshot {
            daily_rain: Some(40.0),
            observed_at: Some(reading.observed_at - Duration::minutes(120)),
            ..Default::default()
        };
        let report = m.tick(&reading, Some(stale)).unwrap();
        assert!(!report.weather_used);
        assert!(report.assessment.prediction(Hazard::Flood).is_none());

        let fresh = WeatherSnapshot {
            daily_rain: Some(40.0),
            observed_at: Some(reading.observed_at),
            ..Default::default()
        };
        let report = m.tick(&at(2, 0.0, 50.0, 0.0), Some(fresh)).unwrap();
        assert!(report.weather_used);
        assert!(report.assessment.prediction(Hazard::Flood).is_some());
    }

    #[test]
    fn test_store_outage_reports_failure_and_retries() {
        let mut m = Monitor::new(HazardThresholds::default(), DownStore, Box::new(NoJitter), 60);
        let report = m.tick(&at(0, 0.0, 0.0, 90.0), None).unwrap();
        assert!(matches!(report.outcome(Hazard::Fire), Some(HazardOutcome::StoreFailed { .. })));
        assert_eq!(m.gate().state(Hazard::Fire), GateState::Normal);
        m.tick(&at(2, 0.0, 0.0, 90.0), None).unwrap();
        assert_eq!(m.stats().store_failures, 2);
        assert_eq!(m.stats().alerts_created, 0);
    }
}
