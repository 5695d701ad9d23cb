//! Alert deduplication gate.
//!
//! Decides, per reading and hazard, whether a new alert record should be
//! requested or whether an unapproved alert of the same hazard already
//! covers the breach. Each hazard runs its own three-state machine:
//!
//! ```text
//!   NORMAL ──breach, nothing pending──▶ PENDING ──breach, pending──▶ SUPPRESSED
//!     ▲                                   │                             │
//!     └────────────── value < threshold ──┴─────────────────────────────┘
//! ```
//!
//! PENDING and SUPPRESSED both mean "an unapproved alert exists"; the split
//! only records whether this gate created it on the last tick. The store is
//! authoritative for that fact: `evaluate` always trusts `has_pending`.
//!
//! Precondition: values are already clamped to the hazard's domain. The gate
//! never validates or fails.

use serde::{Deserialize, Serialize};

use crate::hazards::HazardThresholds;
use crate::model::{Hazard, Severity};

/// Per-hazard gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateState {
    /// Value below threshold; the next breach may raise an alert.
    #[default]
    Normal,
    /// This gate just asked for an alert; awaiting operator approval.
    Pending,
    /// Breach persists and an unapproved alert already covers it.
    Suppressed,
}

/// Outcome of one gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateDecision {
    pub create: bool,
    /// HIGH or CRITICAL when `create` is set, otherwise `None`.
    pub severity: Option<Severity>,
}

impl GateDecision {
    fn skip() -> Self {
        Self { create: false, severity: None }
    }

    fn create(severity: Severity) -> Self {
        Self { create: true, severity: Some(severity) }
    }
}

/// Suppression state for all three hazards, owned by whoever runs the
/// polling loop.
#[derive(Debug, Clone)]
pub struct AlertGate {
    thresholds: HazardThresholds,
    states: [GateState; 3],
}

fn slot(hazard: Hazard) -> usize {
    match hazard {
        Hazard::Earthquake => 0,
        Hazard::Flood => 1,
        Hazard::Fire => 2,
    }
}

impl AlertGate {
    pub fn new(thresholds: HazardThresholds) -> Self {
        Self {
            thresholds,
            states: [GateState::Normal; 3],
        }
    }

    pub fn thresholds(&self) -> &HazardThresholds {
        &self.thresholds
    }

    pub fn state(&self, hazard: Hazard) -> GateState {
        self.states[slot(hazard)]
    }

    /// True while this gate believes an unapproved alert covers the hazard.
    /// Callers may skip the store query in that case.
    pub fn tracks_pending(&self, hazard: Hazard) -> bool {
        self.state(hazard) != GateState::Normal
    }

    /// Decides whether to request a new alert.
    ///
    /// - `value < threshold` → reset to NORMAL, no alert.
    /// - breach with a pending alert → SUPPRESSED, no alert.
    /// - breach with nothing pending → PENDING, alert with severity
    ///   CRITICAL when `value >= threshold * multiplier`, else HIGH.
    pub fn evaluate(&mut self, hazard: Hazard, value: f64, has_pending: bool) -> GateDecision {
        let state = &mut self.states[slot(hazard)];

        if !self.thresholds.is_breach(hazard, value) {
            *state = GateState::Normal;
            return GateDecision::skip();
        }

        if has_pending {
            *state = GateState::Suppressed;
            return GateDecision::skip();
        }

        *state = GateState::Pending;
        let severity = if self.thresholds.is_critical(hazard, value) {
            Severity::Critical
        } else {
            Severity::High
        };
        GateDecision::create(severity)
    }

    /// Records that another writer already holds the pending alert, e.g.
    /// after a conditional insert lost the race.
    pub fn mark_suppressed(&mut self, hazard: Hazard) {
        self.states[slot(hazard)] = GateState::Suppressed;
    }

    /// Forgets any suppression for the hazard.
    pub fn reset(&mut self, hazard: Hazard) {
        self.states[slot(hazard)] = GateState::Normal;
    }
}

/// Free-function form of `AlertGate::evaluate`, with the suppression state
/// passed in by the caller.
pub fn evaluate_alert_gate(
    state: &mut AlertGate,
    hazard: Hazard,
    value: f64,
    has_pending: bool,
) -> GateDecision {
    state.evaluate(hazard, value, has_pending)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
