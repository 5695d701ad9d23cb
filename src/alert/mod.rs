//! Threshold breach handling.
//!
//! - `gate`: per-hazard alert deduplication state machine.
//! - `ordering`: reading order and weather freshness checks applied before
//!   the gate sees a value.

pub mod gate;
pub mod ordering;
