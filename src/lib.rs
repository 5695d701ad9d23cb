//! Disaster risk monitoring: scores earthquake, flood and fire sensor
//! readings, and turns threshold breaches into deduplicated alert records
//! awaiting operator approval.

pub mod alert;
pub mod analysis;
pub mod config;
pub mod hazards;
pub mod ingest;
pub mod intent;
pub mod logging;
pub mod model;
pub mod monitor;
pub mod simulate;
pub mod store;
