/// Risk analysis for the hazard monitoring service.
///
/// Submodules:
/// - `heat`: heat wave outlook from a daily maximum temperature forecast.
/// - `risk`: per-hazard status and predictions from a sensor reading.
/// - `urgency`: rainfall risk, strict over-threshold checks, and SOS severity.

pub mod heat;
pub mod risk;
pub mod urgency;
