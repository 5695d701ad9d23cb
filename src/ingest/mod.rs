/// External data ingestion.
///
/// - `open_meteo`: current weather for the flood and fire composite scores.

pub mod open_meteo;
