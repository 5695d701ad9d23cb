/// Structured logging for the hazard monitoring service
///
/// Provides context-rich logging with component and hazard identifiers,
/// timestamps, and severity levels. Supports both console output
/// and file-based logging for daemon operations.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::model::Hazard;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn parse(s: &str) -> Option<LogLevel> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Scorer,
    Gate,
    Store,
    Weather,
    Intent,
    Monitor,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Scorer => write!(f, "SCORER"),
            Component::Gate => write!(f, "GATE"),
            Component::Store => write!(f, "STORE"),
            Component::Weather => write!(f, "WEATHER"),
            Component::Intent => write!(f, "INTENT"),
            Component::Monitor => write!(f, "MONITOR"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - another writer already holds the pending slot, provider returned nothing
    Expected,
    /// Unexpected failure - indicates service degradation or configuration issue
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut guard) = LOGGER.lock() {
            *guard = Some(logger);
        }
    }

    fn log(&self, level: LogLevel, component: Component, hazard: Option<Hazard>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = format_entry(
            &Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            level,
            component,
            hazard,
            message,
        );
        let hazard_part = hazard.map(|h| format!(" [{}]", h)).unwrap_or_default();

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error => eprintln!("{}", log_entry),
                LogLevel::Warning => eprintln!("   {}", log_entry),
                LogLevel::Info => println!("   {}", log_entry),
                LogLevel::Debug => println!("   [DEBUG] {}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", component, hazard_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", component, hazard_part, message),
                LogLevel::Info => println!("   {}{}: {}", component, hazard_part, message),
                LogLevel::Debug => {} // Skip debug in non-timestamp mode
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

/// One log line: `<timestamp> <LEVEL> <COMPONENT> [hazard]: message`.
fn format_entry(
    timestamp: &str,
    level: LogLevel,
    component: Component,
    hazard: Option<Hazard>,
    message: &str,
) -> String {
    let hazard_part = hazard.map(|h| format!(" [{}]", h)).unwrap_or_default();
    format!("{} {} {}{}: {}", timestamp, level, component, hazard_part, message)
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn emit(level: LogLevel, component: Component, hazard: Option<Hazard>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, component, hazard, message);
        }
    }
}

/// Log a general informational message
pub fn info(component: Component, hazard: Option<Hazard>, message: &str) {
    emit(LogLevel::Info, component, hazard, message);
}

/// Log a warning message
pub fn warn(component: Component, hazard: Option<Hazard>, message: &str) {
    emit(LogLevel::Warning, component, hazard, message);
}

/// Log an error message
pub fn error(component: Component, hazard: Option<Hazard>, message: &str) {
    emit(LogLevel::Error, component, hazard, message);
}

/// Log a debug message
pub fn debug(component: Component, hazard: Option<Hazard>, message: &str) {
    emit(LogLevel::Debug, component, hazard, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify an alert store failure from its rendered message
pub fn classify_store_failure(error_message: &str) -> FailureType {
    if error_message.contains("is not pending") {
        // Operator acted on an alert someone else already resolved
        FailureType::Expected
    } else if error_message.contains("connection") || error_message.contains("Connection") {
        FailureType::Unexpected
    } else if error_message.contains("Query error") {
        FailureType::Unexpected
    } else {
        FailureType::Unknown
    }
}

/// Classify a weather provider failure
pub fn classify_weather_failure(error_message: &str) -> FailureType {
    if error_message.contains("HTTP") || error_message.contains("timeout") {
        FailureType::Unexpected
    } else if error_message.contains("No data") {
        FailureType::Expected
    } else {
        FailureType::Unknown
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

fn log_classified(
    component: Component,
    hazard: Option<Hazard>,
    failure_type: FailureType,
    message: &str,
) {
    match failure_type {
        FailureType::Expected => debug(component, hazard, message),
        FailureType::Unexpected => error(component, hazard, message),
        FailureType::Unknown => warn(component, hazard, message),
    }
}

/// Log an alert store failure with automatic classification
pub fn log_store_failure(hazard: Hazard, operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_store_failure(&error_msg);
    let message = format!("{} failed [{}]: {}", operation, failure_type, error_msg);
    log_classified(Component::Store, Some(hazard), failure_type, &message);
}

/// Log a weather provider failure with classification
pub fn log_weather_failure(operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_weather_failure(&error_msg);
    let message = format!("{} failed [{}]: {}", operation, failure_type, error_msg);
    log_classified(Component::Weather, None, failure_type, &message);
}

// ---------------------------------------------------------------------------
// Run Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of a monitoring run
pub fn log_run_summary(ticks: usize, alerts_created: usize, store_failures: usize) {
    let message = format!(
        "Run complete: {} ticks, {} alerts created, {} store failures",
        ticks, alerts_created, store_failures
    );

    if store_failures == 0 {
        info(Component::Monitor, None, &message);
    } else if store_failures >= ticks {
        error(Component::Monitor, None, &message);
    } else {
        warn(Component::Monitor, None, &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_log_level_parse_accepts_aliases() {
        assert_eq!(LogLevel::parse("WARN"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::parse("warning"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::parse("trace"), None);
    }

    #[test]
    fn test_entry_includes_component_and_hazard_once() {
        let entry = format_entry(
            "2024-05-01 13:00:00 UTC",
            LogLevel::Warning,
            Component::Gate,
            Some(Hazard::Fire),
            "suppressed",
        );
        assert_eq!(entry, "2024-05-01 13:00:00 UTC WARN GATE [fire]: suppressed");
    }

    #[test]
    fn test_entry_without_hazard() {
        let entry = format_entry("t", LogLevel::Info, Component::System, None, "started");
        assert_eq!(entry, "t INFO SYS: started");
    }

    #[test]
    fn test_store_errors_classify_by_variant() {
        use crate::store::StoreError;
        assert_eq!(
            classify_store_failure(&StoreError::NotPending(7).to_string()),
            FailureType::Expected
        );
        assert_eq!(
            classify_store_failure(&StoreError::Connection("refused".to_string()).to_string()),
            FailureType::Unexpected
        );
        assert_eq!(
            classify_store_failure(&StoreError::Query("syntax".to_string()).to_string()),
            FailureType::Unexpected
        );
    }

    #[test]
    fn test_failure_classification() {
        assert_eq!(
            classify_store_failure("Query error: relation \"alerts\" does not exist"),
            FailureType::Unexpected
        );
        assert_eq!(classify_weather_failure("HTTP error: 503"), FailureType::Unexpected);
        assert_eq!(
            classify_weather_failure("No data in provider response"),
            FailureType::Expected
        );
        assert_eq!(classify_weather_failure("something odd"), FailureType::Unknown);
    }
}
