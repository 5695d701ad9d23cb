//! Message intent classification and sensor-driven urgency escalation.
//!
//! The primary classifier is an external text-completion service behind the
//! `IntentClassifier` trait. When it fails, `KeywordClassifier` answers
//! instead. Either way the result passes through `escalate`, which forces
//! HIGH urgency whenever a sensor is over its threshold. Escalation reads the
//! same `HazardThresholds` as the scorer and the gate.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analysis::urgency::has_sensor_alert;
use crate::hazards::HazardThresholds;
use crate::logging::{self, Component};
use crate::model::SensorReading;

// ---------------------------------------------------------------------------
// Intent types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    EmergencyHelp,
    WeatherCheck,
    PredictionRequest,
    LocationUpdate,
    StatusCheck,
    VoiceCommand,
    FollowupQuestion,
    GeneralChat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

/// Entities the completion service may extract alongside the intent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentEntities {
    pub location: Option<String>,
    pub disaster_type: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    #[serde(rename = "type")]
    pub kind: IntentKind,
    pub confidence: f64,
    pub urgency: Urgency,
    #[serde(default)]
    pub entities: IntentEntities,
}

impl Intent {
    pub fn new(kind: IntentKind, confidence: f64, urgency: Urgency) -> Self {
        Self {
            kind,
            confidence,
            urgency,
            entities: IntentEntities::default(),
        }
    }
}

/// What the classifier gets to see besides the message itself.
#[derive(Debug, Clone)]
pub struct ClassifierContext<'a> {
    pub reading: &'a SensorReading,
    pub is_voice: bool,
    /// Recent "user | bot" exchanges, newest first.
    pub recent_exchanges: &'a [String],
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierError {
    /// The completion service could not be reached or refused the request.
    Unavailable(String),
    /// The service answered with something that is not an intent.
    InvalidResponse(String),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierError::Unavailable(msg) => write!(f, "Classifier unavailable: {}", msg),
            ClassifierError::InvalidResponse(msg) => {
                write!(f, "Invalid classifier response: {}", msg)
            }
        }
    }
}

impl std::error::Error for ClassifierError {}

// ---------------------------------------------------------------------------
// Classifiers
// ---------------------------------------------------------------------------

pub trait IntentClassifier {
    fn classify(
        &self,
        message: &str,
        context: &ClassifierContext<'_>,
    ) -> Result<Intent, ClassifierError>;
}

/// Prompt sent to the completion service. The service must answer with a
/// JSON object accepted by `parse_intent_json`.
pub fn classification_prompt(message: &str, context: &ClassifierContext<'_>) -> String {
    let recent = context
        .recent_exchanges
        .iter()
        .take(2)
        .cloned()
        .collect::<Vec<_>>()
        .join(" | ");
    format!(
        "You are an AI disaster response agent. Analyze this message with full context:\n\n\
         Current Message: \"{}\"\n\
         Voice Input: {}\n\
         Recent Chat: {}\n\
         Sensor Data: Earthquake: {}, Flood: {}%, Fire: {}%\n\n\
         Classify intent as one of: emergency_help, weather_check, prediction_request, \
         location_update, status_check, voice_command, followup_question, general_chat.\n\n\
         Respond with JSON: {{\"type\": \"intent_name\", \"confidence\": 0.9, \
         \"urgency\": \"high/medium/low\", \"entities\": {{\"location\": \"city\", \
         \"disaster_type\": \"flood\", \"action\": \"predict\"}}}}",
        message,
        context.is_voice,
        recent,
        context.reading.earthquake,
        context.reading.flood,
        context.reading.fire
    )
}

/// Parses the completion service's JSON answer. Confidence is clamped
/// into [0, 1].
pub fn parse_intent_json(text: &str) -> Result<Intent, ClassifierError> {
    let mut intent: Intent = serde_json::from_str(text.trim())
        .map_err(|e| ClassifierError::InvalidResponse(e.to_string()))?;
    intent.confidence = if intent.confidence.is_nan() {
        0.0
    } else {
        intent.confidence.clamp(0.0, 1.0)
    };
    Ok(intent)
}

const EMERGENCY_KEYWORDS: [&str; 5] = ["help", "emergency", "sos", "urgent", "danger"];

/// Offline fallback: keyword matching plus the sensor check. Never fails.
pub struct KeywordClassifier {
    thresholds: HazardThresholds,
}

impl KeywordClassifier {
    pub fn new(thresholds: HazardThresholds) -> Self {
        Self { thresholds }
    }

    pub fn classify_message(&self, message: &str, reading: &SensorReading) -> Intent {
        let msg = message.to_lowercase();
        let has_emergency_keyword = EMERGENCY_KEYWORDS.iter().any(|k| msg.contains(k));

        if has_emergency_keyword || has_sensor_alert(reading, &self.thresholds) {
            Intent::new(IntentKind::EmergencyHelp, 0.9, Urgency::High)
        } else if msg.contains("weather") || msg.contains("predict") {
            Intent::new(IntentKind::WeatherCheck, 0.8, Urgency::Medium)
        } else {
            Intent::new(IntentKind::GeneralChat, 0.6, Urgency::Low)
        }
    }
}

impl IntentClassifier for KeywordClassifier {
    fn classify(
        &self,
        message: &str,
        context: &ClassifierContext<'_>,
    ) -> Result<Intent, ClassifierError> {
        Ok(self.classify_message(message, context.reading))
    }
}

// ---------------------------------------------------------------------------
// Escalation
// ---------------------------------------------------------------------------

/// Forces HIGH urgency when any sensor is strictly over its threshold, and
/// turns small talk into an emergency request. Other intents keep their kind.
pub fn escalate(
    mut intent: Intent,
    reading: &SensorReading,
    thresholds: &HazardThresholds,
) -> Intent {
    if has_sensor_alert(reading, thresholds) {
        intent.urgency = Urgency::High;
        if intent.kind == IntentKind::GeneralChat {
            intent.kind = IntentKind::EmergencyHelp;
        }
    }
    intent
}

/// Classifies with the external service, falling back to keywords on
/// failure, then applies escalation.
pub fn classify_with_fallback(
    classifier: &dyn IntentClassifier,
    message: &str,
    context: &ClassifierContext<'_>,
    thresholds: &HazardThresholds,
) -> Intent {
    let intent = match classifier.classify(message, context) {
        Ok(intent) => intent,
        Err(e) => {
            logging::warn(
                Component::Intent,
                None,
                &format!("classifier failed, using keyword fallback: {}", e),
            );
            KeywordClassifier::new(thresholds.clone()).classify_message(message, context.reading)
        }
    };
    escalate(intent, context.reading, thresholds)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn reading(earthquake: f64, flood: f64, fire: f64) -> SensorReading {
        SensorReading::new(earthquake, flood, fire, Utc::now())
    }

    fn context(reading: &SensorReading) -> ClassifierContext<'_> {
        ClassifierContext { reading, is_voice: false, recent_exchanges: &[] }
    }

    struct FixedClassifier(Result<Intent, ClassifierError>);

    impl IntentClassifier for FixedClassifier {
        fn classify(&self, _: &str, _: &ClassifierContext<'_>) -> Result<Intent, ClassifierError> {
            self.0.clone()
        }
    }

    // --- Parsing --------------------------------------------------------------

    #[test]
    fn test_parse_completion_json() {
        let intent = parse_intent_json(
            r#"{"type": "prediction_request", "confidence": 0.92, "urgency": "medium",
                "entities": {"location": "Indore", "disaster_type": "flood",
                             "action": "predict"}}"#,
        )
        .expect("well-formed intent");
        assert_eq!(intent.kind, IntentKind::PredictionRequest);
        assert_eq!(intent.urgency, Urgency::Medium);
        assert_eq!(intent.entities.location.as_deref(), Some("Indore"));
    }

    #[test]
    fn test_parse_without_entities_and_clamps_confidence() {
        let body = r#"{"type": "status_check", "confidence": 1.7, "urgency": "low"}"#;
        let intent = parse_intent_json(body).unwrap();
        assert_eq!(intent.confidence, 1.0);
        assert_eq!(intent.entities, IntentEntities::default());
    }

    #[test]
    fn test_parse_rejects_unknown_intent() {
        let body = r#"{"type": "order_pizza", "confidence": 0.9, "urgency": "low"}"#;
        let result = parse_intent_json(body);
        assert!(matches!(result, Err(ClassifierError::InvalidResponse(_))));
    }

    // --- Keyword fallback -----------------------------------------------------

    #[test]
    fn test_keyword_fallback_buckets() {
        let k = KeywordClassifier::new(HazardThresholds::default());
        let calm = reading(1.0, 10.0, 10.0);
        assert_eq!(k.classify_message("SOS we are trapped", &calm).kind, IntentKind::EmergencyHelp);
        assert_eq!(
            k.classify_message("will it rain? predict please", &calm).kind,
            IntentKind::WeatherCheck
        );
        let chat = k.classify_message("hello there", &calm);
        assert_eq!(chat.kind, IntentKind::GeneralChat);
        assert_eq!(chat.urgency, Urgency::Low);
    }

    #[test]
    fn test_keyword_fallback_respects_sensor_alert() {
        let k = KeywordClassifier::new(HazardThresholds::default());
        let intent = k.classify_message("hello there", &reading(0.0, 0.0, 81.0));
        assert_eq!(intent.kind, IntentKind::EmergencyHelp);
        assert_eq!(intent.urgency, Urgency::High);
    }

    // --- Escalation -----------------------------------------------------------

    #[test]
    fn test_escalation_turns_chat_into_emergency() {
        let t = HazardThresholds::default();
        let chat = Intent::new(IntentKind::GeneralChat, 0.7, Urgency::Low);
        let intent = escalate(chat, &reading(5.5, 0.0, 0.0), &t);
        assert_eq!(intent.kind, IntentKind::EmergencyHelp);
        assert_eq!(intent.urgency, Urgency::High);
    }

    #[test]
    fn test_escalation_keeps_other_kinds() {
        let t = HazardThresholds::default();
        let weather = Intent::new(IntentKind::WeatherCheck, 0.8, Urgency::Low);
        let intent = escalate(weather, &reading(0.0, 71.0, 0.0), &t);
        assert_eq!(intent.kind, IntentKind::WeatherCheck);
        assert_eq!(intent.urgency, Urgency::High);
    }

    #[test]
    fn test_no_escalation_at_exact_threshold() {
        let t = HazardThresholds::default();
        let original = Intent::new(IntentKind::GeneralChat, 0.7, Urgency::Low);
        let intent = escalate(original.clone(), &reading(5.0, 70.0, 80.0), &t);
        assert_eq!(intent, original);
    }

    #[test]
    fn test_escalation_reads_configured_thresholds() {
        let mut t = HazardThresholds::default();
        t.flood.threshold = 40.0;
        let chat = Intent::new(IntentKind::GeneralChat, 0.7, Urgency::Low);
        let intent = escalate(chat, &reading(0.0, 45.0, 0.0), &t);
        assert_eq!(intent.urgency, Urgency::High);
    }

    // --- Fallback wiring ------------------------------------------------------

    #[test]
    fn test_classifier_failure_uses_keywords_then_escalates() {
        let t = HazardThresholds::default();
        let failing = FixedClassifier(Err(ClassifierError::Unavailable("timeout".to_string())));
        let r = reading(1.0, 10.0, 10.0);
        let intent = classify_with_fallback(&failing, "is there danger nearby?", &context(&r), &t);
        assert_eq!(intent.kind, IntentKind::EmergencyHelp);
        assert_eq!(intent.confidence, 0.9);
    }

    #[test]
    fn test_classifier_success_is_escalated() {
        let t = HazardThresholds::default();
        let ok = FixedClassifier(Ok(Intent::new(IntentKind::GeneralChat, 0.95, Urgency::Low)));
        let r = reading(0.0, 0.0, 95.0);
        let intent = classify_with_fallback(&ok, "hi", &context(&r), &t);
        assert_eq!(intent.kind, IntentKind::EmergencyHelp);
        assert_eq!(intent.confidence, 0.95);
    }

    #[test]
    fn test_prompt_includes_sensor_values() {
        let r = reading(4.2, 33.0, 12.0);
        let exchanges = vec!["User: hi | Bot: hello".to_string()];
        let ctx = ClassifierContext { reading: &r, is_voice: true, recent_exchanges: &exchanges };
        let prompt = classification_prompt("what now", &ctx);
        assert!(prompt.contains("Earthquake: 4.2, Flood: 33%, Fire: 12%"));
        assert!(prompt.contains("Voice Input: true"));
        assert!(prompt.contains("User: hi | Bot: hello"));
    }
}
