//! Context Packet - Data produced by the context router.
//!
//! A `ChatContext` is a per-message snapshot, a `RoutingDecision` is derived
//! from it, and a `ContextualResponse` wraps the model output for display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::emotion::{Emotion, EmotionContext};
use super::language::{Language, LanguageContext};

/// Session identifier used when the caller does not supply one
pub const DEFAULT_SESSION_ID: &str = "default";

/// Response strategy selected for a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStrategy {
    Standard,
    /// Longer, focused explanations
    Educational,
    /// Calm, step-by-step answers
    Supportive,
    /// Higher temperature, idea generation
    Innovative,
    /// Concise and formal
    Professional,
    /// Short, actionable answers
    Direct,
}

impl ResponseStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStrategy::Standard => "standard",
            ResponseStrategy::Educational => "educational",
            ResponseStrategy::Supportive => "supportive",
            ResponseStrategy::Innovative => "innovative",
            ResponseStrategy::Professional => "professional",
            ResponseStrategy::Direct => "direct",
        }
    }
}

impl fmt::Display for ResponseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detected context of a single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContext {
    pub language: LanguageContext,
    pub emotion: EmotionContext,
    /// Time of analysis (serialized as RFC 3339)
    pub timestamp: DateTime<Utc>,
    /// Caller-supplied session identifier, carried through untouched
    pub session_id: String,
}

impl ChatContext {
    /// Get a summary for logging
    pub fn summary(&self) -> String {
        format!(
            "Language: {} ({:.0}%), Emotion: {} ({:.0}%, {:?}), Session: {}",
            self.language.detected,
            self.language.confidence * 100.0,
            self.emotion.emotion,
            self.emotion.confidence * 100.0,
            self.emotion.intensity,
            self.session_id
        )
    }
}

/// Generation parameters derived from a `ChatContext`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingDecision {
    pub system_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub response_strategy: ResponseStrategy,
    /// The context this decision was derived from
    pub context: ChatContext,
}

/// Metadata attached to a displayed response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub language: Language,
    pub emotion: Emotion,
    pub strategy: ResponseStrategy,
    /// min(language confidence, emotion confidence)
    pub confidence: f32,
}

/// Model output combined with its routing metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextualResponse {
    pub response: String,
    pub metadata: ResponseMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::emotion::Intensity;
    use crate::brain::language::LanguageCharacteristics;

    fn sample_context() -> ChatContext {
        ChatContext {
            language: LanguageContext {
                detected: Language::English,
                confidence: 0.95,
                characteristics: LanguageCharacteristics {
                    has_thai_script: false,
                    has_english_text: true,
                    thai_word_count: 0,
                    english_word_count: 3,
                },
            },
            emotion: EmotionContext {
                emotion: Emotion::Gratitude,
                confidence: 0.3,
                indicators: vec!["thank".to_string()],
                intensity: Intensity::Low,
            },
            timestamp: Utc::now(),
            session_id: DEFAULT_SESSION_ID.to_string(),
        }
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(ResponseStrategy::Standard.as_str(), "standard");
        assert_eq!(ResponseStrategy::Educational.as_str(), "educational");
        assert_eq!(ResponseStrategy::Direct.to_string(), "direct");
        assert_eq!(
            serde_json::to_string(&ResponseStrategy::Supportive).unwrap(),
            "\"supportive\""
        );
    }

    #[test]
    fn test_context_wire_format() {
        let json = serde_json::to_value(sample_context()).unwrap();

        assert_eq!(json["sessionId"], "default");
        assert_eq!(json["language"]["detected"], "en");
        assert_eq!(json["language"]["characteristics"]["englishWordCount"], 3);
        assert_eq!(json["emotion"]["emotion"], "🙏 Gratitude");
        assert_eq!(json["emotion"]["intensity"], "low");
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_summary() {
        let summary = sample_context().summary();

        assert!(summary.contains("Language: en"));
        assert!(summary.contains("Gratitude"));
        assert!(summary.contains("Session: default"));
    }
}
