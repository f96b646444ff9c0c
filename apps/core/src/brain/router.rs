//! Context Router - Main orchestrator for the Brain module.
//!
//! Runs language and emotion detection on the same text, then derives the
//! generation parameters for the language model:
//! 1. System prompt = language prompt + emotion clause (+ mixed-language hint)
//! 2. Temperature / token budget / strategy overridden by the detected emotion
//!
//! Every call is independent; nothing is remembered between messages.

use chrono::Utc;
use tracing::debug;

use super::context_packet::{
    ChatContext, ContextualResponse, ResponseMetadata, ResponseStrategy, RoutingDecision,
    DEFAULT_SESSION_ID,
};
use super::emotion::{Emotion, EmotionDetector};
use super::language::{Language, LanguageDetector};

const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 1000;

const MIXED_LANGUAGE_HINT: &str = " Feel free to mix Thai and English naturally in your response.";

/// Context router combining both detectors
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextRouter {
    language_detector: LanguageDetector,
    emotion_detector: EmotionDetector,
}

impl ContextRouter {
    pub fn new() -> Self {
        Self {
            language_detector: LanguageDetector::new(),
            emotion_detector: EmotionDetector::new(),
        }
    }

    /// Analyze a message under the default session
    pub fn analyze(&self, text: &str) -> ChatContext {
        self.analyze_with_session(text, DEFAULT_SESSION_ID)
    }

    /// Analyze a message and stamp it with the current time
    pub fn analyze_with_session(&self, text: &str, session_id: &str) -> ChatContext {
        let context = ChatContext {
            language: self.language_detector.detect(text),
            emotion: self.emotion_detector.detect(text),
            timestamp: Utc::now(),
            session_id: session_id.to_string(),
        };
        debug!("Context analyzed: {}", context.summary());
        context
    }

    /// Derive generation parameters from a context
    pub fn route(&self, context: &ChatContext) -> RoutingDecision {
        let language = &context.language;
        let emotion = &context.emotion;

        let mut system_prompt = self.language_detector.system_prompt(language.detected);
        system_prompt.push(' ');
        system_prompt.push_str(
            &self
                .emotion_detector
                .contextual_prompt(emotion.emotion, emotion.intensity),
        );

        let (temperature, max_tokens, response_strategy) = match emotion.emotion {
            Emotion::Curiosity => (0.6, 1500, ResponseStrategy::Educational),
            Emotion::Stress => (0.5, DEFAULT_MAX_TOKENS, ResponseStrategy::Supportive),
            Emotion::Creativity => (0.8, DEFAULT_MAX_TOKENS, ResponseStrategy::Innovative),
            Emotion::Professional => (0.4, DEFAULT_MAX_TOKENS, ResponseStrategy::Professional),
            Emotion::Urgent => (0.5, 800, ResponseStrategy::Direct),
            Emotion::Gratitude | Emotion::Friendly | Emotion::Confused | Emotion::Neutral => (
                DEFAULT_TEMPERATURE,
                DEFAULT_MAX_TOKENS,
                ResponseStrategy::Standard,
            ),
        };

        if language.detected == Language::Mixed {
            system_prompt.push_str(MIXED_LANGUAGE_HINT);
        }

        RoutingDecision {
            system_prompt,
            temperature,
            max_tokens,
            response_strategy,
            context: context.clone(),
        }
    }

    /// Wrap model output with the routing metadata
    pub fn format_contextual_response(
        &self,
        decision: &RoutingDecision,
        ai_response: &str,
    ) -> ContextualResponse {
        let context = &decision.context;
        ContextualResponse {
            response: ai_response.to_string(),
            metadata: ResponseMetadata {
                language: context.language.detected,
                emotion: context.emotion.emotion,
                strategy: decision.response_strategy,
                confidence: context.language.confidence.min(context.emotion.confidence),
            },
        }
    }
}
