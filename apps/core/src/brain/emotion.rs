//! Emotion Detection using bilingual keyword lexicons.
//!
//! Each category owns a Thai and an English keyword list. A category scores
//! one point per distinct keyword found as a case-insensitive substring;
//! repeated occurrences of the same keyword do not add to the score.
//! Categories are evaluated in declaration order and ties keep the earlier one.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound for keyword-derived confidence
const MAX_CONFIDENCE: f32 = 0.95;

/// Confidence contributed by each matching keyword
const CONFIDENCE_PER_MATCH: f32 = 0.3;

/// Detected emotion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Emotion {
    #[serde(rename = "🙏 Gratitude")]
    Gratitude,
    #[serde(rename = "🧐 Curiosity")]
    Curiosity,
    #[serde(rename = "😮‍💨 Stress")]
    Stress,
    #[serde(rename = "🎨 Creativity")]
    Creativity,
    #[serde(rename = "💼 Professional")]
    Professional,
    #[serde(rename = "😊 Friendly")]
    Friendly,
    #[serde(rename = "🤔 Confused")]
    Confused,
    #[serde(rename = "⚡ Urgent")]
    Urgent,
    #[serde(rename = "🙂 Neutral")]
    Neutral,
}

impl Emotion {
    /// Display label, emoji included
    pub fn label(&self) -> &'static str {
        match self {
            Emotion::Gratitude => "🙏 Gratitude",
            Emotion::Curiosity => "🧐 Curiosity",
            Emotion::Stress => "😮‍💨 Stress",
            Emotion::Creativity => "🎨 Creativity",
            Emotion::Professional => "💼 Professional",
            Emotion::Friendly => "😊 Friendly",
            Emotion::Confused => "🤔 Confused",
            Emotion::Urgent => "⚡ Urgent",
            Emotion::Neutral => "🙂 Neutral",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Emotion intensity, derived from the match score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    Medium,
    High,
}

impl Intensity {
    fn from_score(score: usize) -> Self {
        match score {
            s if s >= 3 => Intensity::High,
            2 => Intensity::Medium,
            _ => Intensity::Low,
        }
    }

    /// Adverb used when phrasing the intensity for the model
    pub fn modifier(&self) -> &'static str {
        match self {
            Intensity::High => "very",
            Intensity::Medium => "somewhat",
            Intensity::Low => "slightly",
        }
    }
}

/// Result of emotion detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionContext {
    pub emotion: Emotion,
    /// Confidence score (0.0 - 0.95)
    pub confidence: f32,
    /// Keywords that matched, in lexicon order
    pub indicators: Vec<String>,
    pub intensity: Intensity,
}

/// Keyword lists for one emotion category
struct EmotionLexicon {
    emotion: Emotion,
    thai: &'static [&'static str],
    english: &'static [&'static str],
}

impl EmotionLexicon {
    fn keywords(&self) -> impl Iterator<Item = &'static str> {
        self.thai.iter().chain(self.english.iter()).copied()
    }
}

// Declaration order is the tie-break order.
static LEXICON: &[EmotionLexicon] = &[
    EmotionLexicon {
        emotion: Emotion::Gratitude,
        thai: &["ขอบคุณ", "ขอบใจ", "สบายใจ", "ดีใจ", "ประทับใจ"],
        english: &["thank", "grateful", "appreciate", "thanks", "much appreciated"],
    },
    EmotionLexicon {
        emotion: Emotion::Curiosity,
        thai: &["ทำไม", "อย่างไร", "เป็นไงบ้าง", "แปลกใจ", "สงสัย", "อยากรู้"],
        english: &["why", "how", "what", "curious", "wonder", "confused", "explain"],
    },
    EmotionLexicon {
        emotion: Emotion::Stress,
        thai: &["เครียด", "วุ่นวาย", "รีบ", "ปวดหัว", "เหนื่อย", "ยาก"],
        english: &["stress", "overwhelmed", "difficult", "hard", "struggle", "tired", "exhausted"],
    },
    EmotionLexicon {
        emotion: Emotion::Creativity,
        thai: &["สร้างสรรค์", "ไอเดีย", "แปลกใหม่", "คิดออกแบบ", "นวัตกรรม"],
        english: &["creative", "design", "innovative", "brainstorm", "idea", "artistic", "imagine"],
    },
    EmotionLexicon {
        emotion: Emotion::Professional,
        thai: &["ธุรกิจ", "ประชุม", "รายงาน", "การงาน", "โปรเจ็กต์"],
        english: &["business", "project", "meeting", "report", "professional", "work", "corporate"],
    },
    EmotionLexicon {
        emotion: Emotion::Friendly,
        thai: &["สวัสดี", "หวัดดี", "ยินดี", "แชร์", "เล่น"],
        english: &["hello", "hi", "nice", "share", "friendly", "chat", "fun"],
    },
    EmotionLexicon {
        emotion: Emotion::Confused,
        thai: &["งง", "สับสน", "ไม่เข้าใจ", "ยาก", "ซับซ้อน"],
        english: &["confused", "unclear", "complicated", "don't understand", "complex"],
    },
    EmotionLexicon {
        emotion: Emotion::Urgent,
        thai: &["ด่วน", "รีบ", "เร่งด่วน", "ตอนนี้", "เร็ว"],
        english: &["urgent", "asap", "quick", "fast", "immediately", "now", "hurry"],
    },
];

/// Keyword-based emotion detector
#[derive(Debug, Clone, Copy, Default)]
pub struct EmotionDetector;

impl EmotionDetector {
    pub fn new() -> Self {
        Self
    }

    /// Detect the dominant emotion of a text
    pub fn detect(&self, text: &str) -> EmotionContext {
        let lower = text.to_lowercase();

        let mut best_emotion = Emotion::Neutral;
        let mut best_score = 0;
        let mut best_indicators: Vec<String> = Vec::new();

        for lexicon in LEXICON {
            let indicators: Vec<String> = lexicon
                .keywords()
                .filter(|keyword| lower.contains(&keyword.to_lowercase()))
                .map(str::to_string)
                .collect();

            if indicators.len() > best_score {
                best_score = indicators.len();
                best_emotion = lexicon.emotion;
                best_indicators = indicators;
            }
        }

        EmotionContext {
            emotion: best_emotion,
            confidence: (best_score as f32 * CONFIDENCE_PER_MATCH).min(MAX_CONFIDENCE),
            indicators: best_indicators,
            intensity: Intensity::from_score(best_score),
        }
    }

    /// Instruction clause for the downstream model, by emotion
    pub fn contextual_prompt(&self, emotion: Emotion, intensity: Intensity) -> String {
        let modifier = intensity.modifier();
        match emotion {
            Emotion::Gratitude => {
                "The user is expressing gratitude. Respond warmly and continue to be helpful.".to_string()
            }
            Emotion::Curiosity => format!(
                "The user is {} curious. Provide detailed explanations and encourage further questions.",
                modifier
            ),
            Emotion::Stress => format!(
                "The user seems {} stressed. Be supportive, offer step-by-step solutions, and maintain a calm tone.",
                modifier
            ),
            Emotion::Creativity => {
                "The user is in creative mode. Be inspiring, suggest innovative ideas, and encourage exploration."
                    .to_string()
            }
            Emotion::Professional => {
                "The user is in professional context. Be concise, factual, and business-appropriate.".to_string()
            }
            Emotion::Friendly => {
                "The user is being friendly. Match their warm tone and be conversational.".to_string()
            }
            Emotion::Confused => format!(
                "The user is {} confused. Break down complex concepts, use simple language, and provide examples.",
                modifier
            ),
            Emotion::Urgent => {
                "The user has an urgent need. Provide quick, actionable solutions and prioritize immediate help."
                    .to_string()
            }
            Emotion::Neutral => "Maintain a helpful and professional tone.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gratitude() {
        let detector = EmotionDetector::new();

        let result = detector.detect("thank you so much");
        assert_eq!(result.emotion, Emotion::Gratitude);
        assert_eq!(result.indicators, vec!["thank".to_string()]);
        assert!((result.confidence - 0.3).abs() < 1e-6);
        assert_eq!(result.intensity, Intensity::Low);
    }

    #[test]
    fn test_higher_score_wins() {
        let detector = EmotionDetector::new();

        let result = detector.detect("ทำไม ทำไม urgent now");
        assert_eq!(result.emotion, Emotion::Urgent);
        assert_eq!(result.indicators, vec!["urgent".to_string(), "now".to_string()]);
        assert!((result.confidence - 0.6).abs() < 1e-6);
        assert_eq!(result.intensity, Intensity::Medium);
    }

    #[test]
    fn test_tie_keeps_first_declared() {
        let detector = EmotionDetector::new();

        // Gratitude and Urgent both score 1
        let result = detector.detect("grateful, asap");
        assert_eq!(result.emotion, Emotion::Gratitude);
    }

    #[test]
    fn test_case_insensitive() {
        let detector = EmotionDetector::new();

        let result = detector.detect("URGENT: need this ASAP");
        assert_eq!(result.emotion, Emotion::Urgent);
        assert_eq!(result.indicators, vec!["urgent".to_string(), "asap".to_string()]);
    }

    #[test]
    fn test_repeated_keyword_counts_once() {
        let detector = EmotionDetector::new();

        let result = detector.detect("stress stress stress");
        assert_eq!(result.emotion, Emotion::Stress);
        assert_eq!(result.indicators.len(), 1);
        assert_eq!(result.intensity, Intensity::Low);
    }

    #[test]
    fn test_high_intensity_caps_confidence() {
        let detector = EmotionDetector::new();

        let result = detector.detect("creative design idea, let's brainstorm something innovative");
        assert_eq!(result.emotion, Emotion::Creativity);
        assert_eq!(result.intensity, Intensity::High);
        assert!(result.confidence <= 0.95);
        assert!((result.confidence - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_neutral() {
        let detector = EmotionDetector::new();

        for text in ["", "ok", "12345"] {
            let result = detector.detect(text);
            assert_eq!(result.emotion, Emotion::Neutral, "Expected Neutral for '{}'", text);
            assert_eq!(result.confidence, 0.0);
            assert!(result.indicators.is_empty());
            assert_eq!(result.intensity, Intensity::Low);
        }
    }

    #[test]
    fn test_contextual_prompt_intensity() {
        let detector = EmotionDetector::new();

        assert!(detector
            .contextual_prompt(Emotion::Curiosity, Intensity::High)
            .contains("very curious"));
        assert!(detector
            .contextual_prompt(Emotion::Stress, Intensity::Medium)
            .contains("somewhat stressed"));
        assert!(detector
            .contextual_prompt(Emotion::Confused, Intensity::Low)
            .contains("slightly confused"));
        assert_eq!(
            detector.contextual_prompt(Emotion::Neutral, Intensity::High),
            "Maintain a helpful and professional tone."
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(Emotion::Gratitude.label(), "🙏 Gratitude");
        assert_eq!(Emotion::Urgent.to_string(), "⚡ Urgent");
        assert_eq!(
            serde_json::to_string(&Emotion::Creativity).unwrap(),
            "\"🎨 Creativity\""
        );
    }
}
