//! Language Detection for Thai/English routing.
//!
//! Script and word-run heuristics only, no model involved.
//! Thai words are maximal runs of Thai script, English words are
//! ASCII letter runs bounded by ASCII word boundaries.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Persona preamble shared by every language prompt
const PERSONA_PREAMBLE: &str =
    "You are Deeja, a helpful AI assistant that specializes in Thai culture and AGI technology.";

/// Confidence reported for mixed Thai/English input
const MIXED_CONFIDENCE: f32 = 0.9;

/// Upper bound for ratio-based confidences
const MAX_CONFIDENCE: f32 = 0.95;

// NOTE: expect() is acceptable for literal patterns compiled once at startup
static THAI_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x{0E00}-\x{0E7F}]+").expect("Invalid regex: Thai word run"));

// Candidate ASCII words; a candidate only counts when it is letters only,
// which reproduces `\b[A-Za-z]+\b` with ASCII word boundaries.
static ASCII_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9_]+").expect("Invalid regex: ASCII word run"));

/// Detected language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "th")]
    Thai,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "mixed")]
    Mixed,
    #[serde(rename = "unknown")]
    Unknown,
}

impl Language {
    /// Returns the language code
    pub fn code(&self) -> &'static str {
        match self {
            Language::Thai => "th",
            Language::English => "en",
            Language::Mixed => "mixed",
            Language::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Raw counts behind a language decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageCharacteristics {
    pub has_thai_script: bool,
    pub has_english_text: bool,
    pub thai_word_count: usize,
    pub english_word_count: usize,
}

/// Result of language detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageContext {
    /// Detected language
    pub detected: Language,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
    pub characteristics: LanguageCharacteristics,
}

/// Thai/English language detector
#[derive(Debug, Clone, Copy, Default)]
pub struct LanguageDetector;

impl LanguageDetector {
    pub fn new() -> Self {
        Self
    }

    /// Detect the language of a text. Total over all inputs, including "".
    pub fn detect(&self, text: &str) -> LanguageContext {
        let has_thai_script = text.chars().any(is_thai_char);
        let thai_word_count = THAI_WORD.find_iter(text).count();
        let english_word_count = ASCII_WORD
            .find_iter(text)
            .filter(|m| m.as_str().bytes().all(|b| b.is_ascii_alphabetic()))
            .count();
        let total_words = thai_word_count + english_word_count;

        let (detected, confidence) = if total_words == 0 {
            (Language::Unknown, 0.0)
        } else if has_thai_script && english_word_count > 0 {
            (Language::Mixed, MIXED_CONFIDENCE)
        } else if thai_word_count > english_word_count {
            (
                Language::Thai,
                ratio(thai_word_count, total_words).min(MAX_CONFIDENCE),
            )
        } else if english_word_count > 0 {
            (
                Language::English,
                ratio(english_word_count, total_words).min(MAX_CONFIDENCE),
            )
        } else {
            (Language::Unknown, 0.0)
        };

        LanguageContext {
            detected,
            confidence,
            characteristics: LanguageCharacteristics {
                has_thai_script,
                has_english_text: english_word_count > 0,
                thai_word_count,
                english_word_count,
            },
        }
    }

    /// Base system prompt for the downstream model, by language
    pub fn system_prompt(&self, language: Language) -> String {
        let instruction = match language {
            Language::Thai => {
                "Always respond in Thai language. Be polite and use appropriate Thai honorifics. \
                 เป็นผู้ช่วยที่เข้าใจวัฒนธรรมไทยและใช้ภาษาไทยที่สุภาพเหมาะสม"
            }
            Language::English => {
                "Always respond in English. Be helpful, direct, and professional while maintaining friendliness."
            }
            Language::Mixed => {
                "The user is using mixed Thai-English. Mirror their language mixing style in your response. \
                 Use Thai for cultural concepts and English for technical terms when appropriate."
            }
            Language::Unknown => {
                "Detect the user's preferred language and respond accordingly. Default to English if unclear."
            }
        };
        format!("{} {}", PERSONA_PREAMBLE, instruction)
    }
}

fn is_thai_char(c: char) -> bool {
    ('\u{0E00}'..='\u{0E7F}').contains(&c)
}

fn ratio(part: usize, total: usize) -> f32 {
    part as f32 / total as f32
}
