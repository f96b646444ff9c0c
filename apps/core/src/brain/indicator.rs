//! Context indicator shown next to a chat response.

use serde::Serialize;
use std::fmt;

use super::context_packet::ResponseMetadata;
use super::emotion::Emotion;
use super::language::Language;

/// Coarse confidence bucket for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence > 0.7 {
            ConfidenceBand::High
        } else if confidence > 0.4 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }
}

/// Display state of the detected context
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextIndicator {
    pub language: Language,
    pub emotion: Emotion,
    pub confidence: f32,
    pub visible: bool,
}

impl ContextIndicator {
    pub fn new(language: Language, emotion: Emotion, confidence: f32, visible: bool) -> Self {
        Self {
            language,
            emotion,
            confidence,
            visible,
        }
    }

    pub fn from_metadata(metadata: &ResponseMetadata, visible: bool) -> Self {
        Self::new(metadata.language, metadata.emotion, metadata.confidence, visible)
    }

    pub fn language_label(&self) -> &'static str {
        match self.language {
            Language::Thai => "ไทย",
            Language::English => "English",
            Language::Mixed => "Thai-Eng",
            Language::Unknown => "Unknown",
        }
    }

    pub fn confidence_band(&self) -> ConfidenceBand {
        ConfidenceBand::from_confidence(self.confidence)
    }

    pub fn confidence_percent(&self) -> u32 {
        (self.confidence * 100.0).round().max(0.0) as u32
    }

    /// Rendered line, or `None` when hidden
    pub fn render(&self) -> Option<String> {
        self.visible.then(|| self.to_string())
    }
}

impl fmt::Display for ContextIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Context: {} | {} | {}% confidence",
            self.language_label(),
            self.emotion,
            self.confidence_percent()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let indicator = ContextIndicator::new(Language::Mixed, Emotion::Urgent, 0.6, true);

        assert_eq!(
            indicator.render().as_deref(),
            Some("Context: Thai-Eng | ⚡ Urgent | 60% confidence")
        );
        assert_eq!(indicator.confidence_band(), ConfidenceBand::Medium);
    }

    #[test]
    fn test_hidden() {
        let indicator = ContextIndicator::new(Language::Thai, Emotion::Neutral, 0.0, false);
        assert!(indicator.render().is_none());
    }

    #[test]
    fn test_labels_and_bands() {
        assert_eq!(ContextIndicator::new(Language::Thai, Emotion::Neutral, 0.95, true).language_label(), "ไทย");
        assert_eq!(ContextIndicator::new(Language::Unknown, Emotion::Neutral, 0.0, true).language_label(), "Unknown");

        assert_eq!(ConfidenceBand::from_confidence(0.95), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::from_confidence(0.7), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::from_confidence(0.4), ConfidenceBand::Low);
    }
}
