//! # Brain Module
//!
//! Fast, non-LLM context analysis for Deeja.
//! Classifies each user message BEFORE the model call and picks the
//! generation parameters.
//!
//! ## Components
//! - `language`: Thai / English / mixed detection from script and word runs
//! - `emotion`: bilingual keyword lexicon, nine emotion categories
//! - `context_packet`: output data structures
//! - `router`: main orchestrator (analyze, route, format)
//! - `indicator`: display of the detected context

pub mod context_packet;
pub mod emotion;
pub mod indicator;
pub mod language;
pub mod router;

pub use context_packet::{
    ChatContext, ContextualResponse, ResponseMetadata, ResponseStrategy, RoutingDecision,
    DEFAULT_SESSION_ID,
};
pub use emotion::{Emotion, EmotionContext, EmotionDetector, Intensity};
pub use indicator::{ConfidenceBand, ContextIndicator};
pub use language::{Language, LanguageCharacteristics, LanguageContext, LanguageDetector};
pub use router::ContextRouter;
