//! Deeja core - context routing for a Thai/English chat assistant.
//!
//! The `brain` module classifies each message (language, emotion) and derives
//! the generation parameters. The other modules wire that core to its
//! collaborators: input validation, rate limiting, security event logging and
//! the language-model backend.

pub mod brain;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod security;
pub mod telemetry;
pub mod validation;

pub use brain::{ChatContext, ContextRouter, ContextualResponse, RoutingDecision};
pub use error::AppError;

#[cfg(test)]
mod tests;
