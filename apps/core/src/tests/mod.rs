//! Test Module
//!
//! Cross-module test suite for the Deeja core.
//!
//! ## Test Categories
//! - `brain_tests`: Language and emotion detection, routing, indicator
//! - `security_tests`: Rate limiting and security event reporting
//! - `pipeline_tests`: Full chat turns against test doubles
//! - `config_tests`: Environment-driven configuration
