//! # Security Module
//!
//! Collaborators guarding the chat flow:
//! - `rate_limiter`: sliding-window limiter (in-process) and the shared trait
//! - `remote`: client for the hosted rate-limiter service, fail-open
//! - `monitor`: best-effort security event logging

pub mod monitor;
pub mod rate_limiter;
pub mod remote;

pub use monitor::{
    NoopSecurityMonitor, SecurityEvent, SecurityEventSink, SecurityEventType, SecurityMonitor,
    Severity,
};
pub use rate_limiter::{
    LocalRateLimiter, RateLimitDecision, RateLimitPolicy, RateLimitService, RateLimiter,
};
pub use remote::RemoteRateLimiter;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder};
use tracing::warn;
use url::Url;

/// POST request to an edge function, with the service key attached when set.
pub(crate) fn service_request(client: &Client, endpoint: &Url, api_key: Option<&str>) -> RequestBuilder {
    let mut headers = HeaderMap::new();
    if let Some(key) = api_key {
        match (
            HeaderValue::from_str(&format!("Bearer {}", key)),
            HeaderValue::from_str(key),
        ) {
            (Ok(bearer), Ok(raw)) => {
                headers.insert(AUTHORIZATION, bearer);
                headers.insert("apikey", raw);
            }
            _ => warn!("Service key contains invalid header characters, sending without auth"),
        }
    }

    client.post(endpoint.clone()).headers(headers)
}
