//! Client for the hosted `rate-limiter` edge function.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use url::Url;

use super::rate_limiter::{rate_limit_key, RateLimitDecision, RateLimitPolicy, RateLimitService};
use super::service_request;
use crate::config::SecurityServiceConfig;
use crate::error::AppError;

const RATE_LIMITER_FUNCTION: &str = "rate-limiter";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RateLimitRequest<'a> {
    identifier: &'a str,
    action: &'a str,
    max_requests: u32,
    /// Window length in milliseconds
    time_window: i64,
}

/// Rate limiter backed by the remote service.
///
/// Fails open: if the service is unreachable or answers with anything other
/// than a decision, the request is allowed and the failure is logged.
#[derive(Debug, Clone)]
pub struct RemoteRateLimiter {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl RemoteRateLimiter {
    pub fn new(client: Client, config: &SecurityServiceConfig) -> Result<Self, AppError> {
        Ok(Self {
            client,
            endpoint: config.base_url.join(RATE_LIMITER_FUNCTION)?,
            api_key: config.api_key.clone(),
        })
    }

    async fn request_decision(
        &self,
        identifier: &str,
        action: &str,
        policy: RateLimitPolicy,
    ) -> Result<RateLimitDecision, AppError> {
        let body = RateLimitRequest {
            identifier,
            action,
            max_requests: policy.max_requests,
            time_window: policy.window_ms(),
        };

        let res = service_request(&self.client, &self.endpoint, self.api_key.as_deref())
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        // 429 carries a regular decision body with `allowed: false`
        if !(status.is_success() || status == StatusCode::TOO_MANY_REQUESTS) {
            let body = res.text().await.unwrap_or_default();
            return Err(AppError::Http(format!(
                "Rate limiter responded with status {}: {}",
                status, body
            )));
        }

        Ok(res.json::<RateLimitDecision>().await?)
    }
}

#[async_trait]
impl RateLimitService for RemoteRateLimiter {
    #[instrument(skip(self))]
    async fn check(&self, identifier: &str, action: &str, policy: RateLimitPolicy) -> RateLimitDecision {
        match self.request_decision(identifier, action, policy).await {
            Ok(decision) => {
                if !decision.allowed {
                    info!(
                        "Rate limit exceeded for {}: {}/{}",
                        rate_limit_key(identifier, action),
                        decision.count,
                        decision.limit
                    );
                }
                decision
            }
            Err(AppError::Timeout(e)) => {
                warn!("Rate limit check timed out, allowing request: {}", e);
                RateLimitDecision::fail_open(policy.max_requests)
            }
            Err(e) => {
                error!("Rate limit check failed, allowing request: {}", e);
                RateLimitDecision::fail_open(policy.max_requests)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn limiter_for(server: &MockServer, api_key: Option<&str>) -> RemoteRateLimiter {
        let config = SecurityServiceConfig {
            base_url: crate::config::parse_base_url(&server.uri()).unwrap(),
            api_key: api_key.map(str::to_string),
        };
        RemoteRateLimiter::new(Client::new(), &config).unwrap()
    }

    #[tokio::test]
    async fn test_allowed_decision() {
        // 1. Arrange
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rate-limiter"))
            .and(header("authorization", "Bearer service-key"))
            .and(body_json(json!({
                "identifier": "user-1",
                "action": "chat",
                "maxRequests": 10,
                "timeWindow": 60000
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "allowed": true, "count": 3, "limit": 10
            })))
            .mount(&mock_server)
            .await;
        let limiter = limiter_for(&mock_server, Some("service-key"));

        // 2. Act
        let decision = limiter
            .check("user-1", "chat", RateLimitPolicy::new(10, Duration::from_secs(60)))
            .await;

        // 3. Assert
        assert!(decision.allowed);
        assert_eq!(decision.count, 3);
        assert_eq!(decision.limit, 10);
    }

    #[tokio::test]
    async fn test_denied_decision_on_429() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rate-limiter"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "allowed": false, "count": 10, "limit": 10, "resetTime": 1_700_000_000_000i64
            })))
            .mount(&mock_server)
            .await;
        let limiter = limiter_for(&mock_server, None);

        let decision = limiter.check("user-1", "chat", RateLimitPolicy::default()).await;

        assert!(!decision.allowed);
        assert_eq!(decision.count, 10);
        assert_eq!(decision.reset_time, Some(1_700_000_000_000));
    }

    #[tokio::test]
    async fn test_fails_open_on_server_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rate-limiter"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": "Rate limit check failed"
            })))
            .mount(&mock_server)
            .await;
        let limiter = limiter_for(&mock_server, None);

        let decision = limiter.check("user-1", "chat", RateLimitPolicy::default()).await;

        assert_eq!(decision, RateLimitDecision::fail_open(10));
    }

    #[tokio::test]
    async fn test_fails_open_on_malformed_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rate-limiter"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;
        let limiter = limiter_for(&mock_server, None);

        let decision = limiter.check("user-1", "chat", RateLimitPolicy::default()).await;

        assert!(decision.allowed);
        assert_eq!(decision.count, 0);
    }

    #[tokio::test]
    async fn test_fails_open_when_unreachable() {
        let config = SecurityServiceConfig {
            // Port 9 (discard) on localhost is not expected to accept connections
            base_url: Url::parse("http://127.0.0.1:9/").unwrap(),
            api_key: None,
        };
        let limiter = RemoteRateLimiter::new(Client::new(), &config).unwrap();

        let decision = limiter.check("user-1", "chat", RateLimitPolicy::default()).await;

        assert!(decision.allowed);
    }
}
