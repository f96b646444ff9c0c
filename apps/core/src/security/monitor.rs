//! Security event logging against the hosted `security-monitor` edge function.
//!
//! Logging is best effort: a failure is written to the local log and never
//! reaches the caller.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{error, info, instrument, warn};
use url::Url;

use super::service_request;
use crate::config::SecurityServiceConfig;
use crate::error::AppError;

const SECURITY_MONITOR_FUNCTION: &str = "security-monitor";

/// User agent reported when the caller does not supply one
pub const DEFAULT_USER_AGENT: &str = concat!("deeja-core/", env!("CARGO_PKG_VERSION"));

/// Kind of security event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityEventType {
    FailedAuth,
    SuspiciousActivity,
    ApiAbuse,
    InvalidInput,
    RateLimitExceeded,
}

impl SecurityEventType {
    /// Severity used by the convenience loggers
    pub fn default_severity(&self) -> Severity {
        match self {
            SecurityEventType::FailedAuth => Severity::Medium,
            SecurityEventType::SuspiciousActivity => Severity::High,
            SecurityEventType::ApiAbuse => Severity::High,
            SecurityEventType::InvalidInput => Severity::Low,
            SecurityEventType::RateLimitExceeded => Severity::Medium,
        }
    }
}

/// Severity of a security event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// A security event as accepted by the monitor service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub event_type: SecurityEventType,
    pub severity: Severity,
    pub details: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl SecurityEvent {
    /// New event with the type's default severity
    pub fn new(event_type: SecurityEventType, details: Map<String, Value>) -> Self {
        Self {
            event_type,
            severity: event_type.default_severity(),
            details,
            ip_address: None,
            user_agent: None,
            user_id: None,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_user(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_ip(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }
}

#[derive(Debug, Deserialize)]
struct MonitorResponse {
    #[serde(default)]
    success: bool,
}

/// Destination for security events.
///
/// `record` never fails from the caller's perspective. The `log_*` helpers
/// build an event with the type's default severity and the acting user.
#[async_trait]
pub trait SecurityEventSink: Send + Sync + 'static {
    async fn record(&self, event: SecurityEvent);

    async fn log_failed_auth(&self, details: Map<String, Value>, user_id: Option<String>) {
        self.record(SecurityEvent::new(SecurityEventType::FailedAuth, details).with_user(user_id))
            .await
    }

    async fn log_suspicious_activity(&self, details: Map<String, Value>, user_id: Option<String>) {
        self.record(
            SecurityEvent::new(SecurityEventType::SuspiciousActivity, details).with_user(user_id),
        )
        .await
    }

    async fn log_api_abuse(&self, details: Map<String, Value>, user_id: Option<String>) {
        self.record(SecurityEvent::new(SecurityEventType::ApiAbuse, details).with_user(user_id))
            .await
    }

    async fn log_invalid_input(&self, details: Map<String, Value>, user_id: Option<String>) {
        self.record(SecurityEvent::new(SecurityEventType::InvalidInput, details).with_user(user_id))
            .await
    }

    async fn log_rate_limit_exceeded(&self, details: Map<String, Value>, user_id: Option<String>) {
        self.record(
            SecurityEvent::new(SecurityEventType::RateLimitExceeded, details).with_user(user_id),
        )
        .await
    }
}

/// Sink that drops every event, for deployments without the monitor service
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSecurityMonitor;

#[async_trait]
impl SecurityEventSink for NoopSecurityMonitor {
    async fn record(&self, event: SecurityEvent) {
        info!(
            "Security event {:?} ({}) not forwarded: no monitor configured",
            event.event_type, event.severity
        );
    }
}

/// HTTP client for the security monitor service
#[derive(Debug, Clone)]
pub struct SecurityMonitor {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl SecurityMonitor {
    pub fn new(client: Client, config: &SecurityServiceConfig) -> Result<Self, AppError> {
        Ok(Self {
            client,
            endpoint: config.base_url.join(SECURITY_MONITOR_FUNCTION)?,
            api_key: config.api_key.clone(),
        })
    }

    /// Sends one event and reports the outcome.
    pub async fn send(&self, mut event: SecurityEvent) -> Result<(), AppError> {
        if event.user_agent.is_none() {
            event.user_agent = Some(DEFAULT_USER_AGENT.to_string());
        }
        if event.severity == Severity::Critical {
            warn!("CRITICAL SECURITY EVENT: {:?} {:?}", event.event_type, event.details);
        }

        let res = service_request(&self.client, &self.endpoint, self.api_key.as_deref())
            .json(&event)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AppError::Http(format!(
                "Security monitor responded with status {}: {}",
                status, body
            )));
        }

        let ack: MonitorResponse = res.json().await?;
        if !ack.success {
            return Err(AppError::Http("Security monitor did not acknowledge the event".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SecurityEventSink for SecurityMonitor {
    #[instrument(skip(self, event), fields(event_type = ?event.event_type, severity = %event.severity))]
    async fn record(&self, event: SecurityEvent) {
        if let Err(e) = self.send(event).await {
            error!("Failed to log security event: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn monitor_for(server: &MockServer) -> SecurityMonitor {
        let config = SecurityServiceConfig {
            base_url: crate::config::parse_base_url(&server.uri()).unwrap(),
            api_key: None,
        };
        SecurityMonitor::new(Client::new(), &config).unwrap()
    }

    fn details(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_default_severities() {
        assert_eq!(SecurityEventType::FailedAuth.default_severity(), Severity::Medium);
        assert_eq!(SecurityEventType::SuspiciousActivity.default_severity(), Severity::High);
        assert_eq!(SecurityEventType::ApiAbuse.default_severity(), Severity::High);
        assert_eq!(SecurityEventType::InvalidInput.default_severity(), Severity::Low);
        assert_eq!(SecurityEventType::RateLimitExceeded.default_severity(), Severity::Medium);
    }

    #[test]
    fn test_event_wire_format() {
        let event = SecurityEvent::new(SecurityEventType::RateLimitExceeded, details(json!({"count": 11})))
            .with_user(Some("user-1".to_string()));
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event_type"], "rate_limit_exceeded");
        assert_eq!(json["severity"], "medium");
        assert_eq!(json["details"]["count"], 11);
        assert_eq!(json["user_id"], "user-1");
        assert!(json.get("ip_address").is_none());
    }

    #[tokio::test]
    async fn test_send_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/security-monitor"))
            .and(body_partial_json(json!({
                "event_type": "failed_auth",
                "severity": "medium",
                "user_agent": DEFAULT_USER_AGENT
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "logged": true})))
            .expect(1)
            .mount(&mock_server)
            .await;
        let monitor = monitor_for(&mock_server);

        let result = monitor
            .send(SecurityEvent::new(SecurityEventType::FailedAuth, details(json!({"email": "a@b.c"}))))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_send_reports_server_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/security-monitor"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Failed to log security event"))
            .mount(&mock_server)
            .await;
        let monitor = monitor_for(&mock_server);

        let result = monitor
            .send(SecurityEvent::new(SecurityEventType::ApiAbuse, Map::new()))
            .await;

        match result {
            Err(AppError::Http(msg)) => assert!(msg.contains("500")),
            other => panic!("Expected AppError::Http, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_record_swallows_failures() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/security-monitor"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&mock_server)
            .await;
        let monitor = monitor_for(&mock_server);

        // Must return normally
        monitor
            .log_invalid_input(details(json!({"reason": "too long"})), None)
            .await;
    }

    #[tokio::test]
    async fn test_log_helpers_attach_user() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/security-monitor"))
            .and(body_partial_json(json!({
                "event_type": "api_abuse",
                "severity": "high",
                "user_id": "user-9",
                "details": {"endpoint": "chat"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&mock_server)
            .await;
        let monitor = monitor_for(&mock_server);

        monitor
            .log_api_abuse(details(json!({"endpoint": "chat"})), Some("user-9".to_string()))
            .await;
    }
}
