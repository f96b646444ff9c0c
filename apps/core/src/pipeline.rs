//! Chat pipeline - one user turn from raw text to displayable response.
//!
//! 1. Validates the input
//! 2. Checks the rate limit (fail-open)
//! 3. Analyzes and routes the message
//! 4. Calls the language model with the routed parameters
//! 5. Wraps the output with its context metadata

use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::brain::{ContextRouter, ContextualResponse, RoutingDecision, DEFAULT_SESSION_ID};
use crate::error::AppError;
use crate::llm::{ChatTurn, CompletionRequest, LlmBackend};
use crate::security::{RateLimitPolicy, RateLimitService, SecurityEventSink};
use crate::validation::{sanitize_input, validate_chat_input};

/// Rate limit action name for chat messages
pub const CHAT_ACTION: &str = "chat";

/// Identifier used when the sender is not signed in
pub const ANONYMOUS_USER: &str = "anonymous";

/// One incoming chat message
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub text: String,
    /// Prior turns, oldest first
    pub history: Vec<ChatTurn>,
}

impl ChatRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Result of a processed chat turn
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    /// Unique id of this turn, for correlating logs
    pub turn_id: Uuid,
    pub response: ContextualResponse,
    pub decision: RoutingDecision,
}

/// Pipeline tunables
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub max_input_chars: u64,
    pub rate_limit: RateLimitPolicy,
}

/// Orchestrates validation, rate limiting, routing and generation.
///
/// Security events are reported on a spawned task; a rejection never waits for them.
pub struct ChatPipeline<L, R, S>
where
    L: LlmBackend,
    R: RateLimitService,
    S: SecurityEventSink,
{
    router: ContextRouter,
    llm: Arc<L>,
    rate_limiter: Arc<R>,
    security: Arc<S>,
    settings: PipelineSettings,
}

impl<L, R, S> ChatPipeline<L, R, S>
where
    L: LlmBackend,
    R: RateLimitService,
    S: SecurityEventSink,
{
    pub fn new(llm: Arc<L>, rate_limiter: Arc<R>, security: Arc<S>, settings: PipelineSettings) -> Self {
        Self {
            router: ContextRouter::new(),
            llm,
            rate_limiter,
            security,
            settings,
        }
    }

    pub fn router(&self) -> &ContextRouter {
        &self.router
    }

    /// Processes one chat turn.
    #[instrument(skip(self, request), fields(session = request.session_id.as_deref().unwrap_or(DEFAULT_SESSION_ID)))]
    pub async fn handle_message(&self, request: ChatRequest) -> Result<ChatOutcome, AppError> {
        let turn_id = Uuid::new_v4();
        let identifier = request.user_id.as_deref().unwrap_or(ANONYMOUS_USER);

        // --- Validation ---
        if let Err(e) = validate_chat_input(&request.text, self.settings.max_input_chars) {
            warn!("Rejected chat input: {}", e);
            let event_details = details(json!({
                "reason": e.to_string(),
                "length": request.text.chars().count(),
            }));
            let security = Arc::clone(&self.security);
            let user_id = request.user_id.clone();
            tokio::spawn(async move { security.log_invalid_input(event_details, user_id).await });
            return Err(e);
        }

        // --- Rate Limiting ---
        let decision = self
            .rate_limiter
            .check(identifier, CHAT_ACTION, self.settings.rate_limit)
            .await;
        if !decision.allowed {
            warn!("Rate limit exceeded for {}", identifier);
            let event_details = details(json!({
                "action": CHAT_ACTION,
                "count": decision.count,
                "limit": decision.limit,
            }));
            let security = Arc::clone(&self.security);
            let user_id = request.user_id.clone();
            tokio::spawn(async move { security.log_rate_limit_exceeded(event_details, user_id).await });
            return Err(AppError::RateLimited {
                count: decision.count,
                limit: decision.limit,
                reset_time: decision.reset_time,
            });
        }

        // --- Context Routing ---
        let text = request.text.trim();
        let session_id = request.session_id.as_deref().unwrap_or(DEFAULT_SESSION_ID);
        let context = self.router.analyze_with_session(text, session_id);
        let routing = self.router.route(&context);
        info!(
            "Turn {} routed: {} -> {} (temperature {}, max tokens {})",
            turn_id,
            context.summary(),
            routing.response_strategy,
            routing.temperature,
            routing.max_tokens
        );

        // --- Generation ---
        let raw = self
            .llm
            .complete(CompletionRequest {
                system_prompt: routing.system_prompt.clone(),
                history: request.history,
                user_message: sanitize_input(text),
                temperature: routing.temperature,
                max_tokens: routing.max_tokens,
            })
            .await?;

        let response = self
            .router
            .format_contextual_response(&routing, &sanitize_input(&raw));

        Ok(ChatOutcome {
            turn_id,
            response,
            decision: routing,
        })
    }
}

fn details(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
