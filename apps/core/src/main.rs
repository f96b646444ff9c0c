// Deeja CLI Entry Point
// Routes each message through the context router, and through the model when configured

use std::io::{self, BufRead};
use std::sync::Arc;

use anyhow::Context;
use deeja_core::brain::{ContextIndicator, ContextRouter};
use deeja_core::config::AppConfig;
use deeja_core::llm::{ChatTurn, OpenAiChatClient};
use deeja_core::pipeline::{ChatPipeline, ChatRequest, PipelineSettings};
use deeja_core::security::{
    LocalRateLimiter, NoopSecurityMonitor, RateLimitService, RemoteRateLimiter, SecurityEventSink,
    SecurityMonitor,
};
use deeja_core::telemetry::init_telemetry;
use deeja_core::AppError;
use serde_json::json;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_telemetry("deeja", config.log_format).context("Failed to initialize logging")?;

    let messages = read_messages()?;
    if messages.is_empty() {
        info!("No input. Usage: deeja <message> or pipe one message per line");
        return Ok(());
    }

    if config.llm.api_key.is_none() {
        info!("LLM_API_KEY not set, printing routing decisions only");
        let router = ContextRouter::new();
        for message in &messages {
            let decision = router.route(&router.analyze(message));
            let preview = router.format_contextual_response(&decision, "");
            let indicator = ContextIndicator::from_metadata(&preview.metadata, true);
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "decision": decision,
                    "indicator": indicator.render(),
                }))?
            );
        }
        return Ok(());
    }

    let client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .context("Failed to build HTTP client")?;
    // Completions run far longer than the security calls; bounded by LLM_TIMEOUT_SECS
    let llm_client = reqwest::Client::builder()
        .build()
        .context("Failed to build LLM HTTP client")?;
    let llm = Arc::new(OpenAiChatClient::new(llm_client, &config.llm)?);
    let settings = PipelineSettings {
        max_input_chars: config.max_input_chars,
        rate_limit: config.rate_limit,
    };

    match &config.security {
        Some(security) => {
            let limiter = Arc::new(RemoteRateLimiter::new(client.clone(), security)?);
            let monitor = Arc::new(SecurityMonitor::new(client, security)?);
            run_chat(ChatPipeline::new(llm, limiter, monitor, settings), messages).await
        }
        None => {
            let pipeline = ChatPipeline::new(
                llm,
                Arc::new(LocalRateLimiter::new()),
                Arc::new(NoopSecurityMonitor),
                settings,
            );
            run_chat(pipeline, messages).await
        }
    }
}

/// CLI arguments form one message; otherwise each stdin line is a message.
fn read_messages() -> anyhow::Result<Vec<String>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        return Ok(vec![args.join(" ")]);
    }

    let mut messages = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read stdin")?;
        if !line.trim().is_empty() {
            messages.push(line);
        }
    }
    Ok(messages)
}

async fn run_chat<L, R, S>(
    pipeline: ChatPipeline<L, R, S>,
    messages: Vec<String>,
) -> anyhow::Result<()>
where
    L: deeja_core::llm::LlmBackend,
    R: RateLimitService,
    S: SecurityEventSink,
{
    let session_id = uuid::Uuid::new_v4().to_string();
    let mut history: Vec<ChatTurn> = Vec::new();

    for message in messages {
        let request = ChatRequest {
            session_id: Some(session_id.clone()),
            user_id: None,
            text: message.clone(),
            history: history.clone(),
        };

        match pipeline.handle_message(request).await {
            Ok(outcome) => {
                let indicator = ContextIndicator::from_metadata(&outcome.response.metadata, true);
                if let Some(line) = indicator.render() {
                    println!("{}", line);
                }
                println!("{}\n", outcome.response.response);
                history.push(ChatTurn::user(message));
                history.push(ChatTurn::assistant(outcome.response.response));
            }
            Err(e @ AppError::RateLimited { .. }) => {
                error!("{}", e);
                println!("Too many messages, please wait a moment.\n");
            }
            Err(e) => {
                error!("Chat turn failed: {}", e);
                println!("Error: {}\n", e);
            }
        }
    }

    Ok(())
}
