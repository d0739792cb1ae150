//! AI assistant orchestration
//!
//! Routes a viewer question plus the live fleet context to the configured
//! collaborator and falls back to the rule-based answerer when the
//! collaborator is unreachable or times out. Never blocks the tick loop and
//! never surfaces an error to the asking session — worst case is a
//! rule-based answer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::{context, rules};
use crate::config::defaults::{ASSISTANT_MAX_TOKENS, RULE_BASED_TOKEN_COST};
use crate::config::AssistantConfig;
use crate::types::{AnswerSource, DashboardSnapshot, ServerMessage};

// ============================================================================
// Error Types
// ============================================================================

/// Errors from the collaborator backend
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("collaborator request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("collaborator returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("collaborator reply missing content: {0}")]
    BadReply(String),
}

// ============================================================================
// Backend Seam
// ============================================================================

/// One collaborator answer plus usage metadata.
#[derive(Debug, Clone)]
pub struct BackendReply {
    pub text: String,
    pub tokens_used: Option<u64>,
}

/// The natural-language collaborator: question + context in, free text out.
/// The core never depends on what sits behind this seam.
#[async_trait]
pub trait AnswerBackend: Send + Sync {
    async fn answer(&self, question: &str, context: &str) -> Result<BackendReply, AssistantError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

// ============================================================================
// OpenAI-Compatible Backend
// ============================================================================

/// Chat-completions backend for any OpenAI-compatible endpoint.
pub struct OpenAiCompatBackend {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiCompatBackend {
    pub fn new(cfg: &AssistantConfig, base_url: String) -> Result<Self, AssistantError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
            .build()?;
        let api_key = std::env::var(&cfg.api_key_env).ok().filter(|k| !k.is_empty());
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            api_key,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: u64,
}

#[async_trait]
impl AnswerBackend for OpenAiCompatBackend {
    async fn answer(&self, question: &str, context: &str) -> Result<BackendReply, AssistantError> {
        let prompt = format!(
            "You are the fleet operations assistant for a real-time logistics \
             monitoring system. Use the following live data to answer accurately \
             and concisely.\n\n{context}\n\nUser question: {question}\n\n\
             Use specific truck ids and numbers from the data. If asked about \
             risks, explain the contributing factors. Keep the answer under 200 \
             words."
        );

        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": "You are a specialized logistics intelligence assistant."},
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.1,
            "stream": false
        });

        let mut request = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(AssistantError::Status(response.status()));
        }

        let parsed: ChatResponse = response.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AssistantError::BadReply("no choices in response".to_string()))?;

        Ok(BackendReply {
            text,
            tokens_used: parsed.usage.map(|u| u.total_tokens),
        })
    }

    fn name(&self) -> &'static str {
        "openai-compat"
    }
}

// ============================================================================
// Assistant
// ============================================================================

/// Shared assistant handle: reads the published dashboard, asks the backend,
/// falls back to rule-based answers, and accounts token usage.
#[derive(Clone)]
pub struct FleetAssistant {
    backend: Option<Arc<dyn AnswerBackend>>,
    dashboard: Arc<RwLock<DashboardSnapshot>>,
    token_usage: Arc<AtomicU64>,
}

impl FleetAssistant {
    /// Build from configuration. Without a `base_url` the assistant is
    /// rule-based only.
    pub fn from_config(cfg: &AssistantConfig, dashboard: Arc<RwLock<DashboardSnapshot>>) -> Self {
        let backend: Option<Arc<dyn AnswerBackend>> = match &cfg.base_url {
            Some(url) => match OpenAiCompatBackend::new(cfg, url.clone()) {
                Ok(b) => {
                    info!(base_url = %url, model = %cfg.model, "AI collaborator configured");
                    Some(Arc::new(b))
                }
                Err(e) => {
                    warn!(error = %e, "Failed to build AI collaborator client — rule-based answers only");
                    None
                }
            },
            None => {
                info!("No AI collaborator configured — using rule-based assistant");
                None
            }
        };
        Self {
            backend,
            dashboard,
            token_usage: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Rule-based-only assistant (used by tests and as a safe default).
    pub fn rule_based(dashboard: Arc<RwLock<DashboardSnapshot>>) -> Self {
        Self {
            backend: None,
            dashboard,
            token_usage: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Answer a question against the latest published snapshot. Infallible:
    /// collaborator faults degrade to a rule-based answer, never an error.
    pub async fn ask(&self, question: &str) -> ServerMessage {
        let dash = self.dashboard.read().await.clone();

        if let Some(ref backend) = self.backend {
            let ctx = context::render_context(&dash);
            match backend.answer(question, &ctx).await {
                Ok(reply) => {
                    let used = reply.tokens_used.unwrap_or(0);
                    let total = self.token_usage.fetch_add(used, Ordering::Relaxed) + used;
                    return ServerMessage::AiResponse {
                        response: reply.text,
                        token_usage: Some(total),
                        max_tokens: Some(ASSISTANT_MAX_TOKENS),
                        source: AnswerSource::Model,
                    };
                }
                Err(e) => {
                    warn!(backend = backend.name(), error = %e, "Collaborator failed — falling back to rule-based answer");
                }
            }
        }

        let total = self
            .token_usage
            .fetch_add(RULE_BASED_TOKEN_COST, Ordering::Relaxed)
            + RULE_BASED_TOKEN_COST;
        ServerMessage::AiResponse {
            response: rules::answer(question, &dash),
            token_usage: Some(total),
            max_tokens: Some(ASSISTANT_MAX_TOKENS),
            source: AnswerSource::RuleBased,
        }
    }
}
