use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default token budget applied when a request does not carry one.
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Larger default for reasoning-class deployments, which spend tokens on
/// deliberation before the visible answer.
pub const REASONING_MAX_TOKENS: u32 = 4096;

/// API version the Azure AI Model Inference endpoint is pinned to.
pub const DEFAULT_API_VERSION: &str = "2024-05-01-preview";

/// Body substrings that identify a missing deployment regardless of the
/// HTTP status the backend chose to send them under.
pub const NOT_FOUND_MARKERS: &[&str] = &["deploymentnotfound", "resource not found"];

/// Longest error-body excerpt carried into diagnostics.
pub const SNIPPET_MAX_CHARS: usize = 200;

/// Conversation role accepted by every chat-completion backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One conversation turn, already in wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A caller-submitted generation request. Immutable once accepted; the
/// token budget falls back to each provider's default when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: Option<u32>,
}

impl GenerationRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Classified failure from a single provider attempt. The kind decides the
/// fallback policy: `NotFound` skips the secondary stage entirely, everything
/// else moves to the next stage.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Model deployment not found: {0}")]
    NotFound(String),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Provider error: {0}")]
    Unknown(String),
}

/// Connection settings for the primary Azure AI Model Inference deployment.
/// Only the endpoint and key are mandatory in config files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureConfig {
    /// Base endpoint, e.g. `https://acct.services.ai.azure.com/models`.
    pub endpoint: String,
    pub api_key: String,
    /// Deployment (model) name the endpoint serves.
    #[serde(default = "default_deployment")]
    pub deployment: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_reasoning_max_tokens")]
    pub max_tokens_default: u32,
}

/// Connection settings for the OpenAI-compatible fallback stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// Base URL up to but excluding `/chat/completions`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token; `None` for keyless local servers.
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens_default: u32,
}

fn default_deployment() -> String {
    "DeepSeek-R1".to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_reasoning_max_tokens() -> u32 {
    REASONING_MAX_TOKENS
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

/// OpenAI-style chat completion request body shared by both REST stages.
#[derive(Debug, Serialize)]
pub struct CompletionBody<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub max_tokens: u32,
}

/// The slice of an OpenAI-style completion response the gateway consumes.
#[derive(Debug, Deserialize)]
pub struct CompletionEnvelope {
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
pub struct CompletionMessage {
    pub content: String,
}

/// Interpret one finished HTTP exchange with an OpenAI-style backend:
/// extract the first choice's content on success, classify otherwise.
pub fn interpret_response(
    provider: &str,
    status: StatusCode,
    body: &str,
) -> Result<String, ProviderError> {
    if status.is_success() {
        let envelope: CompletionEnvelope = serde_json::from_str(body).map_err(|e| {
            ProviderError::Unknown(format!("{provider}: malformed completion body: {e}"))
        })?;
        return envelope
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                ProviderError::Unknown(format!("{provider}: completion contained no choices"))
            });
    }
    Err(classify_status(provider, status, body))
}

/// Map an HTTP error status (plus body) onto the error taxonomy. Pure, so
/// the mapping is testable without a live endpoint.
pub fn classify_status(provider: &str, status: StatusCode, body: &str) -> ProviderError {
    let lowered = body.to_lowercase();
    let detail = format!("{provider} returned {status}: {}", snippet(body));
    if status == StatusCode::NOT_FOUND || NOT_FOUND_MARKERS.iter().any(|m| lowered.contains(m)) {
        return ProviderError::NotFound(detail);
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Auth(detail),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::Network(detail),
        s if s.is_server_error() => ProviderError::Network(detail),
        _ => ProviderError::Unknown(detail),
    }
}

/// Map a reqwest transport failure onto the error taxonomy.
pub fn classify_transport(
    provider: &str,
    error: &reqwest::Error,
    timeout: Duration,
) -> ProviderError {
    if error.is_timeout() {
        return ProviderError::Timeout(timeout);
    }
    if error.is_connect() {
        return ProviderError::Network(format!("{provider}: connection failed: {error}"));
    }
    if error.is_decode() {
        return ProviderError::Unknown(format!("{provider}: response decode failed: {error}"));
    }
    ProviderError::Network(format!("{provider}: transport error: {error}"))
}

/// Char-safe excerpt of an error body for diagnostics.
pub fn snippet(body: &str) -> String {
    if body.chars().count() <= SNIPPET_MAX_CHARS {
        return body.to_string();
    }
    body.chars().take(SNIPPET_MAX_CHARS).collect()
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            deployment: default_deployment(),
            api_version: default_api_version(),
            max_tokens_default: default_reasoning_max_tokens(),
        }
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            max_tokens_default: default_max_tokens(),
        }
    }
}
