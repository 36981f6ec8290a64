//! The single-flight generation gateway.
//!
//! One gateway owns one generation slot: `submit` admits a request only when
//! nothing is in flight and hands the work to a background task, `poll`
//! returns a non-blocking snapshot of the slot, and `latest_answer` delivers
//! each completed answer exactly once through the append-only ledger.

pub mod ledger;
pub mod state;


pub use ledger::{PendingAnswer, QueryRecord, ResponseLedger};
pub use state::{GenerationSlot, GenerationSnapshot};

use crate::extract::{AnswerExtractor, ExtractorConfig};
use crate::llm::chain::{FillerCatalog, ProviderChain};
use crate::llm::provider::CompletionProvider;
use crate::llm::types::{AzureConfig, GenerationRequest, OpenAIConfig, ProviderError};
use crate::llm::{AzureProvider, OpenAIProvider};
use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Rejection message for submissions while a generation is in flight.
pub const BUSY_MESSAGE: &str = "Generation already in progress";

/// Errors surfaced to the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A generation is already in flight; the caller should poll and retry.
    #[error("{}", BUSY_MESSAGE)]
    Busy,
    /// A direct pass-through completion failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Everything a gateway needs, supplied at construction. Credentials come
/// from the deployment environment, never from source. Only the primary
/// stage is mandatory in config files; every other field has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Name recorded on delivered answer records.
    #[serde(default = "default_agent_name")]
    pub agent_name: String,
    /// Wall-clock bound applied to each provider attempt.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,
    /// Primary Azure AI Model Inference stage.
    pub primary: AzureConfig,
    /// Optional OpenAI-compatible secondary stage; `None` disables it.
    pub fallback: Option<OpenAIConfig>,
    #[serde(default)]
    pub fillers: FillerCatalog,
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

fn default_agent_name() -> String {
    "Assistant".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            agent_name: default_agent_name(),
            request_timeout: default_request_timeout(),
            primary: AzureConfig::default(),
            fallback: None,
            fillers: FillerCatalog::default(),
            extractor: ExtractorConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).context("Failed to read config file")?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Save configuration to a TOML file
    pub fn to_toml_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml_string()?;
        std::fs::write(path, content).context("Failed to write config file")
    }

    /// Convert configuration to a TOML string
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }
}

/// Identity report for liveness checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub model: String,
    pub endpoint: String,
}

/// Result of the synchronous pass-through completion: full raw content,
/// reasoning markers included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletion {
    pub id: Uuid,
    pub model: String,
    pub content: String,
    pub finish_reason: String,
}

/// Single-flight generation gateway.
///
/// At most one generation runs at a time. Admission and the terminal result
/// write both go through the slot mutex; provider I/O happens on a spawned
/// task with no lock held, so `submit` and `poll` return immediately no
/// matter how slow the backend is.
pub struct GenerationGateway {
    slot: Arc<Mutex<GenerationSlot>>,
    pending: Arc<Mutex<Option<PendingAnswer>>>,
    ledger: Arc<RwLock<ResponseLedger>>,
    chain: Arc<ProviderChain>,
    extractor: Arc<AnswerExtractor>,
    agent_name: String,
}

impl GenerationGateway {
    /// Build a gateway with real REST provider clients from configuration.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let primary: Arc<dyn CompletionProvider> = Arc::new(
            AzureProvider::new(config.primary.clone(), config.request_timeout)
                .context("Failed to construct primary provider client")?,
        );
        let fallback: Option<Arc<dyn CompletionProvider>> = match &config.fallback {
            Some(fallback_config) => Some(Arc::new(
                OpenAIProvider::new(fallback_config.clone(), config.request_timeout)
                    .context("Failed to construct fallback provider client")?,
            )),
            None => None,
        };
        let chain = ProviderChain::new(
            primary,
            fallback,
            config.fillers.clone(),
            config.request_timeout,
        );
        Ok(Self::with_chain(chain, &config))
    }

    /// Assemble a gateway around an existing chain. This is the seam tests
    /// and embedders with custom providers use.
    pub fn with_chain(chain: ProviderChain, config: &GatewayConfig) -> Self {
        info!(agent = %config.agent_name, "generation gateway initialized");
        Self {
            slot: Arc::new(Mutex::new(GenerationSlot::default())),
            pending: Arc::new(Mutex::new(None)),
            ledger: Arc::new(RwLock::new(ResponseLedger::new())),
            chain: Arc::new(chain),
            extractor: Arc::new(AnswerExtractor::new(config.extractor.clone())),
            agent_name: config.agent_name.clone(),
        }
    }

    /// Admit a new generation or reject it with [`GatewayError::Busy`].
    ///
    /// On acceptance the slot is reset and the request continues on a
    /// background task; this method never waits on provider I/O. A rejected
    /// submission leaves the in-flight generation untouched.
    pub async fn submit(&self, request: GenerationRequest) -> Result<(), GatewayError> {
        {
            let mut slot = self.slot.lock().await;
            if slot.generating {
                warn!("submission rejected: generation already in progress");
                return Err(GatewayError::Busy);
            }
            slot.begin();
        }
        info!(messages = request.messages.len(), "generation accepted");

        let slot = Arc::clone(&self.slot);
        let pending = Arc::clone(&self.pending);
        let chain = Arc::clone(&self.chain);
        let extractor = Arc::clone(&self.extractor);
        tokio::spawn(run_generation(slot, pending, chain, extractor, request));
        Ok(())
    }

    /// Non-blocking snapshot of the generation slot. Safe to call at any
    /// frequency; repeated polls of a terminal slot return the same view.
    pub async fn poll(&self) -> GenerationSnapshot {
        self.slot.lock().await.snapshot()
    }

    /// Deliver the most recent completed answer exactly once.
    ///
    /// A freshly completed answer is appended to the ledger and returned;
    /// every later call (and any call with nothing newly completed) returns
    /// the most recent ledger record unchanged. Returns `None` only before
    /// the first delivery. Re-polls after a delivery are harmless: they can
    /// repeat the last record but never fabricate a new one.
    pub async fn latest_answer(&self) -> Option<QueryRecord> {
        let done = self.slot.lock().await.complete;
        let mut pending = self.pending.lock().await;
        let Some(delivery) = pending.as_ref() else {
            drop(pending);
            return self.ledger.read().await.last().cloned();
        };

        let mut ledger = self.ledger.write().await;
        if ledger.contains_answer(&delivery.answer) {
            debug!("answer already delivered, returning most recent record");
            *pending = None;
            return ledger.last().cloned();
        }

        let record = QueryRecord {
            done,
            answer: delivery.answer.clone(),
            reasoning: delivery.reasoning.clone(),
            agent_name: self.agent_name.clone(),
            success: delivery.success,
            blocks: HashMap::new(),
            status: if delivery.success { "Ready" } else { "Degraded" }.to_string(),
            uid: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        ledger.append(record.clone());
        *pending = None;
        info!(uid = %record.uid, success = record.success, "delivered new answer record");
        Some(record)
    }

    /// Synchronous pass-through against the primary provider only: no
    /// fallback chain, no extraction, full raw content in the result.
    pub async fn chat_completion(
        &self,
        request: GenerationRequest,
    ) -> Result<ChatCompletion, GatewayError> {
        let content = self
            .chain
            .primary()
            .complete(&request.messages, request.max_tokens)
            .await?;
        Ok(ChatCompletion {
            id: Uuid::new_v4(),
            model: self.chain.primary().model().to_string(),
            content,
            finish_reason: "stop".to_string(),
        })
    }

    /// Trivial identity report; performs no provider I/O.
    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "ok".to_string(),
            model: self.chain.primary().model().to_string(),
            endpoint: self.chain.primary().endpoint().to_string(),
        }
    }
}

/// The background half of one generation: resolve through the chain,
/// extract the answer, then make the single terminal write.
///
/// Infallible because the chain always produces content; every provider
/// failure has already been converted into a degraded filler by the time
/// this writes the slot.
async fn run_generation(
    slot: Arc<Mutex<GenerationSlot>>,
    pending: Arc<Mutex<Option<PendingAnswer>>>,
    chain: Arc<ProviderChain>,
    extractor: Arc<AnswerExtractor>,
    request: GenerationRequest,
) {
    debug!("background generation started");
    let outcome = chain.resolve(&request.messages, request.max_tokens).await;
    let answer = extractor.extract(&outcome.content);
    let reasoning = extractor.reasoning_of(&outcome.content).unwrap_or_default();

    // Degraded replies surface the same user-safe sentence in both the
    // answer and error fields; the stage diagnostics stay in the logs.
    let error = match &outcome.degraded {
        Some(stage) => {
            warn!(stage = %stage, "generation degraded to filler reply");
            Some(answer.clone())
        }
        None => None,
    };
    let success = outcome.degraded.is_none();

    {
        let mut slot = slot.lock().await;
        slot.finish(answer.clone(), error);
    }
    {
        let mut pending = pending.lock().await;
        *pending = Some(PendingAnswer {
            answer,
            reasoning,
            success,
        });
    }
    info!(success, "generation complete");
}
