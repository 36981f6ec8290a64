//! # Genbridge
//!
//! A single-flight gateway that bridges slow, synchronous LLM completions
//! into a non-blocking submit/poll interface. Callers submit a conversation,
//! poll for the finished answer, and collect delivered results from an
//! append-only ledger; provider outages degrade to deterministic filler
//! replies instead of surfacing raw failures.
//!
//! ## Architecture Overview
//!
//! The crate is organized into three modules:
//!
//! - **[`gateway`]**: Admission control, the shared generation slot, the
//!   background execution coordinator, and the response ledger
//! - **[`llm`]**: Provider clients (Azure AI Model Inference, OpenAI-compatible)
//!   and the ordered fallback chain with its deterministic last resort
//! - **[`extract`]**: Deterministic extraction of the user-facing answer from
//!   raw reasoning-model output
//!
//! ## Features
//!
//! ### 🚦 Single-Flight Admission
//! - **One generation at a time**: concurrent submissions are rejected
//!   immediately, never queued
//! - **Non-blocking protocol**: `submit` and `poll` return without waiting on
//!   provider I/O, however slow the backend is
//! - **Exactly-once delivery**: completed answers enter the ledger once,
//!   re-polls repeat the record instead of fabricating a new one
//!
//! ### 🔁 Provider Fallback
//! - **Ordered stages**: Azure primary, optional OpenAI-compatible secondary
//! - **Deterministic last resort**: filler replies synthesized from the last
//!   user message when every stage fails
//! - **Bounded attempts**: every provider call runs under a wall-clock timeout
//!
//! ### 🧠 Reasoning-Aware Extraction
//! - **`<think>` block handling**: the visible answer is recovered even when
//!   the model spends its whole budget deliberating
//! - **Pure and configurable**: same input, same answer; markers and
//!   thresholds are plain configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use genbridge::{ChatMessage, GatewayConfig, GenerationGateway, GenerationRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = GatewayConfig::default();
//!     config.primary.endpoint = "https://acct.services.ai.azure.com/models".to_string();
//!     config.primary.api_key = std::env::var("AZURE_AI_KEY")?;
//!     let gateway = GenerationGateway::new(config)?;
//!
//!     let request = GenerationRequest::new(vec![ChatMessage::user("What is 2+2?")]);
//!     gateway.submit(request).await?;
//!
//!     loop {
//!         let snapshot = gateway.poll().await;
//!         if snapshot.is_complete {
//!             println!("{}", snapshot.sentence);
//!             break;
//!         }
//!         tokio::time::sleep(std::time::Duration::from_millis(250)).await;
//!     }
//!     Ok(())
//! }
//! ```

/// Deterministic answer extraction from raw reasoning-model output.
///
/// Maps any completion text to a presentable sentence through a fixed rule
/// ladder covering closed, truncated, and absent reasoning blocks.
pub mod extract;

/// The single-flight generation gateway.
///
/// Admission control over one shared generation slot, background execution,
/// non-blocking polling, and exactly-once answer delivery through an
/// append-only ledger.
pub mod gateway;

/// Provider clients and the fallback chain.
///
/// REST clients for Azure AI Model Inference and OpenAI-compatible endpoints,
/// a classified error taxonomy, and the ordered chain that degrades to
/// deterministic filler replies.
pub mod llm;

// Re-export the gateway surface
pub use gateway::{
    BUSY_MESSAGE, ChatCompletion, GatewayConfig, GatewayError, GenerationGateway,
    GenerationSnapshot, HealthReport, QueryRecord,
};

// Re-export provider and chain types
pub use llm::{
    AzureConfig, AzureProvider, ChainOutcome, ChatMessage, CompletionProvider, FillerCatalog,
    GenerationRequest, OpenAIConfig, OpenAIProvider, ProviderChain, ProviderError, Role,
};

// Re-export extraction types
pub use extract::{AnswerExtractor, ExtractorConfig};
