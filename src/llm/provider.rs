use crate::llm::types::{ChatMessage, ProviderError};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// A single chat-completion backend the fallback chain can call.
///
/// `complete` is one blocking round trip: callers are expected to wrap it in
/// their own wall-clock bound. Implementations classify every failure into
/// [`ProviderError`] so the chain can pick the next stage from the kind alone.
pub trait CompletionProvider: Send + Sync {
    /// Execute one completion call and return the raw assistant content,
    /// reasoning markers included.
    fn complete<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        max_tokens: Option<u32>,
    ) -> BoxFuture<'a, Result<String, ProviderError>>;

    /// Get provider name/identifier for logs and diagnostics
    fn provider_name(&self) -> &'static str;

    /// Model or deployment name this client targets
    fn model(&self) -> &str;

    /// Endpoint this client talks to, for health reporting
    fn endpoint(&self) -> &str;
}

/// Scripted provider for tests and offline development. Replays a fixed
/// outcome, optionally holding each call open until its gate is notified.
pub struct ScriptedProvider {
    reply: Result<String, ProviderError>,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    /// Provider that always succeeds with `content`.
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            reply: Ok(content.into()),
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Provider that always fails with `error`.
    pub fn err(error: ProviderError) -> Self {
        Self {
            reply: Err(error),
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Provider that blocks every call until `gate` is notified, then
    /// succeeds with `content`.
    pub fn gated(content: impl Into<String>, gate: Arc<Notify>) -> Self {
        Self {
            reply: Ok(content.into()),
            gate: Some(gate),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of calls observed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CompletionProvider for ScriptedProvider {
    fn complete<'a>(
        &'a self,
        _messages: &'a [ChatMessage],
        _max_tokens: Option<u32>,
    ) -> BoxFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.reply.clone()
        })
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    fn endpoint(&self) -> &str {
        "http://scripted.invalid"
    }
}
