use crate::llm::provider::CompletionProvider;
use crate::llm::types::{ChatMessage, ProviderError, Role};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

/// Filler shown when nothing about the last user message stands out.
pub const GENERIC_FILLER: &str = "Hi there! I'm here to help, but I'm having some connection issues with Azure AI Foundry. You may need to check your model deployment.";

/// Filler for greeting-shaped user messages.
pub const GREETING_FILLER: &str = "Hello! Nice to meet you. I'm having some connection issues with Azure but I'm still here to chat.";

/// Filler for question-shaped user messages.
pub const QUESTION_FILLER: &str = "That's an interesting question! I'd love to answer, but I'm having trouble connecting to my knowledge base at the moment.";

/// Diagnostic recorded when the primary deployment does not exist. Internal
/// annotation only; it is never shown to the end user.
pub const MISSING_DEPLOYMENT_DIAGNOSTIC: &str = "Azure model is not properly deployed on your Azure AI Foundry endpoint. Please check your Azure setup and deployment status.";

/// Tokens whose presence in the last user message selects the greeting filler.
pub const GREETING_TOKENS: &[&str] = &["hello", "hi"];

/// Canned replies used when every provider stage has failed. The choice
/// among them is a pure function of the last user message, so degraded-mode
/// behavior stays deterministic and testable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillerCatalog {
    /// Substrings (lowercase) that mark a greeting-shaped message.
    pub greeting_tokens: Vec<String>,
    pub greeting: String,
    pub question: String,
    pub generic: String,
    pub missing_deployment: String,
}

impl Default for FillerCatalog {
    fn default() -> Self {
        Self {
            greeting_tokens: GREETING_TOKENS.iter().map(|t| t.to_string()).collect(),
            greeting: GREETING_FILLER.to_string(),
            question: QUESTION_FILLER.to_string(),
            generic: GENERIC_FILLER.to_string(),
            missing_deployment: MISSING_DEPLOYMENT_DIAGNOSTIC.to_string(),
        }
    }
}

/// What resolving one request through the chain produced. `degraded` names
/// the stage that forced a filler; `None` means a provider supplied the
/// content itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutcome {
    pub content: String,
    pub degraded: Option<String>,
}

/// Ordered completion stages with a deterministic last resort.
///
/// Resolution policy: try the primary; on `NotFound` skip the secondary
/// entirely (the deployment is misconfigured, a different backend cannot
/// repair that); on any other failure try the secondary when configured;
/// when everything has failed, synthesize a filler from the last user
/// message. `resolve` is infallible since the filler stage always produces
/// content.
pub struct ProviderChain {
    primary: Arc<dyn CompletionProvider>,
    fallback: Option<Arc<dyn CompletionProvider>>,
    fillers: FillerCatalog,
    attempt_timeout: Duration,
}

impl ProviderChain {
    pub fn new(
        primary: Arc<dyn CompletionProvider>,
        fallback: Option<Arc<dyn CompletionProvider>>,
        fillers: FillerCatalog,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            primary,
            fallback,
            fillers,
            attempt_timeout,
        }
    }

    /// The primary stage, for identity reporting and direct pass-through.
    pub fn primary(&self) -> &dyn CompletionProvider {
        self.primary.as_ref()
    }

    /// Resolve one request to final raw content, walking the stages in order.
    pub async fn resolve(&self, messages: &[ChatMessage], max_tokens: Option<u32>) -> ChainOutcome {
        let primary_err = match self.attempt(self.primary.as_ref(), messages, max_tokens).await {
            Ok(content) => {
                return ChainOutcome {
                    content,
                    degraded: None,
                };
            }
            Err(error) => error,
        };

        if let ProviderError::NotFound(detail) = &primary_err {
            warn!(
                provider = self.primary.provider_name(),
                %detail,
                "primary deployment missing, skipping fallback stage"
            );
            let annotation = format!("{} ({detail})", self.fillers.missing_deployment);
            return self.degrade(messages, annotation);
        }

        warn!(
            provider = self.primary.provider_name(),
            error = %primary_err,
            "primary provider failed"
        );

        if let Some(fallback) = &self.fallback {
            match self.attempt(fallback.as_ref(), messages, max_tokens).await {
                Ok(content) => {
                    info!(
                        provider = fallback.provider_name(),
                        "fallback provider served the completion"
                    );
                    return ChainOutcome {
                        content,
                        degraded: None,
                    };
                }
                Err(fallback_err) => {
                    warn!(
                        provider = fallback.provider_name(),
                        error = %fallback_err,
                        "fallback provider failed"
                    );
                    return self.degrade(
                        messages,
                        format!("primary failed: {primary_err}; fallback failed: {fallback_err}"),
                    );
                }
            }
        }

        self.degrade(
            messages,
            format!("primary failed: {primary_err}; no fallback configured"),
        )
    }

    /// One provider call under the chain's wall-clock bound.
    async fn attempt(
        &self,
        provider: &dyn CompletionProvider,
        messages: &[ChatMessage],
        max_tokens: Option<u32>,
    ) -> Result<String, ProviderError> {
        match timeout(self.attempt_timeout, provider.complete(messages, max_tokens)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.attempt_timeout)),
        }
    }

    fn degrade(&self, messages: &[ChatMessage], annotation: String) -> ChainOutcome {
        ChainOutcome {
            content: self.filler_for(messages),
            degraded: Some(annotation),
        }
    }

    /// Deterministic last-resort reply keyed off the last user message:
    /// greeting token wins over question mark, generic otherwise.
    fn filler_for(&self, messages: &[ChatMessage]) -> String {
        let Some(user_message) = last_user_content(messages) else {
            return self.fillers.generic.clone();
        };
        let lowered = user_message.to_lowercase();
        if self
            .fillers
            .greeting_tokens
            .iter()
            .any(|token| lowered.contains(token.as_str()))
        {
            return self.fillers.greeting.clone();
        }
        if user_message.contains('?') {
            return self.fillers.question.clone();
        }
        self.fillers.generic.clone()
    }
}

fn last_user_content(messages: &[ChatMessage]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .find(|message| message.role == Role::User)
        .map(|message| message.content.as_str())
}
