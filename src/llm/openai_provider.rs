use crate::llm::provider::CompletionProvider;
use crate::llm::types::{
    ChatMessage, CompletionBody, OpenAIConfig, ProviderError, classify_transport,
    interpret_response,
};
use futures::future::BoxFuture;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

const PROVIDER_NAME: &str = "openai";

/// REST client for an OpenAI-compatible endpoint. This is the optional
/// secondary stage of the fallback chain; local keyless servers work too.
pub struct OpenAIProvider {
    client: Client,
    completions_url: Url,
    config: OpenAIConfig,
    request_timeout: Duration,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig, request_timeout: Duration) -> Result<Self, ProviderError> {
        let completions_url = completions_url(&config.base_url)?;
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ProviderError::Unknown(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            completions_url,
            config,
            request_timeout,
        })
    }
}

impl CompletionProvider for OpenAIProvider {
    fn complete<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        max_tokens: Option<u32>,
    ) -> BoxFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move {
            let body = CompletionBody {
                model: &self.config.model,
                messages,
                max_tokens: max_tokens.unwrap_or(self.config.max_tokens_default),
            };
            debug!(
                model = %self.config.model,
                max_tokens = body.max_tokens,
                "sending completion request to openai-compatible endpoint"
            );
            let mut request = self.client.post(self.completions_url.clone()).json(&body);
            if let Some(key) = &self.config.api_key {
                request = request.bearer_auth(key);
            }
            let response = request
                .send()
                .await
                .map_err(|e| classify_transport(PROVIDER_NAME, &e, self.request_timeout))?;
            let status = response.status();
            let text = response
                .text()
                .await
                .map_err(|e| classify_transport(PROVIDER_NAME, &e, self.request_timeout))?;
            interpret_response(PROVIDER_NAME, status, &text)
        })
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> &str {
        &self.config.base_url
    }
}

fn completions_url(base_url: &str) -> Result<Url, ProviderError> {
    let trimmed = base_url.trim_end_matches('/');
    Url::parse(&format!("{trimmed}/chat/completions"))
        .map_err(|e| ProviderError::Unknown(format!("invalid base url '{base_url}': {e}")))
}
