use crate::llm::provider::CompletionProvider;
use crate::llm::types::{
    AzureConfig, ChatMessage, CompletionBody, ProviderError, classify_transport,
    interpret_response,
};
use futures::future::BoxFuture;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

const PROVIDER_NAME: &str = "azure";

/// REST client for an Azure AI Model Inference deployment. This is the
/// primary stage of the fallback chain.
pub struct AzureProvider {
    client: Client,
    completions_url: Url,
    config: AzureConfig,
    request_timeout: Duration,
}

impl AzureProvider {
    pub fn new(config: AzureConfig, request_timeout: Duration) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::Auth(
                "azure api key is not configured".to_string(),
            ));
        }
        let completions_url = completions_url(&config.endpoint)?;
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

impl CompletionProvider for AzureProvider {
    fn complete<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        max_tokens: Option<u32>,
    ) -> BoxFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move {
            let body = CompletionBody {
                model: &self.config.deployment,
                messages,
                max_tokens: max_tokens.unwrap_or(self.config.max_tokens_default),
            };
            debug!(
                deployment = %self.config.deployment,
                max_tokens = body.max_tokens,
                "sending completion request to azure"
            );
            let response = self
                .client
                .post(self.completions_url.clone())
                .query(&[("api-version", self.config.api_version.as_str())])
                .header("api-key", &self.config.api_key)
                .json(&body)
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
        &self.config.deployment
    }

    fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

/// Append `/chat/completions` to the configured endpoint, tolerating a
/// trailing slash.
fn completions_url(endpoint: &str) -> Result<Url, ProviderError> {
    let trimmed = endpoint.trim_end_matches('/');
    Url::parse(&format!("{trimmed}/chat/completions"))
        .map_err(|e| ProviderError::Unknown(format!("invalid azure endpoint '{endpoint}': {e}")))
}
