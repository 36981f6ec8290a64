use futures::future::BoxFuture;
use genbridge::llm::ScriptedProvider;
use genbridge::{
    BUSY_MESSAGE, ChatMessage, CompletionProvider, FillerCatalog, GatewayConfig, GatewayError,
    GenerationGateway, GenerationRequest, ProviderChain, ProviderError,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn request(content: &str) -> GenerationRequest {
    GenerationRequest::new(vec![ChatMessage::user(content)])
}

fn gateway_with(primary: Arc<dyn CompletionProvider>) -> GenerationGateway {
    let chain = ProviderChain::new(
        primary,
        None,
        FillerCatalog::default(),
        Duration::from_secs(5),
    );
    GenerationGateway::with_chain(chain, &GatewayConfig::default())
}

/// A provider defined outside the crate, proving the trait is a public seam.
struct CannedProvider {
    content: String,
}

impl CompletionProvider for CannedProvider {
    fn complete<'a>(
        &'a self,
        _messages: &'a [ChatMessage],
        _max_tokens: Option<u32>,
    ) -> BoxFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move { Ok(self.content.clone()) })
    }

    fn provider_name(&self) -> &'static str {
        "canned"
    }

    fn model(&self) -> &str {
        "canned-model"
    }

    fn endpoint(&self) -> &str {
        "http://canned.invalid"
    }
}

#[tokio::test]
async fn test_end_to_end_generation_flow() {
    init_tracing();
    let provider = Arc::new(CannedProvider {
        content: "<think>Okay, simple arithmetic.</think>\nThe answer is 4.".to_string(),
    });
    let gateway = gateway_with(provider);

    gateway.submit(request("What is 2+2?")).await.unwrap();

    let snapshot = loop {
        let snapshot = gateway.poll().await;
        if snapshot.is_complete {
            break snapshot;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    };
    assert_eq!(snapshot.sentence, "The answer is 4.");
    assert!(snapshot.error.is_none());

    let record = gateway
        .latest_answer()
        .await
        .expect("completed answer should be delivered");
    assert_eq!(record.answer, "The answer is 4.");
    assert_eq!(record.reasoning, "Okay, simple arithmetic.");
    assert!(record.success);

    // Submitting again after completion is accepted.
    gateway.submit(request("And 3+3?")).await.unwrap();
}

#[tokio::test]
async fn test_busy_rejection_carries_the_protocol_message() {
    init_tracing();
    let gate = Arc::new(Notify::new());
    let gateway = gateway_with(Arc::new(ScriptedProvider::gated("held", gate.clone())));

    gateway.submit(request("first")).await.unwrap();
    let rejection = gateway.submit(request("second")).await.unwrap_err();
    assert!(matches!(rejection, GatewayError::Busy));
    assert_eq!(rejection.to_string(), BUSY_MESSAGE);

    gate.notify_one();
}

#[tokio::test]
async fn test_degraded_flow_surfaces_filler_and_error_together() {
    init_tracing();
    let gateway = gateway_with(Arc::new(ScriptedProvider::err(ProviderError::Network(
        "connection refused".to_string(),
    ))));

    gateway.submit(request("hello there")).await.unwrap();

    let snapshot = loop {
        let snapshot = gateway.poll().await;
        if snapshot.is_complete {
            break snapshot;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    };
    // Degraded replies stay conversational and duplicate themselves into
    // the error field.
    assert!(!snapshot.sentence.is_empty());
    assert_eq!(snapshot.error, Some(snapshot.sentence.clone()));

    let record = gateway.latest_answer().await.unwrap();
    assert!(!record.success);
    assert_eq!(record.answer, snapshot.sentence);
}

#[test]
fn test_default_config_is_rejected_without_credentials() {
    // Real provider construction validates configuration up front.
    let result = GenerationGateway::new(GatewayConfig::default());
    assert!(result.is_err());
}
