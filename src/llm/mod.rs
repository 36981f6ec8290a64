pub mod azure_provider;
pub mod chain;
pub mod openai_provider;
pub mod provider;
pub mod types;


pub use azure_provider::AzureProvider;
pub use chain::{ChainOutcome, FillerCatalog, ProviderChain};
pub use openai_provider::OpenAIProvider;
pub use provider::{CompletionProvider, ScriptedProvider};
pub use types::*;
