//! Completion providers behind the generator

pub mod openrouter;
pub mod mock;

use async_trait::async_trait;
use serde_json::Value;
use crate::error::TransportError;
use crate::request::ChatCompletionRequest;

// Re-export for convenience
pub use mock::MockProvider;
pub use openrouter::OpenRouterProvider;

/// One chat-completions endpoint. Returns the decoded JSON body
/// of a 2xx reply; its shape is left to the normalizer.
#[async_trait]
pub trait CompletionProvider: Send + Sync
{   fn name(&self) -> &str;

    async fn complete(
      &self
    , request: &ChatCompletionRequest
    ) -> Result<Value, TransportError>;
}
