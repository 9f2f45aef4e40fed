use async_trait::async_trait;
use log::{debug, error, trace};
use serde_json::Value;
use crate::config::GeneratorConfig;
use crate::error::TransportError;
use crate::request::ChatCompletionRequest;

/// HTTP provider for any OpenAI-style `/chat/completions` API
pub struct OpenRouterProvider
{   api_token: String
  , url: String
  , verbose: bool
  , http_client: reqwest::Client
}

impl OpenRouterProvider
{   pub fn new(config: &GeneratorConfig) -> Self
    {   debug!("Creating OpenRouterProvider for {}", config.base_url);
        // no client-wide timeout: the generator sets the deadline per call
        OpenRouterProvider
        {   api_token: config.api_token.clone()
          , url: config.completions_url()
          , verbose: config.is_verbose()
          , http_client: reqwest::Client::new()
        }
    }

    pub fn url(&self) -> &str
    {   &self.url
    }
}

#[async_trait]
impl super::CompletionProvider for OpenRouterProvider
{   fn name(&self) -> &str
    {   "openrouter"
    }

    async fn complete(
      &self
    , request: &ChatCompletionRequest
    ) -> Result<Value, TransportError>
    {   debug!(
          "POST {} model={} max_tokens={}",
          self.url, request.model, request.max_tokens
        );
        if self.verbose
        {   debug!("Request payload: {:?}", request);
        }

        let response = self.http_client
          .post(&self.url)
          .header("Authorization", format!("Bearer {}", self.api_token))
          .header("Content-Type", "application/json")
          .json(request)
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            TransportError::from(e)
          })?;

        let status = response.status();
        trace!("Provider response status: {}", status);

        if !status.is_success()
        {   let body = response.text().await
              .unwrap_or_default();
            error!("Provider API error {}: {}", status, body);
            return Err(TransportError::Status
            {   code: status.as_u16()
              , reason: status
                  .canonical_reason()
                  .unwrap_or("Unknown error")
                  .to_string()
              , body
            });
        }

        let body: Value = response.json().await.map_err(|e| {
          error!("Parse error: {}", e);
          TransportError::Decode(e.without_url().to_string())
        })?;
        trace!("Provider response body: {}", body);
        Ok(body)
    }
}
