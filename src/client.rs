use std::sync::Arc;
use std::time::Duration;
use log::{debug, info, trace};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use crate::config::GeneratorConfig;
use crate::error::{classify, ClassifiedError, TransportError};
use crate::normalize::normalize;
use crate::providers::{CompletionProvider, OpenRouterProvider};
use crate::request::{build_payload, ChatCompletionRequest, GenerateOptions};
use crate::{GenerationRequest, GenerationResult, Length, ModelParameters, ParameterPatch};

/// Content generation adapter.
///
/// Holds the configuration fixed at construction, the process-wide
/// default [`ModelParameters`] and the last successful result.
/// The defaults change only through [`set_default_parameters`].
///
/// [`set_default_parameters`]: ContentGenerator::set_default_parameters
pub struct ContentGenerator
{   config: GeneratorConfig
  , provider: Arc<dyn CompletionProvider>
  , defaults: RwLock<ModelParameters>
  , last_result: Mutex<Option<GenerationResult>>
}

impl ContentGenerator
{   /// Generator talking to the configured HTTP endpoint
    pub fn new(config: GeneratorConfig) -> Self
    {   let provider = Arc::new(OpenRouterProvider::new(&config));
        ContentGenerator::with_provider(config, provider)
    }

    /// Generator configured from the process environment
    pub fn from_env() -> Self
    {   ContentGenerator::new(GeneratorConfig::from_env())
    }

    /// Generator using a caller supplied provider
    pub fn with_provider(
      config: GeneratorConfig
    , provider: Arc<dyn CompletionProvider>
    ) -> Self
    {   debug!(
          "Creating ContentGenerator (provider={}, model={})",
          provider.name(),
          config.default_model
        );
        let defaults = ModelParameters
        {   model: config.default_model.clone()
          , ..ModelParameters::default()
        };
        ContentGenerator
        {   config
          , provider
          , defaults: RwLock::new(defaults)
          , last_result: Mutex::new(None)
        }
    }

    pub fn config(&self) -> &GeneratorConfig
    {   &self.config
    }

    /// Snapshot of the current defaults
    pub fn default_parameters(&self) -> ModelParameters
    {   self.defaults.read().clone()
    }

    /// Merge `patch` into the defaults used by later calls.
    /// Last write wins.
    pub fn set_default_parameters(&self, patch: &ParameterPatch)
      -> ModelParameters
    {   let mut defaults = self.defaults.write();
        defaults.merge(patch);
        info!("Default parameters updated: {:?}", *defaults);
        defaults.clone()
    }

    /// Most recent successful result. Racy under concurrent calls;
    /// for debugging only.
    pub fn last_result(&self) -> Option<GenerationResult>
    {   self.last_result.lock().clone()
    }

    /// Generate text for `prompt`. One remote call, no retries.
    /// Every failure comes back classified.
    pub async fn generate<L>(
      &self
    , prompt: &str
    , length: L
    , options: GenerateOptions
    ) -> Result<GenerationResult, ClassifiedError>
    where
        L: Into<Length>
    {   let request = GenerationRequest
        {   prompt: prompt.to_string()
          , length: length.into()
          , category: options.category.clone()
        };
        let params = self.defaults.read().merged(&options.params);
        let payload = build_payload(&request, &params);
        debug!(
          "generate: length={} model={} max_tokens={}",
          request.length, payload.model, payload.max_tokens
        );

        let outcome = match self.call(&payload, &options).await
        {   Ok(raw) => normalize(&raw).map_err(TransportError::from)
          , Err(e) => Err(e)
        };

        match outcome
        {   Ok(result) => {
              trace!("Generated {} words", result.word_count());
              *self.last_result.lock() = Some(result.clone());
              Ok(result)
            }
          , Err(e) => Err(classify(&e))
        }
    }

    /// Remote call bounded by the deadline and the cancellation token
    async fn call(
      &self
    , payload: &ChatCompletionRequest
    , options: &GenerateOptions
    ) -> Result<Value, TransportError>
    {   let timeout = options.timeout.or_else(|| self.config.timeout());
        let bounded = with_deadline(self.provider.complete(payload), timeout);

        match &options.cancellation
        {   Some(token) => {
              tokio::select!
              { _ = token.cancelled() => {
                  debug!("Generation cancelled by caller");
                  Err(TransportError::Cancelled)
                }
              , result = bounded => result
              }
            }
          , None => bounded.await
        }
    }
}

async fn with_deadline<F>(
  fut: F
, timeout: Option<Duration>
) -> Result<Value, TransportError>
where
    F: std::future::Future<Output = Result<Value, TransportError>>
{   match timeout
    {   Some(limit) => {
          match tokio::time::timeout(limit, fut).await
          {   Ok(result) => result
            , Err(_) => {
                debug!("Provider call exceeded {:?}", limit);
                Err(TransportError::Timeout(limit))
              }
          }
        }
      , None => fut.await
    }
}
