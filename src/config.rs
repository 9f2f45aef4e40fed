//! Configuration for the generator and the command validators

use std::time::Duration;
use log::debug;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

pub const ENV_API_KEY: &str = "OPENROUTER_API_KEY";
pub const ENV_BASE_URL: &str = "OPENROUTER_BASE_URL";
pub const ENV_MODEL: &str = "OPENROUTER_MODEL";
pub const ENV_TIMEOUT_SECS: &str = "OPENROUTER_TIMEOUT_SECS";

/// Generator configuration, fixed at construction.
#[derive(Clone, Serialize, Deserialize)]
pub struct GeneratorConfig
{   /// Bearer token. Sent as-is, even when empty.
    pub api_token: String
  , /// API base URL, without the trailing `/chat/completions`
    pub base_url: String
  , /// Model used when neither the defaults nor the call name one
    pub default_model: String
  , /// Request timeout in seconds applied to every call
    pub timeout_secs: Option<u64>
  , /// Log outgoing payloads at debug level
    pub verbose: Option<bool>
}

impl Default for GeneratorConfig
{   fn default() -> Self
    {   GeneratorConfig
        {   api_token: String::new()
          , base_url: DEFAULT_BASE_URL.to_string()
          , default_model: crate::DEFAULT_MODEL.to_string()
          , timeout_secs: None
          , verbose: None
        }
    }
}

// token stays out of logs
impl std::fmt::Debug for GeneratorConfig
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {   f.debug_struct("GeneratorConfig")
          .field("api_token", &if self.api_token.is_empty() {
            "<empty>"
          } else {
            "<redacted>"
          })
          .field("base_url", &self.base_url)
          .field("default_model", &self.default_model)
          .field("timeout_secs", &self.timeout_secs)
          .field("verbose", &self.verbose)
          .finish()
    }
}

impl GeneratorConfig
{   pub fn new(
      api_token: impl Into<String>
    , base_url: impl Into<String>
    ) -> Self
    {   GeneratorConfig
        {   api_token: api_token.into()
          , base_url: base_url.into()
          , ..GeneratorConfig::default()
        }
    }

    /// Read the process environment. A missing token becomes an
    /// empty string; the provider will reject it.
    pub fn from_env() -> Self
    {   let mut config = GeneratorConfig::default();
        config.api_token = std::env::var(ENV_API_KEY)
          .unwrap_or_default();
        if let Ok(url) = std::env::var(ENV_BASE_URL)
        {   if !url.trim().is_empty()
            {   config.base_url = url;
            }
        }
        if let Ok(model) = std::env::var(ENV_MODEL)
        {   if !model.trim().is_empty()
            {   config.default_model = model;
            }
        }
        config.timeout_secs = std::env::var(ENV_TIMEOUT_SECS)
          .ok()
          .and_then(|s| s.trim().parse().ok());
        debug!("Loaded generator config from env: {:?}", config);
        config
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self
    {   self.default_model = model.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self
    {   self.timeout_secs = Some(secs);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self
    {   self.verbose = Some(verbose);
        self
    }

    pub fn timeout(&self) -> Option<Duration>
    {   self.timeout_secs.map(Duration::from_secs)
    }

    pub fn is_verbose(&self) -> bool
    {   self.verbose.unwrap_or(false)
    }

    /// Full endpoint for chat completions
    pub fn completions_url(&self) -> String
    {   format!(
          "{}/chat/completions",
          self.base_url.trim_end_matches('/')
        )
    }
}

/// Field bounds enforced by the command validators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationLimits
{   pub max_title_chars: usize
  , pub max_prompt_chars: usize
  , /// Manual post content
    pub max_content_chars: usize
  , pub max_category_name_chars: usize
  , pub max_category_description_chars: usize
  , pub max_search_chars: usize
  , pub max_page_limit: u32
}

impl Default for ValidationLimits
{   fn default() -> Self
    {   ValidationLimits
        {   max_title_chars: 200
          , max_prompt_chars: 500
          , max_content_chars: 5000
          , max_category_name_chars: 100
          , max_category_description_chars: 250
          , max_search_chars: 200
          , max_page_limit: 100
        }
    }
}

/// Install the env_logger backend. Safe to call more than once.
pub fn init_logging()
{   let _ = env_logger::Builder::from_env(
      env_logger::Env::default().default_filter_or("info")
    ).try_init();
}
