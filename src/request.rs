//! Request side of a generation call: length table, per-call
//! options, prompt composition and the wire payload

use std::time::Duration;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use crate::{CategoryContext, GenerationRequest, Length, ModelParameters, ParameterPatch};

/// Token budget and target size for one [`Length`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthConfig
{   /// Hard ceiling on `max_tokens`
    pub max_tokens: u32
  , /// Human description of the target size, quoted to the model
    pub target: &'static str
}

impl LengthConfig
{   pub fn for_length(length: Length) -> LengthConfig
    {   match length
        {   Length::Short => LengthConfig
            {   max_tokens: 300
              , target: "a short post of 2-3 sentences (roughly 50-100 words)"
            }
          , Length::Medium => LengthConfig
            {   max_tokens: 500
              , target: "a medium post of 1-2 paragraphs (roughly 150-250 words)"
            }
          , Length::Long => LengthConfig
            {   max_tokens: 800
              , target: "a long post of several paragraphs (roughly 350-500 words)"
            }
        }
    }

    /// Clamp a requested budget to this length's cap. Callers may
    /// tighten, never loosen.
    pub fn effective_max_tokens(&self, requested: Option<u32>) -> u32
    {   requested
          .unwrap_or(self.max_tokens)
          .min(self.max_tokens)
    }
}

/// Per-call options for [`crate::ContentGenerator::generate`]
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions
{   pub category: Option<CategoryContext>
  , /// Overrides on top of the generator defaults
    pub params: ParameterPatch
  , /// Deadline for the remote call; overrides the configured one
    pub timeout: Option<Duration>
  , pub cancellation: Option<CancellationToken>
}

impl GenerateOptions
{   pub fn new() -> Self
    {   GenerateOptions::default()
    }

    pub fn with_category(mut self, category: CategoryContext) -> Self
    {   self.category = Some(category);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self
    {   self.params.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self
    {   self.params.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self
    {   self.params.top_p = Some(top_p);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self
    {   self.params.model = Some(model.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self
    {   self.timeout = Some(timeout);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self
    {   self.cancellation = Some(token);
        self
    }
}

// ===== Wire Types =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage
{   pub role: String
  , pub content: String
}

impl ChatMessage
{   pub fn system(content: impl Into<String>) -> Self
    {   ChatMessage
        {   role: "system".to_string()
          , content: content.into()
        }
    }

    pub fn user(content: impl Into<String>) -> Self
    {   ChatMessage
        {   role: "user".to_string()
          , content: content.into()
        }
    }
}

/// Body of `POST {base}/chat/completions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , pub temperature: f32
  , pub max_tokens: u32
  , pub top_p: f32
}

// ===== Prompt Composition =====

pub fn system_instruction(config: &LengthConfig) -> String
{   format!(
      "You are a skilled content writer producing social media posts.\n\
       Formatting rules:\n\
       - Reply with the post text only, no title, preamble or sign-off.\n\
       - Use plain text; no markdown headings or code blocks.\n\
       - Write {target}.\n\
       - Never exceed {cap} tokens.",
      target = config.target,
      cap = config.max_tokens,
    )
}

pub fn user_instruction(
  request: &GenerationRequest
, config: &LengthConfig
) -> String
{   let mut out = String::new();
    if let Some(category) = &request.category
    {   out.push_str(&format!("Category: {}\n", category.name));
        out.push_str(&format!(
          "Category Description: {}\n",
          category.description.as_deref().unwrap_or("N/A")
        ));
    }
    out.push_str(&format!("Topic: {}\n", request.prompt));
    out.push_str(&format!(
      "Length: {} ({}), at most {} tokens.",
      request.length,
      config.target,
      config.max_tokens
    ));
    out
}

/// Build the provider payload for one call.
pub fn build_payload(
  request: &GenerationRequest
, params: &ModelParameters
) -> ChatCompletionRequest
{   let config = LengthConfig::for_length(request.length);
    ChatCompletionRequest
    {   model: params.model.clone()
      , messages: vec![
          ChatMessage::system(system_instruction(&config))
        , ChatMessage::user(user_instruction(request, &config))
        ]
      , temperature: params.temperature
      , max_tokens: config.effective_max_tokens(params.max_tokens)
      , top_p: params.top_p
    }
}
