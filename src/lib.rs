//! postgen: AI-assisted post generation.
//!
//! The pipeline a post create/update use case runs through:
//!
//! ```text
//! validate (title/prompt/content/category)
//!   -> ContentGenerator::generate (payload, token cap, remote call)
//!   -> normalize (pull text + metadata out of the provider reply)
//!   -> classify (every failure becomes a ClassifiedError)
//! ```
//!
//! Persistence, sessions and category lookup belong to the caller.

pub mod error;
pub mod config;
pub mod providers;
pub mod request;
pub mod normalize;
pub mod validate;
pub mod client;
pub mod response;
pub mod service;

use serde::{Deserialize, Serialize};

pub use client::ContentGenerator;
pub use error::{ClassifiedError, ErrorKind, ValidationError};
pub use request::GenerateOptions;

/// Default model requested from the provider.
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// POSTGEN STRUCTURES:

/// Coarse output size. Controls the target length and the
/// hard token cap sent to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Length
{   Short
  , Medium
  , Long
}

impl Length
{   /// Parse a caller supplied label. Anything unrecognized is
    /// treated as `Medium`.
    pub fn from_label(label: &str) -> Length
    {   match label.trim().to_ascii_lowercase().as_str()
        {   "short" => Length::Short
          , "long" => Length::Long
          , "medium" => Length::Medium
          , other => {
              log::debug!("Unknown length {:?}, using medium", other);
              Length::Medium
            }
        }
    }

    pub fn as_str(&self) -> &'static str
    {   match self
        {   Length::Short => "short"
          , Length::Medium => "medium"
          , Length::Long => "long"
        }
    }
}

impl Default for Length
{   fn default() -> Self
    {   Length::Medium
    }
}

impl From<&str> for Length
{   fn from(label: &str) -> Self
    {   Length::from_label(label)
    }
}

impl From<&String> for Length
{   fn from(label: &String) -> Self
    {   Length::from_label(label)
    }
}

impl std::fmt::Display for Length
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {   f.write_str(self.as_str())
    }
}

/// Category the caller already resolved from its id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CategoryContext
{   pub name: String
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>
}

impl CategoryContext
{   pub fn new(name: impl Into<String>) -> Self
    {   CategoryContext
        {   name: name.into()
          , description: None
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self
    {   self.description = Some(description.into());
        self
    }
}

/// One generation call's input. Built per call, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest
{   pub prompt: String
  , pub length: Length
  , pub category: Option<CategoryContext>
}

/// Sampling parameters sent with each call.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModelParameters
{   pub temperature: f32
  , /// `None` means "use the length cap"
    pub max_tokens: Option<u32>
  , pub top_p: f32
  , pub model: String
}

impl Default for ModelParameters
{   fn default() -> Self
    {   ModelParameters
        {   temperature: 1.0
          , max_tokens: None
          , top_p: 0.95
          , model: DEFAULT_MODEL.to_string()
        }
    }
}

impl ModelParameters
{   /// Overlay every field the patch sets.
    pub fn merge(&mut self, patch: &ParameterPatch)
    {   if let Some(t) = patch.temperature
        {   self.temperature = t;
        }
        if let Some(m) = patch.max_tokens
        {   self.max_tokens = Some(m);
        }
        if let Some(p) = patch.top_p
        {   self.top_p = p;
        }
        if let Some(model) = &patch.model
        {   self.model = model.clone();
        }
    }

    /// Copy with the patch applied, leaving `self` untouched.
    pub fn merged(&self, patch: &ParameterPatch) -> ModelParameters
    {   let mut out = self.clone();
        out.merge(patch);
        out
    }
}

/// Partial [`ModelParameters`]; used both for per-call overrides
/// and for updating the process-wide defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ParameterPatch
{   #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>
}

/// Metadata attached to a generated text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalInfo
{   /// Whitespace-delimited token count unless the provider sent one
    pub word_count: usize
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>
}

/// Successful generation. `text` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult
{   pub text: String
  , pub additional_info: AdditionalInfo
}

impl GenerationResult
{   /// Plain text result; word count derived from the text.
    pub fn from_text(text: impl Into<String>) -> Self
    {   let text = text.into();
        let word_count = word_count(&text);
        GenerationResult
        {   text
          , additional_info: AdditionalInfo
            {   word_count
              , ..AdditionalInfo::default()
            }
        }
    }

    pub fn word_count(&self) -> usize
    {   self.additional_info.word_count
    }
}

/// Count of whitespace-delimited tokens. A proxy, not real
/// tokenization.
pub fn word_count(text: &str) -> usize
{   text.split_whitespace().count()
}
