//! Turn a provider reply of unknown shape into a [`GenerationResult`]

use log::{debug, trace, warn};
use serde_json::{Map, Value};
use crate::error::NormalizeError;
use crate::{word_count, AdditionalInfo, GenerationResult};

/// Pulls the raw content value out of a response object
pub type ContentExtractor = fn(&Map<String, Value>) -> Option<&Value>;

/// Tried in order; the first one yielding a usable value wins.
pub const CONTENT_EXTRACTORS: &[(&str, ContentExtractor)] = &[
    ("choices[0].message.content", choice_message_content)
  , ("choices[0].content", choice_content)
  , ("text", top_level_text)
];

fn first_choice(obj: &Map<String, Value>) -> Option<&Map<String, Value>>
{   obj.get("choices")?
      .as_array()?
      .first()?
      .as_object()
}

fn choice_message_content(obj: &Map<String, Value>) -> Option<&Value>
{   first_choice(obj)?
      .get("message")?
      .as_object()?
      .get("content")
}

fn choice_content(obj: &Map<String, Value>) -> Option<&Value>
{   first_choice(obj)?.get("content")
}

fn top_level_text(obj: &Map<String, Value>) -> Option<&Value>
{   obj.get("text")
}

/// Null and blank strings count as "no value" so the next
/// extractor gets a chance.
fn is_usable(value: &Value) -> bool
{   match value
    {   Value::Null => false
      , Value::String(s) => !s.trim().is_empty()
      , _ => true
    }
}

/// Run the extractors against a response object.
pub fn extract_content(obj: &Map<String, Value>) -> Option<&Value>
{   CONTENT_EXTRACTORS
      .iter()
      .find_map(|(path, extract)| {
        let found = extract(obj).filter(|v| is_usable(v))?;
        debug!("Found content at {}", path);
        Some(found)
      })
}

/// A string is tried as encoded structure only if it looks like
/// a JSON object or JSON string literal.
fn looks_structured(s: &str) -> bool
{   let t = s.trim_start();
    t.starts_with('{') || t.starts_with('"')
}

/// Decode string content that looks like JSON. Prose that merely
/// opens with a quote or brace fails to parse and stays plain text.
fn decode_structured(s: &str) -> Option<Value>
{   if !looks_structured(s)
    {   return None;
    }
    match serde_json::from_str::<Value>(s)
    {   Ok(parsed) => Some(parsed)
      , Err(e) => {
          trace!("Content is not encoded JSON ({}), using it as text", e);
          None
        }
    }
}

/// Normalize a raw provider payload.
pub fn normalize(raw: &Value) -> Result<GenerationResult, NormalizeError>
{   normalize_inner(raw).map_err(|e| {
      warn!("Could not normalize provider response: {}", e);
      debug!("Raw provider response: {}", raw);
      e
    })
}

fn normalize_inner(raw: &Value) -> Result<GenerationResult, NormalizeError>
{   let obj = raw.as_object()
      .ok_or(NormalizeError::NotAnObject)?;
    let content = extract_content(obj)
      .ok_or(NormalizeError::MissingContent)?;

    match content
    {   Value::String(s) => match decode_structured(s)
        {   Some(parsed) => from_structured(&parsed)
          , None => Ok(GenerationResult::from_text(s.as_str()))
        }
      , other => from_structured(other)
    }
}

fn from_structured(value: &Value) -> Result<GenerationResult, NormalizeError>
{   match value
    {   Value::String(s) if !s.trim().is_empty() => {
          Ok(GenerationResult::from_text(s.as_str()))
        }
      , Value::Object(obj) => {
          let text = obj.get("text")
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
            .ok_or(NormalizeError::MissingText)?;
          // metadata may be nested or sit beside `text`
          let meta = obj.get("additionalInfo")
            .and_then(Value::as_object)
            .unwrap_or(obj);
          Ok(GenerationResult
          {   text: text.to_string()
            , additional_info: AdditionalInfo
              {   word_count: provided_word_count(meta)
                    .unwrap_or_else(|| word_count(text))
                , summary: string_field(meta, "summary")
                , tone: string_field(meta, "tone")
              }
          })
        }
      , _ => Err(NormalizeError::MissingText)
    }
}

fn string_field(meta: &Map<String, Value>, key: &str) -> Option<String>
{   meta.get(key)
      .and_then(Value::as_str)
      .map(str::to_string)
}

fn provided_word_count(meta: &Map<String, Value>) -> Option<usize>
{   let n = meta.get("wordCount")?;
    if let Some(u) = n.as_u64()
    {   return Some(u as usize);
    }
    n.as_f64()
      .filter(|f| f.is_finite() && *f >= 0.0)
      .map(|f| f.round() as usize)
}
