//! Canned provider for demos and tests. Answers in the
//! chat-completions shape without touching the network.

use std::time::Duration;
use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;
use serde_json::{json, Value};
use crate::error::TransportError;
use crate::request::ChatCompletionRequest;
use crate::Length;

pub fn canned_text(length: Length, topic: &str) -> String
{   match length
    {   Length::Short => format!(
          "Short post about \"{}\": This is a brief mock response for \
           testing purposes. It simulates a concise AI-generated content \
           that would typically be 2-3 sentences long.",
          topic
        )
      , Length::Medium => format!(
          "Medium post about \"{}\": This is a more detailed mock response \
           that spans multiple sentences. It simulates a moderate-length \
           AI-generated content with some additional context and details. \
           The response includes enough text to demonstrate how a typical \
           medium-sized post would look.",
          topic
        )
      , Length::Long => format!(
          "Long post about \"{}\": This is an extensive mock response that \
           provides a comprehensive treatment of the topic. It simulates a \
           lengthy AI-generated content with multiple paragraphs and \
           detailed explanations. The response includes various aspects and \
           perspectives on the topic, making it suitable for in-depth \
           content. This mock response demonstrates how a long-form post \
           would be structured and formatted. It includes enough text to \
           test UI rendering and content display mechanisms.",
          topic
        )
    }
}

/// Which canned size a token budget corresponds to
fn length_for_budget(max_tokens: u32) -> Length
{   match max_tokens
    {   0..=300 => Length::Short
      , 301..=500 => Length::Medium
      , _ => Length::Long
    }
}

enum Reply
{   Canned
  , Fixed(Value)
  , Fail(TransportError)
}

pub struct MockProvider
{   reply: Reply
  , latency: Option<Duration>
  , requests: Mutex<Vec<ChatCompletionRequest>>
}

impl MockProvider
{   /// Answers with the canned text matching the requested budget
    pub fn new() -> Self
    {   MockProvider
        {   reply: Reply::Canned
          , latency: None
          , requests: Mutex::new(Vec::new())
        }
    }

    /// Always answers with `body`
    pub fn with_body(body: Value) -> Self
    {   MockProvider
        {   reply: Reply::Fixed(body)
          , ..MockProvider::new()
        }
    }

    /// Always fails with `error`
    pub fn failing(error: TransportError) -> Self
    {   MockProvider
        {   reply: Reply::Fail(error)
          , ..MockProvider::new()
        }
    }

    /// Sleep before answering
    pub fn with_latency(mut self, latency: Duration) -> Self
    {   self.latency = Some(latency);
        self
    }

    /// Every payload received so far
    pub fn requests(&self) -> Vec<ChatCompletionRequest>
    {   self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<ChatCompletionRequest>
    {   self.requests.lock().last().cloned()
    }
}

impl Default for MockProvider
{   fn default() -> Self
    {   MockProvider::new()
    }
}

#[async_trait]
impl super::CompletionProvider for MockProvider
{   fn name(&self) -> &str
    {   "mock"
    }

    async fn complete(
      &self
    , request: &ChatCompletionRequest
    ) -> Result<Value, TransportError>
    {   self.requests.lock().push(request.clone());
        if let Some(latency) = self.latency
        {   tokio::time::sleep(latency).await;
        }
        match &self.reply
        {   Reply::Canned => {
              let length = length_for_budget(request.max_tokens);
              debug!("Mock provider answering with {} text", length);
              let topic = request.messages
                .iter()
                .find(|m| m.role == "user")
                .map(|m| m.content.as_str())
                .unwrap_or_default();
              Ok(json!({
                "choices": [{
                  "message": {
                    "role": "assistant",
                    "content": canned_text(length, topic)
                  },
                  "finish_reason": "stop"
                }]
              }))
            }
          , Reply::Fixed(body) => Ok(body.clone())
          , Reply::Fail(e) => Err(e.clone())
        }
    }
}
