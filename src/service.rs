//! Post create/update glue: validate, resolve the category,
//! generate or take manual content, shape the envelope.
//! Storing the draft is left to the caller.

use async_trait::async_trait;
use log::{error, info};
use serde::Serialize;
use uuid::Uuid;
use crate::client::ContentGenerator;
use crate::request::GenerateOptions;
use crate::response::ApiResponse;
use crate::validate::{
  CommandValidator, CreatePostCommand, PostBody, PostMode, UpdatePostCommand,
  ValidatedUpdate,
};
use crate::{AdditionalInfo, CategoryContext, Length};

/// Longest prompt/content excerpt written to the error log
const LOG_EXCERPT_CHARS: usize = 100;

/// Resolves a category id to its name and description
#[async_trait]
pub trait CategoryLookup: Send + Sync
{   async fn find(&self, id: Uuid) -> Option<CategoryContext>;
}

/// Post ready to be persisted by the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDraft
{   pub title: String
  , pub category_id: Uuid
  , pub mode: PostMode
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Length>
  , pub content: String
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<AdditionalInfo>
}

pub struct PostComposer<C>
{   generator: ContentGenerator
  , categories: C
  , validator: CommandValidator
}

fn excerpt(text: &str) -> String
{   text.chars().take(LOG_EXCERPT_CHARS).collect()
}

impl<C: CategoryLookup> PostComposer<C>
{   pub fn new(generator: ContentGenerator, categories: C) -> Self
    {   PostComposer
        {   generator
          , categories
          , validator: CommandValidator::default()
        }
    }

    pub fn with_validator(mut self, validator: CommandValidator) -> Self
    {   self.validator = validator;
        self
    }

    pub fn generator(&self) -> &ContentGenerator
    {   &self.generator
    }

    /// Build a new post. Auto mode calls the generator once;
    /// manual mode uses the supplied content verbatim.
    pub async fn create(
      &self
    , cmd: &CreatePostCommand
    ) -> ApiResponse<PostDraft>
    {   let post = match self.validator.create_post(cmd)
        {   Ok(p) => p
          , Err(e) => return ApiResponse::validation_error(&e)
        };

        match post.body
        {   PostBody::Manual { content } => {
              info!("Created manual post draft in {}", post.category_id);
              ApiResponse::created(PostDraft
              {   title: post.title
                , category_id: post.category_id
                , mode: PostMode::Manual
                , prompt: None
                , size: None
                , content
                , additional_info: None
              })
            }
          , PostBody::Auto { prompt, length } => {
              let category = match self.categories.find(post.category_id).await
              {   Some(c) => c
                , None => {
                    error!(
                      "generatePost: category {} not found",
                      post.category_id
                    );
                    return ApiResponse::internal_error(
                      "Failed to fetch category details"
                    );
                  }
              };
              let options = GenerateOptions::new().with_category(category);
              match self.generator.generate(&prompt, length, options).await
              {   Ok(result) => {
                    info!(
                      "Generated {} post draft ({} words)",
                      length,
                      result.word_count()
                    );
                    ApiResponse::created(PostDraft
                    {   title: post.title
                      , category_id: post.category_id
                      , mode: PostMode::Auto
                      , prompt: Some(prompt)
                      , size: Some(length)
                      , content: result.text
                      , additional_info: Some(result.additional_info)
                    })
                  }
                , Err(e) => {
                    error!(
                      "generatePost failed: kind={} title={:?} prompt={:?}",
                      e.kind, post.title, excerpt(&prompt)
                    );
                    ApiResponse::generation_failed(&e)
                  }
              }
            }
        }
    }

    /// Validate an edit. The caller applies the returned patch.
    pub fn update(&self, cmd: &UpdatePostCommand) -> ApiResponse<ValidatedUpdate>
    {   match self.validator.update_post(cmd)
        {   Ok(update) => ApiResponse::success(update)
          , Err(e) => {
              error!(
                "updatePost rejected: id={} prompt={:?} content={:?}",
                cmd.id,
                cmd.prompt.as_deref().map(excerpt),
                cmd.content.as_deref().map(excerpt)
              );
              ApiResponse::validation_error(&e)
            }
        }
    }
}
