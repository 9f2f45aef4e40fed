//! Command validation. Pure checks run before any remote call;
//! every violated field is reported, not just the first.

use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::config::ValidationLimits;
use crate::error::{FieldError, ValidationError};
use crate::Length;

const HYPHENATED_UUID_LEN: usize = 36;

// ===== Commands =====

/// How the post body is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PostMode
{   Auto
  , Manual
}

/// Raw create-post input
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CreatePostCommand
{   pub title: String
  , pub category_id: String
  , pub mode: PostMode
  , /// Auto mode
    #[serde(default)]
    pub prompt: Option<String>
  , /// Auto mode; unknown labels fall back to medium
    #[serde(default)]
    pub size: Option<String>
  , /// Manual mode
    #[serde(default)]
    pub content: Option<String>
}

impl CreatePostCommand
{   pub fn auto(
      title: impl Into<String>
    , prompt: impl Into<String>
    , size: impl Into<String>
    , category_id: impl Into<String>
    ) -> Self
    {   CreatePostCommand
        {   title: title.into()
          , category_id: category_id.into()
          , mode: PostMode::Auto
          , prompt: Some(prompt.into())
          , size: Some(size.into())
          , content: None
        }
    }

    pub fn manual(
      title: impl Into<String>
    , content: impl Into<String>
    , category_id: impl Into<String>
    ) -> Self
    {   CreatePostCommand
        {   title: title.into()
          , category_id: category_id.into()
          , mode: PostMode::Manual
          , prompt: None
          , size: None
          , content: Some(content.into())
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PostBody
{   Auto
    {   prompt: String
      , length: Length
    }
  , Manual
    {   content: String
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPost
{   pub title: String
  , pub category_id: Uuid
  , pub body: PostBody
}

/// Raw update-post input; absent fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UpdatePostCommand
{   pub id: String
  , #[serde(default)]
    pub title: Option<String>
  , #[serde(default)]
    pub prompt: Option<String>
  , #[serde(default)]
    pub size: Option<String>
  , #[serde(default)]
    pub content: Option<String>
  , #[serde(default)]
    pub category_id: Option<String>
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedUpdate
{   pub id: Uuid
  , pub title: Option<String>
  , pub prompt: Option<String>
  , pub length: Option<Length>
  , pub content: Option<String>
  , pub category_id: Option<Uuid>
}

/// Delete a post or a category by id
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeleteCommand
{   pub id: String
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CreateCategoryCommand
{   pub name: String
  , #[serde(default)]
    pub description: String
}

// ===== Posts Query =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField
{   CreatedAt
  , Title
  , UpdatedAt
}

impl SortField
{   pub fn parse(s: &str) -> Option<SortField>
    {   match s
        {   "created_at" => Some(SortField::CreatedAt)
          , "title" => Some(SortField::Title)
          , "updated_at" => Some(SortField::UpdatedAt)
          , _ => None
        }
    }

    pub fn column(&self) -> &'static str
    {   match self
        {   SortField::CreatedAt => "created_at"
          , SortField::Title => "title"
          , SortField::UpdatedAt => "updated_at"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder
{   Asc
  , Desc
}

/// Raw list-posts query
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PostsQuery
{   #[serde(default)]
    pub page: Option<u32>
  , #[serde(default)]
    pub limit: Option<u32>
  , #[serde(default)]
    pub category_id: Option<String>
  , #[serde(default)]
    pub search: Option<String>
  , #[serde(default, rename = "sortBy")]
    pub sort_by: Option<String>
  , #[serde(default)]
    pub order: Option<String>
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPostsQuery
{   pub page: u32
  , pub limit: u32
  , pub category_id: Option<Uuid>
  , pub search: Option<String>
  , pub sort_by: SortField
  , pub order: SortOrder
}

impl ValidatedPostsQuery
{   /// Rows skipped before this page
    pub fn offset(&self) -> u64
    {   u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Inclusive row range handed to the query layer
    pub fn range(&self) -> (u64, u64)
    {   let start = self.offset();
        (start, (start + u64::from(self.limit)).saturating_sub(1))
    }

    pub fn ascending(&self) -> bool
    {   self.order == SortOrder::Asc
    }
}

// ===== Validator =====

/// Collects field errors for one command
#[derive(Default)]
struct Report
{   errors: Vec<FieldError>
}

impl Report
{   fn push(&mut self, field: &str, message: impl Into<String>)
    {   self.errors.push(FieldError::new(field, message));
    }

    fn text(&mut self, field: &str, value: &str, min: usize, max: usize)
    {   let n = value.chars().count();
        if n < min
        {   self.push(field, format!(
              "must contain at least {} character(s)", min
            ));
        } else if n > max
        {   self.push(field, format!(
              "must contain at most {} character(s)", max
            ));
        }
    }

    fn required_text(
      &mut self
    , field: &str
    , value: Option<&str>
    , min: usize
    , max: usize
    )
    {   match value
        {   Some(v) => self.text(field, v, min, max)
          , None => self.push(field, "Required")
        }
    }

    /// Only the 36 character hyphenated form is accepted.
    fn uuid(&mut self, field: &str, value: &str) -> Option<Uuid>
    {   let parsed = Uuid::parse_str(value)
          .ok()
          .filter(|_| value.len() == HYPHENATED_UUID_LEN);
        match parsed
        {   Some(id) => Some(id)
          , None => {
              self.push(field, "Invalid uuid");
              None
            }
        }
    }

    fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationError>
    {   if self.errors.is_empty()
        {   Ok(value())
        } else
        {   debug!("Validation failed: {:?}", self.errors);
            Err(ValidationError { errors: self.errors })
        }
    }
}

/// Checks caller commands against [`ValidationLimits`]
#[derive(Debug, Clone, Default)]
pub struct CommandValidator
{   limits: ValidationLimits
}

impl CommandValidator
{   pub fn new(limits: ValidationLimits) -> Self
    {   CommandValidator { limits }
    }

    pub fn limits(&self) -> &ValidationLimits
    {   &self.limits
    }

    pub fn create_post(&self, cmd: &CreatePostCommand)
      -> Result<ValidatedPost, ValidationError>
    {   let l = &self.limits;
        let mut report = Report::default();
        report.text("title", &cmd.title, 1, l.max_title_chars);
        let category_id = report.uuid("category_id", &cmd.category_id);

        match cmd.mode
        {   PostMode::Auto => report.required_text(
              "prompt", cmd.prompt.as_deref(), 1, l.max_prompt_chars
            )
          , PostMode::Manual => report.required_text(
              "content", cmd.content.as_deref(), 1, l.max_content_chars
            )
        }

        report.finish(|| {
          let body = match cmd.mode
          {   PostMode::Auto => PostBody::Auto
              {   prompt: cmd.prompt.clone().unwrap_or_default()
                , length: cmd.size.as_deref()
                    .map(Length::from_label)
                    .unwrap_or_default()
              }
            , PostMode::Manual => PostBody::Manual
              {   content: cmd.content.clone().unwrap_or_default()
              }
          };
          ValidatedPost
          {   title: cmd.title.clone()
            , category_id: category_id.unwrap_or_default()
            , body
          }
        })
    }

    pub fn update_post(&self, cmd: &UpdatePostCommand)
      -> Result<ValidatedUpdate, ValidationError>
    {   let l = &self.limits;
        let mut report = Report::default();
        let id = report.uuid("id", &cmd.id);
        if let Some(title) = &cmd.title
        {   report.text("title", title, 1, l.max_title_chars);
        }
        if let Some(prompt) = &cmd.prompt
        {   report.text("prompt", prompt, 1, l.max_prompt_chars);
        }
        if let Some(content) = &cmd.content
        {   report.text("content", content, 1, l.max_content_chars);
        }
        let category_id = cmd.category_id
          .as_deref()
          .and_then(|c| report.uuid("category_id", c));

        report.finish(|| ValidatedUpdate
        {   id: id.unwrap_or_default()
          , title: cmd.title.clone()
          , prompt: cmd.prompt.clone()
          , length: cmd.size.as_deref().map(Length::from_label)
          , content: cmd.content.clone()
          , category_id
        })
    }

    pub fn delete(&self, cmd: &DeleteCommand) -> Result<Uuid, ValidationError>
    {   let mut report = Report::default();
        let id = report.uuid("id", &cmd.id);
        report.finish(|| id.unwrap_or_default())
    }

    pub fn create_category(&self, cmd: &CreateCategoryCommand)
      -> Result<CreateCategoryCommand, ValidationError>
    {   let l = &self.limits;
        let mut report = Report::default();
        if cmd.name.is_empty()
        {   report.push("name", "Name is required");
        } else if cmd.name.chars().count() > l.max_category_name_chars
        {   report.push("name", "Name is too long");
        }
        if cmd.description.chars().count() > l.max_category_description_chars
        {   report.push("description", format!(
              "Description cannot exceed {} characters",
              l.max_category_description_chars
            ));
        }
        report.finish(|| cmd.clone())
    }

    pub fn posts_query(&self, query: &PostsQuery)
      -> Result<ValidatedPostsQuery, ValidationError>
    {   let l = &self.limits;
        let mut report = Report::default();

        let page = query.page.unwrap_or(1);
        if page == 0
        {   report.push("page", "must be greater than 0");
        }
        let limit = query.limit.unwrap_or(10);
        if limit == 0
        {   report.push("limit", "must be greater than 0");
        } else if limit > l.max_page_limit
        {   report.push("limit", format!(
              "must be less than or equal to {}", l.max_page_limit
            ));
        }
        let category_id = query.category_id
          .as_deref()
          .and_then(|c| report.uuid("category_id", c));
        if let Some(search) = &query.search
        {   report.text("search", search, 1, l.max_search_chars);
        }
        let sort_by = match query.sort_by.as_deref()
        {   None => SortField::CreatedAt
          , Some(s) => SortField::parse(s).unwrap_or_else(|| {
              report.push(
                "sortBy",
                "expected one of 'created_at' | 'title' | 'updated_at'"
              );
              SortField::CreatedAt
            })
        };
        let order = match query.order.as_deref()
        {   None | Some("desc") => SortOrder::Desc
          , Some("asc") => SortOrder::Asc
          , Some(_) => {
              report.push("order", "expected one of 'asc' | 'desc'");
              SortOrder::Desc
            }
        };

        report.finish(|| ValidatedPostsQuery
        {   page
          , limit
          , category_id
          , search: query.search.clone()
          , sort_by
          , order
        })
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    const CATEGORY: &str = "4f1c1d3e-8a7b-4c2d-9e0f-123456789abc";

    fn validator() -> CommandValidator
    {   CommandValidator::default()
    }

    #[test]
    fn auto_post_ok()
    {   let cmd = CreatePostCommand::auto("Title", "Write about testing", "short", CATEGORY);
        let post = validator().create_post(&cmd).unwrap();
        assert_eq!(post.category_id.to_string(), CATEGORY);
        assert_eq!(
          post.body,
          PostBody::Auto
          {   prompt: "Write about testing".to_string()
            , length: Length::Short
          }
        );
    }

    #[test]
    fn every_bad_field_is_reported()
    {   let cmd = CreatePostCommand
        {   title: String::new()
          , category_id: "not-a-uuid".to_string()
          , mode: PostMode::Auto
          , prompt: Some("p".repeat(501))
          , size: None
          , content: None
        };
        let err = validator().create_post(&cmd).unwrap_err();
        assert_eq!(err.errors.len(), 3);
        assert!(err.has_field("title"));
        assert!(err.has_field("category_id"));
        assert_eq!(
          err.messages_for("prompt"),
          vec!["must contain at most 500 character(s)"]
        );
    }

    #[test]
    fn prompt_required_in_auto_mode()
    {   let mut cmd = CreatePostCommand::auto("T", "p", "long", CATEGORY);
        cmd.prompt = None;
        let err = validator().create_post(&cmd).unwrap_err();
        assert_eq!(err.messages_for("prompt"), vec!["Required"]);
    }

    #[test]
    fn manual_content_bounds_follow_limits()
    {   let ok = CreatePostCommand::manual("T", "c".repeat(5000), CATEGORY);
        assert!(validator().create_post(&ok).is_ok());

        let too_long = CreatePostCommand::manual("T", "c".repeat(5001), CATEGORY);
        assert!(validator().create_post(&too_long).is_err());

        let strict = CommandValidator::new(ValidationLimits
        {   max_content_chars: 1000
          , ..ValidationLimits::default()
        });
        let cmd = CreatePostCommand::manual("T", "c".repeat(1001), CATEGORY);
        assert!(strict.create_post(&cmd).unwrap_err().has_field("content"));
    }

    #[test]
    fn title_counts_chars_not_bytes()
    {   let cmd = CreatePostCommand::manual("é".repeat(200), "body", CATEGORY);
        assert!(validator().create_post(&cmd).is_ok());
    }

    #[test]
    fn unknown_size_becomes_medium()
    {   let cmd = CreatePostCommand::auto("T", "p", "enormous", CATEGORY);
        match validator().create_post(&cmd).unwrap().body
        {   PostBody::Auto { length, .. } => assert_eq!(length, Length::Medium)
          , other => panic!("unexpected body {:?}", other)
        }
    }

    #[test]
    fn update_checks_present_fields_only()
    {   let cmd = UpdatePostCommand
        {   id: CATEGORY.to_string()
          , title: Some("New".to_string())
          , ..UpdatePostCommand::default()
        };
        let up = validator().update_post(&cmd).unwrap();
        assert_eq!(up.title.as_deref(), Some("New"));
        assert_eq!(up.content, None);

        let bad = UpdatePostCommand
        {   id: "x".to_string()
          , content: Some(String::new())
          , category_id: Some("y".to_string())
          , ..UpdatePostCommand::default()
        };
        let err = validator().update_post(&bad).unwrap_err();
        assert!(err.has_field("id"));
        assert!(err.has_field("content"));
        assert!(err.has_field("category_id"));
    }

    #[test]
    fn delete_requires_uuid()
    {   assert!(validator().delete(&DeleteCommand { id: CATEGORY.into() }).is_ok());
        assert!(validator().delete(&DeleteCommand { id: "1".into() }).is_err());
    }

    #[test]
    fn only_hyphenated_uuids_accepted()
    {   let upper = CATEGORY.to_uppercase();
        assert!(validator().delete(&DeleteCommand { id: upper }).is_ok());
        for id in [
          "4f1c1d3e8a7b4c2d9e0f123456789abc"
        , "urn:uuid:4f1c1d3e-8a7b-4c2d-9e0f-123456789abc"
        , "{4f1c1d3e-8a7b-4c2d-9e0f-123456789abc}"
        ]
        {   let err = validator()
              .delete(&DeleteCommand { id: id.into() })
              .unwrap_err();
            assert_eq!(err.messages_for("id"), vec!["Invalid uuid"], "{}", id);
        }
        let cmd = CreatePostCommand::auto(
          "Title", "prompt", "short", "4f1c1d3e8a7b4c2d9e0f123456789abc"
        );
        assert!(validator().create_post(&cmd).unwrap_err().has_field("category_id"));
    }

    #[test]
    fn category_bounds()
    {   let ok = CreateCategoryCommand
        {   name: "Tech".to_string()
          , description: String::new()
        };
        assert!(validator().create_category(&ok).is_ok());

        let bad = CreateCategoryCommand
        {   name: String::new()
          , description: "d".repeat(251)
        };
        let err = validator().create_category(&bad).unwrap_err();
        assert_eq!(err.messages_for("name"), vec!["Name is required"]);
        assert!(err.has_field("description"));
    }

    #[test]
    fn posts_query_defaults_and_range()
    {   let q = validator().posts_query(&PostsQuery::default()).unwrap();
        assert_eq!((q.page, q.limit), (1, 10));
        assert_eq!(q.sort_by, SortField::CreatedAt);
        assert!(!q.ascending());
        assert_eq!(q.range(), (0, 9));

        let q = validator().posts_query(&PostsQuery
        {   page: Some(3)
          , limit: Some(20)
          , sort_by: Some("title".to_string())
          , order: Some("asc".to_string())
          , ..PostsQuery::default()
        }).unwrap();
        assert_eq!(q.offset(), 40);
        assert_eq!(q.range(), (40, 59));
        assert_eq!(q.sort_by.column(), "title");
        assert!(q.ascending());
    }

    #[test]
    fn posts_query_rejects_bad_values()
    {   let err = validator().posts_query(&PostsQuery
        {   page: Some(0)
          , limit: Some(101)
          , search: Some(String::new())
          , sort_by: Some("views".to_string())
          , order: Some("up".to_string())
          , ..PostsQuery::default()
        }).unwrap_err();
        for field in ["page", "limit", "search", "sortBy", "order"]
        {   assert!(err.has_field(field), "missing {}", field);
        }
    }

    #[test]
    fn hand_built_query_never_underflows()
    {   let q = ValidatedPostsQuery
        {   page: 0
          , limit: 10
          , category_id: None
          , search: None
          , sort_by: SortField::CreatedAt
          , order: SortOrder::Desc
        };
        assert_eq!(q.offset(), 0);
        assert_eq!(q.range(), (0, 9));

        let q = ValidatedPostsQuery { limit: 0, ..q };
        assert_eq!(q.range(), (0, 0));
    }
}
