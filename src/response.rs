//! Uniform response envelope handed back to the presentation layer

use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::error::{ClassifiedError, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T>
{   pub success: bool
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>
  , pub status: u16
}

impl<T> ApiResponse<T>
{   pub fn success(data: T) -> Self
    {   ApiResponse::with_status(data, 200)
    }

    pub fn created(data: T) -> Self
    {   ApiResponse::with_status(data, 201)
    }

    pub fn with_status(data: T, status: u16) -> Self
    {   ApiResponse
        {   success: true
          , data: Some(data)
          , error: None
          , details: None
          , status
        }
    }

    pub fn error(
      error: impl Into<String>
    , status: u16
    , details: Option<Value>
    ) -> Self
    {   ApiResponse
        {   success: false
          , data: None
          , error: Some(error.into())
          , details
          , status
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self
    {   ApiResponse::error(error, 400, None)
    }

    pub fn unauthorized() -> Self
    {   ApiResponse::error("Unauthorized", 401, None)
    }

    pub fn forbidden(error: impl Into<String>) -> Self
    {   ApiResponse::error(error, 403, None)
    }

    pub fn not_found(error: impl Into<String>) -> Self
    {   ApiResponse::error(error, 404, None)
    }

    pub fn internal_error(error: impl Into<String>) -> Self
    {   ApiResponse::error(error, 500, None)
    }

    /// 400 with one entry per violated field in `details`
    pub fn validation_error(err: &ValidationError) -> Self
    {   let details = serde_json::to_value(&err.errors).ok();
        ApiResponse::error("Invalid input data", 400, details)
    }

    /// 500 carrying the user-facing message; `details.kind` lets
    /// the caller branch without parsing text.
    pub fn generation_failed(err: &ClassifiedError) -> Self
    {   let details = serde_json::json!({ "kind": err.kind });
        ApiResponse::error(err.message.clone(), 500, Some(details))
    }

    pub fn is_success(&self) -> bool
    {   self.success
    }
}
