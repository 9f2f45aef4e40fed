use std::fmt;
use std::time::Duration;
use log::{debug, error};
use serde::{Deserialize, Serialize};

/// Stable failure categories a caller can branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind
{   Network
  , Auth
  , RateLimit
  , InvalidResponse
  , Unknown
}

impl ErrorKind
{   /// User-facing text for this category
    pub fn user_message(&self) -> &'static str
    {   match self
        {   ErrorKind::Network =>
              "Network error occurred while contacting the AI service. \
               Please try again."
          , ErrorKind::Auth =>
              "Authentication failed. Please check your API credentials."
          , ErrorKind::RateLimit =>
              "Rate limit exceeded. Please try again later."
          , ErrorKind::InvalidResponse =>
              "Failed to process the AI response. Please try again."
          , ErrorKind::Unknown =>
              "An unexpected error occurred. Please try again later."
        }
    }
}

impl fmt::Display for ErrorKind
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   let name = match self
        {   ErrorKind::Network => "network"
          , ErrorKind::Auth => "auth"
          , ErrorKind::RateLimit => "rate_limit"
          , ErrorKind::InvalidResponse => "invalid_response"
          , ErrorKind::Unknown => "unknown"
        };
        f.write_str(name)
    }
}

/// Keyword sets tested in order; the first hit wins.
const CLASSIFICATION_RULES: &[(ErrorKind, &[&str])] = &[
    ( ErrorKind::Network
    , &[ "econnrefused"
       , "econnreset"
       , "etimedout"
       , "fetch failed"
       , "network timeout"
       ]
    )
  , ( ErrorKind::Auth
    , &[ "unauthorized"
       , "invalid token"
       , "authentication failed"
       , "401"
       , "403"
       ]
    )
  , ( ErrorKind::RateLimit
    , &["rate limit", "too many requests", "429"]
    )
  , ( ErrorKind::InvalidResponse
    , &["invalid response format"]
    )
];

/// Terminal, user-facing failure of a generation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedError
{   pub kind: ErrorKind
  , pub message: String
}

impl ClassifiedError
{   pub fn new(kind: ErrorKind) -> Self
    {   ClassifiedError
        {   kind
          , message: kind.user_message().to_string()
        }
    }
}

impl fmt::Display for ClassifiedError
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   write!(f, "{} ({})", self.message, self.kind)
    }
}

impl std::error::Error for ClassifiedError {}

/// Map the message of an arbitrary error onto an [`ErrorKind`].
pub fn classify_message(message: &str) -> ErrorKind
{   let lowered = message.to_lowercase();
    CLASSIFICATION_RULES
      .iter()
      .find(|(_, needles)| {
        needles.iter().any(|n| lowered.contains(n))
      })
      .map(|(kind, _)| *kind)
      .unwrap_or(ErrorKind::Unknown)
}

/// Classify a failure. The original error is logged here and
/// goes no further.
pub fn classify<E>(err: &E) -> ClassifiedError
where
    E: fmt::Display + ?Sized
{   let original = err.to_string();
    let kind = classify_message(&original);
    error!("Generation failed [{}]: {}", kind, original);
    ClassifiedError::new(kind)
}

/// Failure raised between issuing the remote call and producing
/// a result. Never handed to callers directly; it goes through
/// [`classify`] first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError
{   /// Connection level failure (refused, reset, dns, tls)
    Http(String)
  , /// Provider answered with a non-2xx status. `body` is kept
    /// for logging only.
    Status
    {   code: u16
      , reason: String
      , body: String
    }
  , /// Caller supplied deadline elapsed
    Timeout(Duration)
  , /// Caller cancelled the request
    Cancelled
  , /// Body could not be read or decoded as JSON
    Decode(String)
  , /// Body was JSON but no usable text could be extracted
    InvalidResponse(NormalizeError)
}

impl fmt::Display for TransportError
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   match self
        {   TransportError::Http(msg) => {
              write!(f, "fetch failed: {}", msg)
            }
          // body stays out: its text must not steer classification
          , TransportError::Status { code, reason, .. } => {
              write!(f, "Provider API error: {} {}", code, reason)
            }
          , TransportError::Timeout(after) => {
              write!(f,
                "network timeout after {} ms",
                after.as_millis()
              )
            }
          , TransportError::Cancelled => {
              write!(f, "fetch failed: request cancelled by caller")
            }
          , TransportError::Decode(msg) => {
              write!(f, "Invalid response format: {}", msg)
            }
          , TransportError::InvalidResponse(inner) => {
              write!(f, "{}", inner)
            }
        }
    }
}

impl std::error::Error for TransportError {}

impl From<NormalizeError> for TransportError
{   fn from(e: NormalizeError) -> Self
    {   TransportError::InvalidResponse(e)
    }
}

impl From<reqwest::Error> for TransportError
{   fn from(e: reqwest::Error) -> Self
    {   debug!("Mapping reqwest error: {:?}", e);
        // the url carries a port number that could look like a status code
        let e = e.without_url();
        if e.is_timeout()
        {   TransportError::Http(format!("network timeout: {}", e))
        } else if e.is_decode()
        {   TransportError::Decode(e.to_string())
        } else
        {   TransportError::Http(e.to_string())
        }
    }
}

/// Why a provider payload could not be turned into a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError
{   NotAnObject
  , MissingContent
  , MissingText
}

impl fmt::Display for NormalizeError
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.write_str("Invalid response format: ")?;
        match self
        {   NormalizeError::NotAnObject => {
              f.write_str("Response must be an object")
            }
          , NormalizeError::MissingContent => {
              f.write_str("Missing content in response")
            }
          , NormalizeError::MissingText => {
              f.write_str("Missing or invalid text field")
            }
        }
    }
}

impl std::error::Error for NormalizeError {}

/// One violated field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError
{   pub field: String
  , pub message: String
}

impl FieldError
{   pub fn new(
      field: impl Into<String>
    , message: impl Into<String>
    ) -> Self
    {   FieldError
        {   field: field.into()
          , message: message.into()
        }
    }
}

/// Caller input rejected before any remote call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError
{   pub errors: Vec<FieldError>
}

impl ValidationError
{   /// Messages for a single field, in the order they were found
    pub fn messages_for(&self, field: &str) -> Vec<&str>
    {   self.errors
          .iter()
          .filter(|e| e.field == field)
          .map(|e| e.message.as_str())
          .collect()
    }

    pub fn has_field(&self, field: &str) -> bool
    {   self.errors.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationError
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   write!(f, "Invalid input data")?;
        for (i, e) in self.errors.iter().enumerate()
        {   let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}: {}", sep, e.field, e.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
