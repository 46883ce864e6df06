//! Error taxonomy for backend calls.

use serde::Deserialize;
use thiserror::Error;

use super::envelope::Messages;

/// Status reported for a forbidden response once it has been recoded.
pub const UNAUTHORIZED_STATUS: u16 = 401;

/// Error body returned by the backend.
///
/// Covers both the NestJS shape (`{ statusCode, message, error }`) and the
/// generic `{ message, error }` shape; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
  #[serde(rename = "statusCode", default)]
  pub status_code: Option<u16>,
  #[serde(default)]
  pub message: Option<Messages>,
  #[serde(default)]
  pub error: Option<String>,
}

impl ErrorBody {
  /// Parse an error body, falling back to an empty body for non-JSON payloads.
  pub fn from_slice(bytes: &[u8]) -> Self {
    serde_json::from_slice(bytes).unwrap_or_default()
  }
}

/// Failure of a backend call.
///
/// `Clone` so a single coalesced failure can be handed to every subscriber
/// of the same cache key; transport errors are therefore kept as text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
  /// No response was received (connect, timeout, TLS, body read).
  #[error("{message}")]
  Network { message: String },

  /// The authenticated client got a 403. Callers must re-authenticate.
  #[error("Unauthorized")]
  Unauthorized,

  /// Non-2xx response with whatever error body the backend sent.
  #[error("request failed with status {status}")]
  Http { status: u16, body: ErrorBody },

  /// 2xx response whose envelope carried `success: false`.
  #[error("{message}")]
  Rejected { message: Messages },

  /// 2xx response that did not match the expected payload type.
  #[error("failed to decode response: {0}")]
  Decode(String),

  /// Request body could not be serialized.
  #[error("failed to encode request body: {0}")]
  Encode(String),

  /// Session storage could not be read while attaching credentials.
  #[error("session unavailable: {0}")]
  Session(String),

  /// Request was dropped before a response arrived.
  #[error("request cancelled")]
  Cancelled,
}

impl ApiError {
  /// HTTP status as seen by callers. A recoded 403 reports 401.
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Unauthorized => Some(UNAUTHORIZED_STATUS),
      Self::Http { status, .. } => Some(*status),
      _ => None,
    }
  }

  /// Error list of the normalized unauthorized rejection.
  pub fn errors(&self) -> Vec<String> {
    match self {
      Self::Unauthorized => vec!["Unauthorized".to_string()],
      _ => Vec::new(),
    }
  }

  pub fn is_unauthorized(&self) -> bool {
    matches!(self, Self::Unauthorized)
  }

  /// The backend's error body, when a response with one was received.
  pub fn body(&self) -> Option<&ErrorBody> {
    match self {
      Self::Http { body, .. } => Some(body),
      _ => None,
    }
  }
}

impl From<reqwest::Error> for ApiError {
  fn from(e: reqwest::Error) -> Self {
    Self::Network {
      message: e.to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parses_nest_error_body() {
    let body = ErrorBody::from_slice(
      br#"{"statusCode":400,"message":["name should not be empty","price must be a number"],"error":"Bad Request"}"#,
    );

    assert_eq!(body.status_code, Some(400));
    assert_eq!(
      body.message,
      Some(Messages::Many(vec![
        "name should not be empty".to_string(),
        "price must be a number".to_string()
      ]))
    );
    assert_eq!(body.error.as_deref(), Some("Bad Request"));
  }

  #[test]
  fn test_non_json_body_is_empty() {
    assert_eq!(ErrorBody::from_slice(b"<html>502</html>"), ErrorBody::default());
  }

  #[test]
  fn test_unauthorized_shape() {
    let err = ApiError::Unauthorized;
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.errors(), vec!["Unauthorized".to_string()]);
    assert!(err.body().is_none());
  }
}
