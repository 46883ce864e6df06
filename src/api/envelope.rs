//! Discriminated response envelope.
//!
//! The backend wraps most payloads as `{ success, data, message }`. Responses
//! are parsed into [`Envelope`] once, at the client boundary, so consumers
//! match on a variant instead of probing optional fields.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::error::ApiError;

/// A single message or a list of messages (validation errors).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Messages {
  One(String),
  Many(Vec<String>),
}

impl Messages {
  /// Non-empty messages in order.
  pub fn to_vec(&self) -> Vec<String> {
    match self {
      Self::One(m) => vec![m.clone()],
      Self::Many(ms) => ms.clone(),
    }
    .into_iter()
    .filter(|m| !m.trim().is_empty())
    .collect()
  }

  pub fn is_empty(&self) -> bool {
    self.to_vec().is_empty()
  }
}

impl fmt::Display for Messages {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.to_vec().join("; "))
  }
}

impl From<&str> for Messages {
  fn from(s: &str) -> Self {
    Self::One(s.to_string())
  }
}

/// Parsed backend response.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
  Success { payload: T, message: Option<String> },
  Failure { message: Messages },
}

impl<T: DeserializeOwned> Envelope<T> {
  /// Parse a 2xx response body.
  ///
  /// - `success: false` becomes [`Envelope::Failure`]
  /// - `success: true` takes the payload from `data`
  /// - without a `success` flag, `data` is used when present, else the whole body
  ///
  /// A missing payload is decoded from `null`, so `()`, `Option<_>` and
  /// `Value` payloads accept empty responses.
  pub fn from_slice(bytes: &[u8]) -> Result<Self, ApiError> {
    let value: Value = if bytes.iter().all(u8::is_ascii_whitespace) {
      Value::Null
    } else {
      serde_json::from_slice(bytes).map_err(|e| ApiError::Decode(e.to_string()))?
    };
    Self::from_value(value)
  }

  pub fn from_value(value: Value) -> Result<Self, ApiError> {
    let Value::Object(mut map) = value else {
      return Ok(Self::Success {
        payload: decode(value)?,
        message: None,
      });
    };

    let message = map.get("message").and_then(Value::as_str).map(String::from);

    match map.get("success").and_then(Value::as_bool) {
      Some(false) => {
        let message = map
          .remove("message")
          .and_then(|m| serde_json::from_value::<Messages>(m).ok())
          .filter(|m| !m.is_empty())
          .unwrap_or_else(|| Messages::from("Request failed"));
        Ok(Self::Failure { message })
      }
      Some(true) => Ok(Self::Success {
        payload: decode(map.remove("data").unwrap_or(Value::Null))?,
        message,
      }),
      None => {
        let payload = match map.remove("data") {
          Some(data) => decode(data)?,
          None => decode(Value::Object(map))?,
        };
        Ok(Self::Success { payload, message })
      }
    }
  }
}

impl<T> Envelope<T> {
  pub fn is_success(&self) -> bool {
    matches!(self, Self::Success { .. })
  }

  pub fn payload(&self) -> Option<&T> {
    match self {
      Self::Success { payload, .. } => Some(payload),
      Self::Failure { .. } => None,
    }
  }

  /// Turn a failure envelope into [`ApiError::Rejected`].
  pub fn into_result(self) -> Result<T, ApiError> {
    match self {
      Self::Success { payload, .. } => Ok(payload),
      Self::Failure { message } => Err(ApiError::Rejected { message }),
    }
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
    match self {
      Self::Success { payload, message } => Envelope::Success {
        payload: f(payload),
        message,
      },
      Self::Failure { message } => Envelope::Failure { message },
    }
  }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
  serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, PartialEq, Deserialize)]
  struct Item {
    id: String,
  }

  #[test]
  fn test_success_with_data() {
    let env: Envelope<Item> =
      Envelope::from_slice(br#"{"success":true,"message":"ok","data":{"id":"p1"}}"#).unwrap();

    assert_eq!(
      env,
      Envelope::Success {
        payload: Item {
          id: "p1".to_string()
        },
        message: Some("ok".to_string()),
      }
    );
  }

  #[test]
  fn test_failure_with_message_list() {
    let env: Envelope<Item> =
      Envelope::from_slice(br#"{"success":false,"message":["a","b"]}"#).unwrap();

    assert_eq!(
      env.into_result(),
      Err(ApiError::Rejected {
        message: Messages::Many(vec!["a".to_string(), "b".to_string()])
      })
    );
  }

  #[test]
  fn test_failure_without_message_gets_default() {
    let env: Envelope<Item> = Envelope::from_slice(br#"{"success":false}"#).unwrap();
    assert_eq!(
      env,
      Envelope::Failure {
        message: Messages::from("Request failed")
      }
    );
  }

  #[test]
  fn test_bare_body_without_flag() {
    let env: Envelope<Item> = Envelope::from_slice(br#"{"id":"p2"}"#).unwrap();
    assert_eq!(env.payload().map(|i| i.id.as_str()), Some("p2"));
  }

  #[test]
  fn test_empty_body_decodes_unit() {
    let env: Envelope<()> = Envelope::from_slice(b"").unwrap();
    assert!(env.is_success());

    let env: Envelope<()> = Envelope::from_slice(br#"{"success":true}"#).unwrap();
    assert!(env.is_success());
  }

  #[test]
  fn test_payload_mismatch_is_decode_error() {
    let res: Result<Envelope<Item>, _> = Envelope::from_slice(br#"{"success":true,"data":[1]}"#);
    assert!(matches!(res, Err(ApiError::Decode(_))));
  }

  #[test]
  fn test_messages_skip_blank_entries() {
    let m = Messages::Many(vec!["a".to_string(), "  ".to_string()]);
    assert_eq!(m.to_vec(), vec!["a".to_string()]);
    assert!(Messages::from("").is_empty());
  }
}
