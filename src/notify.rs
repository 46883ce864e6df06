//! User-facing notifications and navigation, plus the error normalization
//! helper that turns any [`ApiError`] into toast messages.

use crate::api::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
  Success,
  Error,
}

/// Sink for toast notifications.
pub trait Notifier: Send + Sync {
  fn notify(&self, level: Level, message: &str);

  fn success(&self, message: &str) {
    self.notify(Level::Success, message);
  }

  fn error(&self, message: &str) {
    self.notify(Level::Error, message);
  }
}

/// Route changes requested by mutations after a successful write.
pub trait Navigator: Send + Sync {
  fn navigate(&self, route: &str);
}

/// Messages to show for an error, in order.
///
/// Precedence when the backend answered:
/// 1. `message` as a list: one entry per element
/// 2. `message` as a string
/// 3. `error`
/// 4. `fallback`
///
/// Without a response the error's own text wins, then `fallback`. The
/// recoded unauthorized rejection carries neither and yields `fallback`.
pub fn error_messages(error: &ApiError, fallback: &str) -> Vec<String> {
  match error {
    ApiError::Http { body, .. } => {
      if let Some(messages) = body.message.as_ref().map(|m| m.to_vec()) {
        if !messages.is_empty() {
          return messages;
        }
      }
      match body.error.as_deref().map(str::trim) {
        Some(e) if !e.is_empty() => vec![e.to_string()],
        _ => vec![fallback.to_string()],
      }
    }
    ApiError::Rejected { message } => {
      let messages = message.to_vec();
      if messages.is_empty() {
        vec![fallback.to_string()]
      } else {
        messages
      }
    }
    ApiError::Unauthorized | ApiError::Decode(_) => vec![fallback.to_string()],
    ApiError::Network { message } if message.trim().is_empty() => vec![fallback.to_string()],
    other => vec![other.to_string()],
  }
}

/// Emit one error notification per normalized message.
pub fn notify_error(notifier: &dyn Notifier, error: &ApiError, fallback: &str) {
  for message in error_messages(error, fallback) {
    notifier.error(&message);
  }
}
