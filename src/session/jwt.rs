//! Expiry check for JWT session tokens.
//!
//! Only the `exp` claim is read; signatures are the backend's concern.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Deserialize)]
struct Claims {
  /// NumericDate: seconds, possibly fractional.
  exp: Option<f64>,
}

/// Expiry time encoded in the token, if it is a JWT carrying `exp`.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
  let payload = token.split('.').nth(1)?;
  let bytes = URL_SAFE_NO_PAD
    .decode(payload.trim_end_matches('='))
    .ok()?;
  let claims: Claims = serde_json::from_slice(&bytes).ok()?;
  from_numeric_date(claims.exp?)
}

fn from_numeric_date(exp: f64) -> Option<DateTime<Utc>> {
  if !exp.is_finite() {
    return None;
  }
  let secs = exp.floor();
  let nanos = ((exp - secs) * 1e9) as u32;
  DateTime::from_timestamp(secs as i64, nanos)
}

/// Whether the token is known to be expired at `now`.
///
/// Tokens without a readable `exp` are not considered expired.
pub fn is_expired(token: &str, now: DateTime<Utc>) -> bool {
  token_expiry(token).is_some_and(|exp| exp <= now)
}

#[cfg(test)]
pub(crate) fn encode_test_token(exp: i64) -> String {
  encode_test_token_raw(&exp.to_string())
}

#[cfg(test)]
fn encode_test_token_raw(exp: &str) -> String {
  let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
  let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"m-1","exp":{}}}"#, exp));
  format!("{}.{}.signature", header, payload)
}
