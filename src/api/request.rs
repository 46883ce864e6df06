//! Request descriptors built by endpoint functions.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// Whether a route needs the session credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
  Public,
  Authenticated,
}

/// Request body as captured at build time.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
  Json(Value),
  /// Serialization failed; reported by the client as an encode error.
  Invalid(String),
}

/// Description of one backend call: method, path, query and body.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
  pub method: Method,
  pub path: String,
  pub query: Vec<(String, String)>,
  pub body: Option<Body>,
  pub access: Access,
  /// Set when a path segment could not be encoded; the client refuses to
  /// send the request.
  pub path_error: Option<String>,
}

impl Request {
  pub fn new(method: Method, path: impl Into<String>) -> Self {
    Self {
      method,
      path: path.into(),
      query: Vec::new(),
      body: None,
      access: Access::Authenticated,
      path_error: None,
    }
  }

  pub fn get(path: impl Into<String>) -> Self {
    Self::new(Method::GET, path)
  }

  pub fn post(path: impl Into<String>) -> Self {
    Self::new(Method::POST, path)
  }

  pub fn put(path: impl Into<String>) -> Self {
    Self::new(Method::PUT, path)
  }

  pub fn delete(path: impl Into<String>) -> Self {
    Self::new(Method::DELETE, path)
  }

  /// Append `value` as exactly one percent-encoded path segment.
  ///
  /// Empty and dot-only values would address a different route once the
  /// URL is normalized, so they poison the request instead.
  pub fn segment(mut self, value: &str) -> Self {
    if value.is_empty() || value.chars().all(|c| c == '.') {
      self.path_error = Some(format!("invalid path segment {:?}", value));
    }
    self.path.push('/');
    self.path.push_str(&urlencoding::encode(value));
    self
  }

  /// Mark the route as callable without a session.
  pub fn public(mut self) -> Self {
    self.access = Access::Public;
    self
  }

  pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
    self.body = Some(match serde_json::to_value(body) {
      Ok(value) => Body::Json(value),
      Err(e) => Body::Invalid(e.to_string()),
    });
    self
  }

  pub fn params(mut self, params: &ListParams) -> Self {
    self.query.extend(params.to_query());
    self
  }
}

impl fmt::Display for Request {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.method, self.path)
  }
}

/// A [`Request`] tagged with the payload type its response decodes into.
#[derive(Debug, Clone)]
pub struct Endpoint<T> {
  request: Request,
  _response: PhantomData<fn() -> T>,
}

impl<T> Endpoint<T> {
  pub fn new(request: Request) -> Self {
    Self {
      request,
      _response: PhantomData,
    }
  }

  pub fn request(&self) -> &Request {
    &self.request
  }

  pub fn into_request(self) -> Request {
    self.request
  }
}

/// A query parameter value. Lists serialize as repeated keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
  One(String),
  Many(Vec<String>),
}

impl From<&str> for ParamValue {
  fn from(s: &str) -> Self {
    Self::One(s.to_string())
  }
}

impl From<String> for ParamValue {
  fn from(s: String) -> Self {
    Self::One(s)
  }
}

impl From<u32> for ParamValue {
  fn from(n: u32) -> Self {
    Self::One(n.to_string())
  }
}

impl From<Vec<String>> for ParamValue {
  fn from(v: Vec<String>) -> Self {
    Self::Many(v)
  }
}

impl From<&[&str]> for ParamValue {
  fn from(v: &[&str]) -> Self {
    Self::Many(v.iter().map(|s| s.to_string()).collect())
  }
}

/// Pagination and filter parameters for list routes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
  pub page: Option<u32>,
  pub limit: Option<u32>,
  filters: Vec<(String, ParamValue)>,
}

impl ListParams {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn page(page: u32, limit: u32) -> Self {
    Self {
      page: Some(page),
      limit: Some(limit),
      filters: Vec::new(),
    }
  }

  /// Add a filter. Setting the same key again replaces the earlier value.
  pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
    self.filters.retain(|(k, _)| k != key);
    self.filters.push((key.to_string(), value.into()));
    self
  }

  pub fn is_empty(&self) -> bool {
    self.page.is_none() && self.limit.is_none() && self.filters.is_empty()
  }

  /// Flatten into query pairs; `page` and `limit` first, then filters in
  /// insertion order, list values as one pair per element.
  pub fn to_query(&self) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    if let Some(page) = self.page {
      pairs.push(("page".to_string(), page.to_string()));
    }
    if let Some(limit) = self.limit {
      pairs.push(("limit".to_string(), limit.to_string()));
    }
    for (key, value) in &self.filters {
      match value {
        ParamValue::One(v) => pairs.push((key.clone(), v.clone())),
        ParamValue::Many(vs) => pairs.extend(vs.iter().map(|v| (key.clone(), v.clone()))),
      }
    }
    pairs
  }
}
