//! HTTP client factory.
//!
//! [`Api`] talks to the backend anonymously. [`AuthApi`] reads the session
//! token on every call, attaches it under the configured header and recodes
//! a 403 as [`ApiError::Unauthorized`]. [`ApiClient`] dispatches a
//! [`Request`] to one or the other according to its [`Access`].

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::config::ApiConfig;
use crate::session::Session;

use super::envelope::Envelope;
use super::error::{ApiError, ErrorBody};
use super::request::{Access, Body, Endpoint, Request};

/// Status and body of a completed exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
  pub status: u16,
  pub body: Vec<u8>,
}

/// How a 403 from the backend is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Forbidden {
  PassThrough,
  Unauthorized,
}

/// Anonymous client bound to the base URL.
#[derive(Clone)]
pub struct Api {
  http: reqwest::Client,
  base_url: Url,
}

impl Api {
  pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let http = reqwest::Client::builder()
      .default_headers(headers)
      .timeout(config.timeout())
      .build()?;

    Ok(Self {
      http,
      base_url: parse_base_url(&config.base_url)?,
    })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  fn url(&self, path: &str) -> Result<Url, ApiError> {
    self
      .base_url
      .join(path.trim_start_matches('/'))
      .map_err(|e| ApiError::Encode(format!("invalid path {}: {}", path, e)))
  }

  fn build(&self, request: &Request) -> Result<RequestBuilder, ApiError> {
    if let Some(e) = &request.path_error {
      return Err(ApiError::Encode(e.clone()));
    }

    let mut builder = self
      .http
      .request(request.method.clone(), self.url(&request.path)?);

    if !request.query.is_empty() {
      builder = builder.query(&request.query);
    }

    match &request.body {
      Some(Body::Json(value)) => builder = builder.json(value),
      Some(Body::Invalid(e)) => return Err(ApiError::Encode(e.clone())),
      None => {}
    }

    Ok(builder)
  }

  async fn execute(builder: RequestBuilder) -> Result<RawResponse, ApiError> {
    let response = builder.send().await?;
    let status = response.status().as_u16();
    let body = response.bytes().await?.to_vec();
    Ok(RawResponse { status, body })
  }

  pub async fn send(&self, request: &Request) -> Result<RawResponse, ApiError> {
    let raw = Self::execute(self.build(request)?).await?;
    check_status(raw, Forbidden::PassThrough)
  }
}

/// Client that attaches the session token.
#[derive(Clone)]
pub struct AuthApi {
  api: Api,
  session: Session,
  header: HeaderName,
}

impl AuthApi {
  pub fn new(api: Api, session: Session, header: &str) -> Result<Self, ApiError> {
    let header = HeaderName::from_bytes(header.as_bytes())
      .map_err(|e| ApiError::Encode(format!("invalid auth header name {}: {}", header, e)))?;
    Ok(Self {
      api,
      session,
      header,
    })
  }

  pub async fn send(&self, request: &Request) -> Result<RawResponse, ApiError> {
    let mut builder = self.api.build(request)?;

    let token = self
      .session
      .token()
      .map_err(|e| ApiError::Session(e.to_string()))?;

    match token {
      Some(token) => {
        let value = HeaderValue::from_str(&token)
          .map_err(|e| ApiError::Session(format!("token is not a valid header value: {}", e)))?;
        builder = builder.header(self.header.clone(), value);
      }
      None => debug!(%request, "no session token, request goes out anonymous"),
    }

    let raw = Api::execute(builder).await?;
    check_status(raw, Forbidden::Unauthorized)
  }
}

fn check_status(raw: RawResponse, forbidden: Forbidden) -> Result<RawResponse, ApiError> {
  let status = StatusCode::from_u16(raw.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
  if status.is_success() {
    return Ok(raw);
  }

  if status == StatusCode::FORBIDDEN && forbidden == Forbidden::Unauthorized {
    warn!("forbidden response, session must re-authenticate");
    return Err(ApiError::Unauthorized);
  }

  Err(ApiError::Http {
    status: raw.status,
    body: ErrorBody::from_slice(&raw.body),
  })
}

/// Base URLs are treated as directories so relative joins keep their path.
fn parse_base_url(base: &str) -> Result<Url, ApiError> {
  let base = if base.ends_with('/') {
    base.to_string()
  } else {
    format!("{}/", base)
  };
  Url::parse(&base).map_err(|e| ApiError::Encode(format!("invalid base URL {}: {}", base, e)))
}

/// Dispatches requests to the anonymous or the authenticated client.
#[derive(Clone)]
pub struct ApiClient {
  api: Api,
  auth: AuthApi,
}

impl ApiClient {
  pub fn new(config: &ApiConfig, session: Session) -> Result<Self, ApiError> {
    let api = Api::new(config)?;
    let auth = AuthApi::new(api.clone(), session, &config.auth_header)?;
    Ok(Self { api, auth })
  }

  pub fn api(&self) -> &Api {
    &self.api
  }

  pub fn auth_api(&self) -> &AuthApi {
    &self.auth
  }

  pub async fn send(&self, request: &Request) -> Result<RawResponse, ApiError> {
    debug!(%request, query = ?request.query, "dispatching request");
    match request.access {
      Access::Public => self.api.send(request).await,
      Access::Authenticated => self.auth.send(request).await,
    }
  }

  /// Send an endpoint's request and parse the response envelope.
  pub async fn call<T: DeserializeOwned>(&self, endpoint: Endpoint<T>) -> Result<Envelope<T>, ApiError> {
    let raw = self.send(endpoint.request()).await?;
    Envelope::from_slice(&raw.body)
  }
}
