//! Backend access: request descriptors, HTTP clients and response shapes.

pub mod client;
pub mod endpoints;
pub mod envelope;
pub mod error;
pub mod request;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{Api, ApiClient, AuthApi};
pub use envelope::{Envelope, Messages};
pub use error::{ApiError, ErrorBody};
pub use request::{Access, Endpoint, ListParams, ParamValue, Request};
