//! Typed API client and query cache for the storedesk merchant admin.
//!
//! The crate is layered the same way a request travels:
//! - [`api`]: endpoint descriptors, the anonymous/authenticated HTTP clients
//!   and the response envelope
//! - [`cache`]: the process-wide [`cache::QueryClient`], query observers and
//!   mutations with their success/error side effects
//! - [`session`]: persisted token, user projection and one-time flow tokens
//! - [`hooks`]: per-domain queries and mutations bound to registered cache keys

pub mod api;
pub mod cache;
pub mod config;
pub mod context;
pub mod hooks;
pub mod notify;
pub mod session;

pub use context::AdminContext;
