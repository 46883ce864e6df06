//! Client-side query cache.
//!
//! This module provides:
//! - A process-wide [`QueryClient`] that coalesces concurrent reads of a key
//!   into one request and tracks staleness and invalidation
//! - [`Query`] observers with enable/stale/keep-previous/focus/select options
//! - [`Mutation`] writes that toast, invalidate and navigate on success and
//!   roll back and toast on failure
//! - The [`QueryTag`] registry shared by reads and invalidations

mod client;
mod key;
mod mutation;
mod query;

pub use client::{EntryStatus, QueryClient};
pub use key::{Invalidate, QueryKey, QueryTag};
pub use mutation::Mutation;
pub use query::{Query, QueryOptions, QueryStatus};
