//! One function per backend route.
//!
//! Each function only describes the call: method, path, query, body and
//! whether the session credential is required. Nothing here performs I/O;
//! pass the result to [`ApiClient::call`](crate::api::ApiClient::call).

pub mod acquisitions;
pub mod auth;
pub mod bookings;
pub mod food_mart;
pub mod offers;
pub mod products;
pub mod reservations;
pub mod transactions;
pub mod withdrawals;
