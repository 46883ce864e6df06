//! Cache-key registry.
//!
//! Every cached read is keyed by a [`QueryTag`] plus optional parameters.
//! Read and write call sites share the tag constants, so an invalidation
//! can never miss its query over a mistyped string.

use sha2::{Digest, Sha256};
use std::fmt;

use crate::api::ListParams;

/// Registered cache tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryTag {
  Profile,
  MyShopProducts,
  Product,
  Categories,
  Bookings,
  Booking,
  Reservations,
  Reservation,
  MenuItems,
  FoodOrders,
  Offers,
  Acquisitions,
  Acquisition,
  Withdrawals,
  WalletBalance,
  Transactions,
  Transaction,
}

impl QueryTag {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Profile => "profile",
      Self::MyShopProducts => "my-shop-products",
      Self::Product => "product",
      Self::Categories => "categories",
      Self::Bookings => "bookings",
      Self::Booking => "booking",
      Self::Reservations => "reservations",
      Self::Reservation => "reservation",
      Self::MenuItems => "menu-items",
      Self::FoodOrders => "food-orders",
      Self::Offers => "offers",
      Self::Acquisitions => "acquisitions",
      Self::Acquisition => "acquisition",
      Self::Withdrawals => "withdrawals",
      Self::WalletBalance => "wallet-balance",
      Self::Transactions => "transactions",
      Self::Transaction => "transaction",
    }
  }
}

impl fmt::Display for QueryTag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A tag plus the parameters that distinguish one cached result from another.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
  tag: QueryTag,
  params: Vec<(String, String)>,
}

impl QueryKey {
  pub fn new(tag: QueryTag) -> Self {
    Self {
      tag,
      params: Vec::new(),
    }
  }

  pub fn with(mut self, name: &str, value: impl fmt::Display) -> Self {
    self.params.push((name.to_string(), value.to_string()));
    self
  }

  pub fn with_params(mut self, params: &ListParams) -> Self {
    self.params.extend(params.to_query());
    self
  }

  pub fn tag(&self) -> QueryTag {
    self.tag
  }

  /// Stable identity of the key, independent of parameter order.
  pub fn cache_hash(&self) -> String {
    let mut params = self.params.clone();
    params.sort();

    // Length prefixes keep `a=b`+`c` apart from `a`+`b=c`
    let mut input = self.tag.as_str().to_string();
    for (name, value) in &params {
      input.push_str(&format!("\n{}:{}{}:{}", name.len(), name, value.len(), value));
    }

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
  }
}

impl From<QueryTag> for QueryKey {
  fn from(tag: QueryTag) -> Self {
    Self::new(tag)
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.tag.as_str())?;
    for (i, (name, value)) in self.params.iter().enumerate() {
      let sep = if i == 0 { '?' } else { '&' };
      write!(f, "{}{}={}", sep, name, value)?;
    }
    Ok(())
  }
}

/// Which cache entries an invalidation marks stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidate {
  /// Every key carrying the tag, whatever its parameters.
  Tag(QueryTag),
  /// One exact key.
  Key(QueryKey),
  All,
}

impl Invalidate {
  pub(crate) fn matches(&self, tag: QueryTag, hash: &str) -> bool {
    match self {
      Self::Tag(t) => *t == tag,
      Self::Key(key) => key.cache_hash() == hash,
      Self::All => true,
    }
  }
}

impl From<QueryTag> for Invalidate {
  fn from(tag: QueryTag) -> Self {
    Self::Tag(tag)
  }
}

impl From<QueryKey> for Invalidate {
  fn from(key: QueryKey) -> Self {
    Self::Key(key)
  }
}
