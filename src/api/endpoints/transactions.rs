use crate::api::request::{Endpoint, ListParams, Request};
use crate::api::types::{Page, Transaction};

pub fn transactions(params: &ListParams) -> Endpoint<Page<Transaction>> {
  Endpoint::new(Request::get("/transactions").params(params))
}

pub fn transaction(id: &str) -> Endpoint<Transaction> {
  Endpoint::new(Request::get("/transactions").segment(id))
}
