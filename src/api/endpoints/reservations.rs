use crate::api::request::{Endpoint, ListParams, Request};
use crate::api::types::{Page, Reservation};

pub fn reservations(params: &ListParams) -> Endpoint<Page<Reservation>> {
  Endpoint::new(Request::get("/reservations/merchant").params(params))
}

pub fn reservation(id: &str) -> Endpoint<Reservation> {
  Endpoint::new(Request::get("/reservations").segment(id))
}

pub fn confirm_reservation(id: &str) -> Endpoint<Reservation> {
  Endpoint::new(Request::put("/reservations").segment(id).segment("confirm"))
}

pub fn cancel_reservation(id: &str) -> Endpoint<Reservation> {
  Endpoint::new(Request::put("/reservations").segment(id).segment("cancel"))
}
