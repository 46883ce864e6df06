use crate::api::request::{Endpoint, ListParams, Request};
use crate::api::types::{Booking, BookingStatus, Page, StatusUpdate};

pub fn bookings(params: &ListParams) -> Endpoint<Page<Booking>> {
  Endpoint::new(Request::get("/bookings/merchant").params(params))
}

pub fn booking(id: &str) -> Endpoint<Booking> {
  Endpoint::new(Request::get("/bookings").segment(id))
}

pub fn update_booking_status(id: &str, status: BookingStatus) -> Endpoint<Booking> {
  Endpoint::new(
    Request::put("/bookings")
      .segment(id)
      .segment("status")
      .json(&StatusUpdate { status }),
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::request::Body;

  #[test]
  fn test_status_update_body() {
    let request = update_booking_status("b1", BookingStatus::Confirmed).into_request();
    assert_eq!(request.to_string(), "PUT /bookings/b1/status");
    assert_eq!(
      request.body,
      Some(Body::Json(serde_json::json!({"status": "confirmed"})))
    );
  }
}
