use crate::api::request::{Endpoint, ListParams, Request};
use crate::api::types::{Page, WalletBalance, Withdrawal, WithdrawalRequest};

pub fn withdrawals(params: &ListParams) -> Endpoint<Page<Withdrawal>> {
  Endpoint::new(Request::get("/withdrawals").params(params))
}

pub fn request_withdrawal(request: &WithdrawalRequest) -> Endpoint<Withdrawal> {
  Endpoint::new(Request::post("/withdrawals").json(request))
}

pub fn wallet_balance() -> Endpoint<WalletBalance> {
  Endpoint::new(Request::get("/wallet/balance"))
}
