//! Wallet balance and payouts.

use std::time::Duration;

use crate::api::endpoints::withdrawals as endpoints;
use crate::api::types::{Page, WalletBalance, Withdrawal, WithdrawalRequest};
use crate::api::ListParams;
use crate::cache::{Mutation, Query, QueryKey, QueryTag};
use crate::context::AdminContext;

use super::{mutation, query};

pub fn withdrawals(ctx: &AdminContext, params: ListParams) -> Query<Page<Withdrawal>> {
  let key = QueryKey::new(QueryTag::Withdrawals).with_params(&params);
  query(ctx, key, move || endpoints::withdrawals(&params)).keep_previous_data(true)
}

pub fn wallet_balance(ctx: &AdminContext) -> Query<WalletBalance> {
  query(ctx, QueryKey::new(QueryTag::WalletBalance), endpoints::wallet_balance)
    .with_stale_time(Duration::from_secs(30))
}

/// A payout moves money out of the wallet and shows up as a transaction.
pub fn request_withdrawal(ctx: &AdminContext) -> Mutation<WithdrawalRequest, Withdrawal> {
  mutation(ctx, |request: WithdrawalRequest| endpoints::request_withdrawal(&request))
    .invalidates(QueryTag::Withdrawals)
    .invalidates(QueryTag::WalletBalance)
    .invalidates(QueryTag::Transactions)
    .success_message("Withdrawal requested")
    .error_fallback("Could not request withdrawal")
}
