use crate::api::endpoints::transactions as endpoints;
use crate::api::types::{Page, Transaction};
use crate::api::ListParams;
use crate::cache::{Query, QueryKey, QueryTag};
use crate::context::AdminContext;

use super::query;

pub fn transactions(ctx: &AdminContext, params: ListParams) -> Query<Page<Transaction>> {
  let key = QueryKey::new(QueryTag::Transactions).with_params(&params);
  query(ctx, key, move || endpoints::transactions(&params)).keep_previous_data(true)
}

pub fn transaction(ctx: &AdminContext, id: Option<String>) -> Query<Transaction> {
  let key = QueryKey::new(QueryTag::Transaction).with("id", id.as_deref().unwrap_or_default());
  let enabled = id.is_some();
  query(ctx, key, move || {
    endpoints::transaction(id.as_deref().unwrap_or_default())
  })
  .enabled(enabled)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::testing::serve;
  use crate::context::testing::context;

  #[tokio::test]
  async fn test_filters_travel_in_query_string() {
    let server = serve(vec![(
      200,
      r#"{"success":true,"data":{"docs":[{"_id":"t1","amount":40,"type":"credit"}],"totalDocs":1}}"#,
    )])
    .await;
    let (ctx, _) = context(&server.base_url);

    let params = ListParams::page(2, 10).with("type", vec!["credit".to_string(), "refund".to_string()]);
    let mut query = transactions(&ctx, params);
    query.fetch();
    query.settle().await;

    let page = query.data().unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].kind, "credit");
    assert_eq!(
      server.requests()[0].request_line(),
      "GET /transactions?page=2&limit=10&type=credit&type=refund HTTP/1.1"
    );
  }

  #[tokio::test]
  async fn test_unauthorized_read_surfaces_as_401() {
    let server = serve(vec![(403, r#"{"statusCode":403,"message":"Forbidden"}"#)]).await;
    let (ctx, _) = context(&server.base_url);
    ctx.session.set_token("expired").unwrap();

    let mut query = transaction(&ctx, Some("t1".to_string()));
    query.fetch();
    query.settle().await;

    let error = query.error().unwrap();
    assert!(error.is_unauthorized());
    assert_eq!(error.status(), Some(401));
    assert_eq!(error.errors(), vec!["Unauthorized".to_string()]);
  }
}
