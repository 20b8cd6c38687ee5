//! HTTP implementation of [`ExchangeGateway`].
//!
//! Every operation is a JSON POST to `{base_url}/{Method}` carrying a bearer
//! token for the acting user. Transport failures and 5xx map to
//! `Unavailable`, 401/403 to the auth errors, and a non-zero `result_code` in
//! an otherwise successful batch response to `Rejected`.

use lqbot_core::{AssetInfo, Balance, BalanceSheet, MarketInfo, OrderSpec};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::TokenProvider;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{BatchAck, BoxFuture, ExchangeGateway, RestingOrder};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct UserRequest<'a> {
    user_id: &'a str,
}

#[derive(Debug, Serialize)]
struct UserMarketRequest<'a> {
    user_id: &'a str,
    market: &'a str,
}

#[derive(Debug, Serialize)]
struct OrderCancelRequest<'a> {
    user_id: &'a str,
    market: &'a str,
    order_id: u64,
}

#[derive(Debug, Serialize)]
struct BalanceUpdateRequest<'a> {
    user_id: &'a str,
    asset: &'a str,
    business: &'a str,
    business_id: u64,
    delta: Decimal,
    detail: &'a str,
}

#[derive(Debug, Serialize)]
struct ReloadMarketsRequest {
    from_scratch: bool,
}

#[derive(Debug, Serialize)]
struct EmptyRequest {}

#[derive(Debug, Deserialize)]
struct EmptyResponse {}

#[derive(Debug, Deserialize)]
struct BalanceEntry {
    asset_id: String,
    available: Decimal,
    frozen: Decimal,
}

#[derive(Debug, Deserialize)]
struct BalanceQueryResponse {
    #[serde(default)]
    balances: Vec<BalanceEntry>,
}

#[derive(Debug, Deserialize)]
struct MarketListResponse {
    #[serde(default)]
    markets: Vec<MarketInfo>,
}

#[derive(Debug, Deserialize)]
struct AssetListResponse {
    #[serde(default)]
    asset_lists: Vec<AssetInfo>,
}

/// One order inside a batch request, tagged with its owner.
#[derive(Debug, Serialize)]
struct OrderPutRequest<'a> {
    user_id: &'a str,
    #[serde(flatten)]
    order: &'a OrderSpec,
}

#[derive(Debug, Serialize)]
struct BatchOrderPutRequest<'a> {
    market: &'a str,
    reset: bool,
    orders: Vec<OrderPutRequest<'a>>,
}

#[derive(Debug, Deserialize)]
struct BatchOrderPutResponse {
    #[serde(default)]
    result_code: i32,
    #[serde(default)]
    error_message: String,
    #[serde(default)]
    order_ids: Vec<u64>,
}

#[derive(Debug, Deserialize)]
struct OrderQueryResponse {
    #[serde(default)]
    orders: Vec<RestingOrder>,
}

#[derive(Debug, Deserialize)]
struct OrderCancelAllResponse {
    total: u32,
}

/// JSON-over-HTTP exchange gateway.
pub struct HttpGateway {
    client: Client,
    base_url: String,
    auth: Arc<dyn TokenProvider>,
}

impl HttpGateway {
    /// Create a gateway for `base_url` (e.g. "http://localhost:50053/api/exchange/action").
    pub fn new(base_url: impl Into<String>, auth: Arc<dyn TokenProvider>) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Unavailable(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// POST `body` to `method`, optionally authenticated as `user_id`.
    async fn call<Req, Resp>(
        &self,
        method: &str,
        user_id: Option<&str>,
        body: &Req,
    ) -> GatewayResult<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let mut request = self.client.post(self.url(method)).json(body);
        if let Some(user_id) = user_id {
            let token = self.auth.bearer_token(user_id).await?;
            request = request.bearer_auth(token.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable(format!("{method}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = map_status(status, &format!("{method}: {body}"));
            if matches!(err, GatewayError::Unauthenticated(_)) {
                if let Some(user_id) = user_id {
                    self.auth.invalidate(user_id);
                }
            }
            warn!(method, %status, "Gateway request failed");
            return Err(err);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Unavailable(format!("{method}: {e}")))?;
        debug!(method, len = bytes.len(), "Gateway response received");
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Map a non-success HTTP status to a gateway error.
pub fn map_status(status: StatusCode, detail: &str) -> GatewayError {
    match status {
        StatusCode::UNAUTHORIZED => GatewayError::Unauthenticated(detail.to_string()),
        StatusCode::FORBIDDEN => GatewayError::Unauthorized(detail.to_string()),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            GatewayError::InvalidRequest(detail.to_string())
        }
        _ => GatewayError::Unavailable(format!("HTTP {status}: {detail}")),
    }
}

/// Reject a batch containing orders for a different market.
fn check_batch_market(market: &str, orders: &[OrderSpec]) -> GatewayResult<()> {
    match orders.iter().find(|o| o.market != market) {
        Some(bad) => Err(GatewayError::InvalidRequest(format!(
            "order for {} in batch for {market}",
            bad.market
        ))),
        None => Ok(()),
    }
}

fn batch_result(resp: BatchOrderPutResponse) -> GatewayResult<BatchAck> {
    if resp.result_code != 0 {
        return Err(GatewayError::Rejected {
            code: resp.result_code,
            message: resp.error_message,
        });
    }
    Ok(BatchAck {
        order_ids: resp.order_ids,
    })
}

impl ExchangeGateway for HttpGateway {
    fn balance_query<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, GatewayResult<BalanceSheet>> {
        Box::pin(async move {
            let resp: BalanceQueryResponse = self
                .call("BalanceQuery", Some(user_id), &UserRequest { user_id })
                .await?;
            Ok(resp
                .balances
                .into_iter()
                .map(|b| (b.asset_id, Balance::new(b.available, b.frozen)))
                .collect())
        })
    }

    fn batch_order_replace<'a>(
        &'a self,
        user_id: &'a str,
        market: &'a str,
        reset: bool,
        orders: Vec<OrderSpec>,
    ) -> BoxFuture<'a, GatewayResult<BatchAck>> {
        Box::pin(async move {
            check_batch_market(market, &orders)?;
            let request = BatchOrderPutRequest {
                market,
                reset,
                orders: orders
                    .iter()
                    .map(|order| OrderPutRequest { user_id, order })
                    .collect(),
            };
            let resp: BatchOrderPutResponse =
                self.call("BatchOrderPut", Some(user_id), &request).await?;
            batch_result(resp)
        })
    }

    fn market_list(&self) -> BoxFuture<'_, GatewayResult<Vec<MarketInfo>>> {
        Box::pin(async move {
            let resp: MarketListResponse = self.call("MarketList", None, &EmptyRequest {}).await?;
            Ok(resp.markets)
        })
    }

    fn asset_list(&self) -> BoxFuture<'_, GatewayResult<Vec<AssetInfo>>> {
        Box::pin(async move {
            let resp: AssetListResponse = self.call("AssetList", None, &EmptyRequest {}).await?;
            Ok(resp.asset_lists)
        })
    }

    fn order_query<'a>(
        &'a self,
        user_id: &'a str,
        market: &'a str,
    ) -> BoxFuture<'a, GatewayResult<Vec<RestingOrder>>> {
        Box::pin(async move {
            let resp: OrderQueryResponse = self
                .call("OrderQuery", Some(user_id), &UserMarketRequest { user_id, market })
                .await?;
            Ok(resp.orders)
        })
    }

    fn order_cancel<'a>(
        &'a self,
        user_id: &'a str,
        market: &'a str,
        order_id: u64,
    ) -> BoxFuture<'a, GatewayResult<RestingOrder>> {
        Box::pin(async move {
            self.call(
                "OrderCancel",
                Some(user_id),
                &OrderCancelRequest {
                    user_id,
                    market,
                    order_id,
                },
            )
            .await
        })
    }

    fn order_cancel_all<'a>(
        &'a self,
        user_id: &'a str,
        market: &'a str,
    ) -> BoxFuture<'a, GatewayResult<u32>> {
        Box::pin(async move {
            let resp: OrderCancelAllResponse = self
                .call("OrderCancelAll", Some(user_id), &UserMarketRequest { user_id, market })
                .await?;
            Ok(resp.total)
        })
    }

    fn balance_update<'a>(
        &'a self,
        user_id: &'a str,
        asset: &'a str,
        business: &'a str,
        business_id: u64,
        delta: Decimal,
    ) -> BoxFuture<'a, GatewayResult<()>> {
        Box::pin(async move {
            let request = BalanceUpdateRequest {
                user_id,
                asset,
                business,
                business_id,
                delta,
                detail: "{}",
            };
            let _: EmptyResponse = self.call("BalanceUpdate", Some(user_id), &request).await?;
            Ok(())
        })
    }

    fn reload_markets<'a>(
        &'a self,
        user_id: &'a str,
        from_scratch: bool,
    ) -> BoxFuture<'a, GatewayResult<()>> {
        Box::pin(async move {
            let _: EmptyResponse = self
                .call("ReloadMarkets", Some(user_id), &ReloadMarketsRequest { from_scratch })
                .await?;
            Ok(())
        })
    }
}
