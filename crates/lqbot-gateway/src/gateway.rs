//! Exchange gateway trait.
//!
//! Abstracts the authenticated exchange API so the bot can run against the
//! real HTTP gateway or an in-memory mock.

use lqbot_core::{AssetInfo, BalanceSheet, MarketInfo, OrderSide, OrderSpec, OrderType, Price, Size};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::Arc;

use crate::error::GatewayResult;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Acknowledgement of an accepted batch replace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchAck {
    /// Exchange order IDs, in submission order.
    pub order_ids: Vec<u64>,
}

/// An order resting on the exchange book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestingOrder {
    pub id: u64,
    pub market: String,
    #[serde(rename = "order_side")]
    pub side: OrderSide,
    pub order_type: OrderType,
    pub price: Price,
    pub amount: Size,
    /// Amount not yet filled.
    pub remain: Size,
    #[serde(default)]
    pub finished_base: Decimal,
    #[serde(default)]
    pub finished_quote: Decimal,
}

/// Authenticated exchange operations.
///
/// Every call is made on behalf of `user_id`, a configured user label that
/// the implementation maps to credentials.
pub trait ExchangeGateway: Send + Sync {
    /// Available and frozen balance per asset.
    fn balance_query<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, GatewayResult<BalanceSheet>>;

    /// Submit `orders` for `market` in one atomic request.
    ///
    /// With `reset = true` every resting order of the user on `market` is
    /// cancelled first. Either the whole batch is accepted or the call fails.
    fn batch_order_replace<'a>(
        &'a self,
        user_id: &'a str,
        market: &'a str,
        reset: bool,
        orders: Vec<OrderSpec>,
    ) -> BoxFuture<'a, GatewayResult<BatchAck>>;

    /// All markets the exchange lists.
    fn market_list(&self) -> BoxFuture<'_, GatewayResult<Vec<MarketInfo>>>;

    /// All assets the exchange lists.
    fn asset_list(&self) -> BoxFuture<'_, GatewayResult<Vec<AssetInfo>>>;

    /// Resting orders of the user on `market`.
    fn order_query<'a>(
        &'a self,
        user_id: &'a str,
        market: &'a str,
    ) -> BoxFuture<'a, GatewayResult<Vec<RestingOrder>>>;

    /// Cancel one order.
    fn order_cancel<'a>(
        &'a self,
        user_id: &'a str,
        market: &'a str,
        order_id: u64,
    ) -> BoxFuture<'a, GatewayResult<RestingOrder>>;

    /// Cancel every resting order of the user on `market`; returns the count.
    fn order_cancel_all<'a>(
        &'a self,
        user_id: &'a str,
        market: &'a str,
    ) -> BoxFuture<'a, GatewayResult<u32>>;

    /// Add `delta` to the user's available `asset` balance; negative withdraws.
    ///
    /// `(business, business_id)` identifies the change; the exchange refuses
    /// the same pair twice for one user and asset.
    fn balance_update<'a>(
        &'a self,
        user_id: &'a str,
        asset: &'a str,
        business: &'a str,
        business_id: u64,
        delta: Decimal,
    ) -> BoxFuture<'a, GatewayResult<()>>;

    /// Make the exchange reload its market and asset definitions.
    ///
    /// Requires an admin `user_id`. With `from_scratch` every definition is
    /// read again, otherwise only those added since the last load.
    fn reload_markets<'a>(
        &'a self,
        user_id: &'a str,
        from_scratch: bool,
    ) -> BoxFuture<'a, GatewayResult<()>>;
}

/// Shared, type-erased gateway.
pub type DynGateway = Arc<dyn ExchangeGateway>;
