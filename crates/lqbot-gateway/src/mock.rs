//! In-memory exchange gateway.
//!
//! Holds balances, markets and resting orders in memory and records every
//! batch replace, so bot behaviour can be verified without a matching engine.
//! Failures can be injected per operation. Markets staged with
//! [`MockGateway::stage_market`] are listed only after a market reload.

use lqbot_core::{market_name, AssetInfo, Balance, BalanceSheet, MarketInfo, OrderSpec};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{BatchAck, BoxFuture, ExchangeGateway, RestingOrder};

/// One recorded `batch_order_replace` call.
#[derive(Debug, Clone)]
pub struct RecordedBatch {
    pub user_id: String,
    pub market: String,
    pub reset: bool,
    pub orders: Vec<OrderSpec>,
}

#[derive(Debug, Default)]
struct MockState {
    balances: HashMap<String, BalanceSheet>,
    markets: Vec<MarketInfo>,
    /// Markets defined but not yet loaded by a reload.
    staged: Vec<MarketInfo>,
    assets: Vec<AssetInfo>,
    admins: HashSet<String>,
    /// (user, asset, business, business_id) of applied balance updates.
    applied_updates: HashSet<(String, String, String, u64)>,
    reloads: usize,
    /// Resting orders keyed by (user, market).
    resting: HashMap<(String, String), Vec<RestingOrder>>,
    batches: Vec<RecordedBatch>,
    balance_failure: Option<GatewayError>,
    batch_failure: Option<GatewayError>,
}

/// Mock gateway for testing.
#[derive(Debug)]
pub struct MockGateway {
    state: Mutex<MockState>,
    next_order_id: AtomicU64,
    balance_queries: AtomicUsize,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    /// Create an empty mock gateway.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            next_order_id: AtomicU64::new(1),
            balance_queries: AtomicUsize::new(0),
        }
    }

    /// Register a market (and its two assets).
    pub fn add_market(&self, market: MarketInfo) {
        let mut state = self.state.lock();
        Self::list_market(&mut state, market);
    }

    /// Define a market that becomes visible on the next market reload.
    pub fn stage_market(&self, market: MarketInfo) {
        self.state.lock().staged.push(market);
    }

    /// Allow `user_id` to reload markets.
    pub fn add_admin(&self, user_id: &str) {
        self.state.lock().admins.insert(user_id.to_string());
    }

    /// Number of accepted market reloads.
    pub fn reload_count(&self) -> usize {
        self.state.lock().reloads
    }

    /// Set one asset balance of one user.
    pub fn set_balance(&self, user_id: &str, asset: &str, balance: Balance) {
        self.state
            .lock()
            .balances
            .entry(user_id.to_string())
            .or_default()
            .insert(asset, balance);
    }

    /// Make every balance query fail with `error` (None = succeed again).
    pub fn fail_balance_query(&self, error: Option<GatewayError>) {
        self.state.lock().balance_failure = error;
    }

    /// Make every batch replace fail with `error` (None = succeed again).
    pub fn fail_batch_replace(&self, error: Option<GatewayError>) {
        self.state.lock().batch_failure = error;
    }

    /// Recorded batch replace calls, including failed ones.
    pub fn batches(&self) -> Vec<RecordedBatch> {
        self.state.lock().batches.clone()
    }

    /// Number of batch replace calls made.
    pub fn batch_count(&self) -> usize {
        self.state.lock().batches.len()
    }

    /// Number of balance queries made.
    pub fn balance_query_count(&self) -> usize {
        self.balance_queries.load(Ordering::SeqCst)
    }

    fn to_resting(&self, order: &OrderSpec) -> RestingOrder {
        RestingOrder {
            id: self.next_order_id.fetch_add(1, Ordering::SeqCst),
            market: order.market.clone(),
            side: order.side,
            order_type: order.order_type,
            price: order.price,
            amount: order.amount,
            remain: order.amount,
            finished_base: Default::default(),
            finished_quote: Default::default(),
        }
    }

    fn has_market(state: &MockState, market: &str) -> bool {
        state.markets.iter().any(|m| m.name == market)
    }

    fn list_market(state: &mut MockState, market: MarketInfo) {
        for symbol in [&market.base, &market.quote] {
            if !state.assets.iter().any(|a| &a.symbol == symbol) {
                state.assets.push(AssetInfo {
                    symbol: symbol.clone(),
                    prec_save: 8,
                    prec_show: 8,
                });
            }
        }
        state.markets.retain(|m| m.name != market.name);
        state.markets.push(market);
    }

    fn apply_balance_update(
        state: &mut MockState,
        user_id: &str,
        asset: &str,
        business: &str,
        business_id: u64,
        delta: Decimal,
    ) -> GatewayResult<()> {
        if !state.assets.iter().any(|a| a.symbol == asset) {
            return Err(GatewayError::InvalidRequest(format!("invalid asset {asset}")));
        }
        let key = (
            user_id.to_string(),
            asset.to_string(),
            business.to_string(),
            business_id,
        );
        if state.applied_updates.contains(&key) {
            return Err(GatewayError::InvalidRequest(format!(
                "duplicate request {business}:{business_id}"
            )));
        }

        let sheet = state.balances.entry(user_id.to_string()).or_default();
        let current = sheet.get(asset).copied().unwrap_or_default();
        let available = current.available + delta;
        if available < Decimal::ZERO {
            return Err(GatewayError::InvalidRequest("balance not enough".to_string()));
        }
        sheet.insert(asset, Balance::new(available, current.frozen));
        state.applied_updates.insert(key);
        Ok(())
    }
}

impl ExchangeGateway for MockGateway {
    fn balance_query<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, GatewayResult<BalanceSheet>> {
        self.balance_queries.fetch_add(1, Ordering::SeqCst);
        let result = {
            let state = self.state.lock();
            match &state.balance_failure {
                Some(e) => Err(e.clone()),
                None => Ok(state.balances.get(user_id).cloned().unwrap_or_default()),
            }
        };
        Box::pin(async move { result })
    }

    fn batch_order_replace<'a>(
        &'a self,
        user_id: &'a str,
        market: &'a str,
        reset: bool,
        orders: Vec<OrderSpec>,
    ) -> BoxFuture<'a, GatewayResult<BatchAck>> {
        let result = {
            let mut state = self.state.lock();
            state.batches.push(RecordedBatch {
                user_id: user_id.to_string(),
                market: market.to_string(),
                reset,
                orders: orders.clone(),
            });

            if let Some(e) = state.batch_failure.clone() {
                Err(e)
            } else if !Self::has_market(&state, market) {
                Err(GatewayError::UnknownMarket(market.to_string()))
            } else if let Some(bad) = orders.iter().find(|o| o.market != market) {
                Err(GatewayError::InvalidRequest(format!(
                    "order for {} in batch for {market}",
                    bad.market
                )))
            } else {
                let placed: Vec<RestingOrder> = orders.iter().map(|o| self.to_resting(o)).collect();
                let order_ids = placed.iter().map(|o| o.id).collect();
                let book = state
                    .resting
                    .entry((user_id.to_string(), market.to_string()))
                    .or_default();
                if reset {
                    book.clear();
                }
                book.extend(placed);
                Ok(BatchAck { order_ids })
            }
        };
        Box::pin(async move { result })
    }

    fn market_list(&self) -> BoxFuture<'_, GatewayResult<Vec<MarketInfo>>> {
        let markets = self.state.lock().markets.clone();
        Box::pin(async move { Ok(markets) })
    }

    fn asset_list(&self) -> BoxFuture<'_, GatewayResult<Vec<AssetInfo>>> {
        let assets = self.state.lock().assets.clone();
        Box::pin(async move { Ok(assets) })
    }

    fn order_query<'a>(
        &'a self,
        user_id: &'a str,
        market: &'a str,
    ) -> BoxFuture<'a, GatewayResult<Vec<RestingOrder>>> {
        let result = {
            let state = self.state.lock();
            if Self::has_market(&state, market) {
                Ok(state
                    .resting
                    .get(&(user_id.to_string(), market.to_string()))
                    .cloned()
                    .unwrap_or_default())
            } else {
                Err(GatewayError::UnknownMarket(market.to_string()))
            }
        };
        Box::pin(async move { result })
    }

    fn order_cancel<'a>(
        &'a self,
        user_id: &'a str,
        market: &'a str,
        order_id: u64,
    ) -> BoxFuture<'a, GatewayResult<RestingOrder>> {
        let result = {
            let mut state = self.state.lock();
            let book = state
                .resting
                .entry((user_id.to_string(), market.to_string()))
                .or_default();
            match book.iter().position(|o| o.id == order_id) {
                Some(idx) => Ok(book.remove(idx)),
                None => Err(GatewayError::InvalidRequest(format!(
                    "invalid order_id {order_id}"
                ))),
            }
        };
        Box::pin(async move { result })
    }

    fn order_cancel_all<'a>(
        &'a self,
        user_id: &'a str,
        market: &'a str,
    ) -> BoxFuture<'a, GatewayResult<u32>> {
        let count = self
            .state
            .lock()
            .resting
            .remove(&(user_id.to_string(), market.to_string()))
            .map(|book| book.len() as u32)
            .unwrap_or(0);
        Box::pin(async move { Ok(count) })
    }

    fn balance_update<'a>(
        &'a self,
        user_id: &'a str,
        asset: &'a str,
        business: &'a str,
        business_id: u64,
        delta: Decimal,
    ) -> BoxFuture<'a, GatewayResult<()>> {
        let result = {
            let mut state = self.state.lock();
            Self::apply_balance_update(&mut state, user_id, asset, business, business_id, delta)
        };
        Box::pin(async move { result })
    }

    fn reload_markets<'a>(
        &'a self,
        user_id: &'a str,
        from_scratch: bool,
    ) -> BoxFuture<'a, GatewayResult<()>> {
        let result = {
            let mut state = self.state.lock();
            if !state.admins.contains(user_id) {
                Err(GatewayError::Unauthorized("Requires admin role.".to_string()))
            } else {
                let staged = std::mem::take(&mut state.staged);
                for market in staged {
                    // Without from_scratch a market already listed is kept as is.
                    if from_scratch || !Self::has_market(&state, &market.name) {
                        Self::list_market(&mut state, market);
                    }
                }
                state.reloads += 1;
                Ok(())
            }
        };
        Box::pin(async move { result })
    }
}

/// Convenience constructor for a market with the given precisions.
pub fn mock_market(base: &str, quote: &str, price_precision: i32, amount_precision: i32) -> MarketInfo {
    MarketInfo {
        name: market_name(base, quote),
        base: base.to_string(),
        quote: quote.to_string(),
        price_precision,
        amount_precision,
        min_amount: Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lqbot_core::OrderSide;
    use rust_decimal_macros::dec;

    fn order(market: &MarketInfo, side: OrderSide) -> OrderSpec {
        OrderSpec::limit(market, side, dec!(2), dec!(1), dec!(0), dec!(0)).unwrap()
    }

    #[tokio::test]
    async fn test_balance_query_returns_sheet() {
        let gw = MockGateway::new();
        gw.set_balance("user1", "BTC", Balance::new(dec!(1), dec!(2)));

        let sheet = gw.balance_query("user1").await.unwrap();
        assert_eq!(sheet.total("BTC"), dec!(3));
        assert!(gw.balance_query("user2").await.unwrap().is_empty());
        assert_eq!(gw.balance_query_count(), 2);
    }

    #[tokio::test]
    async fn test_reset_replaces_resting_orders() {
        let gw = MockGateway::new();
        let market = mock_market("DIF", "BTC", 4, 4);
        gw.add_market(market.clone());

        let first = vec![order(&market, OrderSide::Ask), order(&market, OrderSide::Bid)];
        gw.batch_order_replace("user1", "DIF_BTC", true, first).await.unwrap();
        assert_eq!(gw.order_query("user1", "DIF_BTC").await.unwrap().len(), 2);

        let second = vec![order(&market, OrderSide::Ask)];
        let ack = gw
            .batch_order_replace("user1", "DIF_BTC", true, second)
            .await
            .unwrap();
        assert_eq!(ack.order_ids, vec![3]);

        let resting = gw.order_query("user1", "DIF_BTC").await.unwrap();
        assert_eq!(resting.len(), 1);
        assert_eq!(resting[0].id, 3);
    }

    #[tokio::test]
    async fn test_injected_failure_is_recorded() {
        let gw = MockGateway::new();
        let market = mock_market("DIF", "BTC", 4, 4);
        gw.add_market(market.clone());
        gw.fail_batch_replace(Some(GatewayError::Unavailable("down".to_string())));

        let result = gw
            .batch_order_replace("user1", "DIF_BTC", true, vec![order(&market, OrderSide::Bid)])
            .await;
        assert!(matches!(result, Err(GatewayError::Unavailable(_))));
        assert_eq!(gw.batch_count(), 1);
        assert!(gw.order_query("user1", "DIF_BTC").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inconsistent_market_rejected() {
        let gw = MockGateway::new();
        let dif = mock_market("DIF", "BTC", 4, 4);
        let eth = mock_market("ETH", "USDT", 2, 4);
        gw.add_market(dif.clone());
        gw.add_market(eth.clone());

        let result = gw
            .batch_order_replace("user1", "DIF_BTC", true, vec![order(&eth, OrderSide::Ask)])
            .await;
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_cancel_all_counts_orders() {
        let gw = MockGateway::new();
        let market = mock_market("DIF", "BTC", 4, 4);
        gw.add_market(market.clone());
        gw.batch_order_replace(
            "user1",
            "DIF_BTC",
            false,
            vec![order(&market, OrderSide::Ask), order(&market, OrderSide::Bid)],
        )
        .await
        .unwrap();

        let first_id = gw.order_query("user1", "DIF_BTC").await.unwrap()[0].id;
        let cancelled = gw.order_cancel("user1", "DIF_BTC", first_id).await.unwrap();
        assert_eq!(cancelled.id, first_id);

        assert_eq!(gw.order_cancel_all("user1", "DIF_BTC").await.unwrap(), 1);
        assert_eq!(gw.order_cancel_all("user1", "DIF_BTC").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_balance_update_deposits_and_withdraws() {
        let gw = MockGateway::new();
        gw.add_market(mock_market("DIF", "BTC", 4, 4));
        gw.set_balance("user1", "BTC", Balance::new(dec!(1), dec!(2)));

        gw.balance_update("user1", "BTC", "deposit", 1, dec!(10)).await.unwrap();
        gw.balance_update("user1", "DIF", "deposit", 1, dec!(5)).await.unwrap();
        let sheet = gw.balance_query("user1").await.unwrap();
        assert_eq!(sheet.get("BTC"), Some(&Balance::new(dec!(11), dec!(2))));
        assert_eq!(sheet.total("DIF"), dec!(5));

        gw.balance_update("user1", "DIF", "withdraw", 2, dec!(-5)).await.unwrap();
        assert_eq!(gw.balance_query("user1").await.unwrap().total("DIF"), dec!(0));
    }

    #[tokio::test]
    async fn test_balance_update_rejections() {
        let gw = MockGateway::new();
        gw.add_market(mock_market("DIF", "BTC", 4, 4));
        gw.balance_update("user1", "BTC", "deposit", 7, dec!(1)).await.unwrap();

        let duplicate = gw.balance_update("user1", "BTC", "deposit", 7, dec!(1)).await;
        assert!(matches!(duplicate, Err(GatewayError::InvalidRequest(_))));

        let unknown = gw.balance_update("user1", "XYZ", "deposit", 8, dec!(1)).await;
        assert!(matches!(unknown, Err(GatewayError::InvalidRequest(_))));

        let overdraw = gw.balance_update("user1", "BTC", "withdraw", 9, dec!(-2)).await;
        assert!(matches!(overdraw, Err(GatewayError::InvalidRequest(ref m)) if m == "balance not enough"));
        assert_eq!(gw.balance_query("user1").await.unwrap().total("BTC"), dec!(1));
    }

    #[tokio::test]
    async fn test_reload_lists_staged_markets() {
        let gw = MockGateway::new();
        gw.add_market(mock_market("DIF", "BTC", 4, 4));
        gw.stage_market(mock_market("ETH", "USDT", 2, 4));
        gw.stage_market(mock_market("DIF", "BTC", 6, 6));
        assert_eq!(gw.market_list().await.unwrap().len(), 1);

        let denied = gw.reload_markets("user1", false).await;
        assert!(matches!(denied, Err(GatewayError::Unauthorized(_))));
        assert_eq!(gw.reload_count(), 0);

        gw.add_admin("admin");
        gw.reload_markets("admin", false).await.unwrap();
        let markets = gw.market_list().await.unwrap();
        assert_eq!(markets.len(), 2);
        let dif = markets.iter().find(|m| m.name == "DIF_BTC").unwrap();
        assert_eq!(dif.price_precision, 4);
        assert_eq!(gw.reload_count(), 1);
    }

    #[tokio::test]
    async fn test_reload_from_scratch_replaces_definitions() {
        let gw = MockGateway::new();
        gw.add_admin("admin");
        gw.add_market(mock_market("DIF", "BTC", 4, 4));
        gw.stage_market(mock_market("DIF", "BTC", 6, 6));

        gw.reload_markets("admin", true).await.unwrap();
        let markets = gw.market_list().await.unwrap();
        assert_eq!(markets.len(), 1);
        assert_eq!(markets[0].price_precision, 6);
    }
}
