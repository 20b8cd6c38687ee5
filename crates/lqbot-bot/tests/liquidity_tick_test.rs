//! Liquidity bot tick tests against the in-memory gateway.

use lqbot_bot::{ctl, BotError, LiquidityBot, TickOutcome};
use lqbot_core::{Balance, MarketInfo, OrderSide, OrderType};
use lqbot_gateway::{mock_market, GatewayError, MockGateway};
use lqbot_mm::{LadderConfig, QuoteError};
use rust_decimal_macros::dec;
use std::sync::Arc;

fn dif_btc() -> Arc<MarketInfo> {
    Arc::new(mock_market("DIF", "BTC", 4, 4))
}

fn funded_gateway(market: &MarketInfo) -> Arc<MockGateway> {
    let gw = Arc::new(MockGateway::new());
    gw.add_market(market.clone());
    gw.set_balance("user1", "BTC", Balance::new(dec!(1000), dec!(0)));
    gw.set_balance("user1", "DIF", Balance::new(dec!(500), dec!(0)));
    gw
}

fn bot_for(user: &str, market: Arc<MarketInfo>, gw: Arc<MockGateway>) -> LiquidityBot<MockGateway> {
    LiquidityBot::new(LadderConfig::new("DIF", "BTC", user), market, gw).unwrap()
}

#[tokio::test]
async fn test_first_tick_replaces_whole_ladder() {
    let market = dif_btc();
    let gw = funded_gateway(&market);
    let mut bot = bot_for("user1", market, gw.clone());

    let outcome = bot.tick().await.unwrap();
    assert!(matches!(outcome, TickOutcome::Submitted { orders: 40, .. }));

    let batches = gw.batches();
    assert_eq!(batches.len(), 1);
    let batch = &batches[0];
    assert_eq!(batch.user_id, "user1");
    assert_eq!(batch.market, "DIF_BTC");
    assert!(batch.reset);
    assert_eq!(batch.orders.len(), 40);
    assert!(batch.orders.iter().all(|o| o.order_type == OrderType::Limit));
    assert_eq!(batch.orders[0].side, OrderSide::Ask);
    assert_eq!(batch.orders[1].side, OrderSide::Bid);
    assert_eq!(batch.orders[0].price.inner(), dec!(2.004));
    assert_eq!(batch.orders[1].price.inner(), dec!(1.996));

    assert_eq!(bot.cache().get("BTC"), Some(dec!(1000)));
    assert_eq!(bot.cache().get("DIF"), Some(dec!(500)));
}

#[tokio::test]
async fn test_unchanged_balances_skip_submission() {
    let market = dif_btc();
    let gw = funded_gateway(&market);
    let mut bot = bot_for("user1", market, gw.clone());

    bot.tick().await.unwrap();
    let outcome = bot.tick().await.unwrap();

    assert_eq!(outcome, TickOutcome::Unchanged);
    assert_eq!(gw.balance_query_count(), 2);
    assert_eq!(gw.batch_count(), 1);
}

#[tokio::test]
async fn test_freezing_funds_is_not_a_change() {
    let market = dif_btc();
    let gw = funded_gateway(&market);
    let mut bot = bot_for("user1", market, gw.clone());
    bot.tick().await.unwrap();

    // Resting orders freeze part of each balance; totals stay the same.
    gw.set_balance("user1", "BTC", Balance::new(dec!(600), dec!(400)));
    gw.set_balance("user1", "DIF", Balance::new(dec!(300), dec!(200)));

    assert_eq!(bot.tick().await.unwrap(), TickOutcome::Unchanged);
    assert_eq!(gw.batch_count(), 1);
}

#[tokio::test]
async fn test_trade_triggers_requote() {
    let market = dif_btc();
    let gw = funded_gateway(&market);
    let mut bot = bot_for("user1", market, gw.clone());
    bot.tick().await.unwrap();

    // An ask fill: base sold, quote received.
    gw.set_balance("user1", "DIF", Balance::new(dec!(499), dec!(0)));
    gw.set_balance("user1", "BTC", Balance::new(dec!(1002.004), dec!(0)));

    let outcome = bot.tick().await.unwrap();
    assert!(matches!(outcome, TickOutcome::Submitted { .. }));
    assert_eq!(gw.batch_count(), 2);
    assert_eq!(bot.cache().get("DIF"), Some(dec!(499)));
}

#[tokio::test]
async fn test_failed_submission_retries_next_tick() {
    let market = dif_btc();
    let gw = funded_gateway(&market);
    let mut bot = bot_for("user1", market, gw.clone());

    gw.fail_batch_replace(Some(GatewayError::Unavailable("engine down".to_string())));
    let err = bot.tick().await.unwrap_err();
    assert!(matches!(err, BotError::Gateway(GatewayError::Unavailable(_))));
    assert_eq!(bot.cache().get("BTC"), None);
    assert_eq!(bot.cache().get("DIF"), None);

    gw.fail_batch_replace(None);
    let outcome = bot.tick().await.unwrap();
    assert!(matches!(outcome, TickOutcome::Submitted { .. }));
    assert_eq!(gw.batch_count(), 2);
}

#[tokio::test]
async fn test_rejected_batch_leaves_cache() {
    let market = dif_btc();
    let gw = funded_gateway(&market);
    let mut bot = bot_for("user1", market, gw.clone());

    gw.fail_batch_replace(Some(GatewayError::Rejected {
        code: 10,
        message: "balance not enough".to_string(),
    }));
    assert!(bot.run_tick().await.is_none());
    assert_eq!(bot.cache().get("BTC"), None);
}

#[tokio::test]
async fn test_zero_base_never_submits() {
    let market = dif_btc();
    let gw = funded_gateway(&market);
    gw.set_balance("user1", "DIF", Balance::new(dec!(0), dec!(0)));
    let mut bot = bot_for("user1", market, gw.clone());

    let err = bot.tick().await.unwrap_err();
    assert!(matches!(
        err,
        BotError::Quote(QuoteError::InsufficientBalance { ref asset, .. }) if asset == "DIF"
    ));
    assert_eq!(gw.batch_count(), 0);
    assert_eq!(bot.cache().get("DIF"), None);
}

#[tokio::test]
async fn test_missing_asset_counts_as_zero() {
    let market = dif_btc();
    let gw = Arc::new(MockGateway::new());
    gw.add_market((*market).clone());
    gw.set_balance("user1", "BTC", Balance::new(dec!(1000), dec!(0)));
    let mut bot = bot_for("user1", market, gw.clone());

    let err = bot.tick().await.unwrap_err();
    assert!(matches!(
        err,
        BotError::Quote(QuoteError::InsufficientBalance { .. })
    ));
    assert_eq!(gw.batch_count(), 0);
}

#[tokio::test]
async fn test_balance_query_failure() {
    let market = dif_btc();
    let gw = funded_gateway(&market);
    let mut bot = bot_for("user1", market, gw.clone());

    gw.fail_balance_query(Some(GatewayError::Unauthenticated("expired".to_string())));
    let err = bot.tick().await.unwrap_err();
    assert!(matches!(err, BotError::Gateway(ref e) if e.is_auth()));
    assert_eq!(gw.batch_count(), 0);

    gw.fail_balance_query(None);
    assert!(matches!(
        bot.tick().await.unwrap(),
        TickOutcome::Submitted { .. }
    ));
}

#[tokio::test]
async fn test_bots_are_independent() {
    let market = dif_btc();
    let gw = funded_gateway(&market);
    gw.set_balance("user2", "BTC", Balance::new(dec!(10), dec!(0)));
    gw.set_balance("user2", "DIF", Balance::new(dec!(20), dec!(0)));

    let mut first = bot_for("user1", market.clone(), gw.clone());
    let mut second = bot_for("user2", market, gw.clone());

    first.tick().await.unwrap();
    second.tick().await.unwrap();
    assert_eq!(gw.batch_count(), 2);

    // Only user2 trades; user1 stays quiet.
    gw.set_balance("user2", "DIF", Balance::new(dec!(19), dec!(0)));
    assert_eq!(first.tick().await.unwrap(), TickOutcome::Unchanged);
    assert!(matches!(
        second.tick().await.unwrap(),
        TickOutcome::Submitted { .. }
    ));

    let batches = gw.batches();
    assert_eq!(batches.len(), 3);
    assert_eq!(batches[2].user_id, "user2");
    assert_eq!(first.cache().get("DIF"), Some(dec!(500)));
    assert_eq!(second.cache().get("DIF"), Some(dec!(19)));
}

#[tokio::test]
async fn test_deposit_unblocks_unfunded_bot() {
    let market = dif_btc();
    let gw = Arc::new(MockGateway::new());
    gw.add_market((*market).clone());
    let mut bot = bot_for("user3", market, gw.clone());

    assert!(matches!(
        bot.tick().await,
        Err(BotError::Quote(QuoteError::InsufficientBalance { .. }))
    ));

    ctl::deposit(gw.as_ref(), "user3", "BTC", dec!(10000), 1).await.unwrap();
    ctl::deposit(gw.as_ref(), "user3", "DIF", dec!(50), 2).await.unwrap();

    let outcome = bot.tick().await.unwrap();
    assert!(matches!(outcome, TickOutcome::Submitted { orders: 40, .. }));
    assert_eq!(bot.cache().get("DIF"), Some(dec!(50)));
}
