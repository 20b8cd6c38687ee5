//! Liquidity bot tick.
//!
//! One tick: query balances, skip if the quote and base totals are unchanged
//! since the last accepted ladder, otherwise build a fresh ladder and replace
//! every resting order of the user on the market with it. Any failure ends the
//! tick and leaves the balance cache as it was, so the next tick retries.

use crate::config::bot_name;
use crate::error::BotError;
use lqbot_core::MarketInfo;
use lqbot_gateway::ExchangeGateway;
use lqbot_mm::{generate_ladder, BalanceCache, BalanceSnapshot, LadderConfig, QuoteError, QuoteResult};
use lqbot_telemetry::Metrics;
use rust_decimal::prelude::ToPrimitive;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

/// Where a bot is within its tick cycle.
///
/// A tick runs `Idle → FetchingBalance → (Clean | Dirty) → Submitting → Idle`;
/// a failure goes straight back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickState {
    Idle,
    FetchingBalance,
    /// Balances unchanged; nothing to submit.
    Clean,
    /// Balances moved; a ladder is being built.
    Dirty,
    Submitting,
}

/// Result of a tick that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Unchanged,
    Submitted { orders: usize, order_ids: Vec<u64> },
}

impl TickOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Submitted { .. } => "submitted",
        }
    }
}

/// A tiered market-making bot for one user on one market.
pub struct LiquidityBot<G: ExchangeGateway + ?Sized> {
    name: String,
    config: LadderConfig,
    market: Arc<MarketInfo>,
    gateway: Arc<G>,
    cache: BalanceCache,
    state: TickState,
    /// States entered during the most recent tick, ending with `Idle`.
    last_path: Vec<TickState>,
}

impl<G: ExchangeGateway + ?Sized> LiquidityBot<G> {
    /// Create a bot. Fails if the config is invalid or `market` is not the
    /// config's `{base}_{quote}` market.
    pub fn new(config: LadderConfig, market: Arc<MarketInfo>, gateway: Arc<G>) -> QuoteResult<Self> {
        config.validate()?;
        if market.name != config.market() {
            return Err(QuoteError::InvalidConfig(format!(
                "bot for {} given market {}",
                config.market(),
                market.name
            )));
        }

        Ok(Self {
            name: bot_name(&config),
            config,
            market,
            gateway,
            cache: BalanceCache::new(),
            state: TickState::Idle,
            last_path: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &LadderConfig {
        &self.config
    }

    pub fn state(&self) -> TickState {
        self.state
    }

    /// States the last tick went through.
    pub fn last_tick_path(&self) -> &[TickState] {
        &self.last_path
    }

    pub fn cache(&self) -> &BalanceCache {
        &self.cache
    }

    /// Run one tick.
    pub async fn tick(&mut self) -> Result<TickOutcome, BotError> {
        self.last_path.clear();
        let result = self.tick_inner().await;
        self.transition(TickState::Idle);
        result
    }

    fn transition(&mut self, next: TickState) {
        trace!(bot = %self.name, from = ?self.state, to = ?next, "Tick state");
        self.state = next;
        self.last_path.push(next);
    }

    async fn tick_inner(&mut self) -> Result<TickOutcome, BotError> {
        self.transition(TickState::FetchingBalance);
        let sheet = self
            .gateway
            .balance_query(&self.config.user_id)
            .await
            .map_err(|e| {
                Metrics::gateway_error("balance_query", e.kind());
                e
            })?;

        let snapshot = BalanceSnapshot::from_sheet(&sheet, &self.config.quote, &self.config.base);
        self.record_balances(&snapshot);

        if !self.cache.is_dirty(&snapshot) {
            self.transition(TickState::Clean);
            debug!(bot = %self.name, "Balances unchanged, keeping ladder");
            return Ok(TickOutcome::Unchanged);
        }

        self.transition(TickState::Dirty);
        let orders = generate_ladder(
            &self.config,
            &self.market,
            snapshot.quote_total,
            snapshot.base_total,
        )?;
        let count = orders.len();

        self.transition(TickState::Submitting);
        let started = Instant::now();
        let ack = self
            .gateway
            .batch_order_replace(&self.config.user_id, &self.market.name, true, orders)
            .await
            .map_err(|e| {
                Metrics::gateway_error("batch_order_replace", e.kind());
                e
            })?;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        self.cache.commit(&snapshot);
        Metrics::ladder_submitted(&self.name, count, latency_ms);

        info!(
            bot = %self.name,
            orders = count,
            quote_total = %snapshot.quote_total,
            base_total = %snapshot.base_total,
            latency_ms = format!("{latency_ms:.1}"),
            "Ladder replaced"
        );

        Ok(TickOutcome::Submitted {
            orders: count,
            order_ids: ack.order_ids,
        })
    }

    /// Run one tick, logging and recording the outcome instead of returning errors.
    pub async fn run_tick(&mut self) -> Option<TickOutcome> {
        match self.tick().await {
            Ok(outcome) => {
                Metrics::tick(&self.name, outcome.label());
                Some(outcome)
            }
            Err(e) => {
                Metrics::tick(&self.name, e.outcome());
                warn!(bot = %self.name, error = %e, "Tick failed");
                None
            }
        }
    }

    fn record_balances(&self, snapshot: &BalanceSnapshot) {
        for (asset, total) in [
            (&snapshot.quote_asset, snapshot.quote_total),
            (&snapshot.base_asset, snapshot.base_total),
        ] {
            if let Some(total) = total.to_f64() {
                Metrics::balance(&self.name, asset, total);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lqbot_core::Balance;
    use lqbot_gateway::{mock_market, MockGateway};
    use rust_decimal_macros::dec;

    fn bot(gw: Arc<MockGateway>) -> LiquidityBot<MockGateway> {
        let market = Arc::new(mock_market("DIF", "BTC", 4, 4));
        gw.add_market((*market).clone());
        LiquidityBot::new(LadderConfig::new("DIF", "BTC", "user1"), market, gw).unwrap()
    }

    #[test]
    fn test_market_mismatch_rejected() {
        let gw = Arc::new(MockGateway::new());
        let market = Arc::new(mock_market("ETH", "USDT", 2, 4));
        let result = LiquidityBot::new(LadderConfig::new("DIF", "BTC", "user1"), market, gw);
        assert!(matches!(result, Err(QuoteError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_tick_state_paths() {
        use TickState::*;

        let gw = Arc::new(MockGateway::new());
        gw.set_balance("user1", "BTC", Balance::new(dec!(1000), dec!(0)));
        gw.set_balance("user1", "DIF", Balance::new(dec!(500), dec!(0)));
        let mut bot = bot(gw.clone());
        assert_eq!(bot.state(), Idle);
        assert!(bot.last_tick_path().is_empty());

        bot.tick().await.unwrap();
        assert_eq!(bot.last_tick_path(), &[FetchingBalance, Dirty, Submitting, Idle]);
        assert_eq!(bot.state(), Idle);

        bot.tick().await.unwrap();
        assert_eq!(bot.last_tick_path(), &[FetchingBalance, Clean, Idle]);

        gw.set_balance("user1", "DIF", Balance::new(dec!(0), dec!(0)));
        assert!(bot.tick().await.is_err());
        assert_eq!(bot.last_tick_path(), &[FetchingBalance, Dirty, Idle]);

        gw.fail_balance_query(Some(lqbot_gateway::GatewayError::Unavailable("x".to_string())));
        assert!(bot.tick().await.is_err());
        assert_eq!(bot.last_tick_path(), &[FetchingBalance, Idle]);
        assert_eq!(bot.name(), "user1:DIF_BTC");
    }

    #[tokio::test]
    async fn test_failed_submit_path_ends_idle() {
        use TickState::*;

        let gw = Arc::new(MockGateway::new());
        gw.set_balance("user1", "BTC", Balance::new(dec!(1000), dec!(0)));
        gw.set_balance("user1", "DIF", Balance::new(dec!(500), dec!(0)));
        gw.fail_batch_replace(Some(lqbot_gateway::GatewayError::Unavailable("x".to_string())));
        let mut bot = bot(gw);

        assert!(bot.tick().await.is_err());
        assert_eq!(bot.last_tick_path(), &[FetchingBalance, Dirty, Submitting, Idle]);
    }

    #[test]
    fn test_error_outcome_labels() {
        let insufficient = BotError::Quote(QuoteError::InsufficientBalance {
            asset: "DIF".to_string(),
            total: dec!(0),
        });
        assert_eq!(insufficient.outcome(), "insufficient_balance");
        let gateway = BotError::Gateway(lqbot_gateway::GatewayError::Unavailable("x".to_string()));
        assert_eq!(gateway.outcome(), "gateway_error");
    }
}
