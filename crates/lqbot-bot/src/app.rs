//! Main application orchestration.
//!
//! Loads market metadata once, builds one [`LiquidityBot`] per configured
//! bot and drives each on its own task:
//! - fixed tick interval, missed ticks skipped
//! - starts staggered so bots do not hit the gateway together
//! - Ctrl-C aborts every bot task

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::liquidity::LiquidityBot;
use lqbot_core::MarketInfo;
use lqbot_gateway::{
    DynGateway, ExchangeGateway, HttpGateway, MarketCache, PasswordGrantAuth, TokenProvider,
};
use lqbot_telemetry::{Metrics, SessionStatsReporter};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Bot driven by the application.
pub type Bot = LiquidityBot<dyn ExchangeGateway>;

/// Main application.
pub struct Application {
    config: AppConfig,
    gateway: DynGateway,
    markets: Arc<MarketCache>,
}

impl Application {
    /// Create an application talking to the configured HTTP gateway.
    ///
    /// Reads user passwords and the client secret from the environment.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let auth: Arc<dyn TokenProvider> = Arc::new(PasswordGrantAuth::new(
            config.password_grant_config()?,
            config.user_credentials()?,
        )?);
        let gateway: DynGateway = Arc::new(HttpGateway::new(&config.server_url, auth)?);
        Ok(Self::with_gateway(config, gateway))
    }

    /// Create an application on an existing gateway.
    pub fn with_gateway(config: AppConfig, gateway: DynGateway) -> Self {
        Self {
            config,
            gateway,
            markets: Arc::new(MarketCache::new()),
        }
    }

    pub fn markets(&self) -> &MarketCache {
        &self.markets
    }

    pub fn gateway(&self) -> &DynGateway {
        &self.gateway
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Load market and asset metadata.
    pub async fn connect(&self) -> AppResult<()> {
        let loaded = self.markets.load(self.gateway.as_ref()).await?;
        info!(markets = loaded, server_url = %self.config.server_url, "Connected to exchange");
        Ok(())
    }

    /// Build every configured bot. Bots on the same market share one `MarketInfo`.
    pub fn build_bots(&self) -> AppResult<Vec<Bot>> {
        let mut shared: HashMap<String, Arc<MarketInfo>> = HashMap::new();
        let mut bots = Vec::with_capacity(self.config.bots.len());

        for ladder in &self.config.bots {
            let name = ladder.market();
            let market = match shared.get(&name) {
                Some(m) => Arc::clone(m),
                None => {
                    let m = Arc::new(self.markets.require(&name)?);
                    shared.insert(name, Arc::clone(&m));
                    m
                }
            };
            bots.push(LiquidityBot::new(
                ladder.clone(),
                market,
                Arc::clone(&self.gateway),
            )?);
        }
        Ok(bots)
    }

    /// Spawn one task per bot, the i-th starting `i * stagger` late.
    pub fn spawn_bots(&self, bots: Vec<Bot>) -> JoinSet<()> {
        let interval = self.config.tick_interval();
        let stagger = self.config.stagger();
        let mut tasks = JoinSet::new();

        for (i, bot) in bots.into_iter().enumerate() {
            let delay = stagger * i as u32;
            tasks.spawn(run_bot(bot, interval, delay));
        }
        tasks
    }

    /// Run every bot until Ctrl-C.
    pub async fn run(self) -> AppResult<()> {
        let bots = self.build_bots()?;
        if bots.is_empty() {
            return Err(AppError::Config("no bots configured".to_string()));
        }

        let names: Vec<String> = bots.iter().map(|b| b.name().to_string()).collect();
        info!(bots = ?names, "Starting bots");
        let stats = SessionStatsReporter::new(names);

        let mut tasks = self.spawn_bots(bots);
        let mut summary_interval = tokio::time::interval(Duration::from_secs(
            self.config.telemetry.summary_interval_secs.max(1),
        ));
        // First tick completes immediately.
        summary_interval.tick().await;

        loop {
            tokio::select! {
                _ = summary_interval.tick() => {
                    stats.output_summary();
                }

                joined = tasks.join_next() => {
                    match joined {
                        Some(Err(e)) => error!(error = %e, "Bot task ended unexpectedly"),
                        Some(Ok(())) => {}
                        None => break,
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        tasks.shutdown().await;
        stats.output_summary();
        info!("Application stopped");
        Ok(())
    }
}

/// Decrements the running-bots gauge when a bot task ends or is aborted.
struct RunningGuard;

impl Drop for RunningGuard {
    fn drop(&mut self) {
        Metrics::bot_stopped();
    }
}

/// Drive one bot forever. Ticks never overlap: each is awaited to completion
/// and intervals missed meanwhile are skipped.
async fn run_bot(mut bot: Bot, interval: Duration, delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    Metrics::bot_started();
    let _guard = RunningGuard;
    info!(bot = %bot.name(), interval_ms = interval.as_millis() as u64, "Bot started");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        bot.run_tick().await;
    }
}
