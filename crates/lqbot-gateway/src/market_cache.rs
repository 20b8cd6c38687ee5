//! Market and asset metadata cache.
//!
//! Loaded once per session from the gateway. A later reload that changes a
//! market's precision is reported as a parameter change, since ladders built
//! against the old precision would be rounded wrongly.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use lqbot_core::{AssetInfo, MarketInfo};
use tracing::{error, info, warn};

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::ExchangeGateway;

/// Cached market with change tracking.
#[derive(Debug, Clone)]
pub struct MarketCacheEntry {
    pub market: MarketInfo,
    pub last_update: DateTime<Utc>,
    pub version: u64,
}

/// Market metadata keyed by market name, assets keyed by symbol.
#[derive(Debug, Default)]
pub struct MarketCache {
    markets: DashMap<String, MarketCacheEntry>,
    assets: DashMap<String, AssetInfo>,
}

impl MarketCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the market and asset lists and merge them into the cache.
    ///
    /// Invalid markets are skipped with a warning. Returns the number of
    /// markets cached. Fails with `ParamChange` if an already cached market
    /// changed precision; every other market of the list is merged first.
    pub async fn load<G: ExchangeGateway + ?Sized>(&self, gateway: &G) -> GatewayResult<usize> {
        let markets = gateway.market_list().await?;
        let assets = gateway.asset_list().await?;

        for asset in assets {
            self.assets.insert(asset.symbol.clone(), asset);
        }

        let mut loaded = 0;
        let mut changed = Vec::new();
        for market in markets {
            if let Err(e) = market.validate() {
                warn!(market = %market.name, error = %e, "Skipping invalid market");
                continue;
            }
            match self.update(market) {
                Ok(()) => loaded += 1,
                Err(GatewayError::ParamChange(msg)) => changed.push(msg),
                Err(e) => return Err(e),
            }
        }

        info!(markets = loaded, assets = self.assets.len(), "Market metadata loaded");
        if !changed.is_empty() {
            return Err(GatewayError::ParamChange(changed.join("; ")));
        }
        Ok(loaded)
    }

    /// Insert or refresh one market.
    ///
    /// Returns `Err(ParamChange)` if material parameters changed; the cached
    /// entry is left untouched in that case.
    pub fn update(&self, market: MarketInfo) -> GatewayResult<()> {
        let version = match self.markets.get(&market.name) {
            Some(existing) => {
                if existing.market.has_material_change(&market) {
                    let msg = format!(
                        "{}: price_precision {}->{}, amount_precision {}->{}",
                        market.name,
                        existing.market.price_precision,
                        market.price_precision,
                        existing.market.amount_precision,
                        market.amount_precision,
                    );
                    error!(%msg, "PARAMETER CHANGE DETECTED");
                    return Err(GatewayError::ParamChange(msg));
                }
                existing.version + 1
            }
            None => 1,
        };

        self.markets.insert(
            market.name.clone(),
            MarketCacheEntry {
                market,
                last_update: Utc::now(),
                version,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<MarketInfo> {
        self.markets.get(name).map(|entry| entry.market.clone())
    }

    /// Like [`get`](Self::get) but fails with `UnknownMarket`.
    pub fn require(&self, name: &str) -> GatewayResult<MarketInfo> {
        self.get(name)
            .ok_or_else(|| GatewayError::UnknownMarket(name.to_string()))
    }

    pub fn version(&self, name: &str) -> Option<u64> {
        self.markets.get(name).map(|entry| entry.version)
    }

    pub fn asset(&self, symbol: &str) -> Option<AssetInfo> {
        self.assets.get(symbol).map(|a| a.clone())
    }

    /// Sorted market names.
    pub fn market_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.markets.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}
