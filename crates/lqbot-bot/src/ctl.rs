//! Operator actions behind `lqbot-ctl`.
//!
//! Funding bot users and reloading market definitions both go through the
//! gateway; the binary only parses arguments and prints results.

use crate::error::{AppError, AppResult};
use lqbot_core::Balance;
use lqbot_gateway::{ExchangeGateway, MarketCache};
use rust_decimal::Decimal;
use tracing::info;

/// Business tag of balance changes made by `deposit`.
pub const DEPOSIT_BUSINESS: &str = "deposit";

/// Credit `amount` of `asset` to `user_id` and return the resulting balance.
///
/// `business_id` must be unique per user and asset; the exchange refuses a
/// repeated one.
pub async fn deposit<G: ExchangeGateway + ?Sized>(
    gateway: &G,
    user_id: &str,
    asset: &str,
    amount: Decimal,
    business_id: u64,
) -> AppResult<Balance> {
    if amount <= Decimal::ZERO {
        return Err(AppError::InvalidArgument(format!(
            "deposit amount must be positive, got {amount}"
        )));
    }

    gateway
        .balance_update(user_id, asset, DEPOSIT_BUSINESS, business_id, amount)
        .await?;
    let balance = gateway
        .balance_query(user_id)
        .await?
        .get(asset)
        .copied()
        .unwrap_or_default();

    info!(user_id, asset, %amount, business_id, total = %balance.total(), "Deposit applied");
    Ok(balance)
}

/// Ask the exchange to reload its markets as `admin_id`, then refresh `markets`.
///
/// Returns the number of markets cached after the reload.
pub async fn reload_markets<G: ExchangeGateway + ?Sized>(
    gateway: &G,
    markets: &MarketCache,
    admin_id: &str,
    from_scratch: bool,
) -> AppResult<usize> {
    gateway.reload_markets(admin_id, from_scratch).await?;
    markets.load(gateway).await?;
    info!(admin_id, from_scratch, markets = markets.len(), "Markets reloaded");
    Ok(markets.len())
}
