//! Geometric quote ladder.
//!
//! The fair mid price is implied by the ratio of the bot's holdings,
//! `mid = balance_quote / balance_base`. For tier `t` with deviation `d`:
//!
//! ```text
//! ask_price(t)  = Q * d^(2t+1) / B
//! bid_price(t)  = Q / (B * d^(2t+1))
//! ask_amount(t) = B / d^t - B / d^(t+1)
//! bid_amount(t) = B * d^(t+1) - B * d^t
//! ```
//!
//! Prices widen geometrically away from the mid while ask amounts shrink, so
//! the book is densest at the touch. Ask amounts telescope to
//! `B * (1 - d^-tiers)`, which never exceeds the base holding.

use lqbot_core::{MarketInfo, OrderSide, OrderSpec};
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::{LadderConfig, MAX_TIERS};
use crate::error::{QuoteError, QuoteResult};

/// One unrounded ladder tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LadderTier {
    /// Tier index (0 = touch).
    pub tier: u32,
    pub ask_price: Decimal,
    pub ask_amount: Decimal,
    pub bid_price: Decimal,
    pub bid_amount: Decimal,
}

fn overflow(what: &str, tier: u32) -> QuoteError {
    QuoteError::Overflow(format!("{what} at tier {tier}"))
}

/// Compute the unrounded tiers of a ladder.
///
/// Pure and deterministic. Fails with `InvalidDeviation` for `d <= 1`,
/// `InvalidTierCount` for zero or more than `MAX_TIERS` tiers and
/// `InsufficientBalance` when either holding is not strictly positive.
pub fn compute_tiers(
    balance_quote: Decimal,
    balance_base: Decimal,
    deviation: Decimal,
    tiers: u32,
) -> QuoteResult<Vec<LadderTier>> {
    if deviation <= Decimal::ONE {
        return Err(QuoteError::InvalidDeviation(deviation));
    }
    if tiers == 0 || tiers > MAX_TIERS {
        return Err(QuoteError::InvalidTierCount(tiers));
    }
    if balance_base <= Decimal::ZERO {
        return Err(QuoteError::InsufficientBalance {
            asset: "base".to_string(),
            total: balance_base,
        });
    }
    if balance_quote <= Decimal::ZERO {
        return Err(QuoteError::InsufficientBalance {
            asset: "quote".to_string(),
            total: balance_quote,
        });
    }

    let deviation_sq = deviation
        .checked_mul(deviation)
        .ok_or_else(|| overflow("deviation^2", 0))?;

    let mut result = Vec::with_capacity(tiers as usize);
    // d^t
    let mut dev_pow = Decimal::ONE;
    // d^(2t+1)
    let mut dev_odd = deviation;

    for tier in 0..tiers {
        let dev_next = dev_pow
            .checked_mul(deviation)
            .ok_or_else(|| overflow("d^(t+1)", tier))?;

        let ask_price = balance_quote
            .checked_mul(dev_odd)
            .and_then(|v| v.checked_div(balance_base))
            .ok_or_else(|| overflow("ask price", tier))?;
        let bid_price = balance_base
            .checked_mul(dev_odd)
            .and_then(|v| balance_quote.checked_div(v))
            .ok_or_else(|| overflow("bid price", tier))?;

        let ask_amount = balance_base
            .checked_div(dev_pow)
            .zip(balance_base.checked_div(dev_next))
            .map(|(inner, outer)| inner - outer)
            .ok_or_else(|| overflow("ask amount", tier))?;
        let bid_amount = balance_base
            .checked_mul(dev_next)
            .zip(balance_base.checked_mul(dev_pow))
            .and_then(|(outer, inner)| outer.checked_sub(inner))
            .ok_or_else(|| overflow("bid amount", tier))?;

        result.push(LadderTier {
            tier,
            ask_price,
            ask_amount,
            bid_price,
            bid_amount,
        });

        dev_pow = dev_next;
        if tier + 1 < tiers {
            dev_odd = dev_odd
                .checked_mul(deviation_sq)
                .ok_or_else(|| overflow("d^(2t+1)", tier + 1))?;
        }
    }

    Ok(result)
}

/// Generate the order ladder for one tick.
///
/// Returns `[ask0, bid0, ask1, bid1, ...]`, exactly `2 * tiers_amount` limit
/// orders with prices and amounts rounded to the market's precision (asks up,
/// bids down). The ladder is rejected before submission when:
/// - any rounded order is zero or below the market's minimum amount
/// - the rounded asks need more base than `balance_base`
/// - the rounded bids need more quote than `balance_quote`
pub fn generate_ladder(
    config: &LadderConfig,
    market: &MarketInfo,
    balance_quote: Decimal,
    balance_base: Decimal,
) -> QuoteResult<Vec<OrderSpec>> {
    if market.name != config.market() {
        return Err(QuoteError::InvalidConfig(format!(
            "ladder for {} given market {}",
            config.market(),
            market.name
        )));
    }
    if balance_base <= Decimal::ZERO {
        return Err(QuoteError::InsufficientBalance {
            asset: config.base.clone(),
            total: balance_base,
        });
    }
    if balance_quote <= Decimal::ZERO {
        return Err(QuoteError::InsufficientBalance {
            asset: config.quote.clone(),
            total: balance_quote,
        });
    }

    let tiers = compute_tiers(
        balance_quote,
        balance_base,
        config.deviation,
        config.tiers_amount,
    )?;

    let mut orders = Vec::with_capacity(tiers.len() * 2);
    let mut base_required = Decimal::ZERO;
    let mut quote_required = Decimal::ZERO;

    for tier in &tiers {
        let ask = OrderSpec::limit(
            market,
            OrderSide::Ask,
            tier.ask_price,
            tier.ask_amount,
            config.taker_fee,
            config.maker_fee,
        )?;
        let bid = OrderSpec::limit(
            market,
            OrderSide::Bid,
            tier.bid_price,
            tier.bid_amount,
            config.taker_fee,
            config.maker_fee,
        )?;

        for order in [&ask, &bid] {
            check_not_dust(order, tier.tier, market)?;
        }

        base_required += ask.amount.inner();
        quote_required += bid.notional();

        orders.push(ask);
        orders.push(bid);
    }

    if base_required > balance_base {
        return Err(QuoteError::InfeasibleLadder {
            asset: config.base.clone(),
            required: base_required,
            available: balance_base,
        });
    }
    if quote_required > balance_quote {
        return Err(QuoteError::InfeasibleLadder {
            asset: config.quote.clone(),
            required: quote_required,
            available: balance_quote,
        });
    }

    debug!(
        market = %market.name,
        orders = orders.len(),
        %base_required,
        %quote_required,
        "Ladder generated"
    );

    Ok(orders)
}

fn check_not_dust(order: &OrderSpec, tier: u32, market: &MarketInfo) -> QuoteResult<()> {
    let amount = order.amount.inner();
    if !order.price.is_positive() || !order.amount.is_positive() || amount < market.min_amount {
        return Err(QuoteError::DustOrder {
            tier,
            side: order.side.to_string(),
            price: order.price.inner(),
            amount,
        });
    }
    Ok(())
}
