//! Prometheus metrics for the liquidity bots.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. It only fails on duplicate metric
//! names, which happens during static initialization and never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram_vec, register_int_gauge,
    CounterVec, GaugeVec, HistogramVec, IntGauge,
};

/// Tick outcomes per bot.
/// Labels: bot, outcome (submitted/unchanged/insufficient_balance/gateway_error/quote_error)
pub static TICKS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "lqbot_ticks_total",
        "Total bot ticks by outcome",
        &["bot", "outcome"]
    )
    .unwrap()
});

/// Orders in the last submitted ladder.
pub static LADDER_ORDERS: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "lqbot_ladder_orders",
        "Number of orders in the last submitted ladder",
        &["bot"]
    )
    .unwrap()
});

/// Asset totals observed at the last balance query.
pub static BALANCE_TOTAL: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "lqbot_balance_total",
        "Available plus frozen balance at the last query",
        &["bot", "asset"]
    )
    .unwrap()
});

/// Batch replace round-trip in milliseconds.
pub static SUBMIT_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "lqbot_submit_latency_ms",
        "Batch replace latency in milliseconds",
        &["bot"],
        vec![5.0, 10.0, 20.0, 50.0, 100.0, 200.0, 500.0, 1000.0, 2000.0, 5000.0]
    )
    .unwrap()
});

/// Gateway failures by error kind.
pub static GATEWAY_ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "lqbot_gateway_errors_total",
        "Total gateway errors",
        &["operation", "kind"]
    )
    .unwrap()
});

/// Bot tasks currently running.
pub static BOTS_RUNNING: Lazy<IntGauge> =
    Lazy::new(|| register_int_gauge!("lqbot_bots_running", "Bot tasks currently running").unwrap());

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record one tick outcome.
    pub fn tick(bot: &str, outcome: &str) {
        TICKS_TOTAL.with_label_values(&[bot, outcome]).inc();
    }

    /// Record a submitted ladder.
    pub fn ladder_submitted(bot: &str, orders: usize, latency_ms: f64) {
        LADDER_ORDERS
            .with_label_values(&[bot])
            .set(orders as f64);
        SUBMIT_LATENCY_MS
            .with_label_values(&[bot])
            .observe(latency_ms);
    }

    /// Record an observed asset total.
    pub fn balance(bot: &str, asset: &str, total: f64) {
        BALANCE_TOTAL.with_label_values(&[bot, asset]).set(total);
    }

    /// Record a gateway failure.
    pub fn gateway_error(operation: &str, kind: &str) {
        GATEWAY_ERRORS_TOTAL
            .with_label_values(&[operation, kind])
            .inc();
    }

    pub fn bot_started() {
        BOTS_RUNNING.inc();
    }

    pub fn bot_stopped() {
        BOTS_RUNNING.dec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_counter_increments() {
        let before = TICKS_TOTAL
            .with_label_values(&["test-bot-a", "unchanged"])
            .get();
        Metrics::tick("test-bot-a", "unchanged");
        Metrics::tick("test-bot-a", "unchanged");
        let after = TICKS_TOTAL
            .with_label_values(&["test-bot-a", "unchanged"])
            .get();
        assert_eq!(after - before, 2.0);
    }

    #[test]
    fn test_ladder_submission_recorded() {
        Metrics::ladder_submitted("test-bot-b", 40, 12.0);
        assert_eq!(LADDER_ORDERS.with_label_values(&["test-bot-b"]).get(), 40.0);
        assert_eq!(
            SUBMIT_LATENCY_MS
                .with_label_values(&["test-bot-b"])
                .get_sample_count(),
            1
        );
    }
}
