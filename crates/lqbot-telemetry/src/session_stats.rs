//! Session summary.
//!
//! Reads the tick and latency metrics back per bot and writes a summary to
//! the log periodically and once on shutdown.

use crate::metrics::{SUBMIT_LATENCY_MS, TICKS_TOTAL};
use chrono::{DateTime, Utc};
use prometheus::core::Collector;
use tracing::info;

/// Statistics of one bot over the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BotSessionStats {
    pub bot: String,
    pub submitted: u64,
    pub unchanged: u64,
    pub insufficient_balance: u64,
    pub gateway_error: u64,
    pub quote_error: u64,
    pub submit_p50_ms: f64,
    pub submit_p99_ms: f64,
}

impl BotSessionStats {
    pub fn ticks(&self) -> u64 {
        self.submitted + self.unchanged + self.insufficient_balance + self.gateway_error + self.quote_error
    }
}

/// Session statistics reporter.
pub struct SessionStatsReporter {
    bots: Vec<String>,
    start_time: DateTime<Utc>,
}

impl SessionStatsReporter {
    pub fn new(bots: Vec<String>) -> Self {
        Self {
            bots,
            start_time: Utc::now(),
        }
    }

    /// Current statistics for every bot.
    pub fn get_stats(&self) -> Vec<BotSessionStats> {
        self.bots.iter().map(|bot| self.get_bot_stats(bot)).collect()
    }

    fn get_bot_stats(&self, bot: &str) -> BotSessionStats {
        let count = |outcome: &str| TICKS_TOTAL.with_label_values(&[bot, outcome]).get() as u64;
        let (submit_p50_ms, submit_p99_ms) = self.get_latency_percentiles(bot);

        BotSessionStats {
            bot: bot.to_string(),
            submitted: count("submitted"),
            unchanged: count("unchanged"),
            insufficient_balance: count("insufficient_balance"),
            gateway_error: count("gateway_error"),
            quote_error: count("quote_error"),
            submit_p50_ms,
            submit_p99_ms,
        }
    }

    /// (p50, p99) of the submit latency histogram for `bot`.
    fn get_latency_percentiles(&self, bot: &str) -> (f64, f64) {
        for mf in SUBMIT_LATENCY_MS.collect() {
            for m in mf.get_metric() {
                let labels = m.get_label();
                if labels.len() != 1 || labels[0].get_value() != bot {
                    continue;
                }
                let h = m.get_histogram();
                let count = h.get_sample_count();
                if count == 0 {
                    return (0.0, 0.0);
                }
                let buckets = h.get_bucket();
                return (
                    percentile_from_buckets(buckets, count, 0.50),
                    percentile_from_buckets(buckets, count, 0.99),
                );
            }
        }
        (0.0, 0.0)
    }

    /// Write the summary to the log.
    pub fn output_summary(&self) {
        let duration = Utc::now() - self.start_time;

        info!(
            started = %self.start_time.format("%Y-%m-%d %H:%M:%S UTC"),
            minutes = duration.num_minutes(),
            "Session summary"
        );

        for s in self.get_stats() {
            info!(
                bot = %s.bot,
                ticks = s.ticks(),
                submitted = s.submitted,
                unchanged = s.unchanged,
                insufficient_balance = s.insufficient_balance,
                gateway_error = s.gateway_error,
                quote_error = s.quote_error,
                submit_p50_ms = format!("{:.1}", s.submit_p50_ms),
                submit_p99_ms = format!("{:.1}", s.submit_p99_ms),
                "Bot session statistics"
            );
        }
    }
}

/// Linear interpolation inside the bucket holding the target rank.
fn percentile_from_buckets(
    buckets: &[prometheus::proto::Bucket],
    total_count: u64,
    percentile: f64,
) -> f64 {
    let target = (total_count as f64 * percentile).ceil() as u64;
    let mut prev_bound = 0.0;
    let mut prev_count = 0u64;

    for bucket in buckets {
        let upper_bound = bucket.get_upper_bound();
        let cumulative_count = bucket.get_cumulative_count();

        if cumulative_count >= target {
            let bucket_count = cumulative_count - prev_count;
            if bucket_count == 0 {
                return upper_bound;
            }
            let position = (target - prev_count) as f64 / bucket_count as f64;
            return prev_bound + position * (upper_bound - prev_bound);
        }

        prev_bound = upper_bound;
        prev_count = cumulative_count;
    }

    buckets.last().map(|b| b.get_upper_bound()).unwrap_or(0.0)
}
