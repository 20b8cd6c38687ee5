//! Prometheus metrics and structured logging for the liquidity bots.
//!
//! - Prometheus metrics for tick outcomes, ladder size and submit latency
//! - Structured logging with tracing (JSON in production)
//! - Session summary written to the log on shutdown

pub mod error;
pub mod logging;
pub mod metrics;
pub mod session_stats;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
pub use session_stats::{BotSessionStats, SessionStatsReporter};
