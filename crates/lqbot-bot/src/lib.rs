//! Tiered liquidity bots for a remote matching engine.
//!
//! Each configured bot keeps a geometric ladder of bid/ask limit orders on
//! one market, funded by one user's balances, and replaces the whole ladder
//! whenever those balances change.

pub mod app;
pub mod config;
pub mod ctl;
pub mod error;
pub mod liquidity;

pub use app::{Application, Bot};
pub use config::{bot_name, AppConfig};
pub use error::{AppError, AppResult, BotError};
pub use liquidity::{LiquidityBot, TickOutcome, TickState};
