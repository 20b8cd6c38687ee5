//! Authenticated exchange gateway for the liquidity bot harness.
//!
//! The matching engine is an external service. This crate only consumes it:
//! - [`ExchangeGateway`]: balance query, atomic batch replace, metadata, cancel/query
//! - [`HttpGateway`]: JSON-over-HTTP implementation with bearer tokens
//! - [`TokenProvider`]: token consumption contract, with a password-grant cache
//! - [`MarketCache`]: market/asset metadata loaded once per session
//! - [`MockGateway`]: in-memory gateway for tests and dry runs

pub mod auth;
pub mod client;
pub mod error;
pub mod gateway;
pub mod market_cache;
pub mod mock;

#[cfg(test)]
mod mock_http;

pub use auth::{PasswordGrantAuth, PasswordGrantConfig, StaticTokens, TokenProvider, UserCredentials};
pub use client::HttpGateway;
pub use error::{GatewayError, GatewayResult};
pub use gateway::{BatchAck, BoxFuture, DynGateway, ExchangeGateway, RestingOrder};
pub use market_cache::MarketCache;
pub use mock::{mock_market, MockGateway, RecordedBatch};
