//! Funding-rate aggregation across perpetual-futures venues, cross-venue
//! opportunity detection, and an alerting watcher.
//!
//! Data flows from the venue adapters ([`cex`], [`dex`]) through the
//! [`aggregator`] into a [`models::Snapshot`], which the [`arbitrage`]
//! detector turns into ranked opportunities for the CLI or the [`watch`]er.

pub mod aggregator;
pub mod arbitrage;
pub mod cex;
pub mod cli;
pub mod config;
pub mod dex;
pub mod errors;
pub mod models;
pub mod notify;
pub mod sources;
pub mod symbol;
pub mod utils;
pub mod watch;
