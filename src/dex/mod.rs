//! On-chain perpetual venues with hourly funding.

pub mod dydx;
pub mod hyperliquid;
