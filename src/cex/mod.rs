//! Centralized exchange funding adapters.
//!
//! Each venue module exposes a pure `parse_*` function mapping the venue's
//! public ticker payload to [`FundingRecord`](crate::models::FundingRecord)s
//! and an async `fetch_funding` that performs the request.

pub mod binance;
pub mod bingx;
pub mod bitget;
pub mod bybit;
pub mod gate;
pub mod mexc;
