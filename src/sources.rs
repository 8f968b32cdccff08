//! Registry of funding sources.
//!
//! Every venue is one tag of [`Source`]; the aggregator fans out over an
//! ordered list of tags. A source never fails the pass: errors and timeouts
//! are logged and collapse to an empty list.

use crate::errors::{AppError, Result};
use crate::models::{FundingRecord, Protocol};
use crate::{cex, dex};
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Dydx,
    Hyperliquid,
    Binance,
    Bybit,
    Mexc,
    Gate,
    BingX,
    Bitget,
}

impl Source {
    /// Default registry order.
    pub const ALL: [Source; 8] = [
        Source::Dydx,
        Source::Hyperliquid,
        Source::Binance,
        Source::Bybit,
        Source::Mexc,
        Source::Gate,
        Source::BingX,
        Source::Bitget,
    ];

    pub fn protocol(self) -> Protocol {
        match self {
            Source::Dydx => Protocol::Dydx,
            Source::Hyperliquid => Protocol::Hyperliquid,
            Source::Binance => Protocol::Binance,
            Source::Bybit => Protocol::Bybit,
            Source::Mexc => Protocol::Mexc,
            Source::Gate => Protocol::Gate,
            Source::BingX => Protocol::BingX,
            Source::Bitget => Protocol::Bitget,
        }
    }

    async fn fetch_raw(self, client: &reqwest::Client, now: i64) -> Result<Vec<FundingRecord>> {
        match self {
            Source::Dydx => dex::dydx::fetch_funding(client, now).await,
            Source::Hyperliquid => dex::hyperliquid::fetch_funding(client, now).await,
            Source::Binance => cex::binance::fetch_funding(client, now).await,
            Source::Bybit => cex::bybit::fetch_funding(client, now).await,
            Source::Mexc => cex::mexc::fetch_funding(client, now).await,
            Source::Gate => cex::gate::fetch_funding(client, now).await,
            Source::BingX => cex::bingx::fetch_funding(client, now).await,
            Source::Bitget => cex::bitget::fetch_funding(client, now).await,
        }
    }

    /// Fetch this source's records within `timeout`. Never fails.
    pub async fn fetch(
        self,
        client: &reqwest::Client,
        timeout: Duration,
        now: i64,
    ) -> Vec<FundingRecord> {
        bounded(self.protocol().name(), timeout, self.fetch_raw(client, now)).await
    }
}

/// Await `fetch` for at most `timeout`; errors and timeouts become an empty list.
async fn bounded<F>(venue: &'static str, timeout: Duration, fetch: F) -> Vec<FundingRecord>
where
    F: Future<Output = Result<Vec<FundingRecord>>>,
{
    match tokio::time::timeout(timeout, fetch).await {
        Ok(Ok(records)) => {
            debug!(venue, count = records.len(), "[SOURCE] fetched");
            records
        }
        Ok(Err(e)) => {
            warn!(venue, error = %e, "[SOURCE] fetch failed");
            Vec::new()
        }
        Err(_) => {
            warn!(venue, timeout_ms = timeout.as_millis() as u64, "[SOURCE] fetch timed out");
            Vec::new()
        }
    }
}

impl FromStr for Source {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dydx" => Ok(Source::Dydx),
            "hyperliquid" => Ok(Source::Hyperliquid),
            "binance" => Ok(Source::Binance),
            "bybit" => Ok(Source::Bybit),
            "mexc" => Ok(Source::Mexc),
            "gate" | "gateio" => Ok(Source::Gate),
            "bingx" => Ok(Source::BingX),
            "bitget" => Ok(Source::Bitget),
            other => Err(AppError::Config(format!("unknown source `{other}`"))),
        }
    }
}

/// GET `url` and return the body, treating non-2xx as an error.
pub(crate) async fn get_json(client: &reqwest::Client, url: &str) -> Result<String> {
    let resp = client.get(url).send().await?.error_for_status()?;
    Ok(resp.text().await?)
}
