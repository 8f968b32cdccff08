use crate::errors::Result;
use crate::models::{FundingRecord, Protocol};
use crate::sources::get_json;
use crate::utils::{Numeric, num, settlement_or_estimate};
use serde::Deserialize;
use std::collections::BTreeMap;

const DYDX_PERPETUAL_MARKETS: &str = "https://indexer.dydx.trade/v4/perpetualMarkets";

#[derive(Debug, Deserialize)]
struct Markets {
    markets: BTreeMap<String, Market>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Market {
    #[serde(default, alias = "market")]
    ticker: Option<String>,
    #[serde(default)]
    oracle_price: Option<Numeric>,
    #[serde(default)]
    next_funding_rate: Option<Numeric>,
    #[serde(default)]
    next_funding_at: Option<String>,
}

pub async fn fetch_funding(client: &reqwest::Client, now: i64) -> Result<Vec<FundingRecord>> {
    let body = get_json(client, DYDX_PERPETUAL_MARKETS).await?;
    parse_markets(&body, now)
}

/// Markets map → records. `nextFundingRate` is an hourly rate.
pub fn parse_markets(body: &str, now: i64) -> Result<Vec<FundingRecord>> {
    let parsed: Markets = serde_json::from_str(body)?;
    let period = Protocol::Dydx.funding_period_hours();
    Ok(parsed
        .markets
        .iter()
        .filter_map(|(key, m)| {
            let reported = m
                .next_funding_at
                .as_deref()
                .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
                .map(|t| t.timestamp_millis());
            FundingRecord::new(
                m.ticker.as_deref().unwrap_or(key),
                Protocol::Dydx,
                num(&m.oracle_price)?,
                num(&m.next_funding_rate)?,
                period,
                Some(settlement_or_estimate(reported, now, period)),
                now,
            )
        })
        .collect())
}
