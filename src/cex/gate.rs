use crate::errors::Result;
use crate::models::{FundingRecord, Protocol};
use crate::sources::get_json;
use crate::utils::{Numeric, next_funding_boundary, num};
use serde::Deserialize;

const GATE_USDT_TICKERS: &str = "https://api.gateio.ws/api/v4/futures/usdt/tickers";

#[derive(Debug, Deserialize)]
struct Ticker {
    contract: String,
    #[serde(default)]
    last: Option<Numeric>,
    #[serde(default)]
    funding_rate: Option<Numeric>,
}

pub async fn fetch_funding(client: &reqwest::Client, now: i64) -> Result<Vec<FundingRecord>> {
    let body = get_json(client, GATE_USDT_TICKERS).await?;
    parse_tickers(&body, now)
}

/// The ticker feed carries no settlement time, so every row gets the next 8h boundary.
pub fn parse_tickers(body: &str, now: i64) -> Result<Vec<FundingRecord>> {
    let rows: Vec<Ticker> = serde_json::from_str(body)?;
    let period = Protocol::Gate.funding_period_hours();
    let next = next_funding_boundary(now, period);
    Ok(rows
        .iter()
        .filter_map(|row| {
            FundingRecord::new(
                &row.contract,
                Protocol::Gate,
                num(&row.last)?,
                num(&row.funding_rate)?,
                period,
                Some(next),
                now,
            )
        })
        .collect())
}
