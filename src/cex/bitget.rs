use crate::errors::{AppError, Result};
use crate::models::{FundingRecord, Protocol};
use crate::sources::get_json;
use crate::utils::{Numeric, int, next_funding_boundary, num};
use serde::Deserialize;

const BITGET_USDT_TICKERS: &str =
    "https://api.bitget.com/api/v2/mix/market/tickers?productType=USDT-FUTURES";
const BITGET_OK: &str = "00000";

#[derive(Debug, Deserialize)]
struct Envelope {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Vec<Ticker>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker {
    symbol: String,
    // v1 payloads call it `last`
    #[serde(default, alias = "last")]
    last_pr: Option<Numeric>,
    #[serde(default)]
    funding_rate: Option<Numeric>,
    #[serde(default, alias = "timestamp")]
    ts: Option<Numeric>,
}

pub async fn fetch_funding(client: &reqwest::Client, now: i64) -> Result<Vec<FundingRecord>> {
    let body = get_json(client, BITGET_USDT_TICKERS).await?;
    parse_tickers(&body, now)
}

/// Tickers carry no settlement time; the row's own timestamp is kept when valid.
pub fn parse_tickers(body: &str, now: i64) -> Result<Vec<FundingRecord>> {
    let env: Envelope = serde_json::from_str(body)?;
    if env.code != BITGET_OK {
        return Err(AppError::Api {
            venue: "Bitget",
            message: format!("code {} {}", env.code, env.msg),
        });
    }
    let period = Protocol::Bitget.funding_period_hours();
    let next = next_funding_boundary(now, period);
    Ok(env
        .data
        .iter()
        .filter_map(|row| {
            let stamp = int(&row.ts).filter(|t| *t > 0).unwrap_or(now);
            FundingRecord::new(
                &row.symbol,
                Protocol::Bitget,
                num(&row.last_pr)?,
                num(&row.funding_rate)?,
                period,
                Some(next),
                stamp,
            )
        })
        .collect())
}
