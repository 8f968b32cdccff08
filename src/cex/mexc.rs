use crate::errors::{AppError, Result};
use crate::models::{FundingRecord, Protocol};
use crate::sources::get_json;
use crate::utils::{Numeric, int, num, settlement_or_estimate};
use serde::Deserialize;

const MEXC_CONTRACT_TICKER: &str = "https://contract.mexc.com/api/v1/contract/ticker";

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    data: Vec<Ticker>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker {
    symbol: String,
    #[serde(default)]
    last_price: Option<Numeric>,
    #[serde(default)]
    funding_rate: Option<Numeric>,
    #[serde(default)]
    next_funding_time: Option<Numeric>,
}

pub async fn fetch_funding(client: &reqwest::Client, now: i64) -> Result<Vec<FundingRecord>> {
    let body = get_json(client, MEXC_CONTRACT_TICKER).await?;
    parse_tickers(&body, now)
}

pub fn parse_tickers(body: &str, now: i64) -> Result<Vec<FundingRecord>> {
    let env: Envelope = serde_json::from_str(body)?;
    if !env.success {
        return Err(AppError::Api {
            venue: "MEXC",
            message: format!("success=false code={:?}", env.code),
        });
    }
    let period = Protocol::Mexc.funding_period_hours();
    Ok(env
        .data
        .iter()
        .filter_map(|row| {
            let next = settlement_or_estimate(int(&row.next_funding_time), now, period);
            FundingRecord::new(
                &row.symbol,
                Protocol::Mexc,
                num(&row.last_price)?,
                num(&row.funding_rate)?,
                period,
                Some(next),
                now,
            )
        })
        .collect())
}
