use crate::errors::{AppError, Result};
use crate::models::{FundingRecord, Protocol};
use crate::sources::get_json;
use crate::utils::{Numeric, int, num, settlement_or_estimate};
use serde::Deserialize;

const BYBIT_LINEAR_TICKERS: &str = "https://api.bybit.com/v5/market/tickers?category=linear";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    ret_code: i64,
    #[serde(default)]
    ret_msg: String,
    #[serde(default)]
    result: Option<TickerList>,
}

#[derive(Debug, Deserialize)]
struct TickerList {
    #[serde(default)]
    list: Vec<Ticker>,
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
    #[serde(default)]
    funding_interval_hour: Option<Numeric>,
}

pub async fn fetch_funding(client: &reqwest::Client, now: i64) -> Result<Vec<FundingRecord>> {
    let body = get_json(client, BYBIT_LINEAR_TICKERS).await?;
    parse_tickers(&body, now)
}

/// Linear tickers → records. Uses the reported funding interval when present.
pub fn parse_tickers(body: &str, now: i64) -> Result<Vec<FundingRecord>> {
    let env: Envelope = serde_json::from_str(body)?;
    if env.ret_code != 0 {
        return Err(AppError::Api {
            venue: "Bybit",
            message: format!("retCode {} {}", env.ret_code, env.ret_msg),
        });
    }
    let default_period = Protocol::Bybit.funding_period_hours();
    let rows = env.result.map(|r| r.list).unwrap_or_default();
    Ok(rows
        .iter()
        .filter_map(|row| {
            let price = num(&row.last_price)?;
            let rate = num(&row.funding_rate)?;
            let period = int(&row.funding_interval_hour)
                .and_then(|h| u32::try_from(h).ok())
                .filter(|h| *h > 0)
                .unwrap_or(default_period);
            let next = settlement_or_estimate(int(&row.next_funding_time), now, period);
            FundingRecord::new(&row.symbol, Protocol::Bybit, price, rate, period, Some(next), now)
        })
        .collect())
}
